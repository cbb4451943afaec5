//! `bplane-core`: a binned spatial index for 2D axis-aligned rectangles.
//!
//! [`BPlane<T>`] stores an unbounded collection of client rectangles, each carrying an
//! arbitrary payload `T`, and answers area queries in four flavors ([`MatchMode`]): exact
//! rectangle lookup (`Equal`), closed-rectangle intersection (`Touch`), strict-interior
//! overlap (`Overlap`), and unconditional enumeration (`All`). Inserts and deletes are
//! incremental; the underlying bin grid is rebuilt lazily and subdivided adaptively as query
//! traffic reveals which regions are too coarsely binned.
//!
//! ```
//! use bplane_core::{BPlane, MatchMode, Rect};
//!
//! let mut plane = BPlane::new();
//! let a = plane.add(Rect::new(0, 0, 10, 10), "a");
//! let b = plane.add(Rect::new(20, 20, 30, 30), "b");
//!
//! let hits = plane.query(Rect::new(5, 5, 5, 5), MatchMode::Touch);
//! assert_eq!(hits, vec![a]);
//!
//! plane.delete(a).unwrap();
//! assert_eq!(plane.query(Rect::new(0, 0, 100, 100), MatchMode::All), vec![b]);
//! ```

mod bin_array;
mod config;
mod element;
mod enumerator;
mod error;
mod hash_index;
mod plane;
mod rect;
mod sizer;
mod stats;

pub use config::Config;
pub use element::ElementId;
pub use enumerator::{EnumHandle, MatchMode};
pub use error::{Error, Result};
pub use plane::BPlane;
pub use rect::Rect;
pub use stats::PlaneStats;
