//! State carried by an in-flight area query.
//!
//! The original's `BPEnum` holds a back-link into its `BPlane`'s active-iterator list and is
//! handed to the client as a pointer the client threads through `BPEnumInit`/`Next`/`Term`.
//! That shape is a reference cycle (`BPlane` -> enum list -> `BPEnum` -> `BPlane`) with no
//! safe translation. Per the design notes this crate instead keeps every iterator's state
//! *inside* the `BPlane`, in a small arena, and gives the client only an opaque
//! [`EnumHandle`] — a plain integer with no lifetime attached to it at all. All mutating
//! plane operations, including query iteration, are therefore ordinary `&mut self` methods
//! with no borrow-checker conflict between a live iterator and a concurrent `delete`.

use crate::bin_array::BinArrayId;
use crate::element::ElementId;
use crate::rect::Rect;
use smallvec::SmallVec;

/// The kind of area match a query performs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MatchMode {
    /// Only elements whose rectangle equals the query rectangle exactly.
    Equal,
    /// Elements whose rectangle shares at least one point with the query rectangle
    /// (closed-rectangle intersection — touching edges and corners count).
    Touch,
    /// Elements whose rectangle overlaps the strict interior of the query rectangle.
    Overlap,
    /// Every element in the plane.
    All,
}

/// An opaque, `Copy` handle to a query in progress. Carries no borrow on the
/// [`crate::BPlane`] it was created from; all navigation happens through plane methods that
/// take the handle by value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EnumHandle(pub(crate) u32);

/// Whether a stack frame is scanning a window of bins that might only partially intersect
/// the query (`Bins`, each candidate element must be filtered), or is known to be entirely
/// inside the query rectangle (`BinsInside`, no per-element filtering is needed).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum FrameState {
    Bins,
    BinsInside,
}

/// One level of descent into the bin tree.
pub(crate) struct BinFrame {
    pub array: BinArrayId,
    pub state: FrameState,
    /// Current bin index; starts one before the first bin to visit.
    pub i: i32,
    /// Last bin index of the current row (non-inside mode only).
    pub row_max: i32,
    /// Index to add after finishing a row to reach the next row's first relevant bin.
    pub row_delta: i32,
    /// Last ordinary bin index to visit in this frame before the oversized bucket.
    pub max: i32,
    /// Whether this frame's bins are coarse enough, relative to the query, that subdividing
    /// an over-full one could plausibly help.
    pub subbin: bool,
    /// Elements rejected by the per-element filter while scanning the current bin.
    pub rejects: usize,
    pub current_list: Option<ElementId>,
}

/// Top-level enumerator mode, mirroring the five-state (six, counting `Done`) original.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum TopState {
    Bins,
    Inbox,
    InboxInside,
    Hash,
    Done,
}

pub(crate) struct EnumSlot {
    pub srch_area: Rect,
    pub match_mode: MatchMode,
    pub top_state: TopState,
    pub next_element: Option<ElementId>,
    /// Subbinning thresholds computed once at init from the query rectangle's own size.
    pub sub_bin_min_x: i64,
    pub sub_bin_min_y: i64,
    /// Whether the query rectangle was found to surround the plane's bbox at init time —
    /// carried so that the fallback inbox scan reached once the bin tree is exhausted knows
    /// whether it still needs to filter, same as the original threading its `inside` local
    /// through both the bins state and the final inbox state.
    pub overall_inside: bool,
    pub stack: SmallVec<[BinFrame; 8]>,
}
