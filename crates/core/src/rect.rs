//! Axis-aligned rectangle primitives consumed by the rest of the crate.
//!
//! This is the "rectangle library" collaborator the design calls for: canonicalization,
//! expansion, clipping, and the closed-rectangle touch/surround tests that the enumerator
//! builds its filtering on.

/// An axis-aligned rectangle with integer coordinates.
///
/// A rectangle is *canonical* when `xbot <= xtop` and `ybot <= ytop`. Canonical rectangles
/// may still be degenerate (zero width and/or height) — a single point is a legal rectangle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Rect {
    pub xbot: i64,
    pub ybot: i64,
    pub xtop: i64,
    pub ytop: i64,
}

impl Rect {
    /// A sentinel "inverted" rectangle used to represent the bounding box of an empty plane,
    /// and as the identity element when folding a sequence of rectangles into their union.
    pub const INVERTED: Rect = Rect {
        xbot: i64::MAX,
        ybot: i64::MAX,
        xtop: i64::MIN,
        ytop: i64::MIN,
    };

    pub fn new(xbot: i64, ybot: i64, xtop: i64, ytop: i64) -> Self {
        Rect { xbot, ybot, xtop, ytop }
    }

    pub fn is_canonical(&self) -> bool {
        self.xbot <= self.xtop && self.ybot <= self.ytop
    }

    /// Swap coordinates as needed so the result is canonical.
    pub fn canonicalize(&self) -> Rect {
        let (xbot, xtop) = if self.xbot <= self.xtop { (self.xbot, self.xtop) } else { (self.xtop, self.xbot) };
        let (ybot, ytop) = if self.ybot <= self.ytop { (self.ybot, self.ytop) } else { (self.ytop, self.ybot) };
        Rect { xbot, ybot, xtop, ytop }
    }

    pub fn is_inverted(&self) -> bool {
        self.xbot > self.xtop || self.ybot > self.ytop
    }

    pub fn width(&self) -> i64 {
        self.xtop - self.xbot
    }

    pub fn height(&self) -> i64 {
        self.ytop - self.ybot
    }

    /// Grow (or, with a negative `delta`, shrink) every edge by `delta`.
    pub fn expand(&self, delta: i64) -> Rect {
        Rect {
            xbot: self.xbot - delta,
            ybot: self.ybot - delta,
            xtop: self.xtop + delta,
            ytop: self.ytop + delta,
        }
    }

    /// Intersection of `self` and `other`, or `None` if they don't overlap at all (not even
    /// on an edge).
    pub fn clip(&self, other: &Rect) -> Option<Rect> {
        let r = Rect {
            xbot: self.xbot.max(other.xbot),
            ybot: self.ybot.max(other.ybot),
            xtop: self.xtop.min(other.xtop),
            ytop: self.ytop.min(other.ytop),
        };
        if r.is_inverted() { None } else { Some(r) }
    }

    /// True if `self` is a closed superset of `other`.
    pub fn surrounds(&self, other: &Rect) -> bool {
        self.xbot <= other.xbot && self.ybot <= other.ybot && self.xtop >= other.xtop && self.ytop >= other.ytop
    }

    /// Closed-rectangle intersection test: true if the two rectangles share at least one
    /// point, including shared edges and corners.
    pub fn touches(&self, other: &Rect) -> bool {
        if self.xtop < other.xbot || self.xbot > other.xtop {
            return false;
        }
        if self.ytop < other.ybot || self.ybot > other.ytop {
            return false;
        }
        true
    }

    /// Extend `self` to include `other`, treating `self` as already a valid accumulator
    /// (use [`Rect::INVERTED`] as the starting value).
    pub fn include(&mut self, other: &Rect) {
        if self.is_inverted() {
            *self = *other;
            return;
        }
        self.xbot = self.xbot.min(other.xbot);
        self.ybot = self.ybot.min(other.ybot);
        self.xtop = self.xtop.max(other.xtop);
        self.ytop = self.ytop.max(other.ytop);
    }

    /// True if this rectangle touches the bounding box perimeter of `bbox` — used to decide
    /// whether deleting an element invalidates an exact bounding box.
    pub fn touches_perimeter_of(&self, bbox: &Rect) -> bool {
        self.xbot == bbox.xbot || self.ybot == bbox.ybot || self.xtop == bbox.xtop || self.ytop == bbox.ytop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_swaps_inverted_axes() {
        let r = Rect::new(10, 10, 0, 0).canonicalize();
        assert_eq!(r, Rect::new(0, 0, 10, 10));
    }

    #[test]
    fn touches_is_closed() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 10, 20, 20);
        assert!(a.touches(&b));
        let c = Rect::new(11, 11, 20, 20);
        assert!(!a.touches(&c));
    }

    #[test]
    fn surrounds_is_closed() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(a.surrounds(&a));
        assert!(a.surrounds(&Rect::new(1, 1, 9, 9)));
        assert!(!a.surrounds(&Rect::new(1, 1, 11, 9)));
    }

    #[test]
    fn include_grows_from_inverted() {
        let mut acc = Rect::INVERTED;
        acc.include(&Rect::new(5, 5, 10, 10));
        acc.include(&Rect::new(-5, 2, 6, 20));
        assert_eq!(acc, Rect::new(-5, 2, 10, 20));
    }

    #[test]
    fn clip_disjoint_is_none() {
        let a = Rect::new(0, 0, 5, 5);
        let b = Rect::new(6, 6, 10, 10);
        assert!(a.clip(&b).is_none());
        let c = Rect::new(5, 5, 10, 10);
        assert_eq!(a.clip(&c), Some(Rect::new(5, 5, 5, 5)));
    }
}
