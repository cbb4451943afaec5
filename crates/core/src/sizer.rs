//! The sizer: chooses bin dimensions and grid shape for a region and the elements about to
//! be binned into it.
//!
//! Ported from `bpBinArraySizeIt` in the original bplane module (`bpBins.c`). The algorithm —
//! try one bin per typical element, collapse whichever axis can't fit two bins down to a
//! single bin spanning the whole region, then enlarge toward square bins if that would
//! produce more bins than the population justifies — follows the original's branching
//! directly, including which axis gets collapsed versus capped in each case (see DESIGN.md).

use crate::config::Config;
use crate::rect::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Sizing {
    pub dx: i64,
    pub dy: i64,
    pub dim_x: i32,
    pub dim_y: i32,
}

fn dim_of(span: i64, bin: i64) -> i64 {
    (span + bin - 1) / bin
}

/// Decide whether, and how, to bin `rects` into `bbox`. Returns `None` when the population
/// is below threshold, the area is too small to subdivide at all, or collapsing the worse
/// axis still leaves every element oversized.
pub(crate) fn size(bbox: Rect, rects: &[Rect], config: &Config) -> Option<Sizing> {
    let width = bbox.width();
    let height = bbox.height();
    let count = rects.len();

    if count < config.min_pop || width < 2 || height < 2 {
        return None;
    }

    let max_ex = rects.iter().map(Rect::width).max().unwrap_or(0);
    let max_ey = rects.iter().map(Rect::height).max().unwrap_or(0);

    let mut dx = max_ex + 1;
    let mut dy = max_ey + 1;
    let max_dx = (width + 1) / 2;
    let max_dy = (height + 1) / 2;

    if dx <= max_dx {
        if dy > max_dy {
            // y doesn't fit two bins, x does: give up subdividing y this round.
            dy = height + 1;
        }
    } else if dy <= max_dy {
        // x doesn't fit two bins, y does: give up subdividing x this round.
        dx = width + 1;
    } else {
        // Neither axis fits two bins: collapse whichever one leaves fewer elements
        // oversized.
        let over_x = rects.iter().filter(|r| r.width() >= max_dx).count();
        let over_y = rects.iter().filter(|r| r.height() >= max_dy).count();
        if over_x < over_y {
            dx = max_dx;
            dy = height + 1;
        } else {
            if over_y == count {
                return None;
            }
            dx = width + 1;
            dy = max_dy;
        }
    }

    let mut dim_x = dim_of(width, dx);
    let mut dim_y = dim_of(height, dy);
    let num_bins = dim_x * dim_y;
    let max_bins = ((count as f64) / config.min_avg_pop).max(1.0);

    if (num_bins as f64) > max_bins {
        if dx == width + 1 {
            // x-dim can't grow further (already one bin spanning the whole width); grow y.
            let y_dim_target = (max_bins / (dim_x as f64)).max(1.0);
            dy = (((height + 1) as f64) / y_dim_target) as i64;
            dy = dy.max(1).min(max_dy);
        } else if dy == height + 1 {
            let x_dim_target = (max_bins / (dim_y as f64)).max(1.0);
            dx = (((width + 1) as f64) / x_dim_target) as i64;
            dx = dx.max(1).min(max_dx);
        } else {
            let area = width as f64 * height as f64;
            let d = (area / max_bins).sqrt().max(1.0) as i64;
            if d < dx {
                let y_dim_target = (max_bins / (dim_x as f64)).max(1.0);
                dy = (((height + 1) as f64) / y_dim_target) as i64;
                dy = dy.max(1).min(max_dy);
            } else if d < dy {
                let x_dim_target = (max_bins / (dim_y as f64)).max(1.0);
                dx = (((width + 1) as f64) / x_dim_target) as i64;
                dx = dx.max(1).min(max_dx);
            } else if d > max_dx {
                // d too big for x-dim (tall, skinny bins): max out x, adjust y to match.
                dx = width + 1;
                dy = dy.max((height + 1) / max_bins as i64);
                dy = dy.max(1).min(max_dy);
            } else if d > max_dy {
                // d too big for y-dim (long, squat bins): max out y, adjust x to match.
                dy = height + 1;
                dx = dx.max((width + 1) / max_bins as i64);
                dx = dx.max(1).min(max_dx);
            } else {
                dx = d;
                dy = d;
            }
        }
        dim_x = dim_of(width, dx.max(1));
        dim_y = dim_of(height, dy.max(1));
        num_bins = dim_x * dim_y;
    }
    let _ = num_bins;

    let dim_x = dim_x as i32;
    let dim_y = dim_y as i32;
    if dim_x < 1 || dim_y < 1 {
        return None;
    }

    Some(Sizing { dx, dy, dim_x, dim_y })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> Config {
        Config::default()
    }

    #[test]
    fn refuses_below_min_pop() {
        let bbox = Rect::new(0, 0, 100, 100);
        let rects = vec![Rect::new(0, 0, 1, 1); 3];
        assert!(size(bbox, &rects, &cfg()).is_none());
    }

    #[test]
    fn refuses_tiny_area() {
        let bbox = Rect::new(0, 0, 1, 1);
        let rects = vec![Rect::new(0, 0, 1, 1); 20];
        assert!(size(bbox, &rects, &cfg()).is_none());
    }

    #[test]
    fn sizes_uniform_unit_rects() {
        let bbox = Rect::new(0, 0, 100, 100);
        let rects: Vec<Rect> = (0..100).map(|i| {
            let x = i % 10;
            let y = i / 10;
            Rect::new(x * 10, y * 10, x * 10 + 1, y * 10 + 1)
        }).collect();
        let sizing = size(bbox, &rects, &cfg()).expect("should size");
        assert!(sizing.dim_x >= 1 && sizing.dim_y >= 1);
        assert!((sizing.dim_x as i64) * (sizing.dim_y as i64) * 2 >= rects.len() as i64);
    }

    #[test]
    fn never_exceeds_two_bins_per_axis_cap_when_unconstrained_by_population() {
        let bbox = Rect::new(0, 0, 20, 20);
        // 15 elements each almost as large as the whole region on one axis.
        let rects: Vec<Rect> = (0..15).map(|_| Rect::new(0, 0, 19, 1)).collect();
        let sizing = size(bbox, &rects, &cfg()).expect("should size");
        assert!(sizing.dim_x <= 2 || sizing.dim_y <= 2);
    }
}
