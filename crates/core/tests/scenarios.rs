use bplane_core::{BPlane, Error, MatchMode, Rect};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn scenario_equal_and_touch() {
    let mut p = BPlane::new();
    let a = p.add(Rect::new(10, 10, 20, 20), "A");
    let c = p.add(Rect::new(15, 15, 17, 17), "C");
    let _b = p.add(Rect::new(30, 30, 40, 40), "B");

    let mut touch = p.query(Rect::new(16, 16, 16, 16), MatchMode::Touch);
    touch.sort_by_key(|id| format!("{id:?}"));
    let mut expected = vec![a, c];
    expected.sort_by_key(|id| format!("{id:?}"));
    assert_eq!(touch, expected);

    let equal = p.query(Rect::new(10, 10, 20, 20), MatchMode::Equal);
    assert_eq!(equal, vec![a]);
}

#[test]
fn scenario_bulk_all_and_overlap() {
    let mut p = BPlane::new();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..1000 {
        let x: i64 = rng.gen_range(0..99);
        let y: i64 = rng.gen_range(0..99);
        p.add(Rect::new(x, y, x + 1, y + 1), ());
    }

    let all = p.query(Rect::new(0, 0, 100, 100), MatchMode::All);
    assert_eq!(all.len(), 1000);

    let overlap = p.query(Rect::new(0, 0, 100, 100), MatchMode::Overlap);
    assert_eq!(overlap.len(), 1000);
}

#[test]
fn scenario_add_during_iteration_panics() {
    let mut p = BPlane::new();
    p.add(Rect::new(5, 5, 10, 10), "a");
    let handle = p.init_enum(Rect::new(0, 0, 20, 20), MatchMode::Touch);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        p.add(Rect::new(1, 1, 2, 2), "b");
    }));
    assert!(result.is_err());
    p.term_enum(handle);
}

#[test]
fn scenario_delete_during_iteration_is_safe() {
    let mut p = BPlane::new();
    let a = p.add(Rect::new(10, 10, 20, 20), "A");
    let b = p.add(Rect::new(30, 30, 40, 40), "B");
    let c = p.add(Rect::new(15, 15, 17, 17), "C");

    let handle = p.init_enum(Rect::new(0, 0, 50, 50), MatchMode::Touch);
    let first = p.enum_next(handle).expect("first match");
    p.delete(first).unwrap();

    let mut rest = Vec::new();
    while let Some(id) = p.enum_next(handle) {
        rest.push(id);
    }
    p.term_enum(handle);

    let mut all_ids = vec![a, b, c];
    all_ids.retain(|&id| id != first);
    rest.sort_by_key(|id| format!("{id:?}"));
    all_ids.sort_by_key(|id| format!("{id:?}"));
    assert_eq!(rest, all_ids);
}

#[test]
fn scenario_oversized_element_touches_small_one() {
    let mut p = BPlane::new();
    let big = p.add(Rect::new(0, 0, 95, 95), "big");
    for i in 0i64..200 {
        let x = (i * 37) % 90;
        let y = (i * 53) % 90;
        p.add(Rect::new(x, y, x + 1, y + 1), "small");
    }

    let hits = p.query(Rect::new(50, 50, 51, 51), MatchMode::Touch);
    assert!(hits.contains(&big));
    assert!(!hits.is_empty());
}

#[test]
fn scenario_degenerate_point() {
    let mut p = BPlane::new();
    let point = p.add(Rect::new(50, 50, 50, 50), "point");

    let touch = p.query(Rect::new(50, 50, 50, 50), MatchMode::Touch);
    assert_eq!(touch, vec![point]);

    let overlap = p.query(Rect::new(50, 50, 50, 50), MatchMode::Overlap);
    assert!(overlap.is_empty());
}

#[test]
fn delete_on_empty_plane_is_a_soft_error() {
    let mut p: BPlane<()> = BPlane::new();
    let mut other = BPlane::new();
    let id = other.add(Rect::new(0, 0, 1, 1), ());
    assert_eq!(p.delete(id), Err(Error::EmptyPlane));
}

#[test]
fn delete_then_add_round_trips_query_results() {
    let mut p = BPlane::new();
    let rect = Rect::new(1, 1, 5, 5);
    let id = p.add(rect, "x");
    let before = p.query(Rect::new(0, 0, 10, 10), MatchMode::All).len();
    let value = p.delete(id).unwrap();
    p.add(rect, value);
    let after = p.query(Rect::new(0, 0, 10, 10), MatchMode::All).len();
    assert_eq!(before, after);
}

#[test]
fn bbox_tracks_insertions_and_goes_inverted_when_empty() {
    let mut p = BPlane::new();
    assert_eq!(p.bbox(), Rect::INVERTED);
    let a = p.add(Rect::new(-5, -5, 5, 5), "a");
    p.add(Rect::new(10, 10, 20, 20), "b");
    assert_eq!(p.bbox(), Rect::new(-5, -5, 20, 20));
    p.delete(a).unwrap();
    assert_eq!(p.bbox(), Rect::new(10, 10, 20, 20));
}

#[test]
fn stats_reports_population_once_binned() {
    let mut p = BPlane::new();
    for i in 0i64..500 {
        let x = (i * 7) % 200;
        let y = (i * 11) % 200;
        p.add(Rect::new(x, y, x + 1, y + 1), ());
    }
    // force a rebuild so the population leaves the inbox
    let handle = p.init_enum(Rect::new(0, 0, 10, 10), MatchMode::Touch);
    p.term_enum(handle);

    let stats = p.stats();
    assert_eq!(stats.total_count + stats.in_box, 500);
}
