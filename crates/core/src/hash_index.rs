//! The hash index: maps a canonical rectangle to the head of the chain of elements that
//! share that exact rectangle, used to answer `MatchMode::Equal` queries directly without a
//! bin-tree descent.
//!
//! The original keeps a generic hash table keyed on the element's 4-word rectangle, with the
//! element chain threaded through `e_hashLink`. Here the map key *is* the rectangle, so
//! finding the chain that currently owns a given element (to unlink it) needs no back-pointer
//! trick at all — the element's own stored rectangle re-hashes straight back to the entry.

use crate::element::{ElementArena, ElementId};
use crate::rect::Rect;
use rustc_hash::FxHashMap;

pub(crate) type HashIndex = FxHashMap<Rect, Option<ElementId>>;

/// Insert `id` at the head of the chain for its own rectangle.
pub(crate) fn insert<T>(index: &mut HashIndex, elements: &mut ElementArena<T>, id: ElementId) {
    let rect = elements.get(id).rect;
    let head = index.get(&rect).copied().flatten();
    elements.get_mut(id).hash_prev = None;
    elements.get_mut(id).hash_next = head;
    if let Some(h) = head {
        elements.get_mut(h).hash_prev = Some(id);
    }
    index.insert(rect, Some(id));
}

/// Unlink `id` from its rectangle's chain. The chain is left in the map (possibly as an
/// empty `None` head) rather than removing the map entry, which keeps this O(1) without a
/// second hash operation; empty chains are harmless and are overwritten on reinsertion.
pub(crate) fn remove<T>(index: &mut HashIndex, elements: &mut ElementArena<T>, id: ElementId) {
    let (rect, prev, next) = {
        let e = elements.get(id);
        (e.rect, e.hash_prev, e.hash_next)
    };
    if let Some(p) = prev {
        elements.get_mut(p).hash_next = next;
    } else {
        index.insert(rect, next);
    }
    if let Some(n) = next {
        elements.get_mut(n).hash_prev = prev;
    }
}

/// Head of the chain for the canonical rectangle `rect`, for `MatchMode::Equal`.
pub(crate) fn lookup(index: &HashIndex, rect: &Rect) -> Option<ElementId> {
    index.get(rect).copied().flatten()
}
