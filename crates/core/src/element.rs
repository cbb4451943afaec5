//! Element storage: a generational arena standing in for the original's client-owned,
//! pointer-identified `Element` header.
//!
//! The original leaves allocation and ownership of `Element` records to the client; this
//! crate owns the payload `T` directly in an arena and hands back an opaque [`ElementId`],
//! which is the idiomatic Rust shape for "the client frees the element" — dropping the
//! plane, or calling [`crate::BPlane::delete`], drops the `T` along with it.

use crate::bin_array::BinArrayId;
use crate::rect::Rect;

/// Identifies a single element stored in a [`crate::BPlane`].
///
/// Carries a generation counter so that reusing a freed slot can never alias a stale id:
/// passing an id from a deleted element (or from a different plane) to [`crate::BPlane::delete`]
/// or [`crate::BPlane::get`] is a contract violation, and is detected rather than silently
/// operating on the wrong element.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ElementId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Names which list currently heads this element's location — the inbox, or a specific
/// bucket of a specific `BinArray`. Stands in for the original's `e_linkp` back-pointer:
/// instead of pointing at "whichever pointer variable currently references me", the element
/// names its container directly, which is enough to rewrite that container's head pointer
/// in O(1) without needing the address of a Rust value that might move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Owner {
    Inbox,
    Bin { array: BinArrayId, slot: u32 },
}

pub(crate) struct ElementData<T> {
    pub rect: Rect,
    pub value: T,
    pub owner: Owner,
    pub loc_prev: Option<ElementId>,
    pub loc_next: Option<ElementId>,
    pub hash_prev: Option<ElementId>,
    pub hash_next: Option<ElementId>,
}

enum Slot<T> {
    Occupied { generation: u32, data: ElementData<T> },
    Free { generation: u32, next_free: Option<u32> },
}

/// A generational arena of [`ElementData`], addressed by [`ElementId`].
pub(crate) struct ElementArena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> ElementArena<T> {
    pub fn new() -> Self {
        ElementArena { slots: Vec::new(), free_head: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn insert(&mut self, data: ElementData<T>) -> ElementId {
        self.len += 1;
        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            let generation = match *slot {
                Slot::Free { generation, next_free } => {
                    self.free_head = next_free;
                    generation
                }
                Slot::Occupied { .. } => unreachable!("free list pointed at an occupied slot"),
            };
            *slot = Slot::Occupied { generation, data };
            ElementId { index, generation }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot::Occupied { generation: 0, data });
            ElementId { index, generation: 0 }
        }
    }

    /// Removes and returns the element. Panics if `id` is stale or foreign — the caller is
    /// expected to have validated that the element is still live in this plane.
    pub fn remove(&mut self, id: ElementId) -> ElementData<T> {
        let slot = self.slots.get_mut(id.index as usize).expect("ElementId from a foreign plane");
        let next_free = self.free_head;
        match std::mem::replace(slot, Slot::Free { generation: id.generation.wrapping_add(1), next_free }) {
            Slot::Occupied { generation, data } if generation == id.generation => {
                self.free_head = Some(id.index);
                self.len -= 1;
                data
            }
            _ => panic!("ElementId is stale or refers to an already-deleted element"),
        }
    }

    pub fn get(&self, id: ElementId) -> &ElementData<T> {
        match self.slots.get(id.index as usize) {
            Some(Slot::Occupied { generation, data }) if *generation == id.generation => data,
            _ => panic!("ElementId is stale or refers to a different plane"),
        }
    }

    pub fn get_mut(&mut self, id: ElementId) -> &mut ElementData<T> {
        match self.slots.get_mut(id.index as usize) {
            Some(Slot::Occupied { generation, data }) if *generation == id.generation => data,
            _ => panic!("ElementId is stale or refers to a different plane"),
        }
    }

    pub fn try_get(&self, id: ElementId) -> Option<&ElementData<T>> {
        match self.slots.get(id.index as usize) {
            Some(Slot::Occupied { generation, data }) if *generation == id.generation => Some(data),
            _ => None,
        }
    }
}
