//! The bin-plane driver: owns the hash index, the inbox, and the root `BinArray` tree, and
//! presents the public `Add`/`Delete`/query surface.

use crate::bin_array::{BinArrayArena, BinArrayId, BinArrayNode, Bucket};
use crate::config::Config;
use crate::element::{ElementArena, ElementData, ElementId, Owner};
use crate::enumerator::{BinFrame, EnumHandle, EnumSlot, FrameState, MatchMode, TopState};
use crate::error::{Error, Result};
use crate::hash_index::{self, HashIndex};
use crate::rect::Rect;
use crate::sizer;
use crate::stats::PlaneStats;
use smallvec::SmallVec;

/// A spatial index over axis-aligned rectangles.
///
/// `BPlane<T>` owns every element inserted into it (`add` takes the payload `T` by value and
/// returns an [`ElementId`]; `delete` hands it back). Queries are driven through
/// [`BPlane::init_enum`] / [`BPlane::enum_next`] / [`BPlane::term_enum`], or via the
/// [`BPlane::query`] convenience that drives all three to completion; [`MatchMode`] selects
/// EQUAL/TOUCH/OVERLAP/ALL semantics.
///
/// Adding an element while any query is in progress is a contract violation and panics;
/// deleting is always safe during iteration — every live query whose cursor points at the
/// deleted element is advanced automatically.
pub struct BPlane<T> {
    config: Config,
    elements: ElementArena<T>,
    bin_arrays: BinArrayArena,
    hash: HashIndex,
    inbox_head: Option<ElementId>,
    root: Option<BinArrayId>,
    /// The region currently covered by the bin tree; an add whose rectangle doesn't fit
    /// inside this goes to the inbox instead of the tree.
    bin_area: Rect,
    bbox: Rect,
    bbox_exact: bool,
    count: usize,
    enums: Vec<Option<EnumSlot>>,
    enum_free: Vec<u32>,
    active_enums: usize,
}

impl<T> Default for BPlane<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BPlane<T> {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        BPlane {
            config,
            elements: ElementArena::new(),
            bin_arrays: BinArrayArena::new(),
            hash: HashIndex::default(),
            inbox_head: None,
            root: None,
            bin_area: Rect::INVERTED,
            bbox: Rect::INVERTED,
            bbox_exact: true,
            count: 0,
            enums: Vec::new(),
            enum_free: Vec::new(),
            active_enums: 0,
        }
    }

    pub fn config(&self) -> Config {
        self.config
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn get(&self, id: ElementId) -> Option<&T> {
        self.elements.try_get(id).map(|d| &d.value)
    }

    /// The bounding box of every element currently stored, or [`Rect::INVERTED`] if the
    /// plane is empty. Recomputed on demand when a delete may have shrunk it — the original
    /// caches this recomputation on the plane; here it's simply redone each time it's stale,
    /// which keeps the signature a plain `&self` getter (see DESIGN.md).
    pub fn bbox(&self) -> Rect {
        if self.count == 0 {
            return Rect::INVERTED;
        }
        if self.bbox_exact { self.bbox } else { self.compute_exact_bbox() }
    }

    pub fn stats(&self) -> PlaneStats {
        let mut s = PlaneStats::default();
        s.in_box = self.count_list(self.inbox_head);
        if let Some(root) = self.root {
            self.stat_array(root, 1, &mut s);
        }
        s
    }

    /// Insert `rect` with payload `value`, returning its id.
    ///
    /// # Panics
    /// Panics if any query is currently live on this plane, or if `rect` is not canonical.
    pub fn add(&mut self, rect: Rect, value: T) -> ElementId {
        assert!(self.active_enums == 0, "BPlane::add called while a query is in progress");
        assert!(rect.is_canonical(), "BPlane::add requires a canonical rectangle (xbot<=xtop, ybot<=ytop)");

        let data = ElementData {
            rect,
            value,
            owner: Owner::Inbox,
            loc_prev: None,
            loc_next: None,
            hash_prev: None,
            hash_next: None,
        };
        let id = self.elements.insert(data);
        hash_index::insert(&mut self.hash, &mut self.elements, id);

        if self.count == 0 {
            self.bbox = rect;
        } else {
            self.bbox.include(&rect);
        }
        self.count += 1;

        let fits_bins = self.root.is_some() && self.bin_area.surrounds(&rect);
        if fits_bins {
            let root = self.root.unwrap();
            self.bin_add_into(root, id);
        } else {
            self.push_inbox_front(id);
        }
        tracing::trace!(xbot = rect.xbot, ybot = rect.ybot, xtop = rect.xtop, ytop = rect.ytop, "bplane: added element");
        id
    }

    /// Remove `id` from the plane, returning its payload.
    ///
    /// Returns [`Error::EmptyPlane`] if the plane currently holds no elements at all — this
    /// is a soft, recoverable condition (the original logs and returns rather than
    /// asserting). Any other contract violation (a stale or foreign id) panics.
    pub fn delete(&mut self, id: ElementId) -> Result<T> {
        if self.count == 0 {
            return Err(Error::EmptyPlane);
        }
        let rect = self.elements.get(id).rect;
        self.count -= 1;
        if rect.touches_perimeter_of(&self.bbox) {
            self.bbox_exact = false;
        }

        for slot_idx in 0..self.enums.len() {
            let should_advance = matches!(&self.enums[slot_idx], Some(s) if s.next_element == Some(id));
            if should_advance {
                let mode = self.enums[slot_idx].as_ref().unwrap().match_mode;
                let advanced = match mode {
                    MatchMode::Equal => self.elements.get(id).hash_next,
                    _ => self.elements.get(id).loc_next,
                };
                self.enums[slot_idx].as_mut().unwrap().next_element = advanced;
            }
        }

        hash_index::remove(&mut self.hash, &mut self.elements, id);
        self.unlink_element(id);
        let data = self.elements.remove(id);
        tracing::trace!(xbot = rect.xbot, ybot = rect.ybot, "bplane: deleted element");
        Ok(data.value)
    }

    /// Begin an area query. See [`MatchMode`] for the four supported match kinds.
    pub fn init_enum(&mut self, area: Rect, mode: MatchMode) -> EnumHandle {
        let (srch_area, overall_inside, sub_bin_min_x, sub_bin_min_y) = match mode {
            MatchMode::Equal => (area.canonicalize(), false, 0, 0),
            MatchMode::All => (Rect::INVERTED, true, 0, 0),
            MatchMode::Touch => {
                let canon = area.canonicalize();
                let inside = canon.surrounds(&self.bbox());
                if !inside {
                    self.bins_update();
                }
                (canon, inside, canon.width() / 2, canon.height() / 2)
            }
            MatchMode::Overlap => {
                let canon = area.canonicalize().expand(-1);
                let inside = canon.surrounds(&self.bbox());
                if !inside {
                    self.bins_update();
                }
                (canon, inside, canon.width() / 2, canon.height() / 2)
            }
        };

        let mut slot = EnumSlot {
            srch_area,
            match_mode: mode,
            top_state: TopState::Done,
            next_element: None,
            sub_bin_min_x,
            sub_bin_min_y,
            overall_inside,
            stack: SmallVec::new(),
        };

        if matches!(mode, MatchMode::Equal) {
            slot.next_element = hash_index::lookup(&self.hash, &srch_area);
            slot.top_state = TopState::Hash;
        } else if let Some(root) = self.root {
            self.push_frame(&mut slot, root, overall_inside);
            slot.top_state = TopState::Bins;
        } else {
            slot.top_state = if overall_inside { TopState::InboxInside } else { TopState::Inbox };
            slot.next_element = self.inbox_head;
        }

        let handle = self.store_enum_slot(slot);
        self.active_enums += 1;
        handle
    }

    /// Advance a query, returning the next matching element or `None` once exhausted.
    pub fn enum_next(&mut self, handle: EnumHandle) -> Option<ElementId> {
        loop {
            let top_state = self.enum_slot(handle).top_state;
            match top_state {
                TopState::Hash => {
                    let cur = self.enum_slot(handle).next_element;
                    match cur {
                        None => {
                            self.enum_slot_mut(handle).top_state = TopState::Done;
                            return None;
                        }
                        Some(id) => {
                            let next = self.elements.get(id).hash_next;
                            self.enum_slot_mut(handle).next_element = next;
                            return Some(id);
                        }
                    }
                }
                TopState::Inbox | TopState::InboxInside => {
                    let inside = matches!(top_state, TopState::InboxInside);
                    let mut result = None;
                    loop {
                        let cur = self.enum_slot(handle).next_element;
                        match cur {
                            None => {
                                self.enum_slot_mut(handle).top_state = TopState::Done;
                                break;
                            }
                            Some(id) => {
                                let next = self.elements.get(id).loc_next;
                                self.enum_slot_mut(handle).next_element = next;
                                let rect = self.elements.get(id).rect;
                                if inside || self.enum_slot(handle).srch_area.touches(&rect) {
                                    result = Some(id);
                                    break;
                                }
                            }
                        }
                    }
                    if result.is_some() {
                        return result;
                    }
                }
                TopState::Bins => {
                    if let Some(id) = self.next_from_bins(handle) {
                        return Some(id);
                    }
                    let overall_inside = self.enum_slot(handle).overall_inside;
                    self.enum_slot_mut(handle).top_state = if overall_inside { TopState::InboxInside } else { TopState::Inbox };
                    self.enum_slot_mut(handle).next_element = self.inbox_head;
                }
                TopState::Done => return None,
            }
        }
    }

    /// End a query and free its state.
    pub fn term_enum(&mut self, handle: EnumHandle) {
        assert!(self.enums[handle.0 as usize].is_some(), "EnumHandle already terminated");
        self.enums[handle.0 as usize] = None;
        self.enum_free.push(handle.0);
        self.active_enums -= 1;
    }

    /// Convenience: run a query to completion and collect every matching element id.
    pub fn query(&mut self, area: Rect, mode: MatchMode) -> Vec<ElementId> {
        let handle = self.init_enum(area, mode);
        let mut out = Vec::new();
        while let Some(id) = self.enum_next(handle) {
            out.push(id);
        }
        self.term_enum(handle);
        out
    }

    // ---- internals -----------------------------------------------------------------

    fn push_inbox_front(&mut self, id: ElementId) {
        let head = self.inbox_head;
        {
            let e = self.elements.get_mut(id);
            e.owner = Owner::Inbox;
            e.loc_prev = None;
            e.loc_next = head;
        }
        if let Some(h) = head {
            self.elements.get_mut(h).loc_prev = Some(id);
        }
        self.inbox_head = Some(id);
    }

    fn bin_add_into(&mut self, root: BinArrayId, id: ElementId) {
        let mut array = root;
        loop {
            let rect = self.elements.get(id).rect;
            match self.bin_arrays.get(array).bin_index(&rect) {
                None => {
                    let slot = self.bin_arrays.get(array).oversized_slot();
                    self.push_bucket_list(array, slot, id);
                    return;
                }
                Some(slot) => {
                    let sub = match &self.bin_arrays.get(array).buckets[slot] {
                        Bucket::Sub(s) => Some(*s),
                        Bucket::List(_) => None,
                    };
                    match sub {
                        Some(sub) => {
                            array = sub;
                            continue;
                        }
                        None => {
                            self.push_bucket_list(array, slot, id);
                            return;
                        }
                    }
                }
            }
        }
    }

    fn push_bucket_list(&mut self, array: BinArrayId, slot: usize, id: ElementId) {
        let head = match &self.bin_arrays.get(array).buckets[slot] {
            Bucket::List(h) => *h,
            Bucket::Sub(_) => unreachable!("push_bucket_list target is a nested array"),
        };
        {
            let e = self.elements.get_mut(id);
            e.owner = Owner::Bin { array, slot: slot as u32 };
            e.loc_prev = None;
            e.loc_next = head;
        }
        if let Some(h) = head {
            self.elements.get_mut(h).loc_prev = Some(id);
        }
        self.bin_arrays.get_mut(array).buckets[slot] = Bucket::List(Some(id));
    }

    /// O(1) unlink from whichever list currently holds `id` (inbox or a bin bucket).
    fn unlink_element(&mut self, id: ElementId) {
        let (prev, next, owner) = {
            let e = self.elements.get(id);
            (e.loc_prev, e.loc_next, e.owner)
        };
        if let Some(p) = prev {
            self.elements.get_mut(p).loc_next = next;
        } else {
            match owner {
                Owner::Inbox => self.inbox_head = next,
                Owner::Bin { array, slot } => {
                    self.bin_arrays.get_mut(array).buckets[slot as usize] = Bucket::List(next);
                }
            }
        }
        if let Some(n) = next {
            self.elements.get_mut(n).loc_prev = prev;
        }
    }

    fn collect_list(&self, mut head: Option<ElementId>, out: &mut Vec<ElementId>) {
        while let Some(id) = head {
            out.push(id);
            head = self.elements.get(id).loc_next;
        }
    }

    fn count_list(&self, mut head: Option<ElementId>) -> usize {
        let mut n = 0;
        while let Some(id) = head {
            n += 1;
            head = self.elements.get(id).loc_next;
        }
        n
    }

    fn collect_array(&self, array: BinArrayId, out: &mut Vec<ElementId>) {
        let node = self.bin_arrays.get(array);
        for bucket in &node.buckets {
            match bucket {
                Bucket::List(head) => self.collect_list(*head, out),
                Bucket::Sub(sub) => self.collect_array(*sub, out),
            }
        }
    }

    fn all_ids(&self) -> Vec<ElementId> {
        let mut out = Vec::with_capacity(self.count);
        self.collect_list(self.inbox_head, &mut out);
        if let Some(root) = self.root {
            self.collect_array(root, &mut out);
        }
        out
    }

    fn compute_exact_bbox(&self) -> Rect {
        let mut acc = Rect::INVERTED;
        for id in self.all_ids() {
            acc.include(&self.elements.get(id).rect);
        }
        acc
    }

    fn stat_array(&self, array: BinArrayId, depth: usize, s: &mut PlaneStats) {
        s.bin_arrays += 1;
        s.max_depth = s.max_depth.max(depth);
        let node = self.bin_arrays.get(array);
        s.total_bins += node.buckets.len();
        let oversized = node.oversized_slot();
        for (idx, bucket) in node.buckets.iter().enumerate() {
            match bucket {
                Bucket::List(head) => {
                    let n = self.count_list(*head);
                    if n == 0 {
                        s.empty_bins += 1;
                    }
                    s.max_bin_count = s.max_bin_count.max(n);
                    s.total_count += n;
                    if idx == oversized {
                        s.total_unbinned += n;
                    }
                }
                Bucket::Sub(sub) => self.stat_array(*sub, depth + 1, s),
            }
        }
    }

    /// Dissolve a `BinArray` subtree back into one flat doubly-linked list, returning its
    /// (head, tail). Used both by a full rebuild and, transitively, nowhere else — subbinning
    /// only ever builds new trees, never tears them down piecemeal.
    fn bin_unbuild(&mut self, array: BinArrayId) -> (Option<ElementId>, Option<ElementId>) {
        let node = self.bin_arrays.remove(array);
        let mut head = None;
        let mut tail = None;
        for bucket in node.buckets {
            match bucket {
                Bucket::List(h) => {
                    if let Some(head_id) = h {
                        let mut t = head_id;
                        while let Some(n) = self.elements.get(t).loc_next {
                            t = n;
                        }
                        self.splice_tail(&mut head, &mut tail, Some(head_id), Some(t));
                    }
                }
                Bucket::Sub(sub) => {
                    let (h, t) = self.bin_unbuild(sub);
                    self.splice_tail(&mut head, &mut tail, h, t);
                }
            }
        }
        (head, tail)
    }

    fn splice_tail(
        &mut self,
        head: &mut Option<ElementId>,
        tail: &mut Option<ElementId>,
        new_head: Option<ElementId>,
        new_tail: Option<ElementId>,
    ) {
        let Some(new_head) = new_head else { return };
        if let Some(cur_tail) = *tail {
            self.elements.get_mut(cur_tail).loc_next = Some(new_head);
            self.elements.get_mut(new_head).loc_prev = Some(cur_tail);
        } else {
            *head = Some(new_head);
            self.elements.get_mut(new_head).loc_prev = None;
        }
        *tail = new_tail;
    }

    /// Adopt an already-linked list as the new inbox, fixing up ownership.
    fn restore_to_inbox(&mut self, list_head: Option<ElementId>) {
        let mut cur = list_head;
        while let Some(id) = cur {
            self.elements.get_mut(id).owner = Owner::Inbox;
            cur = self.elements.get(id).loc_next;
        }
        self.inbox_head = list_head;
    }

    /// Build a fresh `BinArray` tree over `list_head`'s elements within `bbox`, recursing
    /// into each populated bucket (oversized one included) when `allow_subbin` is set.
    /// Returns `None` (elements untouched, still in `list_head`) if the sizer refuses.
    fn build_tree(&mut self, bbox: Rect, list_head: Option<ElementId>, allow_subbin: bool) -> Option<BinArrayId> {
        let mut ids = Vec::new();
        self.collect_list(list_head, &mut ids);
        if ids.is_empty() {
            return None;
        }
        let rects: Vec<Rect> = ids.iter().map(|&id| self.elements.get(id).rect).collect();
        let sizing = sizer::size(bbox, &rects, &self.config)?;
        let bucket_count = (sizing.dim_x as usize) * (sizing.dim_y as usize) + 1;
        let node = BinArrayNode {
            bbox,
            dx: sizing.dx,
            dy: sizing.dy,
            dim_x: sizing.dim_x,
            dim_y: sizing.dim_y,
            buckets: (0..bucket_count).map(|_| Bucket::List(None)).collect(),
        };
        let array_id = self.bin_arrays.insert(node);
        for id in ids {
            self.bin_add_into(array_id, id);
        }
        if allow_subbin {
            for slot in 0..bucket_count {
                self.try_subbin(array_id, slot, allow_subbin);
            }
        }
        Some(array_id)
    }

    /// Attempt to replace bucket `slot` of `array` with a nested `BinArray` built from its
    /// current list. Leaves the bucket as a flat list if the sizer refuses.
    fn try_subbin(&mut self, array: BinArrayId, slot: usize, allow_subbin: bool) {
        let (head, area) = {
            let node = self.bin_arrays.get(array);
            match &node.buckets[slot] {
                Bucket::List(h) => (*h, node.bin_area(slot as i32)),
                Bucket::Sub(_) => return,
            }
        };
        if head.is_none() {
            return;
        }
        if let Some(sub_id) = self.build_tree(area, head, allow_subbin) {
            self.bin_arrays.get_mut(array).buckets[slot] = Bucket::Sub(sub_id);
        }
    }

    /// Lazily absorb the inbox into the bin tree. Skipped if the inbox is still below
    /// threshold. A rebuild (an existing tree being torn down and rebuilt, as opposed to the
    /// very first build) expands the tight bbox of the combined population by 50% on each
    /// side so that continued incremental growth doesn't immediately force another rebuild.
    fn bins_update(&mut self) {
        let inbox_count = self.count_list(self.inbox_head);
        if inbox_count < self.config.min_pop {
            return;
        }

        let was_rebuild = self.root.is_some();
        let (mut head, mut tail) = match self.root.take() {
            Some(root) => self.bin_unbuild(root),
            None => (None, None),
        };

        if let Some(inbox_head) = self.inbox_head {
            self.splice_tail(&mut head, &mut tail, Some(inbox_head), None);
            let mut cur = inbox_head;
            while let Some(n) = self.elements.get(cur).loc_next {
                cur = n;
            }
            tail = Some(cur);
        }
        self.inbox_head = None;

        if head.is_none() {
            self.root = None;
            self.bin_area = Rect::INVERTED;
            return;
        }

        let mut ids = Vec::new();
        self.collect_list(head, &mut ids);
        let mut tight = Rect::INVERTED;
        for &id in &ids {
            tight.include(&self.elements.get(id).rect);
        }

        let build_area = if was_rebuild {
            let dx = (tight.width() / 2).max(1);
            let dy = (tight.height() / 2).max(1);
            Rect {
                xbot: tight.xbot - dx,
                ybot: tight.ybot - dy,
                xtop: tight.xtop + dx,
                ytop: tight.ytop + dy,
            }
        } else {
            tight
        };

        match self.build_tree(build_area, head, true) {
            Some(array_id) => {
                self.root = Some(array_id);
                self.bin_area = build_area;
            }
            None => {
                self.restore_to_inbox(head);
                self.root = None;
                self.bin_area = Rect::INVERTED;
            }
        }
        let _ = tail;
    }

    // ---- enumerator internals --------------------------------------------------------

    fn enum_slot(&self, handle: EnumHandle) -> &EnumSlot {
        self.enums[handle.0 as usize].as_ref().expect("EnumHandle used after term_enum")
    }

    fn enum_slot_mut(&mut self, handle: EnumHandle) -> &mut EnumSlot {
        self.enums[handle.0 as usize].as_mut().expect("EnumHandle used after term_enum")
    }

    fn take_enum_slot(&mut self, handle: EnumHandle) -> EnumSlot {
        self.enums[handle.0 as usize].take().expect("EnumHandle used after term_enum")
    }

    fn restore_enum_slot(&mut self, handle: EnumHandle, slot: EnumSlot) {
        self.enums[handle.0 as usize] = Some(slot);
    }

    fn store_enum_slot(&mut self, slot: EnumSlot) -> EnumHandle {
        if let Some(idx) = self.enum_free.pop() {
            self.enums[idx as usize] = Some(slot);
            EnumHandle(idx)
        } else {
            let idx = self.enums.len() as u32;
            self.enums.push(Some(slot));
            EnumHandle(idx)
        }
    }

    /// Push a traversal frame for `array` onto `slot`'s stack. If the query is already known
    /// to surround this array's bbox (either because an ancestor determined it, or because
    /// it surrounds this specific subtree), the frame skips per-element filtering entirely.
    fn push_frame(&mut self, slot: &mut EnumSlot, array: BinArrayId, inside_hint: bool) {
        let node = self.bin_arrays.get(array);
        let is_inside = inside_hint || slot.srch_area.surrounds(&node.bbox);
        if is_inside {
            slot.stack.push(BinFrame {
                array,
                state: FrameState::BinsInside,
                i: -1,
                row_max: 0,
                row_delta: 0,
                max: node.num_bins() - 1,
                subbin: false,
                rejects: 0,
                current_list: None,
            });
            return;
        }

        let subbin = node.dx >= slot.sub_bin_min_x || node.dy >= slot.sub_bin_min_y;
        match slot.srch_area.clip(&node.bbox) {
            None => {
                let max = node.num_bins() - 1;
                slot.stack.push(BinFrame {
                    array,
                    state: FrameState::Bins,
                    i: max,
                    row_max: max,
                    row_delta: 0,
                    max,
                    subbin,
                    rejects: 0,
                    current_list: None,
                });
            }
            Some(clipped) => {
                let xi0 = ((clipped.xbot - node.bbox.xbot) / node.dx).clamp(0, (node.dim_x - 1) as i64) as i32;
                let xi1 = ((clipped.xtop - node.bbox.xbot) / node.dx).clamp(0, (node.dim_x - 1) as i64) as i32;
                let yi0 = ((clipped.ybot - node.bbox.ybot) / node.dy).clamp(0, (node.dim_y - 1) as i64) as i32;
                let yi1 = ((clipped.ytop - node.bbox.ybot) / node.dy).clamp(0, (node.dim_y - 1) as i64) as i32;
                let row_delta = node.dim_x - (xi1 - xi0 + 1);
                let start = yi0 * node.dim_x + xi0 - 1;
                let row_max = yi0 * node.dim_x + xi1;
                let max = yi1 * node.dim_x + xi1;
                slot.stack.push(BinFrame {
                    array,
                    state: FrameState::Bins,
                    i: start,
                    row_max,
                    row_delta,
                    max,
                    subbin,
                    rejects: 0,
                    current_list: None,
                });
            }
        }
    }

    /// Drain elements out of the bin-tree traversal stack, returning the next match or
    /// `None` once the whole stack is exhausted.
    fn next_from_bins(&mut self, handle: EnumHandle) -> Option<ElementId> {
        loop {
            if self.enum_slot(handle).stack.is_empty() {
                return None;
            }

            let (frame_state, current) = {
                let slot = self.enum_slot_mut(handle);
                let frame = slot.stack.last_mut().unwrap();
                (frame.state, frame.current_list.take())
            };

            if let Some(id) = current {
                let next = self.elements.get(id).loc_next;
                self.enum_slot_mut(handle).stack.last_mut().unwrap().current_list = next;
                let rect = self.elements.get(id).rect;
                let is_match = frame_state == FrameState::BinsInside || self.enum_slot(handle).srch_area.touches(&rect);
                if is_match {
                    return Some(id);
                } else {
                    self.enum_slot_mut(handle).stack.last_mut().unwrap().rejects += 1;
                    continue;
                }
            }

            if !self.advance_bin(handle) {
                self.enum_slot_mut(handle).stack.pop();
            }
        }
    }

    /// Move a frame past its current bin, possibly subbinning it first, and set up the next
    /// bin's list (or descend into a nested array). Returns `false` if the frame's entire
    /// range (including the oversized bucket) has been exhausted.
    fn advance_bin(&mut self, handle: EnumHandle) -> bool {
        let (array, i, subbin_flag, rejects, at_boundary) = {
            let slot = self.enum_slot(handle);
            let frame = slot.stack.last().unwrap();
            (frame.array, frame.i, frame.subbin, frame.rejects, frame.i == frame.max)
        };
        if i >= 0 && (subbin_flag || at_boundary) && rejects >= self.config.min_pop {
            self.try_subbin(array, i as usize, false);
            self.enum_slot_mut(handle).stack.last_mut().unwrap().rejects = 0;
        }

        let (state, i, max, row_max, row_delta) = {
            let slot = self.enum_slot(handle);
            let frame = slot.stack.last().unwrap();
            (frame.state, frame.i, frame.max, frame.row_max, frame.row_delta)
        };
        let num_bins = self.bin_arrays.get(array).num_bins();
        let dim_x = self.bin_arrays.get(array).dim_x;
        let wrapped_row = state == FrameState::Bins && i == row_max && i != max;
        let new_i = match state {
            FrameState::BinsInside => i + 1,
            FrameState::Bins => {
                if i == max {
                    num_bins
                } else if i == row_max {
                    i + 1 + row_delta
                } else {
                    i + 1
                }
            }
        };
        if new_i > num_bins {
            return false;
        }
        {
            let slot = self.enum_slot_mut(handle);
            let frame = slot.stack.last_mut().unwrap();
            frame.i = new_i;
            frame.rejects = 0;
            if wrapped_row {
                frame.row_max += dim_x;
            }
        }

        let sub = match &self.bin_arrays.get(array).buckets[new_i as usize] {
            Bucket::Sub(s) => Some(*s),
            Bucket::List(_) => None,
        };
        match sub {
            Some(sub) => {
                let inside_hint = self.enum_slot(handle).stack.last().unwrap().state == FrameState::BinsInside;
                let mut owned = self.take_enum_slot(handle);
                self.push_frame(&mut owned, sub, inside_hint);
                self.restore_enum_slot(handle, owned);
            }
            None => {
                let head = match &self.bin_arrays.get(array).buckets[new_i as usize] {
                    Bucket::List(h) => *h,
                    Bucket::Sub(_) => unreachable!(),
                };
                self.enum_slot_mut(handle).stack.last_mut().unwrap().current_list = head;
            }
        }
        true
    }
}

impl<T> std::fmt::Debug for BPlane<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BPlane")
            .field("count", &self.count)
            .field("bbox", &self.bbox())
            .field("stats", &self.stats())
            .finish()
    }
}
