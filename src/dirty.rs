//! Dirty rectangle tracking
//!
//! Two bounded tables of changed regions. Drawing calls add into the front
//! table; `update` folds the front into the back and hands the back table to
//! the caller's screen refresh; `swap` rotates them for the next frame so the
//! previous frame's regions still get their background repaired.

use log::{debug, trace};

use crate::rect::Rect;

/// Default upper bound on the wasted area accepted for a merge
pub const DEFAULT_WORST_MERGE: i64 = 300;
/// Default union/max-area ratio (percent) that merges without further search
pub const DEFAULT_INSTANT_MERGE: i64 = 10;

// ============================================================================
// DirtyTable
// ============================================================================

/// Bounded list of dirty rects with a locality hint for merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyTable {
    rects: Vec<Rect>,
    capacity: usize,
    /// Slot of the last successful merge; the next search starts next to it
    best: usize,
}

impl DirtyTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            rects: Vec::with_capacity(capacity),
            capacity,
            best: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn clear(&mut self) {
        self.rects.clear();
        self.best = 0;
    }

    /// Add a rect using the greedy merge heuristic.
    ///
    /// Candidates are scanned starting right before the previous best slot.
    /// A union under `instant_merge` percent of the larger area is taken at
    /// once; otherwise the candidate with the least wasted area wins if that
    /// waste is under `worst_merge`. Failing that the rect is appended, or,
    /// with the table full, merged into the best candidate anyway.
    pub fn add(&mut self, rect: Rect, worst_merge: i64, instant_merge: i64) {
        if rect.is_empty() {
            return;
        }

        let count = self.rects.len();
        let mut best_i: Option<usize> = None;
        let mut best_loss = 100_000_000_i64;

        if count > 0 {
            let mut i = (self.best + count - 1) % count;
            let a1 = rect.area();
            for _ in 0..count {
                let candidate = self.rects[i];
                let a2 = candidate.area();
                let am = rect.union(&candidate).area();

                let ratio = 100 * am / a1.max(a2);
                if ratio < instant_merge {
                    self.rects[i] = rect.union(&candidate);
                    self.best = i;
                    return;
                }

                let loss = am - a1 - a2;
                if loss < best_loss {
                    best_i = Some(i);
                    best_loss = loss;
                    self.best = i;
                }

                i = (i + 1) % count;
            }
        }

        if let Some(i) = best_i {
            if best_loss < worst_merge {
                self.rects[i] = rect.union(&self.rects[i]);
                return;
            }
        }

        if count < self.capacity {
            self.rects.push(rect);
            return;
        }

        // Table full: coverage wins over efficiency
        if count > 0 {
            let i = best_i.unwrap_or(0);
            trace!("dirty table full, forced merge into slot {}", i);
            self.rects[i] = rect.union(&self.rects[i]);
        }
    }
}

// ============================================================================
// DirtyTracker
// ============================================================================

/// Front/back table pair plus merge tuning
#[derive(Debug, Clone)]
pub struct DirtyTracker {
    front: Option<DirtyTable>,
    back: Option<DirtyTable>,
    enabled: bool,
    worst_merge: i64,
    instant_merge: i64,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self {
            front: None,
            back: None,
            enabled: false,
            worst_merge: DEFAULT_WORST_MERGE,
            instant_merge: DEFAULT_INSTANT_MERGE,
        }
    }

    /// Replace both tables with fresh ones of `maxsize` slots.
    /// Zero removes the tables, which turns every add into a no-op.
    pub fn init(&mut self, maxsize: usize) {
        debug!("dirty tables reinitialised with {} slots", maxsize);
        if maxsize > 0 {
            self.front = Some(DirtyTable::new(maxsize));
            self.back = Some(DirtyTable::new(maxsize));
        } else {
            self.front = None;
            self.back = None;
        }
    }

    pub fn enable(&mut self, enable: bool) {
        self.enabled = enable;
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Set the worst acceptable merge cost; zero keeps the current value
    pub fn set_level(&mut self, worst_merge: u16) {
        if worst_merge > 0 {
            self.worst_merge = worst_merge as i64;
        }
    }

    pub fn worst_merge(&self) -> i64 {
        self.worst_merge
    }

    pub fn set_instant_merge(&mut self, percent: u16) {
        self.instant_merge = percent as i64;
    }

    pub fn instant_merge(&self) -> i64 {
        self.instant_merge
    }

    /// Add a rect to the front table (ignores the enabled flag)
    pub fn add(&mut self, rect: Rect) {
        let (worst, instant) = (self.worst_merge, self.instant_merge);
        if let Some(front) = self.front.as_mut() {
            front.add(rect, worst, instant);
        }
    }

    pub fn front(&self) -> Option<&DirtyTable> {
        self.front.as_ref()
    }

    pub fn back(&self) -> Option<&DirtyTable> {
        self.back.as_ref()
    }

    /// Merge the front table into the back table, pass every back rect to
    /// `refresh`, and return the back table for background repair.
    /// Returns `None` when no tables exist.
    pub fn update<F>(&mut self, mut refresh: F) -> Option<&DirtyTable>
    where
        F: FnMut(&Rect),
    {
        let (worst, instant) = (self.worst_merge, self.instant_merge);
        let (Some(front), Some(back)) = (self.front.as_ref(), self.back.as_mut()) else {
            return None;
        };
        for rect in front.rects() {
            back.add(*rect, worst, instant);
        }
        for rect in back.rects() {
            refresh(rect);
        }
        trace!("dirty update: {} rects", back.len());
        self.back.as_ref()
    }

    /// Clear the back table and exchange the two
    pub fn swap(&mut self) {
        if let (Some(front), Some(back)) = (self.front.as_mut(), self.back.as_mut()) {
            back.clear();
            std::mem::swap(front, back);
        }
    }

    /// Clear the front table
    pub fn clear(&mut self) {
        if let Some(front) = self.front.as_mut() {
            front.clear();
        }
    }
}

impl Default for DirtyTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Clip a dirty rect to a `width` x `height` screen.
///
/// Mirrors the screen-update clip: a rect starting left of the screen loses
/// the overhang, one starting past the right edge collapses to zero width at
/// x=0. Only one of the vertical overhang rules applies per call.
pub fn clip_to_screen(width: u32, height: u32, rect: Rect) -> Rect {
    let sw = width as i32;
    let sh = height as i32;
    let (mut x, mut y) = (rect.x as i32, rect.y as i32);
    let (mut w, mut h) = (rect.w as i32, rect.h as i32);

    if x < 0 {
        w = if w + x > 0 { w + x } else { 0 };
        x = 0;
    }
    if x >= sw {
        x = 0;
        w = 0;
    } else if x + w >= sw {
        w = sw - x;
    }

    if y < 0 {
        h = if h + y > 0 { h + y } else { 0 };
        y = 0;
    } else if y >= sh {
        y = 0;
        h = 0;
    } else if y + h >= sh {
        h = sh - y;
    }

    Rect::new(x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn far_apart(i: i32) -> Rect {
        Rect::new(i * 100, 0, 10, 10)
    }

    #[test]
    fn test_zero_area_rejected() {
        let mut t = DirtyTable::new(4);
        t.add(Rect::new(5, 5, 0, 10), 300, 10);
        t.add(Rect::new(5, 5, 10, 0), 300, 10);
        assert!(t.is_empty());
    }

    #[test]
    fn test_disjoint_rects_fill_up_to_capacity() {
        let cap = 5;
        for n in 1..=cap {
            let mut t = DirtyTable::new(cap);
            for i in 0..n {
                t.add(far_apart(i as i32), 300, 10);
            }
            assert_eq!(t.len(), n);
        }
    }

    #[test]
    fn test_overflow_keeps_coverage() {
        let mut t = DirtyTable::new(3);
        let added: Vec<Rect> = (0..8).map(far_apart).collect();
        for r in &added {
            t.add(*r, 300, 10);
        }
        assert_eq!(t.len(), 3);
        for r in &added {
            let covered = t
                .rects()
                .iter()
                .any(|e| e.union(r) == *e);
            assert!(covered, "lost coverage of {:?}", r);
        }
    }

    #[test]
    fn test_cheap_merge_joins_neighbours() {
        let mut t = DirtyTable::new(8);
        t.add(Rect::new(0, 0, 10, 10), 300, 10);
        // Adjacent: union wastes nothing
        t.add(Rect::new(10, 0, 10, 10), 300, 10);
        assert_eq!(t.rects(), &[Rect::new(0, 0, 20, 10)]);
    }

    #[test]
    fn test_update_and_swap() {
        let mut d = DirtyTracker::new();
        assert!(d.update(|_| {}).is_none());

        d.init(4);
        d.add(far_apart(0));
        d.add(far_apart(1));

        let mut seen = Vec::new();
        let back_len = d.update(|r| seen.push(*r)).map(DirtyTable::len);
        assert_eq!(back_len, Some(2));
        assert_eq!(seen.len(), 2);

        d.swap();
        // Old front (still holding both rects) is now the back table
        assert_eq!(d.back().map(DirtyTable::len), Some(2));
        assert_eq!(d.front().map(DirtyTable::len), Some(0));
    }

    #[test]
    fn test_level_zero_is_ignored() {
        let mut d = DirtyTracker::new();
        d.set_level(0);
        assert_eq!(d.worst_merge(), DEFAULT_WORST_MERGE);
        d.set_level(50);
        assert_eq!(d.worst_merge(), 50);
    }

    #[test]
    fn test_clip_to_screen() {
        assert_eq!(clip_to_screen(100, 100, Rect::new(-5, 0, 10, 10)), Rect::new(0, 0, 5, 10));
        assert_eq!(clip_to_screen(100, 100, Rect::new(95, 95, 10, 10)), Rect::new(95, 95, 5, 5));
        assert_eq!(clip_to_screen(100, 100, Rect::new(150, 0, 10, 10)).w, 0);
        assert_eq!(clip_to_screen(100, 100, Rect::new(0, -20, 10, 10)).h, 0);
    }
}
