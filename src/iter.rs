//! Iteration over a [`Table`]'s entries: either restricted to one hash's
//! chain ([`Table::firstval`]/[`Table::nextval`]), or over every entry
//! regardless of hash ([`Table::first`]/[`Table::next`]).

use core::ffi::c_void;

use crate::subtable::{is_valid, TOMBSTONE};
use crate::table::Table;

/// Cursor produced by [`Table::firstval`]/[`Table::first`] and advanced by
/// [`Table::nextval`]/[`Table::next`].
///
/// An `Iter` borrows nothing from the table it was created over; instead it
/// records enough position information (which subtable, which slot, and for
/// hashed iteration, the hash itself) to resume a scan. Mutating the table
/// between calls invalidates any outstanding iterator over it, per the
/// crate's concurrency notes — this is enforced by convention, not by the
/// borrow checker, matching the C original's own contract.
#[derive(Clone, Copy)]
pub struct Iter {
    subtable: usize,
    off: usize,
    last: usize,
    hash: usize,
    hashed: bool,
}

impl Iter {
    /// Exposes this cursor's position fields, for an FFI layer that needs to
    /// copy them into a caller-allocated, C-struct-compatible cursor rather
    /// than box it up.
    #[must_use]
    pub fn raw_parts(&self) -> (usize, usize, usize, usize) {
        (self.subtable, self.off, self.last, self.hash)
    }

    /// Rebuilds a hashed-iteration cursor from the fields returned by
    /// [`Iter::raw_parts`].
    #[must_use]
    pub fn from_raw_parts_hashed(subtable: usize, off: usize, last: usize, hash: usize) -> Self {
        Iter {
            subtable,
            off,
            last,
            hash,
            hashed: true,
        }
    }

    /// Rebuilds a full-iteration cursor from the fields returned by
    /// [`Iter::raw_parts`].
    #[must_use]
    pub fn from_raw_parts_unhashed(subtable: usize, off: usize, last: usize, hash: usize) -> Self {
        Iter {
            subtable,
            off,
            last,
            hash,
            hashed: false,
        }
    }
}

impl Table {
    /// Begins a scan restricted to entries whose home bucket matches `hash`,
    /// returning the first match and a cursor to find the rest.
    ///
    /// Returns `None` if no entry in the table hashes to `hash`'s chain.
    #[must_use]
    pub fn firstval(&self, hash: usize) -> Option<(*mut c_void, Iter)> {
        let mut it = Iter {
            subtable: 0,
            off: 0,
            last: 0,
            hash,
            hashed: true,
        };
        self.table_val(&mut it).map(|p| (p, it))
    }

    /// Resumes a hashed scan started by [`Table::firstval`].
    ///
    /// Returns `None` once the chain is exhausted.
    #[must_use]
    pub fn nextval(&self, it: &mut Iter) -> Option<*mut c_void> {
        debug_assert!(it.hashed);
        self.table_next(it)
    }

    /// Deletes the entry last returned by [`Table::nextval`]/[`Table::firstval`]
    /// and advances `it` past it, returning the next match if any.
    ///
    /// `it` must be a cursor produced by this same table and must not have
    /// been invalidated by an intervening mutation other than this call.
    pub fn delval(&mut self, it: &mut Iter) -> Option<*mut c_void> {
        debug_assert!(it.hashed);
        let subtable = it.subtable;
        if subtable >= self.tables().len() {
            return None;
        }
        let off = it.off;
        {
            let t = &mut self.tables_mut()[subtable];
            debug_assert!(is_valid(t.slots[off]));
            t.slots[off] = TOMBSTONE;
            t.elems -= 1;
            t.deleted += 1;
        }
        *self.elems_mut() -= 1;

        if subtable > 0 && self.tables()[subtable].elems == 0 {
            self.tables_mut().remove(subtable);
            // Every subtable after `subtable` just slid down one index, so
            // `it.subtable` (unchanged) now names what used to be the next
            // subtable. Its stale `off`/`last` belong to the subtable that
            // was just removed, so start this one fresh from `hash`'s home
            // bucket instead of resuming a mid-scan.
            return self.probe_later_subtables(it);
        }

        self.table_next(it)
    }

    /// Begins a full scan over every entry in the table, regardless of hash.
    #[must_use]
    pub fn first(&self) -> Option<(*mut c_void, Iter)> {
        let mut it = Iter {
            subtable: 0,
            off: 0,
            last: 0,
            hash: 0,
            hashed: false,
        };
        let first = self.scan_forward_all(&mut it);
        first.map(|p| (p, it))
    }

    /// Resumes a full scan started by [`Table::first`].
    #[must_use]
    pub fn next(&self, it: &mut Iter) -> Option<*mut c_void> {
        debug_assert!(!it.hashed);
        it.off += 1;
        self.scan_forward_all(it)
    }

    /// Reverse iteration. Unimplemented: always returns `None`.
    #[must_use]
    pub fn prev(&self, _it: &mut Iter) -> Option<*mut c_void> {
        None
    }

    /// Finds the first entry for which `cmp(candidate, ptr)` holds, starting
    /// from `hash`'s chain.
    ///
    /// This is the read-only counterpart to [`Table::del`]: it does not
    /// remove anything. Returns a null pointer if no entry matches.
    #[must_use]
    pub fn get(&self, hash: usize, ptr: *mut c_void, cmp: crate::CompareFn) -> *mut c_void {
        let found = self.firstval(hash);
        let (first, mut it) = match found {
            Some(pair) => pair,
            None => return core::ptr::null_mut(),
        };
        // SAFETY: `cmp` is caller-supplied and applied only to pointers this
        // table has previously accepted.
        if unsafe { cmp(first, ptr) } {
            return first;
        }
        while let Some(cand) = self.nextval(&mut it) {
            if unsafe { cmp(cand, ptr) } {
                return cand;
            }
        }
        core::ptr::null_mut()
    }

    /// Probes `hash`'s chain from its home bucket in the first (newest)
    /// subtable, falling through to successively older subtables.
    fn table_val(&self, it: &mut Iter) -> Option<*mut c_void> {
        let t = self.tables().get(it.subtable)?;
        it.off = t.bucket(it.hash);
        it.last = it.off;
        if let Some(p) = self.probe_current_subtable(it, true) {
            return Some(p);
        }
        it.subtable += 1;
        self.probe_later_subtables(it)
    }

    /// Advances a hashed-iteration cursor to the next occupied slot in
    /// `hash`'s chain, resuming just past `it.off` in the subtable it
    /// currently points at, then falling through to successively older
    /// subtables when the chain runs out in the current one.
    fn table_next(&self, it: &mut Iter) -> Option<*mut c_void> {
        if it.subtable < self.tables().len() {
            if let Some(p) = self.probe_current_subtable(it, false) {
                return Some(p);
            }
            it.subtable += 1;
        }
        self.probe_later_subtables(it)
    }

    /// Probes a single subtable's open-addressed probe sequence for `it.hash`,
    /// stopping at the first `EMPTY` slot (nothing with this hash can exist
    /// past it) or upon wrapping back to `it.last`.
    ///
    /// `from_home` selects where probing starts: at `it.off` itself (the
    /// initial lookup in a subtable), or one slot past it (resuming a scan
    /// already in progress).
    fn probe_current_subtable(&self, it: &mut Iter, from_home: bool) -> Option<*mut c_void> {
        let t = self.tables().get(it.subtable)?;
        let mask = t.mask();
        if !from_home {
            it.off = (it.off + 1) & mask;
            if it.off == it.last {
                return None;
            }
        }
        loop {
            let e = t.slots[it.off];
            if e == crate::subtable::EMPTY {
                return None;
            }
            if is_valid(e) && matches_stash(t, e, it.hash) {
                return Some(t.entry_to_ptr(e));
            }
            it.off = (it.off + 1) & mask;
            if it.off == it.last {
                return None;
            }
        }
    }

    /// Probes each subtable from `it.subtable` onward, starting at that
    /// hash's home bucket in every one of them.
    fn probe_later_subtables(&self, it: &mut Iter) -> Option<*mut c_void> {
        loop {
            let t = self.tables().get(it.subtable)?;
            it.off = t.bucket(it.hash);
            it.last = it.off;
            if let Some(p) = self.probe_current_subtable(it, true) {
                return Some(p);
            }
            it.subtable += 1;
        }
    }

    /// Shared cursor-advance logic for full (non-hashed) iteration: walks
    /// forward from `it.off` in `it.subtable`, falling through to
    /// successive subtables, until an occupied slot or the end of the chain
    /// is found.
    fn scan_forward_all(&self, it: &mut Iter) -> Option<*mut c_void> {
        loop {
            let t = self.tables().get(it.subtable)?;
            while it.off < t.len() {
                let e = t.slots[it.off];
                if is_valid(e) {
                    return Some(t.entry_to_ptr(e));
                }
                it.off += 1;
            }
            it.subtable += 1;
            it.off = 0;
        }
    }
}

fn matches_stash(t: &crate::subtable::Subtable, e: usize, hash: usize) -> bool {
    e & t.common_mask & !t.perfect_mask() == t.stash_bits(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "C" fn identity_hash(p: *mut c_void, _cookie: *mut c_void) -> usize {
        p as usize
    }

    unsafe extern "C" fn ptr_eq(cand: *mut c_void, ptr: *mut c_void) -> bool {
        cand == ptr
    }

    #[test]
    fn first_on_empty_table_is_none() {
        let t = Table::new(identity_hash, core::ptr::null_mut());
        assert!(t.first().is_none());
    }

    #[test]
    fn firstval_on_empty_table_is_none() {
        let t = Table::new(identity_hash, core::ptr::null_mut());
        assert!(t.firstval(42).is_none());
    }

    #[test]
    fn full_iteration_visits_every_entry() {
        let mut t = Table::new(identity_hash, core::ptr::null_mut());
        let values: Vec<*mut c_void> = (1..=16usize).map(|v| (v * 8) as *mut c_void).collect();
        for &v in &values {
            assert!(t.add(v as usize, v));
        }

        let mut seen = Vec::new();
        if let Some((p, mut it)) = t.first() {
            seen.push(p as usize);
            while let Some(p) = t.next(&mut it) {
                seen.push(p as usize);
            }
        }
        seen.sort_unstable();
        let mut expected: Vec<usize> = values.iter().map(|&p| p as usize).collect();
        expected.sort_unstable();
        assert_eq!(seen, expected);
    }

    #[test]
    fn get_finds_inserted_pointer() {
        let mut t = Table::new(identity_hash, core::ptr::null_mut());
        let p = 0x4000 as *mut c_void;
        let hash = p as usize;
        assert!(t.add(hash, p));
        assert_eq!(t.get(hash, p, ptr_eq), p);
    }

    #[test]
    fn get_misses_absent_pointer() {
        let t = Table::new(identity_hash, core::ptr::null_mut());
        let p = 0x4000 as *mut c_void;
        assert!(t.get(p as usize, p, ptr_eq).is_null());
    }
}
