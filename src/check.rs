//! Debug-only invariant checking.
//!
//! [`Table::check`] walks every subtable and re-derives each entry's hash via
//! the table's own rehash function, verifying that stash bits and perfect-bit
//! placement are still internally consistent. It is compiled to a no-op
//! outside debug builds, matching the C original's `#ifndef NDEBUG` self-check
//! — the cost of rehashing every live entry is not something a release build
//! should pay on every call site that wants to assert table health.

use crate::subtable::{EMPTY, TOMBSTONE};
use crate::table::Table;

impl Table {
    /// Validates every invariant this table is supposed to uphold, panicking
    /// with `label` included in the message if one doesn't hold.
    ///
    /// A no-op in release builds.
    #[cfg(debug_assertions)]
    pub fn check(&self, label: &str) {
        let mut total = 0usize;
        for (idx, t) in self.tables().iter().enumerate() {
            let mut elems = 0usize;
            let mut deleted = 0usize;
            for (slot_idx, &e) in t.slots.iter().enumerate() {
                match e {
                    EMPTY => {}
                    TOMBSTONE => deleted += 1,
                    _ => {
                        elems += 1;
                        let p = t.entry_to_ptr(e);
                        // SAFETY: `p` is a pointer this table has already
                        // accepted, so it remains valid to pass to `rehash`.
                        let hash = unsafe { (self.rehash_fn())(p, self.cookie()) };
                        assert_eq!(
                            e & t.common_mask & !t.perfect_mask(),
                            t.stash_bits(hash),
                            "{label}: stash mismatch in subtable {idx} slot {slot_idx}"
                        );
                        if e & t.perfect_mask() != 0 {
                            assert_eq!(
                                t.bucket(hash),
                                slot_idx,
                                "{label}: perfect-bit entry not at its home bucket \
                                 in subtable {idx} slot {slot_idx}"
                            );
                        }
                    }
                }
            }
            assert_eq!(
                elems, t.elems,
                "{label}: elems count mismatch in subtable {idx}"
            );
            assert_eq!(
                deleted, t.deleted,
                "{label}: tombstone count mismatch in subtable {idx}"
            );
            assert!(
                t.nextmig <= t.len(),
                "{label}: migration cursor out of bounds in subtable {idx}"
            );
            total += elems;
        }
        assert_eq!(total, self.count(), "{label}: total elems mismatch");
    }

    /// A no-op in release builds; see the debug-build implementation above.
    #[cfg(not(debug_assertions))]
    #[inline]
    pub fn check(&self, _label: &str) {}
}

#[cfg(test)]
mod tests {
    use core::ffi::c_void;

    use super::*;

    unsafe extern "C" fn identity_hash(p: *mut c_void, _cookie: *mut c_void) -> usize {
        p as usize
    }

    #[test]
    fn check_passes_on_populated_table() {
        let mut t = Table::new(identity_hash, core::ptr::null_mut());
        for v in (1..=64usize).map(|v| (v * 8) as *mut c_void) {
            assert!(t.add(v as usize, v));
        }
        t.check("after inserts");
    }

    #[test]
    fn check_passes_after_deletions() {
        let mut t = Table::new(identity_hash, core::ptr::null_mut());
        let values: Vec<*mut c_void> = (1..=64usize).map(|v| (v * 8) as *mut c_void).collect();
        for &v in &values {
            assert!(t.add(v as usize, v));
        }
        for &v in values.iter().step_by(2) {
            let hash = v as usize;
            assert_eq!(t.del(hash, v), v);
        }
        t.check("after deletions");
    }
}
