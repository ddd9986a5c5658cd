//! The subtable chain, migration scheduling, and the public insert/delete/copy
//! operations built on top of [`crate::subtable`].

use core::ffi::c_void;

use crate::subtable::{self, fast_migrate, is_valid, Subtable, CHAIN_SAFE, KEEP_CHAIN, TOMBSTONE};
use crate::RehashFn;

/// A progressively rehashed, open-addressed hash multiset.
///
/// `Table` stores opaque `*mut c_void` pointers, grouped only by a caller
/// supplied hash; equality and any notion of "key" are entirely up to the
/// caller (see [`Table::get`]). Insertion ([`Table::add`]) never blocks on a
/// full-table rehash: growth and shrinkage are performed a few slots at a
/// time, spread across subsequent calls to `add`.
///
/// Cloning a table (to get an independent copy rather than a second handle to
/// the same one) is done with [`Table::try_clone`], which can fail the same
/// way allocation-bearing mutations can.
pub struct Table {
    tables: Vec<Box<Subtable>>,
    elems: usize,
    rehash: RehashFn,
    cookie: *mut c_void,
}

// SAFETY: `Table` owns its subtables outright and the `cookie` pointer is
// opaque caller data threaded through to `rehash`; `Table` performs no
// interior mutation through shared references, so it is `Send` exactly when
// its pointee data is, which the caller already has to guarantee to pass a
// `*mut c_void` cookie around at all. We do not implement `Sync`: concurrent
// calls to `add`/`del` on the same table are not supported (see the crate's
// concurrency notes).
unsafe impl Send for Table {}

impl Table {
    /// Creates an empty table that calls `rehash(ptr, cookie)` whenever an
    /// entry's hash must be recomputed during migration, and whose home
    /// bucket/stash derivation is otherwise opaque to the caller.
    #[must_use]
    pub fn new(rehash: RehashFn, cookie: *mut c_void) -> Self {
        Self {
            tables: Vec::new(),
            elems: 0,
            rehash,
            cookie,
        }
    }

    /// Number of entries currently stored.
    #[must_use]
    pub fn count(&self) -> usize {
        self.elems
    }

    /// Removes every entry and frees every subtable, without affecting the
    /// table's rehash function or cookie.
    pub fn clear(&mut self) {
        self.tables.clear();
        self.elems = 0;
    }

    /// Inserts `p` under the already-computed `hash`.
    ///
    /// The table's rehash function is never called here — only during
    /// migration, when the fast path can't place an older entry in the
    /// primary without knowing its hash again. Computing `hash` is entirely
    /// the caller's responsibility, exactly once per distinct pointer.
    ///
    /// Returns `false` iff allocation failed (either creating the first
    /// subtable, or creating a new primary to make room); the table is left
    /// unchanged in that case. Passing a null `p` is a caller error and also
    /// returns `false` without modifying the table.
    pub fn add(&mut self, hash: usize, p: *mut c_void) -> bool {
        if p.is_null() {
            return false;
        }

        if self.tables.is_empty() && !self.new_table(false) {
            return false;
        }

        let ptr = p as usize;
        let primary = self.tables.first().expect("just ensured above");
        if ptr & primary.common_mask != primary.common_bits && !self.update_common(p) {
            return false;
        }

        if self.tables[0].elems >= self.tables[0].max_elems()
            || self.tables[0].elems + self.tables[0].deleted >= self.tables[0].max_fill()
        {
            if !self.new_table(true) {
                return false;
            }
        }

        let primary = &mut self.tables[0];
        primary.insert(hash, p);
        self.elems += 1;

        self.mig_step();
        true
    }

    /// Ensures the primary subtable's `common_mask`/`common_bits` still cover
    /// `p`, creating a new primary if the existing one is non-empty and a
    /// narrower mask is now needed.
    ///
    /// Mirrors the C implementation's `update_common`, including the very
    /// first insert ever (`self.elems == 0`, checked across the whole table,
    /// not just the primary): that case de-commons exactly one pointer bit
    /// above bit 0, so the sole entry's slot word can never read back as
    /// `EMPTY`/`TOMBSTONE`, and shrinks the fresh primary down to one slot
    /// since it will only ever hold that single entry until the next widen.
    /// Both branches end by recomputing `perfect_bit` from the resulting
    /// mask, since nothing else does.
    fn update_common(&mut self, p: *mut c_void) -> bool {
        let ptr = p as usize;
        if self.elems == 0 {
            let spare = ptr & !1usize;
            debug_assert!(spare != 0, "a real pointer always has a spare bit above bit 0");
            let b = spare.trailing_zeros();
            let primary = self.tables.first_mut().expect("caller ensures a primary exists");
            primary.common_mask = !(1usize << b);
            primary.common_bits = ptr & primary.common_mask;
            debug_assert_eq!(primary.elems, 0);
            // Wastes space rather than scanning time: the lone entry gets no
            // benefit from more than one slot.
            primary.bits = 0;
        } else {
            let primary = self.tables.first().expect("caller ensures a primary exists");
            let widened_mask = primary.common_mask & !(primary.common_bits ^ ptr);
            if primary.elems > 0 && !self.new_table(true) {
                return false;
            }
            let primary = self.tables.first_mut().unwrap();
            primary.common_mask = widened_mask;
            primary.common_bits = ptr & widened_mask;
        }

        let primary = self.tables.first_mut().unwrap();
        primary.recompute_perfect_bit();
        debug_assert!(
            (ptr & !primary.common_mask) != 0 && (ptr & !primary.common_mask) != TOMBSTONE,
            "update_common must leave p encodable"
        );
        true
    }

    /// Allocates a fresh primary subtable sized for the current entry count
    /// and pushes it to the front of the subtable chain.
    ///
    /// `keep_chain` mirrors the C `new_table`'s handling of a primary that is
    /// being replaced while non-empty: the outgoing primary becomes a
    /// secondary, and `KEEP_CHAIN` is set on it so that imperfect entries can
    /// still migrate without a rehash as long as the chain they belong to has
    /// not been broken by a tombstone.
    ///
    /// The demoted primary, not the fresh one, is given `nextmig = len()`:
    /// it is the table about to be drained, so everything in it still counts
    /// as not-yet-migrated. The fresh primary keeps `nextmig == 0` from
    /// [`Subtable::new`], which [`fast_migrate`] relies on when this table is
    /// later used as a migration target.
    fn new_table(&mut self, keep_chain: bool) -> bool {
        let target = (self.elems + 1) * 2 * 4 / 3;
        let bits = bit_length(target.max(1));
        let mut fresh = match Subtable::new(bits) {
            Ok(t) => t,
            Err(()) => return false,
        };
        if let Some(old_primary) = self.tables.first_mut() {
            if keep_chain && old_primary.elems > 0 {
                old_primary.flags |= KEEP_CHAIN;
            }
            fresh.common_mask = old_primary.common_mask;
            fresh.common_bits = old_primary.common_bits;
            fresh.perfect_bit = old_primary.perfect_bit;
            old_primary.nextmig = old_primary.len();
        }
        self.tables.insert(0, Box::new(fresh));
        true
    }

    /// Performs a single unit of bounded migration work: at most one rehash
    /// call, and at most `SLOTS_PER_STEP` slots scanned in the oldest
    /// subtable.
    ///
    /// Only the first item this call drains is allowed to force a rehash;
    /// every later one this call touches must migrate without one, matching
    /// the structure's one-rehash-per-`add`/`del` worst case. If a later item
    /// would need a second rehash, the scan stops and puts that slot back for
    /// the next call instead of spending it. Extra items migrated beyond the
    /// mandatory first one bank a `credit`, which a future call spends to
    /// skip its own scan entirely. A no-op when there is no secondary
    /// subtable to drain.
    fn mig_step(&mut self) {
        const SLOTS_PER_STEP: usize = 8;

        if self.tables.len() < 2 {
            return;
        }

        {
            let mig = self.tables.last_mut().expect("len >= 2");
            if mig.credit > 0 {
                mig.credit -= 1;
                return;
            }
        }

        let mut rehashed = false;
        let mut migrated_any = false;

        for _ in 0..SLOTS_PER_STEP {
            if self.tables.last().expect("len >= 2").nextmig == 0 {
                break;
            }

            let (off, e) = {
                let mig = self.tables.last_mut().expect("len >= 2");
                mig.nextmig -= 1;
                let off = mig.nextmig;
                (off, mig.slots[off])
            };

            if !is_valid(e) {
                let mig = self.tables.last_mut().expect("len >= 2");
                if e == TOMBSTONE {
                    mig.deleted -= 1;
                }
                if mig.chain_start == off + 1 {
                    mig.chain_start = 0;
                } else if off == 0 && mig.chain_start != 0 {
                    mig.flags |= CHAIN_SAFE;
                }
                continue;
            }

            // Only the mandatory first drained item (migrated_any == false)
            // may still use the call's one rehash.
            let fast_only = migrated_any && rehashed;

            let fast_ok = {
                let (primary, rest) = self.tables.split_first_mut().expect("len >= 2");
                let mig = rest.last_mut().expect("len >= 2");
                fast_migrate(primary, mig, e)
            };

            if !fast_ok && fast_only {
                // A second rehash would be needed; leave this slot for the
                // next call instead.
                self.tables.last_mut().expect("len >= 2").nextmig += 1;
                break;
            }

            if !fast_ok {
                let p = self.tables.last().expect("len >= 2").entry_to_ptr(e);
                // SAFETY: `p` is a pointer this table has already accepted
                // via `add`, so it remains valid to pass to `rehash`.
                let hash = unsafe { (self.rehash)(p, self.cookie) };
                self.tables[0].insert(hash, p);
                rehashed = true;
            }

            let mig = self.tables.last_mut().expect("len >= 2");
            mig.elems -= 1;
            // Clearing the source slot keeps it from being visible twice (in
            // both this subtable and the primary it just moved to) to `del`
            // and iteration, which both stop only at `EMPTY`.
            mig.slots[off] = TOMBSTONE;
            mig.deleted += 1;
            if mig.chain_start == off + 1 {
                mig.chain_start = 0;
            }
            if migrated_any {
                mig.credit += 1;
            }
            migrated_any = true;
        }

        if self.tables.len() >= 2 && self.tables.last().expect("len >= 2").elems == 0 {
            self.tables.pop();
        }
    }

    /// Deletes the entry equal to `ptr` by pointer identity, scanning `ptr`'s
    /// hash chain across every subtable.
    ///
    /// Unlike [`Table::get`], this compares candidates to `ptr` directly
    /// rather than through a caller-supplied comparator: a multiset has no
    /// other notion of "the same element" to delete by. Returns the removed
    /// pointer, or a null pointer if no match was found. `hash` must be the
    /// same value `rehash(ptr, cookie)` would produce.
    pub fn del(&mut self, hash: usize, ptr: *mut c_void) -> *mut c_void {
        for idx in 0..self.tables.len() {
            let t = &mut self.tables[idx];
            let mask = t.mask();
            let mut i = t.bucket(hash);
            let stash = t.stash_bits(hash);
            loop {
                let e = t.slots[i];
                if e == subtable::EMPTY {
                    break;
                }
                if e != TOMBSTONE
                    && e & t.common_mask & !t.perfect_mask() == stash
                    && t.entry_to_ptr(e) == ptr
                {
                    t.slots[i] = TOMBSTONE;
                    t.elems -= 1;
                    t.deleted += 1;
                    self.elems -= 1;
                    if idx > 0 && t.elems == 0 {
                        self.tables.remove(idx);
                    }
                    self.mig_step();
                    return ptr;
                }
                i = (i + 1) & mask;
            }
        }
        core::ptr::null_mut()
    }

    /// Creates an independent copy of this table: a deep clone of every
    /// subtable's slots and bookkeeping.
    ///
    /// Returns `None` on allocation failure, leaving `self` untouched.
    #[must_use]
    pub fn try_clone(&self) -> Option<Self> {
        let mut tables = Vec::new();
        tables.try_reserve_exact(self.tables.len()).ok()?;
        for t in &self.tables {
            let mut slots = Vec::new();
            slots.try_reserve_exact(t.slots.len()).ok()?;
            slots.extend_from_slice(&t.slots);
            tables.push(Box::new(Subtable {
                slots,
                bits: t.bits,
                elems: t.elems,
                deleted: t.deleted,
                nextmig: t.nextmig,
                chain_start: t.chain_start,
                common_bits: t.common_bits,
                common_mask: t.common_mask,
                perfect_bit: t.perfect_bit,
                flags: t.flags,
                credit: t.credit,
            }));
        }
        Some(Self {
            tables,
            elems: self.elems,
            rehash: self.rehash,
            cookie: self.cookie,
        })
    }

    pub(crate) fn tables(&self) -> &[Box<Subtable>] {
        &self.tables
    }

    pub(crate) fn tables_mut(&mut self) -> &mut Vec<Box<Subtable>> {
        &mut self.tables
    }

    pub(crate) fn elems_mut(&mut self) -> &mut usize {
        &mut self.elems
    }

    pub(crate) fn rehash_fn(&self) -> RehashFn {
        self.rehash
    }

    pub(crate) fn cookie(&self) -> *mut c_void {
        self.cookie
    }
}

/// Smallest `bits` such that `1 << bits >= n`, with a floor of `1` so a table
/// with fewer than two slots (which the bump rule and migration math can't
/// reason about) is never created.
fn bit_length(n: usize) -> u32 {
    let bits = (usize::BITS - n.saturating_sub(1).leading_zeros()).max(1);
    bits
}
