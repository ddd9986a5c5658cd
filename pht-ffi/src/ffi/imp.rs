//! Opaque handle types and the unsafe glue between raw pointers and
//! [`Table`]/[`Iter`].
//!
//! `pht_t` wraps a table behind a `Box`-owned pointer: the original's
//! `struct pht` is caller-allocated, but this core crate's `Table` owns a
//! `Vec` of subtables and isn't `repr(C)`, so there is no stack-allocatable
//! representation to hand back to C. `pht_iter` stays plain data, mirroring
//! the original's caller-allocated `struct pht_iter` field for field (its
//! `t` pointer becomes a subtable index here, since this crate organizes
//! subtables in a `Vec` rather than an intrusive list).

use core::ffi::c_void;

use pht::{CompareFn, Iter, RehashFn, Table};

/// Opaque handle to a [`Table`]. Always behind a pointer obtained from
/// `Box::into_raw`; callers never construct or read one directly.
pub struct pht_t(Table);

/// C-compatible mirror of the original's `struct pht_iter`.
///
/// Unlike `pht_t` this is plain data: callers allocate it and pass `&mut`
/// through every `pht_first`/`pht_firstval`/`pht_next`/etc. call, exactly as
/// the original does.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct pht_iter {
    subtable: usize,
    off: usize,
    last: usize,
    hash: usize,
}

impl pht_iter {
    fn write(&mut self, it: Iter) {
        let (subtable, off, last, hash) = it.raw_parts();
        self.subtable = subtable;
        self.off = off;
        self.last = last;
        self.hash = hash;
    }

    fn as_hashed(&self) -> Iter {
        Iter::from_raw_parts_hashed(self.subtable, self.off, self.last, self.hash)
    }

    fn as_unhashed(&self) -> Iter {
        Iter::from_raw_parts_unhashed(self.subtable, self.off, self.last, self.hash)
    }
}

fn none_to_null(found: Option<*mut c_void>) -> *mut c_void {
    found.unwrap_or(core::ptr::null_mut())
}

pub unsafe fn pht_init(rehash: RehashFn, cookie: *mut c_void) -> *mut pht_t {
    Box::into_raw(Box::new(pht_t(Table::new(rehash, cookie))))
}

pub unsafe fn pht_count(ht: *const pht_t) -> usize {
    // SAFETY: caller guarantees `ht` is a live handle from `pht_init`.
    unsafe { (*ht).0.count() }
}

pub unsafe fn pht_clear(ht: *mut pht_t) {
    // SAFETY: caller guarantees `ht` is a live handle from `pht_init`.
    unsafe { (*ht).0.clear() }
}

pub unsafe fn pht_check(ht: *const pht_t, _abortstr: *const core::ffi::c_char) -> *const pht_t {
    // SAFETY: caller guarantees `ht` is a live handle from `pht_init`. The
    // original threads `abortstr` into its own abort message; this crate's
    // check panics instead, so the string is unused but accepted to keep the
    // signature call-compatible.
    unsafe { (*ht).0.check("pht_check") };
    ht
}

pub unsafe fn pht_add(ht: *mut pht_t, hash: usize, p: *mut c_void) -> bool {
    // SAFETY: caller guarantees `ht` is a live handle from `pht_init`.
    unsafe { (*ht).0.add(hash, p) }
}

pub unsafe fn pht_del(ht: *mut pht_t, hash: usize, p: *mut c_void) -> bool {
    // SAFETY: caller guarantees `ht` is a live handle from `pht_init`.
    !unsafe { (*ht).0.del(hash, p) }.is_null()
}

pub unsafe fn pht_copy(dst: *mut pht_t, src: *const pht_t) -> bool {
    // SAFETY: caller guarantees both handles are live and `dst` is either
    // freshly initialized or cleared, per this function's header contract.
    let Some(copy) = (unsafe { (*src).0.try_clone() }) else {
        return false;
    };
    unsafe { (*dst).0 = copy };
    true
}

pub unsafe fn pht_firstval(ht: *const pht_t, it: *mut pht_iter, hash: usize) -> *mut c_void {
    // SAFETY: caller guarantees `ht` is live and `it` points at writable
    // storage for the duration of the call.
    let found = unsafe { (*ht).0.firstval(hash) };
    match found {
        Some((p, cursor)) => {
            unsafe { (*it).write(cursor) };
            p
        }
        None => core::ptr::null_mut(),
    }
}

pub unsafe fn pht_nextval(ht: *const pht_t, it: *mut pht_iter, _hash: usize) -> *mut c_void {
    // SAFETY: caller guarantees `ht` is live and `it` was produced by a
    // prior `pht_firstval`/`pht_nextval` call on the same table.
    let mut cursor = unsafe { (*it).as_hashed() };
    let found = unsafe { (*ht).0.nextval(&mut cursor) };
    unsafe { (*it).write(cursor) };
    none_to_null(found)
}

pub unsafe fn pht_delval(ht: *mut pht_t, it: *mut pht_iter) -> *mut c_void {
    // SAFETY: per the original's contract, `it` must come from the `*val`
    // family, not from `pht_first`/`pht_next`.
    let mut cursor = unsafe { (*it).as_hashed() };
    let found = unsafe { (*ht).0.delval(&mut cursor) };
    unsafe { (*it).write(cursor) };
    none_to_null(found)
}

pub unsafe fn pht_first(ht: *const pht_t, it: *mut pht_iter) -> *mut c_void {
    // SAFETY: caller guarantees `ht` is live and `it` points at writable
    // storage for the duration of the call.
    let found = unsafe { (*ht).0.first() };
    match found {
        Some((p, cursor)) => {
            unsafe { (*it).write(cursor) };
            p
        }
        None => core::ptr::null_mut(),
    }
}

pub unsafe fn pht_next(ht: *const pht_t, it: *mut pht_iter) -> *mut c_void {
    // SAFETY: caller guarantees `it` was produced by a prior
    // `pht_first`/`pht_next` call on the same table.
    let mut cursor = unsafe { (*it).as_unhashed() };
    let found = unsafe { (*ht).0.next(&mut cursor) };
    unsafe { (*it).write(cursor) };
    none_to_null(found)
}

pub unsafe fn pht_prev(ht: *const pht_t, it: *mut pht_iter) -> *mut c_void {
    let mut cursor = unsafe { (*it).as_unhashed() };
    let found = unsafe { (*ht).0.prev(&mut cursor) };
    none_to_null(found)
}

pub unsafe fn pht_get(
    ht: *const pht_t,
    hash: usize,
    cmp: CompareFn,
    ptr: *mut c_void,
) -> *mut c_void {
    // SAFETY: caller guarantees `ht` is live and `cmp` is safe to call with
    // any pointer pair this table holds plus `ptr`.
    unsafe { (*ht).0.get(hash, ptr, cmp) }
}

pub unsafe fn pht_free(ht: *mut pht_t) {
    if ht.is_null() {
        return;
    }
    // SAFETY: caller guarantees `ht` is a pointer obtained from `pht_init`
    // that has not already been freed.
    drop(unsafe { Box::from_raw(ht) });
}
