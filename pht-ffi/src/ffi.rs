//! C ABI bindings for [`pht::Table`], matching the original `pht.h` header.
//!
//! These bindings are exported via `#[no_mangle]` symbol bindings. They are
//! callable from C by including `pht.h` and linking against this crate built
//! as a `cdylib`/`staticlib`.

use core::ffi::c_void;

mod imp;

pub use imp::{pht_iter, pht_t};

/// # Header declaration
///
/// ```c
/// extern void pht_init(struct pht *ht,
/// 	size_t (*rehash)(const void *elem, void *priv), void *priv);
/// ```
#[no_mangle]
unsafe extern "C" fn pht_init(rehash: pht::RehashFn, cookie: *mut c_void) -> *mut pht_t {
    imp::pht_init(rehash, cookie)
}

/// # Header declaration
///
/// ```c
/// extern size_t pht_count(const struct pht *ht);
/// ```
#[no_mangle]
unsafe extern "C" fn pht_count(ht: *const pht_t) -> usize {
    unsafe { imp::pht_count(ht) }
}

/// # Header declaration
///
/// ```c
/// extern void pht_clear(struct pht *ht);
/// ```
#[no_mangle]
unsafe extern "C" fn pht_clear(ht: *mut pht_t) {
    unsafe { imp::pht_clear(ht) }
}

/// # Header declaration
///
/// ```c
/// extern struct pht *pht_check(const struct pht *ht, const char *abortstr);
/// ```
#[no_mangle]
unsafe extern "C" fn pht_check(
    ht: *const pht_t,
    abortstr: *const core::ffi::c_char,
) -> *const pht_t {
    unsafe { imp::pht_check(ht, abortstr) }
}

/// # Header declaration
///
/// ```c
/// extern bool pht_add(struct pht *ht, size_t hash, const void *p);
/// ```
#[no_mangle]
unsafe extern "C" fn pht_add(ht: *mut pht_t, hash: usize, p: *mut c_void) -> bool {
    unsafe { imp::pht_add(ht, hash, p) }
}

/// # Header declaration
///
/// ```c
/// extern bool pht_del(struct pht *ht, size_t hash, const void *p);
/// ```
#[no_mangle]
unsafe extern "C" fn pht_del(ht: *mut pht_t, hash: usize, p: *mut c_void) -> bool {
    unsafe { imp::pht_del(ht, hash, p) }
}

/// # Header declaration
///
/// ```c
/// extern bool pht_copy(struct pht *dst, const struct pht *src);
/// ```
#[no_mangle]
unsafe extern "C" fn pht_copy(dst: *mut pht_t, src: *const pht_t) -> bool {
    unsafe { imp::pht_copy(dst, src) }
}

/// # Header declaration
///
/// ```c
/// extern void *pht_firstval(const struct pht *ht,
/// 	struct pht_iter *it, size_t hash);
/// ```
#[no_mangle]
unsafe extern "C" fn pht_firstval(ht: *const pht_t, it: *mut pht_iter, hash: usize) -> *mut c_void {
    unsafe { imp::pht_firstval(ht, it, hash) }
}

/// # Header declaration
///
/// ```c
/// extern void *pht_nextval(const struct pht *ht,
/// 	struct pht_iter *it, size_t hash);
/// ```
#[no_mangle]
unsafe extern "C" fn pht_nextval(ht: *const pht_t, it: *mut pht_iter, hash: usize) -> *mut c_void {
    unsafe { imp::pht_nextval(ht, it, hash) }
}

/// # Header declaration
///
/// ```c
/// extern void pht_delval(struct pht *ht, struct pht_iter *it);
/// ```
#[no_mangle]
unsafe extern "C" fn pht_delval(ht: *mut pht_t, it: *mut pht_iter) -> *mut c_void {
    unsafe { imp::pht_delval(ht, it) }
}

/// # Header declaration
///
/// ```c
/// extern void *pht_first(const struct pht *ht, struct pht_iter *it);
/// ```
#[no_mangle]
unsafe extern "C" fn pht_first(ht: *const pht_t, it: *mut pht_iter) -> *mut c_void {
    unsafe { imp::pht_first(ht, it) }
}

/// # Header declaration
///
/// ```c
/// extern void *pht_next(const struct pht *ht, struct pht_iter *it);
/// ```
#[no_mangle]
unsafe extern "C" fn pht_next(ht: *const pht_t, it: *mut pht_iter) -> *mut c_void {
    unsafe { imp::pht_next(ht, it) }
}

/// # Header declaration
///
/// ```c
/// extern void *pht_prev(const struct pht *ht, struct pht_iter *it);
/// ```
#[no_mangle]
unsafe extern "C" fn pht_prev(ht: *const pht_t, it: *mut pht_iter) -> *mut c_void {
    unsafe { imp::pht_prev(ht, it) }
}

/// # Header declaration
///
/// ```c
/// static inline void *pht_get(const struct pht *ht, size_t h,
/// 	bool (*cmp)(const void *cand, void *ptr), const void *ptr)
/// ```
///
/// The original declares this `static inline`, folding it into a loop over
/// `pht_firstval`/`pht_nextval` at every call site. This crate exports it as
/// an ordinary symbol instead, since a `cdylib`/`staticlib` boundary has no
/// way to inline into its caller.
#[no_mangle]
unsafe extern "C" fn pht_get(
    ht: *const pht_t,
    hash: usize,
    cmp: pht::CompareFn,
    ptr: *mut c_void,
) -> *mut c_void {
    unsafe { imp::pht_get(ht, hash, cmp, ptr) }
}

/// Not part of the original header: the original's `struct pht` is
/// stack-allocated by its caller and torn down by letting it go out of
/// scope. This crate's handle is heap-allocated behind an opaque pointer
/// instead (see [`imp`]'s module doc), so something has to free it.
#[no_mangle]
unsafe extern "C" fn pht_free(ht: *mut pht_t) {
    unsafe { imp::pht_free(ht) }
}
