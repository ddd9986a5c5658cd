//! Whole-table lifecycle scenarios exercising only the public API.
//!
//! Elements are heap-leaked, null-terminated C strings: `rehash` recovers
//! the byte span via [`CStr::from_ptr`] and hashes it with FNV-1a, the same
//! way a caller embedding this table to deduplicate interned C strings
//! would. `get`'s comparator matches by content, not by address, since two
//! distinct allocations can hold equal bytes.

use std::collections::HashSet;
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use pht::Table;

fn fnv1a(bytes: &[u8]) -> usize {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash as usize
}

unsafe extern "C" fn rehash_cstr(ptr: *mut c_void, _cookie: *mut c_void) -> usize {
    let s = unsafe { CStr::from_ptr(ptr.cast::<c_char>()) };
    fnv1a(s.to_bytes())
}

unsafe extern "C" fn cstr_eq(cand: *mut c_void, ptr: *mut c_void) -> bool {
    let a = unsafe { CStr::from_ptr(cand.cast::<c_char>()) };
    let b = unsafe { CStr::from_ptr(ptr.cast::<c_char>()) };
    a == b
}

fn leak(s: &str) -> *mut c_void {
    CString::new(s).unwrap().into_raw().cast::<c_void>()
}

fn hash_of(s: &str) -> usize {
    fnv1a(s.as_bytes())
}

fn words(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("word-number-{i:04}")).collect()
}

#[test]
fn empty_table_scenario() {
    let t = Table::new(rehash_cstr, core::ptr::null_mut());
    let needle = leak("my ass-clap keeps alerting the bees!");
    let hash = hash_of("my ass-clap keeps alerting the bees!");
    assert!(t.get(hash, needle, cstr_eq).is_null());
    assert!(t.firstval(hash).is_none());
    assert_eq!(t.count(), 0);
    unsafe { drop(CString::from_raw(needle.cast::<c_char>())) };
}

#[test]
fn del_on_empty_table_returns_false() {
    let mut t = Table::new(rehash_cstr, core::ptr::null_mut());
    let needle = leak("absent");
    assert!(t.del(hash_of("absent"), needle).is_null());
    unsafe { drop(CString::from_raw(needle.cast::<c_char>())) };
}

#[test]
fn thirty_seven_strings_are_each_retrievable_after_every_insert() {
    let mut t = Table::new(rehash_cstr, core::ptr::null_mut());
    let strings = words(37);
    let mut inserted: Vec<*mut c_void> = Vec::new();

    for (i, s) in strings.iter().enumerate() {
        let p = leak(s);
        assert!(t.add(hash_of(s), p));
        inserted.push(p);
        assert_eq!(t.count(), i + 1);

        for (j, earlier) in strings.iter().enumerate().take(i + 1) {
            let probe = leak(earlier);
            let found = t.get(hash_of(earlier), probe, cstr_eq);
            assert!(!found.is_null(), "string {j} missing after insert {i}");
            unsafe { drop(CString::from_raw(probe.cast::<c_char>())) };
        }
        for not_yet in strings.iter().skip(i + 1) {
            let probe = leak(not_yet);
            let found = t.get(hash_of(not_yet), probe, cstr_eq);
            assert!(found.is_null(), "string {not_yet} found too early");
            unsafe { drop(CString::from_raw(probe.cast::<c_char>())) };
        }
        t.check("after insert");
    }

    for p in inserted {
        unsafe { drop(CString::from_raw(p.cast::<c_char>())) };
    }
}

#[test]
fn deleting_odd_indices_leaves_nineteen_even_survivors() {
    let mut t = Table::new(rehash_cstr, core::ptr::null_mut());
    let strings = words(37);
    let mut inserted: Vec<*mut c_void> = Vec::new();
    for s in &strings {
        let p = leak(s);
        assert!(t.add(hash_of(s), p));
        inserted.push(p);
    }

    for (i, &p) in inserted.iter().enumerate() {
        if i % 2 == 1 {
            assert_eq!(t.del(hash_of(&strings[i]), p), p);
        }
    }
    t.check("after odd deletion");
    assert_eq!(t.count(), 19);

    for (i, s) in strings.iter().enumerate() {
        let probe = leak(s);
        let found = t.get(hash_of(s), probe, cstr_eq);
        if i % 2 == 1 {
            assert!(found.is_null(), "odd index {i} should be gone");
        } else {
            assert!(!found.is_null(), "even index {i} should survive");
        }
        unsafe { drop(CString::from_raw(probe.cast::<c_char>())) };
    }

    for (i, &p) in inserted.iter().enumerate() {
        if i % 2 == 0 {
            unsafe { drop(CString::from_raw(p.cast::<c_char>())) };
        }
    }
}

#[test]
fn one_twenty_seven_strings_force_resizes_and_copy_equivalence() {
    let mut src = Table::new(rehash_cstr, core::ptr::null_mut());
    let strings = words(127);
    let mut inserted: Vec<*mut c_void> = Vec::new();
    for s in &strings {
        let p = leak(s);
        assert!(src.add(hash_of(s), p));
        inserted.push(p);
        src.check("after insert");
    }

    let dst = src.try_clone().expect("clone should not fail under a fresh allocator");

    for s in &strings {
        let probe = leak(s);
        let hash = hash_of(s);
        assert!(!src.get(hash, probe, cstr_eq).is_null());
        assert!(!dst.get(hash, probe, cstr_eq).is_null());
        unsafe { drop(CString::from_raw(probe.cast::<c_char>())) };
    }
    assert_eq!(src.count(), dst.count());

    let mut seen_src = HashSet::new();
    if let Some((p, mut it)) = src.first() {
        seen_src.insert(p as usize);
        while let Some(p) = src.next(&mut it) {
            seen_src.insert(p as usize);
        }
    }
    let mut seen_dst = HashSet::new();
    if let Some((p, mut it)) = dst.first() {
        seen_dst.insert(p as usize);
        while let Some(p) = dst.next(&mut it) {
            seen_dst.insert(p as usize);
        }
    }
    assert_eq!(seen_src, seen_dst);

    for p in inserted {
        unsafe { drop(CString::from_raw(p.cast::<c_char>())) };
    }
}

#[test]
fn delval_drains_every_element_via_hashed_iteration() {
    let mut t = Table::new(rehash_cstr, core::ptr::null_mut());
    let strings = words(127);
    let mut inserted: Vec<*mut c_void> = Vec::new();
    for s in &strings {
        let p = leak(s);
        assert!(t.add(hash_of(s), p));
        inserted.push(p);
    }
    assert_eq!(t.count(), 127);

    for (s, &p) in strings.iter().zip(inserted.iter()) {
        let hash = hash_of(s);
        let found = t.firstval(hash);
        let (first, mut it) = found.expect("element must still be present");
        assert_eq!(first, p);
        let next_match = t.delval(&mut it);
        assert!(next_match.is_none(), "only one entry shares this hash");
    }

    t.check("after full delval drain");
    assert_eq!(t.count(), 0);
    assert!(t.first().is_none());

    for p in inserted {
        unsafe { drop(CString::from_raw(p.cast::<c_char>())) };
    }
}

#[test]
fn zero_pointer_is_rejected_by_add_and_del() {
    let mut t = Table::new(rehash_cstr, core::ptr::null_mut());
    assert!(!t.add(42, core::ptr::null_mut()));
    assert_eq!(t.count(), 0);
    assert!(t.del(42, core::ptr::null_mut()).is_null());
}

#[test]
fn migration_keeps_earlier_inserts_visible_throughout_growth() {
    let mut t = Table::new(rehash_cstr, core::ptr::null_mut());
    let strings = words(300);
    let mut inserted: Vec<*mut c_void> = Vec::new();
    for s in &strings {
        let p = leak(s);
        assert!(t.add(hash_of(s), p));
        inserted.push(p);

        for earlier in &strings[..=inserted.len() - 1] {
            let probe = leak(earlier);
            let found = t.get(hash_of(earlier), probe, cstr_eq);
            assert!(!found.is_null());
            unsafe { drop(CString::from_raw(probe.cast::<c_char>())) };
        }
    }

    for p in inserted {
        unsafe { drop(CString::from_raw(p.cast::<c_char>())) };
    }
}
