//! A progressively rehashed, open-addressed hash multiset for pointer-valued
//! elements.
//!
//! [`Table`] stores opaque `*mut c_void` pointers grouped by a caller-supplied
//! hash. It does not know how to hash or compare the values it stores: the
//! owner supplies a [`RehashFn`] at construction time and a [`CompareFn`] to
//! each lookup/delete call, exactly like the C library this crate's design is
//! descended from leaves key comparison to its caller.
//!
//! The table is a *multiset*: nothing prevents two equal-by-`CompareFn`
//! pointers from coexisting, and [`Table::del`] removes at most one matching
//! entry per call.
//!
//! # Why "progressively rehashed"
//!
//! A table that outgrows its backing array in one shot has to pause and
//! rehash every entry into a bigger array before it can accept the insert
//! that triggered the growth — an operation whose cost is proportional to the
//! table's whole size, landing unpredictably on whichever caller happens to
//! trigger it. This crate instead keeps a short chain of subtables: the
//! newest one (the *primary*) accepts new entries, and older ones are drained
//! a few slots at a time on every subsequent [`Table::add`]/[`Table::del`]
//! call. Migrating one slot is almost always just a bit-twiddling move into
//! the primary; actually recomputing a hash is the exception, not the rule,
//! and even then at most one rehash call is charged to any single `add`.
//!
//! # No I/O, no logging, no configuration
//!
//! This crate allocates (fallibly, surfaced as `bool`/`Option` rather than via
//! `panic!`/abort) and nothing else: no threads, no files, no environment
//! variables. Callers embedding it in a larger system are expected to log
//! around calls into this crate, not have it log on their behalf.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

use core::ffi::c_void;

mod check;
mod iter;
mod subtable;
mod table;

pub use iter::Iter;
pub use table::Table;

/// Computes (or recomputes) the hash of a stored pointer.
///
/// Called once when a pointer is first added, and again for any pointer the
/// migration engine cannot move into the primary subtable by bit-twiddling
/// alone. `cookie` is the opaque pointer the table was constructed with,
/// threaded through unchanged; it is never touched by the table itself. Must
/// be a pure function of `ptr` (and whatever `cookie` refers to) — returning a
/// different hash for the same pointer on a later call corrupts the table.
///
/// # Safety
///
/// Implementations may assume `ptr` is non-null and was previously passed to
/// [`Table::add`] by the same caller that supplied this function.
pub type RehashFn = unsafe extern "C" fn(ptr: *mut c_void, cookie: *mut c_void) -> usize;

/// Tests whether a candidate entry (`cand`, always a pointer already stored
/// in the table) is the one being searched for (`ptr`, the needle passed to
/// [`Table::del`]/[`Table::get`]).
///
/// Returns `true` on a match. Note the `bool` return, not the tri-state
/// `int` of a C `strcmp`-style comparator: this function answers "is this the
/// one?", not "how do these order relative to each other" — there is no
/// ordering among a multiset's elements.
///
/// # Safety
///
/// Implementations may assume both pointers are non-null.
pub type CompareFn = unsafe extern "C" fn(cand: *mut c_void, ptr: *mut c_void) -> bool;
