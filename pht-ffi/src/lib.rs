//! C ABI bindings for [`pht::Table`].
//!
//! These bindings are exported via `#[no_mangle]` symbols and are callable
//! from C by linking against this crate built as a `cdylib`/`staticlib` and
//! declaring the prototypes quoted in each function's doc comment below.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_safety_doc)]
#![allow(non_camel_case_types)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![warn(unused_qualifications)]
// Enable feature callouts in generated documentation:
// https://doc.rust-lang.org/beta/unstable-book/language-features/doc-cfg.html
#![cfg_attr(docsrs, feature(doc_cfg))]

mod ffi;
