#![no_std]
#![cfg_attr(not(feature = "std"), allow(dead_code))]

//! sinc: a scalable termination-detecting reduction barrier.
//!
//! A sinc coordinates the completion of an unknown-in-advance fan-out of
//! worker tasks and, optionally, folds each task's contribution into a
//! single reduced result via a caller-supplied associative-commutative
//! operator. It answers two coupled questions: *have all expected
//! participants reported in?* and *what is the combined value of their
//! contributions?*
//!
//! The design is a direct port of qthreads' `qt_sinc_t` (see
//! `examples/original_source/src/sincs/donecount.c`): a participant counter
//! updated by atomic fetch-and-add, a NUMA-aware per-worker scratch buffer
//! laid out to avoid false sharing across shepherds (NUMA-node-sized
//! locality domains), and a full-empty latch that releases waiters exactly
//! once, on the submit that drives the counter to zero.
//!
//! ```
//! use sinc::Sinc;
//!
//! fn add(acc: &mut i64, v: &i64) {
//!     *acc += v;
//! }
//!
//! // Barrier-only mode: no reduction, just "has everyone reported in".
//! let barrier = Sinc::<()>::barrier(0);
//! assert_eq!(barrier.wait(), None);
//! ```
//!
//! # Features
//! - `std` (default): OS-blocking latch, the reference worker-pool
//!   [`Runtime`](topology::Runtime) used when no host runtime is installed.
//!   Without it the crate is `no_std` and callers must install a
//!   [`Runtime`](topology::Runtime) themselves; the latch spin-waits.
//! - `ffi`/`c-abi`: the byte-level C ABI in [`ffi`], for non-Rust host
//!   runtimes.
//! - `stats`: process-wide atomic instrumentation counters in [`stats`].

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod alloc_util;
#[cfg(feature = "ffi")]
pub mod ffi;
mod latch;
#[macro_use]
mod macros;
#[cfg(feature = "ffi")]
mod raw;
mod reduction;
mod sinc;
#[cfg(feature = "std")]
mod runtime_std;
pub mod stats;
mod sync;
pub mod topology;

pub use sinc::Sinc;
pub use topology::{Runtime, set_runtime};

#[cfg(feature = "std")]
pub use runtime_std::run_on_pool;
