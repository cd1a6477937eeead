//! Byte-stream plumbing for no-std embedded targets.
//!
//! # Highlights
//! - Lock-free SPSC byte ring for moving data between an interrupt handler (or one
//!   core) and mainline code (or another core).
//! - Rejects on full instead of overwriting, and counts every rejected byte.
//! - Bulk drain of contiguous runs for USB/network framing.
//! - No allocation, no dynamic dispatch, no compare-and-swap on the hot path.
//!
//! # Quick start
//! ```
//! use ph_bytering::ByteRing;
//!
//! let ring = ByteRing::<16>::new();
//! let mut producer = ring.producer();
//! let mut consumer = ring.consumer();
//!
//! for b in b"hello" {
//!     producer.push(*b).unwrap();
//! }
//!
//! let run = consumer.bulk_slice().unwrap();
//! assert_eq!(run, b"hello");
//! let n = run.len();
//! consumer.bulk_remove(n);
//! assert_eq!(consumer.pop(), None);
//! ```
//!
//! Rings usually live in a `static` shared by an ISR and the main loop:
//! ```
//! use ph_bytering::{ByteRing, PushError};
//!
//! static UART_RX: ByteRing<64> = ByteRing::new();
//!
//! fn on_rx_interrupt(byte: u8) {
//!     let mut producer = UART_RX.producer();
//!     if let Err(PushError::Full) = producer.push(byte) {
//!         // Raise flow control; the loss is already counted in `dropped()`.
//!     }
//! }
//!
//! on_rx_interrupt(b'x');
//! assert_eq!(UART_RX.consumer().pop(), Some(b'x'));
//! ```
//!
//! # No-std
//! The crate is `#![no_std]`. Tests require `std`.
//!
//! # Safety and concurrency
//! This crate is SPSC by design: exactly one producer and one consumer may be active.
//! `producer()`/`consumer()` panic if called while another handle of the same kind is
//! active; `try_producer()`/`try_consumer()` report it as a `ClaimError` instead.
//! `ByteRing::reset` needs `&mut self`, so it can only run while no handle exists;
//! `ByteRing::try_reset` does the same through `&self` (for `static` rings) by claiming
//! both roles and failing with a `ClaimError` while either is held.
//!
//! # Semantics
//! - A ring of size `N` holds at most `N - 1` bytes; `used() + free() == N`.
//! - `push` returns the remaining headroom, or `PushError::Full` and counts a drop.
//! - `pop` returns `None` when empty; empty is never signalled in-band.
//! - `bulk_slice` never crosses the physical end of storage; two runs drain everything.
//!
//! # Features
//! - `portable-atomic`: route atomics through `portable-atomic` (needed for the role
//!   claim flags on targets without native atomic swap).
//! - `portable-atomic-unsafe-assume-single-core`, `portable-atomic-critical-section`:
//!   pick the `portable-atomic` fallback.
#![no_std]

mod atomic;
pub mod byte_ring;
pub mod error;

pub use byte_ring::{ByteRing, Consumer, Producer, ROLLOVER_THRESHOLD};
pub use error::{ClaimError, PushError};

#[cfg(test)]
extern crate std;
