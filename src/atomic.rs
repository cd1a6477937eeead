//! Atomic primitives, routed through `portable-atomic` when the feature is enabled.
//!
//! The indices and the drop counter only ever see `load`/`store`, which every target
//! supports natively. The role claim flags need `swap`, which is what thumbv6m-class
//! targets lack without `portable-atomic`.

#[cfg(not(feature = "portable-atomic"))]
pub(crate) use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[cfg(feature = "portable-atomic")]
pub(crate) use portable_atomic::{AtomicBool, AtomicU32, Ordering};
