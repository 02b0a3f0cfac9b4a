//! The auto-pin configuration flag.

use std::sync::Arc;

/// The global "auto-pin enabled" flag.
///
/// Externally settable configuration. The reconciler re-reads this at
/// the point of each decision, it is never cached across passes. Only
/// the spontaneous-add path honors it: resuming pinning that already
/// started, explicit pin/unpin requests, and deletes proceed regardless.
pub trait AutoPinFlag: 'static + Send + Sync + std::fmt::Debug {
    /// Is auto-pinning currently enabled?
    fn enabled(&self) -> bool;
}

/// Trait-object [AutoPinFlag].
pub type DynAutoPinFlag = Arc<dyn AutoPinFlag>;
