#![deny(missing_docs)]
//! Pinhold content pinning reconciliation engine.

use pinhold_api::{builder::Builder, config::Config, *};
use std::sync::atomic::{AtomicBool, Ordering};

/// A default [pinhold_api::AutoPinFlag] backed by an [AtomicBool].
///
/// The reconciler reads this fresh at every decision point, so toggling
/// it takes effect on the next pass without any notification plumbing.
/// Callers toggling it on should follow up with a
/// [Reconciler::reconcile] call.
#[derive(Debug)]
pub struct AtomicAutoPinFlag(AtomicBool);

impl AtomicAutoPinFlag {
    /// Construct a new flag with the given initial value.
    pub fn new(enabled: bool) -> Self {
        Self(AtomicBool::new(enabled))
    }

    /// Set the flag.
    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::SeqCst);
    }
}

impl AutoPinFlag for AtomicAutoPinFlag {
    fn enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Construct a production-ready default builder.
///
/// - `auto_pin` - The default flag is an [AtomicAutoPinFlag] starting
///   out enabled.
/// - `status_store` - The default status store is
///   [factories::MemStatusStoreFactory]. Swap in a persistent
///   implementation for deployments that must survive restarts.
/// - `reconciler` - The default reconciler is
///   [factories::CoreReconcilerFactory].
pub fn default_builder() -> Builder {
    Builder {
        config: Config::default(),
        auto_pin: std::sync::Arc::new(AtomicAutoPinFlag::new(true)),
        status_store: factories::MemStatusStoreFactory::create(),
        reconciler: factories::CoreReconcilerFactory::create(),
    }
}

pub mod factories;
