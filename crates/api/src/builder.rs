//! Builder-related types.

use crate::*;
use std::sync::Arc;

/// The general pinhold builder.
/// This contains configuration, the runtime auto-pin flag, and factory
/// instances, allowing construction of runtime module instances.
///
/// There is deliberately no ambient/global access to any of these:
/// modules receive the builder and their collaborators explicitly.
#[derive(Debug)]
pub struct Builder {
    /// The module configuration to be used when building modules.
    /// This can be loaded from disk or modified before freezing the
    /// builder.
    pub config: crate::config::Config,

    /// The [AutoPinFlag] to use for this pinhold instance.
    pub auto_pin: DynAutoPinFlag,

    /// The [status_store::StatusStoreFactory] to be used for creating
    /// [status_store::StatusStore] instances.
    pub status_store: DynStatusStoreFactory,

    /// The [reconciler::ReconcilerFactory] to be used for creating
    /// [reconciler::Reconciler] instances.
    pub reconciler: DynReconcilerFactory,
}

impl Builder {
    /// Construct a default config given the configured module
    /// factories. Note, this should be called before freezing the
    /// Builder instance in an Arc<>.
    pub fn set_default_config(&mut self) -> PinResult<()> {
        let Self {
            config,
            auto_pin: _,
            status_store,
            reconciler,
        } = self;

        status_store.default_config(config)?;
        reconciler.default_config(config)?;

        Ok(())
    }

    /// Freeze the builder for use constructing module instances.
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }
}
