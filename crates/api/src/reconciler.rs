//! Reconciler module types.

use crate::{
    builder, config, BoxFut, DynDesiredSource, DynPinBackend, DynStatusStore,
    ObjectId, PinResult, Scope,
};
use std::sync::Arc;

/// Trait for implementing the pin reconciliation module.
///
/// The reconciler converges the status store toward the desired object
/// set by feeding corrective intents through a serialized, deduplicated
/// job queue. None of these methods block on backend work; failures of
/// individual operations are retried internally and are only observable
/// by polling the status store.
pub trait Reconciler: 'static + Send + Sync + std::fmt::Debug {
    /// Run a full reconcile pass: diff the desired set against the
    /// tracked keys and queue corrective intents.
    ///
    /// Call this once at startup, whenever the desired-state source
    /// signals a change, and whenever the auto-pin flag is toggled on.
    fn reconcile(&self) -> BoxFut<'_, PinResult<()>>;

    /// Explicitly request the object be pinned under the given scope,
    /// regardless of the auto-pin flag.
    fn pin(&self, object: ObjectId, scope: Scope) -> BoxFut<'_, PinResult<()>>;

    /// Explicitly request the object be unpinned under the given scope.
    fn unpin(
        &self,
        object: ObjectId,
        scope: Scope,
    ) -> BoxFut<'_, PinResult<()>>;

    /// Signal that an object was added to the desired set. Queues an
    /// add intent for pinnable objects if auto-pin is currently
    /// enabled.
    fn object_added(
        &self,
        object: ObjectId,
        pinnable: bool,
    ) -> BoxFut<'_, PinResult<()>>;

    /// Signal that an object was removed from the desired set. Purges
    /// any queued intents for the object and queues a delete.
    fn object_removed(&self, object: ObjectId) -> BoxFut<'_, PinResult<()>>;
}

/// Trait object [Reconciler].
pub type DynReconciler = Arc<dyn Reconciler>;

/// A factory for creating Reconciler instances.
pub trait ReconcilerFactory: 'static + Send + Sync + std::fmt::Debug {
    /// Help the builder construct a default config from the chosen
    /// module factories.
    fn default_config(&self, config: &mut config::Config) -> PinResult<()>;

    /// Construct a Reconciler instance.
    fn create(
        &self,
        builder: Arc<builder::Builder>,
        status_store: DynStatusStore,
        backend: DynPinBackend,
        desired: DynDesiredSource,
    ) -> BoxFut<'static, PinResult<DynReconciler>>;
}

/// Trait object [ReconcilerFactory].
pub type DynReconcilerFactory = Arc<dyn ReconcilerFactory>;
