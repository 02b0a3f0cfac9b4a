//! Pin status store types.

use crate::{builder, config, PinKey, PinRecord, PinResult, Scope};
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::sync::Arc;

/// A persistent store for pin status records.
///
/// This is expected to be backed by a key-value store that keys by
/// object identity and scope, surviving restarts. The store is written
/// only by the reconciler (pending-state writes) and its executor
/// (settlement writes); external actors only read it.
pub trait StatusStore: 'static + Send + Sync + std::fmt::Debug {
    /// Get the record for a pin key, if tracked.
    fn get(&self, key: PinKey) -> BoxFuture<'_, PinResult<Option<PinRecord>>>;

    /// Set the record for a pin key.
    fn set(
        &self,
        key: PinKey,
        record: PinRecord,
    ) -> BoxFuture<'_, PinResult<()>>;

    /// Erase the record for a pin key entirely. Absence means
    /// "not tracked".
    fn delete(&self, key: PinKey) -> BoxFuture<'_, PinResult<()>>;

    /// List all tracked keys, optionally restricted to one scope.
    /// `None` lists keys across all scopes.
    fn list_all(
        &self,
        scope: Option<Scope>,
    ) -> BoxFuture<'_, PinResult<HashSet<PinKey>>>;
}

/// Trait-object version of pinhold [StatusStore].
pub type DynStatusStore = Arc<dyn StatusStore>;

/// A factory for constructing [StatusStore] instances.
pub trait StatusStoreFactory: 'static + Send + Sync + std::fmt::Debug {
    /// Help the builder construct a default config from the chosen
    /// module factories.
    fn default_config(&self, config: &mut config::Config) -> PinResult<()>;

    /// Construct a status store instance.
    fn create(
        &self,
        builder: Arc<builder::Builder>,
    ) -> BoxFuture<'static, PinResult<DynStatusStore>>;
}

/// Trait-object [StatusStoreFactory].
pub type DynStatusStoreFactory = Arc<dyn StatusStoreFactory>;
