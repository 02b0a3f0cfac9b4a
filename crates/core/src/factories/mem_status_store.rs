//! An in-memory [StatusStore] implementation and its factory.

use futures::future::BoxFuture;
use pinhold_api::{
    DynStatusStore, DynStatusStoreFactory, PinKey, PinRecord, PinResult,
    Scope, StatusStore, StatusStoreFactory,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;


type MemStatusInner = HashMap<PinKey, PinRecord>;

/// An in-memory implementation of the [StatusStore].
///
/// This is useful for testing, but pin status is supposed to survive
/// restarts in a real deployment.
#[derive(Debug)]
pub struct MemStatusStore {
    inner: Arc<Mutex<MemStatusInner>>,
}

impl MemStatusStore {
    /// Create a new [MemStatusStore].
    pub fn create() -> DynStatusStore {
        let inner = Arc::new(Mutex::new(HashMap::new()));
        Arc::new(MemStatusStore { inner })
    }
}

impl StatusStore for MemStatusStore {
    fn get(&self, key: PinKey) -> BoxFuture<'_, PinResult<Option<PinRecord>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let inner = inner.lock().await;
            Ok(inner.get(&key).copied())
        })
    }

    fn set(
        &self,
        key: PinKey,
        record: PinRecord,
    ) -> BoxFuture<'_, PinResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut inner = inner.lock().await;
            inner.insert(key, record);
            Ok(())
        })
    }

    fn delete(&self, key: PinKey) -> BoxFuture<'_, PinResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut inner = inner.lock().await;
            inner.remove(&key);
            Ok(())
        })
    }

    fn list_all(
        &self,
        scope: Option<Scope>,
    ) -> BoxFuture<'_, PinResult<HashSet<PinKey>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let inner = inner.lock().await;
            Ok(inner
                .keys()
                .filter(|key| match &scope {
                    None => true,
                    Some(scope) => &key.scope == scope,
                })
                .cloned()
                .collect())
        })
    }
}

/// A factory for creating [MemStatusStore] instances.
#[derive(Debug)]
pub struct MemStatusStoreFactory;

impl MemStatusStoreFactory {
    /// Construct a new [MemStatusStoreFactory].
    pub fn create() -> DynStatusStoreFactory {
        Arc::new(MemStatusStoreFactory)
    }
}

impl StatusStoreFactory for MemStatusStoreFactory {
    fn default_config(
        &self,
        _config: &mut pinhold_api::config::Config,
    ) -> PinResult<()> {
        Ok(())
    }

    fn create(
        &self,
        _builder: Arc<pinhold_api::builder::Builder>,
    ) -> BoxFuture<'static, PinResult<DynStatusStore>> {
        Box::pin(async move { Ok(MemStatusStore::create()) })
    }
}
