//! The reconciler is the pinhold module that converges tracked pin state
//! toward the desired object set.
//!
//! It consists of multiple parts:
//! - A job queue of pending intents with a single optional "current"
//!   intent executing against the backend at any time
//! - A reconcile pass that diffs the desired object set against the
//!   tracked keys in the status store and queues corrective intents
//! - An executor that translates the current intent into the matching
//!   backend call and records the settlement in the status store
//! - A retry scheduler that re-submits failed add/delete intents after a
//!   linearly growing delay
//!
//! ### Job queue
//!
//! All queue mutation happens on a single owner task fed by a command
//! channel, so intents are strictly serialized: at most one backend
//! operation is in flight, and an (object, scope) pair appears at most
//! once across {queue, current}. A submitted intent whose key is already
//! queued or executing is dropped silently; the older intent wins. This
//! coalescing is deliberate and load-bearing for convergence order.
//!
//! ### Reconcile pass
//!
//! - Snapshot the desired object set, ignoring non-pinnable objects.
//!   If the source is unavailable the pass aborts without emitting
//!   anything.
//! - Snapshot the tracked key set across all scopes.
//! - Desired objects that are untracked or `NotPinned` get an add intent
//!   if the auto-pin flag is enabled at that moment (the flag is re-read
//!   on every pass, never cached). Pinning or unpinning flows that were
//!   already started are resumed regardless of the flag. Pinned objects
//!   whose last validation is missing, older than the revalidate
//!   interval, or in the future get a validate intent.
//! - Tracked keys that are no longer desired get a delete intent.
//!
//! ### Executor
//!
//! Add and delete write the matching `*InProgress` status when
//! dispatched. Add success records `Pinned` with a fresh validation
//! time; delete success erases the record entirely (absence means "not
//! tracked"). Failures record `*Failed` and go to the retry scheduler.
//! A validate that finds the pin missing, or that fails outright, is
//! settled by submitting a fresh add intent for the same key instead.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use pinhold_api::{
    BoxFut, DynAutoPinFlag, DynDesiredSource, DynPinBackend, DynReconciler,
    DynReconcilerFactory, DynStatusStore, Intent, ObjectId, PinError, PinKey,
    PinOp, PinRecord, PinResult, PinStatus, Reconciler, ReconcilerFactory,
    Scope, Timestamp, ValidateOutcome,
};
use tokio::{
    sync::mpsc::{channel, Receiver, Sender},
    task::JoinHandle,
};


const MOD_NAME: &str = "coreReconciler";

/// CoreReconciler configuration types.
pub mod config {
    /// Configuration parameters for
    /// [CoreReconcilerFactory](super::CoreReconcilerFactory).
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct CoreReconcilerConfig {
        /// Base delay for retrying a failed add/delete intent. A retry
        /// is scheduled after `attempt count x base delay` (linear
        /// backoff). Default: 1 min.
        pub retry_base_delay_ms: u32,

        /// Optional ceiling on retry attempts per intent. When
        /// exceeded, the intent is dropped; its failed status remains
        /// in the store so a later reconcile pass resumes it.
        /// Default: none (retry indefinitely).
        pub max_retry_attempts: Option<u32>,

        /// How long a pin's last validation stays fresh before a
        /// reconcile pass queues a re-validation. Default: 24 h.
        pub revalidate_interval_ms: u64,
    }

    impl Default for CoreReconcilerConfig {
        fn default() -> Self {
            Self {
                retry_base_delay_ms: 1000 * 60,
                max_retry_attempts: None,
                revalidate_interval_ms: 1000 * 60 * 60 * 24,
            }
        }
    }

    impl pinhold_api::config::ModConfig for CoreReconcilerConfig {}

    /// Module-level configuration for CoreReconciler.
    #[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct CoreReconcilerModConfig {
        /// CoreReconciler configuration.
        pub core_reconciler: CoreReconcilerConfig,
    }

    impl pinhold_api::config::ModConfig for CoreReconcilerModConfig {}
}

use config::*;

/// A production-ready reconciler module.
#[derive(Debug)]
pub struct CoreReconcilerFactory {}

impl CoreReconcilerFactory {
    /// Construct a new CoreReconcilerFactory.
    pub fn create() -> DynReconcilerFactory {
        Arc::new(Self {})
    }
}

impl ReconcilerFactory for CoreReconcilerFactory {
    fn default_config(
        &self,
        config: &mut pinhold_api::config::Config,
    ) -> PinResult<()> {
        config.add_default_module_config::<CoreReconcilerModConfig>(
            MOD_NAME.to_string(),
        )?;
        Ok(())
    }

    fn create(
        &self,
        builder: Arc<pinhold_api::builder::Builder>,
        status_store: DynStatusStore,
        backend: DynPinBackend,
        desired: DynDesiredSource,
    ) -> BoxFut<'static, PinResult<DynReconciler>> {
        Box::pin(async move {
            let config: CoreReconcilerModConfig =
                builder.config.get_module_config(MOD_NAME)?;
            let out: DynReconciler = Arc::new(CoreReconciler::new(
                config.core_reconciler,
                builder.auto_pin.clone(),
                status_store,
                backend,
                desired,
            ));
            Ok(out)
        })
    }
}

#[derive(Debug)]
pub(crate) struct State {
    pub(crate) queue: VecDeque<Intent>,
    pub(crate) current: Option<Intent>,
}

impl State {
    fn holds_key(&self, key: &PinKey) -> bool {
        self.queue.iter().any(|intent| &intent.key() == key)
            || self
                .current
                .as_ref()
                .map(|intent| &intent.key() == key)
                .unwrap_or(false)
    }
}

#[derive(Debug)]
enum Settlement {
    /// The backend call succeeded and the store was updated.
    Done,
    /// An add/delete call failed; retry with backoff.
    Failed,
    /// A validate found the pin missing or could not confirm it;
    /// correct with a fresh add.
    Drifted,
}

#[derive(Debug)]
enum Cmd {
    Reconcile,
    Submit(Intent),
    ObjectRemoved(ObjectId),
    Settled {
        intent: Intent,
        settlement: Settlement,
    },
}

#[derive(Debug)]
pub(crate) struct CoreReconciler {
    pub(crate) state: Arc<Mutex<State>>,
    auto_pin: DynAutoPinFlag,
    cmd_tx: Sender<Cmd>,
    task: JoinHandle<()>,
}

impl CoreReconciler {
    pub(crate) fn new(
        config: CoreReconcilerConfig,
        auto_pin: DynAutoPinFlag,
        status_store: DynStatusStore,
        backend: DynPinBackend,
        desired: DynDesiredSource,
    ) -> Self {
        let (cmd_tx, cmd_rx) = channel::<Cmd>(1024);
        let state = Arc::new(Mutex::new(State {
            queue: VecDeque::new(),
            current: None,
        }));

        let task = tokio::task::spawn(CoreReconciler::run(
            Inner {
                config,
                state: state.clone(),
                cmd_tx: cmd_tx.clone(),
                auto_pin: auto_pin.clone(),
                status_store,
                backend,
                desired,
            },
            cmd_rx,
        ));

        Self {
            state,
            auto_pin,
            cmd_tx,
            task,
        }
    }

    async fn send(&self, cmd: Cmd) -> PinResult<()> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| PinError::other("reconciler task has shut down"))
    }

    async fn run(inner: Inner, mut cmd_rx: Receiver<Cmd>) {
        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                Cmd::Reconcile => inner.reconcile_pass().await,
                Cmd::Submit(intent) => inner.submit(intent).await,
                Cmd::ObjectRemoved(object) => {
                    inner.object_removed(object).await
                }
                Cmd::Settled { intent, settlement } => {
                    inner.settle(intent, settlement).await
                }
            }
            inner.check_queue();
        }
    }
}

impl Reconciler for CoreReconciler {
    fn reconcile(&self) -> BoxFut<'_, PinResult<()>> {
        Box::pin(async move { self.send(Cmd::Reconcile).await })
    }

    fn pin(&self, object: ObjectId, scope: Scope) -> BoxFut<'_, PinResult<()>> {
        Box::pin(
            async move { self.send(Cmd::Submit(Intent::add(object, scope))).await },
        )
    }

    fn unpin(
        &self,
        object: ObjectId,
        scope: Scope,
    ) -> BoxFut<'_, PinResult<()>> {
        Box::pin(async move {
            self.send(Cmd::Submit(Intent::delete(object, scope))).await
        })
    }

    fn object_added(
        &self,
        object: ObjectId,
        pinnable: bool,
    ) -> BoxFut<'_, PinResult<()>> {
        Box::pin(async move {
            if !pinnable || !self.auto_pin.enabled() {
                return Ok(());
            }
            self.send(Cmd::Submit(Intent::add(object, Scope::DEFAULT)))
                .await
        })
    }

    fn object_removed(&self, object: ObjectId) -> BoxFut<'_, PinResult<()>> {
        Box::pin(async move { self.send(Cmd::ObjectRemoved(object)).await })
    }
}

impl Drop for CoreReconciler {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Everything the owner task needs. All queue mutation and all status
/// store writes funnel through here, serialized by the command channel.
struct Inner {
    config: CoreReconcilerConfig,
    state: Arc<Mutex<State>>,
    cmd_tx: Sender<Cmd>,
    auto_pin: DynAutoPinFlag,
    status_store: DynStatusStore,
    backend: DynPinBackend,
    desired: DynDesiredSource,
}

impl Inner {
    async fn reconcile_pass(&self) {
        let desired = match self.desired.list_desired().await {
            Ok(desired) => desired,
            Err(err) => {
                tracing::warn!("could not snapshot desired object set, aborting reconcile pass: {err}");
                return;
            }
        };
        let mut tracked = match self.status_store.list_all(None).await {
            Ok(tracked) => tracked,
            Err(err) => {
                tracing::warn!("could not list tracked pin keys, aborting reconcile pass: {err}");
                return;
            }
        };

        for entry in desired {
            if !entry.pinnable {
                continue;
            }
            let key = PinKey::new(entry.object, Scope::DEFAULT);
            tracked.remove(&key);

            let record = match self.status_store.get(key.clone()).await {
                Ok(record) => record,
                Err(err) => {
                    tracing::warn!("could not read status of {key}: {err}");
                    continue;
                }
            };

            match record {
                None => self.maybe_auto_pin(key).await,
                Some(record) => match record.status {
                    PinStatus::NotPinned => self.maybe_auto_pin(key).await,
                    PinStatus::PinningPending
                    | PinStatus::PinningInProgress
                    | PinStatus::PinningFailed => {
                        // Pinning already started must be completed or
                        // cleanly retried, regardless of the flag.
                        self.submit(Intent::add(key.object, key.scope)).await
                    }
                    PinStatus::UnpinningPending
                    | PinStatus::UnpinningInProgress
                    | PinStatus::UnpinningFailed => {
                        self.submit(Intent::delete(key.object, key.scope))
                            .await
                    }
                    PinStatus::Pinned => {
                        if self.is_stale(record.last_validated) {
                            self.submit(Intent::validate(
                                key.object, key.scope,
                            ))
                            .await
                        }
                    }
                },
            }
        }

        // Whatever remains tracked is no longer desired.
        for key in tracked {
            self.submit(Intent::delete(key.object, key.scope)).await;
        }
    }

    /// The auto-pin flag is read at the decision point, never cached
    /// across or within passes.
    async fn maybe_auto_pin(&self, key: PinKey) {
        if self.auto_pin.enabled() {
            self.submit(Intent::add(key.object, key.scope)).await;
        }
    }

    fn is_stale(&self, last_validated: Option<Timestamp>) -> bool {
        let threshold =
            Duration::from_millis(self.config.revalidate_interval_ms);
        match last_validated {
            None => true,
            Some(ts) => match Timestamp::now() - ts {
                // Validation time in the future, distrust the clock
                // that wrote it.
                Err(()) => true,
                Ok(age) => age > threshold,
            },
        }
    }

    async fn submit(&self, intent: Intent) {
        let key = intent.key();
        if self.state.lock().unwrap().holds_key(&key) {
            // The queued or executing intent for this key supersedes
            // the newer one. Deliberate coalescing, not an error.
            tracing::debug!("dropping superseded intent {intent}");
            return;
        }

        // Make the pending state observable before the queue executes
        // the intent. A crash between this write and execution
        // self-heals: the next reconcile pass sees *Pending and
        // resumes.
        let pending = match intent.op {
            PinOp::Add => Some(PinStatus::PinningPending),
            PinOp::Delete => Some(PinStatus::UnpinningPending),
            PinOp::Validate => None,
        };
        if let Some(status) = pending {
            if let Err(err) = self
                .status_store
                .set(key.clone(), PinRecord::new(status))
                .await
            {
                tracing::warn!("could not mark {key} as {status}: {err}");
            }
        }

        self.state.lock().unwrap().queue.push_back(intent);
    }

    async fn object_removed(&self, object: ObjectId) {
        // Queued intents for a removed object are moot, only the
        // unpinning remains to be done. An intent already executing is
        // left to settle on its own.
        self.state
            .lock()
            .unwrap()
            .queue
            .retain(|intent| intent.object != object);
        self.submit(Intent::delete(object, Scope::DEFAULT)).await;
    }

    async fn settle(&self, intent: Intent, settlement: Settlement) {
        {
            let mut lock = self.state.lock().unwrap();
            match lock.current.take() {
                Some(current) if current.key() == intent.key() => (),
                current => {
                    tracing::error!(
                        "settlement of {intent} does not match current intent {current:?}"
                    );
                }
            }
        }

        match settlement {
            Settlement::Done => (),
            Settlement::Failed => self.schedule_retry(intent),
            Settlement::Drifted => {
                // The current slot was cleared above, so the dedup scan
                // cannot swallow this corrective add.
                self.submit(Intent::add(intent.object, intent.scope)).await;
            }
        }
    }

    fn schedule_retry(&self, intent: Intent) {
        let intent = intent.retry();
        if let Some(max) = self.config.max_retry_attempts {
            if intent.attempt > max {
                tracing::warn!(
                    "giving up on {intent} after {max} retry attempts, a later reconcile pass may resume it"
                );
                return;
            }
        }

        let delay = Duration::from_millis(
            self.config.retry_base_delay_ms as u64 * intent.attempt as u64,
        );
        let cmd_tx = self.cmd_tx.clone();
        tokio::task::spawn(async move {
            tokio::time::sleep(delay).await;
            // The dedup scan applies again when this fires, in case an
            // overriding intent was issued in the interim.
            if cmd_tx.send(Cmd::Submit(intent)).await.is_err() {
                // Reconciler shut down while the retry was parked.
            }
        });
    }

    fn check_queue(&self) {
        let intent = {
            let mut lock = self.state.lock().unwrap();
            if lock.current.is_some() {
                return;
            }
            let Some(intent) = lock.queue.pop_front() else {
                return;
            };
            lock.current = Some(intent.clone());
            intent
        };

        let backend = self.backend.clone();
        let status_store = self.status_store.clone();
        let cmd_tx = self.cmd_tx.clone();
        tokio::task::spawn(async move {
            let settlement =
                execute(intent.clone(), backend, status_store).await;
            if let Err(err) =
                cmd_tx.send(Cmd::Settled { intent, settlement }).await
            {
                tracing::warn!("could not report intent settlement: {err}");
            }
        });
    }
}

/// Perform the backend call for one intent and record the outcome.
/// Exactly one settlement is produced per executed intent.
async fn execute(
    intent: Intent,
    backend: DynPinBackend,
    status_store: DynStatusStore,
) -> Settlement {
    let key = intent.key();
    match intent.op {
        PinOp::Add => {
            set_status(&status_store, &key, PinStatus::PinningInProgress)
                .await;
            match backend
                .add_pin(intent.object.clone(), intent.scope.clone())
                .await
            {
                Ok(()) => {
                    if let Err(err) = status_store
                        .set(
                            key.clone(),
                            PinRecord::pinned_at(Timestamp::now()),
                        )
                        .await
                    {
                        tracing::warn!(
                            "could not record {key} as pinned: {err}"
                        );
                    }
                    Settlement::Done
                }
                Err(err) => {
                    tracing::warn!("could not pin {key}: {err}");
                    set_status(&status_store, &key, PinStatus::PinningFailed)
                        .await;
                    Settlement::Failed
                }
            }
        }
        PinOp::Delete => {
            set_status(&status_store, &key, PinStatus::UnpinningInProgress)
                .await;
            match backend
                .remove_pin(intent.object.clone(), intent.scope.clone())
                .await
            {
                Ok(()) => {
                    if let Err(err) = status_store.delete(key.clone()).await {
                        tracing::warn!(
                            "could not erase record of {key}: {err}"
                        );
                    }
                    Settlement::Done
                }
                Err(err) => {
                    tracing::warn!("could not unpin {key}: {err}");
                    set_status(
                        &status_store,
                        &key,
                        PinStatus::UnpinningFailed,
                    )
                    .await;
                    Settlement::Failed
                }
            }
        }
        PinOp::Validate => {
            match backend
                .validate(intent.object.clone(), intent.scope.clone())
                .await
            {
                Ok(ValidateOutcome::Present) => {
                    if let Err(err) = status_store
                        .set(
                            key.clone(),
                            PinRecord::pinned_at(Timestamp::now()),
                        )
                        .await
                    {
                        tracing::warn!(
                            "could not refresh validation time of {key}: {err}"
                        );
                    }
                    Settlement::Done
                }
                Ok(ValidateOutcome::Absent) => {
                    tracing::debug!(
                        "backend no longer holds {key}, re-adding"
                    );
                    Settlement::Drifted
                }
                Err(err) => {
                    tracing::warn!(
                        "could not validate {key}, re-adding: {err}"
                    );
                    Settlement::Drifted
                }
            }
        }
    }
}

async fn set_status(
    status_store: &DynStatusStore,
    key: &PinKey,
    status: PinStatus,
) {
    if let Err(err) = status_store
        .set(key.clone(), PinRecord::new(status))
        .await
    {
        tracing::warn!("could not set status of {key} to {status}: {err}");
    }
}
