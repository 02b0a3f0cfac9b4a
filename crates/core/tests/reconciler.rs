//! End to end checks of the default builder and factory wiring.

use pinhold_api::backend::MockPinBackend;
use pinhold_api::desired::MockDesiredSource;
use pinhold_api::*;
use pinhold_core::default_builder;
use pinhold_test_utils::{enable_tracing, id::random_object_id, iter_check};
use std::sync::{Arc, Mutex};

fn counting_backend(add_calls: Arc<Mutex<u32>>) -> DynPinBackend {
    let mut backend = MockPinBackend::new();
    backend.expect_add_pin().returning(move |_, _| {
        *add_calls.lock().unwrap() += 1;
        Box::pin(async { Ok(()) })
    });
    backend.expect_remove_pin().returning(|_, _| {
        Box::pin(async { Ok(()) })
    });
    backend.expect_validate().returning(|_, _| {
        Box::pin(async { Ok(ValidateOutcome::Present) })
    });
    Arc::new(backend)
}

fn empty_desired() -> DynDesiredSource {
    let mut desired = MockDesiredSource::new();
    desired
        .expect_list_desired()
        .returning(|| Box::pin(async { Ok(Vec::new()) }));
    Arc::new(desired)
}

#[tokio::test(flavor = "multi_thread")]
async fn default_builder_wires_the_full_stack() {
    enable_tracing();

    let mut builder = default_builder();
    builder.set_default_config().unwrap();
    let builder = builder.build();

    let store = builder
        .status_store
        .create(builder.clone())
        .await
        .unwrap();
    let add_calls = Arc::new(Mutex::new(0_u32));
    let reconciler = builder
        .reconciler
        .create(
            builder.clone(),
            store.clone(),
            counting_backend(add_calls.clone()),
            empty_desired(),
        )
        .await
        .unwrap();

    let a = random_object_id();
    let key = PinKey::new(a.clone(), Scope::DEFAULT);

    reconciler.pin(a.clone(), Scope::DEFAULT).await.unwrap();
    iter_check!({
        if store.get(key.clone()).await.unwrap().map(|r| r.status)
            == Some(PinStatus::Pinned)
        {
            break;
        }
    });
    assert_eq!(1, *add_calls.lock().unwrap());

    // The object is not in the (empty) desired set, so a reconcile pass
    // unpins it again.
    reconciler.reconcile().await.unwrap();
    iter_check!({
        if store.get(key.clone()).await.unwrap().is_none() {
            break;
        }
    });
}

#[tokio::test(flavor = "multi_thread")]
async fn config_loaded_from_disk_drives_the_reconciler() {
    enable_tracing();

    let mut builder = default_builder();
    // As a config file would look after a human edit, unknown modules
    // and properties included.
    builder.config = serde_json::from_str(
        r#"{
          "coreReconciler": {
            "coreReconciler": {
              "retryBaseDelayMs": 10,
              "maxRetryAttempts": 1
            }
          },
          "someOtherTool": { "ignored": true }
        }"#,
    )
    .unwrap();
    let builder = builder.build();

    let store = builder
        .status_store
        .create(builder.clone())
        .await
        .unwrap();

    // A backend whose add always fails, to observe the configured
    // retry ceiling.
    let add_calls = Arc::new(Mutex::new(0_u32));
    let mut backend = MockPinBackend::new();
    backend.expect_add_pin().returning({
        let add_calls = add_calls.clone();
        move |_, _| {
            *add_calls.lock().unwrap() += 1;
            Box::pin(async { Err(PinError::other("backend offline")) })
        }
    });

    let reconciler = builder
        .reconciler
        .create(
            builder.clone(),
            store.clone(),
            Arc::new(backend),
            empty_desired(),
        )
        .await
        .unwrap();

    let a = random_object_id();
    let key = PinKey::new(a.clone(), Scope::DEFAULT);

    reconciler.pin(a.clone(), Scope::DEFAULT).await.unwrap();

    // Initial attempt plus the single configured retry.
    iter_check!({
        if *add_calls.lock().unwrap() == 2 {
            break;
        }
    });
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(2, *add_calls.lock().unwrap());
    assert_eq!(
        Some(PinStatus::PinningFailed),
        store.get(key.clone()).await.unwrap().map(|r| r.status)
    );
}
