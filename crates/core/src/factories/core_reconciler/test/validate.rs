use super::utils::*;
use pinhold_api::backend::MockPinBackend;
use pinhold_api::*;
use pinhold_test_utils::{enable_tracing, id::random_object_id, iter_check};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn staleness_threshold_and_clock_skew() {
    enable_tracing();
    let calls: CallLog = Default::default();
    let objects: Vec<_> = (0..4).map(|_| random_object_id()).collect();
    let TestCase {
        reconciler, store, ..
    } = setup_test(
        test_config(),
        ok_backend(calls.clone()),
        desired_source(
            objects
                .iter()
                .map(|o| DesiredObject::pinnable(o.clone()))
                .collect(),
        ),
        true,
    );

    let stale = (Timestamp::now() - Duration::from_secs(60 * 60 * 25))
        .expect("timestamp underflow");
    let future = Timestamp::now() + Duration::from_secs(60 * 60);
    let keys: Vec<_> = objects.iter().map(default_key).collect();

    store
        .set(keys[0].clone(), PinRecord::pinned_at(stale))
        .await
        .unwrap();
    store
        .set(keys[1].clone(), PinRecord::pinned_at(future))
        .await
        .unwrap();
    // Pinned but never validated.
    store
        .set(keys[2].clone(), PinRecord::new(PinStatus::Pinned))
        .await
        .unwrap();
    store
        .set(keys[3].clone(), PinRecord::pinned_at(Timestamp::now()))
        .await
        .unwrap();

    reconciler.reconcile().await.unwrap();

    // Stale, future-dated and never-validated pins get re-validated.
    iter_check!({
        if total_calls(&calls) == 3 {
            break;
        }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    for key in &keys[..3] {
        assert_eq!(1, count_calls(&calls, PinOp::Validate, key));
    }
    assert_eq!(0, count_calls(&calls, PinOp::Validate, &keys[3]));

    // A confirmed validation refreshes the validation time.
    let refreshed = record_of(&store, &keys[0])
        .await
        .unwrap()
        .last_validated
        .expect("validated record has a validation time");
    assert!(refreshed > stale);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_pin_self_heals_with_fresh_add() {
    enable_tracing();
    let calls: CallLog = Default::default();
    let a = random_object_id();
    let key = default_key(&a);

    let mut backend = MockPinBackend::new();
    backend.expect_validate().returning({
        let calls = calls.clone();
        move |object, scope| {
            record(&calls, PinOp::Validate, &object, &scope);
            Box::pin(async { Ok(ValidateOutcome::Absent) })
        }
    });
    backend.expect_add_pin().returning({
        let calls = calls.clone();
        move |object, scope| {
            record(&calls, PinOp::Add, &object, &scope);
            Box::pin(async { Ok(()) })
        }
    });

    let TestCase {
        reconciler, store, ..
    } = setup_test(
        test_config(),
        Arc::new(backend),
        desired_source(vec![DesiredObject::pinnable(a.clone())]),
        true,
    );

    let stale = (Timestamp::now() - Duration::from_secs(60 * 60 * 25))
        .expect("timestamp underflow");
    store
        .set(key.clone(), PinRecord::pinned_at(stale))
        .await
        .unwrap();

    reconciler.reconcile().await.unwrap();

    iter_check!({
        let record = record_of(&store, &key).await;
        if record
            .and_then(|r| r.last_validated)
            .map(|ts| ts > stale)
            .unwrap_or(false)
        {
            break;
        }
    });
    assert_eq!(1, count_calls(&calls, PinOp::Validate, &key));
    assert_eq!(1, count_calls(&calls, PinOp::Add, &key));
    assert_eq!(Some(PinStatus::Pinned), status_of(&store, &key).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn validate_error_is_treated_as_drift() {
    enable_tracing();
    let calls: CallLog = Default::default();
    let a = random_object_id();
    let key = default_key(&a);

    let mut backend = MockPinBackend::new();
    backend.expect_validate().returning({
        let calls = calls.clone();
        move |object, scope| {
            record(&calls, PinOp::Validate, &object, &scope);
            Box::pin(async { Err(PinError::other("backend offline")) })
        }
    });
    backend.expect_add_pin().returning({
        let calls = calls.clone();
        move |object, scope| {
            record(&calls, PinOp::Add, &object, &scope);
            Box::pin(async { Ok(()) })
        }
    });

    let TestCase {
        reconciler, store, ..
    } = setup_test(
        test_config(),
        Arc::new(backend),
        desired_source(vec![DesiredObject::pinnable(a.clone())]),
        true,
    );

    store
        .set(key.clone(), PinRecord::new(PinStatus::Pinned))
        .await
        .unwrap();

    reconciler.reconcile().await.unwrap();

    // The inconclusive validate goes straight to a fresh add, no retry
    // of the validate itself.
    iter_check!({
        if count_calls(&calls, PinOp::Add, &key) == 1 {
            break;
        }
    });
    iter_check!({
        if status_of(&store, &key).await == Some(PinStatus::Pinned) {
            break;
        }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(1, count_calls(&calls, PinOp::Validate, &key));
    assert_eq!(1, count_calls(&calls, PinOp::Add, &key));
}
