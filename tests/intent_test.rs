mod common;

use std::sync::atomic::Ordering;

use common::Harness;
use maritima_backend::services::intent::IntentError;

#[tokio::test]
async fn unknown_plan_is_rejected_before_the_gateway() {
    let h = Harness::new();
    let user = h.add_user("Alice", "alice@example.com").await;

    for days in [0, 5, 14, 31, -7] {
        let result = h.intents.create_intent(&user.id, &user.email, days).await;
        assert!(matches!(result, Err(IntentError::InvalidPlan)));
    }

    assert_eq!(h.gateway.created_count(), 0);
    assert_eq!(h.payments.count(), 0);
}

#[tokio::test]
async fn gateway_failure_leaves_no_local_record() {
    let h = Harness::new();
    let user = h.add_user("Alice", "alice@example.com").await;
    h.gateway.fail_create.store(true, Ordering::SeqCst);

    let result = h.intents.create_intent(&user.id, &user.email, 15).await;
    assert!(matches!(result, Err(IntentError::Gateway(_))));
    assert_eq!(h.payments.count(), 0);
}

#[tokio::test]
async fn successful_intent_is_pending_and_keyed_by_gateway_id() {
    let h = Harness::new();
    let user = h.add_user("Alice", "alice@example.com").await;

    let payment = h.intents.create_intent(&user.id, &user.email, 15).await.unwrap();

    assert!(!payment.qr_code.is_empty());
    assert_eq!(h.payments.count(), 1);
    assert_eq!(h.payments.status_of(&payment.id).as_deref(), Some("pending"));
}

#[tokio::test]
async fn each_successful_call_creates_exactly_one_intent() {
    let h = Harness::new();
    let user = h.add_user("Alice", "alice@example.com").await;

    let a = h.intents.create_intent(&user.id, &user.email, 7).await.unwrap();
    let b = h.intents.create_intent(&user.id, &user.email, 30).await.unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(h.payments.count(), 2);
}
