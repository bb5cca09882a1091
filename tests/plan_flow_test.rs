mod common;

use std::sync::atomic::Ordering;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use common::{payment_webhook, Harness};
use maritima_backend::modules::auth::interface::UserStore;
use maritima_backend::modules::plan::interface::AccountStore;
use maritima_backend::services::reconciler::WebhookOutcome;
use maritima_backend::services::trial::TrialError;

/// Full purchase scenario: pending intent, approval webhook, duplicate
/// webhook. Exactly one account must exist at the end.
#[tokio::test]
async fn purchase_end_to_end() {
    let h = Harness::new();
    let alice = h.add_user("Alice", "alice@example.com").await;

    // Alice requests a 15-day plan and gets a payable reference.
    let payment = h
        .intents
        .create_intent(&alice.id, &alice.email, 15)
        .await
        .unwrap();
    assert_eq!(payment.status, "pending");
    assert!(h.accounts.count() == 0);

    // The gateway approves and notifies us.
    h.gateway.set_status(&payment.id, "approved");
    let outcome = h
        .reconciler
        .handle_notification(&payment_webhook(&payment.id))
        .await;
    assert_eq!(outcome, WebhookOutcome::PlanCreated);

    // Her plan list now shows one account for plan "15" with future expiry.
    let plans = h.accounts.list_by_owner(&alice.id).await.unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].plan, "15");
    assert!(plans[0].expires_at > Utc::now());

    // The stored blob decodes and embeds the provisioned credentials.
    let decoded = String::from_utf8(STANDARD.decode(&plans[0].ehi_file).unwrap()).unwrap();
    assert!(decoded.contains(&plans[0].username));

    // Re-delivering the identical payload changes nothing.
    let duplicate = h
        .reconciler
        .handle_notification(&payment_webhook(&payment.id))
        .await;
    assert_eq!(duplicate, WebhookOutcome::AlreadyProcessed);
    assert_eq!(h.accounts.list_by_owner(&alice.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn trial_provisions_a_three_day_account_once() {
    let h = Harness::new();
    let user = h.add_user("Bob", "bob@example.com").await;

    let grant = h.trials.start_trial(&user).await.unwrap();

    let plans = h.accounts.list_by_owner(&user.id).await.unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].plan, "trial");
    assert_eq!(plans[0].username, grant.username);
    assert!(grant.expires > Utc::now());

    let second = h.trials.start_trial(&user).await;
    assert!(matches!(second, Err(TrialError::AlreadyUsed)));
    assert_eq!(h.accounts.count(), 1);
}

/// Provisioning failure must release the one-shot flag again: no account
/// was created, so the user keeps the right to a trial.
#[tokio::test]
async fn trial_provision_failure_releases_the_flag() {
    let h = Harness::new();
    let user = h.add_user("Bob", "bob@example.com").await;

    h.remote.fail.store(true, Ordering::SeqCst);
    let result = h.trials.start_trial(&user).await;
    assert!(matches!(result, Err(TrialError::Provision(_))));

    let stored = h.users.find_by_id(&user.id).await.unwrap().unwrap();
    assert!(!stored.trial_used);
    assert_eq!(h.accounts.count(), 0);
    assert_eq!(h.notifier.sent_count(), 0);

    // With the host back, the retry succeeds.
    h.remote.fail.store(false, Ordering::SeqCst);
    h.trials.start_trial(&user).await.unwrap();
    assert_eq!(h.accounts.count(), 1);
}

#[tokio::test]
async fn trial_flag_flips_exactly_once() {
    let h = Harness::new();
    let user = h.add_user("Bob", "bob@example.com").await;

    assert!(h.users.mark_trial_used(&user.id).await.unwrap());
    assert!(!h.users.mark_trial_used(&user.id).await.unwrap());
    assert!(!h.users.mark_trial_used(&user.id).await.unwrap());

    let stored = h.users.find_by_id(&user.id).await.unwrap().unwrap();
    assert!(stored.trial_used);
}

#[tokio::test]
async fn accounts_are_isolated_per_owner() {
    let h = Harness::new();
    let alice = h.add_user("Alice", "alice@example.com").await;
    let bob = h.add_user("Bob", "bob@example.com").await;

    let payment = h
        .intents
        .create_intent(&alice.id, &alice.email, 30)
        .await
        .unwrap();
    h.gateway.set_status(&payment.id, "approved");
    h.reconciler
        .handle_notification(&payment_webhook(&payment.id))
        .await;

    assert_eq!(h.accounts.list_by_owner(&alice.id).await.unwrap().len(), 1);
    assert_eq!(h.accounts.list_by_owner(&bob.id).await.unwrap().len(), 0);
}
