use crate::error::SchedulingError;
use crate::reconciler::{retry_delay, ClientIdentity, PurchaseLookup};
use crate::test_support::Harness;
use chrono::Utc;
use consulta_common::models::{Purchase, PurchaseStatus};
use consulta_common::services::PaymentSession;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn secs(values: &[u64]) -> Vec<Duration> {
    values.iter().map(|s| Duration::from_secs(*s)).collect()
}

fn stored_purchase(session: &str) -> Purchase {
    Purchase {
        id: "purchase-webhook".to_string(),
        user_id: "user-1".to_string(),
        product_id: "deep-dive".to_string(),
        payment_session_id: session.to_string(),
        status: PurchaseStatus::Active,
        created_at: Utc::now(),
    }
}

#[test]
fn retry_delays_grow_linearly_from_the_base() {
    let base = Duration::from_millis(1000);
    let delays: Vec<_> = (1..=3).map(|n| retry_delay(base, n)).collect();
    assert_eq!(delays, secs(&[1, 2, 3]));
}

#[tokio::test]
async fn existing_purchase_is_found_without_waiting() {
    let h = Harness::new();
    h.payments.add_paid("cs_1", "advisory", Some("ada@example.com"));
    h.purchases.insert(stored_purchase("cs_1"));

    let purchase = h
        .reconciler
        .resolve_purchase("cs_1", &ClientIdentity::default())
        .await
        .unwrap();

    assert_eq!(purchase.id, "purchase-webhook");
    assert!(h.delay.waits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn purchase_recorded_during_retries_is_picked_up() {
    let h = Harness::new();
    h.payments.add_paid("cs_1", "advisory", Some("ada@example.com"));
    h.purchases.insert(stored_purchase("cs_1"));
    h.purchases.hidden_lookups.store(2, Ordering::SeqCst);

    let purchase = h
        .reconciler
        .resolve_purchase("cs_1", &ClientIdentity::default())
        .await
        .unwrap();

    assert_eq!(purchase.id, "purchase-webhook");
    assert_eq!(*h.delay.waits.lock().unwrap(), secs(&[1, 2]));
    assert_eq!(h.purchases.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_purchase_falls_back_after_three_retries() {
    let h = Harness::new();
    h.payments.add_paid("cs_1", "advisory", Some("Ada@Example.com"));

    let purchase = h
        .reconciler
        .resolve_purchase("cs_1", &ClientIdentity::default())
        .await
        .unwrap();

    assert_eq!(*h.delay.waits.lock().unwrap(), secs(&[1, 2, 3]));
    assert_eq!(h.purchases.lookups.load(Ordering::SeqCst), 4);
    assert_eq!(purchase.payment_session_id, "cs_1");
    assert_eq!(purchase.product_id, "deep-dive");
    assert_eq!(purchase.status, PurchaseStatus::Active);
    let users = h.users.users.lock().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, purchase.user_id);
    assert_eq!(users[0].email, "ada@example.com");
}

#[tokio::test]
async fn repeated_resolution_returns_the_same_purchase() {
    let h = Harness::new();
    h.payments.add_paid("cs_1", "advisory", Some("ada@example.com"));

    let first = h
        .reconciler
        .resolve_purchase("cs_1", &ClientIdentity::default())
        .await
        .unwrap();
    let second = h
        .reconciler
        .resolve_purchase("cs_1", &ClientIdentity::default())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(h.purchases.count(), 1);
}

#[tokio::test]
async fn unusable_sessions_are_invalid_payments() {
    let h = Harness::new();
    h.payments.add_paid("cs_other", "newsletter", Some("ada@example.com"));
    h.payments.add(PaymentSession {
        id: "cs_unpaid".to_string(),
        paid: false,
        product_tag: Some("advisory".to_string()),
        product_id: Some("deep-dive".to_string()),
        customer_email: Some("ada@example.com".to_string()),
        customer_name: None,
    });

    for session in ["cs_other", "cs_unpaid", "cs_unknown"] {
        let err = h
            .reconciler
            .resolve_purchase(session, &ClientIdentity::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidPayment(_)), "{}: {:?}", session, err);
    }
    assert!(h.delay.waits.lock().unwrap().is_empty());
    assert_eq!(h.purchases.count(), 0);
}

#[tokio::test]
async fn session_without_email_needs_client_identity() {
    let h = Harness::new();
    h.payments.add_paid("cs_1", "advisory", None);

    let err = h
        .reconciler
        .resolve_purchase("cs_1", &ClientIdentity::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::IncompletePaymentData(_)));
    assert_eq!(h.purchases.count(), 0);

    let client = ClientIdentity {
        email: Some("grace@example.com".to_string()),
        name: Some("Grace".to_string()),
    };
    let purchase = h.reconciler.resolve_purchase("cs_1", &client).await.unwrap();
    let users = h.users.users.lock().unwrap();
    assert_eq!(users[0].id, purchase.user_id);
    assert_eq!(users[0].email, "grace@example.com");
}

#[tokio::test]
async fn session_without_product_is_incomplete() {
    let h = Harness::new();
    h.payments.add(PaymentSession {
        id: "cs_1".to_string(),
        paid: true,
        product_tag: Some("advisory".to_string()),
        product_id: None,
        customer_email: Some("ada@example.com".to_string()),
        customer_name: None,
    });

    let err = h
        .reconciler
        .resolve_purchase("cs_1", &ClientIdentity::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::IncompletePaymentData(_)));
}

#[tokio::test]
async fn lookup_reports_not_found_explicitly() {
    let h = Harness::new();
    let lookup = h.reconciler.lookup_with_retry("cs_none").await.unwrap();
    assert_eq!(lookup, PurchaseLookup::NotFound);
}

#[tokio::test]
async fn notifications_for_other_products_are_ignored() {
    let h = Harness::new();
    let mut session = PaymentSession {
        id: "cs_1".to_string(),
        paid: true,
        product_tag: Some("newsletter".to_string()),
        product_id: Some("deep-dive".to_string()),
        customer_email: Some("ada@example.com".to_string()),
        customer_name: None,
    };
    assert_eq!(h.reconciler.accept_notification(&session).await.unwrap(), None);

    session.product_tag = Some("advisory".to_string());
    let recorded = h.reconciler.accept_notification(&session).await.unwrap();
    assert!(recorded.is_some());
    // A replayed notification does not create a second purchase.
    h.reconciler.accept_notification(&session).await.unwrap();
    assert_eq!(h.purchases.count(), 1);
}
