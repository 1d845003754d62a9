use actix_web::{http::StatusCode, web::ServiceConfig};
use receivables_engine::{
    db_types::{Client, Money},
    traits::{ClientLedger, LedgerError, PaymentHistoryEntry, ReceivableOrder},
};
use serde_json::json;

use super::{
    helpers::{allocation, day, get_request, order, payment, receivables_api},
    mocks::MockReceivables,
};
use crate::routes::{
    AccountsReceivableRoute,
    AuditClientRoute,
    ClientBalanceRoute,
    OpenOrdersRoute,
    PaymentDetailRoute,
    PaymentHistoryRoute,
};

fn configure_with(receivables: MockReceivables) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(PaymentHistoryRoute::<MockReceivables>::new())
            .service(PaymentDetailRoute::<MockReceivables>::new())
            .service(AccountsReceivableRoute::<MockReceivables>::new())
            .service(OpenOrdersRoute::<MockReceivables>::new())
            .service(ClientBalanceRoute::<MockReceivables>::new())
            .service(AuditClientRoute::<MockReceivables>::new())
            .app_data(receivables_api(receivables));
    }
}

fn history_entry(id: i64, client_name: &str, amount: i64) -> PaymentHistoryEntry {
    PaymentHistoryEntry {
        id,
        client_id: 1,
        client_name: client_name.to_string(),
        amount: Money::from(amount),
        applied: Money::from(amount),
        payment_date: day(3),
        method_id: Some(1),
        method_name: Some("Bank transfer".to_string()),
        description: None,
    }
}

fn acme_ledger() -> ClientLedger {
    ClientLedger {
        client: Client { id: 1, name: "Acme".to_string(), ledger_version: 1, created_at: day(1) },
        orders: vec![order(1, 1, 1, 10_000, 10_000), order(2, 1, 2, 10_000, 5_000)],
        payments: vec![payment(10, 1, 15_000)],
        allocations: vec![allocation(1, 10, 1, 10_000), allocation(2, 10, 2, 5_000)],
    }
}

#[actix_web::test]
async fn payment_history_uses_the_default_limit() {
    let mut receivables = MockReceivables::new();
    receivables
        .expect_fetch_payment_history()
        .withf(|limit| *limit == 50)
        .times(1)
        .returning(|_| Ok(vec![history_entry(2, "Acme", 500), history_entry(1, "Unknown", 700)]));
    let (status, json) = get_request("/api/payment-history", configure_with(receivables)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["id"], json!(2));
    assert_eq!(json[0]["method_name"], json!("Bank transfer"));
    assert_eq!(json[1]["client_name"], json!("Unknown"));
}

#[actix_web::test]
async fn payment_history_limits_are_clamped() {
    let mut receivables = MockReceivables::new();
    receivables.expect_fetch_payment_history().withf(|limit| *limit == 500).times(1).returning(|_| Ok(vec![]));
    let (status, json) = get_request("/api/payment-history?limit=100000", configure_with(receivables)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([]));
}

#[actix_web::test]
async fn payment_history_with_a_bad_limit() {
    let mut receivables = MockReceivables::new();
    receivables.expect_fetch_payment_history().never();
    let (status, _) = get_request("/api/payment-history?limit=lots", configure_with(receivables)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn payment_detail() {
    let mut receivables = MockReceivables::new();
    receivables.expect_fetch_payment().never();
    receivables
        .expect_fetch_payment_detail()
        .times(1)
        .returning(|id| Ok(Some((payment(id, 1, 15_000), vec![allocation(1, id, 1, 10_000)]))));
    let (status, json) = get_request("/api/payment/10", configure_with(receivables)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["payment"]["amount"], json!(15_000));
    assert_eq!(json["allocations"][0]["order_id"], json!(1));
    assert_eq!(json["unapplied"], json!(5_000));
}

#[actix_web::test]
async fn missing_payment_detail() {
    let mut receivables = MockReceivables::new();
    receivables.expect_fetch_payment_detail().returning(|_| Ok(None));
    let (status, json) = get_request("/api/payment/10", configure_with(receivables)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], json!("Payment #10 does not exist."));
}

#[actix_web::test]
async fn accounts_receivable() {
    let mut receivables = MockReceivables::new();
    receivables.expect_fetch_receivable_orders().returning(|| {
        Ok(vec![
            ReceivableOrder { order: order(1, 1, 5, 10_000, 2_500), client_name: "Acme".into() },
            ReceivableOrder { order: order(2, 1, 9, 4_000, 0), client_name: "Acme".into() },
            ReceivableOrder { order: order(3, 2, 2, 1_000, 0), client_name: "Globex".into() },
        ])
    });
    let (status, json) = get_request("/api/accounts-receivable", configure_with(receivables)).await;
    assert_eq!(status, StatusCode::OK);
    let accounts = json.as_array().expect("Expected a list of accounts");
    assert_eq!(accounts.len(), 2);
    // Globex has the oldest open order
    assert_eq!(accounts[0]["client_name"], json!("Globex"));
    assert_eq!(accounts[1]["client_name"], json!("Acme"));
    assert_eq!(accounts[1]["total_debt"], json!(11_500));
    assert_eq!(accounts[1]["open_order_count"], json!(2));
    assert_eq!(accounts[1]["oldest_open_date"], json!("2025-01-05T00:00:00Z"));
}

#[actix_web::test]
async fn open_orders() {
    let mut receivables = MockReceivables::new();
    receivables
        .expect_fetch_open_orders_for_client()
        .withf(|id| *id == 1)
        .returning(|_| Ok(vec![order(2, 1, 2, 10_000, 5_000), order(3, 1, 4, 8_000, 0)]));
    let (status, json) = get_request("/api/client/1/open-orders", configure_with(receivables)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["order_id"], json!(2));
    assert_eq!(json[0]["balance"], json!(5_000));
    assert_eq!(json[0]["status"], json!("Partial"));
    assert_eq!(json[1]["balance"], json!(8_000));
    assert_eq!(json[1]["status"], json!("Pending"));
}

#[actix_web::test]
async fn open_orders_for_unknown_client() {
    let mut receivables = MockReceivables::new();
    receivables.expect_fetch_open_orders_for_client().returning(|id| Err(LedgerError::ClientNotFound(id)));
    let (status, _) = get_request("/api/client/42/open-orders", configure_with(receivables)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn client_balance() {
    let mut receivables = MockReceivables::new();
    receivables.expect_fetch_client_ledger().returning(|_| Ok(Some(acme_ledger())));
    let (status, json) = get_request("/api/client/1/balance", configure_with(receivables)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["client_name"], json!("Acme"));
    assert_eq!(json["total_debt"], json!(5_000));
    assert_eq!(json["open_order_count"], json!(1));
    assert_eq!(json["unapplied_credit"], json!(0));
}

#[actix_web::test]
async fn audit_consistent_ledger() {
    let mut receivables = MockReceivables::new();
    receivables.expect_fetch_client_ledger().returning(|_| Ok(Some(acme_ledger())));
    let (status, json) = get_request("/api/client/1/audit", configure_with(receivables)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"client_id": 1, "consistent": true}));
}

#[actix_web::test]
async fn audit_inconsistent_ledger() {
    let mut receivables = MockReceivables::new();
    receivables.expect_fetch_client_ledger().returning(|_| {
        let mut ledger = acme_ledger();
        // an allocation has gone missing
        ledger.allocations.pop();
        Ok(Some(ledger))
    });
    let (status, json) = get_request("/api/client/1/audit", configure_with(receivables)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().is_some_and(|s| s.starts_with("Ledger consistency violation")));
}
