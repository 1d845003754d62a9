use actix_web::{http::StatusCode, web::ServiceConfig};
use receivables_engine::{
    db_types::{Money, OrderStatusType},
    traits::{CreditApplication, LedgerError, PaymentAllocation, PaymentReversal},
    OverpaymentPolicy,
};
use serde_json::json;

use super::{
    helpers::{allocation, delete_request, flow_api, order, payment, post_request},
    mocks::MockLedger,
};
use crate::routes::{ApplyCreditRoute, DeletePaymentRoute, RegisterPaymentRoute};

fn configure_with(ledger: MockLedger) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(RegisterPaymentRoute::<MockLedger>::new())
            .service(DeletePaymentRoute::<MockLedger>::new())
            .service(ApplyCreditRoute::<MockLedger>::new())
            .app_data(flow_api(ledger));
    }
}

fn allocation_result() -> PaymentAllocation {
    let mut a = order(1, 1, 1, 10_000, 10_000);
    a.status = OrderStatusType::Settled;
    let b = order(2, 1, 2, 10_000, 5_000);
    PaymentAllocation {
        payment: payment(10, 1, 15_000),
        allocations: vec![allocation(1, 10, 1, 10_000), allocation(2, 10, 2, 5_000)],
        orders: vec![a, b],
        unapplied: Money::from(0),
    }
}

#[actix_web::test]
async fn register_payment() {
    let mut ledger = MockLedger::new();
    ledger
        .expect_register_payment()
        .withf(|p, policy| {
            p.client_id == 1 && p.amount == Money::from(15_000) && *policy == OverpaymentPolicy::HoldAsCredit
        })
        .times(1)
        .returning(|_, _| Ok(allocation_result()));
    let body = r#"{"client_id": 1, "amount": 15000, "date": "2025-01-03T00:00:00Z"}"#;
    let (status, json) = post_request("/api/payment", body, configure_with(ledger)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["payment"]["id"], json!(10));
    assert_eq!(json["unapplied"], json!(0));
    assert_eq!(json["allocations"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(json["orders"][0]["status"], json!("Settled"));
    assert_eq!(json["orders"][1]["status"], json!("Partial"));
    assert_eq!(json["orders"][1]["paid"], json!(5_000));
}

#[actix_web::test]
async fn out_of_range_payments_never_reach_the_ledger() {
    let mut ledger = MockLedger::new();
    ledger.expect_register_payment().never();
    let body = r#"{"client_id": 1, "amount": 0}"#;
    let (status, json) = post_request("/api/payment", body, configure_with(ledger)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        json!("Amounts must be positive and no larger than $10000000000000.00, but $0.00 was given.")
    );

    let mut ledger = MockLedger::new();
    ledger.expect_register_payment().never();
    let body = r#"{"client_id": 1, "amount": 9223372036854775807}"#;
    let (status, _) = post_request("/api/payment", body, configure_with(ledger)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn malformed_payment_bodies_are_bad_requests() {
    let mut ledger = MockLedger::new();
    ledger.expect_register_payment().never();
    let body = r#"{"client_id": 1, "amount": 100, "date": "yesterday"}"#;
    let (status, json) = post_request("/api/payment", body, configure_with(ledger)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some_and(|s| s.starts_with("Could not read request body")));
}

#[actix_web::test]
async fn payments_for_unknown_clients() {
    let mut ledger = MockLedger::new();
    ledger.expect_register_payment().returning(|p, _| Err(LedgerError::ClientNotFound(p.client_id)));
    let body = r#"{"client_id": 99, "amount": 100}"#;
    let (status, json) = post_request("/api/payment", body, configure_with(ledger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], json!("Client #99 does not exist."));
}

#[actix_web::test]
async fn conflicts_that_outlast_the_retries_are_409s() {
    let mut ledger = MockLedger::new();
    ledger
        .expect_register_payment()
        .times(4)
        .returning(|_, _| Err(LedgerError::ConcurrencyConflict("database is locked".into())));
    let body = r#"{"client_id": 1, "amount": 100}"#;
    let (status, _) = post_request("/api/payment", body, configure_with(ledger)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn delete_payment() {
    let mut ledger = MockLedger::new();
    ledger.expect_delete_payment().withf(|id| *id == 10).times(1).returning(|_| {
        Ok(PaymentReversal {
            payment: payment(10, 1, 15_000),
            allocations: vec![allocation(1, 10, 1, 10_000), allocation(2, 10, 2, 5_000)],
            orders: vec![order(1, 1, 1, 10_000, 0), order(2, 1, 2, 10_000, 0)],
        })
    });
    let (status, json) = delete_request("/api/payment/10", configure_with(ledger)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], json!(true));
    assert_eq!(json["message"], json!("Payment #10 deleted. $150.00 was reversed across 2 orders."));
}

#[actix_web::test]
async fn delete_missing_payment() {
    let mut ledger = MockLedger::new();
    ledger.expect_delete_payment().returning(|id| Err(LedgerError::PaymentNotFound(id)));
    let (status, json) = delete_request("/api/payment/10", configure_with(ledger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], json!("Payment #10 does not exist."));
}

#[actix_web::test]
async fn delete_with_a_bad_id() {
    let mut ledger = MockLedger::new();
    ledger.expect_delete_payment().never();
    let (status, json) = delete_request("/api/payment/ten", configure_with(ledger)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some_and(|s| s.starts_with("Could not read request path")));
}

#[actix_web::test]
async fn apply_credit() {
    let mut ledger = MockLedger::new();
    ledger.expect_apply_client_credit().withf(|id| *id == 1).times(1).returning(|client_id| {
        Ok(CreditApplication {
            client_id,
            allocations: vec![allocation(3, 10, 4, 3_000)],
            orders: vec![order(4, 1, 20, 4_000, 3_000)],
            remaining_credit: Money::from(0),
        })
    });
    let (status, json) = post_request("/api/client/1/apply-credit", "", configure_with(ledger)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["client_id"], json!(1));
    assert_eq!(json["allocations"][0]["amount"], json!(3_000));
    assert_eq!(json["remaining_credit"], json!(0));
}
