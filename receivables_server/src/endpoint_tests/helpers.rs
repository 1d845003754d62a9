use actix_web::{
    http::StatusCode,
    test,
    test::TestRequest,
    web::{self, ServiceConfig},
    App,
};
use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use receivables_engine::{
    db_types::{Allocation, Money, Order, OrderStatusType, Payment},
    events::EventProducers,
    PaymentFlowApi,
    ReceivablesApi,
};
use serde_json::Value;

use super::mocks::{MockLedger, MockReceivables};
use crate::server::request_error_handlers;

pub async fn get_request(path: &str, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, Value) {
    send(TestRequest::get().uri(path), configure).await
}

pub async fn delete_request(path: &str, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, Value) {
    send(TestRequest::delete().uri(path), configure).await
}

pub async fn post_request(path: &str, body: &str, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, Value) {
    let req = TestRequest::post()
        .uri(path)
        .insert_header(("content-type", "application/json"))
        .set_payload(body.to_string());
    send(req, configure).await
}

async fn send(req: TestRequest, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, Value) {
    let _ = env_logger::try_init();
    let app = App::new().configure(request_error_handlers).service(web::scope("/api").configure(configure));
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub fn flow_api(ledger: MockLedger) -> web::Data<PaymentFlowApi<MockLedger>> {
    web::Data::new(PaymentFlowApi::new(ledger, EventProducers::default()))
}

pub fn receivables_api(receivables: MockReceivables) -> web::Data<ReceivablesApi<MockReceivables>> {
    web::Data::new(ReceivablesApi::new(receivables))
}

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, d, 0, 0, 0).unwrap()
}

pub fn order(id: i64, client_id: i64, d: u32, total: i64, paid: i64) -> Order {
    let (total, paid) = (Money::from(total), Money::from(paid));
    Order {
        id,
        client_id,
        order_date: day(d),
        total,
        paid,
        status: OrderStatusType::for_amounts(paid, total),
        created_at: day(d),
        updated_at: day(d),
    }
}

pub fn payment(id: i64, client_id: i64, amount: i64) -> Payment {
    Payment {
        id,
        client_id,
        amount: Money::from(amount),
        payment_date: day(3),
        method_id: None,
        description: None,
        created_at: day(3),
    }
}

pub fn allocation(id: i64, payment_id: i64, order_id: i64, amount: i64) -> Allocation {
    Allocation { id, payment_id, order_id, amount: Money::from(amount), created_at: day(3) }
}
