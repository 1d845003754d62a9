use cucumber::given;
use receivables_engine::{
    db_types::{Money, NewClient, NewOrder},
    ClientRegistry,
    OrderManagement,
    OverpaymentPolicy,
};

use crate::cucumber::{
    ledger_world::{parse_date, LedgerSystem},
    LedgerWorld,
};

#[given("a fresh ledger")]
async fn fresh_ledger(world: &mut LedgerWorld) {
    world.system = Some(LedgerSystem::new(OverpaymentPolicy::HoldAsCredit).await);
}

#[given("a fresh ledger that rejects overpayments")]
async fn fresh_strict_ledger(world: &mut LedgerWorld) {
    world.system = Some(LedgerSystem::new(OverpaymentPolicy::Reject).await);
}

#[given(expr = "client {string}")]
async fn new_client(world: &mut LedgerWorld, name: String) {
    let client = world.system().db.insert_client(NewClient::new(name.clone())).await.expect("Error creating client");
    world.system_mut().clients.insert(name, client.id);
}

#[given(expr = "{string} has an order {string} for {int} dated {word}")]
async fn new_order(world: &mut LedgerWorld, client: String, label: String, total: i64, date: String) {
    let client_id = world.client_id(&client);
    let order = NewOrder::new(client_id, parse_date(&date), Money::from(total));
    let order = world.system().db.insert_order(order).await.expect("Error creating order");
    world.system_mut().orders.insert(label, order.id);
}

#[given(expr = "order {string} is voided")]
async fn void_order(world: &mut LedgerWorld, label: String) {
    let order_id = world.order_id(&label);
    world.system().db.void_order(order_id).await.expect("Error voiding order");
}
