use cucumber::{then, when};
use receivables_engine::{
    db_types::{Money, NewPayment, OrderStatusType},
    OrderManagement,
};

use crate::cucumber::{ledger_world::parse_date, LedgerWorld};

#[when(expr = "{string} pays {int} on {word} as payment {string}")]
async fn pay(world: &mut LedgerWorld, client: String, amount: i64, date: String, label: String) {
    let client_id = world.client_id(&client);
    let payment = NewPayment::new(client_id, Money::from(amount)).with_date(parse_date(&date));
    let result = world.system().flow.register_payment(payment).await;
    match result {
        Ok(result) => {
            world.system_mut().payments.insert(label, result.payment.id);
            world.system_mut().last_error = None;
        },
        Err(e) => world.system_mut().last_error = Some(e),
    }
}

#[when(expr = "payment {string} is deleted")]
async fn delete_payment(world: &mut LedgerWorld, label: String) {
    let payment_id = world.payment_id(&label);
    let result = world.system().flow.delete_payment(payment_id).await;
    world.system_mut().last_error = result.err();
}

#[when(expr = "the credit held by {string} is applied")]
async fn apply_credit(world: &mut LedgerWorld, client: String) {
    let client_id = world.client_id(&client);
    let result = world.system().flow.apply_client_credit(client_id).await;
    world.system_mut().last_error = result.err();
}

#[then(expr = "order {string} has {int} paid and is {word}")]
async fn order_state(world: &mut LedgerWorld, label: String, paid: i64, status: String) {
    let order_id = world.order_id(&label);
    let order = world.system().db.fetch_order(order_id).await.expect("Error fetching order").expect("No such order");
    let status = status.parse::<OrderStatusType>().expect("Not a valid order status");
    assert_eq!(order.paid, Money::from(paid), "Order {label} has the wrong paid amount");
    assert_eq!(order.status, status, "Order {label} has the wrong status");
}

#[then("the last operation succeeded")]
async fn succeeded(world: &mut LedgerWorld) {
    assert_eq!(world.system().last_error, None);
}

#[then(expr = "the last operation failed with {word}")]
async fn failed(world: &mut LedgerWorld, kind: String) {
    let err = world.system().last_error.as_ref().expect("The last operation did not fail");
    let debug = format!("{err:?}");
    assert!(debug.starts_with(&kind), "Expected a {kind} error, but got {debug}");
}

#[then(expr = "{string} owes {int}")]
async fn owes(world: &mut LedgerWorld, client: String, debt: i64) {
    let client_id = world.client_id(&client);
    let balance = world.system().reports.client_balance(client_id).await.expect("Error fetching balance");
    assert_eq!(balance.total_debt, Money::from(debt));
}

#[then(expr = "{string} holds {int} in credit")]
async fn holds_credit(world: &mut LedgerWorld, client: String, credit: i64) {
    let client_id = world.client_id(&client);
    let balance = world.system().reports.client_balance(client_id).await.expect("Error fetching balance");
    assert_eq!(balance.unapplied_credit, Money::from(credit));
}

#[then(expr = "the ledger for {string} is consistent")]
async fn consistent(world: &mut LedgerWorld, client: String) {
    let client_id = world.client_id(&client);
    world.system().reports.verify_client_ledger(client_id).await.expect("Ledger is inconsistent");
}

#[then(expr = "the accounts receivable report lists {int} clients")]
async fn receivables_report(world: &mut LedgerWorld, count: usize) {
    let accounts = world.system().reports.accounts_receivable().await.expect("Error fetching receivables");
    assert_eq!(accounts.len(), count);
}
