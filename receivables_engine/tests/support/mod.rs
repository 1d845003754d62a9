#![allow(dead_code)]
use chrono::{DateTime, TimeZone, Utc};
use log::*;
use receivables_engine::{
    db_types::{Client, Money, NewClient, NewOrder, Order},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    ClientRegistry,
    LedgerDatabase,
    OrderManagement,
    OverpaymentPolicy,
    PaymentFlowApi,
    ReceivablesApi,
    RetryPolicy,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub struct TestLedger {
    pub url: String,
    pub db: SqliteDatabase,
    pub flow: PaymentFlowApi<SqliteDatabase>,
    pub reports: ReceivablesApi<SqliteDatabase>,
}

impl TestLedger {
    pub async fn new() -> Self {
        Self::with_config(OverpaymentPolicy::HoldAsCredit, EventProducers::default()).await
    }

    pub async fn with_config(policy: OverpaymentPolicy, producers: EventProducers) -> Self {
        let url = random_db_path();
        let db = prepare_test_env(&url).await;
        let flow = PaymentFlowApi::new(db.clone(), producers)
            .with_overpayment_policy(policy)
            .with_retry_policy(RetryPolicy::default().with_max_retries(10));
        let reports = ReceivablesApi::new(db.clone());
        Self { url, db, flow, reports }
    }

    pub async fn client(&self, name: &str) -> Client {
        self.db.insert_client(NewClient::new(name)).await.expect("Error creating client")
    }

    pub async fn order(&self, client_id: i64, date: DateTime<Utc>, total: i64) -> Order {
        self.db.insert_order(NewOrder::new(client_id, date, Money::from(total))).await.expect("Error creating order")
    }

    pub async fn reload(&self, order: &Order) -> Order {
        self.db.fetch_order(order.id).await.expect("Error fetching order").expect("Order has gone missing")
    }

    pub async fn tear_down(mut self) {
        if let Err(e) = self.flow.db_mut().close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        if let Err(e) = self.db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        if let Err(e) = Sqlite::drop_database(&self.url).await {
            warn!("🚀️ Could not remove test database {}: {e}", self.url);
        }
    }
}

pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}
