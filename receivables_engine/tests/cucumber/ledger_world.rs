use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use cucumber::World;
use log::*;
use receivables_engine::{
    events::EventProducers,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    LedgerError,
    OverpaymentPolicy,
    PaymentFlowApi,
    ReceivablesApi,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct LedgerWorld {
    pub system: Option<LedgerSystem>,
}

#[derive(Debug)]
pub struct LedgerSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub flow: PaymentFlowApi<SqliteDatabase>,
    pub reports: ReceivablesApi<SqliteDatabase>,
    pub clients: HashMap<String, i64>,
    pub orders: HashMap<String, i64>,
    pub payments: HashMap<String, i64>,
    pub last_error: Option<LedgerError>,
}

impl LedgerWorld {
    pub fn system(&self) -> &LedgerSystem {
        self.system.as_ref().expect("Ledger not initialised")
    }

    pub fn system_mut(&mut self) -> &mut LedgerSystem {
        self.system.as_mut().expect("Ledger not initialised")
    }

    pub fn client_id(&self, name: &str) -> i64 {
        *self.system().clients.get(name).unwrap_or_else(|| panic!("Unknown client {name}"))
    }

    pub fn order_id(&self, label: &str) -> i64 {
        *self.system().orders.get(label).unwrap_or_else(|| panic!("Unknown order {label}"))
    }

    pub fn payment_id(&self, label: &str) -> i64 {
        *self.system().payments.get(label).unwrap_or_else(|| panic!("Unknown payment {label}"))
    }
}

impl LedgerSystem {
    pub async fn new(policy: OverpaymentPolicy) -> Self {
        let url = random_db_path();
        create_database(&url).await;
        let db = run_migrations(&url).await;
        debug!("Created database: {url}");
        let flow = PaymentFlowApi::new(db.clone(), EventProducers::default()).with_overpayment_policy(policy);
        let reports = ReceivablesApi::new(db.clone());
        Self {
            db_path: url,
            db,
            flow,
            reports,
            clients: HashMap::new(),
            orders: HashMap::new(),
            payments: HashMap::new(),
            last_error: None,
        }
    }
}

pub fn parse_date(s: &str) -> DateTime<Utc> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|e| panic!("Invalid date {s}: {e}"));
    date.and_hms_opt(0, 0, 0).expect("Midnight is a valid time").and_utc()
}
