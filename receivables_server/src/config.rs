//! Server configuration
//!
//! Everything is read from environment variables (a `.env` file is loaded first, if present). Missing values quietly
//! take their defaults. Invalid values are logged and replaced by the default, so the server always starts.
//!
//! | variable                    | default                        |
//! |-----------------------------|--------------------------------|
//! | `RCV_HOST`                  | `127.0.0.1`                    |
//! | `RCV_PORT`                  | `8370`                         |
//! | `RCV_DATABASE_URL`          | `sqlite://data/receivables.db` |
//! | `RCV_DB_MAX_CONNECTIONS`    | `25`                           |
//! | `RCV_DB_BUSY_TIMEOUT_MS`    | `5000`                         |
//! | `RCV_RUN_MIGRATIONS`        | `true`                         |
//! | `RCV_OVERPAYMENT_POLICY`    | `credit`                       |
//! | `RCV_PAYMENT_HISTORY_LIMIT` | `50`                           |
//! | `RCV_CONFLICT_RETRIES`      | `3`                            |
use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::*;
use rcv_common::helpers::parse_boolean_flag;
use receivables_engine::{db_url, OverpaymentPolicy, RetryPolicy, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};

const DEFAULT_RCV_HOST: &str = "127.0.0.1";
const DEFAULT_RCV_PORT: u16 = 8370;
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_CONFLICT_RETRIES: usize = 3;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// How long a connection waits on a locked database before giving up with a conflict.
    pub busy_timeout: Duration,
    pub run_migrations: bool,
    /// What happens to the part of a payment that exceeds everything the client owes.
    pub overpayment_policy: OverpaymentPolicy,
    /// The number of payments returned by the payment history endpoint when the caller doesn't ask for a number.
    pub payment_history_limit: i64,
    /// The number of times a payment operation is retried after colliding with another update to the same client.
    pub conflict_retries: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RCV_HOST.to_string(),
            port: DEFAULT_RCV_PORT,
            database_url: db_url(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            run_migrations: true,
            overpayment_policy: OverpaymentPolicy::default(),
            payment_history_limit: DEFAULT_HISTORY_LIMIT,
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("RCV_HOST").ok().unwrap_or_else(|| DEFAULT_RCV_HOST.into());
        let port = parse_env("RCV_PORT", DEFAULT_RCV_PORT);
        let database_url = db_url();
        let max_connections = match parse_env("RCV_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS) {
            0 => {
                warn!("🪛️ RCV_DB_MAX_CONNECTIONS cannot be zero. Using {DEFAULT_MAX_CONNECTIONS} instead.");
                DEFAULT_MAX_CONNECTIONS
            },
            n => n,
        };
        let busy_timeout = Duration::from_millis(parse_env("RCV_DB_BUSY_TIMEOUT_MS", DEFAULT_BUSY_TIMEOUT_MS));
        let run_migrations = parse_boolean_flag(env::var("RCV_RUN_MIGRATIONS").ok(), true);
        let overpayment_policy = parse_env("RCV_OVERPAYMENT_POLICY", OverpaymentPolicy::default());
        let payment_history_limit = history_limit(parse_env("RCV_PAYMENT_HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT));
        let conflict_retries = parse_env("RCV_CONFLICT_RETRIES", DEFAULT_CONFLICT_RETRIES);
        info!("🪛️ Overpayments will be handled with the '{overpayment_policy}' policy");
        Self {
            host,
            port,
            database_url,
            max_connections,
            busy_timeout,
            run_migrations,
            overpayment_policy,
            payment_history_limit,
            conflict_retries,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_retries(self.conflict_retries)
    }
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    parse_value(name, env::var(name).ok(), default)
}

/// Parses `value`, falling back to `default` when it is missing or invalid.
fn parse_value<T>(name: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match value {
        None => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
        Some(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
    }
}

fn history_limit(limit: i64) -> i64 {
    if !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
        warn!("🪛️ RCV_PAYMENT_HISTORY_LIMIT must be between 1 and {MAX_HISTORY_LIMIT}. {limit} will be clamped.");
    }
    limit.clamp(1, MAX_HISTORY_LIMIT)
}
