//! # Receivables server
//! This crate hosts the HTTP front end of the accounts-receivable ledger. It is responsible for:
//! * Accepting client payments and handing them to the allocation engine.
//! * Deleting payments, which reverses every allocation they made.
//! * Serving the payment history, accounts receivable and per-client reports.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /api/payment`: Register a payment.
//! * `DELETE /api/payment/{id}`: Delete a payment and reverse its allocations.
//! * `GET /api/payment/{id}`: A payment together with its allocations.
//! * `GET /api/payment-history`: The most recent payments, newest first.
//! * `GET /api/accounts-receivable`: Every client that owes money.
//! * `GET /api/client/{id}/open-orders`: A client's open orders, in the order payments are applied to them.
//! * `GET /api/client/{id}/balance`: A client's debt and held credit.
//! * `POST /api/client/{id}/apply-credit`: Apply a client's held credit to their open orders.
//! * `GET /api/client/{id}/audit`: Check a client's ledger for consistency.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
