use std::time::Duration;

use actix_web::{
    dev::Server,
    error::{JsonPayloadError, PathError, QueryPayloadError},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpRequest,
    HttpServer,
};
use log::*;
use receivables_engine::{events::EventProducers, PaymentFlowApi, ReceivablesApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        AccountsReceivableRoute,
        ApplyCreditRoute,
        AuditClientRoute,
        ClientBalanceRoute,
        DeletePaymentRoute,
        OpenOrdersRoute,
        PaymentDetailRoute,
        PaymentHistoryRoute,
        RegisterPaymentRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_options(&config.database_url, config.max_connections, config.busy_timeout)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
        info!("🚀️ Database migrations complete");
    }
    let srv = create_server_instance(config, db, EventProducers::default())?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let bind_addr = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let flow_api = PaymentFlowApi::new(db.clone(), producers.clone())
            .with_overpayment_policy(config.overpayment_policy)
            .with_retry_policy(config.retry_policy());
        let receivables_api = ReceivablesApi::new(db.clone()).with_history_limit(config.payment_history_limit);
        let api_scope = web::scope("/api")
            .service(RegisterPaymentRoute::<SqliteDatabase>::new())
            .service(DeletePaymentRoute::<SqliteDatabase>::new())
            .service(PaymentDetailRoute::<SqliteDatabase>::new())
            .service(PaymentHistoryRoute::<SqliteDatabase>::new())
            .service(AccountsReceivableRoute::<SqliteDatabase>::new())
            .service(OpenOrdersRoute::<SqliteDatabase>::new())
            .service(ClientBalanceRoute::<SqliteDatabase>::new())
            .service(ApplyCreditRoute::<SqliteDatabase>::new())
            .service(AuditClientRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("rcv::access_log"))
            .configure(request_error_handlers)
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(receivables_api))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((bind_addr.0.as_str(), bind_addr.1))?
    .run();
    Ok(srv)
}

/// Malformed bodies, paths and query strings are reported as 400s with the same JSON error body as every other
/// failure.
pub fn request_error_handlers(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .app_data(web::QueryConfig::default().error_handler(query_error));
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Rejecting request body. {err}");
    ServerError::InvalidRequestBody(err.to_string()).into()
}

fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Rejecting request path. {err}");
    ServerError::InvalidRequestPath(err.to_string()).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Rejecting query string. {err}");
    ServerError::InvalidRequestBody(err.to_string()).into()
}
