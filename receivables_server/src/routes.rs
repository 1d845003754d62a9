//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every ledger operation is therefore awaited, never blocked on.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use receivables_engine::{LedgerDatabase, PaymentFlowApi, ReceivablesApi, ReceivablesManagement};

use crate::{
    data_objects::{HistoryQuery, JsonResponse, RegisterPaymentRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(register_payment => Post "/payment" impl LedgerDatabase);
/// Route handler for registering a payment
///
/// The payment is allocated to the client's open orders, oldest first. The response contains the stored payment, the
/// allocations it made, the orders it touched, and any amount held back as client credit.
///
/// Non-positive amounts are rejected with a 400. If the deployment rejects overpayments, so is a payment larger
/// than everything the client owes.
pub async fn register_payment<B: LedgerDatabase>(
    body: web::Json<RegisterPaymentRequest>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST payment of {} for client #{}", request.amount, request.client_id);
    let result = api.register_payment(request.into()).await.map_err(|e| {
        debug!("💻️ Could not register payment. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(result))
}

route!(delete_payment => Delete "/payment/{id}" impl LedgerDatabase);
/// Route handler for deleting a payment
///
/// Every allocation the payment made is reversed before the payment itself is removed. Deleting a payment that does
/// not exist (including one that was already deleted) returns a 404.
pub async fn delete_payment<B: LedgerDatabase>(
    path: web::Path<i64>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    debug!("💻️ DELETE payment #{payment_id}");
    let reversal = api.delete_payment(payment_id).await.map_err(|e| {
        debug!("💻️ Could not delete payment #{payment_id}. {e}");
        ServerError::from(e)
    })?;
    let message = format!(
        "Payment #{payment_id} deleted. {} was reversed across {} orders.",
        reversal.reversed(),
        reversal.orders.len()
    );
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}

route!(payment_detail => Get "/payment/{id}" impl ReceivablesManagement);
pub async fn payment_detail<B: ReceivablesManagement>(
    path: web::Path<i64>,
    api: web::Data<ReceivablesApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    debug!("💻️ GET payment #{payment_id}");
    let detail = api.payment_detail(payment_id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

route!(payment_history => Get "/payment-history" impl ReceivablesManagement);
/// Route handler for the payment history
///
/// Returns the most recent payments, newest first, with the client and payment method names resolved. Use the
/// `limit` query parameter to ask for more or fewer than the configured default.
pub async fn payment_history<B: ReceivablesManagement>(
    query: web::Query<HistoryQuery>,
    api: web::Data<ReceivablesApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let limit = query.into_inner().limit;
    debug!("💻️ GET payment history (limit: {limit:?})");
    let history = api.payment_history(limit).await.map_err(|e| {
        debug!("💻️ Could not fetch payment history. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(history))
}

//----------------------------------------------   Receivables  ----------------------------------------------------
route!(accounts_receivable => Get "/accounts-receivable" impl ReceivablesManagement);
/// Route handler for the accounts receivable report
///
/// Lists every client with a positive balance on their open orders, together with the number of open orders and the
/// date of the oldest one. Clients with the oldest debt come first.
pub async fn accounts_receivable<B: ReceivablesManagement>(
    api: web::Data<ReceivablesApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET accounts receivable");
    let accounts = api.accounts_receivable().await.map_err(|e| {
        debug!("💻️ Could not fetch accounts receivable. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(accounts))
}

route!(open_orders => Get "/client/{id}/open-orders" impl ReceivablesManagement);
/// Route handler for a client's open orders, in the order that payments will be applied to them.
pub async fn open_orders<B: ReceivablesManagement>(
    path: web::Path<i64>,
    api: web::Data<ReceivablesApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let client_id = path.into_inner();
    debug!("💻️ GET open orders for client #{client_id}");
    let orders = api.open_orders(client_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(client_balance => Get "/client/{id}/balance" impl ReceivablesManagement);
pub async fn client_balance<B: ReceivablesManagement>(
    path: web::Path<i64>,
    api: web::Data<ReceivablesApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let client_id = path.into_inner();
    debug!("💻️ GET balance for client #{client_id}");
    let balance = api.client_balance(client_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

route!(apply_credit => Post "/client/{id}/apply-credit" impl LedgerDatabase);
/// Route handler for applying a client's held credit
///
/// Money left over from earlier overpayments is allocated to the client's open orders, oldest payment and oldest
/// order first.
pub async fn apply_credit<B: LedgerDatabase>(
    path: web::Path<i64>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let client_id = path.into_inner();
    debug!("💻️ POST apply credit for client #{client_id}");
    let result = api.apply_client_credit(client_id).await.map_err(|e| {
        debug!("💻️ Could not apply credit for client #{client_id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(result))
}

route!(audit_client => Get "/client/{id}/audit" impl ReceivablesManagement);
/// Route handler for the ledger audit
///
/// Recomputes the client's order balances from the allocation records. A ledger that does not add up is reported as
/// a 500, since it can only be the result of a bug.
pub async fn audit_client<B: ReceivablesManagement>(
    path: web::Path<i64>,
    api: web::Data<ReceivablesApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let client_id = path.into_inner();
    debug!("💻️ GET audit for client #{client_id}");
    let audit = api.verify_client_ledger(client_id).await?;
    Ok(HttpResponse::Ok().json(audit))
}
