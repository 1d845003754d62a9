use std::fmt::Debug;

use log::*;

use crate::{
    allocation::OverpaymentPolicy,
    db_types::{NewPayment, Order, OrderStatusType},
    events::{EventProducers, OrderSettledEvent, PaymentRegisteredEvent, PaymentReversedEvent},
    ledger_api::retry::RetryPolicy,
    traits::{CreditApplication, LedgerDatabase, LedgerError, PaymentAllocation, PaymentReversal},
};

/// `PaymentFlowApi` is the primary API for recording and reversing client payments.
///
/// It validates requests before they reach the backend, retries units of work that lost a race for a client's
/// ledger, and notifies event subscribers once a unit of work has committed.
pub struct PaymentFlowApi<B> {
    db: B,
    producers: EventProducers,
    policy: OverpaymentPolicy,
    retry: RetryPolicy,
}

impl<B> Debug for PaymentFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi (overpayment: {})", self.policy)
    }
}

impl<B> PaymentFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, policy: OverpaymentPolicy::default(), retry: RetryPolicy::default() }
    }

    pub fn with_overpayment_policy(mut self, policy: OverpaymentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> PaymentFlowApi<B>
where B: LedgerDatabase
{
    /// Records a payment and allocates it to the client's open orders, oldest first.
    ///
    /// The amount must be positive and no larger than [`MAX_AMOUNT`](crate::db_types::Money::MAX_AMOUNT). If the
    /// payment is larger than everything the client owes, the excess is either
    /// held as credit or the whole payment is refused, depending on the configured [`OverpaymentPolicy`].
    pub async fn register_payment(&self, payment: NewPayment) -> Result<PaymentAllocation, LedgerError> {
        if !payment.amount.is_valid_payment() {
            return Err(LedgerError::InvalidAmount(payment.amount));
        }
        let client_id = payment.client_id;
        let result = self
            .retry
            .run("register_payment", || self.db.register_payment(payment.clone(), self.policy))
            .await?;
        info!(
            "🔄️💰️ Payment #{} of {} for client #{client_id} recorded. {} applied, {} unapplied",
            result.payment.id,
            result.payment.amount,
            result.applied(),
            result.unapplied
        );
        self.call_payment_registered_hook(&result).await;
        let settled = result.settled_orders().cloned().collect::<Vec<_>>();
        self.call_order_settled_hook(&settled).await;
        Ok(result)
    }

    /// Deletes a payment and undoes every allocation it made. Deleting the same payment twice yields
    /// `PaymentNotFound` the second time.
    pub async fn delete_payment(&self, payment_id: i64) -> Result<PaymentReversal, LedgerError> {
        let result = self.retry.run("delete_payment", || self.db.delete_payment(payment_id)).await?;
        info!(
            "🔄️💰️ Payment #{payment_id} deleted. {} reversed across {} orders",
            result.reversed(),
            result.orders.len()
        );
        self.call_payment_reversed_hook(&result).await;
        Ok(result)
    }

    /// Applies whatever credit the client holds from earlier overpayments to their open orders.
    pub async fn apply_client_credit(&self, client_id: i64) -> Result<CreditApplication, LedgerError> {
        let result = self.retry.run("apply_client_credit", || self.db.apply_client_credit(client_id)).await?;
        info!(
            "🔄️💰️ Applied {} of held credit for client #{client_id}. {} remains",
            result.applied(),
            result.remaining_credit
        );
        let settled = result
            .orders
            .iter()
            .filter(|o| o.status == OrderStatusType::Settled)
            .cloned()
            .collect::<Vec<_>>();
        self.call_order_settled_hook(&settled).await;
        Ok(result)
    }

    async fn call_payment_registered_hook(&self, result: &PaymentAllocation) {
        for emitter in &self.producers.payment_registered_producer {
            debug!("🔄️💰️ Notifying payment registered hook subscribers");
            let event = PaymentRegisteredEvent::new(result.payment.clone(), result.allocations.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_settled_hook(&self, settled: &[Order]) {
        for emitter in &self.producers.order_settled_producer {
            debug!("🔄️📦️ Notifying order settled hook subscribers");
            for order in settled {
                emitter.publish_event(OrderSettledEvent::new(order.clone())).await;
            }
        }
    }

    async fn call_payment_reversed_hook(&self, result: &PaymentReversal) {
        for emitter in &self.producers.payment_reversed_producer {
            debug!("🔄️💰️ Notifying payment reversed hook subscribers");
            let event = PaymentReversedEvent::new(result.payment.clone(), result.orders.clone());
            emitter.publish_event(event).await;
        }
    }
}
