use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderSettledEvent,
    PaymentRegisteredEvent,
    PaymentReversedEvent,
};

type BoxedFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventProducers {
    pub payment_registered_producer: Vec<EventProducer<PaymentRegisteredEvent>>,
    pub order_settled_producer: Vec<EventProducer<OrderSettledEvent>>,
    pub payment_reversed_producer: Vec<EventProducer<PaymentReversedEvent>>,
}

pub struct EventHandlers {
    pub on_payment_registered: Option<EventHandler<PaymentRegisteredEvent>>,
    pub on_order_settled: Option<EventHandler<OrderSettledEvent>>,
    pub on_payment_reversed: Option<EventHandler<PaymentReversedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payment_registered = hooks.on_payment_registered.map(|f| EventHandler::new(buffer_size, f));
        let on_order_settled = hooks.on_order_settled.map(|f| EventHandler::new(buffer_size, f));
        let on_payment_reversed = hooks.on_payment_reversed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_payment_registered, on_order_settled, on_payment_reversed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payment_registered {
            result.payment_registered_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_settled {
            result.order_settled_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payment_reversed {
            result.payment_reversed_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_payment_registered {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_settled {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_payment_reversed {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payment_registered: Option<Handler<PaymentRegisteredEvent>>,
    pub on_order_settled: Option<Handler<OrderSettledEvent>>,
    pub on_payment_reversed: Option<Handler<PaymentReversedEvent>>,
}

impl EventHooks {
    pub fn on_payment_registered<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentRegisteredEvent) -> BoxedFuture) + Send + Sync + 'static {
        self.on_payment_registered = Some(Arc::new(f));
        self
    }

    pub fn on_order_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderSettledEvent) -> BoxedFuture) + Send + Sync + 'static {
        self.on_order_settled = Some(Arc::new(f));
        self
    }

    pub fn on_payment_reversed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentReversedEvent) -> BoxedFuture) + Send + Sync + 'static {
        self.on_payment_reversed = Some(Arc::new(f));
        self
    }
}
