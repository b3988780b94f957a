use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{EventHandler, EventProducer, Handler, OrderFailedEvent, OrderPaidEvent, OrderRechargedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
    pub order_recharged_producer: Vec<EventProducer<OrderRechargedEvent>>,
    pub order_failed_producer: Vec<EventProducer<OrderFailedEvent>>,
}

impl EventProducers {
    pub async fn publish_order_paid(&self, event: OrderPaidEvent) {
        for emitter in &self.order_paid_producer {
            trace!("📬️ Notifying order paid hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_recharged(&self, event: OrderRechargedEvent) {
        for emitter in &self.order_recharged_producer {
            trace!("📬️ Notifying order recharged hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_failed(&self, event: OrderFailedEvent) {
        for emitter in &self.order_failed_producer {
            trace!("📬️ Notifying order failed hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_order_recharged: Option<EventHandler<OrderRechargedEvent>>,
    pub on_order_failed: Option<EventHandler<OrderFailedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_paid = hooks.on_order_paid.map(|f| EventHandler::new(buffer_size, f));
        let on_order_recharged = hooks.on_order_recharged.map(|f| EventHandler::new(buffer_size, f));
        let on_order_failed = hooks.on_order_failed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_paid, on_order_recharged, on_order_failed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_paid {
            result.order_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_recharged {
            result.order_recharged_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_failed {
            result.order_failed_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_paid {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_order_recharged {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_order_failed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_order_recharged: Option<Handler<OrderRechargedEvent>>,
    pub on_order_failed: Option<Handler<OrderFailedEvent>>,
}

impl EventHooks {
    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_order_recharged<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderRechargedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_recharged = Some(Arc::new(f));
        self
    }

    pub fn on_order_failed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderFailedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_failed = Some(Arc::new(f));
        self
    }
}
