//! # Recharge payment gateway server
//! This module hosts the HTTP server for the recharge engine. It is responsible for:
//! Accepting top-up orders and payment requests from clients.
//! Receiving payment confirmations from the payment gateway.
//! Handing each request to the engine APIs and mapping the outcome onto an HTTP response.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/register`, `/api/check_balance`: Account registration and balance queries.
//! * `/api/place_order`, `/api/order_status`: Order creation and status queries.
//! * `/api/pay`, `/api/payment_descriptor`, `/api/payment_status`: Payments.
//! * `/api/payment_callback`: Payment confirmations from the gateway.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
