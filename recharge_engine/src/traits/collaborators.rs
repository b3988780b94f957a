use crate::{engine_api::payment_objects::CallbackPayload, traits::PaymentGatewayError};

/// Decides whether an inbound payment confirmation is authentic.
pub trait CallbackVerifier: Send + Sync {
    fn verify(&self, payload: &CallbackPayload) -> bool;
}

/// Turns a payment URL into an image that a payer can scan.
pub trait QrEncoder: Send + Sync {
    /// Returns the image as a `data:` URI.
    fn encode(&self, data: &str) -> Result<String, PaymentGatewayError>;
}
