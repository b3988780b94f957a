//! Payment callback signatures.
//!
//! Two verifiers are provided:
//! * [`SharedSecretVerifier`] accepts a callback if its signature is the shared API secret itself. It offers no
//!   protection against a leaked callback being replayed for another order, and only exists so that simple mock
//!   front-ends keep working.
//! * [`HmacSignatureVerifier`] expects `base64(HMAC-SHA256(secret, "{order_id}:{transaction_id}"))`, where the
//!   transaction id is empty if the callback does not carry one. Use [`sign_callback`] to produce signatures.
use hmac::{Hmac, Mac};
use log::*;
use rpg_common::Secret;
use sha2::Sha256;

use crate::{engine_api::payment_objects::CallbackPayload, traits::CallbackVerifier};

type HmacSha256 = Hmac<Sha256>;

//--------------------------------------   SharedSecretVerifier   ------------------------------------------------------
pub struct SharedSecretVerifier {
    secret: Secret<String>,
}

impl SharedSecretVerifier {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }
}

impl CallbackVerifier for SharedSecretVerifier {
    fn verify(&self, payload: &CallbackPayload) -> bool {
        let valid = constant_time_eq(payload.signature.as_bytes(), self.secret.reveal().as_bytes());
        if !valid {
            warn!("📞️ Callback for order [{}] does not carry the shared secret", payload.order_id);
        }
        valid
    }
}

//--------------------------------------  HmacSignatureVerifier   ------------------------------------------------------
pub struct HmacSignatureVerifier {
    secret: Secret<String>,
}

impl HmacSignatureVerifier {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }
}

impl CallbackVerifier for HmacSignatureVerifier {
    fn verify(&self, payload: &CallbackPayload) -> bool {
        let signature = match base64::decode(payload.signature.trim()) {
            Ok(s) => s,
            Err(e) => {
                warn!("📞️ Callback signature for order [{}] is not valid base64: {e}", payload.order_id);
                return false;
            },
        };
        let Some(mut mac) = new_mac(&self.secret) else {
            return false;
        };
        mac.update(signed_message(payload).as_bytes());
        let valid = mac.verify_slice(&signature).is_ok();
        if !valid {
            warn!("📞️ Callback signature for order [{}] does not match", payload.order_id);
        }
        valid
    }
}

/// Signs a callback payload for use with [`HmacSignatureVerifier`].
pub fn sign_callback(secret: &Secret<String>, payload: &CallbackPayload) -> String {
    match new_mac(secret) {
        Some(mut mac) => {
            mac.update(signed_message(payload).as_bytes());
            base64::encode(mac.finalize().into_bytes())
        },
        None => String::default(),
    }
}

fn new_mac(secret: &Secret<String>) -> Option<HmacSha256> {
    match HmacSha256::new_from_slice(secret.reveal().as_bytes()) {
        Ok(mac) => Some(mac),
        Err(e) => {
            error!("📞️ Could not initialise HMAC with the configured secret: {e}");
            None
        },
    }
}

fn signed_message(payload: &CallbackPayload) -> String {
    format!("{}:{}", payload.order_id, payload.transaction_id.as_deref().unwrap_or_default())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
