mod callback_signature;
mod qr_encoder;

pub use callback_signature::{sign_callback, HmacSignatureVerifier, SharedSecretVerifier};
pub use qr_encoder::SvgQrEncoder;
