use qrcode::{render::svg, EcLevel, QrCode};

use crate::traits::{PaymentGatewayError, QrEncoder};

/// Renders QR codes as SVG images and wraps them in a base64 `data:` URI, ready to drop into an `<img>` tag.
#[derive(Debug, Clone, Copy)]
pub struct SvgQrEncoder {
    min_size: u32,
}

impl Default for SvgQrEncoder {
    fn default() -> Self {
        Self { min_size: 200 }
    }
}

impl SvgQrEncoder {
    pub fn new(min_size: u32) -> Self {
        Self { min_size }
    }
}

impl QrEncoder for SvgQrEncoder {
    fn encode(&self, data: &str) -> Result<String, PaymentGatewayError> {
        let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::L)
            .map_err(|e| PaymentGatewayError::DescriptorError(format!("Cannot encode '{data}' as a QR code. {e}")))?;
        let image = code
            .render::<svg::Color>()
            .min_dimensions(self.min_size, self.min_size)
            .dark_color(svg::Color("#000000"))
            .light_color(svg::Color("#ffffff"))
            .build();
        Ok(format!("data:image/svg+xml;base64,{}", base64::encode(image)))
    }
}
