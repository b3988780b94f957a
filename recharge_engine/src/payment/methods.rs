use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::traits::PaymentGatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// The payer scans a QR code and pays outside the gateway. Confirmed later by callback.
    QrCode,
    /// Payment straight from the payer's balance
    Direct,
    Wechat,
    Alipay,
}

/// How a payment method is funded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Funding {
    /// The order amount is debited from the payer's ledger balance.
    Balance,
    /// Money moves outside the ledger; the payer's balance is never touched.
    External,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] =
        [PaymentMethod::QrCode, PaymentMethod::Direct, PaymentMethod::Wechat, PaymentMethod::Alipay];

    pub fn funding(self) -> Funding {
        match self {
            PaymentMethod::QrCode => Funding::External,
            PaymentMethod::Direct | PaymentMethod::Wechat | PaymentMethod::Alipay => Funding::Balance,
        }
    }

    fn transaction_prefix(self) -> &'static str {
        match self {
            PaymentMethod::QrCode => "qr_",
            PaymentMethod::Direct => "txn_",
            PaymentMethod::Wechat => "wx_",
            PaymentMethod::Alipay => "ali_",
        }
    }

    /// A fresh transaction id in the house style of the method, e.g. `wx_1f2e3d4c`.
    pub fn new_transaction_id(self) -> String {
        short_id(self.transaction_prefix())
    }
}

pub(crate) fn short_id(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}{}", &id[..8])
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::QrCode => write!(f, "qr_code"),
            PaymentMethod::Direct => write!(f, "direct"),
            PaymentMethod::Wechat => write!(f, "wechat"),
            PaymentMethod::Alipay => write!(f, "alipay"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = PaymentGatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qr_code" | "qrcode" => Ok(PaymentMethod::QrCode),
            "direct" => Ok(PaymentMethod::Direct),
            "wechat" => Ok(PaymentMethod::Wechat),
            "alipay" => Ok(PaymentMethod::Alipay),
            _ => Err(PaymentGatewayError::UnsupportedMethod(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_methods() {
        assert_eq!("qr_code".parse::<PaymentMethod>().unwrap(), PaymentMethod::QrCode);
        assert_eq!("WECHAT".parse::<PaymentMethod>().unwrap(), PaymentMethod::Wechat);
        assert_eq!("Alipay".parse::<PaymentMethod>().unwrap(), PaymentMethod::Alipay);
        let err = "paypal".parse::<PaymentMethod>().unwrap_err();
        assert!(matches!(err, PaymentGatewayError::UnsupportedMethod(m) if m == "paypal"));
        for m in PaymentMethod::ALL {
            assert_eq!(m.to_string().parse::<PaymentMethod>().unwrap(), m);
        }
    }

    #[test]
    fn transaction_ids() {
        let id = PaymentMethod::Wechat.new_transaction_id();
        assert!(id.starts_with("wx_"));
        assert_eq!(id.len(), 11);
        assert!(PaymentMethod::Direct.new_transaction_id().starts_with("txn_"));
        assert!(PaymentMethod::Alipay.new_transaction_id().starts_with("ali_"));
        assert_ne!(PaymentMethod::Direct.new_transaction_id(), PaymentMethod::Direct.new_transaction_id());
    }

    #[test]
    fn funding_sources() {
        assert_eq!(PaymentMethod::QrCode.funding(), Funding::External);
        assert_eq!(PaymentMethod::Direct.funding(), Funding::Balance);
        assert_eq!(PaymentMethod::Wechat.funding(), Funding::Balance);
        assert_eq!(serde_json::to_string(&PaymentMethod::QrCode).unwrap(), "\"qr_code\"");
    }
}
