use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use recharge_engine::PaymentGatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request query: {0}")]
    InvalidRequestQuery(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("{0}")]
    PaymentError(#[from] PaymentGatewayError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestQuery(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PaymentError(e) => match e {
                PaymentGatewayError::InvalidAccount(_) => StatusCode::BAD_REQUEST,
                PaymentGatewayError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
                PaymentGatewayError::UnsupportedMethod(_) => StatusCode::BAD_REQUEST,
                PaymentGatewayError::InsufficientBalance { .. } => StatusCode::BAD_REQUEST,
                PaymentGatewayError::InvalidSignature(_) => StatusCode::FORBIDDEN,
                PaymentGatewayError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                PaymentGatewayError::OrderNotPayable { .. } => StatusCode::CONFLICT,
                PaymentGatewayError::IllegalTransition(_) => StatusCode::CONFLICT,
                PaymentGatewayError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
                PaymentGatewayError::GatewayUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                PaymentGatewayError::DescriptorError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                PaymentGatewayError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}
