use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use ledger_engine::{AuthApiError, LedgerError, TelegramApiError};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    InvalidStateTransition(String),
    #[error("{0}")]
    AuthenticationError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidStateTransition(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Internal details stay in the log
        let message = if status.is_server_error() {
            error!("💻️ {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": message }).to_string())
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::ValidationError(s) => Self::ValidationError(s),
            LedgerError::OrderNotFound(_)
            | LedgerError::OrderRequestNotFound(_)
            | LedgerError::WithdrawalNotFound(_)
            | LedgerError::BalanceNotFound(_) => Self::NoRecordFound(e.to_string()),
            LedgerError::AlreadySettled(_) | LedgerError::InvalidTransition { .. } => {
                Self::InvalidStateTransition(e.to_string())
            },
            LedgerError::DatabaseError(_) | LedgerError::InvariantViolation(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::DuplicateKey => Self::ValidationError(e.to_string()),
            AuthApiError::ValidationError(s) => Self::ValidationError(s),
            AuthApiError::KeyNotFound(_) => Self::NoRecordFound(e.to_string()),
            AuthApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<TelegramApiError> for ServerError {
    fn from(e: TelegramApiError) -> Self {
        match e {
            TelegramApiError::CabinetAlreadyBound(_) => Self::ValidationError(e.to_string()),
            TelegramApiError::ValidationError(s) => Self::ValidationError(s),
            TelegramApiError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            TelegramApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}
