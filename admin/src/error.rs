use payloads::{ClientError, RetryClass, Retryable};
use reqwest::StatusCode;

/// A failed admin operation, carrying the message to show the user.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// Client-side checks failed; nothing was sent.
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("{message}")]
    Request {
        message: String,
        #[source]
        source: ClientError,
    },
    #[error("No tiene permisos para acceder a esta sección")]
    Forbidden,
    #[error("Debe iniciar sesión para continuar")]
    Unauthenticated,
}

impl AdminError {
    pub fn validation(problem: impl Into<String>) -> Self {
        Self::Validation(vec![problem.into()])
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AdminError::Request { source, .. } => source.status(),
            AdminError::Forbidden => Some(StatusCode::FORBIDDEN),
            AdminError::Unauthenticated => Some(StatusCode::UNAUTHORIZED),
            AdminError::Validation(_) => None,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            AdminError::Request {
                source: ClientError::SessionExpired,
                ..
            }
        )
    }
}

impl Retryable for AdminError {
    fn retry_class(&self) -> RetryClass {
        match self {
            AdminError::Request { source, .. } => source.retry_class(),
            AdminError::Validation(_)
            | AdminError::Forbidden
            | AdminError::Unauthenticated => RetryClass::Client,
        }
    }
}

/// Per-module wording for the statuses users commonly run into.
#[derive(Debug, Clone, Copy)]
pub struct ErrorMessages {
    pub not_found: &'static str,
    pub conflict: &'static str,
    pub forbidden: &'static str,
}

pub const FORBIDDEN_MESSAGE: &str =
    "No tiene permisos para realizar esta acción";

impl ErrorMessages {
    /// 404, 409 and 403 get the module's wording; everything else keeps
    /// the message the client produced.
    pub fn map(&self, error: ClientError) -> AdminError {
        let message = match error.status() {
            Some(StatusCode::NOT_FOUND) => self.not_found.to_string(),
            Some(StatusCode::CONFLICT) => self.conflict.to_string(),
            Some(StatusCode::FORBIDDEN) => self.forbidden.to_string(),
            _ => error.to_string(),
        };
        AdminError::Request {
            message,
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payloads::APIErrorDetails;
    use payloads::api_client::SESSION_EXPIRED_MESSAGE;

    const MESSAGES: ErrorMessages = ErrorMessages {
        not_found: "Registro no encontrado",
        conflict: "Ya existe un registro con ese código",
        forbidden: FORBIDDEN_MESSAGE,
    };

    fn api_error(status: StatusCode, message: &str) -> ClientError {
        ClientError::APIError(APIErrorDetails {
            status,
            message: message.into(),
            code: None,
            details: None,
        })
    }

    #[test]
    fn known_statuses_use_module_wording() {
        let error = MESSAGES.map(api_error(StatusCode::NOT_FOUND, "nope"));
        assert_eq!(error.to_string(), "Registro no encontrado");
        assert_eq!(error.status(), Some(StatusCode::NOT_FOUND));

        let error = MESSAGES.map(api_error(StatusCode::CONFLICT, "dup"));
        assert_eq!(error.to_string(), "Ya existe un registro con ese código");
    }

    #[test]
    fn other_statuses_keep_backend_message() {
        let error = MESSAGES
            .map(api_error(StatusCode::BAD_REQUEST, "codigo inválido"));
        assert_eq!(error.to_string(), "codigo inválido");
        assert_eq!(error.retry_class(), RetryClass::Client);

        let error = MESSAGES
            .map(api_error(StatusCode::INTERNAL_SERVER_ERROR, "db down"));
        assert_eq!(error.to_string(), "db down");
        assert_eq!(error.retry_class(), RetryClass::Server);
    }

    #[test]
    fn expired_session_keeps_fixed_message() {
        let error = MESSAGES.map(ClientError::SessionExpired);
        assert_eq!(error.to_string(), SESSION_EXPIRED_MESSAGE);
        assert!(error.is_session_expired());
    }
}
