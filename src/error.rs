//! EndyOS Error Types
//!
//! Centralized error handling for the assistant core. Cache misses and
//! unmatched prompts are `None`, never an error.

use std::time::Duration;
use thiserror::Error;

/// Central error type for EndyOS
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Empty or invalid prompt")]
    InputInvalid,

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Generation timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Backend returned an empty response")]
    EmptyResponse,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for EndyOS operations
pub type AssistantResult<T> = Result<T, AssistantError>;

impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AssistantError::MalformedResponse(err.to_string())
        } else {
            AssistantError::Transport(err.to_string())
        }
    }
}

impl AssistantError {
    /// Spoken message for a failure that reached the user
    pub fn user_message(&self) -> &'static str {
        match self {
            AssistantError::InputInvalid => {
                "Por favor, escribe algo para que EndyOS pueda ayudarte."
            }
            AssistantError::BackendUnavailable(_) => {
                "Lo siento, el servicio de IA no está disponible en este momento."
            }
            AssistantError::Transport(_) => "Problemas de conexión. Verifica tu internet.",
            AssistantError::MalformedResponse(_) => {
                "Hay un problema con el servicio de IA. Verifica tu conexión."
            }
            AssistantError::TimedOut(_) => {
                "La respuesta tardó demasiado. ¿Intentamos con algo más simple?"
            }
            AssistantError::EmptyResponse => {
                "No pude generar una respuesta. ¿Puedes intentar reformular tu pregunta?"
            }
            _ => "Lo siento, EndyOS tuvo un pequeño problema. ¿Intentamos de nuevo?",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_is_distinct() {
        let timeout = AssistantError::TimedOut(Duration::from_secs(30));
        let transport = AssistantError::Transport("connection reset".into());
        assert!(timeout.user_message().contains("más simple"));
        assert_ne!(timeout.user_message(), transport.user_message());
    }

    #[test]
    fn test_other_errors_share_generic_message() {
        let err = AssistantError::Config("bad".into());
        assert!(err.user_message().starts_with("Lo siento"));
    }
}
