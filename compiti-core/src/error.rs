use serde::{Deserialize, Serialize};

/// Corpo JSON restituito per ogni errore HTTP: `{"error": "..."}`.
/// Il messaggio è sempre fisso, la causa vera finisce solo nei log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}
