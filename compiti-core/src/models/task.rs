use serde::{Deserialize, Serialize};

/// Compito esposto sul wire; una riga della tabella `tasks` del database dell'utente.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    // serializzato come null quando assente, il front end si aspetta sempre il campo
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: String, // UTC, larghezza fissa (vedi utils::time)
}
