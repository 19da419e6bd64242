use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/*
    dto per le richieste http su /api/tasks
*/

// Create: il titolo è Option perché la sua assenza va segnalata come 400 dal server,
// non come errore di deserializzazione.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// Update (PATCH): o {completed} oppure {title, description?}
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    // None = chiave assente, Some(None) = `"completed": null`
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub completed: Option<Option<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Modifica effettiva da applicare a un compito.
/// Le due forme sono esclusive: `completed` ha la precedenza su `title`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskPatch {
    /// Sovrascrive solo il flag `completed`.
    Completed(bool),
    /// Sovrascrive titolo e descrizione insieme (descrizione null se omessa).
    Content { title: String, description: Option<String> },
    /// Nessun campo riconosciuto: niente scrittura, si rilegge solo la riga.
    Noop,
}

/// La chiave `completed` c'è ma non è un booleano (null).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCompleted;

impl fmt::Display for InvalidCompleted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("completed is present but null")
    }
}

impl std::error::Error for InvalidCompleted {}

impl TryFrom<UpdateTaskRequest> for TaskPatch {
    type Error = InvalidCompleted;

    // basta la presenza della chiave per scegliere il ramo completed
    fn try_from(req: UpdateTaskRequest) -> Result<Self, Self::Error> {
        match (req.completed, req.title) {
            (Some(Some(completed)), _) => Ok(TaskPatch::Completed(completed)),
            (Some(None), _) => Err(InvalidCompleted),
            (None, Some(title)) => Ok(TaskPatch::Content { title, description: req.description }),
            (None, None) => Ok(TaskPatch::Noop),
        }
    }
}

// Chiamata solo se la chiave è presente: distingue null da assente.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<bool>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(Some)
}
