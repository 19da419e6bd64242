//! compiti-core: tipi condivisi tra server e front end (modello Task, DTO HTTP, corpo degli errori).
//! Niente I/O: solo serde e qualche helper per id e timestamp.

pub mod models;
pub mod protocol;
pub mod error;
pub mod utils;

// Re-export utili per ridurre i percorsi nel crate server
pub use error::ErrorBody;
pub use models::task::Task;
pub use protocol::http::{CreateTaskRequest, InvalidCompleted, TaskPatch, UpdateTaskRequest};
pub use utils::{new_task_id, new_user_id, now_timestamp};
