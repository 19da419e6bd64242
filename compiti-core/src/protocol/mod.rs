pub mod http;

// Re-export comodi
pub use http::{CreateTaskRequest, InvalidCompleted, TaskPatch, UpdateTaskRequest};
