pub mod ids;
pub mod time;

pub use ids::{new_task_id, new_user_id};
pub use time::now_timestamp;
