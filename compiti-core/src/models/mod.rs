pub mod task;

// Re-export per comodità
pub use task::Task;
