//! Task state ownership and persistence.
//!
//! `TaskStore` holds the live collection; `TaskStorage` is the load/save
//! contract it writes through.

mod storage;
mod task_store;

pub use storage::{JsonFileStorage, TaskStorage};
pub use task_store::TaskStore;
