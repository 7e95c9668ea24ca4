pub mod actors;
pub mod config;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod log;
pub mod store;
pub mod transport;
pub mod util;

pub use error::{Error, Result};
