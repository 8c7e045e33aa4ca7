//! Infrastructure layer - adapters for the outbound ports

pub mod storage;

pub use storage::{InMemoryLockService, InMemoryStationDirectory};
