//! In-memory implementations of the outbound ports

mod memory;

pub use memory::{InMemoryLockService, InMemoryStationDirectory};
