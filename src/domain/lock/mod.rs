pub mod model;

pub use model::{Lock, LockScope};
