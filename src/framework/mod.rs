//! Bounded repetition shared by the waiting transactions.

mod retry;

pub use retry::*;
