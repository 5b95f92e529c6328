//! Route handlers for the status server

mod system;

pub use system::*;
