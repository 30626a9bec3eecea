//! External process execution

pub mod bridge;
pub mod subprocess;

pub use bridge::{Bridge, Request};
pub use subprocess::{CommandRunner, SystemRunner};
