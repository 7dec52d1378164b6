//! Request handlers.

pub mod auth_keys;
pub mod generate;
pub mod health;
pub mod tasks;
pub mod webhook;

pub use auth_keys::*;
pub use generate::*;
pub use health::*;
pub use tasks::*;
pub use webhook::*;
