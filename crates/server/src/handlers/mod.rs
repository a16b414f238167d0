//! HTTP request handlers.

pub mod common;
pub mod health;
pub mod library;
pub mod shelves;
pub mod users;

pub use health::*;
pub use library::*;
pub use shelves::*;
pub use users::*;
