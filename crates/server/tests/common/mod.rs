//! Shared helpers for the library store and HTTP integration tests.

pub mod fixtures;
pub mod metadata;
pub mod server;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use metadata::*;
#[allow(unused_imports)]
pub use server::*;
