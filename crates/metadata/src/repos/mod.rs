//! Repository traits for metadata operations.

pub mod library;
pub mod shelves;
pub mod tokens;
pub mod users;

pub use library::LibraryRepo;
pub use shelves::ShelfRepo;
pub use tokens::TokenRepo;
pub use users::UserRepo;
