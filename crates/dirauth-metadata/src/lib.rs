//! Identity store for dirauth
//!
//! The model layer the user provider queries: a `UserStore` seam with SQLite
//! and in-memory backends, plus the registry that maps configured model names
//! to model descriptors.

pub mod memory;
pub mod model;
pub mod repository;
pub mod traits;

pub use memory::MemoryUserStore;
pub use model::{ModelFactory, ModelRegistry, UserModel, UserQuery};
pub use repository::SqliteUserStore;
pub use traits::*;
