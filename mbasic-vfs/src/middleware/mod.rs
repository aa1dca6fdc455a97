//! Store Middleware System
//!
//! Provides a composable middleware layer around a [`HostStore`](crate::HostStore).

mod builder;
mod layered;
mod middleware;
mod stage;

// Re-export core types
pub use builder::StoreBuilder;
pub use layered::LayeredStore;
pub use middleware::{Middleware, Next};
pub use stage::Stage;

// Re-export built-in middlewares
pub mod logged;
pub mod uppercase;

pub use logged::LoggedLayer;
pub use uppercase::UppercaseLayer;
