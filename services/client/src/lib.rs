pub mod adapters;
pub mod config;
pub mod context;
pub mod error;
pub mod guard;
pub mod stores;

#[cfg(test)]
pub(crate) mod testing;

pub use adapters::{FileTokenStore, HttpApi};
pub use config::Config;
pub use context::AppContext;
pub use error::ClientError;
