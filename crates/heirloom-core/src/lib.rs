pub mod config;
pub mod error;
pub mod identity;
pub mod types;

pub use config::HeirloomConfig;
pub use error::{HeirloomError, Result};
pub use identity::{IdentityProvider, StaticIdentityProvider};
pub use types::*;
