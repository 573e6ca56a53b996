#![forbid(unsafe_code)]

pub mod api;
#[cfg(feature = "cli")]
pub mod cli;
pub mod core;
pub mod error;
pub mod owner;
mod paths;
pub mod store;
pub mod telemetry;

pub use error::{Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export the domain types at the crate root for convenience
pub use crate::core::{CanonicalId, ChannelKey, Identity, IdentityMap, MAP_VERSION};
pub use crate::owner::OwnerProfile;
pub use crate::store::{IdentityStore, Resolution, StoreError, StoreOptions};
