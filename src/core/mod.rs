//! Core domain types for the identity map
//!
//! Module hierarchy follows type dependency order:
//! - time: timestamp format + compat parsing
//! - identity: CanonicalId, ChannelKey
//! - map: Identity, IdentityMap (the persisted document)
//!
//! Pure data and validation; file access lives in [`crate::store`].

pub mod error;
pub mod identity;
pub mod map;
pub mod time;

pub use error::{CoreError, InvalidId, MissingArgument};
pub use identity::{CanonicalId, ChannelKey, MAX_CANONICAL_LEN};
pub use map::{Identity, IdentityMap, MAP_VERSION};
