//! Cosmos SDK support for Gavel.
//!
//! This crate plays the role of the chain's encoding configuration: it
//! provides the typed proposal contents and messages of the standard SDK
//! modules, the decoder registry for those contents, and the address
//! resolvers used to find the accounts involved in a message.
//!
//! # Usage
//!
//! ```ignore
//! use gavel_cosmos::{default_address_dispatcher, make_encoding_config};
//!
//! let encoding = Arc::new(make_encoding_config());
//! let repositories = PgRepositories::new(db, encoding);
//!
//! let dispatcher = default_address_dispatcher();
//! let involved = dispatcher.resolve(&msg)?;
//! ```

pub mod content;
pub mod messages;
pub mod resolvers;

mod encoding;

pub use encoding::{make_encoding_config, register_proposal_contents};
pub use resolvers::{
    cosmos_message_addresses, default_address_dispatcher, missing_staking_message_addresses,
};
