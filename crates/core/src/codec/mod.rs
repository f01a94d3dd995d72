//! Protocol messages and polymorphic proposal content.
//!
//! Proposal content is an open set: chains add their own kinds. Storage
//! never knows the concrete type; it stores a [`ContentEnvelope`] (type URL
//! plus serialized value) and asks a [`ContentRegistry`] built at startup to
//! turn it back into a typed value.
//!
//! # Capabilities
//!
//! - [`TypeUrl`] + `serde::Serialize` make a type a [`ProtocolMessage`]
//!   through a blanket implementation.
//! - [`ProposalContent`] is what governance proposals carry. Content that
//!   cannot expose itself as a [`ProtocolMessage`] cannot be stored.

mod envelope;
mod registry;

pub use envelope::ContentEnvelope;
pub use registry::{ContentRegistry, EncodingConfig, encode_content};

use std::any::Any;
use std::fmt;

use serde::Serialize;

/// Fully-qualified protobuf name of a message, e.g. `/cosmos.gov.v1beta1.TextProposal`.
pub trait TypeUrl {
    const TYPE_URL: &'static str;
}

/// A typed protocol message that can be serialized into an envelope.
pub trait ProtocolMessage: Any + fmt::Debug + Send + Sync {
    /// Type URL identifying the concrete message kind.
    fn type_url(&self) -> &'static str;

    /// Serialize the message body (without the type tag).
    fn encode_value(&self) -> Result<Vec<u8>, serde_json::Error>;

    fn as_any(&self) -> &dyn Any;
}

impl<T> ProtocolMessage for T
where
    T: TypeUrl + Serialize + Any + fmt::Debug + Send + Sync,
{
    fn type_url(&self) -> &'static str {
        T::TYPE_URL
    }

    fn encode_value(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn ProtocolMessage {
    /// Borrow the message as its concrete type, if it is one.
    pub fn downcast_ref<T: ProtocolMessage>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Variant payload of a governance proposal.
pub trait ProposalContent: fmt::Debug + Send + Sync {
    fn title(&self) -> &str;

    fn description(&self) -> &str;

    /// Router key of the module that executes the proposal.
    fn proposal_route(&self) -> &str;

    /// Type tag of the proposal.
    fn proposal_type(&self) -> &str;

    /// Protocol-serializable view of this content.
    ///
    /// Returning `None` makes the content unstorable: encoding fails with
    /// [`crate::error::CodecError::UnsupportedContent`].
    fn as_message(&self) -> Option<&dyn ProtocolMessage>;

    /// Concrete type name, for diagnostics.
    fn kind(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl dyn ProposalContent {
    /// Borrow the content as its concrete type, if it is one.
    pub fn downcast_ref<T: ProtocolMessage>(&self) -> Option<&T> {
        self.as_message().and_then(|msg| msg.downcast_ref::<T>())
    }
}
