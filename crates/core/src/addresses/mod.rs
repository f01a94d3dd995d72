//! Resolution of the accounts involved in a protocol message.
//!
//! An [`AddressDispatcher`] holds an ordered chain of [`AddressResolver`]s:
//! chain-specific resolvers first, a generic catch-all last. The first
//! resolver that recognises the message wins. Supporting a new message kind
//! means adding a resolver in front, never editing the generic one.

use std::fmt;
use std::iter;
use std::sync::Arc;

use crate::codec::ProtocolMessage;
use crate::error::ResolveError;

/// Extracts the addresses involved in a message, or declines it.
pub trait AddressResolver: Send + Sync {
    /// `Some(addresses)` if the message kind is recognised, `None` to let
    /// the next resolver try.
    fn resolve(&self, message: &dyn ProtocolMessage) -> Option<Vec<String>>;
}

impl<F> AddressResolver for F
where
    F: Fn(&dyn ProtocolMessage) -> Option<Vec<String>> + Send + Sync,
{
    fn resolve(&self, message: &dyn ProtocolMessage) -> Option<Vec<String>> {
        self(message)
    }
}

/// Ordered resolver chain with a mandatory fallback.
#[derive(Clone)]
pub struct AddressDispatcher {
    resolvers: Vec<Arc<dyn AddressResolver>>,
    fallback: Arc<dyn AddressResolver>,
}

impl AddressDispatcher {
    /// Create a dispatcher whose last resort is `fallback`.
    pub fn new(fallback: impl AddressResolver + 'static) -> Self {
        Self {
            resolvers: Vec::new(),
            fallback: Arc::new(fallback),
        }
    }

    /// Add a resolver tried after those already added and before the fallback.
    pub fn with_resolver(mut self, resolver: impl AddressResolver + 'static) -> Self {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    /// Number of resolvers, fallback included.
    pub fn len(&self) -> usize {
        self.resolvers.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Return the addresses involved in `message`.
    pub fn resolve(&self, message: &dyn ProtocolMessage) -> Result<Vec<String>, ResolveError> {
        self.resolvers
            .iter()
            .chain(iter::once(&self.fallback))
            .find_map(|resolver| resolver.resolve(message))
            .ok_or_else(|| ResolveError::MessageNotSupported {
                kind: message.type_url().to_string(),
            })
    }
}

// A dispatcher can itself sit inside another chain.
impl AddressResolver for AddressDispatcher {
    fn resolve(&self, message: &dyn ProtocolMessage) -> Option<Vec<String>> {
        AddressDispatcher::resolve(self, message).ok()
    }
}

impl fmt::Debug for AddressDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressDispatcher")
            .field("resolvers", &self.len())
            .finish()
    }
}
