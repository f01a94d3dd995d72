//! Decoder registry for proposal content.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::{CodecError, CodecResult};
use crate::metrics::record_codec_error;

use super::{ContentEnvelope, ProposalContent, TypeUrl};

type DecodeFn = fn(&[u8]) -> Result<Arc<dyn ProposalContent>, serde_json::Error>;

fn decode_as<T>(bytes: &[u8]) -> Result<Arc<dyn ProposalContent>, serde_json::Error>
where
    T: ProposalContent + DeserializeOwned + 'static,
{
    let content: T = serde_json::from_slice(bytes)?;
    Ok(Arc::new(content))
}

/// Wrap proposal content into a type-tagged envelope.
///
/// Does not consult any registry: new content kinds can be stored as soon
/// as they implement [`super::ProtocolMessage`].
pub fn encode_content(content: &dyn ProposalContent) -> CodecResult<ContentEnvelope> {
    let message = content.as_message().ok_or_else(|| {
        record_codec_error("unsupported_content");
        CodecError::UnsupportedContent {
            kind: content.kind().to_string(),
        }
    })?;

    let value = message.encode_value().map_err(|e| {
        record_codec_error("encode");
        CodecError::Encode {
            type_url: message.type_url().to_string(),
            message: e.to_string(),
        }
    })?;

    Ok(ContentEnvelope::new(message.type_url(), value))
}

/// Maps type URLs to content decoders.
///
/// Populated once at startup, read-only afterwards.
#[derive(Default, Clone)]
pub struct ContentRegistry {
    decoders: HashMap<&'static str, DecodeFn>,
}

impl ContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` as the decoder for `T::TYPE_URL`.
    ///
    /// Registering the same URL twice keeps the last registration.
    pub fn register<T>(&mut self) -> &mut Self
    where
        T: ProposalContent + TypeUrl + DeserializeOwned + 'static,
    {
        self.decoders.insert(T::TYPE_URL, decode_as::<T>);
        self
    }

    /// Check if a type URL has a registered decoder.
    pub fn contains(&self, type_url: &str) -> bool {
        self.decoders.contains_key(type_url)
    }

    /// List registered type URLs, sorted.
    pub fn type_urls(&self) -> Vec<&'static str> {
        let mut urls: Vec<_> = self.decoders.keys().copied().collect();
        urls.sort_unstable();
        urls
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Decode an envelope into typed content.
    pub fn decode(&self, envelope: &ContentEnvelope) -> CodecResult<Arc<dyn ProposalContent>> {
        let decode = self
            .decoders
            .get(envelope.type_url.as_str())
            .ok_or_else(|| {
                record_codec_error("unknown_type");
                CodecError::UnknownType(envelope.type_url.clone())
            })?;

        decode(&envelope.value).map_err(|e| {
            record_codec_error("malformed");
            CodecError::Malformed {
                type_url: envelope.type_url.clone(),
                message: e.to_string(),
            }
        })
    }
}

impl fmt::Debug for ContentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentRegistry")
            .field("type_urls", &self.type_urls())
            .finish()
    }
}

/// Encoding configuration shared by every component that touches content.
///
/// Built explicitly at startup and handed to repositories at construction;
/// there is no process-wide codec state.
#[derive(Debug, Clone, Default)]
pub struct EncodingConfig {
    content: ContentRegistry,
}

impl EncodingConfig {
    pub fn new(content: ContentRegistry) -> Self {
        Self { content }
    }

    pub fn content_registry(&self) -> &ContentRegistry {
        &self.content
    }

    /// Encode content and render the envelope as stored JSON.
    pub fn marshal_content(&self, content: &dyn ProposalContent) -> CodecResult<serde_json::Value> {
        encode_content(content)?.to_json()
    }

    /// Parse stored JSON back into typed content.
    pub fn unmarshal_content(
        &self,
        json: serde_json::Value,
    ) -> CodecResult<Arc<dyn ProposalContent>> {
        let envelope = ContentEnvelope::from_json(json)?;
        self.content.decode(&envelope)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::codec::ProtocolMessage;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Memo {
        title: String,
        description: String,
        tag: u32,
    }

    impl TypeUrl for Memo {
        const TYPE_URL: &'static str = "/test.v1.Memo";
    }

    impl ProposalContent for Memo {
        fn title(&self) -> &str {
            &self.title
        }
        fn description(&self) -> &str {
            &self.description
        }
        fn proposal_route(&self) -> &str {
            "test"
        }
        fn proposal_type(&self) -> &str {
            "Memo"
        }
        fn as_message(&self) -> Option<&dyn ProtocolMessage> {
            Some(self)
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Wrapped(String);

    impl TypeUrl for Wrapped {
        const TYPE_URL: &'static str = "/test.v1.Wrapped";
    }

    impl ProposalContent for Wrapped {
        fn title(&self) -> &str {
            &self.0
        }
        fn description(&self) -> &str {
            ""
        }
        fn proposal_route(&self) -> &str {
            "test"
        }
        fn proposal_type(&self) -> &str {
            "Wrapped"
        }
        fn as_message(&self) -> Option<&dyn ProtocolMessage> {
            Some(self)
        }
    }

    #[derive(Debug)]
    struct Opaque;

    impl ProposalContent for Opaque {
        fn title(&self) -> &str {
            "opaque"
        }
        fn description(&self) -> &str {
            ""
        }
        fn proposal_route(&self) -> &str {
            "test"
        }
        fn proposal_type(&self) -> &str {
            "Opaque"
        }
        fn as_message(&self) -> Option<&dyn ProtocolMessage> {
            None
        }
    }

    fn memo() -> Memo {
        Memo {
            title: "Raise the bar".into(),
            description: "Increase the threshold".into(),
            tag: 7,
        }
    }

    fn config() -> EncodingConfig {
        let mut registry = ContentRegistry::new();
        registry.register::<Memo>().register::<Wrapped>();
        EncodingConfig::new(registry)
    }

    // Test critique: decode(encode(x)) == x
    #[test]
    fn test_roundtrip_through_json() {
        let config = config();
        let json = config.marshal_content(&memo()).unwrap();
        assert_eq!(json["@type"], "/test.v1.Memo");

        let decoded = config.unmarshal_content(json).unwrap();
        assert_eq!(decoded.downcast_ref::<Memo>(), Some(&memo()));
        assert_eq!(decoded.title(), "Raise the bar");
    }

    // Test critique: un contenu qui n'est pas un objet JSON fait aussi l'aller-retour
    #[test]
    fn test_newtype_content_roundtrip() {
        let config = config();
        let content = Wrapped("x".into());

        let json = config.marshal_content(&content).unwrap();
        assert_eq!(json, serde_json::json!({"@type": "/test.v1.Wrapped", "value": "x"}));

        let decoded = config.unmarshal_content(json).unwrap();
        assert_eq!(decoded.downcast_ref::<Wrapped>(), Some(&content));
        assert_eq!(decoded.title(), "x");
    }

    // Test critique: un contenu non sérialisable n'est jamais ignoré silencieusement
    #[test]
    fn test_unsupported_content_is_an_error() {
        let err = encode_content(&Opaque).unwrap_err();
        match err {
            CodecError::UnsupportedContent { kind } => assert!(kind.ends_with("Opaque")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_type_url() {
        let envelope = ContentEnvelope::new("/test.v1.Unknown", b"{}".to_vec());
        let err = config().content_registry().decode(&envelope).unwrap_err();
        assert!(matches!(err, CodecError::UnknownType(url) if url == "/test.v1.Unknown"));
    }

    #[test]
    fn test_malformed_bytes() {
        let envelope = ContentEnvelope::new("/test.v1.Memo", br#"{"title": 1}"#.to_vec());
        let err = config().content_registry().decode(&envelope).unwrap_err();
        assert!(matches!(err, CodecError::Malformed { .. }));
    }

    #[test]
    fn test_encoding_does_not_need_registration() {
        let envelope = encode_content(&memo()).unwrap();
        assert_eq!(envelope.type_url, "/test.v1.Memo");
        assert!(ContentRegistry::new().decode(&envelope).is_err());
    }
}
