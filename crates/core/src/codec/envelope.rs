//! Type-tagged envelope for stored proposal content.

use serde_json::{Map, Value};

use crate::error::{CodecError, CodecResult};
use crate::metrics::record_codec_error;

/// Key carrying the type URL in the JSON rendering.
const TYPE_KEY: &str = "@type";

/// Key holding a value that cannot be inlined next to the type URL.
const VALUE_KEY: &str = "value";

/// A serialized value tagged with its type URL.
///
/// A JSON object value is rendered as itself with an extra `"@type"`
/// member, so stored rows stay readable and queryable:
///
/// ```text
/// {"@type": "/cosmos.gov.v1beta1.TextProposal", "title": "...", "description": "..."}
/// ```
///
/// Any other value (string, number, array), an object that already has a
/// `"@type"` member, or an object whose only member is `"value"`, is nested
/// under `"value"` instead:
///
/// ```text
/// {"@type": "/my.chain.v1.Memo", "value": "plain text"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEnvelope {
    pub type_url: String,
    pub value: Vec<u8>,
}

impl ContentEnvelope {
    pub fn new(type_url: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }

    /// Render as a type-tagged JSON object.
    pub fn to_json(&self) -> CodecResult<Value> {
        let body: Value = serde_json::from_slice(&self.value).map_err(|e| {
            record_codec_error("malformed");
            CodecError::Malformed {
                type_url: self.type_url.clone(),
                message: e.to_string(),
            }
        })?;

        let mut tagged = Map::new();
        tagged.insert(TYPE_KEY.to_string(), Value::String(self.type_url.clone()));

        match body {
            Value::Object(fields) if can_inline(&fields) => tagged.extend(fields),
            other => {
                tagged.insert(VALUE_KEY.to_string(), other);
            }
        }
        Ok(Value::Object(tagged))
    }

    /// Parse a type-tagged JSON object produced by [`Self::to_json`].
    pub fn from_json(json: Value) -> CodecResult<Self> {
        let Value::Object(mut fields) = json else {
            return Err(CodecError::InvalidEnvelope(
                "content is not a JSON object".to_string(),
            ));
        };

        let type_url = match fields.remove(TYPE_KEY) {
            Some(Value::String(url)) => url,
            Some(_) => {
                return Err(CodecError::InvalidEnvelope(format!(
                    "{TYPE_KEY} is not a string"
                )));
            }
            None => {
                return Err(CodecError::InvalidEnvelope(format!(
                    "missing {TYPE_KEY} member"
                )));
            }
        };

        let body = match fields.remove(VALUE_KEY) {
            Some(nested) if fields.is_empty() => nested,
            Some(member) => {
                fields.insert(VALUE_KEY.to_string(), member);
                Value::Object(fields)
            }
            None => Value::Object(fields),
        };

        let value = serde_json::to_vec(&body).map_err(|e| {
            CodecError::InvalidEnvelope(format!("cannot re-serialize {type_url}: {e}"))
        })?;

        Ok(Self { type_url, value })
    }
}

/// Whether an object can carry the type tag without ambiguity.
fn can_inline(fields: &Map<String, Value>) -> bool {
    let only_value = fields.len() == 1 && fields.contains_key(VALUE_KEY);
    !fields.contains_key(TYPE_KEY) && !only_value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_rendering_inlines_type_tag() {
        let envelope = ContentEnvelope::new(
            "/cosmos.gov.v1beta1.TextProposal",
            br#"{"title":"t","description":"d"}"#.to_vec(),
        );
        let json = envelope.to_json().unwrap();
        assert_eq!(
            json,
            json!({"@type": "/cosmos.gov.v1beta1.TextProposal", "title": "t", "description": "d"})
        );

        let back = ContentEnvelope::from_json(json).unwrap();
        assert_eq!(back.type_url, envelope.type_url);
        let value: Value = serde_json::from_slice(&back.value).unwrap();
        assert_eq!(value, json!({"title": "t", "description": "d"}));
    }

    // Test critique: un contenu sans "@type" ne peut pas être décodé
    #[test]
    fn missing_type_tag_is_rejected() {
        let err = ContentEnvelope::from_json(json!({"title": "t"})).unwrap_err();
        assert!(matches!(err, CodecError::InvalidEnvelope(_)));
    }

    // Test critique: toute valeur JSON valide passe par l'enveloppe, pas seulement les objets
    #[test]
    fn non_object_value_is_nested() {
        for body in [json!("plain text"), json!([1, 2]), json!(42), json!(null)] {
            let envelope = ContentEnvelope::new("/x.Y", serde_json::to_vec(&body).unwrap());
            let json = envelope.to_json().unwrap();
            assert_eq!(json, json!({"@type": "/x.Y", "value": body}));
            assert_eq!(ContentEnvelope::from_json(json).unwrap(), envelope);
        }
    }

    #[test]
    fn ambiguous_objects_are_nested() {
        let single_value = json!({"value": "x"});
        let tagged = json!({"@type": "inner", "title": "t"});

        for body in [single_value, tagged] {
            let envelope = ContentEnvelope::new("/x.Y", serde_json::to_vec(&body).unwrap());
            let json = envelope.to_json().unwrap();
            assert_eq!(json["value"], body);

            let back = ContentEnvelope::from_json(json).unwrap();
            let value: Value = serde_json::from_slice(&back.value).unwrap();
            assert_eq!(value, body);
        }

        let envelope = ContentEnvelope::new("/x.Y", br#"{"value":1,"other":2}"#.to_vec());
        let json = envelope.to_json().unwrap();
        assert_eq!(json, json!({"@type": "/x.Y", "value": 1, "other": 2}));
        let back = ContentEnvelope::from_json(json).unwrap();
        let value: Value = serde_json::from_slice(&back.value).unwrap();
        assert_eq!(value, json!({"value": 1, "other": 2}));
    }

    #[test]
    fn invalid_bytes_are_malformed() {
        let envelope = ContentEnvelope::new("/x.Y", b"{not json".to_vec());
        assert!(matches!(envelope.to_json(), Err(CodecError::Malformed { .. })));
    }
}
