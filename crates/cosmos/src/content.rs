//! Standard Cosmos SDK proposal content kinds.
//!
//! Each kind is registered under its protobuf type URL in
//! [`crate::make_encoding_config`]. Chains with extra kinds register them
//! on top of that configuration.

use serde::{Deserialize, Serialize};

use gavel_core::codec::{ProposalContent, ProtocolMessage, TypeUrl};

/// Implements [`TypeUrl`] and [`ProposalContent`] for a content struct
/// with `title` and `description` fields.
macro_rules! proposal_content {
    ($name:ident, $type_url:literal, route = $route:literal, kind = $kind:literal) => {
        impl TypeUrl for $name {
            const TYPE_URL: &'static str = $type_url;
        }

        impl $name {
            /// Router key of the executing module.
            pub const ROUTE: &'static str = $route;
            /// Proposal type tag.
            pub const KIND: &'static str = $kind;
        }

        impl ProposalContent for $name {
            fn title(&self) -> &str {
                &self.title
            }

            fn description(&self) -> &str {
                &self.description
            }

            fn proposal_route(&self) -> &str {
                Self::ROUTE
            }

            fn proposal_type(&self) -> &str {
                Self::KIND
            }

            fn as_message(&self) -> Option<&dyn ProtocolMessage> {
                Some(self)
            }
        }
    };
}

// =============================================================================
// x/gov
// =============================================================================

/// Signalling proposal with no on-chain effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextProposal {
    pub title: String,
    pub description: String,
}

proposal_content!(
    TextProposal,
    "/cosmos.gov.v1beta1.TextProposal",
    route = "gov",
    kind = "Text"
);

// =============================================================================
// x/params
// =============================================================================

/// A single parameter change. `value` is the raw JSON the chain stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamChange {
    pub subspace: String,
    pub key: String,
    pub value: String,
}

/// Changes module parameters when passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterChangeProposal {
    pub title: String,
    pub description: String,
    pub changes: Vec<ParamChange>,
}

proposal_content!(
    ParameterChangeProposal,
    "/cosmos.params.v1beta1.ParameterChangeProposal",
    route = "params",
    kind = "ParameterChange"
);

// =============================================================================
// x/upgrade
// =============================================================================

/// Upgrade plan scheduled by a software upgrade proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub height: i64,
    #[serde(default)]
    pub info: String,
}

/// Schedules a chain upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareUpgradeProposal {
    pub title: String,
    pub description: String,
    pub plan: Plan,
}

proposal_content!(
    SoftwareUpgradeProposal,
    "/cosmos.upgrade.v1beta1.SoftwareUpgradeProposal",
    route = "upgrade",
    kind = "SoftwareUpgrade"
);

/// Cancels the currently scheduled upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelSoftwareUpgradeProposal {
    pub title: String,
    pub description: String,
}

proposal_content!(
    CancelSoftwareUpgradeProposal,
    "/cosmos.upgrade.v1beta1.CancelSoftwareUpgradeProposal",
    route = "upgrade",
    kind = "CancelSoftwareUpgrade"
);

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gavel_core::error::CodecError;

    use super::*;
    use crate::make_encoding_config;

    fn roundtrip<T>(value: &T) -> Arc<dyn ProposalContent>
    where
        T: ProposalContent,
    {
        let config = make_encoding_config();
        let json = config.marshal_content(value).unwrap();
        config.unmarshal_content(json).unwrap()
    }

    // Test critique: decode(encode(x)) == x pour chaque type de contenu supporté
    #[test]
    fn test_text_proposal_roundtrip() {
        let text = TextProposal {
            title: "Community signal".into(),
            description: "Should we?".into(),
        };
        let decoded = roundtrip(&text);
        assert_eq!(decoded.downcast_ref::<TextProposal>(), Some(&text));
        assert_eq!(decoded.proposal_route(), "gov");
        assert_eq!(decoded.proposal_type(), "Text");
    }

    #[test]
    fn test_parameter_change_roundtrip() {
        let change = ParameterChangeProposal {
            title: "Lower min deposit".into(),
            description: "Make proposals cheaper".into(),
            changes: vec![ParamChange {
                subspace: "gov".into(),
                key: "depositparams".into(),
                value: r#"{"min_deposit":[{"denom":"uatom","amount":"1"}]}"#.into(),
            }],
        };
        let decoded = roundtrip(&change);
        assert_eq!(decoded.downcast_ref::<ParameterChangeProposal>(), Some(&change));
    }

    #[test]
    fn test_upgrade_proposals_roundtrip() {
        let upgrade = SoftwareUpgradeProposal {
            title: "v2".into(),
            description: "Upgrade to v2".into(),
            plan: Plan {
                name: "v2".into(),
                height: 1_000_000,
                info: String::new(),
            },
        };
        let decoded = roundtrip(&upgrade);
        assert_eq!(decoded.downcast_ref::<SoftwareUpgradeProposal>(), Some(&upgrade));

        let cancel = CancelSoftwareUpgradeProposal {
            title: "Cancel v2".into(),
            description: "Not ready".into(),
        };
        let decoded = roundtrip(&cancel);
        assert_eq!(decoded.downcast_ref::<CancelSoftwareUpgradeProposal>(), Some(&cancel));
        assert!(decoded.downcast_ref::<TextProposal>().is_none());
    }

    #[test]
    fn test_stored_json_uses_type_tag() {
        let text = TextProposal {
            title: "t".into(),
            description: "d".into(),
        };
        let json = make_encoding_config().marshal_content(&text).unwrap();
        assert_eq!(json["@type"], "/cosmos.gov.v1beta1.TextProposal");
        assert_eq!(json["title"], "t");
    }

    #[test]
    fn test_unregistered_kind_fails_decode() {
        let json = serde_json::json!({
            "@type": "/cosmos.distribution.v1beta1.CommunityPoolSpendProposal",
            "title": "spend",
            "description": "",
        });
        let err = make_encoding_config().unmarshal_content(json).unwrap_err();
        assert!(matches!(err, CodecError::UnknownType(_)));
    }
}
