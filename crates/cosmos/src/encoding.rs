//! Default encoding configuration for Cosmos SDK chains.

use gavel_core::codec::{ContentRegistry, EncodingConfig};

use crate::content::{
    CancelSoftwareUpgradeProposal, ParameterChangeProposal, SoftwareUpgradeProposal, TextProposal,
};

/// Register the proposal content kinds of the standard SDK modules.
pub fn register_proposal_contents(registry: &mut ContentRegistry) {
    registry
        .register::<TextProposal>()
        .register::<ParameterChangeProposal>()
        .register::<SoftwareUpgradeProposal>()
        .register::<CancelSoftwareUpgradeProposal>();
}

/// Build the encoding configuration used by the storage layer.
pub fn make_encoding_config() -> EncodingConfig {
    let mut registry = ContentRegistry::new();
    register_proposal_contents(&mut registry);
    EncodingConfig::new(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_core::codec::TypeUrl;

    #[test]
    fn registers_all_standard_kinds() {
        let config = make_encoding_config();
        let registry = config.content_registry();
        assert_eq!(registry.len(), 4);
        assert!(registry.contains(TextProposal::TYPE_URL));
        assert!(registry.contains(ParameterChangeProposal::TYPE_URL));
        assert!(registry.contains(SoftwareUpgradeProposal::TYPE_URL));
        assert!(registry.contains(CancelSoftwareUpgradeProposal::TYPE_URL));
    }
}
