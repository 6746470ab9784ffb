//! JSON encoding of document trees
//!
//! Components are stored as the JSON form of their `DocumentNode`. The
//! digest of that form identifies a stored revision: equal components
//! always produce equal digests because attribute maps are ordered.

use sha2::{Digest, Sha256};

use crate::errors::Result;
use crate::model::ProductComponent;

use super::document::{DocumentNode, FromDocumentNode, ToDocumentNode};

/// # Errors
///
/// Returns `Serialization` if JSON encoding fails.
pub fn encode_node(node: &DocumentNode) -> Result<String> {
    Ok(serde_json::to_string(node)?)
}

/// # Errors
///
/// Returns `Serialization` if the text is not a JSON document tree.
pub fn decode_node(text: &str) -> Result<DocumentNode> {
    Ok(serde_json::from_str(text)?)
}

/// # Errors
///
/// Returns `Serialization` if JSON encoding fails.
pub fn encode_component(component: &ProductComponent) -> Result<String> {
    encode_node(&component.to_document_node())
}

/// # Errors
///
/// - `Serialization` if the text is not JSON
/// - `InvalidDocument` if the tree is not a product component
pub fn decode_component(text: &str) -> Result<ProductComponent> {
    ProductComponent::from_document_node(&decode_node(text)?)
}

/// Hex SHA256 of an encoded document
pub fn document_digest(encoded: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(encoded.as_bytes());
    hex::encode(hasher.finalize())
}

/// Digest of a component's canonical encoding
///
/// # Errors
///
/// Returns `Serialization` if JSON encoding fails.
pub fn component_digest(component: &ProductComponent) -> Result<String> {
    Ok(document_digest(&encode_component(component)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProdexError;
    use crate::model::{Generation, Link};
    use chrono::NaiveDate;

    fn sample() -> ProductComponent {
        let mut component = ProductComponent::new("motor.Basic", "motor.MotorPolicy");
        let mut generation = Generation::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        generation.add_link(Link::new("Coverage", "motor.Collision"));
        component.add_generation(generation);
        component
    }

    #[test]
    fn test_component_survives_encoding() {
        let component = sample();
        let text = encode_component(&component).unwrap();
        assert_eq!(decode_component(&text).unwrap(), component);
    }

    #[test]
    fn test_digest_is_stable_and_content_sensitive() {
        let a = component_digest(&sample()).unwrap();
        assert_eq!(a, component_digest(&sample()).unwrap());
        assert_eq!(a.len(), 64);

        let mut changed = sample();
        changed.generations[0].links[0].target = "motor.Theft".to_string();
        assert_ne!(a, component_digest(&changed).unwrap());
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            decode_component("not json"),
            Err(ProdexError::Serialization { .. })
        ));
        assert!(matches!(
            decode_component(r#"{"name":"Type"}"#),
            Err(ProdexError::InvalidDocument { .. })
        ));
    }
}
