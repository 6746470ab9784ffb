//! Document persistence contract
//!
//! Entities convert to and from `DocumentNode` trees; `codec` turns trees
//! into stored text and digests.

pub mod codec;
pub mod document;

pub use codec::{
    component_digest, decode_component, decode_node, document_digest, encode_component,
    encode_node,
};
pub use document::{DocumentNode, FromDocumentNode, ToDocumentNode};
