//! MDF-e 3.00: cargo manifests, authorized through SVRS for every state.

/// Target namespace of every MDF-e layout.
pub const NAMESPACE: &str = "http://www.portalfiscal.inf.br/mdfe";

mod adapter;
mod document;
mod routing;
mod schema;

pub use adapter::*;
pub use document::*;
pub use routing::*;
pub use schema::*;
