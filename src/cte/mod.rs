//! CT-e 4.00: freight transport documents (`CTe`, `CTeOS`, `GTVe`).

/// Target namespace of every CT-e layout.
pub const NAMESPACE: &str = "http://www.portalfiscal.inf.br/cte";

mod adapter;
mod document;
mod routing;
mod schema;

pub use adapter::*;
pub use document::*;
pub use routing::*;
pub use schema::*;
