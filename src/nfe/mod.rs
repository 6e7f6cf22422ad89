//! NF-e 4.00 (model 55) and NFC-e (model 65) against the SEFAZ web services.
//!
//! [`NFe`] implements [`DocumentAdapter`](crate::core::DocumentAdapter): batch
//! submission with `indSinc=0`, receipt polling by `nRec`, and `nfeProc`
//! assembly. Events, number voiding and DF-e distribution are inherent
//! methods on the same adapter.

/// Target namespace of every NF-e layout.
pub const NAMESPACE: &str = "http://www.portalfiscal.inf.br/nfe";

mod adapter;
mod document;
mod events;
mod routing;
mod schema;

#[cfg(feature = "nfce")]
pub mod nfce;

pub use adapter::*;
pub use document::*;
pub use events::*;
pub use routing::*;
pub use schema::*;
