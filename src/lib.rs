//! # nota
//!
//! Transmission of Brazilian fiscal e-documents to the tax authorities:
//! NF-e, NFC-e, CT-e, MDF-e and municipal NFS-e.
//!
//! Every family follows the same submit-and-confirm workflow. An adapter
//! implementing [`DocumentAdapter`] supplies the family's operations and
//! literals; [`Processing`] drives them as a lazy iterator of
//! [`ProcessingStep`]s: service status, duplicate check, signed
//! submission, receipt polling.
//!
//! The crate never opens sockets or touches certificates by itself.
//! Callers supply a [`Transport`] (an HTTPS implementation is behind the
//! `http` feature) and a [`Signer`] that embeds the XML-DSig signature.
//!
//! ## Quick Start
//!
//! ```rust
//! use nota::{Element, RawResponse, interpret};
//! use nota::nfe::RetConsStatServ;
//!
//! let raw = RawResponse::http(
//!     200,
//!     "<soap:Envelope xmlns:soap=\"http://www.w3.org/2003/05/soap-envelope\"><soap:Body>\
//!      <nfeResultMsg><retConsStatServ versao=\"4.00\"><cStat>107</cStat>\
//!      <xMotivo>Servico em Operacao</xMotivo></retConsStatServ></nfeResultMsg>\
//!      </soap:Body></soap:Envelope>",
//! );
//! let step = interpret::<RetConsStatServ>(
//!     "nfeStatusServicoNF",
//!     Element::new("consStatServ"),
//!     "<consStatServ/>".into(),
//!     raw,
//! )
//! .unwrap();
//! assert_eq!(step.response().unwrap().c_stat.as_deref(), Some("107"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Element tree, interpreter, workflow, contracts |
//! | `nfe` (default) | NF-e adapter, SEFAZ routing, events, distribution |
//! | `nfce` (default) | NFC-e QR code and public query URLs |
//! | `cte` (default) | CT-e 4.00 adapter |
//! | `mdfe` (default) | MDF-e 3.00 adapter |
//! | `nfse` (default) | NFS-e over GINFES, ISSNet and Paulistana |
//! | `http` | Blocking `reqwest` SOAP 1.2 transport |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "nfe")]
pub mod nfe;

#[cfg(feature = "cte")]
pub mod cte;

#[cfg(feature = "mdfe")]
pub mod mdfe;

#[cfg(feature = "nfse")]
pub mod nfse;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
