//! NFS-e: municipal service invoices, sent through the provider that
//! serves the issuer's city.
//!
//! | Provider | Layout | Cities |
//! |----------|--------|--------|
//! | [`Ginfes`] | ABRASF v3 | Itajubá, Franca |
//! | [`Issnet`] | ABRASF 1.00 | Ribeirão Preto, Duque de Caxias |
//! | [`Paulistana`] | own, synchronous | São Paulo |
//! | [`Barueri`] | own, batch file in CDATA | Barueri |
//!
//! DSF cities are listed, but only their RPS key ([`ChaveNfseDsf`]) is
//! implemented.
//!
//! Query and cancellation answers are judged against the issuer's records
//! by [`NfseResposta::resultado_consulta`] and
//! [`NfseResposta::resultado_cancelamento`].

mod adapter;
mod barueri;
mod cidades;
mod document;
mod dsf;
mod ginfes;
mod issnet;
mod paulistana;
mod provedor;
mod resultado;
mod schema;

pub use adapter::*;
pub use barueri::Barueri;
pub use cidades::*;
pub use document::*;
pub use dsf::*;
pub use ginfes::*;
pub use issnet::*;
pub use paulistana::{Paulistana, texto_assinatura_cancelamento};
pub use provedor::*;
pub use resultado::*;
pub use schema::*;
