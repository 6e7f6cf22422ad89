//! Family-independent machinery: the element tree, the response interpreter,
//! the processing step, the adapter contract with its workflow driver, and
//! the transport and signing seams.

mod chave;
mod error;
mod interpret;
mod processor;
mod step;
mod transport;
mod types;
mod xml;

#[cfg(any(feature = "nfe", feature = "cte", feature = "mdfe"))]
mod compress;

#[cfg(feature = "http")]
pub mod http;

pub use chave::*;
pub use error::*;
pub use interpret::*;
pub use processor::*;
pub use step::*;
pub use transport::*;
pub use types::*;
pub use xml::*;

#[cfg(any(feature = "nfe", feature = "cte", feature = "mdfe"))]
pub use compress::*;
