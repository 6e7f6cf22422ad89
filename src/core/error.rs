use thiserror::Error;

/// Errors raised while building, transmitting or reading fiscal documents.
///
/// Business outcomes (rejections, duplicates, an authority that is offline)
/// are not errors: they end a [`Processing`](super::Processing) sequence
/// early. Only faults that leave the workflow unable to continue land here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EdocError {
    /// The web service answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection, TLS or client configuration failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The signer could not produce a signed document.
    #[error("signing error: {0}")]
    Signing(String),

    /// Structurally invalid XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// Unknown route, state or environment.
    #[error("configuration error: {0}")]
    Config(String),

    /// A value needed to build the request is absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The operation does not exist for this document family or provider.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// gzip or base64 failure on a compressed payload.
    #[error("compression error: {0}")]
    Compression(String),
}
