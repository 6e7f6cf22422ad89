use serde::{Deserialize, Serialize};

use super::xml::Element;

/// What came back from the transport for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawResponse {
    /// A raw HTTP exchange; the SOAP envelope still has to be unwrapped.
    Http { status: u16, body: String },
    /// A response the transport already decoded to a bare XML string.
    Decoded(Option<String>),
}

impl RawResponse {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    pub fn decoded(body: impl Into<String>) -> Self {
        Self::Decoded(Some(body.into()))
    }

    /// The response text, whichever variant carries it.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Http { body, .. } => Some(body),
            Self::Decoded(body) => body.as_deref(),
        }
    }
}

/// Archival bundle built after a successful workflow (`nfeProc`, `cteProc`...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub xml: String,
    /// Authorization protocol number, when the authority issued one.
    pub protocol: Option<String>,
}

/// One request/response exchange with a fiscal web service.
///
/// `request_xml` is the exact string transmitted; `request_root` is the same
/// request as a tree. `parsed_response` is `None` when the response carried
/// nothing readable.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingStep<R> {
    operation: String,
    request_root: Element,
    request_xml: String,
    raw_response: RawResponse,
    parsed_response: Option<R>,
    processed: Option<ProcessedDocument>,
}

impl<R> ProcessingStep<R> {
    pub fn new(
        operation: impl Into<String>,
        request_root: Element,
        request_xml: impl Into<String>,
        raw_response: RawResponse,
        parsed_response: Option<R>,
    ) -> Self {
        Self {
            operation: operation.into(),
            request_root,
            request_xml: request_xml.into(),
            raw_response,
            parsed_response,
            processed: None,
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn request_root(&self) -> &Element {
        &self.request_root
    }

    pub fn request_xml(&self) -> &str {
        &self.request_xml
    }

    pub fn raw_response(&self) -> &RawResponse {
        &self.raw_response
    }

    pub fn response(&self) -> Option<&R> {
        self.parsed_response.as_ref()
    }

    pub fn into_response(self) -> Option<R> {
        self.parsed_response
    }

    pub fn processed(&self) -> Option<&ProcessedDocument> {
        self.processed.as_ref()
    }

    /// Attach the archival bundle.
    pub fn with_processed(mut self, processed: ProcessedDocument) -> Self {
        self.processed = Some(processed);
        self
    }

    /// Convert the typed response, e.g. into a family-wide response enum.
    pub fn map_response<U>(self, f: impl FnOnce(R) -> U) -> ProcessingStep<U> {
        ProcessingStep {
            operation: self.operation,
            request_root: self.request_root,
            request_xml: self.request_xml,
            raw_response: self.raw_response,
            parsed_response: self.parsed_response.map(f),
            processed: self.processed,
        }
    }
}
