//! Blocking SOAP 1.2 transport over `reqwest`, authenticated with the
//! issuer's client certificate.

use std::time::Duration;

use quick_xml::escape::escape;
use tracing::{debug, warn};

use super::error::EdocError;
use super::step::RawResponse;
use super::transport::{Payload, RoutingHints, SoapClient, Transport};

const SOAP12_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Default request timeout; authorities are slow under load.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTPS transport sharing one connection pool across endpoints.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Build from a PEM bundle holding the private key and certificate chain.
    pub fn from_pem(pem: &[u8]) -> Result<Self, EdocError> {
        Self::with_timeout(pem, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(pem: &[u8], timeout: Duration) -> Result<Self, EdocError> {
        let identity = reqwest::Identity::from_pem(pem)
            .map_err(|e| EdocError::Transport(format!("invalid client certificate: {e}")))?;
        let client = reqwest::blocking::Client::builder()
            .identity(identity)
            .timeout(timeout)
            .build()
            .map_err(|e| EdocError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an already configured client, e.g. one with custom roots.
    pub fn from_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn open(&self, url: &str) -> Result<Box<dyn SoapClient + '_>, EdocError> {
        let endpoint = url.split_once('?').map_or(url, |(base, _)| base);
        Ok(Box::new(HttpClient {
            client: &self.client,
            endpoint: endpoint.to_string(),
        }))
    }
}

struct HttpClient<'a> {
    client: &'a reqwest::blocking::Client,
    endpoint: String,
}

impl SoapClient for HttpClient<'_> {
    fn invoke(
        &mut self,
        operation: &str,
        payload: &Payload,
        hints: &RoutingHints,
    ) -> Result<RawResponse, EdocError> {
        let envelope = envelope(operation, payload, hints);
        let namespace = hints.namespace.as_deref().unwrap_or_default();
        let content_type =
            format!("application/soap+xml; charset=utf-8; action=\"{namespace}/{operation}\"");

        debug!(endpoint = %self.endpoint, operation, bytes = envelope.len(), "POST");
        let resp = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(envelope)
            .send()
            .map_err(|e| EdocError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| EdocError::Transport(e.to_string()))?;
        if !(200..300).contains(&status) {
            warn!(endpoint = %self.endpoint, operation, status, "non-success HTTP status");
        }
        Ok(RawResponse::http(status, body))
    }
}

/// SOAP 1.2 envelope with the payload inside the message wrapper element.
pub fn envelope(operation: &str, payload: &Payload, hints: &RoutingHints) -> String {
    let wrapper = hints.message_element.as_deref().unwrap_or(operation);
    let ns_attr = hints
        .namespace
        .as_deref()
        .map(|ns| format!(" xmlns=\"{ns}\""))
        .unwrap_or_default();
    let body = match payload {
        Payload::Xml(xml) => xml.clone(),
        Payload::Text(text) => escape(text.as_str()).into_owned(),
    };
    let header = hints
        .header
        .as_deref()
        .map(|h| format!("<soap12:Header>{h}</soap12:Header>"))
        .unwrap_or_default();
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <soap12:Envelope xmlns:soap12=\"{SOAP12_NS}\">{header}\
         <soap12:Body><{wrapper}{ns_attr}>{body}</{wrapper}></soap12:Body>\
         </soap12:Envelope>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_wraps_xml_payload_verbatim() {
        let hints = RoutingHints::new("urn:svc", "nfeDadosMsg");
        let env = envelope("op", &Payload::Xml("<a b='1'/>".into()), &hints);
        assert!(env.contains(
            "<soap12:Body><nfeDadosMsg xmlns=\"urn:svc\"><a b='1'/></nfeDadosMsg></soap12:Body>"
        ));
        assert!(!env.contains("soap12:Header"));
    }

    #[test]
    fn envelope_escapes_text_and_adds_header() {
        let hints = RoutingHints::default().header("<cabec/>");
        let env = envelope("RecepcionarLoteRps", &Payload::Text("<x>&".into()), &hints);
        assert!(env.contains("<soap12:Header><cabec/></soap12:Header>"));
        assert!(env.contains("<RecepcionarLoteRps>&lt;x&gt;&amp;</RecepcionarLoteRps>"));
    }

    #[test]
    fn bad_certificate_is_a_transport_error() {
        assert!(matches!(
            HttpTransport::from_pem(b"not a pem"),
            Err(EdocError::Transport(_))
        ));
    }
}
