//! Contracts for the collaborators an adapter is bound to: the SOAP
//! transport and the XML signer.

use super::error::EdocError;
use super::interpret::interpret;
use super::step::{ProcessingStep, RawResponse};
use super::xml::{Element, FromXml, strip_declaration};

/// Opens clients scoped to one endpoint.
pub trait Transport {
    /// The returned client is released when dropped.
    fn open(&self, url: &str) -> Result<Box<dyn SoapClient + '_>, EdocError>;
}

/// A client bound to one endpoint, able to invoke its operations.
pub trait SoapClient {
    fn invoke(
        &mut self,
        operation: &str,
        payload: &Payload,
        hints: &RoutingHints,
    ) -> Result<RawResponse, EdocError>;
}

/// Signs the element whose `Id` attribute equals `element_id` and returns
/// the whole document with the signature embedded. An empty `element_id`
/// signs the document root.
pub trait Signer {
    fn sign(&self, xml: &str, element_id: &str) -> Result<String, EdocError>;

    /// RSA PKCS#1 v1.5 over SHA-1 of `data`, as some NFS-e providers
    /// require for per-RPS signature strings.
    fn sign_pkcs1_sha1(&self, _data: &[u8]) -> Result<Vec<u8>, EdocError> {
        Err(EdocError::Unsupported("PKCS#1 signatures"))
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn open(&self, url: &str) -> Result<Box<dyn SoapClient + '_>, EdocError> {
        (**self).open(url)
    }
}

impl<S: Signer + ?Sized> Signer for &S {
    fn sign(&self, xml: &str, element_id: &str) -> Result<String, EdocError> {
        (**self).sign(xml, element_id)
    }

    fn sign_pkcs1_sha1(&self, data: &[u8]) -> Result<Vec<u8>, EdocError> {
        (**self).sign_pkcs1_sha1(data)
    }
}

/// Body content handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// An XML document placed inside the message wrapper element.
    Xml(String),
    /// Opaque text, e.g. gzip+base64 of a signed document.
    Text(String),
}

impl Payload {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Xml(s) | Self::Text(s) => s,
        }
    }
}

/// Per-operation details a SOAP transport needs to frame the message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingHints {
    /// WSDL target namespace of the service.
    pub namespace: Option<String>,
    /// Element the payload is wrapped in (`nfeDadosMsg`, `cteDadosMsg`...).
    pub message_element: Option<String>,
    /// IBGE code of the issuing state (`cUF`).
    pub c_uf: Option<u8>,
    /// Layout version of the payload (`versaoDados`).
    pub versao_dados: Option<String>,
    /// Extra header XML some services require (NFS-e `cabecalho`...).
    pub header: Option<String>,
}

impl RoutingHints {
    pub fn new(namespace: impl Into<String>, message_element: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            message_element: Some(message_element.into()),
            ..Self::default()
        }
    }

    pub fn c_uf(mut self, c_uf: u8) -> Self {
        self.c_uf = Some(c_uf);
        self
    }

    pub fn versao_dados(mut self, versao: impl Into<String>) -> Self {
        self.versao_dados = Some(versao.into());
        self
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }
}

/// A request ready for transmission: the tree, the exact transmitted string,
/// and the payload built from it.
#[derive(Debug, Clone)]
pub struct Request {
    pub root: Element,
    pub xml: String,
    pub payload: Payload,
}

impl Request {
    /// Serialize a tree that needs no signature.
    pub fn from_element(root: Element) -> Result<Self, EdocError> {
        let xml = root.to_xml()?;
        Ok(Self {
            payload: Payload::Xml(xml.clone()),
            root,
            xml,
        })
    }

    /// Wrap an already serialized (usually signed) document as-is.
    pub fn from_xml(xml: impl Into<String>) -> Result<Self, EdocError> {
        let xml = xml.into();
        let xml = strip_declaration(&xml).to_string();
        let root = Element::parse(&xml)?;
        Ok(Self {
            payload: Payload::Xml(xml.clone()),
            root,
            xml,
        })
    }

    /// Like [`Request::from_xml`] but transmitted as opaque text.
    pub fn with_text_payload(mut self, text: impl Into<String>) -> Self {
        self.payload = Payload::Text(text.into());
        self
    }
}

/// Open a client for `url`, invoke `operation`, and interpret the answer.
pub fn post<R: FromXml>(
    transport: &(impl Transport + ?Sized),
    url: &str,
    operation: &str,
    request: Request,
    hints: &RoutingHints,
) -> Result<ProcessingStep<R>, EdocError> {
    tracing::debug!(operation, url, "invoking web service");
    let raw = {
        let mut client = transport.open(url)?;
        client.invoke(operation, &request.payload, hints)?
    };
    interpret(operation, request.root, request.xml, raw)
}

/// Sign `xml` by the element id, mapping a missing id to an error.
pub fn sign_element(
    signer: &(impl Signer + ?Sized),
    xml: &str,
    element_id: Option<&str>,
) -> Result<String, EdocError> {
    let id = element_id.ok_or(EdocError::MissingField("Id"))?;
    signer.sign(xml, id)
}
