use rust_decimal::Decimal;

use crate::core::{Ambiente, ChaveAcesso, DocumentKey, EdocError, Element, Uf, strip_declaration};

use super::NAMESPACE;
use super::routing::url_qrcode;
use super::schema::{ProtMdfe, VERSAO};

/// Discriminator of MDF-e ids (`MDFe3524...`).
const PREFIXO: &str = "MDFe";

/// An unsigned `MDFe` element.
#[derive(Debug, Clone, PartialEq)]
pub struct MdfeDocument {
    root: Element,
}

impl MdfeDocument {
    pub fn from_element(root: Element) -> Result<Self, EdocError> {
        if root.local_name() != "MDFe" {
            return Err(EdocError::Xml(format!(
                "expected MDFe root, found {}",
                root.name()
            )));
        }
        if root.find("infMDFe").is_none() {
            return Err(EdocError::MissingField("infMDFe"));
        }
        Ok(Self { root })
    }

    pub fn from_xml(xml: &str) -> Result<Self, EdocError> {
        Self::from_element(Element::parse(xml)?)
    }

    pub fn element(&self) -> &Element {
        &self.root
    }

    pub fn id(&self) -> Option<&str> {
        self.root.find("infMDFe")?.attribute("Id")
    }

    /// The four-letter prefix would not survive a three-character split,
    /// so the key is rebuilt from the parsed access key.
    pub fn key(&self) -> Option<DocumentKey> {
        self.chave()
            .map(|c| DocumentKey::new(PREFIXO, c.as_str()))
    }

    pub fn chave(&self) -> Option<ChaveAcesso> {
        ChaveAcesso::parse(self.id()?).ok()
    }

    /// Cargo value `tot/vCarga`.
    pub fn valor_carga(&self) -> Option<Decimal> {
        self.root
            .text_at(&["infMDFe", "tot", "vCarga"])?
            .parse()
            .ok()
    }

    /// Set `infMDFeSupl/qrCodMDFe`, replacing any previous one.
    pub fn set_qrcode(&mut self, qr_code: &str) {
        self.root.remove("infMDFeSupl");
        self.root
            .push(Element::new("infMDFeSupl").text_child("qrCodMDFe", qr_code));
    }

    pub fn to_xml(&self) -> Result<String, EdocError> {
        if self.root.attributes().iter().any(|(k, _)| k == "xmlns") {
            return self.root.to_xml();
        }
        self.root.clone().attr("xmlns", NAMESPACE).to_xml()
    }
}

/// QR code content for a manifest: `{url}?chMDFe={chave}&tpAmb={tpAmb}`.
pub fn qr_code(chave: &ChaveAcesso, uf: Uf, ambiente: Ambiente) -> Result<String, EdocError> {
    let url = url_qrcode(uf, ambiente)?;
    Ok(format!(
        "{url}?chMDFe={}&tpAmb={}",
        chave.as_str(),
        ambiente.tp_amb()
    ))
}

/// Fill the QR code of `document` from its own access key.
pub fn monta_qrcode(
    document: &mut MdfeDocument,
    uf: Uf,
    ambiente: Ambiente,
) -> Result<(), EdocError> {
    let chave = document.chave().ok_or(EdocError::MissingField("infMDFe/@Id"))?;
    let qr = qr_code(&chave, uf, ambiente)?;
    document.set_qrcode(&qr);
    Ok(())
}

/// `mdfeProc` around the signed text and its protocol.
pub fn monta_mdfe_proc(assinado: &str, prot: &ProtMdfe) -> Result<String, EdocError> {
    let prot_xml = prot.element.to_xml()?;
    Element::new("mdfeProc")
        .attr("xmlns", NAMESPACE)
        .attr("versao", VERSAO)
        .to_xml_wrapping(&format!("{}{prot_xml}", strip_declaration(assinado)))
}
