use rust_decimal::Decimal;

use crate::core::{ChaveAcesso, DocumentKey, EdocError, Element, strip_declaration};

use super::NAMESPACE;
use super::schema::{ProtNfe, decimal_at};

/// An unsigned `NFe` element ready for submission.
#[derive(Debug, Clone, PartialEq)]
pub struct NfeDocument {
    root: Element,
}

impl NfeDocument {
    /// Wrap an `NFe` element; it must carry `infNFe`.
    pub fn from_element(root: Element) -> Result<Self, EdocError> {
        if root.local_name() != "NFe" {
            return Err(EdocError::Xml(format!(
                "expected NFe root, found {}",
                root.name()
            )));
        }
        if root.find("infNFe").is_none() {
            return Err(EdocError::MissingField("infNFe"));
        }
        Ok(Self { root })
    }

    pub fn from_xml(xml: &str) -> Result<Self, EdocError> {
        Self::from_element(Element::parse(xml)?)
    }

    pub fn element(&self) -> &Element {
        &self.root
    }

    /// `infNFe/@Id`, e.g. `NFe3520...`.
    pub fn id(&self) -> Option<&str> {
        self.root.find("infNFe")?.attribute("Id")
    }

    pub fn key(&self) -> Option<DocumentKey> {
        DocumentKey::from_element_id(self.id()?)
    }

    pub fn chave(&self) -> Option<ChaveAcesso> {
        ChaveAcesso::parse(self.id()?).ok()
    }

    /// `ide/mod`
    pub fn modelo(&self) -> Option<String> {
        self.root.text_at(&["infNFe", "ide", "mod"])
    }

    /// Invoice total `total/ICMSTot/vNF`.
    pub fn valor_total(&self) -> Option<Decimal> {
        decimal_at(&self.root, &["infNFe", "total", "ICMSTot", "vNF"])
    }

    /// Set `infNFeSupl` (NFC-e QR code and query URL), replacing any
    /// previous one.
    pub fn set_suplementar(&mut self, qr_code: &str, url_chave: &str) {
        self.root.remove("infNFeSupl");
        self.root.push(
            Element::new("infNFeSupl")
                .text_child("qrCode", qr_code)
                .text_child("urlChave", url_chave),
        );
    }

    /// Serialize, adding the NF-e namespace when the element lacks one.
    pub fn to_xml(&self) -> Result<String, EdocError> {
        if self.root.attributes().iter().any(|(k, _)| k == "xmlns") {
            return self.root.to_xml();
        }
        self.root.clone().attr("xmlns", NAMESPACE).to_xml()
    }
}

/// Build `nfeProc` from the signed `NFe` text and its authorization protocol.
///
/// The signed text is embedded byte for byte.
pub fn monta_nfe_proc(
    nfe_assinada: &str,
    prot: &ProtNfe,
    versao: &str,
) -> Result<String, EdocError> {
    let prot_xml = prot.element.to_xml()?;
    Element::new("nfeProc")
        .attr("xmlns", NAMESPACE)
        .attr("versao", versao)
        .to_xml_wrapping(&format!("{}{prot_xml}", strip_declaration(nfe_assinada)))
}
