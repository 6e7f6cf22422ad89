use rust_decimal::Decimal;

use crate::core::{ChaveAcesso, DocumentKey, EdocError, Element, strip_declaration};

use super::NAMESPACE;
use super::routing::CteService;
use super::schema::{ProtCte, VERSAO};

/// Which CT-e layout a document follows, told apart by its root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TipoCte {
    /// `CTe`, model 57.
    Cte,
    /// `CTeOS`, model 67.
    CteOs,
    /// `GTVe`, model 64.
    Gtve,
}

impl TipoCte {
    fn from_root(name: &str) -> Option<Self> {
        match name {
            "CTe" => Some(Self::Cte),
            "CTeOS" => Some(Self::CteOs),
            "GTVe" => Some(Self::Gtve),
            _ => None,
        }
    }

    pub fn root(&self) -> &'static str {
        match self {
            Self::Cte => "CTe",
            Self::CteOs => "CTeOS",
            Self::Gtve => "GTVe",
        }
    }

    /// Archival wrapper element.
    pub fn proc_root(&self) -> &'static str {
        match self {
            Self::Cte => "cteProc",
            Self::CteOs => "cteOSProc",
            Self::Gtve => "GTVeProc",
        }
    }

    pub fn recepcao(&self) -> CteService {
        match self {
            Self::Cte => CteService::RecepcaoSinc,
            Self::CteOs => CteService::RecepcaoOs,
            Self::Gtve => CteService::RecepcaoGtve,
        }
    }
}

/// An unsigned CT-e, CT-e OS or GTV-e.
#[derive(Debug, Clone, PartialEq)]
pub struct CteDocument {
    tipo: TipoCte,
    root: Element,
}

impl CteDocument {
    pub fn from_element(root: Element) -> Result<Self, EdocError> {
        let tipo = TipoCte::from_root(root.local_name()).ok_or_else(|| {
            EdocError::Xml(format!("expected CTe, CTeOS or GTVe, found {}", root.name()))
        })?;
        if root.find("infCte").is_none() {
            return Err(EdocError::MissingField("infCte"));
        }
        Ok(Self { tipo, root })
    }

    pub fn from_xml(xml: &str) -> Result<Self, EdocError> {
        Self::from_element(Element::parse(xml)?)
    }

    pub fn tipo(&self) -> TipoCte {
        self.tipo
    }

    pub fn element(&self) -> &Element {
        &self.root
    }

    /// `infCte/@Id`, e.g. `CTe4324...`.
    pub fn id(&self) -> Option<&str> {
        self.root.find("infCte")?.attribute("Id")
    }

    pub fn key(&self) -> Option<DocumentKey> {
        DocumentKey::from_element_id(self.id()?)
    }

    pub fn chave(&self) -> Option<ChaveAcesso> {
        ChaveAcesso::parse(self.id()?).ok()
    }

    /// Total service value `vPrest/vTPrest`.
    pub fn valor_prestacao(&self) -> Option<Decimal> {
        self.root
            .text_at(&["infCte", "vPrest", "vTPrest"])?
            .parse()
            .ok()
    }

    pub fn to_xml(&self) -> Result<String, EdocError> {
        if self.root.attributes().iter().any(|(k, _)| k == "xmlns") {
            return self.root.to_xml();
        }
        self.root.clone().attr("xmlns", NAMESPACE).to_xml()
    }
}

/// `cteProc` (or its OS/GTV-e twin) around the signed text and protocol.
pub fn monta_cte_proc(tipo: TipoCte, assinado: &str, prot: &ProtCte) -> Result<String, EdocError> {
    let prot_xml = prot.element.to_xml()?;
    Element::new(tipo.proc_root())
        .attr("xmlns", NAMESPACE)
        .attr("versao", VERSAO)
        .to_xml_wrapping(&format!("{}{prot_xml}", strip_declaration(assinado)))
}
