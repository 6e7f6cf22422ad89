use crate::core::{DocumentKey, EdocError, Element};

/// Service provider identification shared by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prestador {
    pub cnpj: String,
    pub inscricao_municipal: String,
    /// IBGE code of the municipality.
    pub cidade: u32,
}

impl Prestador {
    pub fn new(
        cnpj: impl Into<String>,
        inscricao_municipal: impl Into<String>,
        cidade: u32,
    ) -> Self {
        Self {
            cnpj: cnpj.into(),
            inscricao_municipal: inscricao_municipal.into(),
            cidade,
        }
    }
}

/// Number, series and type of an RPS, used to look up the NFS-e it became.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentificacaoRps {
    pub numero: String,
    pub serie: String,
    /// ABRASF `Tipo` (`1` = RPS); ignored by Paulistana.
    pub tipo: String,
}

impl IdentificacaoRps {
    pub fn new(numero: impl Into<String>, serie: impl Into<String>) -> Self {
        Self {
            numero: numero.into(),
            serie: serie.into(),
            tipo: "1".into(),
        }
    }
}

const RAIZES: &[&str] = &["EnviarLoteRpsEnvio", "PedidoEnvioLoteRPS"];

/// A batch of RPS ready for submission: an ABRASF `EnviarLoteRpsEnvio`
/// or a Paulistana `PedidoEnvioLoteRPS`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoteRps {
    root: Element,
}

impl LoteRps {
    pub fn from_element(root: Element) -> Result<Self, EdocError> {
        if !RAIZES.contains(&root.local_name()) {
            return Err(EdocError::Xml(format!(
                "expected an RPS batch, found {}",
                root.name()
            )));
        }
        Ok(Self { root })
    }

    pub fn from_xml(xml: &str) -> Result<Self, EdocError> {
        Self::from_element(Element::parse(xml)?)
    }

    pub fn element(&self) -> &Element {
        &self.root
    }

    pub fn element_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// `LoteRps/NumeroLote`; Paulistana batches have none.
    pub fn numero_lote(&self) -> Option<String> {
        self.root.text_at(&["LoteRps", "NumeroLote"])
    }

    pub fn key(&self) -> Option<DocumentKey> {
        self.numero_lote().map(|n| DocumentKey::new("lote", n))
    }

    /// `Id` (or `id`) of every `InfRps`, in document order.
    pub fn rps_ids(&self) -> Vec<String> {
        let Some(lista) = self.root.find_path(&["LoteRps", "ListaRps"]) else {
            return Vec::new();
        };
        lista
            .find_all("Rps")
            .filter_map(|rps| rps.find("InfRps"))
            .filter_map(|inf| inf.attribute("Id").or_else(|| inf.attribute("id")))
            .map(str::to_string)
            .collect()
    }

    /// Number the batch: `LoteRps/@{id_attr} = lote{numero}` and
    /// `LoteRps/NumeroLote = numero`.
    pub fn numera(&mut self, numero: &str, id_attr: &str) -> Result<String, EdocError> {
        let lote = self
            .root
            .find_mut("LoteRps")
            .ok_or(EdocError::MissingField("LoteRps"))?;
        let id = format!("lote{numero}");
        lote.set_attr(id_attr, id.as_str());
        lote.set_child_text("NumeroLote", numero);
        Ok(id)
    }

    pub fn to_xml(&self) -> Result<String, EdocError> {
        self.root.to_xml()
    }
}
