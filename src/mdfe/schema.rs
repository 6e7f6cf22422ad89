//! MDF-e 3.00 request layouts and tolerant response views.

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::core::{Ambiente, Element, FromXml, format_dh};

use super::NAMESPACE;

pub const VERSAO: &str = "3.00";

// ---- Requests ----

pub fn cons_stat_serv_mdfe(ambiente: Ambiente) -> Element {
    Element::new("consStatServMDFe")
        .attr("xmlns", NAMESPACE)
        .attr("versao", VERSAO)
        .text_child("tpAmb", ambiente.tp_amb())
        .text_child("xServ", "STATUS")
}

pub fn cons_sit_mdfe(ambiente: Ambiente, chave: &str) -> Element {
    Element::new("consSitMDFe")
        .attr("xmlns", NAMESPACE)
        .attr("versao", VERSAO)
        .text_child("tpAmb", ambiente.tp_amb())
        .text_child("xServ", "CONSULTAR")
        .text_child("chMDFe", chave)
}

pub fn cons_mdfe_nao_enc(ambiente: Ambiente, cnpj: &str) -> Element {
    Element::new("consMDFeNaoEnc")
        .attr("xmlns", NAMESPACE)
        .attr("versao", VERSAO)
        .text_child("tpAmb", ambiente.tp_amb())
        .text_child("xServ", "CONSULTAR NÃO ENCERRADOS")
        .text_child("CNPJ", cnpj)
}

/// Event body placed inside `detEvento`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetalheEventoMdfe {
    /// `110111`
    Cancelamento { protocolo: String, justificativa: String },
    /// `110112`: the trip ended in `municipio` (IBGE code) of `c_uf`.
    Encerramento {
        protocolo: String,
        data: NaiveDate,
        c_uf: u8,
        municipio: String,
    },
}

impl DetalheEventoMdfe {
    pub fn tipo(&self) -> &'static str {
        match self {
            Self::Cancelamento { .. } => "110111",
            Self::Encerramento { .. } => "110112",
        }
    }

    fn to_element(&self) -> Element {
        match self {
            Self::Cancelamento {
                protocolo,
                justificativa,
            } => Element::new("evCancMDFe")
                .text_child("descEvento", "Cancelamento")
                .text_child("nProt", protocolo.as_str())
                .text_child("xJust", justificativa.as_str()),
            Self::Encerramento {
                protocolo,
                data,
                c_uf,
                municipio,
            } => Element::new("evEncMDFe")
                .text_child("descEvento", "Encerramento")
                .text_child("nProt", protocolo.as_str())
                .text_child("dtEnc", data.format("%Y-%m-%d").to_string())
                .text_child("cUF", c_uf.to_string())
                .text_child("cMun", municipio.as_str()),
        }
    }
}

/// `eventoMDFe`, unsigned.
#[derive(Debug, Clone, PartialEq)]
pub struct EventoMdfe<'a> {
    pub chave: &'a str,
    pub c_orgao: u8,
    pub ambiente: Ambiente,
    pub cnpj: &'a str,
    pub sequencia: u32,
    pub data_hora: DateTime<FixedOffset>,
    pub detalhe: DetalheEventoMdfe,
}

impl EventoMdfe<'_> {
    pub fn id(&self) -> String {
        format!("ID{}{}{:03}", self.detalhe.tipo(), self.chave, self.sequencia)
    }

    pub fn to_element(&self) -> Element {
        Element::new("eventoMDFe")
            .attr("xmlns", NAMESPACE)
            .attr("versao", VERSAO)
            .child(
                Element::new("infEvento")
                    .attr("Id", self.id())
                    .text_child("cOrgao", self.c_orgao.to_string())
                    .text_child("tpAmb", self.ambiente.tp_amb())
                    .text_child("CNPJ", self.cnpj)
                    .text_child("chMDFe", self.chave)
                    .text_child("dhEvento", format_dh(&self.data_hora))
                    .text_child("tpEvento", self.detalhe.tipo())
                    .text_child("nSeqEvento", self.sequencia.to_string())
                    .child(
                        Element::new("detEvento")
                            .attr("versaoEvento", VERSAO)
                            .child(self.detalhe.to_element()),
                    ),
            )
    }
}

// ---- Responses ----

/// `retConsStatServMDFe`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetConsStatServMdfe {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub t_med: Option<String>,
}

impl FromXml for RetConsStatServMdfe {
    const ROOT: &'static str = "retConsStatServMDFe";

    fn from_element(el: &Element) -> Self {
        Self {
            c_stat: el.child_text("cStat"),
            x_motivo: el.child_text("xMotivo"),
            t_med: el.child_text("tMed"),
        }
    }
}

/// `protMDFe`, kept whole for `mdfeProc`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtMdfe {
    pub ch_mdfe: Option<String>,
    pub n_prot: Option<String>,
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub element: Element,
}

impl FromXml for ProtMdfe {
    const ROOT: &'static str = "protMDFe";

    fn from_element(el: &Element) -> Self {
        Self {
            ch_mdfe: el.text_at(&["infProt", "chMDFe"]),
            n_prot: el.text_at(&["infProt", "nProt"]),
            c_stat: el.text_at(&["infProt", "cStat"]),
            x_motivo: el.text_at(&["infProt", "xMotivo"]),
            element: el.clone(),
        }
    }
}

/// `retConsSitMDFe`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetConsSitMdfe {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub prot_mdfe: Option<ProtMdfe>,
    /// `tpEvento` of every registered event.
    pub eventos: Vec<String>,
}

impl FromXml for RetConsSitMdfe {
    const ROOT: &'static str = "retConsSitMDFe";

    fn from_element(el: &Element) -> Self {
        Self {
            c_stat: el.child_text("cStat"),
            x_motivo: el.child_text("xMotivo"),
            prot_mdfe: el.find("protMDFe").map(ProtMdfe::from_element),
            eventos: el
                .find_all("procEventoMDFe")
                .filter_map(|p| p.text_at(&["eventoMDFe", "infEvento", "tpEvento"]))
                .collect(),
        }
    }
}

/// `retMDFe`, the synchronous reception answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetMdfe {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub prot_mdfe: Option<ProtMdfe>,
}

impl FromXml for RetMdfe {
    const ROOT: &'static str = "retMDFe";

    fn from_element(el: &Element) -> Self {
        Self {
            c_stat: el.child_text("cStat"),
            x_motivo: el.child_text("xMotivo"),
            prot_mdfe: el.find("protMDFe").map(ProtMdfe::from_element),
        }
    }
}

/// `retEventoMDFe`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetEventoMdfe {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub n_prot: Option<String>,
    pub tp_evento: Option<String>,
}

impl FromXml for RetEventoMdfe {
    const ROOT: &'static str = "retEventoMDFe";

    fn from_element(el: &Element) -> Self {
        let inf = el.find("infEvento").unwrap_or(el);
        Self {
            c_stat: inf.child_text("cStat"),
            x_motivo: inf.child_text("xMotivo"),
            n_prot: inf.child_text("nProt"),
            tp_evento: inf.child_text("tpEvento"),
        }
    }
}

/// An open manifest listed by `retConsMDFeNaoEnc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdfeNaoEncerrado {
    pub chave: String,
    pub protocolo: Option<String>,
}

/// `retConsMDFeNaoEnc`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetConsMdfeNaoEnc {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub abertos: Vec<MdfeNaoEncerrado>,
}

impl FromXml for RetConsMdfeNaoEnc {
    const ROOT: &'static str = "retConsMDFeNaoEnc";

    fn from_element(el: &Element) -> Self {
        Self {
            c_stat: el.child_text("cStat"),
            x_motivo: el.child_text("xMotivo"),
            abertos: el
                .find_all("infMDFe")
                .filter_map(|inf| {
                    Some(MdfeNaoEncerrado {
                        chave: inf.child_text("chMDFe")?,
                        protocolo: inf.child_text("nProt"),
                    })
                })
                .collect(),
        }
    }
}

/// Any response of the MDF-e services.
#[derive(Debug, Clone, PartialEq)]
pub enum MdfeResposta {
    Status(RetConsStatServMdfe),
    Consulta(RetConsSitMdfe),
    NaoEncerrados(RetConsMdfeNaoEnc),
    Envio(RetMdfe),
    Evento(RetEventoMdfe),
}

impl MdfeResposta {
    pub fn c_stat(&self) -> Option<&str> {
        match self {
            Self::Status(r) => r.c_stat.as_deref(),
            Self::Consulta(r) => r.c_stat.as_deref(),
            Self::NaoEncerrados(r) => r.c_stat.as_deref(),
            Self::Envio(r) => r.c_stat.as_deref(),
            Self::Evento(r) => r.c_stat.as_deref(),
        }
    }

    pub fn x_motivo(&self) -> Option<&str> {
        match self {
            Self::Status(r) => r.x_motivo.as_deref(),
            Self::Consulta(r) => r.x_motivo.as_deref(),
            Self::NaoEncerrados(r) => r.x_motivo.as_deref(),
            Self::Envio(r) => r.x_motivo.as_deref(),
            Self::Evento(r) => r.x_motivo.as_deref(),
        }
    }

    pub fn protocolo(&self) -> Option<&ProtMdfe> {
        match self {
            Self::Consulta(r) => r.prot_mdfe.as_ref(),
            Self::Envio(r) => r.prot_mdfe.as_ref(),
            _ => None,
        }
    }
}
