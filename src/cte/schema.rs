//! CT-e 4.00 request layouts and tolerant response views.

use chrono::{DateTime, FixedOffset};

use crate::core::{Ambiente, Element, FromXml, format_dh};

use super::NAMESPACE;

pub const VERSAO: &str = "4.00";

// ---- Requests ----

pub fn cons_stat_serv_cte(ambiente: Ambiente, c_uf: u8) -> Element {
    Element::new("consStatServCTe")
        .attr("xmlns", NAMESPACE)
        .attr("versao", VERSAO)
        .text_child("tpAmb", ambiente.tp_amb())
        .text_child("cUF", c_uf.to_string())
        .text_child("xServ", "STATUS")
}

pub fn cons_sit_cte(ambiente: Ambiente, chave: &str) -> Element {
    Element::new("consSitCTe")
        .attr("xmlns", NAMESPACE)
        .attr("versao", VERSAO)
        .text_child("tpAmb", ambiente.tp_amb())
        .text_child("xServ", "CONSULTAR")
        .text_child("chCTe", chave)
}

/// Cancellation event `eventoCTe` (`110111`), unsigned.
pub struct EventoCancelamentoCte<'a> {
    pub chave: &'a str,
    pub c_orgao: u8,
    pub ambiente: Ambiente,
    pub cnpj: &'a str,
    pub protocolo: &'a str,
    pub justificativa: &'a str,
    pub sequencia: u32,
    pub data_hora: DateTime<FixedOffset>,
}

impl EventoCancelamentoCte<'_> {
    pub const TIPO: &'static str = "110111";

    pub fn id(&self) -> String {
        format!("ID{}{}{:02}", Self::TIPO, self.chave, self.sequencia)
    }

    pub fn to_element(&self) -> Element {
        let det = Element::new("detEvento").attr("versaoEvento", VERSAO).child(
            Element::new("evCancCTe")
                .text_child("descEvento", "Cancelamento")
                .text_child("nProt", self.protocolo)
                .text_child("xJust", self.justificativa),
        );
        Element::new("eventoCTe")
            .attr("xmlns", NAMESPACE)
            .attr("versao", VERSAO)
            .child(
                Element::new("infEvento")
                    .attr("Id", self.id())
                    .text_child("cOrgao", self.c_orgao.to_string())
                    .text_child("tpAmb", self.ambiente.tp_amb())
                    .text_child("CNPJ", self.cnpj)
                    .text_child("chCTe", self.chave)
                    .text_child("dhEvento", format_dh(&self.data_hora))
                    .text_child("tpEvento", Self::TIPO)
                    .text_child("nSeqEvento", self.sequencia.to_string())
                    .child(det),
            )
    }
}

// ---- Responses ----

/// `retConsStatServCte`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetConsStatServCte {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub t_med: Option<String>,
    pub dh_recbto: Option<String>,
}

impl FromXml for RetConsStatServCte {
    const ROOT: &'static str = "retConsStatServCte";

    fn from_element(el: &Element) -> Self {
        Self {
            c_stat: el.child_text("cStat"),
            x_motivo: el.child_text("xMotivo"),
            t_med: el.child_text("tMed"),
            dh_recbto: el.child_text("dhRecbto"),
        }
    }
}

/// `protCTe`, kept whole for `cteProc`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtCte {
    pub ch_cte: Option<String>,
    pub n_prot: Option<String>,
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub element: Element,
}

impl FromXml for ProtCte {
    const ROOT: &'static str = "protCTe";

    fn from_element(el: &Element) -> Self {
        Self {
            ch_cte: el.text_at(&["infProt", "chCTe"]),
            n_prot: el.text_at(&["infProt", "nProt"]),
            c_stat: el.text_at(&["infProt", "cStat"]),
            x_motivo: el.text_at(&["infProt", "xMotivo"]),
            element: el.clone(),
        }
    }
}

/// `retConsSitCTe`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetConsSitCte {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub prot_cte: Option<ProtCte>,
}

impl FromXml for RetConsSitCte {
    const ROOT: &'static str = "retConsSitCTe";

    fn from_element(el: &Element) -> Self {
        Self {
            c_stat: el.child_text("cStat"),
            x_motivo: el.child_text("xMotivo"),
            prot_cte: el.find("protCTe").map(ProtCte::from_element),
        }
    }
}

/// `retCTe`, `retCTeOS` or `retGTVe`: the synchronous reception answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetCte {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub prot_cte: Option<ProtCte>,
}

impl FromXml for RetCte {
    const ROOT: &'static str = "retCTe";

    fn from_element(el: &Element) -> Self {
        Self {
            c_stat: el.child_text("cStat"),
            x_motivo: el.child_text("xMotivo"),
            prot_cte: el.find("protCTe").map(ProtCte::from_element),
        }
    }
}

/// `retEventoCTe`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetEventoCte {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub n_prot: Option<String>,
    pub tp_evento: Option<String>,
}

impl FromXml for RetEventoCte {
    const ROOT: &'static str = "retEventoCTe";

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

/// Any response of the CT-e services.
#[derive(Debug, Clone, PartialEq)]
pub enum CteResposta {
    Status(RetConsStatServCte),
    Consulta(RetConsSitCte),
    Envio(RetCte),
    Evento(RetEventoCte),
}

impl CteResposta {
    pub fn c_stat(&self) -> Option<&str> {
        match self {
            Self::Status(r) => r.c_stat.as_deref(),
            Self::Consulta(r) => r.c_stat.as_deref(),
            Self::Envio(r) => r.c_stat.as_deref(),
            Self::Evento(r) => r.c_stat.as_deref(),
        }
    }

    pub fn x_motivo(&self) -> Option<&str> {
        match self {
            Self::Status(r) => r.x_motivo.as_deref(),
            Self::Consulta(r) => r.x_motivo.as_deref(),
            Self::Envio(r) => r.x_motivo.as_deref(),
            Self::Evento(r) => r.x_motivo.as_deref(),
        }
    }

    /// Authorization protocol carried by a submission or query answer.
    pub fn protocolo(&self) -> Option<&ProtCte> {
        match self {
            Self::Consulta(r) => r.prot_cte.as_ref(),
            Self::Envio(r) => r.prot_cte.as_ref(),
            _ => None,
        }
    }
}
