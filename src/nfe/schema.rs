//! NF-e 4.00 request layouts and tolerant response views.

use rust_decimal::Decimal;

use crate::core::{Ambiente, EdocError, Element, FromXml, decompress};

use super::NAMESPACE;

pub const VERSAO: &str = "4.00";
pub const VERSAO_EVENTO: &str = "1.00";
pub const VERSAO_DISTRIBUICAO: &str = "1.01";

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub fn cons_stat_serv(versao: &str, ambiente: Ambiente, c_uf: u8) -> Element {
    Element::new("consStatServ")
        .attr("xmlns", NAMESPACE)
        .attr("versao", versao)
        .text_child("tpAmb", ambiente.tp_amb())
        .text_child("cUF", c_uf.to_string())
        .text_child("xServ", "STATUS")
}

pub fn cons_sit_nfe(versao: &str, ambiente: Ambiente, chave: &str) -> Element {
    Element::new("consSitNFe")
        .attr("xmlns", NAMESPACE)
        .attr("versao", versao)
        .text_child("tpAmb", ambiente.tp_amb())
        .text_child("xServ", "CONSULTAR")
        .text_child("chNFe", chave)
}

/// Batch header; the signed `NFe` is spliced in after it.
pub fn envi_nfe(versao: &str, id_lote: &str) -> Element {
    Element::new("enviNFe")
        .attr("xmlns", NAMESPACE)
        .attr("versao", versao)
        .text_child("idLote", id_lote)
        .text_child("indSinc", "0")
}

pub fn cons_reci_nfe(versao: &str, ambiente: Ambiente, n_rec: &str) -> Element {
    Element::new("consReciNFe")
        .attr("xmlns", NAMESPACE)
        .attr("versao", versao)
        .text_child("tpAmb", ambiente.tp_amb())
        .text_child("nRec", n_rec)
}

/// Event batch header; signed `evento` elements are spliced in after it.
pub fn env_evento(id_lote: &str) -> Element {
    Element::new("envEvento")
        .attr("xmlns", NAMESPACE)
        .attr("versao", VERSAO_EVENTO)
        .text_child("idLote", id_lote)
}

/// `CNPJ` for 14-digit documents, `CPF` otherwise.
pub(crate) fn cnpj_or_cpf(doc: &str) -> (&'static str, &str) {
    if doc.len() > 11 { ("CNPJ", doc) } else { ("CPF", doc) }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// `retConsStatServ`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetConsStatServ {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub c_uf: Option<String>,
    pub dh_recbto: Option<String>,
    /// Average processing time in seconds.
    pub t_med: Option<String>,
    pub dh_retorno: Option<String>,
    pub x_obs: Option<String>,
}

impl FromXml for RetConsStatServ {
    const ROOT: &'static str = "retConsStatServ";

    fn from_element(el: &Element) -> Self {
        Self {
            c_stat: el.child_text("cStat"),
            x_motivo: el.child_text("xMotivo"),
            c_uf: el.child_text("cUF"),
            dh_recbto: el.child_text("dhRecbto"),
            t_med: el.child_text("tMed"),
            dh_retorno: el.child_text("dhRetorno"),
            x_obs: el.child_text("xObs"),
        }
    }
}

/// `protNFe`, kept whole so it can be embedded in `nfeProc`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtNfe {
    pub ch_nfe: Option<String>,
    pub n_prot: Option<String>,
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub dh_recbto: Option<String>,
    pub element: Element,
}

impl FromXml for ProtNfe {
    const ROOT: &'static str = "protNFe";

    fn from_element(el: &Element) -> Self {
        Self {
            ch_nfe: el.text_at(&["infProt", "chNFe"]),
            n_prot: el.text_at(&["infProt", "nProt"]),
            c_stat: el.text_at(&["infProt", "cStat"]),
            x_motivo: el.text_at(&["infProt", "xMotivo"]),
            dh_recbto: el.text_at(&["infProt", "dhRecbto"]),
            element: el.clone(),
        }
    }
}

/// `retConsSitNFe`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetConsSitNfe {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub ch_nfe: Option<String>,
    pub prot_nfe: Option<ProtNfe>,
    pub eventos: Vec<RetEvento>,
}

impl FromXml for RetConsSitNfe {
    const ROOT: &'static str = "retConsSitNFe";

    fn from_element(el: &Element) -> Self {
        Self {
            c_stat: el.child_text("cStat"),
            x_motivo: el.child_text("xMotivo"),
            ch_nfe: el.child_text("chNFe"),
            prot_nfe: el.find("protNFe").map(ProtNfe::from_element),
            eventos: el
                .find_all("procEventoNFe")
                .filter_map(|p| p.find("retEvento"))
                .map(RetEvento::from_element)
                .collect(),
        }
    }
}

/// `infRec` of a batch submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfRec {
    pub n_rec: Option<String>,
    pub t_med: Option<String>,
}

/// `retEnviNFe`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetEnviNfe {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub dh_recbto: Option<String>,
    pub inf_rec: Option<InfRec>,
    /// Present on synchronous authorization.
    pub prot_nfe: Option<ProtNfe>,
}

impl FromXml for RetEnviNfe {
    const ROOT: &'static str = "retEnviNFe";

    fn from_element(el: &Element) -> Self {
        Self {
            c_stat: el.child_text("cStat"),
            x_motivo: el.child_text("xMotivo"),
            dh_recbto: el.child_text("dhRecbto"),
            inf_rec: el.find("infRec").map(|r| InfRec {
                n_rec: r.child_text("nRec"),
                t_med: r.child_text("tMed"),
            }),
            prot_nfe: el.find("protNFe").map(ProtNfe::from_element),
        }
    }
}

/// `retConsReciNFe`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetConsReciNfe {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub n_rec: Option<String>,
    pub prot_nfe: Vec<ProtNfe>,
}

impl FromXml for RetConsReciNfe {
    const ROOT: &'static str = "retConsReciNFe";

    fn from_element(el: &Element) -> Self {
        Self {
            c_stat: el.child_text("cStat"),
            x_motivo: el.child_text("xMotivo"),
            n_rec: el.child_text("nRec"),
            prot_nfe: el.find_all("protNFe").map(ProtNfe::from_element).collect(),
        }
    }
}

/// `retEvento` for one event of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetEvento {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub ch_nfe: Option<String>,
    pub tp_evento: Option<String>,
    pub n_seq_evento: Option<String>,
    pub n_prot: Option<String>,
    pub dh_reg_evento: Option<String>,
}

impl FromXml for RetEvento {
    const ROOT: &'static str = "retEvento";

    fn from_element(el: &Element) -> Self {
        let inf = el.find("infEvento").unwrap_or(el);
        Self {
            c_stat: inf.child_text("cStat"),
            x_motivo: inf.child_text("xMotivo"),
            ch_nfe: inf.child_text("chNFe"),
            tp_evento: inf.child_text("tpEvento"),
            n_seq_evento: inf.child_text("nSeqEvento"),
            n_prot: inf.child_text("nProt"),
            dh_reg_evento: inf.child_text("dhRegEvento"),
        }
    }
}

/// `retEnvEvento`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetEnvEvento {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub id_lote: Option<String>,
    pub ret_evento: Vec<RetEvento>,
}

impl FromXml for RetEnvEvento {
    const ROOT: &'static str = "retEnvEvento";

    fn from_element(el: &Element) -> Self {
        Self {
            c_stat: el.child_text("cStat"),
            x_motivo: el.child_text("xMotivo"),
            id_lote: el.child_text("idLote"),
            ret_evento: el.find_all("retEvento").map(RetEvento::from_element).collect(),
        }
    }
}

/// `retInutNFe`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetInutNfe {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub n_prot: Option<String>,
}

impl FromXml for RetInutNfe {
    const ROOT: &'static str = "retInutNFe";

    fn from_element(el: &Element) -> Self {
        let inf = el.find("infInut").unwrap_or(el);
        Self {
            c_stat: inf.child_text("cStat"),
            x_motivo: inf.child_text("xMotivo"),
            n_prot: inf.child_text("nProt"),
        }
    }
}

/// One `docZip` of a distribution answer; `conteudo` is still gzip+base64.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocZip {
    pub nsu: Option<String>,
    pub schema: Option<String>,
    pub conteudo: String,
}

impl DocZip {
    /// The distributed document (`resNFe`, `procNFe`, event...) as XML.
    pub fn xml(&self) -> Result<String, EdocError> {
        decompress(&self.conteudo)
    }
}

/// `retDistDFeInt`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetDistDfeInt {
    pub c_stat: Option<String>,
    pub x_motivo: Option<String>,
    pub ult_nsu: Option<String>,
    pub max_nsu: Option<String>,
    pub doc_zip: Vec<DocZip>,
}

impl FromXml for RetDistDfeInt {
    const ROOT: &'static str = "retDistDFeInt";

    fn from_element(el: &Element) -> Self {
        let docs = el
            .find("loteDistDFeInt")
            .map(|lote| {
                lote.find_all("docZip")
                    .map(|d| DocZip {
                        nsu: d.attribute("NSU").map(str::to_string),
                        schema: d.attribute("schema").map(str::to_string),
                        conteudo: d.text_content().trim().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            c_stat: el.child_text("cStat"),
            x_motivo: el.child_text("xMotivo"),
            ult_nsu: el.child_text("ultNSU"),
            max_nsu: el.child_text("maxNSU"),
            doc_zip: docs,
        }
    }
}

/// Any response of the NF-e services.
#[derive(Debug, Clone, PartialEq)]
pub enum NfeResposta {
    Status(RetConsStatServ),
    Consulta(RetConsSitNfe),
    Envio(RetEnviNfe),
    Recibo(RetConsReciNfe),
    Evento(RetEnvEvento),
    Inutilizacao(RetInutNfe),
    Distribuicao(RetDistDfeInt),
}

impl NfeResposta {
    pub fn c_stat(&self) -> Option<&str> {
        match self {
            Self::Status(r) => r.c_stat.as_deref(),
            Self::Consulta(r) => r.c_stat.as_deref(),
            Self::Envio(r) => r.c_stat.as_deref(),
            Self::Recibo(r) => r.c_stat.as_deref(),
            Self::Evento(r) => r.c_stat.as_deref(),
            Self::Inutilizacao(r) => r.c_stat.as_deref(),
            Self::Distribuicao(r) => r.c_stat.as_deref(),
        }
    }

    pub fn x_motivo(&self) -> Option<&str> {
        match self {
            Self::Status(r) => r.x_motivo.as_deref(),
            Self::Consulta(r) => r.x_motivo.as_deref(),
            Self::Envio(r) => r.x_motivo.as_deref(),
            Self::Recibo(r) => r.x_motivo.as_deref(),
            Self::Evento(r) => r.x_motivo.as_deref(),
            Self::Inutilizacao(r) => r.x_motivo.as_deref(),
            Self::Distribuicao(r) => r.x_motivo.as_deref(),
        }
    }
}

/// Read a decimal such as `vNF`, tolerating surrounding whitespace.
pub(crate) fn decimal_at(el: &Element, path: &[&str]) -> Option<Decimal> {
    el.text_at(path)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_request_layout() {
        let xml = cons_stat_serv(VERSAO, Ambiente::Homologacao, 35)
            .to_xml()
            .unwrap();
        insta::assert_snapshot!(xml, @r#"<consStatServ xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00"><tpAmb>2</tpAmb><cUF>35</cUF><xServ>STATUS</xServ></consStatServ>"#);
    }

    #[test]
    fn recibo_reads_all_protocols() {
        let el = Element::parse(
            "<retConsReciNFe><cStat>104</cStat><nRec>351000000000001</nRec>\
             <protNFe><infProt><chNFe>A</chNFe><cStat>100</cStat><nProt>1</nProt></infProt></protNFe>\
             <protNFe><infProt><chNFe>B</chNFe><cStat>302</cStat></infProt></protNFe></retConsReciNFe>",
        )
        .unwrap();
        let ret = RetConsReciNfe::from_element(&el);
        assert_eq!(ret.c_stat.as_deref(), Some("104"));
        assert_eq!(ret.prot_nfe.len(), 2);
        assert_eq!(ret.prot_nfe[0].n_prot.as_deref(), Some("1"));
        assert_eq!(ret.prot_nfe[1].ch_nfe.as_deref(), Some("B"));
        assert_eq!(ret.prot_nfe[1].n_prot, None);
    }

    #[test]
    fn envio_reads_inf_rec() {
        let el = Element::parse(
            "<retEnviNFe><cStat>103</cStat><infRec><nRec>123</nRec><tMed>3</tMed></infRec></retEnviNFe>",
        )
        .unwrap();
        let ret = RetEnviNfe::from_element(&el);
        let inf = ret.inf_rec.unwrap();
        assert_eq!(inf.n_rec.as_deref(), Some("123"));
        assert_eq!(inf.t_med.as_deref(), Some("3"));
    }

    #[test]
    fn distribution_reads_doc_zip() {
        let el = Element::parse(
            r#"<retDistDFeInt><cStat>138</cStat><ultNSU>000000000000002</ultNSU><maxNSU>000000000000009</maxNSU><loteDistDFeInt><docZip NSU="000000000000002" schema="resNFe_v1.01.xsd">H4sI</docZip></loteDistDFeInt></retDistDFeInt>"#,
        )
        .unwrap();
        let ret = RetDistDfeInt::from_element(&el);
        assert_eq!(ret.doc_zip.len(), 1);
        assert_eq!(ret.doc_zip[0].nsu.as_deref(), Some("000000000000002"));
        assert_eq!(ret.doc_zip[0].conteudo, "H4sI");
        assert_eq!(ret.max_nsu.as_deref(), Some("000000000000009"));
    }

    #[test]
    fn doc_zip_unpacks() {
        let doc = DocZip {
            conteudo: crate::core::compress("<resNFe/>").unwrap(),
            ..Default::default()
        };
        assert_eq!(doc.xml().unwrap(), "<resNFe/>");
    }

    #[test]
    fn event_reads_inf_evento() {
        let el = Element::parse(
            "<retEnvEvento><cStat>128</cStat><retEvento><infEvento><cStat>135</cStat><tpEvento>110111</tpEvento><nProt>9</nProt></infEvento></retEvento></retEnvEvento>",
        )
        .unwrap();
        let ret = RetEnvEvento::from_element(&el);
        assert_eq!(ret.c_stat.as_deref(), Some("128"));
        assert_eq!(ret.ret_evento[0].c_stat.as_deref(), Some("135"));
        assert_eq!(ret.ret_evento[0].tp_evento.as_deref(), Some("110111"));
    }
}
