//! Events registered against an authorized NF-e and number-range voiding.

use chrono::{DateTime, Datelike, FixedOffset};

use crate::core::{Ambiente, EdocError, Element, format_dh};

use super::NAMESPACE;
use super::schema::{VERSAO_EVENTO, cnpj_or_cpf};

/// Legal usage conditions every correction letter must carry (`xCondUso`).
pub const TEXTO_CARTA_CORRECAO: &str = "A Carta de Correcao e disciplinada pelo paragrafo 1o-A do art. 7o do Convenio S/N, de 15 de dezembro de 1970 e pode ser utilizada para regularizacao de erro ocorrido na emissao de documento fiscal, desde que o erro nao esteja relacionado com: I - as variaveis que determinam o valor do imposto tais como: base de calculo, aliquota, diferenca de preco, quantidade, valor da operacao ou da prestacao; II - a correcao de dados cadastrais que implique mudanca do remetente ou do destinatario; III - a data de emissao ou de saida.";

/// `cOrgao` of the national environment, receiver of recipient manifestations.
pub const ORGAO_NACIONAL: u8 = 91;

/// Event kinds, by `tpEvento`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TipoEvento {
    Cancelamento,
    CartaCorrecao,
    ConfirmacaoOperacao,
    CienciaOperacao,
    DesconhecimentoOperacao,
    OperacaoNaoRealizada,
}

impl TipoEvento {
    pub fn codigo(&self) -> &'static str {
        match self {
            Self::Cancelamento => "110111",
            Self::CartaCorrecao => "110110",
            Self::ConfirmacaoOperacao => "210200",
            Self::CienciaOperacao => "210210",
            Self::DesconhecimentoOperacao => "210220",
            Self::OperacaoNaoRealizada => "210240",
        }
    }

    /// `descEvento` as the schema spells it.
    pub fn descricao(&self) -> &'static str {
        match self {
            Self::Cancelamento => "Cancelamento",
            Self::CartaCorrecao => "Carta de Correcao",
            Self::ConfirmacaoOperacao => "Confirmacao da Operacao",
            Self::CienciaOperacao => "Ciencia da Operacao",
            Self::DesconhecimentoOperacao => "Desconhecimento da Operacao",
            Self::OperacaoNaoRealizada => "Operacao nao Realizada",
        }
    }

    /// Recipient manifestations go to the national environment.
    pub fn is_manifestacao(&self) -> bool {
        self.codigo().starts_with("210")
    }
}

/// One `evento` before signing.
#[derive(Debug, Clone, PartialEq)]
pub struct EventoNfe {
    pub tipo: TipoEvento,
    pub chave: String,
    pub c_orgao: u8,
    pub ambiente: Ambiente,
    /// CNPJ or CPF of the author.
    pub autor: String,
    pub sequencia: u32,
    pub data_hora: DateTime<FixedOffset>,
    /// `detEvento` children after `descEvento`, in schema order.
    pub detalhe: Vec<(&'static str, String)>,
}

impl EventoNfe {
    /// `ID` + type + key + two-digit sequence.
    pub fn id(&self) -> String {
        format!("ID{}{}{:02}", self.tipo.codigo(), self.chave, self.sequencia)
    }

    pub fn to_element(&self) -> Element {
        let (tag, doc) = cnpj_or_cpf(&self.autor);
        let mut det = Element::new("detEvento")
            .attr("versao", VERSAO_EVENTO)
            .text_child("descEvento", self.tipo.descricao());
        for (name, value) in &self.detalhe {
            det = det.text_child(name, value.as_str());
        }
        let inf = Element::new("infEvento")
            .attr("Id", self.id())
            .text_child("cOrgao", self.c_orgao.to_string())
            .text_child("tpAmb", self.ambiente.tp_amb())
            .text_child(tag, doc)
            .text_child("chNFe", self.chave.as_str())
            .text_child("dhEvento", format_dh(&self.data_hora))
            .text_child("tpEvento", self.tipo.codigo())
            .text_child("nSeqEvento", self.sequencia.to_string())
            .text_child("verEvento", VERSAO_EVENTO)
            .child(det);
        Element::new("evento")
            .attr("xmlns", NAMESPACE)
            .attr("versao", VERSAO_EVENTO)
            .child(inf)
    }

    pub fn to_xml(&self) -> Result<String, EdocError> {
        self.to_element().to_xml()
    }
}

/// Number range to void (`inutNFe`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inutilizacao {
    pub cnpj: String,
    /// `55` or `65`.
    pub modelo: String,
    pub serie: u32,
    pub numero_inicial: u64,
    pub numero_final: u64,
    pub justificativa: String,
}

impl Inutilizacao {
    /// `ID` + cUF + year(2) + CNPJ + model + series(3) + start(9) + end(9).
    pub fn id(&self, c_uf: u8, ano: i32) -> String {
        format!(
            "ID{:02}{:02}{}{}{:03}{:09}{:09}",
            c_uf,
            ano.rem_euclid(100),
            self.cnpj,
            self.modelo,
            self.serie,
            self.numero_inicial,
            self.numero_final
        )
    }

    pub fn to_element(
        &self,
        versao: &str,
        ambiente: Ambiente,
        c_uf: u8,
        hoje: DateTime<FixedOffset>,
    ) -> Result<Element, EdocError> {
        if self.numero_inicial > self.numero_final {
            return Err(EdocError::Config(format!(
                "invalid range {}..{}",
                self.numero_inicial, self.numero_final
            )));
        }
        let ano = hoje.year();
        let inf = Element::new("infInut")
            .attr("Id", self.id(c_uf, ano))
            .text_child("tpAmb", ambiente.tp_amb())
            .text_child("xServ", "INUTILIZAR")
            .text_child("cUF", c_uf.to_string())
            .text_child("ano", format!("{:02}", ano.rem_euclid(100)))
            .text_child("CNPJ", self.cnpj.as_str())
            .text_child("mod", self.modelo.as_str())
            .text_child("serie", self.serie.to_string())
            .text_child("nNFIni", self.numero_inicial.to_string())
            .text_child("nNFFin", self.numero_final.to_string())
            .text_child("xJust", self.justificativa.as_str());
        Ok(Element::new("inutNFe")
            .attr("xmlns", NAMESPACE)
            .attr("versao", versao)
            .child(inf))
    }
}
