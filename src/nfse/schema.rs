//! Tolerant views over ABRASF and Paulistana responses.
//!
//! Providers answer with the same shapes under different namespaces, so
//! every lookup goes by local name.

use crate::core::{Element, FromXml};

/// `MensagemRetorno` (ABRASF) or `Erro`/`Alerta` (Paulistana).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MensagemRetorno {
    pub codigo: Option<String>,
    pub mensagem: Option<String>,
    pub correcao: Option<String>,
}

impl MensagemRetorno {
    fn abrasf(el: &Element) -> Self {
        Self {
            codigo: el.child_text("Codigo"),
            mensagem: el.child_text("Mensagem"),
            correcao: el.child_text("Correcao"),
        }
    }

    fn paulistana(el: &Element) -> Self {
        Self {
            codigo: el.child_text("Codigo"),
            mensagem: el.child_text("Descricao"),
            correcao: None,
        }
    }
}

/// `ListaMensagemRetorno` entries, or bare `MensagemRetorno` children.
fn mensagens(el: &Element) -> Vec<MensagemRetorno> {
    el.descendant("ListaMensagemRetorno")
        .unwrap_or(el)
        .find_all("MensagemRetorno")
        .map(MensagemRetorno::abrasf)
        .collect()
}

/// An issued NFS-e as listed by lot and RPS queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Nfse {
    pub numero: Option<String>,
    pub codigo_verificacao: Option<String>,
    pub data_emissao: Option<String>,
    pub cnpj_prestador: Option<String>,
    pub razao_social_prestador: Option<String>,
    pub cancelada: bool,
    /// As written by the provider, when the note was cancelled.
    pub data_cancelamento: Option<String>,
}

fn texto(el: Option<&Element>) -> Option<String> {
    let text = el?.text_content();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

impl Nfse {
    /// From an ABRASF `CompNfse`.
    fn from_comp(comp: &Element) -> Self {
        let inf = comp
            .find_path(&["Nfse", "InfNfse"])
            .or_else(|| comp.descendant("InfNfse"));
        let text = |name: &str| inf.and_then(|i| i.child_text(name));
        let cancelamento = comp.descendant("NfseCancelamento");
        Self {
            numero: text("Numero"),
            codigo_verificacao: text("CodigoVerificacao"),
            data_emissao: text("DataEmissao"),
            // `IdentificacaoPrestador/Cnpj` or `IdentificacaoPrestador/CpfCnpj/Cnpj`
            cnpj_prestador: texto(
                inf.and_then(|i| i.descendant("IdentificacaoPrestador"))
                    .and_then(|p| p.descendant("Cnpj")),
            ),
            razao_social_prestador: inf
                .and_then(|i| i.descendant("PrestadorServico"))
                .and_then(|p| p.child_text("RazaoSocial")),
            cancelada: cancelamento.is_some(),
            data_cancelamento: texto(cancelamento.and_then(|c| c.descendant("DataHora"))),
        }
    }

    /// From a Paulistana `NFe`.
    fn from_paulistana(nfe: &Element) -> Self {
        Self {
            numero: nfe.text_at(&["ChaveNFe", "NumeroNFe"]),
            codigo_verificacao: nfe.text_at(&["ChaveNFe", "CodigoVerificacao"]),
            data_emissao: nfe.child_text("DataEmissaoNFe"),
            cnpj_prestador: nfe.text_at(&["CPFCNPJPrestador", "CNPJ"]),
            razao_social_prestador: nfe.child_text("RazaoSocialPrestador"),
            cancelada: nfe.child_text("StatusNFe").as_deref() == Some("C"),
            data_cancelamento: nfe.child_text("DataCancelamento"),
        }
    }
}

/// `EnviarLoteRpsResposta`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnviarLoteRpsResposta {
    pub numero_lote: Option<String>,
    pub data_recebimento: Option<String>,
    pub protocolo: Option<String>,
    pub mensagens: Vec<MensagemRetorno>,
}

impl FromXml for EnviarLoteRpsResposta {
    const ROOT: &'static str = "EnviarLoteRpsResposta";

    fn from_element(el: &Element) -> Self {
        Self {
            numero_lote: el.child_text("NumeroLote"),
            data_recebimento: el.child_text("DataRecebimento"),
            protocolo: el.child_text("Protocolo"),
            mensagens: mensagens(el),
        }
    }
}

/// `ConsultarSituacaoLoteRpsResposta`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsultarSituacaoLoteRpsResposta {
    pub numero_lote: Option<String>,
    /// 1 not received, 2 not yet processed, 3 failed, 4 processed.
    pub situacao: Option<u8>,
    pub mensagens: Vec<MensagemRetorno>,
}

impl FromXml for ConsultarSituacaoLoteRpsResposta {
    const ROOT: &'static str = "ConsultarSituacaoLoteRpsResposta";

    fn from_element(el: &Element) -> Self {
        Self {
            numero_lote: el.child_text("NumeroLote"),
            situacao: el.child_text("Situacao").and_then(|s| s.parse().ok()),
            mensagens: mensagens(el),
        }
    }
}

/// `ConsultarLoteRpsResposta`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsultarLoteRpsResposta {
    pub nfses: Vec<Nfse>,
    pub mensagens: Vec<MensagemRetorno>,
}

impl FromXml for ConsultarLoteRpsResposta {
    const ROOT: &'static str = "ConsultarLoteRpsResposta";

    fn from_element(el: &Element) -> Self {
        Self {
            nfses: el
                .descendant("ListaNfse")
                .map(|l| l.find_all("CompNfse").map(Nfse::from_comp).collect())
                .unwrap_or_default(),
            mensagens: mensagens(el),
        }
    }
}

/// `ConsultarNfseRpsResposta`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsultarNfseRpsResposta {
    pub nfse: Option<Nfse>,
    pub mensagens: Vec<MensagemRetorno>,
}

impl FromXml for ConsultarNfseRpsResposta {
    const ROOT: &'static str = "ConsultarNfseRpsResposta";

    fn from_element(el: &Element) -> Self {
        Self {
            nfse: el.descendant("CompNfse").map(Nfse::from_comp),
            mensagens: mensagens(el),
        }
    }
}

/// `CancelarNfseResposta`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CancelarNfseResposta {
    pub sucesso: bool,
    pub data_hora: Option<String>,
    pub mensagens: Vec<MensagemRetorno>,
}

impl FromXml for CancelarNfseResposta {
    const ROOT: &'static str = "CancelarNfseResposta";

    fn from_element(el: &Element) -> Self {
        let sucesso = el
            .descendant("Sucesso")
            .map(|s| s.text_content().trim() == "true")
            .unwrap_or_else(|| el.descendant("Confirmacao").is_some());
        let data_hora = ["DataHora", "DataHoraCancelamento"]
            .into_iter()
            .find_map(|name| texto(el.descendant(name)));
        Self {
            sucesso,
            data_hora,
            mensagens: mensagens(el),
        }
    }
}

/// Any `Retorno*` document of the Paulistana service (`RetornoEnvioLoteRPS`,
/// `RetornoConsulta`, `RetornoCancelamentoNFe`): they share the
/// `Cabecalho`, `Alerta` and `Erro` layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetornoPaulistana {
    pub sucesso: bool,
    pub numero_lote: Option<String>,
    /// Sender CNPJ echoed back in the header.
    pub cnpj: Option<String>,
    pub notas: Vec<Nfse>,
    pub alertas: Vec<MensagemRetorno>,
    pub erros: Vec<MensagemRetorno>,
}

impl FromXml for RetornoPaulistana {
    const ROOT: &'static str = "RetornoEnvioLoteRPS";

    fn from_element(el: &Element) -> Self {
        let cabecalho = el.find("Cabecalho");
        let sucesso = cabecalho
            .and_then(|c| {
                c.child_text("Sucesso")
                    .or_else(|| c.attribute("Sucesso").map(str::to_string))
            })
            .is_some_and(|s| s.eq_ignore_ascii_case("true"));
        Self {
            sucesso,
            numero_lote: texto(el.descendant("NumeroLote")),
            cnpj: texto(el.descendant("CNPJ")),
            notas: el.find_all("NFe").map(Nfse::from_paulistana).collect(),
            alertas: el.find_all("Alerta").map(MensagemRetorno::paulistana).collect(),
            erros: el.find_all("Erro").map(MensagemRetorno::paulistana).collect(),
        }
    }
}

/// Any NFS-e response.
#[derive(Debug, Clone, PartialEq)]
pub enum NfseResposta {
    Envio(EnviarLoteRpsResposta),
    SituacaoLote(ConsultarSituacaoLoteRpsResposta),
    Lote(ConsultarLoteRpsResposta),
    Rps(ConsultarNfseRpsResposta),
    Cancelamento(CancelarNfseResposta),
    Paulistana(RetornoPaulistana),
}

impl NfseResposta {
    /// Lot protocol issued on submission.
    pub fn protocolo(&self) -> Option<&str> {
        match self {
            Self::Envio(r) => r.protocolo.as_deref(),
            _ => None,
        }
    }

    /// Provider messages: ABRASF `MensagemRetorno` or Paulistana `Erro`.
    pub fn mensagens(&self) -> &[MensagemRetorno] {
        match self {
            Self::Envio(r) => &r.mensagens,
            Self::SituacaoLote(r) => &r.mensagens,
            Self::Lote(r) => &r.mensagens,
            Self::Rps(r) => &r.mensagens,
            Self::Cancelamento(r) => &r.mensagens,
            Self::Paulistana(r) => &r.erros,
        }
    }

    /// Notes listed by the response.
    pub fn nfses(&self) -> &[Nfse] {
        match self {
            Self::Lote(r) => &r.nfses,
            Self::Rps(r) => r.nfse.as_slice(),
            Self::Paulistana(r) => &r.notas,
            _ => &[],
        }
    }
}
