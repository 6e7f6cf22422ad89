//! What an RPS query or a cancellation answer means for the issuer.
//!
//! Providers reply with free-form documents; these outcomes are the part
//! an ERP acts upon: whether the note exists, whether it still matches
//! the issuer's records, whether the provider accepted the cancellation.

use std::fmt;

use chrono::NaiveDateTime;

use super::schema::{MensagemRetorno, Nfse, NfseResposta};

/// Issuer data an issued note is checked against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conferencia {
    /// Expected NFS-e number; unchecked when `None`.
    pub numero: Option<String>,
    /// Punctuation is ignored.
    pub cnpj: String,
    pub razao_social: String,
}

impl Conferencia {
    pub fn new(cnpj: impl Into<String>, razao_social: impl Into<String>) -> Self {
        Self {
            numero: None,
            cnpj: cnpj.into(),
            razao_social: razao_social.into(),
        }
    }

    pub fn numero(mut self, numero: impl Into<String>) -> Self {
        self.numero = Some(numero.into());
        self
    }

    fn divergencias(&self, nfse: &Nfse) -> Vec<CampoDivergente> {
        let mut campos = Vec::new();
        if let (Some(esperado), Some(numero)) = (&self.numero, &nfse.numero) {
            if esperado.trim() != numero {
                campos.push(CampoDivergente::Numero);
            }
        }
        if let Some(cnpj) = &nfse.cnpj_prestador {
            if digitos(cnpj) != digitos(&self.cnpj) {
                campos.push(CampoDivergente::CnpjPrestador);
            }
        }
        if let Some(razao) = &nfse.razao_social_prestador {
            if razao != self.razao_social.trim() {
                campos.push(CampoDivergente::RazaoSocial);
            }
        }
        campos
    }
}

fn digitos(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// A field the provider holds differently from the issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CampoDivergente {
    Numero,
    CnpjPrestador,
    RazaoSocial,
}

impl fmt::Display for CampoDivergente {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Numero => "Número",
            Self::CnpjPrestador => "CNPJ do prestador",
            Self::RazaoSocial => "Razão Social do prestador",
        })
    }
}

/// Outcome of looking up an NFS-e by its RPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultadoConsultaNfse {
    /// Issued, and the provider's copy matches the issuer.
    Confere(Nfse),
    Cancelada {
        nfse: Nfse,
        /// `None` when the provider's timestamp is absent or unreadable.
        em: Option<NaiveDateTime>,
    },
    Diverge {
        nfse: Nfse,
        campos: Vec<CampoDivergente>,
    },
    /// No note for that RPS; the provider says why.
    NaoEncontrada(Vec<MensagemRetorno>),
    /// Neither a note nor a message.
    Desconhecido,
}

impl ResultadoConsultaNfse {
    /// The note exists at the provider, cancelled or not.
    pub fn enviada(&self) -> bool {
        matches!(
            self,
            Self::Confere(_) | Self::Cancelada { .. } | Self::Diverge { .. }
        )
    }
}

impl fmt::Display for ResultadoConsultaNfse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confere(_) => f.write_str("NFS-e enviada e corresponde com o provedor"),
            Self::Cancelada { em: Some(em), .. } => {
                write!(f, "NFS-e cancelada em {}", em.format("%d/%m/%Y"))
            }
            Self::Cancelada { em: None, .. } => f.write_str("NFS-e cancelada"),
            Self::Diverge { campos, .. } => {
                f.write_str("Os seguintes campos não condizem com o provedor NFS-e:")?;
                for campo in campos {
                    write!(f, "\n{campo}")?;
                }
                Ok(())
            }
            Self::NaoEncontrada(mensagens) => {
                for (i, m) in mensagens.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    write!(
                        f,
                        "{} - {}",
                        m.codigo.as_deref().unwrap_or_default(),
                        m.mensagem.as_deref().unwrap_or_default()
                    )?;
                    if let Some(correcao) = &m.correcao {
                        write!(f, " - Correção: {correcao}")?;
                    }
                }
                Ok(())
            }
            Self::Desconhecido => f.write_str("Erro desconhecido."),
        }
    }
}

/// Outcome of a cancellation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultadoCancelamento {
    Cancelada { data_hora: Option<String> },
    Recusada(Vec<MensagemRetorno>),
}

/// `2024-01-05T10:00:00`, ignoring any fraction or offset that follows.
fn data_hora(texto: &str) -> Option<NaiveDateTime> {
    let texto = texto.trim();
    let base = texto.get(..19).unwrap_or(texto);
    NaiveDateTime::parse_from_str(base, "%Y-%m-%dT%H:%M:%S").ok()
}

impl NfseResposta {
    /// Read a lot, RPS or Paulistana query answer against the issuer's
    /// records. Lot answers are judged by their first note.
    pub fn resultado_consulta(&self, conferencia: &Conferencia) -> ResultadoConsultaNfse {
        if let Some(nfse) = self.nfses().first() {
            let nfse = nfse.clone();
            if nfse.cancelada {
                let em = nfse.data_cancelamento.as_deref().and_then(data_hora);
                return ResultadoConsultaNfse::Cancelada { nfse, em };
            }
            let campos = conferencia.divergencias(&nfse);
            return match campos.is_empty() {
                true => ResultadoConsultaNfse::Confere(nfse),
                false => ResultadoConsultaNfse::Diverge { nfse, campos },
            };
        }
        match self.mensagens() {
            [] => ResultadoConsultaNfse::Desconhecido,
            mensagens => ResultadoConsultaNfse::NaoEncontrada(mensagens.to_vec()),
        }
    }

    /// `None` unless this answers a cancellation.
    pub fn resultado_cancelamento(&self) -> Option<ResultadoCancelamento> {
        let (sucesso, data_hora, mensagens) = match self {
            Self::Cancelamento(r) => (r.sucesso, r.data_hora.clone(), &r.mensagens),
            Self::Paulistana(r) => (r.sucesso, None, &r.erros),
            _ => return None,
        };
        Some(match sucesso {
            true => ResultadoCancelamento::Cancelada { data_hora },
            false => ResultadoCancelamento::Recusada(mensagens.clone()),
        })
    }
}
