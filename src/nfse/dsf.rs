//! DSF RPS signature key.
//!
//! DSF cities sign each RPS with the SHA-1 of a fixed-width text built
//! from its fields:
//!
//! ```text
//! 0          11   16          28      36 38 40             55             70        80            94
//! |          |    |           |       |  ||                |              |         |             |
//! 00000317330NF   00000003866320090905T NN000000000001686000000000000000082997990008764130000102
//! ```
//!
//! municipal registration, series, RPS number, issue date, taxation,
//! RPS status, withholding type, service value, deductions, activity code,
//! customer CPF/CNPJ.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha1::{Digest, Sha1};

use crate::core::{EdocError, Element};

use super::document::LoteRps;

pub const CHAVE_DSF_LEN: usize = 94;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaveNfseDsf {
    pub inscricao_municipal: String,
    pub serie: String,
    pub numero: String,
    pub data: NaiveDate,
    pub tributacao: String,
    /// `N` normal, `C` cancelled.
    pub situacao: String,
    pub tipo_recolhimento: String,
    pub valor_servico: Decimal,
    pub valor_deducao: Decimal,
    pub codigo_atividade: String,
    pub cpf_cnpj: String,
}

/// Amount in cents, zero-padded to 15 digits.
fn centavos(valor: Decimal) -> String {
    let cents = (valor * Decimal::ONE_HUNDRED).round();
    format!("{:0>15}", cents.trunc().to_string())
}

fn from_centavos(s: &str) -> Option<Decimal> {
    let cents: i64 = s.trim().parse().ok()?;
    Some(Decimal::new(cents, 2))
}

fn text(rps: &Element, name: &'static str) -> Result<String, EdocError> {
    rps.child_text(name).ok_or(EdocError::MissingField(name))
}

fn soma(rps: &Element, lista: &str, item: &str, campo: &str) -> Decimal {
    rps.find(lista)
        .map(|l| {
            l.find_all(item)
                .filter_map(|i| i.child_text(campo)?.parse::<Decimal>().ok())
                .sum::<Decimal>()
        })
        .unwrap_or_default()
}

impl ChaveNfseDsf {
    /// The 94-character key text.
    pub fn chave(&self) -> String {
        format!(
            "{:0>11}{:<5}{:0>12}{}{:<2}{}{}{}{}{:0>10}{:0>14}",
            self.inscricao_municipal,
            self.serie,
            self.numero,
            self.data.format("%Y%m%d"),
            self.tributacao,
            self.situacao,
            self.tipo_recolhimento,
            centavos(self.valor_servico),
            centavos(self.valor_deducao),
            self.codigo_atividade,
            self.cpf_cnpj,
        )
    }

    /// Lowercase hex SHA-1 of [`ChaveNfseDsf::chave`], the value of the
    /// RPS `Assinatura` element.
    pub fn hash(&self) -> String {
        hex::encode(Sha1::digest(self.chave().as_bytes()))
    }

    pub fn parse(chave: &str) -> Result<Self, EdocError> {
        if chave.len() != CHAVE_DSF_LEN || !chave.is_ascii() {
            return Err(EdocError::Config(format!(
                "DSF key must have {CHAVE_DSF_LEN} ASCII characters"
            )));
        }
        let data = NaiveDate::parse_from_str(&chave[28..36], "%Y%m%d")
            .map_err(|e| EdocError::Config(format!("DSF key date: {e}")))?;
        let valor = |r: std::ops::Range<usize>| {
            from_centavos(&chave[r]).ok_or_else(|| EdocError::Config("DSF key amount".into()))
        };
        Ok(Self {
            inscricao_municipal: chave[0..11].to_string(),
            serie: chave[11..16].trim_end().to_string(),
            numero: chave[16..28].to_string(),
            data,
            tributacao: chave[36..38].trim_end().to_string(),
            situacao: chave[38..39].to_string(),
            tipo_recolhimento: chave[39..40].to_string(),
            valor_servico: valor(40..55)?,
            valor_deducao: valor(55..70)?,
            codigo_atividade: chave[70..80].to_string(),
            cpf_cnpj: chave[80..94].to_string(),
        })
    }

    /// Read a DSF `RPS` element. The service value is the item total
    /// minus deductions.
    pub fn from_rps(rps: &Element) -> Result<Self, EdocError> {
        let emissao = text(rps, "DataEmissaoRPS")?;
        let data = NaiveDate::parse_from_str(emissao.get(..10).unwrap_or(&emissao), "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&emissao, "%Y%m%d"))
            .map_err(|e| EdocError::Config(format!("DataEmissaoRPS: {e}")))?;
        let total = soma(rps, "Itens", "Item", "ValorTotal");
        let deducoes = soma(rps, "Deducoes", "Deducao", "ValorDeduzir");
        Ok(Self {
            inscricao_municipal: text(rps, "InscricaoMunicipalPrestador")?,
            serie: text(rps, "SerieRPS")?,
            numero: text(rps, "NumeroRPS")?,
            data,
            tributacao: text(rps, "Tributacao")?,
            situacao: text(rps, "SituacaoRPS")?,
            tipo_recolhimento: text(rps, "TipoRecolhimento")?,
            valor_servico: total - deducoes,
            valor_deducao: deducoes,
            codigo_atividade: text(rps, "CodigoAtividade")?,
            cpf_cnpj: text(rps, "CPFCNPJTomador")?,
        })
    }
}

/// Fill `Assinatura` of every `RPS` in a DSF batch. Returns how many were
/// signed.
pub fn assina_rps_dsf(lote: &mut LoteRps) -> Result<usize, EdocError> {
    let mut assinados = 0;
    let mut falha = None;
    lote.element_mut().for_each_descendant_mut("RPS", &mut |rps| {
        if falha.is_some() {
            return;
        }
        match ChaveNfseDsf::from_rps(rps) {
            Ok(chave) => {
                rps.set_child_text("Assinatura", chave.hash());
                assinados += 1;
            }
            Err(e) => falha = Some(e),
        }
    });
    match falha {
        Some(e) => Err(e),
        None => Ok(assinados),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const CHAVE: &str = "00000317330NF   00000003866320090905T NN000000000001686000000000000000082997990008764130000102";

    fn chave() -> ChaveNfseDsf {
        ChaveNfseDsf {
            inscricao_municipal: "317330".into(),
            serie: "NF".into(),
            numero: "38663".into(),
            data: NaiveDate::from_ymd_opt(2009, 9, 5).unwrap(),
            tributacao: "T".into(),
            situacao: "N".into(),
            tipo_recolhimento: "N".into(),
            valor_servico: dec!(16.86),
            valor_deducao: Decimal::ZERO,
            codigo_atividade: "829979900".into(),
            cpf_cnpj: "08764130000102".into(),
        }
    }

    #[test]
    fn fixed_width_text() {
        assert_eq!(chave().chave(), CHAVE);
        assert_eq!(chave().chave().len(), CHAVE_DSF_LEN);
    }

    #[test]
    fn sha1_hex() {
        assert_eq!(chave().hash(), "6bcbb93fd7e6d7f0417656f4931ba9f92a7ac1da");
    }

    #[test]
    fn parse_reads_fields_back() {
        let parsed = ChaveNfseDsf::parse(CHAVE).unwrap();
        assert_eq!(parsed.serie, "NF");
        assert_eq!(parsed.valor_servico, dec!(16.86));
        assert_eq!(parsed.chave(), CHAVE);
        assert!(ChaveNfseDsf::parse("curta").is_err());
    }

    #[test]
    fn batch_rps_are_signed() {
        let mut lote = LoteRps::from_xml(
            "<EnviarLoteRpsEnvio><Lote><RPS><Assinatura/><InscricaoMunicipalPrestador>317330</InscricaoMunicipalPrestador><SerieRPS>NF</SerieRPS><NumeroRPS>38663</NumeroRPS><DataEmissaoRPS>2009-09-05T10:00:00</DataEmissaoRPS><Tributacao>T</Tributacao><SituacaoRPS>N</SituacaoRPS><TipoRecolhimento>N</TipoRecolhimento><CodigoAtividade>829979900</CodigoAtividade><CPFCNPJTomador>08764130000102</CPFCNPJTomador><Itens><Item><ValorTotal>20.00</ValorTotal></Item></Itens><Deducoes><Deducao><ValorDeduzir>3.14</ValorDeduzir></Deducao></Deducoes></RPS></Lote></EnviarLoteRpsEnvio>",
        )
        .unwrap();
        assert_eq!(assina_rps_dsf(&mut lote).unwrap(), 1);
        let rps = lote.element().find_path(&["Lote", "RPS"]).unwrap();
        let esperado = ChaveNfseDsf::from_rps(rps).unwrap();
        assert_eq!(esperado.valor_servico, dec!(16.86));
        assert_eq!(rps.child_text("Assinatura"), Some(esperado.hash()));
    }
}
