//! 44-digit access key (`chave de acesso`) shared by NF-e, NFC-e, CT-e and
//! MDF-e.
//!
//! Layout: `cUF(2) AAMM(4) CNPJ(14) mod(2) serie(3) nNF(9) tpEmis(1)
//! cNF(8) cDV(1)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::EdocError;

pub const CHAVE_LEN: usize = 44;

/// A syntactically valid access key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChaveAcesso(String);

/// The parts an access key is composed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentesChave {
    pub c_uf: u8,
    /// Emission year and month, `AAMM`.
    pub aamm: String,
    /// Issuer CNPJ, 14 digits.
    pub cnpj: String,
    /// Document model (55, 57, 58, 65).
    pub modelo: u8,
    pub serie: u32,
    pub numero: u64,
    pub tp_emis: u8,
    /// Random numeric code, 8 digits.
    pub codigo: u32,
}

impl ChaveAcesso {
    /// Parse a key, tolerating a leading type prefix such as `NFe` or `CTe`.
    ///
    /// Only the shape is checked; see [`ChaveAcesso::has_valid_check_digit`].
    pub fn parse(s: &str) -> Result<Self, EdocError> {
        let digits = s
            .trim()
            .trim_start_matches(|c: char| c.is_ascii_alphabetic());
        if digits.len() != CHAVE_LEN || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EdocError::Config(format!(
                "access key must have {CHAVE_LEN} digits: {s}"
            )));
        }
        Ok(Self(digits.to_string()))
    }

    /// Build a key from its parts, computing the check digit.
    pub fn compose(parts: &ComponentesChave) -> Result<Self, EdocError> {
        let aamm_ok = parts.aamm.len() == 4 && parts.aamm.bytes().all(|b| b.is_ascii_digit());
        let cnpj_ok = parts.cnpj.len() == 14 && parts.cnpj.bytes().all(|b| b.is_ascii_digit());
        if !aamm_ok {
            return Err(EdocError::Config(format!("invalid AAMM: {}", parts.aamm)));
        }
        if !cnpj_ok {
            return Err(EdocError::Config(format!("invalid CNPJ: {}", parts.cnpj)));
        }
        if parts.c_uf > 99
            || parts.modelo > 99
            || parts.serie > 999
            || parts.numero > 999_999_999
            || parts.tp_emis > 9
            || parts.codigo > 99_999_999
        {
            return Err(EdocError::Config("access key component out of range".into()));
        }
        let base = format!(
            "{:02}{}{}{:02}{:03}{:09}{}{:08}",
            parts.c_uf,
            parts.aamm,
            parts.cnpj,
            parts.modelo,
            parts.serie,
            parts.numero,
            parts.tp_emis,
            parts.codigo
        );
        let dv = modulo11(&base);
        Ok(Self(format!("{base}{dv}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn c_uf(&self) -> &str {
        &self.0[0..2]
    }

    pub fn aamm(&self) -> &str {
        &self.0[2..6]
    }

    pub fn cnpj(&self) -> &str {
        &self.0[6..20]
    }

    pub fn modelo(&self) -> &str {
        &self.0[20..22]
    }

    pub fn serie(&self) -> &str {
        &self.0[22..25]
    }

    pub fn numero(&self) -> &str {
        &self.0[25..34]
    }

    pub fn tp_emis(&self) -> &str {
        &self.0[34..35]
    }

    pub fn codigo(&self) -> &str {
        &self.0[35..43]
    }

    pub fn dv(&self) -> u8 {
        self.0.as_bytes()[43] - b'0'
    }

    /// Split back into components.
    pub fn componentes(&self) -> ComponentesChave {
        ComponentesChave {
            c_uf: self.c_uf().parse().unwrap_or_default(),
            aamm: self.aamm().to_string(),
            cnpj: self.cnpj().to_string(),
            modelo: self.modelo().parse().unwrap_or_default(),
            serie: self.serie().parse().unwrap_or_default(),
            numero: self.numero().parse().unwrap_or_default(),
            tp_emis: self.tp_emis().parse().unwrap_or_default(),
            codigo: self.codigo().parse().unwrap_or_default(),
        }
    }

    pub fn has_valid_check_digit(&self) -> bool {
        modulo11(&self.0[..43]) == self.dv()
    }
}

/// Modulo-11 check digit with weights 2..=9 cycling from the right.
pub fn modulo11(digits: &str) -> u8 {
    let sum: u32 = digits
        .bytes()
        .rev()
        .zip((2..=9).cycle())
        .map(|(b, w)| u32::from(b - b'0') * w)
        .sum();
    match sum % 11 {
        0 | 1 => 0,
        r => (11 - r) as u8,
    }
}

impl fmt::Display for ChaveAcesso {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ChaveAcesso {
    type Err = EdocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ChaveAcesso {
    type Error = EdocError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ChaveAcesso> for String {
    fn from(chave: ChaveAcesso) -> Self {
        chave.0
    }
}
