use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::EdocError;

/// Offset of Brasília time (UTC-03:00) in seconds west of UTC.
pub const BRASILIA_OFFSET_SECS: i32 = 3 * 3600;

/// Tax-authority environment (`tpAmb`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ambiente {
    /// Production, documents have legal effect.
    Producao,
    /// Homologation (test) environment.
    Homologacao,
}

impl Ambiente {
    /// The `tpAmb` code as transmitted: `"1"` or `"2"`.
    pub fn tp_amb(&self) -> &'static str {
        match self {
            Self::Producao => "1",
            Self::Homologacao => "2",
        }
    }

    pub fn from_tp_amb(code: &str) -> Option<Self> {
        match code.trim() {
            "1" => Some(Self::Producao),
            "2" => Some(Self::Homologacao),
            _ => None,
        }
    }
}

/// Federative unit, plus the national environment `AN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Uf {
    AC,
    AL,
    AM,
    AP,
    BA,
    CE,
    DF,
    ES,
    GO,
    MA,
    MG,
    MS,
    MT,
    PA,
    PB,
    PE,
    PI,
    PR,
    RJ,
    RN,
    RO,
    RR,
    RS,
    SC,
    SE,
    SP,
    TO,
    /// Ambiente Nacional.
    AN,
}

/// (unit, IBGE code, sigla).
static UF_CODES: &[(Uf, u8, &str)] = &[
    (Uf::RO, 11, "RO"),
    (Uf::AC, 12, "AC"),
    (Uf::AM, 13, "AM"),
    (Uf::RR, 14, "RR"),
    (Uf::PA, 15, "PA"),
    (Uf::AP, 16, "AP"),
    (Uf::TO, 17, "TO"),
    (Uf::MA, 21, "MA"),
    (Uf::PI, 22, "PI"),
    (Uf::CE, 23, "CE"),
    (Uf::RN, 24, "RN"),
    (Uf::PB, 25, "PB"),
    (Uf::PE, 26, "PE"),
    (Uf::AL, 27, "AL"),
    (Uf::SE, 28, "SE"),
    (Uf::BA, 29, "BA"),
    (Uf::MG, 31, "MG"),
    (Uf::ES, 32, "ES"),
    (Uf::RJ, 33, "RJ"),
    (Uf::SP, 35, "SP"),
    (Uf::PR, 41, "PR"),
    (Uf::SC, 42, "SC"),
    (Uf::RS, 43, "RS"),
    (Uf::MS, 50, "MS"),
    (Uf::MT, 51, "MT"),
    (Uf::GO, 52, "GO"),
    (Uf::DF, 53, "DF"),
    (Uf::AN, 91, "AN"),
];

impl Uf {
    /// IBGE numeric code (`cUF`).
    pub fn codigo(&self) -> u8 {
        self.entry().1
    }

    pub fn sigla(&self) -> &'static str {
        self.entry().2
    }

    pub fn from_codigo(codigo: u8) -> Option<Self> {
        UF_CODES
            .iter()
            .find(|(_, c, _)| *c == codigo)
            .map(|(uf, _, _)| *uf)
    }

    /// Every unit in IBGE code order.
    pub fn all() -> impl Iterator<Item = Uf> {
        UF_CODES.iter().map(|(uf, _, _)| *uf)
    }

    fn entry(&self) -> &'static (Uf, u8, &'static str) {
        // UF_CODES has one row per variant
        let idx = UF_CODES
            .iter()
            .position(|(uf, _, _)| uf == self)
            .unwrap_or(UF_CODES.len() - 1);
        &UF_CODES[idx]
    }
}

impl fmt::Display for Uf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sigla())
    }
}

impl FromStr for Uf {
    type Err = EdocError;

    /// Accepts either the sigla (`"SP"`) or the IBGE code (`"35"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Uf::from_codigo(code)
                .ok_or_else(|| EdocError::Config(format!("unknown UF code: {s}")));
        }
        let upper = s.to_ascii_uppercase();
        UF_CODES
            .iter()
            .find(|(_, _, sigla)| *sigla == upper)
            .map(|(uf, _, _)| *uf)
            .ok_or_else(|| EdocError::Config(format!("unknown UF: {s}")))
    }
}

/// Identifier of a fiscal document: a three-character type discriminator
/// (`NFe`, `CTe`, `MDF`...) and the remainder of the element `Id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentKey {
    kind: String,
    key: String,
}

impl DocumentKey {
    pub fn new(kind: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            key: key.into(),
        }
    }

    /// Split an element `Id` attribute such as `NFe3519...` into its parts.
    ///
    /// Returns `None` when the id has no content after the discriminator.
    pub fn from_element_id(id: &str) -> Option<Self> {
        let id = id.trim();
        if id.len() <= 3 || !id.is_char_boundary(3) {
            return None;
        }
        Some(Self::new(&id[..3], &id[3..]))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.key)
    }
}

/// Current time at the Brasília offset, as stamped on events.
pub fn brasilia_now() -> DateTime<FixedOffset> {
    let now = Utc::now();
    match FixedOffset::west_opt(BRASILIA_OFFSET_SECS) {
        Some(tz) => now.with_timezone(&tz),
        None => now.fixed_offset(),
    }
}

/// `AAAA-MM-DDThh:mm:ss-03:00`, the timestamp format every schema uses.
pub fn format_dh(dt: &DateTime<FixedOffset>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}
