use std::fmt;

use crate::core::EdocError;

use super::barueri::Barueri;
use super::ginfes::Ginfes;
use super::issnet::Issnet;
use super::paulistana::Paulistana;
use super::provedor::Provedor;

/// Provider families known to serve some municipality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvedorNfse {
    Barueri,
    /// Only the RPS key is supported; see [`ChaveNfseDsf`](super::ChaveNfseDsf).
    Dsf,
    Ginfes,
    Issnet,
    Paulistana,
}

impl fmt::Display for ProvedorNfse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Barueri => "Barueri",
            Self::Dsf => "DSF",
            Self::Ginfes => "GINFES",
            Self::Issnet => "ISSNet",
            Self::Paulistana => "Paulistana",
        })
    }
}

/// IBGE city code to provider.
static CIDADES: &[(u32, ProvedorNfse, &str)] = &[
    (1501402, ProvedorNfse::Dsf, "Belém - PA"),
    (2211001, ProvedorNfse::Dsf, "Teresina - PI"),
    (3132404, ProvedorNfse::Ginfes, "Itajubá - MG"),
    (3516200, ProvedorNfse::Ginfes, "Franca - SP"),
    (3170206, ProvedorNfse::Dsf, "Uberlândia - MG"),
    (3303500, ProvedorNfse::Dsf, "Nova Iguaçu - RJ"),
    (3509502, ProvedorNfse::Dsf, "Campinas - SP"),
    (5002704, ProvedorNfse::Dsf, "Campo Grande - MS"),
    (3505708, ProvedorNfse::Barueri, "Barueri - SP"),
    (3550308, ProvedorNfse::Paulistana, "São Paulo - SP"),
    (3543402, ProvedorNfse::Issnet, "Ribeirão Preto - SP"),
    (3301702, ProvedorNfse::Issnet, "Duque de Caxias - RJ"),
];

pub fn provedor_da_cidade(cidade: u32) -> Option<ProvedorNfse> {
    CIDADES
        .iter()
        .find(|(c, _, _)| *c == cidade)
        .map(|(_, p, _)| *p)
}

/// Municipality name as listed in the provider table.
pub fn nome_da_cidade(cidade: u32) -> Option<&'static str> {
    CIDADES
        .iter()
        .find(|(c, _, _)| *c == cidade)
        .map(|(_, _, n)| *n)
}

/// The provider implementation serving `cidade`.
pub fn provedor(cidade: u32) -> Result<Box<dyn Provedor>, EdocError> {
    match provedor_da_cidade(cidade) {
        Some(ProvedorNfse::Barueri) => Ok(Box::new(Barueri)),
        Some(ProvedorNfse::Ginfes) => Ok(Box::new(Ginfes)),
        Some(ProvedorNfse::Issnet) => Ok(Box::new(Issnet)),
        Some(ProvedorNfse::Paulistana) => Ok(Box::new(Paulistana)),
        Some(ProvedorNfse::Dsf) => Err(EdocError::Unsupported("DSF web services")),
        None => Err(EdocError::Config(format!("no NFS-e provider for city {cidade}"))),
    }
}
