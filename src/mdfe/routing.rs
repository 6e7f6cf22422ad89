//! MDF-e 3.00 endpoints. Every state is served by SVRS.

use crate::core::{Ambiente, EdocError, Uf};

/// MDF-e web services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MdfeService {
    StatusServico,
    Consulta,
    /// Manifests still open for an issuer.
    ConsultaNaoEncerrados,
    Distribuicao,
    RecepcaoSinc,
    RetRecepcao,
    RecepcaoEvento,
}

impl MdfeService {
    pub const ALL: [MdfeService; 7] = [
        Self::StatusServico,
        Self::Consulta,
        Self::ConsultaNaoEncerrados,
        Self::Distribuicao,
        Self::RecepcaoSinc,
        Self::RetRecepcao,
        Self::RecepcaoEvento,
    ];

    pub fn webservice(&self) -> &'static str {
        match self {
            Self::StatusServico => "MDFeStatusServico",
            Self::Consulta => "MDFeConsulta",
            Self::ConsultaNaoEncerrados => "MDFeConsNaoEnc",
            Self::Distribuicao => "MDFeDistribuicaoDFe",
            Self::RecepcaoSinc => "MDFeRecepcaoSinc",
            Self::RetRecepcao => "MDFeRetRecepcao",
            Self::RecepcaoEvento => "MDFeRecepcaoEvento",
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::StatusServico => "mdfeStatusServicoMDF",
            Self::Consulta => "mdfeConsultaMDF",
            Self::ConsultaNaoEncerrados => "mdfeConsNaoEnc",
            Self::Distribuicao => "mdfeDistDFeInteresse",
            Self::RecepcaoSinc => "mdfeRecepcao",
            Self::RetRecepcao => "mdfeRetRecepcao",
            Self::RecepcaoEvento => "mdfeRecepcaoEvento",
        }
    }

    pub fn namespace(&self) -> String {
        format!("http://www.portalfiscal.inf.br/mdfe/wsdl/{}", self.webservice())
    }
}

const SVRS_PRODUCAO: &str = "mdfe.svrs.rs.gov.br";
const SVRS_HOMOLOGACAO: &str = "mdfe-homologacao.svrs.rs.gov.br";

const QRCODE: &str = "https://dfe-portal.svrs.rs.gov.br/mdfe/qrCode";

fn servidor(uf: Uf, ambiente: Ambiente) -> Result<&'static str, EdocError> {
    if uf == Uf::AN {
        return Err(EdocError::Config("no MDF-e authority for AN".into()));
    }
    Ok(match ambiente {
        Ambiente::Producao => SVRS_PRODUCAO,
        Ambiente::Homologacao => SVRS_HOMOLOGACAO,
    })
}

/// Endpoint for `service` in `uf`.
pub fn locate_url(service: MdfeService, uf: Uf, ambiente: Ambiente) -> Result<String, EdocError> {
    let host = servidor(uf, ambiente)?;
    let ws = service.webservice();
    Ok(format!("https://{host}/ws/{ws}/{ws}.asmx?wsdl"))
}

/// Public page that validates an MDF-e QR code. Same for both environments.
pub fn url_qrcode(uf: Uf, ambiente: Ambiente) -> Result<&'static str, EdocError> {
    servidor(uf, ambiente).map(|_| QRCODE)
}
