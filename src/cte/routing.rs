//! CT-e 4.00 endpoints. MG, MS, MT and PR run their own authority; AP,
//! PE, RR and SP use SVSP; every other state uses SVRS.

use crate::core::{Ambiente, EdocError, Uf};

/// CT-e web services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CteService {
    StatusServico,
    Consulta,
    /// Synchronous reception of model 57.
    RecepcaoSinc,
    /// Synchronous reception of CT-e OS (model 67).
    RecepcaoOs,
    /// Synchronous reception of GTV-e (model 64).
    RecepcaoGtve,
    RecepcaoEvento,
}

impl CteService {
    pub const ALL: [CteService; 6] = [
        Self::StatusServico,
        Self::Consulta,
        Self::RecepcaoSinc,
        Self::RecepcaoOs,
        Self::RecepcaoGtve,
        Self::RecepcaoEvento,
    ];

    pub fn webservice(&self) -> &'static str {
        match self {
            Self::StatusServico => "CTeStatusServicoV4",
            Self::Consulta => "CTeConsultaV4",
            Self::RecepcaoSinc => "CTeRecepcaoSincV4",
            Self::RecepcaoOs => "CTeRecepcaoOSV4",
            Self::RecepcaoGtve => "CTeRecepcaoGTVeV4",
            Self::RecepcaoEvento => "CTeRecepcaoEventoV4",
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::StatusServico => "cteStatusServicoCT",
            Self::Consulta => "cteConsultaCT",
            Self::RecepcaoSinc => "cteRecepcao",
            Self::RecepcaoOs => "cteRecepcaoOS",
            Self::RecepcaoGtve => "cteRecepcaoGTVe",
            Self::RecepcaoEvento => "cteRecepcaoEvento",
        }
    }

    pub fn namespace(&self) -> String {
        format!("http://www.portalfiscal.inf.br/cte/wsdl/{}", self.webservice())
    }
}

type Urls = &'static [(CteService, &'static str)];

struct Autorizador {
    name: &'static str,
    producao: Urls,
    homologacao: Urls,
}

use CteService::*;

#[rustfmt::skip]
static SVSP: Autorizador = Autorizador {
    name: "SVSP",
    producao: &[
        (Consulta, "https://nfe.fazenda.sp.gov.br/CTeWS/WS/CTeConsultaV4.asmx?wsdl"),
        (RecepcaoEvento, "https://nfe.fazenda.sp.gov.br/CTeWS/WS/CTeRecepcaoEventoV4.asmx?wsdl"),
        (RecepcaoGtve, "https://nfe.fazenda.sp.gov.br/CTeWS/WS/CTeRecepcaoGTVeV4.asmx?wsdl"),
        (RecepcaoOs, "https://nfe.fazenda.sp.gov.br/CTeWS/WS/CTeRecepcaoOSV4.asmx?wsdl"),
        (RecepcaoSinc, "https://nfe.fazenda.sp.gov.br/CTeWS/WS/CTeRecepcaoSincV4.asmx?wsdl"),
        (StatusServico, "https://nfe.fazenda.sp.gov.br/CTeWS/WS/CTeStatusServicoV4.asmx?wsdl"),
    ],
    homologacao: &[
        (Consulta, "https://homologacao.nfe.fazenda.sp.gov.br/CTeWS/WS/CTeConsultaV4.asmx?wsdl"),
        (RecepcaoEvento, "https://homologacao.nfe.fazenda.sp.gov.br/CTeWS/WS/CTeRecepcaoEventoV4.asmx?wsdl"),
        (RecepcaoGtve, "https://homologacao.nfe.fazenda.sp.gov.br/CTeWS/WS/CTeRecepcaoGTVeV4.asmx?wsdl"),
        (RecepcaoOs, "https://homologacao.nfe.fazenda.sp.gov.br/CTeWS/WS/CTeRecepcaoOSV4.asmx?wsdl"),
        (RecepcaoSinc, "https://homologacao.nfe.fazenda.sp.gov.br/CTeWS/WS/CTeRecepcaoSincV4.asmx?wsdl"),
        (StatusServico, "https://homologacao.nfe.fazenda.sp.gov.br/CTeWS/WS/CTeStatusServicoV4.asmx?wsdl"),
    ],
};

#[rustfmt::skip]
static SVRS: Autorizador = Autorizador {
    name: "SVRS",
    producao: &[
        (StatusServico, "https://cte.svrs.rs.gov.br/ws/CTeStatusServicoV4/CTeStatusServicoV4.asmx?wsdl"),
        (Consulta, "https://cte.svrs.rs.gov.br/ws/CTeConsultaV4/CTeConsultaV4.asmx?wsdl"),
        (RecepcaoSinc, "https://cte.svrs.rs.gov.br/ws/CTeRecepcaoSincV4/CTeRecepcaoSincV4.asmx?wsdl"),
        (RecepcaoOs, "https://cte.svrs.rs.gov.br/ws/CTeRecepcaoOSV4/CTeRecepcaoOSV4.asmx?wsdl"),
        (RecepcaoGtve, "https://cte.svrs.rs.gov.br/ws/CTeRecepcaoGTVeV4/CTeRecepcaoGTVeV4.asmx?wsdl"),
        (RecepcaoEvento, "https://cte.svrs.rs.gov.br/ws/CTeRecepcaoEventoV4/CTeRecepcaoEventoV4.asmx?wsdl"),
    ],
    homologacao: &[
        (StatusServico, "https://cte-homologacao.svrs.rs.gov.br/ws/CTeStatusServicoV4/CTeStatusServicoV4.asmx?wsdl"),
        (Consulta, "https://cte-homologacao.svrs.rs.gov.br/ws/CTeConsultaV4/CTeConsultaV4.asmx?wsdl"),
        (RecepcaoSinc, "https://cte-homologacao.svrs.rs.gov.br/ws/CTeRecepcaoSincV4/CTeRecepcaoSincV4.asmx?wsdl"),
        (RecepcaoOs, "https://cte-homologacao.svrs.rs.gov.br/ws/CTeRecepcaoOSV4/CTeRecepcaoOSV4.asmx?wsdl"),
        (RecepcaoGtve, "https://cte-homologacao.svrs.rs.gov.br/ws/CTeRecepcaoGTVeV4/CTeRecepcaoGTVeV4.asmx?wsdl"),
        (RecepcaoEvento, "https://cte-homologacao.svrs.rs.gov.br/ws/CTeRecepcaoEventoV4/CTeRecepcaoEventoV4.asmx?wsdl"),
    ],
};

#[rustfmt::skip]
static MT: Autorizador = Autorizador {
    name: "MT",
    producao: &[
        (Consulta, "https://cte.sefaz.mt.gov.br/ctews2/services/CTeConsultaV4?wsdl"),
        (RecepcaoEvento, "https://cte.sefaz.mt.gov.br/ctews2/services/CTeRecepcaoEventoV4?wsdl"),
        (StatusServico, "https://cte.sefaz.mt.gov.br/ctews2/services/CTeStatusServicoV4?wsdl"),
        (RecepcaoSinc, "https://cte.sefaz.mt.gov.br/ctews2/services/CTeRecepcaoSincV4?wsdl"),
        (RecepcaoGtve, "https://cte.sefaz.mt.gov.br/ctews2/services/CTeRecepcaoGTVeV4?wsdl"),
        (RecepcaoOs, "https://cte.sefaz.mt.gov.br/ctews/services/CTeRecepcaoOSV4?wsdl"),
    ],
    homologacao: &[
        (StatusServico, "https://homologacao.sefaz.mt.gov.br/ctews2/services/CTeStatusServicoV4?wsdl"),
        (Consulta, "https://homologacao.sefaz.mt.gov.br/ctews2/services/CTeConsultaV4?wsdl"),
        (RecepcaoSinc, "https://homologacao.sefaz.mt.gov.br/ctews2/services/CTeRecepcaoSincV4?wsdl"),
        (RecepcaoGtve, "https://homologacao.sefaz.mt.gov.br/ctews2/services/CTeRecepcaoGTVeV4?wsdl"),
        (RecepcaoEvento, "https://homologacao.sefaz.mt.gov.br/ctews2/services/CTeRecepcaoEventoV4?wsdl"),
        (RecepcaoOs, "https://homologacao.sefaz.mt.gov.br/ctews/services/CTeRecepcaoOSV4?wsdl"),
    ],
};

static MS: Autorizador = Autorizador {
    name: "MS",
    producao: &[
        (RecepcaoSinc, "https://producao.cte.ms.gov.br/ws/CTeRecepcaoSincV4?wsdl"),
        (StatusServico, "https://producao.cte.ms.gov.br/ws/CTeStatusServicoV4?wsdl"),
        (Consulta, "https://producao.cte.ms.gov.br/ws/CTeConsultaV4?wsdl"),
        (RecepcaoEvento, "https://producao.cte.ms.gov.br/ws/CTeRecepcaoEventoV4?wsdl"),
        (RecepcaoOs, "https://producao.cte.ms.gov.br/ws/CTeRecepcaoOSV4?wsdl"),
        (RecepcaoGtve, "https://producao.cte.ms.gov.br/ws/CTeRecepcaoGTVeV4?wsdl"),
    ],
    homologacao: &[
        (StatusServico, "https://homologacao.cte.ms.gov.br/ws/CTeStatusServicoV4?wsdl"),
        (RecepcaoEvento, "https://homologacao.cte.ms.gov.br/ws/CTeRecepcaoEventoV4?wsdl"),
        (Consulta, "https://homologacao.cte.ms.gov.br/ws/CTeConsultaV4?wsdl"),
        (RecepcaoSinc, "https://homologacao.cte.ms.gov.br/ws/CTeRecepcaoSincV4?wsdl"),
    ],
};

static MG: Autorizador = Autorizador {
    name: "MG",
    producao: &[
        (RecepcaoSinc, "https://cte.fazenda.mg.gov.br/cte/services/CTeRecepcaoSincV4?wsdl"),
        (RecepcaoGtve, "https://cte.fazenda.mg.gov.br/cte/services/CTeRecepcaoGTVeV4?wsdl"),
        (RecepcaoOs, "https://cte.fazenda.mg.gov.br/cte/services/CTeRecepcaoOSV4?wsdl"),
        (Consulta, "https://cte.fazenda.mg.gov.br/cte/services/CTeConsultaV4?wsdl"),
        (StatusServico, "https://cte.fazenda.mg.gov.br/cte/services/CTeStatusServicoV4?wsdl"),
        (RecepcaoEvento, "https://cte.fazenda.mg.gov.br/cte/services/CTeRecepcaoEventoV4?wsdl"),
    ],
    homologacao: &[
        (RecepcaoSinc, "https://hcte.fazenda.mg.gov.br/cte/services/CTeRecepcaoSincV4?wsdl"),
        (RecepcaoOs, "https://hcte.fazenda.mg.gov.br/cte/services/CTeRecepcaoOSV4?wsdl"),
        (RecepcaoGtve, "https://hcte.fazenda.mg.gov.br/cte/services/CTeRecepcaoGTVeV4?wsdl"),
        (Consulta, "https://hcte.fazenda.mg.gov.br/cte/services/CTeConsultaV4?wsdl"),
        (StatusServico, "https://hcte.fazenda.mg.gov.br/cte/services/CTeStatusServicoV4?wsdl"),
        (RecepcaoEvento, "https://hcte.fazenda.mg.gov.br/cte/services/CTeRecepcaoEventoV4?wsdl"),
    ],
};

static PR: Autorizador = Autorizador {
    name: "PR",
    producao: &[
        (RecepcaoSinc, "https://cte.fazenda.pr.gov.br/cte4/CTeRecepcaoSincV4?wsdl"),
        (RecepcaoGtve, "https://cte.fazenda.pr.gov.br/cte4/CTeRecepcaoGTVeV4?wsdl"),
        (RecepcaoOs, "https://cte.fazenda.pr.gov.br/cte4/CTeRecepcaoOSV4?wsdl"),
        (Consulta, "https://cte.fazenda.pr.gov.br/cte4/CTeConsultaV4?wsdl"),
        (StatusServico, "https://cte.fazenda.pr.gov.br/cte4/CTeStatusServicoV4?wsdl"),
        (RecepcaoEvento, "https://cte.fazenda.pr.gov.br/cte4/CTeRecepcaoEventoV4?wsdl"),
    ],
    homologacao: &[
        (Consulta, "https://homologacao.cte.fazenda.pr.gov.br/cte4/CTeConsultaV4?wsdl"),
        (StatusServico, "https://homologacao.cte.fazenda.pr.gov.br/cte4/CTeStatusServicoV4?wsdl"),
        (RecepcaoSinc, "https://homologacao.cte.fazenda.pr.gov.br/cte4/CTeRecepcaoSincV4?wsdl"),
        (RecepcaoEvento, "https://homologacao.cte.fazenda.pr.gov.br/cte4/CTeRecepcaoEventoV4?wsdl"),
        (RecepcaoGtve, "https://homologacao.cte.fazenda.pr.gov.br/cte4/CTeRecepcaoGTVeV4?wsdl"),
        (RecepcaoOs, "https://homologacao.cte.fazenda.pr.gov.br/cte4/CTeRecepcaoOSV4?wsdl"),
    ],
};

fn autorizador(uf: Uf) -> Option<&'static Autorizador> {
    match uf {
        Uf::MG => Some(&MG),
        Uf::MS => Some(&MS),
        Uf::MT => Some(&MT),
        Uf::PR => Some(&PR),
        Uf::AP | Uf::PE | Uf::RR | Uf::SP => Some(&SVSP),
        Uf::AN => None,
        _ => Some(&SVRS),
    }
}

/// Name of the authority serving `uf`.
pub fn autorizador_cte(uf: Uf) -> Option<&'static str> {
    autorizador(uf).map(|a| a.name)
}

/// Endpoint for `service` in `uf`.
pub fn locate_url(service: CteService, uf: Uf, ambiente: Ambiente) -> Result<String, EdocError> {
    let aut = autorizador(uf)
        .ok_or_else(|| EdocError::Config(format!("no CT-e authority for {uf}")))?;
    let urls = match ambiente {
        Ambiente::Producao => aut.producao,
        Ambiente::Homologacao => aut.homologacao,
    };
    urls.iter()
        .find(|(s, _)| *s == service)
        .map(|(_, url)| url.to_string())
        .ok_or_else(|| {
            EdocError::Config(format!(
                "{} is not offered by {} ({ambiente:?})",
                service.webservice(),
                aut.name
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_map_to_authorities() {
        assert_eq!(autorizador_cte(Uf::SP), Some("SVSP"));
        assert_eq!(autorizador_cte(Uf::PE), Some("SVSP"));
        assert_eq!(autorizador_cte(Uf::BA), Some("SVRS"));
        assert_eq!(autorizador_cte(Uf::RS), Some("SVRS"));
        assert_eq!(autorizador_cte(Uf::MG), Some("MG"));
        assert_eq!(autorizador_cte(Uf::AN), None);
    }

    #[test]
    fn synchronous_reception_url() {
        assert_eq!(
            locate_url(RecepcaoSinc, Uf::PR, Ambiente::Producao).unwrap(),
            "https://cte.fazenda.pr.gov.br/cte4/CTeRecepcaoSincV4?wsdl"
        );
        assert_eq!(
            locate_url(StatusServico, Uf::GO, Ambiente::Homologacao).unwrap(),
            "https://cte-homologacao.svrs.rs.gov.br/ws/CTeStatusServicoV4/CTeStatusServicoV4.asmx?wsdl"
        );
    }

    #[test]
    fn missing_homologation_service_is_config_error() {
        assert!(matches!(
            locate_url(RecepcaoOs, Uf::MS, Ambiente::Homologacao),
            Err(EdocError::Config(_))
        ));
        assert!(locate_url(RecepcaoOs, Uf::MS, Ambiente::Producao).is_ok());
    }

    #[test]
    fn every_state_has_core_services() {
        for uf in Uf::all().filter(|u| *u != Uf::AN) {
            for service in [StatusServico, Consulta, RecepcaoSinc, RecepcaoEvento] {
                for amb in [Ambiente::Producao, Ambiente::Homologacao] {
                    assert!(locate_url(service, uf, amb).is_ok(), "{uf} {service:?}");
                }
            }
        }
    }
}
