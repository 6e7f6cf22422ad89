//! SEFAZ web service routing for NF-e (model 55) and NFC-e (model 65).
//!
//! Each state is served either by its own authority or by a shared virtual
//! one (SVRS, SVAN). Distribution always goes to the national environment.

use crate::core::{Ambiente, EdocError, Uf};

/// NF-e web services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NfeService {
    Inutilizacao,
    ConsultaProtocolo,
    StatusServico,
    RecepcaoEvento,
    Autorizacao,
    RetAutorizacao,
    ConsultaCadastro,
    DistribuicaoDfe,
}

impl NfeService {
    pub const ALL: [NfeService; 8] = [
        Self::Inutilizacao,
        Self::ConsultaProtocolo,
        Self::StatusServico,
        Self::RecepcaoEvento,
        Self::Autorizacao,
        Self::RetAutorizacao,
        Self::ConsultaCadastro,
        Self::DistribuicaoDfe,
    ];

    /// WSDL service name, the last segment of the service namespace.
    pub fn webservice(&self) -> &'static str {
        match self {
            Self::Inutilizacao => "NFeInutilizacao4",
            Self::ConsultaProtocolo => "NFeConsultaProtocolo4",
            Self::StatusServico => "NFeStatusServico4",
            Self::RecepcaoEvento => "NFeRecepcaoEvento4",
            Self::Autorizacao => "NFeAutorizacao4",
            Self::RetAutorizacao => "NFeRetAutorizacao4",
            Self::ConsultaCadastro => "CadConsultaCadastro4",
            Self::DistribuicaoDfe => "NFeDistribuicaoDFe",
        }
    }

    /// SOAP operation name.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Inutilizacao => "nfeInutilizacaoNF",
            Self::ConsultaProtocolo => "nfeConsultaNF",
            Self::StatusServico => "nfeStatusServicoNF",
            Self::RecepcaoEvento => "nfeRecepcaoEvento",
            Self::Autorizacao => "nfeAutorizacaoLote",
            Self::RetAutorizacao => "nfeRetAutorizacaoLote",
            Self::ConsultaCadastro => "consultaCadastro",
            Self::DistribuicaoDfe => "nfeDistDfeInteresse",
        }
    }

    /// `http://www.portalfiscal.inf.br/nfe/wsdl/<webservice>`
    pub fn namespace(&self) -> String {
        format!("http://www.portalfiscal.inf.br/nfe/wsdl/{}", self.webservice())
    }
}

/// Document model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Modelo {
    /// NF-e, model 55.
    Nfe,
    /// NFC-e, model 65.
    Nfce,
}

impl Modelo {
    pub fn codigo(&self) -> &'static str {
        match self {
            Self::Nfe => "55",
            Self::Nfce => "65",
        }
    }
}

type Paths = &'static [(NfeService, &'static str)];

struct Hosts {
    producao: &'static str,
    homologacao: &'static str,
    paths: Paths,
}

impl Hosts {
    fn host(&self, ambiente: Ambiente) -> &'static str {
        match ambiente {
            Ambiente::Producao => self.producao,
            Ambiente::Homologacao => self.homologacao,
        }
    }

    fn path(&self, service: NfeService) -> Option<&'static str> {
        self.paths
            .iter()
            .find(|(s, _)| *s == service)
            .map(|(_, p)| *p)
    }
}

/// An authority and its hosts; `nfce` is `None` when both models share the
/// same endpoints.
struct Autorizador {
    name: &'static str,
    nfe: Hosts,
    nfce: Option<Hosts>,
}

use NfeService::*;

// ---------------------------------------------------------------------------
// Path tables
// ---------------------------------------------------------------------------

static SVRS_PATHS: Paths = &[
    (Inutilizacao, "ws/nfeinutilizacao/nfeinutilizacao4.asmx?wsdl"),
    (ConsultaProtocolo, "ws/NfeConsulta/NfeConsulta4.asmx?wsdl"),
    (StatusServico, "ws/NfeStatusServico/NfeStatusServico4.asmx?wsdl"),
    (RecepcaoEvento, "ws/recepcaoevento/recepcaoevento4.asmx?wsdl"),
    (Autorizacao, "ws/NfeAutorizacao/NFeAutorizacao4.asmx?wsdl"),
    (RetAutorizacao, "ws/NfeRetAutorizacao/NFeRetAutorizacao4.asmx?wsdl"),
    (ConsultaCadastro, "ws/cadconsultacadastro/cadconsultacadastro4.asmx?wsdl"),
];

static SVRS_NFCE_PATHS: Paths = &[
    (Inutilizacao, "ws/nfeinutilizacao/nfeinutilizacao4.asmx?wsdl"),
    (ConsultaProtocolo, "ws/NfeConsulta/NfeConsulta4.asmx?wsdl"),
    (StatusServico, "ws/NfeStatusServico/NfeStatusServico4.asmx?wsdl"),
    (RecepcaoEvento, "ws/recepcaoevento/recepcaoevento4.asmx?wsdl"),
    (Autorizacao, "ws/NfeAutorizacao/NFeAutorizacao4.asmx?wsdl"),
    (RetAutorizacao, "ws/NfeRetAutorizacao/NFeRetAutorizacao4.asmx?wsdl"),
];

static SVAN_PATHS: Paths = &[
    (Inutilizacao, "NFeInutilizacao4/NFeInutilizacao4.asmx?wsdl"),
    (ConsultaProtocolo, "NFeConsultaProtocolo4/NFeConsultaProtocolo4.asmx?wsdl"),
    (StatusServico, "NFeStatusServico4/NFeStatusServico4.asmx?wsdl"),
    (RecepcaoEvento, "NFeRecepcaoEvento4/NFeRecepcaoEvento4.asmx?wsdl"),
    (Autorizacao, "NFeAutorizacao4/NFeAutorizacao4.asmx?wsdl"),
    (RetAutorizacao, "NFeRetAutorizacao4/NFeRetAutorizacao4.asmx?wsdl"),
];

static SVC_AN_PATHS: Paths = &[
    (ConsultaProtocolo, "NFeConsultaProtocolo4/NFeConsultaProtocolo4.asmx?wsdl"),
    (StatusServico, "NFeStatusServico4/NFeStatusServico4.asmx?wsdl"),
    (RecepcaoEvento, "NFeRecepcaoEvento4/NFeRecepcaoEvento4.asmx?wsdl"),
    (Autorizacao, "NFeAutorizacao4/NFeAutorizacao4.asmx?wsdl"),
    (RetAutorizacao, "NFeRetAutorizacao4/NFeRetAutorizacao4.asmx?wsdl"),
];

static SVC_RS_PATHS: Paths = &[
    (ConsultaProtocolo, "ws/NfeConsulta/NfeConsulta4.asmx?wsdl"),
    (StatusServico, "ws/NfeStatusServico/NfeStatusServico4.asmx?wsdl"),
    (RecepcaoEvento, "ws/recepcaoevento/recepcaoevento4.asmx?wsdl"),
    (Autorizacao, "ws/NfeAutorizacao/NFeAutorizacao4.asmx?wsdl"),
    (RetAutorizacao, "ws/NfeRetAutorizacao/NFeRetAutorizacao4.asmx?wsdl"),
];

static AN_PATHS: Paths = &[
    (DistribuicaoDfe, "NFeDistribuicaoDFe/NFeDistribuicaoDFe.asmx?wsdl"),
    (RecepcaoEvento, "NFeRecepcaoEvento4/NFeRecepcaoEvento4.asmx?wsdl"),
];

static AM_PATHS: Paths = &[
    (Inutilizacao, "services2/services/NfeInutilizacao4?wsdl"),
    (ConsultaProtocolo, "services2/services/NfeConsulta4?wsdl"),
    (StatusServico, "services2/services/NfeStatusServico4?wsdl"),
    (RecepcaoEvento, "services2/services/RecepcaoEvento4?wsdl"),
    (Autorizacao, "services2/services/NfeAutorizacao4?wsdl"),
    (RetAutorizacao, "services2/services/NfeRetAutorizacao4?wsdl"),
    (ConsultaCadastro, "services2/services/cadconsultacadastro2?wsdl"),
];

static AM_NFCE_PATHS: Paths = &[
    (Inutilizacao, "nfce-services/services/NfeInutilizacao4?wsdl"),
    (ConsultaProtocolo, "nfce-services/services/NfeConsulta4?wsdl"),
    (StatusServico, "nfce-services/services/NfeStatusServico4?wsdl"),
    (RecepcaoEvento, "nfce-services/services/RecepcaoEvento4?wsdl"),
    (Autorizacao, "nfce-services/services/NfeAutorizacao4?wsdl"),
    (RetAutorizacao, "nfce-services/services/NfeRetAutorizacao4?wsdl"),
];

static BA_PATHS: Paths = &[
    (Inutilizacao, "webservices/NFeInutilizacao4/NFeInutilizacao4.asmx?wsdl"),
    (ConsultaProtocolo, "webservices/NFeConsultaProtocolo4/NFeConsultaProtocolo4.asmx?wsdl"),
    (StatusServico, "webservices/NFeStatusServico4/NFeStatusServico4.asmx?wsdl"),
    (RecepcaoEvento, "webservices/NFeRecepcaoEvento4/NFeRecepcaoEvento4.asmx?wsdl"),
    (Autorizacao, "webservices/NFeAutorizacao4/NFeAutorizacao4.asmx?wsdl"),
    (RetAutorizacao, "webservices/NFeRetAutorizacao4/NFeRetAutorizacao4.asmx?wsdl"),
    (ConsultaCadastro, "webservices/CadConsultaCadastro4/CadConsultaCadastro4.asmx?wsdl"),
];

static CE_PATHS: Paths = &[
    (Inutilizacao, "nfe4/services/NFeInutilizacao4?wsdl"),
    (ConsultaProtocolo, "nfe4/services/NFeConsultaProtocolo4?wsdl"),
    (StatusServico, "nfe4/services/NFeStatusServico4?wsdl"),
    (RecepcaoEvento, "nfe4/services/NFeRecepcaoEvento4?wsdl"),
    (Autorizacao, "nfe4/services/NFeAutorizacao4?wsdl"),
    (RetAutorizacao, "nfe4/services/NFeRetAutorizacao4?wsdl"),
    (ConsultaCadastro, "nfe4/services/CadConsultaCadastro4?wsdl"),
];

static GO_PATHS: Paths = &[
    (Inutilizacao, "nfe/services/NFeInutilizacao4?wsdl"),
    (ConsultaProtocolo, "nfe/services/NFeConsultaProtocolo4?wsdl"),
    (StatusServico, "nfe/services/NFeStatusServico4?wsdl"),
    (RecepcaoEvento, "nfe/services/NFeRecepcaoEvento4?wsdl"),
    (Autorizacao, "nfe/services/NFeAutorizacao4?wsdl"),
    (RetAutorizacao, "nfe/services/NFeRetAutorizacao4?wsdl"),
    (ConsultaCadastro, "nfe/services/CadConsultaCadastro4?wsdl"),
];

static MT_PATHS: Paths = &[
    (Inutilizacao, "nfews/v2/services/NfeInutilizacao4?wsdl"),
    (ConsultaProtocolo, "nfews/v2/services/NfeConsulta4?wsdl"),
    (StatusServico, "nfews/v2/services/NfeStatusServico4?wsdl"),
    (RecepcaoEvento, "nfews/v2/services/RecepcaoEvento4?wsdl"),
    (Autorizacao, "nfews/v2/services/NfeAutorizacao4?wsdl"),
    (RetAutorizacao, "nfews/v2/services/NfeRetAutorizacao4?wsdl"),
    (ConsultaCadastro, "nfews/v2/services/CadConsultaCadastro4?wsdl"),
];

static MT_NFCE_PATHS: Paths = &[
    (Inutilizacao, "nfcews/services/NfeInutilizacao4"),
    (ConsultaProtocolo, "nfcews/services/NfeConsulta4"),
    (StatusServico, "nfcews/services/NfeStatusServico4"),
    (RecepcaoEvento, "nfcews/services/RecepcaoEvento4"),
    (Autorizacao, "nfcews/services/NfeAutorizacao4"),
    (RetAutorizacao, "nfcews/services/NfeRetAutorizacao4"),
];

static MS_PATHS: Paths = &[
    (Inutilizacao, "ws/NFeInutilizacao4?wsdl"),
    (ConsultaProtocolo, "ws/NFeConsultaProtocolo4?wsdl"),
    (StatusServico, "ws/NFeStatusServico4?wsdl"),
    (RecepcaoEvento, "ws/NFeRecepcaoEvento4?wsdl"),
    (Autorizacao, "ws/NFeAutorizacao4?wsdl"),
    (RetAutorizacao, "ws/NFeRetAutorizacao4?wsdl"),
    (ConsultaCadastro, "ws/CadConsultaCadastro4?wsdl"),
];

static MS_NFCE_PATHS: Paths = &[
    (Inutilizacao, "ws/NFeInutilizacao4"),
    (ConsultaProtocolo, "ws/NFeConsultaProtocolo4"),
    (StatusServico, "ws/NFeStatusServico4"),
    (RecepcaoEvento, "ws/NFeRecepcaoEvento4"),
    (Autorizacao, "ws/NFeAutorizacao4"),
    (RetAutorizacao, "ws/NFeRetAutorizacao4"),
    (ConsultaCadastro, "ws/CadConsultaCadastro4"),
];

static MG_PATHS: Paths = &[
    (Inutilizacao, "nfe2/services/NFeInutilizacao4"),
    (ConsultaProtocolo, "nfe2/services/NFeConsultaProtocolo4"),
    (StatusServico, "nfe2/services/NFeStatusServico4"),
    (RecepcaoEvento, "nfe2/services/NFeRecepcaoEvento4"),
    (Autorizacao, "nfe2/services/NFeAutorizacao4"),
    (RetAutorizacao, "nfe2/services/NFeRetAutorizacao4"),
    (ConsultaCadastro, "nfe2/services/CadConsultaCadastro4"),
];

static PR_PATHS: Paths = &[
    (Inutilizacao, "nfe/NFeInutilizacao4?wsdl"),
    (ConsultaProtocolo, "nfe/NFeConsultaProtocolo4?wsdl"),
    (StatusServico, "nfe/NFeStatusServico4?wsdl"),
    (RecepcaoEvento, "nfe/NFeRecepcaoEvento4?wsdl"),
    (Autorizacao, "nfe/NFeAutorizacao4?wsdl"),
    (RetAutorizacao, "nfe/NFeRetAutorizacao4?wsdl"),
    (ConsultaCadastro, "nfe/CadConsultaCadastro4?wsdl"),
];

static PR_NFCE_PATHS: Paths = &[
    (Inutilizacao, "nfce/NFeInutilizacao4?wsdl"),
    (ConsultaProtocolo, "nfce/NFeConsultaProtocolo4?wsdl"),
    (StatusServico, "nfce/NFeStatusServico4?wsdl"),
    (RecepcaoEvento, "nfce/NFeRecepcaoEvento4?wsdl"),
    (Autorizacao, "nfce/NFeAutorizacao4?wsdl"),
    (RetAutorizacao, "nfce/NFeRetAutorizacao4?wsdl"),
    (ConsultaCadastro, "nfce/CadConsultaCadastro4?wsdl"),
];

static PE_PATHS: Paths = &[
    (Inutilizacao, "nfe-service/services/NFeInutilizacao4?wsdl"),
    (ConsultaProtocolo, "nfe-service/services/NFeConsultaProtocolo4?wsdl"),
    (StatusServico, "nfe-service/services/NFeStatusServico4?wsdl"),
    (RecepcaoEvento, "nfe-service/services/NFeRecepcaoEvento4?wsdl"),
    (Autorizacao, "nfe-service/services/NFeAutorizacao4?wsdl"),
    (RetAutorizacao, "nfe-service/services/NFeRetAutorizacao4?wsdl"),
    (ConsultaCadastro, "nfe-service/services/CadConsultaCadastro2?wsdl"),
];

static RS_NFCE_PATHS: Paths = &[
    (Inutilizacao, "ws/NfeInutilizacao/NfeInutilizacao2.asmx"),
    (ConsultaProtocolo, "ws/NfeConsulta/NfeConsulta2.asmx"),
    (StatusServico, "ws/NfeStatusServico/NfeStatusServico2.asmx"),
    (RecepcaoEvento, "ws/recepcaoevento/recepcaoevento.asmx"),
    (Autorizacao, "ws/NfeAutorizacao/NFeAutorizacao.asmx"),
    (RetAutorizacao, "ws/NfeRetAutorizacao/NFeRetAutorizacao.asmx"),
    (ConsultaCadastro, "ws/cadconsultacadastro/cadconsultacadastro2.asmx"),
];

static SP_PATHS: Paths = &[
    (Inutilizacao, "ws/nfeinutilizacao4.asmx?wsdl"),
    (ConsultaProtocolo, "ws/nfeconsultaprotocolo4.asmx?wsdl"),
    (StatusServico, "ws/nfestatusservico4.asmx?wsdl"),
    (RecepcaoEvento, "ws/nferecepcaoevento4.asmx?wsdl"),
    (Autorizacao, "ws/nfeautorizacao4.asmx?wsdl"),
    (RetAutorizacao, "ws/nferetautorizacao4.asmx?wsdl"),
    (ConsultaCadastro, "ws/cadconsultacadastro4.asmx?wsdl"),
];

static SP_NFCE_PATHS: Paths = &[
    (Inutilizacao, "ws/NFeInutilizacao4.asmx?wsdl"),
    (ConsultaProtocolo, "ws/NFeConsultaProtocolo4.asmx?wsdl"),
    (StatusServico, "ws/NFeStatusServico4.asmx?wsdl"),
    (RecepcaoEvento, "ws/NFeRecepcaoEvento4.asmx?wsdl"),
    (Autorizacao, "ws/NFeAutorizacao4.asmx?wsdl"),
    (RetAutorizacao, "ws/NFeRetAutorizacao4.asmx?wsdl"),
    (ConsultaCadastro, "ws/cadconsultacadastro2.asmx"),
];

// ---------------------------------------------------------------------------
// Authorities
// ---------------------------------------------------------------------------

const SVRS_NFCE: Hosts = Hosts {
    producao: "nfce.svrs.rs.gov.br",
    homologacao: "nfce-homologacao.svrs.rs.gov.br",
    paths: SVRS_NFCE_PATHS,
};

static SVRS: Autorizador = Autorizador {
    name: "SVRS",
    nfe: Hosts {
        producao: "nfe.svrs.rs.gov.br",
        homologacao: "nfe-homologacao.svrs.rs.gov.br",
        paths: SVRS_PATHS,
    },
    nfce: Some(SVRS_NFCE),
};

static SVAN: Autorizador = Autorizador {
    name: "SVAN",
    nfe: Hosts {
        producao: "www.sefazvirtual.fazenda.gov.br",
        homologacao: "hom.sefazvirtual.fazenda.gov.br",
        paths: SVAN_PATHS,
    },
    nfce: None,
};

static SVC_AN: Autorizador = Autorizador {
    name: "SVC-AN",
    nfe: Hosts {
        producao: "www.svc.fazenda.gov.br",
        homologacao: "hom.svc.fazenda.gov.br",
        paths: SVC_AN_PATHS,
    },
    nfce: None,
};

static SVC_RS: Autorizador = Autorizador {
    name: "SVC-RS",
    nfe: Hosts {
        producao: "nfe.svrs.rs.gov.br",
        homologacao: "nfe-homologacao.svrs.rs.gov.br",
        paths: SVC_RS_PATHS,
    },
    nfce: None,
};

static AN: Autorizador = Autorizador {
    name: "AN",
    nfe: Hosts {
        producao: "www1.nfe.fazenda.gov.br",
        homologacao: "hom.nfe.fazenda.gov.br",
        paths: AN_PATHS,
    },
    nfce: None,
};

static AM: Autorizador = Autorizador {
    name: "AM",
    nfe: Hosts {
        producao: "nfe.sefaz.am.gov.br",
        homologacao: "homnfe.sefaz.am.gov.br",
        paths: AM_PATHS,
    },
    nfce: Some(Hosts {
        producao: "nfce.sefaz.am.gov.br",
        homologacao: "homnfce.sefaz.am.gov.br",
        paths: AM_NFCE_PATHS,
    }),
};

static BA: Autorizador = Autorizador {
    name: "BA",
    nfe: Hosts {
        producao: "nfe.sefaz.ba.gov.br",
        homologacao: "hnfe.sefaz.ba.gov.br",
        paths: BA_PATHS,
    },
    nfce: Some(SVRS_NFCE),
};

static CE: Autorizador = Autorizador {
    name: "CE",
    nfe: Hosts {
        producao: "nfe.sefaz.ce.gov.br",
        homologacao: "nfeh.sefaz.ce.gov.br",
        paths: CE_PATHS,
    },
    nfce: None,
};

static GO: Autorizador = Autorizador {
    name: "GO",
    nfe: Hosts {
        producao: "nfe.sefaz.go.gov.br",
        homologacao: "homolog.sefaz.go.gov.br",
        paths: GO_PATHS,
    },
    nfce: None,
};

static MT: Autorizador = Autorizador {
    name: "MT",
    nfe: Hosts {
        producao: "nfe.sefaz.mt.gov.br",
        homologacao: "homologacao.sefaz.mt.gov.br",
        paths: MT_PATHS,
    },
    nfce: Some(Hosts {
        producao: "nfce.sefaz.mt.gov.br",
        homologacao: "homologacao.sefaz.mt.gov.br",
        paths: MT_NFCE_PATHS,
    }),
};

static MS: Autorizador = Autorizador {
    name: "MS",
    nfe: Hosts {
        producao: "nfe.sefaz.ms.gov.br",
        homologacao: "hom.nfe.sefaz.ms.gov.br",
        paths: MS_PATHS,
    },
    nfce: Some(Hosts {
        producao: "nfce.sefaz.ms.gov.br",
        homologacao: "hom.nfce.sefaz.ms.gov.br",
        paths: MS_NFCE_PATHS,
    }),
};

static MG: Autorizador = Autorizador {
    name: "MG",
    nfe: Hosts {
        producao: "nfe.fazenda.mg.gov.br",
        homologacao: "hnfe.fazenda.mg.gov.br",
        paths: MG_PATHS,
    },
    nfce: None,
};

static PR: Autorizador = Autorizador {
    name: "PR",
    nfe: Hosts {
        producao: "nfe.sefa.pr.gov.br",
        homologacao: "homologacao.nfe.sefa.pr.gov.br",
        paths: PR_PATHS,
    },
    nfce: Some(Hosts {
        producao: "nfce.sefa.pr.gov.br",
        homologacao: "homologacao.nfce.sefa.pr.gov.br",
        paths: PR_NFCE_PATHS,
    }),
};

static PE: Autorizador = Autorizador {
    name: "PE",
    nfe: Hosts {
        producao: "nfe.sefaz.pe.gov.br",
        homologacao: "nfehomolog.sefaz.pe.gov.br",
        paths: PE_PATHS,
    },
    nfce: None,
};

static RS: Autorizador = Autorizador {
    name: "RS",
    nfe: Hosts {
        producao: "nfe.sefazrs.rs.gov.br",
        homologacao: "nfe-homologacao.sefazrs.rs.gov.br",
        paths: SVRS_PATHS,
    },
    nfce: Some(Hosts {
        producao: "nfce.sefazrs.rs.gov.br",
        homologacao: "nfce-homologacao.sefazrs.rs.gov.br",
        paths: RS_NFCE_PATHS,
    }),
};

static SP: Autorizador = Autorizador {
    name: "SP",
    nfe: Hosts {
        producao: "nfe.fazenda.sp.gov.br",
        homologacao: "homologacao.nfe.fazenda.sp.gov.br",
        paths: SP_PATHS,
    },
    nfce: Some(Hosts {
        producao: "nfce.fazenda.sp.gov.br",
        homologacao: "homologacao.nfce.fazenda.sp.gov.br",
        paths: SP_NFCE_PATHS,
    }),
};

fn autorizador(uf: Uf) -> &'static Autorizador {
    match uf {
        Uf::AM => &AM,
        Uf::BA => &BA,
        Uf::CE => &CE,
        Uf::GO => &GO,
        Uf::MG => &MG,
        Uf::MS => &MS,
        Uf::MT => &MT,
        Uf::PE => &PE,
        Uf::PR => &PR,
        Uf::RS => &RS,
        Uf::SP => &SP,
        Uf::MA | Uf::PA | Uf::PI => &SVAN,
        Uf::AN => &AN,
        Uf::AC
        | Uf::AL
        | Uf::AP
        | Uf::DF
        | Uf::ES
        | Uf::PB
        | Uf::RJ
        | Uf::RN
        | Uf::RO
        | Uf::RR
        | Uf::SC
        | Uf::SE
        | Uf::TO => &SVRS,
    }
}

/// Contingency authority (SVC) that stands in for a state's own.
fn contingencia(uf: Uf) -> &'static Autorizador {
    match uf {
        Uf::AM
        | Uf::BA
        | Uf::CE
        | Uf::GO
        | Uf::MA
        | Uf::MS
        | Uf::MT
        | Uf::PA
        | Uf::PE
        | Uf::PI
        | Uf::PR => &SVC_RS,
        _ => &SVC_AN,
    }
}

/// Everything needed to pick an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rota {
    pub uf: Uf,
    pub modelo: Modelo,
    pub ambiente: Ambiente,
    /// Route through the SVC contingency authority.
    pub contingencia: bool,
}

impl Rota {
    pub fn new(uf: Uf, modelo: Modelo, ambiente: Ambiente) -> Self {
        Self {
            uf,
            modelo,
            ambiente,
            contingencia: false,
        }
    }

    /// Name of the authority serving this route for `service`.
    pub fn autorizador(&self, service: NfeService) -> &'static str {
        self.select(service).name
    }

    fn select(&self, service: NfeService) -> &'static Autorizador {
        match service {
            DistribuicaoDfe => &AN,
            _ if self.contingencia => contingencia(self.uf),
            _ => autorizador(self.uf),
        }
    }

    /// `https://<host>/<path>` for `service`.
    pub fn url(&self, service: NfeService) -> Result<String, EdocError> {
        let aut = self.select(service);
        let hosts = match (self.modelo, &aut.nfce) {
            (Modelo::Nfce, Some(nfce)) => nfce,
            _ => &aut.nfe,
        };
        let path = hosts.path(service).ok_or_else(|| {
            EdocError::Config(format!(
                "{} is not offered by {} for {}",
                service.webservice(),
                aut.name,
                self.uf
            ))
        })?;

        let mut host = hosts.host(self.ambiente);
        if service == ConsultaCadastro {
            match self.uf {
                Uf::RS => host = "cad.sefazrs.rs.gov.br",
                Uf::AC | Uf::RN | Uf::PB | Uf::SC | Uf::RJ => host = "cad.svrs.rs.gov.br",
                _ => {}
            }
        }
        if self.uf == Uf::AN && service == RecepcaoEvento && self.ambiente == Ambiente::Producao {
            host = "www.nfe.fazenda.gov.br";
        }
        Ok(format!("https://{host}/{path}"))
    }
}

/// Endpoint for `service` outside contingency.
pub fn locate_url(
    service: NfeService,
    uf: Uf,
    modelo: Modelo,
    ambiente: Ambiente,
) -> Result<String, EdocError> {
    Rota::new(uf, modelo, ambiente).url(service)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_authority_for_small_states() {
        let url = locate_url(StatusServico, Uf::AC, Modelo::Nfe, Ambiente::Homologacao).unwrap();
        assert_eq!(
            url,
            "https://nfe-homologacao.svrs.rs.gov.br/ws/NfeStatusServico/NfeStatusServico4.asmx?wsdl"
        );
        let url = locate_url(Autorizacao, Uf::MA, Modelo::Nfe, Ambiente::Producao).unwrap();
        assert_eq!(
            url,
            "https://www.sefazvirtual.fazenda.gov.br/NFeAutorizacao4/NFeAutorizacao4.asmx?wsdl"
        );
    }

    #[test]
    fn own_authority() {
        let url = locate_url(StatusServico, Uf::SP, Modelo::Nfe, Ambiente::Producao).unwrap();
        assert_eq!(url, "https://nfe.fazenda.sp.gov.br/ws/nfestatusservico4.asmx?wsdl");
    }

    #[test]
    fn nfce_uses_model_hosts_when_split() {
        let url = locate_url(Autorizacao, Uf::SP, Modelo::Nfce, Ambiente::Homologacao).unwrap();
        assert_eq!(
            url,
            "https://homologacao.nfce.fazenda.sp.gov.br/ws/NFeAutorizacao4.asmx?wsdl"
        );
        // BA issues NFC-e through SVRS
        let url = locate_url(StatusServico, Uf::BA, Modelo::Nfce, Ambiente::Producao).unwrap();
        assert!(url.starts_with("https://nfce.svrs.rs.gov.br/"));
        // CE has no model split
        let nfe = locate_url(StatusServico, Uf::CE, Modelo::Nfe, Ambiente::Producao).unwrap();
        let nfce = locate_url(StatusServico, Uf::CE, Modelo::Nfce, Ambiente::Producao).unwrap();
        assert_eq!(nfe, nfce);
    }

    #[test]
    fn cadastro_host_overrides() {
        let url = locate_url(ConsultaCadastro, Uf::RS, Modelo::Nfe, Ambiente::Producao).unwrap();
        assert_eq!(
            url,
            "https://cad.sefazrs.rs.gov.br/ws/cadconsultacadastro/cadconsultacadastro4.asmx?wsdl"
        );
        let url = locate_url(ConsultaCadastro, Uf::SC, Modelo::Nfe, Ambiente::Homologacao).unwrap();
        assert!(url.starts_with("https://cad.svrs.rs.gov.br/"));
    }

    #[test]
    fn distribution_always_national() {
        for uf in [Uf::SP, Uf::AC, Uf::MG] {
            let url = locate_url(DistribuicaoDfe, uf, Modelo::Nfe, Ambiente::Producao).unwrap();
            assert_eq!(
                url,
                "https://www1.nfe.fazenda.gov.br/NFeDistribuicaoDFe/NFeDistribuicaoDFe.asmx?wsdl"
            );
        }
    }

    #[test]
    fn national_event_host() {
        let url = locate_url(RecepcaoEvento, Uf::AN, Modelo::Nfe, Ambiente::Producao).unwrap();
        assert_eq!(
            url,
            "https://www.nfe.fazenda.gov.br/NFeRecepcaoEvento4/NFeRecepcaoEvento4.asmx?wsdl"
        );
        let url = locate_url(RecepcaoEvento, Uf::AN, Modelo::Nfe, Ambiente::Homologacao).unwrap();
        assert!(url.starts_with("https://hom.nfe.fazenda.gov.br/"));
    }

    #[test]
    fn missing_service_is_config_error() {
        let err = locate_url(StatusServico, Uf::AN, Modelo::Nfe, Ambiente::Producao).unwrap_err();
        assert!(matches!(err, EdocError::Config(_)));
        let err =
            locate_url(ConsultaCadastro, Uf::MA, Modelo::Nfe, Ambiente::Producao).unwrap_err();
        assert!(matches!(err, EdocError::Config(_)));
    }

    #[test]
    fn contingency_routes() {
        let mut rota = Rota::new(Uf::SP, Modelo::Nfe, Ambiente::Producao);
        rota.contingencia = true;
        assert_eq!(rota.autorizador(Autorizacao), "SVC-AN");
        assert_eq!(
            rota.url(Autorizacao).unwrap(),
            "https://www.svc.fazenda.gov.br/NFeAutorizacao4/NFeAutorizacao4.asmx?wsdl"
        );
        rota.uf = Uf::PR;
        assert_eq!(rota.autorizador(Autorizacao), "SVC-RS");
        assert!(rota.url(Inutilizacao).is_err());
    }

    #[test]
    fn every_state_has_the_core_services() {
        let essenciais = [
            StatusServico,
            ConsultaProtocolo,
            Autorizacao,
            RetAutorizacao,
            RecepcaoEvento,
        ];
        for uf in Uf::all().filter(|u| *u != Uf::AN) {
            for modelo in [Modelo::Nfe, Modelo::Nfce] {
                for service in essenciais {
                    assert!(
                        locate_url(service, uf, modelo, Ambiente::Producao).is_ok(),
                        "{uf} {modelo:?} {service:?}"
                    );
                }
            }
        }
    }
}
