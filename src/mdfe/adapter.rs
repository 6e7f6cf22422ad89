use std::time::Duration;

use chrono::NaiveDate;
use tracing::debug;

use crate::core::{
    Ambiente, Cancelamento, ChaveAcesso, DocumentAdapter, DocumentKey, EdocError, FromXml,
    ProcessedDocument, ProcessingStep, Request, RoutingHints, Signer, Transport, Uf, brasilia_now,
    compress, post, sign_element,
};

use super::document::{MdfeDocument, monta_mdfe_proc};
use super::routing::{MdfeService, locate_url};
use super::schema::{self, DetalheEventoMdfe, EventoMdfe, MdfeResposta, VERSAO};

const SERVICO_EM_OPERACAO: &str = "107";
const AUTORIZADO: &str = "100";
const LOTE_RECEBIDO: &str = "103";
const EM_PROCESSAMENTO: &str = "105";

/// Authorized, cancelled, closed.
const JA_ENVIADO: &[&str] = &["100", "101", "132"];

const ESPERA: Duration = Duration::from_secs(1);

/// Where and when a manifest's trip ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encerramento {
    pub chave: String,
    pub protocolo: String,
    /// State of the unloading municipality.
    pub uf: Uf,
    /// IBGE code of the unloading municipality.
    pub municipio: String,
    /// Closing date; today in Brasília when absent.
    pub data: Option<NaiveDate>,
}

/// MDF-e 3.00 adapter (synchronous reception through SVRS).
#[derive(Debug, Clone)]
pub struct MDFe<T, S> {
    transport: T,
    signer: S,
    uf: Uf,
    ambiente: Ambiente,
}

impl<T: Transport, S: Signer> MDFe<T, S> {
    pub fn new(transport: T, signer: S, uf: Uf, ambiente: Ambiente) -> Self {
        Self {
            transport,
            signer,
            uf,
            ambiente,
        }
    }

    fn send<R: FromXml>(
        &self,
        service: MdfeService,
        request: Request,
        wrap: fn(R) -> MdfeResposta,
    ) -> Result<ProcessingStep<MdfeResposta>, EdocError> {
        let url = self.locate_url(service)?;
        let hints = RoutingHints::new(service.namespace(), "mdfeDadosMsg")
            .c_uf(self.uf.codigo())
            .versao_dados(VERSAO);
        let step = post::<R>(&self.transport, &url, service.operation(), request, &hints)?;
        Ok(step.map_response(wrap))
    }

    fn c_stat(step: &ProcessingStep<MdfeResposta>) -> Option<&str> {
        step.response().and_then(MdfeResposta::c_stat)
    }

    fn evento(
        &self,
        chave: &str,
        detalhe: DetalheEventoMdfe,
        data_hora: Option<chrono::DateTime<chrono::FixedOffset>>,
    ) -> Result<ProcessingStep<MdfeResposta>, EdocError> {
        let chave = ChaveAcesso::parse(chave)?;
        let evento = EventoMdfe {
            chave: chave.as_str(),
            c_orgao: self.uf.codigo(),
            ambiente: self.ambiente,
            cnpj: chave.cnpj(),
            sequencia: 1,
            data_hora: data_hora.unwrap_or_else(brasilia_now),
            detalhe,
        };
        let id = evento.id();
        debug!(%id, "sending MDF-e event");
        let signed = sign_element(&self.signer, &evento.to_element().to_xml()?, Some(&id))?;
        self.send(MdfeService::RecepcaoEvento, Request::from_xml(signed)?, MdfeResposta::Evento)
    }

    /// Close the manifest at the end of the trip (`110112`).
    pub fn encerra_documento(
        &self,
        encerramento: &Encerramento,
    ) -> Result<ProcessingStep<MdfeResposta>, EdocError> {
        let data = encerramento
            .data
            .unwrap_or_else(|| brasilia_now().date_naive());
        let detalhe = DetalheEventoMdfe::Encerramento {
            protocolo: encerramento.protocolo.clone(),
            data,
            c_uf: encerramento.uf.codigo(),
            municipio: encerramento.municipio.clone(),
        };
        self.evento(&encerramento.chave, detalhe, None)
    }

    /// Manifests of `cnpj` that were authorized but never closed.
    pub fn consulta_nao_encerrados(
        &self,
        cnpj: &str,
    ) -> Result<ProcessingStep<MdfeResposta>, EdocError> {
        let root = schema::cons_mdfe_nao_enc(self.ambiente, cnpj);
        self.send(
            MdfeService::ConsultaNaoEncerrados,
            Request::from_element(root)?,
            MdfeResposta::NaoEncerrados,
        )
    }
}

impl<T: Transport, S: Signer> DocumentAdapter for MDFe<T, S> {
    type Document = MdfeDocument;
    type Response = MdfeResposta;
    type Service = MdfeService;

    fn status_servico(&self) -> Result<ProcessingStep<MdfeResposta>, EdocError> {
        let root = schema::cons_stat_serv_mdfe(self.ambiente);
        self.send(MdfeService::StatusServico, Request::from_element(root)?, MdfeResposta::Status)
    }

    fn get_document_id(&self, document: &MdfeDocument) -> Option<DocumentKey> {
        document.key()
    }

    fn consulta_documento(
        &self,
        key: &DocumentKey,
    ) -> Result<ProcessingStep<MdfeResposta>, EdocError> {
        let root = schema::cons_sit_mdfe(self.ambiente, key.key());
        self.send(MdfeService::Consulta, Request::from_element(root)?, MdfeResposta::Consulta)
    }

    fn envia_documento(
        &self,
        document: &MdfeDocument,
    ) -> Result<ProcessingStep<MdfeResposta>, EdocError> {
        let signed = sign_element(&self.signer, &document.to_xml()?, document.id())?;
        let payload = compress(&signed)?;
        debug!(id = document.id(), bytes = payload.len(), "sending compressed MDF-e");
        let request = Request::from_xml(signed)?.with_text_payload(payload);
        self.send(MdfeService::RecepcaoSinc, request, MdfeResposta::Envio)
    }

    fn consulta_recibo(
        &self,
        submission: &ProcessingStep<MdfeResposta>,
    ) -> Result<ProcessingStep<MdfeResposta>, EdocError> {
        let chave = submission
            .request_root()
            .find("infMDFe")
            .and_then(|inf| inf.attribute("Id"))
            .and_then(|id| ChaveAcesso::parse(id).ok())
            .ok_or(EdocError::MissingField("infMDFe/@Id"))?;
        self.consulta_documento(&DocumentKey::new("MDFe", chave.as_str()))
    }

    fn cancela_documento(
        &self,
        request: &Cancelamento,
    ) -> Result<ProcessingStep<MdfeResposta>, EdocError> {
        let detalhe = DetalheEventoMdfe::Cancelamento {
            protocolo: request.protocolo.clone(),
            justificativa: request.justificativa.clone(),
        };
        self.evento(&request.chave, detalhe, request.data_hora)
    }

    fn is_service_operational(&self, step: &ProcessingStep<MdfeResposta>) -> bool {
        Self::c_stat(step) == Some(SERVICO_EM_OPERACAO)
    }

    fn is_already_filed(&self, step: &ProcessingStep<MdfeResposta>) -> bool {
        Self::c_stat(step).is_some_and(|c| JA_ENVIADO.contains(&c))
    }

    fn is_accepted(&self, step: &ProcessingStep<MdfeResposta>) -> bool {
        let Some(resp) = step.response() else {
            return false;
        };
        let prot = resp.protocolo().and_then(|p| p.c_stat.as_deref());
        [resp.c_stat(), prot]
            .into_iter()
            .flatten()
            .any(|c| c == AUTORIZADO || c == LOTE_RECEBIDO)
    }

    fn is_still_processing(&self, step: &ProcessingStep<MdfeResposta>) -> bool {
        Self::c_stat(step) == Some(EM_PROCESSAMENTO)
    }

    fn average_wait(&self, _submission: &ProcessingStep<MdfeResposta>) -> Duration {
        ESPERA
    }

    fn locate_url(&self, service: MdfeService) -> Result<String, EdocError> {
        locate_url(service, self.uf, self.ambiente)
    }

    fn build_processed_bundle(
        &self,
        _document: &MdfeDocument,
        submission: &ProcessingStep<MdfeResposta>,
        receipt: &ProcessingStep<MdfeResposta>,
    ) -> Option<ProcessedDocument> {
        let prot = receipt
            .response()
            .and_then(MdfeResposta::protocolo)
            .or_else(|| submission.response().and_then(MdfeResposta::protocolo))?;
        match monta_mdfe_proc(submission.request_xml(), prot) {
            Ok(xml) => Some(ProcessedDocument {
                xml,
                protocol: prot.n_prot.clone(),
            }),
            Err(e) => {
                debug!(error = %e, "could not assemble mdfeProc");
                None
            }
        }
    }
}
