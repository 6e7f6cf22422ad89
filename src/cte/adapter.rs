use std::time::Duration;

use tracing::debug;

use crate::core::{
    Ambiente, Cancelamento, ChaveAcesso, DocumentAdapter, DocumentKey, EdocError, FromXml,
    ProcessedDocument, ProcessingStep, Request, RoutingHints, Signer, Transport, Uf, brasilia_now,
    compress, post, sign_element,
};

use super::document::{CteDocument, TipoCte, monta_cte_proc};
use super::routing::{CteService, locate_url};
use super::schema::{self, CteResposta, EventoCancelamentoCte, VERSAO};

const SERVICO_EM_OPERACAO: &str = "107";
const AUTORIZADO: &str = "100";
const LOTE_RECEBIDO: &str = "103";
const EM_PROCESSAMENTO: &str = "105";

/// Synchronous reception has no `tMed`; query after a fixed pause.
const ESPERA: Duration = Duration::from_secs(1);

/// CT-e 4.00 adapter (synchronous reception).
///
/// The signed document travels gzip-compressed and base64-encoded. The
/// authorization outcome is confirmed with a protocol query by key.
#[derive(Debug, Clone)]
pub struct CTe<T, S> {
    transport: T,
    signer: S,
    uf: Uf,
    ambiente: Ambiente,
}

impl<T: Transport, S: Signer> CTe<T, S> {
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
        service: CteService,
        request: Request,
        wrap: fn(R) -> CteResposta,
    ) -> Result<ProcessingStep<CteResposta>, EdocError> {
        let url = self.locate_url(service)?;
        let hints = RoutingHints::new(service.namespace(), "cteDadosMsg")
            .c_uf(self.uf.codigo())
            .versao_dados(VERSAO);
        let step = post::<R>(&self.transport, &url, service.operation(), request, &hints)?;
        Ok(step.map_response(wrap))
    }

    fn c_stat(step: &ProcessingStep<CteResposta>) -> Option<&str> {
        step.response().and_then(CteResposta::c_stat)
    }
}

impl<T: Transport, S: Signer> DocumentAdapter for CTe<T, S> {
    type Document = CteDocument;
    type Response = CteResposta;
    type Service = CteService;

    fn status_servico(&self) -> Result<ProcessingStep<CteResposta>, EdocError> {
        let root = schema::cons_stat_serv_cte(self.ambiente, self.uf.codigo());
        self.send(CteService::StatusServico, Request::from_element(root)?, CteResposta::Status)
    }

    fn get_document_id(&self, document: &CteDocument) -> Option<DocumentKey> {
        document.key()
    }

    fn consulta_documento(
        &self,
        key: &DocumentKey,
    ) -> Result<ProcessingStep<CteResposta>, EdocError> {
        let root = schema::cons_sit_cte(self.ambiente, key.key());
        self.send(CteService::Consulta, Request::from_element(root)?, CteResposta::Consulta)
    }

    fn envia_documento(
        &self,
        document: &CteDocument,
    ) -> Result<ProcessingStep<CteResposta>, EdocError> {
        let signed = sign_element(&self.signer, &document.to_xml()?, document.id())?;
        let payload = compress(&signed)?;
        debug!(id = document.id(), bytes = payload.len(), "sending compressed CT-e");
        let request = Request::from_xml(signed)?.with_text_payload(payload);
        self.send(document.tipo().recepcao(), request, CteResposta::Envio)
    }

    fn consulta_recibo(
        &self,
        submission: &ProcessingStep<CteResposta>,
    ) -> Result<ProcessingStep<CteResposta>, EdocError> {
        let key = submission
            .request_root()
            .find("infCte")
            .and_then(|inf| inf.attribute("Id"))
            .and_then(DocumentKey::from_element_id)
            .ok_or(EdocError::MissingField("infCte/@Id"))?;
        self.consulta_documento(&key)
    }

    fn cancela_documento(
        &self,
        request: &Cancelamento,
    ) -> Result<ProcessingStep<CteResposta>, EdocError> {
        let chave = ChaveAcesso::parse(&request.chave)?;
        let evento = EventoCancelamentoCte {
            chave: chave.as_str(),
            c_orgao: self.uf.codigo(),
            ambiente: self.ambiente,
            cnpj: chave.cnpj(),
            protocolo: &request.protocolo,
            justificativa: &request.justificativa,
            sequencia: 1,
            data_hora: request.data_hora.unwrap_or_else(brasilia_now),
        };
        let id = evento.id();
        let signed = sign_element(&self.signer, &evento.to_element().to_xml()?, Some(&id))?;
        self.send(CteService::RecepcaoEvento, Request::from_xml(signed)?, CteResposta::Evento)
    }

    fn is_service_operational(&self, step: &ProcessingStep<CteResposta>) -> bool {
        Self::c_stat(step) == Some(SERVICO_EM_OPERACAO)
    }

    /// Never called: no duplicate check runs for CT-e.
    fn is_already_filed(&self, _step: &ProcessingStep<CteResposta>) -> bool {
        false
    }

    fn is_accepted(&self, step: &ProcessingStep<CteResposta>) -> bool {
        let Some(resp) = step.response() else {
            return false;
        };
        let prot = resp.protocolo().and_then(|p| p.c_stat.as_deref());
        [resp.c_stat(), prot]
            .into_iter()
            .flatten()
            .any(|c| c == AUTORIZADO || c == LOTE_RECEBIDO)
    }

    fn is_still_processing(&self, step: &ProcessingStep<CteResposta>) -> bool {
        Self::c_stat(step) == Some(EM_PROCESSAMENTO)
    }

    fn average_wait(&self, _submission: &ProcessingStep<CteResposta>) -> Duration {
        ESPERA
    }

    fn locate_url(&self, service: CteService) -> Result<String, EdocError> {
        locate_url(service, self.uf, self.ambiente)
    }

    fn checks_document_before_sending(&self) -> bool {
        false
    }

    fn build_processed_bundle(
        &self,
        document: &CteDocument,
        submission: &ProcessingStep<CteResposta>,
        receipt: &ProcessingStep<CteResposta>,
    ) -> Option<ProcessedDocument> {
        let prot = receipt
            .response()
            .and_then(CteResposta::protocolo)
            .or_else(|| submission.response().and_then(CteResposta::protocolo))?;
        let tipo: TipoCte = document.tipo();
        match monta_cte_proc(tipo, submission.request_xml(), prot) {
            Ok(xml) => Some(ProcessedDocument {
                xml,
                protocol: prot.n_prot.clone(),
            }),
            Err(e) => {
                debug!(error = %e, "could not assemble {}", tipo.proc_root());
                None
            }
        }
    }
}
