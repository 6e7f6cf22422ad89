use std::time::Duration;

use tracing::debug;

use crate::core::{
    Ambiente, Cancelamento, DocumentAdapter, DocumentKey, EdocError, ProcessingStep, Signer,
    Transport, brasilia_now,
};

use super::cidades;
use super::document::{IdentificacaoRps, LoteRps, Prestador};
use super::provedor::{Contexto, Pedido, Provedor, ServicoNfse};
use super::resultado::{Conferencia, ResultadoConsultaNfse};
use super::schema::NfseResposta;

const MAXIMO_TENTATIVAS: u32 = 10;
const TEMPO_MEDIO: Duration = Duration::from_secs(1);

/// NFS-e adapter over a municipal [`Provedor`].
///
/// Providers have no status service and no duplicate lookup: the workflow
/// goes straight to submission and polls the batch status.
#[derive(Debug, Clone)]
pub struct NFSe<T, S, P> {
    transport: T,
    signer: S,
    provedor: P,
    prestador: Prestador,
    ambiente: Ambiente,
}

impl<T: Transport, S: Signer> NFSe<T, S, Box<dyn Provedor>> {
    /// Adapter for whichever provider serves the issuer's city.
    pub fn para_cidade(
        transport: T,
        signer: S,
        prestador: Prestador,
        ambiente: Ambiente,
    ) -> Result<Self, EdocError> {
        let provedor = cidades::provedor(prestador.cidade)?;
        Ok(Self::new(transport, signer, provedor, prestador, ambiente))
    }
}

impl<T: Transport, S: Signer, P: Provedor> NFSe<T, S, P> {
    pub fn new(
        transport: T,
        signer: S,
        provedor: P,
        prestador: Prestador,
        ambiente: Ambiente,
    ) -> Self {
        Self {
            transport,
            signer,
            provedor,
            prestador,
            ambiente,
        }
    }

    pub fn provedor(&self) -> &P {
        &self.provedor
    }

    pub fn prestador(&self) -> &Prestador {
        &self.prestador
    }

    fn executa(&self, pedido: Pedido<'_>) -> Result<ProcessingStep<NfseResposta>, EdocError> {
        let servico = pedido.servico();
        let url = self.locate_url(servico)?;
        let operacao = self.provedor.operacao(servico, self.ambiente)?;
        let numero_lote = brasilia_now().format("%Y%m%d%H%M%S").to_string();
        let ctx = Contexto {
            prestador: &self.prestador,
            ambiente: self.ambiente,
            signer: &self.signer,
            numero_lote: &numero_lote,
        };
        let request = self.provedor.prepara(&pedido, &ctx)?;
        let hints = self.provedor.hints(operacao, self.ambiente);
        debug!(provedor = self.provedor.nome(), operacao, %url, "invoking NFS-e service");
        let raw = {
            let mut client = self.transport.open(&url)?;
            client.invoke(operacao, &request.payload, &hints)?
        };
        self.provedor.interpreta(servico, operacao, request, raw)
    }

    /// Notes issued from the batch registered under `protocolo`.
    pub fn consultar_lote_rps(
        &self,
        protocolo: &str,
    ) -> Result<ProcessingStep<NfseResposta>, EdocError> {
        self.executa(Pedido::ConsultaLote(protocolo))
    }

    /// The NFS-e an RPS was converted into.
    pub fn consulta_nfse_rps(
        &self,
        rps: &IdentificacaoRps,
    ) -> Result<ProcessingStep<NfseResposta>, EdocError> {
        self.executa(Pedido::ConsultaRps(rps))
    }

    /// Look up the NFS-e of `rps` and check it against the issuer's records.
    pub fn confere_nfse_rps(
        &self,
        rps: &IdentificacaoRps,
        conferencia: &Conferencia,
    ) -> Result<ResultadoConsultaNfse, EdocError> {
        let step = self.consulta_nfse_rps(rps)?;
        Ok(step
            .response()
            .map_or(ResultadoConsultaNfse::Desconhecido, |r| {
                r.resultado_consulta(conferencia)
            }))
    }
}

impl<T: Transport, S: Signer, P: Provedor> DocumentAdapter for NFSe<T, S, P> {
    type Document = LoteRps;
    type Response = NfseResposta;
    type Service = ServicoNfse;

    fn status_servico(&self) -> Result<ProcessingStep<NfseResposta>, EdocError> {
        Err(EdocError::Unsupported("NFS-e service status"))
    }

    fn get_document_id(&self, document: &LoteRps) -> Option<DocumentKey> {
        document.key()
    }

    fn consulta_documento(
        &self,
        _key: &DocumentKey,
    ) -> Result<ProcessingStep<NfseResposta>, EdocError> {
        Err(EdocError::Unsupported("NFS-e lookup by key"))
    }

    fn envia_documento(
        &self,
        document: &LoteRps,
    ) -> Result<ProcessingStep<NfseResposta>, EdocError> {
        self.executa(Pedido::EnvioLote(document))
    }

    fn consulta_recibo(
        &self,
        submission: &ProcessingStep<NfseResposta>,
    ) -> Result<ProcessingStep<NfseResposta>, EdocError> {
        self.executa(Pedido::SituacaoLote(submission))
    }

    /// `request.chave` is the NFS-e number; `request.codigo` the
    /// cancellation reason (default `0001`).
    fn cancela_documento(
        &self,
        request: &Cancelamento,
    ) -> Result<ProcessingStep<NfseResposta>, EdocError> {
        self.executa(Pedido::Cancelamento(request))
    }

    fn is_service_operational(&self, _step: &ProcessingStep<NfseResposta>) -> bool {
        true
    }

    fn is_already_filed(&self, _step: &ProcessingStep<NfseResposta>) -> bool {
        false
    }

    fn is_accepted(&self, step: &ProcessingStep<NfseResposta>) -> bool {
        self.provedor.envio_aceito(step)
    }

    fn is_still_processing(&self, step: &ProcessingStep<NfseResposta>) -> bool {
        self.provedor.em_processamento(step)
    }

    fn average_wait(&self, _submission: &ProcessingStep<NfseResposta>) -> Duration {
        TEMPO_MEDIO
    }

    fn locate_url(&self, _service: ServicoNfse) -> Result<String, EdocError> {
        self.provedor.url(self.ambiente, self.prestador.cidade)
    }

    fn max_poll_attempts(&self) -> u32 {
        MAXIMO_TENTATIVAS
    }

    fn checks_service_before_sending(&self) -> bool {
        false
    }

    fn checks_document_before_sending(&self) -> bool {
        false
    }
}
