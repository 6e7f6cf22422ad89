//! The seam between the NFS-e adapter and each municipal provider.

use crate::core::{
    Ambiente, Cancelamento, EdocError, FromXml, ProcessingStep, RawResponse, Request, RoutingHints,
    Signer, interpret,
};

use super::document::{IdentificacaoRps, LoteRps, Prestador};
use super::schema::{
    CancelarNfseResposta, ConsultarLoteRpsResposta, ConsultarNfseRpsResposta,
    ConsultarSituacaoLoteRpsResposta, EnviarLoteRpsResposta, NfseResposta,
};

/// Operations a provider may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServicoNfse {
    EnvioLote,
    SituacaoLote,
    ConsultaLote,
    ConsultaRps,
    Cancelamento,
}

/// One request, with the input it is built from.
#[derive(Debug, Clone, Copy)]
pub enum Pedido<'a> {
    EnvioLote(&'a LoteRps),
    /// Status of the batch recorded in a submission step.
    SituacaoLote(&'a ProcessingStep<NfseResposta>),
    /// Issued notes of a batch, by protocol.
    ConsultaLote(&'a str),
    ConsultaRps(&'a IdentificacaoRps),
    Cancelamento(&'a Cancelamento),
}

impl Pedido<'_> {
    pub fn servico(&self) -> ServicoNfse {
        match self {
            Self::EnvioLote(_) => ServicoNfse::EnvioLote,
            Self::SituacaoLote(_) => ServicoNfse::SituacaoLote,
            Self::ConsultaLote(_) => ServicoNfse::ConsultaLote,
            Self::ConsultaRps(_) => ServicoNfse::ConsultaRps,
            Self::Cancelamento(_) => ServicoNfse::Cancelamento,
        }
    }
}

/// What a provider needs besides the request input.
pub struct Contexto<'a> {
    pub prestador: &'a Prestador,
    pub ambiente: Ambiente,
    pub signer: &'a dyn Signer,
    /// Fresh batch number for submissions.
    pub numero_lote: &'a str,
}

/// A municipal NFS-e provider: endpoints, request layouts and the reading
/// of its answers.
pub trait Provedor {
    fn nome(&self) -> &'static str;

    fn url(&self, ambiente: Ambiente, cidade: u32) -> Result<String, EdocError>;

    /// SOAP operation for `servico`; `Unsupported` when the provider lacks it.
    fn operacao(&self, servico: ServicoNfse, ambiente: Ambiente) -> Result<&'static str, EdocError>;

    fn hints(&self, operacao: &str, ambiente: Ambiente) -> RoutingHints;

    /// Build (and sign, where the provider asks for it) the request.
    fn prepara(&self, pedido: &Pedido<'_>, ctx: &Contexto<'_>) -> Result<Request, EdocError>;

    fn interpreta(
        &self,
        servico: ServicoNfse,
        operacao: &str,
        request: Request,
        raw: RawResponse,
    ) -> Result<ProcessingStep<NfseResposta>, EdocError> {
        interpreta_abrasf(servico, operacao, request, raw)
    }

    /// The submission was taken in.
    fn envio_aceito(&self, step: &ProcessingStep<NfseResposta>) -> bool;

    /// The batch is queued but not yet processed.
    fn em_processamento(&self, step: &ProcessingStep<NfseResposta>) -> bool;
}

impl<P: Provedor + ?Sized> Provedor for Box<P> {
    fn nome(&self) -> &'static str {
        (**self).nome()
    }

    fn url(&self, ambiente: Ambiente, cidade: u32) -> Result<String, EdocError> {
        (**self).url(ambiente, cidade)
    }

    fn operacao(
        &self,
        servico: ServicoNfse,
        ambiente: Ambiente,
    ) -> Result<&'static str, EdocError> {
        (**self).operacao(servico, ambiente)
    }

    fn hints(&self, operacao: &str, ambiente: Ambiente) -> RoutingHints {
        (**self).hints(operacao, ambiente)
    }

    fn prepara(&self, pedido: &Pedido<'_>, ctx: &Contexto<'_>) -> Result<Request, EdocError> {
        (**self).prepara(pedido, ctx)
    }

    fn interpreta(
        &self,
        servico: ServicoNfse,
        operacao: &str,
        request: Request,
        raw: RawResponse,
    ) -> Result<ProcessingStep<NfseResposta>, EdocError> {
        (**self).interpreta(servico, operacao, request, raw)
    }

    fn envio_aceito(&self, step: &ProcessingStep<NfseResposta>) -> bool {
        (**self).envio_aceito(step)
    }

    fn em_processamento(&self, step: &ProcessingStep<NfseResposta>) -> bool {
        (**self).em_processamento(step)
    }
}

fn read<R: FromXml>(
    operacao: &str,
    request: Request,
    raw: RawResponse,
    wrap: fn(R) -> NfseResposta,
) -> Result<ProcessingStep<NfseResposta>, EdocError> {
    Ok(interpret::<R>(operacao, request.root, request.xml, raw)?.map_response(wrap))
}

/// Read an ABRASF answer by the service that produced it.
pub fn interpreta_abrasf(
    servico: ServicoNfse,
    operacao: &str,
    request: Request,
    raw: RawResponse,
) -> Result<ProcessingStep<NfseResposta>, EdocError> {
    match servico {
        ServicoNfse::EnvioLote => {
            read::<EnviarLoteRpsResposta>(operacao, request, raw, NfseResposta::Envio)
        }
        ServicoNfse::SituacaoLote => read::<ConsultarSituacaoLoteRpsResposta>(
            operacao,
            request,
            raw,
            NfseResposta::SituacaoLote,
        ),
        ServicoNfse::ConsultaLote => {
            read::<ConsultarLoteRpsResposta>(operacao, request, raw, NfseResposta::Lote)
        }
        ServicoNfse::ConsultaRps => {
            read::<ConsultarNfseRpsResposta>(operacao, request, raw, NfseResposta::Rps)
        }
        ServicoNfse::Cancelamento => {
            read::<CancelarNfseResposta>(operacao, request, raw, NfseResposta::Cancelamento)
        }
    }
}

/// ABRASF acceptance: the submission returned a lot protocol.
pub(crate) fn abrasf_envio_aceito(step: &ProcessingStep<NfseResposta>) -> bool {
    step.response().and_then(NfseResposta::protocolo).is_some()
}

/// ABRASF `Situacao == 2`: received, not yet processed.
pub(crate) fn abrasf_em_processamento(step: &ProcessingStep<NfseResposta>) -> bool {
    matches!(
        step.response(),
        Some(NfseResposta::SituacaoLote(r)) if r.situacao == Some(2)
    )
}

/// Protocol of the submission behind a lot status query.
pub(crate) fn protocolo_do_envio(step: &ProcessingStep<NfseResposta>) -> Result<&str, EdocError> {
    step.response()
        .and_then(NfseResposta::protocolo)
        .ok_or(EdocError::MissingField("Protocolo"))
}
