//! São Paulo's own service (`lotenfe.asmx`). One host for both
//! environments; homologation submissions go to `TesteEnvioLoteRPS`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::core::{
    Ambiente, EdocError, Element, ProcessingStep, RawResponse, Request, RoutingHints, interpret,
};

use super::provedor::{Contexto, Pedido, Provedor, ServicoNfse};
use super::schema::{NfseResposta, RetornoPaulistana};

pub const NAMESPACE: &str = "http://www.prefeitura.sp.gov.br/nfe";
const URL: &str = "https://nfe.prefeitura.sp.gov.br/ws/lotenfe.asmx?WSDL";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Paulistana;

fn cabecalho(cnpj: &str) -> Element {
    Element::new("Cabecalho")
        .attr("Versao", "1")
        .attr("xmlns", "")
        .child(Element::new("CPFCNPJRemetente").text_child("CNPJ", cnpj))
}

fn raiz(root: &str) -> Element {
    Element::new(root).attr("xmlns", NAMESPACE)
}

fn assina(ctx: &Contexto<'_>, data: &str) -> Result<String, EdocError> {
    Ok(STANDARD.encode(ctx.signer.sign_pkcs1_sha1(data.as_bytes())?))
}

/// `AssinaturaCancelamento` plain text: municipal registration padded to 8
/// digits followed by the note number padded to 12.
pub fn texto_assinatura_cancelamento(inscricao_municipal: &str, numero_nfse: &str) -> String {
    format!("{inscricao_municipal:0>8}{numero_nfse:0>12}")
}

impl Provedor for Paulistana {
    fn nome(&self) -> &'static str {
        "Paulistana"
    }

    fn url(&self, _ambiente: Ambiente, _cidade: u32) -> Result<String, EdocError> {
        Ok(URL.to_string())
    }

    fn operacao(
        &self,
        servico: ServicoNfse,
        ambiente: Ambiente,
    ) -> Result<&'static str, EdocError> {
        Ok(match (servico, ambiente) {
            (ServicoNfse::EnvioLote, Ambiente::Producao) => "EnvioLoteRPS",
            (ServicoNfse::EnvioLote, Ambiente::Homologacao) => "TesteEnvioLoteRPS",
            (ServicoNfse::SituacaoLote | ServicoNfse::ConsultaLote, _) => "ConsultaLote",
            (ServicoNfse::ConsultaRps, _) => "ConsultaNFe",
            (ServicoNfse::Cancelamento, _) => "CancelamentoNFe",
        })
    }

    fn hints(&self, operacao: &str, _ambiente: Ambiente) -> RoutingHints {
        RoutingHints::new(NAMESPACE, format!("{operacao}Request"))
    }

    fn prepara(&self, pedido: &Pedido<'_>, ctx: &Contexto<'_>) -> Result<Request, EdocError> {
        let p = ctx.prestador;
        let root = match pedido {
            Pedido::EnvioLote(lote) => {
                let mut lote = (*lote).clone();
                let mut falha = None;
                lote.element_mut().for_each_descendant_mut("Assinatura", &mut |el| {
                    if falha.is_some() {
                        return;
                    }
                    match assina(ctx, el.text_content().trim()) {
                        Ok(b64) => el.set_text(b64),
                        Err(e) => falha = Some(e),
                    }
                });
                if let Some(e) = falha {
                    return Err(e);
                }
                lote.element().clone()
            }
            Pedido::SituacaoLote(envio_step) => {
                let (numero_lote, cnpj) = match envio_step.response() {
                    Some(NfseResposta::Paulistana(r)) => (r.numero_lote.clone(), r.cnpj.clone()),
                    _ => (None, None),
                };
                let numero_lote = numero_lote.ok_or(EdocError::MissingField("NumeroLote"))?;
                let cnpj = cnpj.unwrap_or_else(|| p.cnpj.clone());
                let mut cab = cabecalho(&cnpj);
                cab.push(Element::new("NumeroLote").text(numero_lote));
                raiz("PedidoConsultaLote").child(cab)
            }
            Pedido::ConsultaLote(numero_lote) => {
                let mut cab = cabecalho(&p.cnpj);
                cab.push(Element::new("NumeroLote").text(*numero_lote));
                raiz("PedidoConsultaLote").child(cab)
            }
            Pedido::ConsultaRps(rps) => raiz("PedidoConsultaNFe")
                .child(cabecalho(&p.cnpj))
                .child(
                    Element::new("Detalhe").attr("xmlns", "").child(
                        Element::new("ChaveRPS")
                            .text_child("InscricaoPrestador", p.inscricao_municipal.as_str())
                            .text_child("SerieRPS", rps.serie.as_str())
                            .text_child("NumeroRPS", rps.numero.as_str()),
                    ),
                ),
            Pedido::Cancelamento(c) => {
                let texto = texto_assinatura_cancelamento(&p.inscricao_municipal, &c.chave);
                raiz("PedidoCancelamentoNFe")
                    .child(cabecalho(&p.cnpj).text_child("transacao", "true"))
                    .child(
                        Element::new("Detalhe")
                            .attr("xmlns", "")
                            .child(
                                Element::new("ChaveNFe")
                                    .text_child(
                                        "InscricaoPrestador",
                                        p.inscricao_municipal.as_str(),
                                    )
                                    .text_child("NumeroNFe", c.chave.as_str())
                                    .text_child(
                                        "CodigoVerificacao",
                                        format!("{:0>8}", c.protocolo),
                                    ),
                            )
                            .text_child("AssinaturaCancelamento", assina(ctx, &texto)?),
                    )
            }
        };
        Request::from_xml(ctx.signer.sign(&root.to_xml()?, "")?)
    }

    fn interpreta(
        &self,
        _servico: ServicoNfse,
        operacao: &str,
        request: Request,
        raw: RawResponse,
    ) -> Result<ProcessingStep<NfseResposta>, EdocError> {
        Ok(interpret::<RetornoPaulistana>(operacao, request.root, request.xml, raw)?
            .map_response(NfseResposta::Paulistana))
    }

    fn envio_aceito(&self, step: &ProcessingStep<NfseResposta>) -> bool {
        matches!(step.response(), Some(NfseResposta::Paulistana(r)) if r.sucesso)
    }

    /// Synchronous: a batch is processed before the submission returns.
    fn em_processamento(&self, _step: &ProcessingStep<NfseResposta>) -> bool {
        false
    }
}
