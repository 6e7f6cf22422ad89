//! GINFES, ABRASF layout 3.

use tracing::debug;

use crate::core::{Ambiente, EdocError, Element, ProcessingStep, Request, RoutingHints};

use super::document::Prestador;
use super::provedor::{
    Contexto, Pedido, Provedor, ServicoNfse, abrasf_em_processamento, abrasf_envio_aceito,
    protocolo_do_envio,
};
use super::schema::NfseResposta;

const TIPOS: &str = "http://www.ginfes.com.br/tipos_v03.xsd";
const ENDPOINT: &str = "ServiceGinfesImpl?wsdl";

/// `cabecalho` sent ahead of every message.
pub const CABECALHO: &str = r#"<ns2:cabecalho versao="3" xmlns:ns2="http://www.ginfes.com.br/cabecalho_v03.xsd"><versaoDados>3</versaoDados></ns2:cabecalho>"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ginfes;

fn host(ambiente: Ambiente) -> &'static str {
    match ambiente {
        Ambiente::Producao => "producao.ginfes.com.br",
        Ambiente::Homologacao => "homologacao.ginfes.com.br",
    }
}

fn prestador(p: &Prestador) -> Element {
    Element::new("Prestador")
        .text_child("tipos:Cnpj", p.cnpj.as_str())
        .text_child("tipos:InscricaoMunicipal", p.inscricao_municipal.as_str())
}

fn envio(servico: &str) -> Element {
    Element::new(servico)
        .attr("xmlns", format!("http://www.ginfes.com.br/{}_v03.xsd", snake(servico)))
        .attr("xmlns:tipos", TIPOS)
}

/// `ConsultarSituacaoLoteRpsEnvio` -> `servico_consultar_situacao_lote_rps_envio`.
fn snake(root: &str) -> String {
    let mut out = String::from("servico");
    for c in root.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn signed(ctx: &Contexto<'_>, root: &Element, id: &str) -> Result<Request, EdocError> {
    Request::from_xml(ctx.signer.sign(&root.to_xml()?, id)?)
}

impl Provedor for Ginfes {
    fn nome(&self) -> &'static str {
        "GINFES"
    }

    fn url(&self, ambiente: Ambiente, _cidade: u32) -> Result<String, EdocError> {
        Ok(format!("https://{}/{ENDPOINT}", host(ambiente)))
    }

    fn operacao(
        &self,
        servico: ServicoNfse,
        _ambiente: Ambiente,
    ) -> Result<&'static str, EdocError> {
        Ok(match servico {
            ServicoNfse::EnvioLote => "RecepcionarLoteRpsV3",
            ServicoNfse::SituacaoLote => "ConsultarSituacaoLoteRpsV3",
            ServicoNfse::ConsultaLote => "ConsultarLoteRpsV3",
            ServicoNfse::ConsultaRps => "ConsultarNfsePorRpsV3",
            ServicoNfse::Cancelamento => "CancelarNfseV3",
        })
    }

    fn hints(&self, _operacao: &str, ambiente: Ambiente) -> RoutingHints {
        RoutingHints {
            namespace: Some(format!("http://{}", host(ambiente))),
            ..RoutingHints::default()
        }
        .header(CABECALHO)
    }

    fn prepara(&self, pedido: &Pedido<'_>, ctx: &Contexto<'_>) -> Result<Request, EdocError> {
        match pedido {
            Pedido::EnvioLote(lote) => {
                let mut lote = (*lote).clone();
                lote.numera(ctx.numero_lote, "Id")?;
                let mut xml = lote.to_xml()?;
                let ids = lote.rps_ids();
                debug!(rps = ids.len(), "signing GINFES batch");
                for id in &ids {
                    xml = ctx.signer.sign(&xml, id)?;
                }
                Request::from_xml(xml)
            }
            Pedido::SituacaoLote(envio_step) => {
                let protocolo = protocolo_do_envio(envio_step)?;
                let root = envio("ConsultarSituacaoLoteRpsEnvio")
                    .child(prestador(ctx.prestador))
                    .text_child("Protocolo", protocolo);
                signed(ctx, &root, "")
            }
            Pedido::ConsultaLote(protocolo) => {
                let id = format!("lote{}", ctx.numero_lote);
                let root = envio("ConsultarLoteRpsEnvio")
                    .attr("Id", id.as_str())
                    .child(prestador(ctx.prestador))
                    .text_child("Protocolo", *protocolo);
                signed(ctx, &root, &id)
            }
            Pedido::ConsultaRps(rps) => {
                let root = envio("ConsultarNfseRpsEnvio")
                    .child(
                        Element::new("IdentificacaoRps")
                            .text_child("tipos:Numero", rps.numero.as_str())
                            .text_child("tipos:Serie", rps.serie.as_str())
                            .text_child("tipos:Tipo", rps.tipo.as_str()),
                    )
                    .child(prestador(ctx.prestador));
                signed(ctx, &root, "")
            }
            Pedido::Cancelamento(pedido) => {
                let p = ctx.prestador;
                let inf = Element::new("tipos:InfPedidoCancelamento")
                    .attr("Id", pedido.chave.as_str())
                    .child(
                        Element::new("tipos:IdentificacaoNfse")
                            .text_child("tipos:Numero", pedido.chave.as_str())
                            .text_child("tipos:Cnpj", p.cnpj.as_str())
                            .text_child("tipos:InscricaoMunicipal", p.inscricao_municipal.as_str())
                            .text_child("tipos:CodigoMunicipio", p.cidade.to_string()),
                    )
                    .text_child(
                        "tipos:CodigoCancelamento",
                        pedido.codigo.as_deref().unwrap_or("0001"),
                    );
                let root = Element::new("CancelarNfseEnvio")
                    .attr("xmlns", "http://www.ginfes.com.br/servico_cancelar_nfse_envio")
                    .attr("xmlns:tipos", TIPOS)
                    .child(Element::new("Pedido").child(inf));
                signed(ctx, &root, "")
            }
        }
    }

    fn envio_aceito(&self, step: &ProcessingStep<NfseResposta>) -> bool {
        abrasf_envio_aceito(step)
    }

    fn em_processamento(&self, step: &ProcessingStep<NfseResposta>) -> bool {
        abrasf_em_processamento(step)
    }
}
