//! ISSNet Online, ABRASF 1.00 with a per-city production path.

use crate::core::{Ambiente, EdocError, Element, ProcessingStep, Request, RoutingHints};

use super::document::Prestador;
use super::provedor::{
    Contexto, Pedido, Provedor, ServicoNfse, abrasf_em_processamento, abrasf_envio_aceito,
    protocolo_do_envio,
};
use super::schema::NfseResposta;

const BASE: &str = "https://www.issnetonline.com.br/webserviceabrasf";
const ENDPOINT: &str = "servicos.asmx?WSDL";
const VSD: &str = "http://www.issnetonline.com.br/webserviceabrasf/vsd";

/// Production path segment per IBGE city code.
static CIDADES: &[(u32, &str)] = &[
    (3543402, "ribeiraopreto"),
    (3301702, "duquedecaxias"),
];

/// Municipality code ISSNet expects in homologation.
const MUNICIPIO_HOMOLOGACAO: &str = "999";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Issnet;

fn prestador(p: &Prestador) -> Element {
    Element::new("Prestador")
        .child(Element::new("tc:CpfCnpj").text_child("tc:Cnpj", p.cnpj.as_str()))
        .text_child("tc:InscricaoMunicipal", p.inscricao_municipal.as_str())
}

fn envio(root: &str, xsd: &str) -> Element {
    Element::new(root)
        .attr("xmlns", format!("{VSD}/{xsd}.xsd"))
        .attr("xmlns:tc", format!("{VSD}/tipos_complexos.xsd"))
}

impl Provedor for Issnet {
    fn nome(&self) -> &'static str {
        "ISSNet"
    }

    fn url(&self, ambiente: Ambiente, cidade: u32) -> Result<String, EdocError> {
        let path = match ambiente {
            Ambiente::Homologacao => "homologacao",
            Ambiente::Producao => CIDADES
                .iter()
                .find(|(c, _)| *c == cidade)
                .map(|(_, p)| *p)
                .ok_or_else(|| EdocError::Config(format!("ISSNet does not serve city {cidade}")))?,
        };
        Ok(format!("{BASE}/{path}/{ENDPOINT}"))
    }

    fn operacao(
        &self,
        servico: ServicoNfse,
        _ambiente: Ambiente,
    ) -> Result<&'static str, EdocError> {
        Ok(match servico {
            ServicoNfse::EnvioLote => "RecepcionarLoteRps",
            ServicoNfse::SituacaoLote => "ConsultarSituacaoLoteRPS",
            ServicoNfse::ConsultaLote => "ConsultarLoteRps",
            ServicoNfse::ConsultaRps => "ConsultarNFSePorRPS",
            ServicoNfse::Cancelamento => "CancelarNfse",
        })
    }

    fn hints(&self, _operacao: &str, _ambiente: Ambiente) -> RoutingHints {
        RoutingHints::new("http://www.issnetonline.com.br/webservice/nfd", "xml")
    }

    fn prepara(&self, pedido: &Pedido<'_>, ctx: &Contexto<'_>) -> Result<Request, EdocError> {
        match pedido {
            Pedido::EnvioLote(lote) => {
                let mut lote = (*lote).clone();
                let id = lote.numera(ctx.numero_lote, "id")?;
                Request::from_xml(ctx.signer.sign(&lote.to_xml()?, &id)?)
            }
            Pedido::SituacaoLote(envio_step) => {
                let root = envio(
                    "ConsultarSituacaoLoteRpsEnvio",
                    "servico_consultar_situacao_lote_rps_envio",
                )
                .child(prestador(ctx.prestador))
                .text_child("Protocolo", protocolo_do_envio(envio_step)?);
                Request::from_element(root)
            }
            Pedido::ConsultaLote(protocolo) => {
                let root = envio("ConsultarLoteRpsEnvio", "servico_consultar_lote_rps_envio")
                    .child(prestador(ctx.prestador))
                    .text_child("Protocolo", *protocolo);
                Request::from_element(root)
            }
            Pedido::ConsultaRps(rps) => {
                let root = envio("ConsultarNfseRpsEnvio", "servico_consultar_nfse_rps_envio")
                    .child(
                        Element::new("IdentificacaoRps")
                            .text_child("tc:Numero", rps.numero.as_str())
                            .text_child("tc:Serie", rps.serie.as_str())
                            .text_child("tc:Tipo", rps.tipo.as_str()),
                    )
                    .child(prestador(ctx.prestador));
                Request::from_element(root)
            }
            Pedido::Cancelamento(pedido) => {
                let p = ctx.prestador;
                let municipio = match ctx.ambiente {
                    Ambiente::Producao => p.cidade.to_string(),
                    Ambiente::Homologacao => MUNICIPIO_HOMOLOGACAO.to_string(),
                };
                let inner = Element::new("Pedido")
                    .attr("xmlns", format!("{VSD}/servico_cancelar_nfse_envio.xsd"))
                    .attr("xmlns:tc", format!("{VSD}/tipos_complexos.xsd"))
                    .child(
                        Element::new("tc:InfPedidoCancelamento")
                            .attr("id", pedido.chave.as_str())
                            .child(
                                Element::new("tc:IdentificacaoNfse")
                                    .text_child("tc:Numero", pedido.chave.as_str())
                                    .text_child("tc:Cnpj", p.cnpj.as_str())
                                    .text_child(
                                        "tc:InscricaoMunicipal",
                                        p.inscricao_municipal.as_str(),
                                    )
                                    .text_child("tc:CodigoMunicipio", municipio),
                            )
                            .text_child(
                                "tc:CodigoCancelamento",
                                pedido.codigo.as_deref().unwrap_or("0001"),
                            ),
                    );
                // The signature belongs inside Pedido, so Pedido is signed on
                // its own and then wrapped.
                let pedido_assinado = ctx.signer.sign(&inner.to_xml()?, "")?;
                let xml = Element::new("p1:CancelarNfseEnvio")
                    .attr("xmlns:p1", format!("{VSD}/servico_cancelar_nfse_envio.xsd"))
                    .attr("xmlns:tc", format!("{VSD}/tipos_complexos.xsd"))
                    .attr("xmlns:ts", format!("{VSD}/tipos_simples.xsd"))
                    .to_xml_wrapping(&pedido_assinado)?;
                Request::from_xml(xml)
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
