//! Barueri's own web service. The batch travels as a CDATA file inside
//! `NFeLoteEnviarArquivo` and is polled with `NFeLoteStatusArquivo`.

use tracing::debug;

use crate::core::{
    Ambiente, EdocError, Element, ProcessingStep, RawResponse, Request, RoutingHints,
    strip_declaration,
};

use super::provedor::{
    Contexto, Pedido, Provedor, ServicoNfse, abrasf_em_processamento, abrasf_envio_aceito,
    interpreta_abrasf, protocolo_do_envio,
};
use super::schema::NfseResposta;

pub const NAMESPACE: &str = "http://www.barueri.sp.gov.br/nfe";
const ENDPOINT: &str = "nfeservice/wsrps.asmx?WSDL";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Barueri;

fn host(ambiente: Ambiente) -> &'static str {
    match ambiente {
        Ambiente::Producao => "https://www.barueri.sp.gov.br",
        Ambiente::Homologacao => "https://testeeiss.barueri.sp.gov.br",
    }
}

/// `<![CDATA[...]]>`, splitting any `]]>` the content carries.
fn cdata(conteudo: &str) -> String {
    format!("<![CDATA[{}]]>", conteudo.replace("]]>", "]]]]><![CDATA[>"))
}

fn status_arquivo(ctx: &Contexto<'_>, protocolo: &str) -> Result<Request, EdocError> {
    let p = ctx.prestador;
    let root = Element::new("NFeLoteStatusArquivo")
        .attr("xmlns", NAMESPACE)
        .child(
            Element::new("Prestador")
                .text_child("CPFCNPJContrib", p.cnpj.as_str())
                .text_child("InscricaoMunicipal", p.inscricao_municipal.as_str()),
        )
        .text_child("ProtocoloRemessa", protocolo);
    Request::from_xml(ctx.signer.sign(&root.to_xml()?, "")?)
}

impl Provedor for Barueri {
    fn nome(&self) -> &'static str {
        "Barueri"
    }

    fn url(&self, ambiente: Ambiente, _cidade: u32) -> Result<String, EdocError> {
        Ok(format!("{}/{ENDPOINT}", host(ambiente)))
    }

    fn operacao(
        &self,
        servico: ServicoNfse,
        _ambiente: Ambiente,
    ) -> Result<&'static str, EdocError> {
        match servico {
            ServicoNfse::EnvioLote => Ok("NFeLoteEnviarArquivo"),
            ServicoNfse::SituacaoLote | ServicoNfse::ConsultaLote => Ok("NFeLoteStatusArquivo"),
            ServicoNfse::ConsultaRps => Ok("ConsultarNFeRecebidaNumero"),
            ServicoNfse::Cancelamento => Err(EdocError::Unsupported("Barueri cancellation")),
        }
    }

    fn hints(&self, _operacao: &str, _ambiente: Ambiente) -> RoutingHints {
        RoutingHints {
            namespace: Some(NAMESPACE.to_string()),
            ..RoutingHints::default()
        }
    }

    fn prepara(&self, pedido: &Pedido<'_>, ctx: &Contexto<'_>) -> Result<Request, EdocError> {
        match pedido {
            Pedido::EnvioLote(lote) => {
                let mut lote = (*lote).clone();
                lote.numera(ctx.numero_lote, "Id")?;
                let arquivo = lote.to_xml()?;
                debug!(bytes = arquivo.len(), "wrapping Barueri batch file");
                let mensagem = format!(
                    "<MensagemXML>{}</MensagemXML>",
                    cdata(strip_declaration(&arquivo))
                );
                let xml = Element::new("NFeLoteEnviarArquivo")
                    .attr("xmlns", NAMESPACE)
                    .text_child("VersaoSchema", "1")
                    .to_xml_wrapping(&mensagem)?;
                Request::from_xml(xml)
            }
            Pedido::SituacaoLote(envio_step) => {
                status_arquivo(ctx, protocolo_do_envio(envio_step)?)
            }
            Pedido::ConsultaLote(protocolo) => status_arquivo(ctx, protocolo),
            Pedido::ConsultaRps(rps) => {
                let root = Element::new("ConsultarNFeRecebidaNumero")
                    .attr("xmlns", NAMESPACE)
                    .child(
                        Element::new("IdentificacaoRps")
                            .text_child("NumeroNota", rps.numero.as_str()),
                    )
                    .child(
                        Element::new("Prestador")
                            .text_child("CPFCNPJPrestador", ctx.prestador.cnpj.as_str()),
                    );
                Request::from_xml(ctx.signer.sign(&root.to_xml()?, "")?)
            }
            Pedido::Cancelamento(_) => Err(EdocError::Unsupported("Barueri cancellation")),
        }
    }

    /// Lot queries share the status operation, so both read as a status.
    fn interpreta(
        &self,
        servico: ServicoNfse,
        operacao: &str,
        request: Request,
        raw: RawResponse,
    ) -> Result<ProcessingStep<NfseResposta>, EdocError> {
        let servico = match servico {
            ServicoNfse::ConsultaLote => ServicoNfse::SituacaoLote,
            other => other,
        };
        interpreta_abrasf(servico, operacao, request, raw)
    }

    fn envio_aceito(&self, step: &ProcessingStep<NfseResposta>) -> bool {
        abrasf_envio_aceito(step)
    }

    fn em_processamento(&self, step: &ProcessingStep<NfseResposta>) -> bool {
        abrasf_em_processamento(step)
    }
}
