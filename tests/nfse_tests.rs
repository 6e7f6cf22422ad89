//! NFS-e workflows for GINFES, ISSNet and Paulistana against scripted
//! municipal services.

#![cfg(feature = "nfse")]

mod common;

use std::cell::RefCell;
use std::time::Duration;

use common::{EchoSigner, Naps, Sefaz};
use nota::core::*;
use nota::nfse::*;

/// Records the element ids it was asked to sign.
#[derive(Default)]
struct Cartorio {
    ids: RefCell<Vec<String>>,
}

impl Signer for Cartorio {
    fn sign(&self, xml: &str, element_id: &str) -> Result<String, EdocError> {
        self.ids.borrow_mut().push(element_id.to_string());
        Ok(xml.to_string())
    }
}

/// Answer carried as escaped text inside the operation result, the way
/// most municipal services reply.
fn escapado(operation: &str, inner: &str) -> RawResponse {
    let text = inner
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    RawResponse::http(
        200,
        format!(
            "<soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\"><soap:Body><ns1:{operation}Response xmlns:ns1=\"http://producao.ginfes.com.br\"><return>{text}</return></ns1:{operation}Response></soap:Body></soap:Envelope>"
        ),
    )
}

fn lote_abrasf() -> LoteRps {
    LoteRps::from_xml(
        r#"<EnviarLoteRpsEnvio xmlns="http://www.ginfes.com.br/servico_enviar_lote_rps_envio_v03.xsd"><LoteRps><NumeroLote>0</NumeroLote><Cnpj>12345678000199</Cnpj><InscricaoMunicipal>4711</InscricaoMunicipal><QuantidadeRps>2</QuantidadeRps><ListaRps><Rps><InfRps Id="rps1"><IdentificacaoRps><Numero>1</Numero><Serie>A</Serie><Tipo>1</Tipo></IdentificacaoRps></InfRps></Rps><Rps><InfRps Id="rps2"><IdentificacaoRps><Numero>2</Numero><Serie>A</Serie><Tipo>1</Tipo></IdentificacaoRps></InfRps></Rps></ListaRps></LoteRps></EnviarLoteRpsEnvio>"#,
    )
    .unwrap()
}

fn situacao(codigo: u8) -> String {
    format!(
        "<ns3:ConsultarSituacaoLoteRpsResposta xmlns:ns3=\"http://www.ginfes.com.br/servico_consultar_situacao_lote_rps_resposta_v03.xsd\"><ns3:NumeroLote>1</ns3:NumeroLote><ns3:Situacao>{codigo}</ns3:Situacao></ns3:ConsultarSituacaoLoteRpsResposta>"
    )
}

// --- GINFES ---

#[test]
fn ginfes_batch_is_polled_until_processed() {
    let sefaz = Sefaz::default();
    sefaz
        .reply_raw(
            "RecepcionarLoteRpsV3",
            escapado(
                "RecepcionarLoteRpsV3",
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?><ns3:EnviarLoteRpsResposta xmlns:ns3=\"http://www.ginfes.com.br/servico_enviar_lote_rps_resposta_v03.xsd\"><ns3:NumeroLote>1</ns3:NumeroLote><ns3:DataRecebimento>2024-01-02T10:00:00</ns3:DataRecebimento><ns3:Protocolo>9876543</ns3:Protocolo></ns3:EnviarLoteRpsResposta>",
            ),
        )
        .reply_raw(
            "ConsultarSituacaoLoteRpsV3",
            escapado("ConsultarSituacaoLoteRpsV3", &situacao(2)),
        )
        .reply_raw(
            "ConsultarSituacaoLoteRpsV3",
            escapado("ConsultarSituacaoLoteRpsV3", &situacao(4)),
        );
    let cartorio = Cartorio::default();
    let naps = Naps::default();
    let prestador = Prestador::new("12345678000199", "4711", 3132404);
    let nfse = NFSe::para_cidade(&sefaz, &cartorio, prestador, Ambiente::Homologacao).unwrap();
    assert_eq!(nfse.provedor().nome(), "GINFES");

    let report = nfse
        .process_document(lote_abrasf())
        .with_sleeper(naps.clone())
        .complete()
        .unwrap();

    assert_eq!(report.state, WorkflowState::ReceiptResolved);
    assert_eq!(report.steps.len(), 2);
    assert_eq!(report.steps[0].response().and_then(NfseResposta::protocolo), Some("9876543"));
    assert_eq!(
        naps.taken(),
        [Duration::from_millis(1300), Duration::from_millis(1500)]
    );
    assert_eq!(
        sefaz.operations(),
        ["RecepcionarLoteRpsV3", "ConsultarSituacaoLoteRpsV3", "ConsultarSituacaoLoteRpsV3"]
    );

    // Each RPS signed in turn, then every status query at its root.
    assert_eq!(*cartorio.ids.borrow(), ["rps1", "rps2", "", ""]);

    let envio = sefaz.call(0);
    assert_eq!(envio.url, "https://homologacao.ginfes.com.br/ServiceGinfesImpl?wsdl");
    assert!(envio.hints.header.as_deref().unwrap().contains("cabecalho_v03.xsd"));
    let lote = report.steps[0].request_root();
    let numero = lote.text_at(&["LoteRps", "NumeroLote"]).unwrap();
    assert_eq!(numero.len(), 14);
    assert_eq!(
        lote.find("LoteRps").and_then(|l| l.attribute("Id")),
        Some(format!("lote{numero}").as_str())
    );

    let consulta = report.steps[1].request_root();
    assert_eq!(consulta.local_name(), "ConsultarSituacaoLoteRpsEnvio");
    assert_eq!(consulta.child_text("Protocolo").as_deref(), Some("9876543"));
}

#[test]
fn ginfes_rejection_ends_with_messages() {
    let sefaz = Sefaz::default();
    sefaz.reply_raw(
        "RecepcionarLoteRpsV3",
        escapado(
            "RecepcionarLoteRpsV3",
            "<EnviarLoteRpsResposta><ListaMensagemRetorno><MensagemRetorno><Codigo>E160</Codigo><Mensagem>Arquivo em desacordo com o XML Schema.</Mensagem></MensagemRetorno></ListaMensagemRetorno></EnviarLoteRpsResposta>",
        ),
    );
    let prestador = Prestador::new("12345678000199", "4711", 3516200);
    let nfse = NFSe::para_cidade(&sefaz, EchoSigner, prestador, Ambiente::Producao).unwrap();

    let report = nfse.process_document(lote_abrasf()).complete().unwrap();
    assert_eq!(report.state, WorkflowState::Aborted(AbortReason::Rejected));
    // No status or duplicate check for NFS-e: the submission is the only step.
    assert_eq!(report.steps.len(), 1);
    let msgs = report.steps[0].response().unwrap().mensagens();
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].codigo.as_deref(), Some("E160"));
    assert!(sefaz.call(0).url.starts_with("https://producao.ginfes.com.br/"));
}

#[test]
fn ginfes_lot_query_lists_notes() {
    let sefaz = Sefaz::default();
    sefaz.reply_raw(
        "ConsultarLoteRpsV3",
        escapado(
            "ConsultarLoteRpsV3",
            "<ConsultarLoteRpsResposta><ListaNfse><CompNfse><Nfse><InfNfse><Numero>101</Numero><CodigoVerificacao>ABCD1234</CodigoVerificacao><DataEmissao>2024-01-02T10:05:00</DataEmissao></InfNfse></Nfse></CompNfse><CompNfse><Nfse><InfNfse><Numero>102</Numero></InfNfse></Nfse><NfseCancelamento/></CompNfse></ListaNfse></ConsultarLoteRpsResposta>",
        ),
    );
    let nfse = NFSe::new(
        &sefaz,
        EchoSigner,
        Ginfes,
        Prestador::new("12345678000199", "4711", 3132404),
        Ambiente::Homologacao,
    );

    let step = nfse.consultar_lote_rps("9876543").unwrap();
    let notas = step.response().unwrap().nfses();
    assert_eq!(notas.len(), 2);
    assert_eq!(notas[0].numero.as_deref(), Some("101"));
    assert_eq!(notas[0].codigo_verificacao.as_deref(), Some("ABCD1234"));
    assert!(!notas[0].cancelada);
    assert!(notas[1].cancelada);
}

#[test]
fn ginfes_cancellation_defaults_reason_code() {
    let sefaz = Sefaz::default();
    sefaz.reply_raw(
        "CancelarNfseV3",
        escapado(
            "CancelarNfseV3",
            "<CancelarNfseResposta><Sucesso>true</Sucesso><DataHora>2024-01-03T09:00:00</DataHora></CancelarNfseResposta>",
        ),
    );
    let nfse = NFSe::new(
        &sefaz,
        EchoSigner,
        Ginfes,
        Prestador::new("12345678000199", "4711", 3132404),
        Ambiente::Homologacao,
    );

    let step = nfse
        .cancela_documento(&Cancelamento::new("101", "", "erro na emissao"))
        .unwrap();
    let Some(NfseResposta::Cancelamento(resp)) = step.response() else {
        panic!("unexpected response {:?}", step.response());
    };
    assert!(resp.sucesso);
    assert_eq!(resp.data_hora.as_deref(), Some("2024-01-03T09:00:00"));
    let inf = step
        .request_root()
        .find_path(&["Pedido", "InfPedidoCancelamento"])
        .unwrap();
    assert_eq!(inf.child_text("CodigoCancelamento").as_deref(), Some("0001"));
    assert_eq!(inf.text_at(&["IdentificacaoNfse", "CodigoMunicipio"]).as_deref(), Some("3132404"));
}

// --- ISSNet ---

#[test]
fn issnet_signs_the_lot_and_queries_unsigned() {
    let sefaz = Sefaz::default();
    sefaz
        .reply(
            "RecepcionarLoteRps",
            "<EnviarLoteRpsResposta><NumeroLote>1</NumeroLote><Protocolo>P-1</Protocolo></EnviarLoteRpsResposta>",
        )
        .reply("ConsultarSituacaoLoteRPS", &situacao(4));
    let cartorio = Cartorio::default();
    let prestador = Prestador::new("12345678000199", "4711", 3543402);
    let nfse = NFSe::para_cidade(&sefaz, &cartorio, prestador, Ambiente::Producao).unwrap();

    let report = nfse
        .process_document(lote_abrasf())
        .with_sleeper(Naps::default())
        .complete()
        .unwrap();

    assert_eq!(report.state, WorkflowState::ReceiptResolved);
    let ids = cartorio.ids.borrow();
    assert_eq!(ids.len(), 1);
    assert!(ids[0].starts_with("lote"));
    assert_eq!(
        sefaz.call(0).url,
        "https://www.issnetonline.com.br/webserviceabrasf/ribeiraopreto/servicos.asmx?WSDL"
    );
    assert_eq!(
        report.steps[0].request_root().find("LoteRps").and_then(|l| l.attribute("id")),
        Some(ids[0].as_str())
    );
}

#[test]
fn issnet_cancellation_uses_test_city_in_homologation() {
    let sefaz = Sefaz::default();
    sefaz.reply(
        "CancelarNfse",
        "<CancelarNfseResposta><Cancelamento><Confirmacao><DataHoraCancelamento>2024-01-03T09:00:00</DataHoraCancelamento></Confirmacao></Cancelamento></CancelarNfseResposta>",
    );
    let prestador = Prestador::new("12345678000199", "4711", 3543402);
    let nfse = NFSe::para_cidade(&sefaz, EchoSigner, prestador, Ambiente::Homologacao).unwrap();

    let step = nfse
        .cancela_documento(&Cancelamento::new("55", "", "servico nao prestado").codigo("2"))
        .unwrap();
    let Some(NfseResposta::Cancelamento(resp)) = step.response() else {
        panic!("unexpected response {:?}", step.response());
    };
    assert!(resp.sucesso);
    let inf = step
        .request_root()
        .find_path(&["Pedido", "InfPedidoCancelamento"])
        .unwrap();
    assert_eq!(inf.text_at(&["IdentificacaoNfse", "CodigoMunicipio"]).as_deref(), Some("999"));
    assert_eq!(inf.child_text("CodigoCancelamento").as_deref(), Some("2"));
    assert!(sefaz.call(0).url.contains("/homologacao/"));
}

// --- Paulistana ---

fn lote_paulistana() -> LoteRps {
    LoteRps::from_xml(
        r#"<PedidoEnvioLoteRPS xmlns="http://www.prefeitura.sp.gov.br/nfe"><Cabecalho Versao="1" xmlns=""><CPFCNPJRemetente><CNPJ>12345678000199</CNPJ></CPFCNPJRemetente><transacao>true</transacao><QtdRPS>1</QtdRPS></Cabecalho><RPS xmlns=""><Assinatura>abc</Assinatura><ChaveRPS><InscricaoPrestador>39616924</InscricaoPrestador><SerieRPS>A</SerieRPS><NumeroRPS>1</NumeroRPS></ChaveRPS></RPS></PedidoEnvioLoteRPS>"#,
    )
    .unwrap()
}

fn paulistana(operation: &str, inner: &str) -> RawResponse {
    let text = inner.replace('<', "&lt;").replace('>', "&gt;");
    RawResponse::http(
        200,
        format!(
            "<soap:Envelope xmlns:soap=\"http://www.w3.org/2003/05/soap-envelope\"><soap:Body><{operation}Response xmlns=\"http://www.prefeitura.sp.gov.br/nfe\"><RetornoXML>{text}</RetornoXML></{operation}Response></soap:Body></soap:Envelope>"
        ),
    )
}

#[test]
fn paulistana_submission_is_confirmed_by_lot_query() {
    let sefaz = Sefaz::default();
    sefaz
        .reply_raw(
            "TesteEnvioLoteRPS",
            paulistana(
                "TesteEnvioLoteRPS",
                "<RetornoEnvioLoteRPS xmlns=\"http://www.prefeitura.sp.gov.br/nfe\"><Cabecalho Versao=\"1\" xmlns=\"\"><Sucesso>true</Sucesso><InformacoesLote><NumeroLote>4711</NumeroLote><InscricaoPrestador>39616924</InscricaoPrestador><CPFCNPJRemetente><CNPJ>12345678000199</CNPJ></CPFCNPJRemetente></InformacoesLote></Cabecalho></RetornoEnvioLoteRPS>",
            ),
        )
        .reply_raw(
            "ConsultaLote",
            paulistana(
                "ConsultaLote",
                "<RetornoConsulta xmlns=\"http://www.prefeitura.sp.gov.br/nfe\"><Cabecalho Versao=\"1\" xmlns=\"\"><Sucesso>true</Sucesso></Cabecalho><NFe xmlns=\"\"><ChaveNFe><InscricaoPrestador>39616924</InscricaoPrestador><NumeroNFe>8</NumeroNFe><CodigoVerificacao>XY12AB34</CodigoVerificacao></ChaveNFe><DataEmissaoNFe>2024-01-02T10:00:00</DataEmissaoNFe><StatusNFe>N</StatusNFe></NFe></RetornoConsulta>",
            ),
        );
    let prestador = Prestador::new("12345678000199", "39616924", 3550308);
    let nfse = NFSe::para_cidade(&sefaz, EchoSigner, prestador, Ambiente::Homologacao).unwrap();

    let report = nfse
        .process_document(lote_paulistana())
        .with_sleeper(Naps::default())
        .complete()
        .unwrap();

    assert_eq!(report.state, WorkflowState::ReceiptResolved);
    assert_eq!(sefaz.operations(), ["TesteEnvioLoteRPS", "ConsultaLote"]);

    // "abc" signed by the echo signer is "cba".
    let Payload::Xml(xml) = &sefaz.call(0).payload else {
        panic!("expected XML payload");
    };
    assert!(xml.contains("<Assinatura>Y2Jh</Assinatura>"));
    assert_eq!(
        sefaz.call(0).hints.message_element.as_deref(),
        Some("TesteEnvioLoteRPSRequest")
    );

    let consulta = report.steps[1].request_root();
    assert_eq!(consulta.local_name(), "PedidoConsultaLote");
    assert_eq!(consulta.text_at(&["Cabecalho", "NumeroLote"]).as_deref(), Some("4711"));

    let notas = report.last().unwrap().response().unwrap().nfses();
    assert_eq!(notas.len(), 1);
    assert_eq!(notas[0].numero.as_deref(), Some("8"));
    assert_eq!(notas[0].codigo_verificacao.as_deref(), Some("XY12AB34"));
}

#[test]
fn paulistana_failure_is_a_rejection() {
    let sefaz = Sefaz::default();
    sefaz.reply_raw(
        "EnvioLoteRPS",
        paulistana(
            "EnvioLoteRPS",
            "<RetornoEnvioLoteRPS><Cabecalho Versao=\"1\"><Sucesso>false</Sucesso></Cabecalho><Erro><Codigo>1057</Codigo><Descricao>Assinatura difere do calculado.</Descricao></Erro></RetornoEnvioLoteRPS>",
        ),
    );
    let prestador = Prestador::new("12345678000199", "39616924", 3550308);
    let nfse = NFSe::para_cidade(&sefaz, EchoSigner, prestador, Ambiente::Producao).unwrap();

    let report = nfse.process_document(lote_paulistana()).complete().unwrap();
    assert_eq!(report.state, WorkflowState::Aborted(AbortReason::Rejected));
    assert_eq!(report.steps.len(), 1);
    let erros = report.steps[0].response().unwrap().mensagens();
    assert_eq!(erros[0].codigo.as_deref(), Some("1057"));
    assert_eq!(erros[0].mensagem.as_deref(), Some("Assinatura difere do calculado."));
}

#[test]
fn paulistana_needs_a_pkcs1_capable_signer() {
    struct XmlOnly;
    impl Signer for XmlOnly {
        fn sign(&self, xml: &str, _element_id: &str) -> Result<String, EdocError> {
            Ok(xml.to_string())
        }
    }

    let sefaz = Sefaz::default();
    let prestador = Prestador::new("12345678000199", "39616924", 3550308);
    let nfse = NFSe::para_cidade(&sefaz, XmlOnly, prestador, Ambiente::Producao).unwrap();
    let err = nfse.process_document(lote_paulistana()).complete().unwrap_err();
    assert!(matches!(err, EdocError::Unsupported(_)));
    assert!(sefaz.calls.borrow().is_empty());
}

// --- Barueri ---

const BARUERI: u32 = 3505708;

fn barueri_status(situacao: u8) -> String {
    format!(
        "<NFeLoteStatusArquivoResposta xmlns=\"http://www.barueri.sp.gov.br/nfe\">\
         <Situacao>{situacao}</Situacao></NFeLoteStatusArquivoResposta>"
    )
}

#[test]
fn barueri_batch_travels_as_cdata_and_is_polled() {
    let sefaz = Sefaz::default();
    sefaz
        .reply(
            "NFeLoteEnviarArquivo",
            "<NFeLoteEnviarArquivoResposta xmlns=\"http://www.barueri.sp.gov.br/nfe\">\
             <Protocolo>B-42</Protocolo></NFeLoteEnviarArquivoResposta>",
        )
        .reply("NFeLoteStatusArquivo", &barueri_status(2))
        .reply("NFeLoteStatusArquivo", &barueri_status(4));
    let naps = Naps::default();
    let prestador = Prestador::new("12345678000199", "77001", BARUERI);
    let nfse = NFSe::para_cidade(&sefaz, EchoSigner, prestador, Ambiente::Homologacao).unwrap();
    assert_eq!(nfse.provedor().nome(), "Barueri");

    let report = nfse
        .process_document(lote_abrasf())
        .with_sleeper(naps.clone())
        .complete()
        .unwrap();

    assert_eq!(report.state, WorkflowState::ReceiptResolved);
    assert_eq!(report.steps.len(), 2);
    assert_eq!(
        sefaz.operations(),
        ["NFeLoteEnviarArquivo", "NFeLoteStatusArquivo", "NFeLoteStatusArquivo"]
    );
    assert_eq!(
        naps.taken(),
        [Duration::from_millis(1300), Duration::from_millis(1500)]
    );

    let envio = sefaz.call(0);
    assert_eq!(
        envio.url,
        "https://testeeiss.barueri.sp.gov.br/nfeservice/wsrps.asmx?WSDL"
    );
    assert_eq!(
        envio.hints.namespace.as_deref(),
        Some("http://www.barueri.sp.gov.br/nfe")
    );
    assert_eq!(envio.hints.header, None);
    let Payload::Xml(xml) = &envio.payload else {
        panic!("expected XML payload");
    };
    assert!(xml.starts_with(
        "<NFeLoteEnviarArquivo xmlns=\"http://www.barueri.sp.gov.br/nfe\">\
         <VersaoSchema>1</VersaoSchema><MensagemXML><![CDATA[<EnviarLoteRpsEnvio"
    ));
    assert!(xml.ends_with("]]></MensagemXML></NFeLoteEnviarArquivo>"));

    // The file inside MensagemXML is the numbered batch itself.
    let mensagem = report.steps[0].request_root().child_text("MensagemXML").unwrap();
    let arquivo = Element::parse(&mensagem).unwrap();
    assert_eq!(arquivo.local_name(), "EnviarLoteRpsEnvio");
    assert_eq!(arquivo.text_at(&["LoteRps", "NumeroLote"]).map(|n| n.len()), Some(14));

    let status = report.steps[1].request_root();
    assert_eq!(status.local_name(), "NFeLoteStatusArquivo");
    assert_eq!(status.child_text("ProtocoloRemessa").as_deref(), Some("B-42"));
    assert_eq!(
        status.text_at(&["Prestador", "CPFCNPJContrib"]).as_deref(),
        Some("12345678000199")
    );
    assert_eq!(
        report.last().and_then(|s| s.response()),
        Some(&NfseResposta::SituacaoLote(ConsultarSituacaoLoteRpsResposta {
            numero_lote: None,
            situacao: Some(4),
            mensagens: vec![],
        }))
    );
}

#[test]
fn barueri_rps_query_is_checked_against_the_issuer() {
    let sefaz = Sefaz::default();
    sefaz
        .reply(
            "ConsultarNFeRecebidaNumero",
            "<ConsultarNFeRecebidaNumeroResposta><CompNfse><Nfse><InfNfse>\
             <Numero>31</Numero><CodigoVerificacao>BQ7</CodigoVerificacao>\
             <PrestadorServico><IdentificacaoPrestador><Cnpj>12345678000199</Cnpj>\
             </IdentificacaoPrestador><RazaoSocial>Oficina Exemplo Ltda</RazaoSocial>\
             </PrestadorServico></InfNfse></Nfse></CompNfse></ConsultarNFeRecebidaNumeroResposta>",
        )
        .reply(
            "ConsultarNFeRecebidaNumero",
            "<ConsultarNFeRecebidaNumeroResposta><ListaMensagemRetorno><MensagemRetorno>\
             <Codigo>E4</Codigo><Mensagem>Nota nao encontrada</Mensagem>\
             <Correcao>Confira o numero</Correcao></MensagemRetorno></ListaMensagemRetorno>\
             </ConsultarNFeRecebidaNumeroResposta>",
        );
    let prestador = Prestador::new("12345678000199", "77001", BARUERI);
    let nfse = NFSe::para_cidade(&sefaz, EchoSigner, prestador, Ambiente::Producao).unwrap();
    let empresa = Conferencia::new("12.345.678/0001-99", "Oficina Exemplo Ltda").numero("31");

    let achada = nfse
        .confere_nfse_rps(&IdentificacaoRps::new("31", "A"), &empresa)
        .unwrap();
    let ResultadoConsultaNfse::Confere(nota) = &achada else {
        panic!("expected a matching note, got {achada:?}");
    };
    assert_eq!(nota.codigo_verificacao.as_deref(), Some("BQ7"));

    let ausente = nfse
        .confere_nfse_rps(&IdentificacaoRps::new("32", "A"), &empresa)
        .unwrap();
    assert!(!ausente.enviada());
    assert_eq!(
        ausente.to_string(),
        "E4 - Nota nao encontrada - Correção: Confira o numero"
    );

    let Payload::Xml(xml) = &sefaz.call(0).payload else {
        panic!("expected XML payload");
    };
    let consulta = Element::parse(xml).unwrap();
    assert_eq!(consulta.local_name(), "ConsultarNFeRecebidaNumero");
    assert_eq!(
        consulta.text_at(&["IdentificacaoRps", "NumeroNota"]).as_deref(),
        Some("31")
    );
    assert_eq!(
        consulta.text_at(&["Prestador", "CPFCNPJPrestador"]).as_deref(),
        Some("12345678000199")
    );
    assert!(sefaz.call(0).url.starts_with("https://www.barueri.sp.gov.br/"));
}

#[test]
fn barueri_offers_no_cancellation() {
    let sefaz = Sefaz::default();
    let prestador = Prestador::new("12345678000199", "77001", BARUERI);
    let nfse = NFSe::para_cidade(&sefaz, EchoSigner, prestador, Ambiente::Producao).unwrap();
    let err = nfse
        .cancela_documento(&Cancelamento::new("31", "", "erro na emissao"))
        .unwrap_err();
    assert!(matches!(err, EdocError::Unsupported(_)));
    assert!(sefaz.calls.borrow().is_empty());
}

// --- Query outcomes ---

#[test]
fn ginfes_cancelled_note_is_reported_with_its_date() {
    let sefaz = Sefaz::default();
    sefaz.reply_raw(
        "ConsultarNfsePorRpsV3",
        escapado(
            "ConsultarNfsePorRpsV3",
            "<ConsultarNfseRpsResposta><CompNfse><Nfse><InfNfse><Numero>101</Numero>\
             </InfNfse></Nfse><NfseCancelamento><Confirmacao>\
             <DataHora>2024-02-10T08:30:00</DataHora></Confirmacao></NfseCancelamento>\
             </CompNfse></ConsultarNfseRpsResposta>",
        ),
    );
    let nfse = NFSe::new(
        &sefaz,
        EchoSigner,
        Ginfes,
        Prestador::new("12345678000199", "4711", 3132404),
        Ambiente::Homologacao,
    );

    let resultado = nfse
        .confere_nfse_rps(
            &IdentificacaoRps::new("1", "A"),
            &Conferencia::new("12345678000199", "Oficina Exemplo Ltda"),
        )
        .unwrap();
    assert!(resultado.enviada());
    assert_eq!(resultado.to_string(), "NFS-e cancelada em 10/02/2024");
}

// --- Provider table ---

#[test]
fn unknown_and_dsf_cities_have_no_adapter() {
    let sefaz = Sefaz::default();
    let prestador = Prestador::new("1", "1", 9999999);
    let err = NFSe::para_cidade(&sefaz, EchoSigner, prestador, Ambiente::Producao).err();
    assert!(matches!(err, Some(EdocError::Config(_))));
    let prestador = Prestador::new("1", "1", 3509502);
    let err = NFSe::para_cidade(&sefaz, EchoSigner, prestador, Ambiente::Producao).err();
    assert!(matches!(err, Some(EdocError::Unsupported(_))));
    assert_eq!(provedor_da_cidade(3509502), Some(ProvedorNfse::Dsf));
}

#[test]
fn no_status_or_key_lookup() {
    let nfse = NFSe::new(
        Sefaz::default(),
        EchoSigner,
        Ginfes,
        Prestador::new("12345678000199", "4711", 3132404),
        Ambiente::Producao,
    );
    assert!(matches!(nfse.status_servico(), Err(EdocError::Unsupported(_))));
    assert!(matches!(
        nfse.consulta_documento(&DocumentKey::new("lote", "1")),
        Err(EdocError::Unsupported(_))
    ));
}
