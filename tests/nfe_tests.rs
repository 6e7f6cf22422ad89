//! End-to-end NF-e workflows against a scripted SEFAZ.

#![cfg(feature = "nfe")]

mod common;

use std::time::Duration;

use common::{EchoSigner, Naps, Sefaz};
use nota::core::*;
use nota::nfe::*;

const CHAVE: &str = "35200159594315000157550010000000012062777161";

fn documento() -> NfeDocument {
    NfeDocument::from_xml(&format!(
        r#"<NFe><infNFe Id="NFe{CHAVE}" versao="4.00"><ide><cUF>35</cUF><mod>55</mod></ide><total><ICMSTot><vNF>100.00</vNF></ICMSTot></total></infNFe></NFe>"#
    ))
    .unwrap()
}

fn status(c_stat: &str) -> String {
    format!(
        "<retConsStatServ versao=\"4.00\"><tpAmb>2</tpAmb><cStat>{c_stat}</cStat><xMotivo>Servico</xMotivo></retConsStatServ>"
    )
}

fn consulta(c_stat: &str) -> String {
    format!(
        "<retConsSitNFe versao=\"4.00\"><cStat>{c_stat}</cStat><xMotivo>x</xMotivo><chNFe>{CHAVE}</chNFe></retConsSitNFe>"
    )
}

fn lote_recebido() -> String {
    lote_com_espera("1")
}

fn lote_com_espera(t_med: &str) -> String {
    format!(
        "<retEnviNFe versao=\"4.00\"><cStat>103</cStat><xMotivo>Lote recebido com sucesso</xMotivo>\
         <infRec><nRec>351000000000001</nRec><tMed>{t_med}</tMed></infRec></retEnviNFe>"
    )
}

fn recibo(c_stat: &str, prot: bool) -> String {
    let prot = if prot {
        format!(
            "<protNFe versao=\"4.00\"><infProt><chNFe>{CHAVE}</chNFe><nProt>135200000000009</nProt><cStat>100</cStat><xMotivo>Autorizado o uso da NF-e</xMotivo></infProt></protNFe>"
        )
    } else {
        String::new()
    };
    format!(
        "<retConsReciNFe versao=\"4.00\"><nRec>351000000000001</nRec><cStat>{c_stat}</cStat><xMotivo>x</xMotivo>{prot}</retConsReciNFe>"
    )
}

// --- Full workflow ---

#[test]
fn authorizes_after_one_processing_poll() {
    let sefaz = Sefaz::default();
    sefaz
        .reply("nfeStatusServicoNF", &status("107"))
        .reply("nfeConsultaNF", &consulta("217"))
        .reply("nfeAutorizacaoLote", &lote_recebido())
        .reply("nfeRetAutorizacaoLote", &recibo("105", false))
        .reply("nfeRetAutorizacaoLote", &recibo("104", true));
    let naps = Naps::default();
    let nfe = NFe::new(&sefaz, EchoSigner, Uf::SP, Ambiente::Homologacao);

    let report = nfe
        .process_document(documento())
        .with_sleeper(naps.clone())
        .complete()
        .unwrap();

    assert_eq!(report.state, WorkflowState::ReceiptResolved);
    let ops: Vec<&str> = report.steps.iter().map(|s| s.operation()).collect();
    assert_eq!(
        ops,
        ["nfeStatusServicoNF", "nfeConsultaNF", "nfeAutorizacaoLote", "nfeRetAutorizacaoLote"]
    );
    assert_eq!(
        naps.taken(),
        [Duration::from_millis(1300), Duration::from_millis(1500)]
    );
    assert_eq!(sefaz.operations().len(), 5);

    let last = report.last().unwrap();
    assert_eq!(last.response().and_then(NfeResposta::c_stat), Some("104"));
    let proc = last.processed().unwrap();
    assert_eq!(proc.protocol.as_deref(), Some("135200000000009"));
    assert!(proc.xml.starts_with(
        "<nfeProc xmlns=\"http://www.portalfiscal.inf.br/nfe\" versao=\"4.00\"><NFe xmlns=\"http://www.portalfiscal.inf.br/nfe\">"
    ));
    assert!(proc.xml.contains("<nProt>135200000000009</nProt>"));
    assert!(proc.xml.ends_with("</protNFe></nfeProc>"));
}

#[test]
fn submission_is_a_batch_with_async_flag() {
    let sefaz = Sefaz::default();
    sefaz
        .reply("nfeStatusServicoNF", &status("107"))
        .reply("nfeConsultaNF", &consulta("217"))
        .reply(
            "nfeAutorizacaoLote",
            "<retEnviNFe><cStat>225</cStat><xMotivo>Falha no Schema</xMotivo></retEnviNFe>",
        );
    let nfe = NFe::new(&sefaz, EchoSigner, Uf::SP, Ambiente::Homologacao);

    let report = nfe.process_document(documento()).complete().unwrap();
    assert_eq!(report.state, WorkflowState::Aborted(AbortReason::Rejected));
    assert_eq!(report.steps.len(), 3);

    let call = sefaz.call(2);
    assert_eq!(call.operation, "nfeAutorizacaoLote");
    assert!(call.url.contains("homologacao.nfe.fazenda.sp.gov.br"));
    assert_eq!(call.hints.message_element.as_deref(), Some("nfeDadosMsg"));
    assert_eq!(call.hints.c_uf, Some(35));
    assert_eq!(call.hints.versao_dados.as_deref(), Some("4.00"));
    let Payload::Xml(xml) = &call.payload else {
        panic!("expected an XML payload, got {:?}", call.payload);
    };
    let lote = Element::parse(xml).unwrap();
    assert_eq!(lote.local_name(), "enviNFe");
    assert_eq!(lote.child_text("indSinc").as_deref(), Some("0"));
    assert_eq!(lote.child_text("idLote").map(|l| l.len()), Some(14));
    assert!(lote.find("NFe").is_some());
}

// --- Early stops ---

#[test]
fn stops_when_service_is_down() {
    let sefaz = Sefaz::default();
    sefaz.reply("nfeStatusServicoNF", &status("108"));
    let nfe = NFe::new(&sefaz, EchoSigner, Uf::MG, Ambiente::Producao);

    let report = nfe.process_document(documento()).complete().unwrap();
    assert_eq!(report.steps.len(), 1);
    assert_eq!(report.state, WorkflowState::Aborted(AbortReason::ServiceUnavailable));
    assert_eq!(sefaz.operations(), ["nfeStatusServicoNF"]);
}

#[test]
fn stops_when_key_already_known() {
    for c_stat in ["100", "110", "150", "301", "302"] {
        let sefaz = Sefaz::default();
        sefaz
            .reply("nfeStatusServicoNF", &status("107"))
            .reply("nfeConsultaNF", &consulta(c_stat));
        let nfe = NFe::new(&sefaz, EchoSigner, Uf::SP, Ambiente::Homologacao);

        let report = nfe.process_document(documento()).complete().unwrap();
        assert_eq!(report.steps.len(), 2, "cStat {c_stat}");
        assert_eq!(report.state, WorkflowState::Aborted(AbortReason::AlreadyFiled));
    }
}

#[test]
fn gives_up_after_five_processing_polls() {
    let sefaz = Sefaz::default();
    sefaz
        .reply("nfeStatusServicoNF", &status("107"))
        .reply("nfeConsultaNF", &consulta("217"))
        .reply("nfeAutorizacaoLote", &lote_recebido());
    for _ in 0..6 {
        sefaz.reply("nfeRetAutorizacaoLote", &recibo("105", false));
    }
    let naps = Naps::default();
    let nfe = NFe::new(&sefaz, EchoSigner, Uf::SP, Ambiente::Homologacao);

    let report = nfe
        .process_document(documento())
        .with_sleeper(naps.clone())
        .complete()
        .unwrap();
    assert_eq!(report.state, WorkflowState::Aborted(AbortReason::StillProcessing));
    assert_eq!(naps.taken().len(), 6);
    assert!(report.last().unwrap().processed().is_none());
}

#[test]
fn absurd_average_time_is_capped() {
    let sefaz = Sefaz::default();
    sefaz
        .reply("nfeStatusServicoNF", &status("107"))
        .reply("nfeConsultaNF", &consulta("217"))
        .reply("nfeAutorizacaoLote", &lote_com_espera("1e25"))
        .reply("nfeRetAutorizacaoLote", &recibo("105", false))
        .reply("nfeRetAutorizacaoLote", &recibo("104", true));
    let naps = Naps::default();
    let nfe = NFe::new(&sefaz, EchoSigner, Uf::SP, Ambiente::Homologacao);

    let report = nfe
        .process_document(documento())
        .with_sleeper(naps.clone())
        .complete()
        .unwrap();
    assert_eq!(report.state, WorkflowState::ReceiptResolved);
    assert_eq!(report.steps.len(), 4);
    assert_eq!(
        naps.taken(),
        [Duration::from_secs(780), Duration::from_secs(900)]
    );
}

// --- Faults ---

#[test]
fn http_error_fails_the_workflow() {
    let sefaz = Sefaz::default();
    sefaz.reply_raw("nfeStatusServicoNF", RawResponse::http(500, "Internal Server Error"));
    let nfe = NFe::new(&sefaz, EchoSigner, Uf::SP, Ambiente::Homologacao);

    let mut processing = nfe.process_document(documento());
    let err = processing.next().unwrap().unwrap_err();
    assert!(matches!(err, EdocError::Http { status: 500, .. }));
    assert_eq!(processing.state(), WorkflowState::Failed);
    assert!(processing.next().is_none());
}

#[test]
fn transport_fault_during_submission_surfaces() {
    let sefaz = Sefaz::default();
    sefaz
        .reply("nfeStatusServicoNF", &status("107"))
        .reply("nfeConsultaNF", &consulta("217"));
    let nfe = NFe::new(&sefaz, EchoSigner, Uf::SP, Ambiente::Homologacao);

    let err = nfe.process_document(documento()).complete().unwrap_err();
    assert!(matches!(err, EdocError::Transport(_)));
}

#[test]
fn page_without_envelope_leaves_no_response() {
    let sefaz = Sefaz::default();
    sefaz.reply_raw("nfeStatusServicoNF", RawResponse::http(200, "<html>maintenance</html>"));
    let nfe = NFe::new(&sefaz, EchoSigner, Uf::SP, Ambiente::Homologacao);

    let step = nfe.status_servico().unwrap();
    assert!(step.response().is_none());
    assert!(!nfe.is_service_operational(&step));
}

// --- Inherent services ---

#[test]
fn correction_letter_carries_usage_conditions() {
    let sefaz = Sefaz::default();
    sefaz.reply(
        "nfeRecepcaoEvento",
        "<retEnvEvento><cStat>128</cStat><retEvento><infEvento><cStat>135</cStat><nProt>1</nProt></infEvento></retEvento></retEnvEvento>",
    );
    let nfe = NFe::new(&sefaz, EchoSigner, Uf::SP, Ambiente::Homologacao);

    let step = nfe
        .carta_correcao(CHAVE, 2, "Endereco do destinatario corrigido", None)
        .unwrap();
    assert_eq!(step.response().and_then(NfeResposta::c_stat), Some("128"));
    let inf = step.request_root().find_path(&["evento", "infEvento"]).unwrap();
    assert_eq!(inf.child_text("tpEvento").as_deref(), Some("110110"));
    assert_eq!(inf.child_text("nSeqEvento").as_deref(), Some("2"));
    assert_eq!(
        inf.text_at(&["detEvento", "xCondUso"]).as_deref(),
        Some(TEXTO_CARTA_CORRECAO)
    );
}

#[test]
fn voiding_signs_the_range() {
    let sefaz = Sefaz::default();
    sefaz.reply(
        "nfeInutilizacaoNF",
        "<retInutNFe versao=\"4.00\"><infInut><cStat>102</cStat><xMotivo>Inutilizacao homologada</xMotivo><nProt>135200000000010</nProt></infInut></retInutNFe>",
    );
    let nfe = NFe::new(&sefaz, EchoSigner, Uf::SP, Ambiente::Homologacao);

    let step = nfe
        .inutilizacao(&Inutilizacao {
            cnpj: "59594315000157".into(),
            modelo: "55".into(),
            serie: 1,
            numero_inicial: 10,
            numero_final: 12,
            justificativa: "numeracao pulada por falha no sistema".into(),
        })
        .unwrap();
    assert_eq!(step.response().and_then(NfeResposta::c_stat), Some("102"));
    assert_eq!(step.request_root().local_name(), "inutNFe");
    assert_eq!(sefaz.operations(), ["nfeInutilizacaoNF"]);
}
