use std::time::Duration;

use tracing::debug;

use crate::core::{
    Ambiente, Cancelamento, ChaveAcesso, DocumentAdapter, DocumentKey, EdocError, Element,
    FromXml, ProcessedDocument, ProcessingStep, Request, RoutingHints, Signer, Transport, Uf,
    brasilia_now, post, raw_element, sign_element,
};

use super::document::{NfeDocument, monta_nfe_proc};
use super::events::{EventoNfe, Inutilizacao, ORGAO_NACIONAL, TEXTO_CARTA_CORRECAO, TipoEvento};
use super::routing::{Modelo, NfeService, Rota};
use super::schema::{self, NfeResposta, ProtNfe, VERSAO, VERSAO_DISTRIBUICAO, VERSAO_EVENTO};

/// `cStat` codes meaning the key is already known to the authority.
const JA_ENVIADO: &[&str] = &["100", "110", "150", "301", "302"];

const SERVICO_EM_OPERACAO: &str = "107";
const LOTE_RECEBIDO: &str = "103";
const LOTE_EM_PROCESSAMENTO: &str = "105";

/// Wait used when the authority does not report `tMed`.
const TEMPO_MEDIO_PADRAO: Duration = Duration::from_secs(1);

/// Ceiling on a reported `tMed`.
const TEMPO_MEDIO_MAXIMO: Duration = Duration::from_secs(600);

/// Query criterion of the DF-e distribution service; exactly one is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsultaDistribuicao {
    /// Every document after this NSU (`distNSU/ultNSU`).
    UltimoNsu(String),
    /// One specific NSU (`consNSU/NSU`).
    Nsu(String),
    /// One access key (`consChNFe/chNFe`).
    Chave(String),
}

/// NF-e (model 55) and NFC-e (model 65) adapter.
///
/// ```no_run
/// # use nota::{Ambiente, Uf, Transport, Signer, DocumentAdapter};
/// # use nota::nfe::{NFe, NfeDocument};
/// # fn demo(
/// #     transport: impl Transport,
/// #     signer: impl Signer,
/// #     doc: NfeDocument,
/// # ) -> Result<(), nota::EdocError> {
/// let nfe = NFe::new(transport, signer, Uf::SP, Ambiente::Homologacao);
/// for step in nfe.process_document(doc) {
///     let step = step?;
///     println!("{} -> {:?}", step.operation(), step.response().and_then(|r| r.c_stat()));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct NFe<T, S> {
    transport: T,
    signer: S,
    uf: Uf,
    ambiente: Ambiente,
    modelo: Modelo,
    versao: String,
    contingencia: bool,
}

impl<T: Transport, S: Signer> NFe<T, S> {
    pub fn new(transport: T, signer: S, uf: Uf, ambiente: Ambiente) -> Self {
        Self {
            transport,
            signer,
            uf,
            ambiente,
            modelo: Modelo::Nfe,
            versao: VERSAO.to_string(),
            contingencia: false,
        }
    }

    pub fn modelo(mut self, modelo: Modelo) -> Self {
        self.modelo = modelo;
        self
    }

    pub fn versao(mut self, versao: impl Into<String>) -> Self {
        self.versao = versao.into();
        self
    }

    /// Route authorization traffic to the SVC contingency authority.
    pub fn contingencia(mut self, ativa: bool) -> Self {
        self.contingencia = ativa;
        self
    }

    pub fn uf(&self) -> Uf {
        self.uf
    }

    pub fn ambiente(&self) -> Ambiente {
        self.ambiente
    }

    pub fn rota(&self) -> Rota {
        Rota {
            contingencia: self.contingencia,
            ..Rota::new(self.uf, self.modelo, self.ambiente)
        }
    }

    fn hints(&self, service: NfeService, c_uf: u8, versao: &str) -> RoutingHints {
        RoutingHints::new(service.namespace(), "nfeDadosMsg")
            .c_uf(c_uf)
            .versao_dados(versao)
    }

    fn send<R: FromXml>(
        &self,
        service: NfeService,
        url: &str,
        request: Request,
        hints: &RoutingHints,
        wrap: fn(R) -> NfeResposta,
    ) -> Result<ProcessingStep<NfeResposta>, EdocError> {
        Ok(post::<R>(&self.transport, url, service.operation(), request, hints)?.map_response(wrap))
    }

    fn send_local<R: FromXml>(
        &self,
        service: NfeService,
        request: Request,
        wrap: fn(R) -> NfeResposta,
    ) -> Result<ProcessingStep<NfeResposta>, EdocError> {
        let url = self.rota().url(service)?;
        let hints = self.hints(service, self.uf.codigo(), &self.versao);
        self.send(service, &url, request, &hints, wrap)
    }

    fn id_lote() -> String {
        brasilia_now().format("%Y%m%d%H%M%S").to_string()
    }

    // ---- Events ----

    /// Sign each event and send them as one `envEvento` batch to the
    /// issuing state's authority.
    pub fn enviar_lote_evento(
        &self,
        eventos: &[EventoNfe],
        id_lote: Option<&str>,
    ) -> Result<ProcessingStep<NfeResposta>, EdocError> {
        let request = self.lote_evento(eventos, id_lote)?;
        self.send_local(NfeService::RecepcaoEvento, request, NfeResposta::Evento)
    }

    fn lote_evento(
        &self,
        eventos: &[EventoNfe],
        id_lote: Option<&str>,
    ) -> Result<Request, EdocError> {
        if eventos.is_empty() {
            return Err(EdocError::MissingField("evento"));
        }
        let mut assinados = String::new();
        for evento in eventos {
            let xml = evento.to_xml()?;
            let id = evento.id();
            assinados.push_str(crate::core::strip_declaration(&sign_element(
                &self.signer,
                &xml,
                Some(&id),
            )?));
        }
        let lote = id_lote.map_or_else(Self::id_lote, str::to_string);
        Request::from_xml(schema::env_evento(&lote).to_xml_wrapping(&assinados)?)
    }

    fn evento(&self, tipo: TipoEvento, chave: &str, autor: &str) -> EventoNfe {
        EventoNfe {
            tipo,
            chave: chave.to_string(),
            c_orgao: self.uf.codigo(),
            ambiente: self.ambiente,
            autor: autor.to_string(),
            sequencia: 1,
            data_hora: brasilia_now(),
            detalhe: Vec::new(),
        }
    }

    /// Correction letter (`110110`) with the mandatory usage conditions.
    pub fn carta_correcao(
        &self,
        chave: &str,
        sequencia: u32,
        correcao: &str,
        data_hora: Option<chrono::DateTime<chrono::FixedOffset>>,
    ) -> Result<ProcessingStep<NfeResposta>, EdocError> {
        let cnpj = ChaveAcesso::parse(chave)?.cnpj().to_string();
        let mut evento = self.evento(TipoEvento::CartaCorrecao, chave, &cnpj);
        evento.sequencia = sequencia;
        if let Some(dh) = data_hora {
            evento.data_hora = dh;
        }
        evento.detalhe = vec![
            ("xCorrecao", correcao.to_string()),
            ("xCondUso", TEXTO_CARTA_CORRECAO.to_string()),
        ];
        self.enviar_lote_evento(&[evento], None)
    }

    fn manifestacao(
        &self,
        tipo: TipoEvento,
        chave: &str,
        cnpj_cpf: &str,
        justificativa: Option<&str>,
    ) -> Result<ProcessingStep<NfeResposta>, EdocError> {
        let mut evento = self.evento(tipo, chave, cnpj_cpf);
        evento.c_orgao = ORGAO_NACIONAL;
        if let Some(just) = justificativa {
            evento.detalhe.push(("xJust", just.to_string()));
        }
        let request = self.lote_evento(&[evento], Some("1"))?;
        let service = NfeService::RecepcaoEvento;
        let url = Rota::new(Uf::AN, self.modelo, self.ambiente).url(service)?;
        let header = Element::new("nfeCabecMsg")
            .attr("xmlns", service.namespace())
            .text_child("cUF", ORGAO_NACIONAL.to_string())
            .text_child("versaoDados", VERSAO_EVENTO)
            .to_xml()?;
        let hints = self
            .hints(service, ORGAO_NACIONAL, VERSAO_EVENTO)
            .header(header);
        self.send(service, &url, request, &hints, NfeResposta::Evento)
    }

    pub fn confirmacao_da_operacao(
        &self,
        chave: &str,
        cnpj_cpf: &str,
    ) -> Result<ProcessingStep<NfeResposta>, EdocError> {
        self.manifestacao(TipoEvento::ConfirmacaoOperacao, chave, cnpj_cpf, None)
    }

    pub fn ciencia_da_operacao(
        &self,
        chave: &str,
        cnpj_cpf: &str,
    ) -> Result<ProcessingStep<NfeResposta>, EdocError> {
        self.manifestacao(TipoEvento::CienciaOperacao, chave, cnpj_cpf, None)
    }

    pub fn desconhecimento_da_operacao(
        &self,
        chave: &str,
        cnpj_cpf: &str,
    ) -> Result<ProcessingStep<NfeResposta>, EdocError> {
        self.manifestacao(TipoEvento::DesconhecimentoOperacao, chave, cnpj_cpf, None)
    }

    /// `210240`; the justification must have at least 15 characters.
    pub fn operacao_nao_realizada(
        &self,
        chave: &str,
        cnpj_cpf: &str,
        justificativa: &str,
    ) -> Result<ProcessingStep<NfeResposta>, EdocError> {
        self.manifestacao(
            TipoEvento::OperacaoNaoRealizada,
            chave,
            cnpj_cpf,
            Some(justificativa),
        )
    }

    // ---- Voiding and distribution ----

    /// Void a range of unused numbers (`inutNFe`).
    pub fn inutilizacao(
        &self,
        pedido: &Inutilizacao,
    ) -> Result<ProcessingStep<NfeResposta>, EdocError> {
        let ano = brasilia_now();
        let root = pedido.to_element(&self.versao, self.ambiente, self.uf.codigo(), ano)?;
        let id = root.find("infInut").and_then(|inf| inf.attribute("Id"));
        let signed = sign_element(&self.signer, &root.to_xml()?, id)?;
        self.send_local(
            NfeService::Inutilizacao,
            Request::from_xml(signed)?,
            NfeResposta::Inutilizacao,
        )
    }

    /// Query the national DF-e distribution service for `cnpj_cpf`.
    pub fn consultar_distribuicao(
        &self,
        cnpj_cpf: &str,
        consulta: &ConsultaDistribuicao,
    ) -> Result<ProcessingStep<NfeResposta>, EdocError> {
        let (tag, doc) = schema::cnpj_or_cpf(cnpj_cpf);
        let criterio = match consulta {
            ConsultaDistribuicao::UltimoNsu(nsu) => {
                Element::new("distNSU").text_child("ultNSU", nsu.as_str())
            }
            ConsultaDistribuicao::Nsu(nsu) => {
                Element::new("consNSU").text_child("NSU", nsu.as_str())
            }
            ConsultaDistribuicao::Chave(chave) => {
                Element::new("consChNFe").text_child("chNFe", chave.as_str())
            }
        };
        let root = Element::new("distDFeInt")
            .attr("xmlns", super::NAMESPACE)
            .attr("versao", VERSAO_DISTRIBUICAO)
            .text_child("tpAmb", self.ambiente.tp_amb())
            .text_child("cUFAutor", self.uf.codigo().to_string())
            .text_child(tag, doc)
            .child(criterio);
        let service = NfeService::DistribuicaoDfe;
        let url = self.rota().url(service)?;
        let hints = self.hints(service, self.uf.codigo(), VERSAO_DISTRIBUICAO);
        self.send(
            service,
            &url,
            Request::from_element(root)?,
            &hints,
            NfeResposta::Distribuicao,
        )
    }

    fn c_stat(step: &ProcessingStep<NfeResposta>) -> Option<&str> {
        step.response().and_then(NfeResposta::c_stat)
    }
}

impl<T: Transport, S: Signer> DocumentAdapter for NFe<T, S> {
    type Document = NfeDocument;
    type Response = NfeResposta;
    type Service = NfeService;

    fn status_servico(&self) -> Result<ProcessingStep<NfeResposta>, EdocError> {
        let root = schema::cons_stat_serv(&self.versao, self.ambiente, self.uf.codigo());
        self.send_local(
            NfeService::StatusServico,
            Request::from_element(root)?,
            NfeResposta::Status,
        )
    }

    fn get_document_id(&self, document: &NfeDocument) -> Option<DocumentKey> {
        document.key()
    }

    fn consulta_documento(
        &self,
        key: &DocumentKey,
    ) -> Result<ProcessingStep<NfeResposta>, EdocError> {
        let root = schema::cons_sit_nfe(&self.versao, self.ambiente, key.key());
        self.send_local(
            NfeService::ConsultaProtocolo,
            Request::from_element(root)?,
            NfeResposta::Consulta,
        )
    }

    fn envia_documento(
        &self,
        document: &NfeDocument,
    ) -> Result<ProcessingStep<NfeResposta>, EdocError> {
        let signed = sign_element(&self.signer, &document.to_xml()?, document.id())?;
        let lote = Self::id_lote();
        debug!(id_lote = %lote, id = document.id(), "sending NF-e batch");
        let xml = schema::envi_nfe(&self.versao, &lote).to_xml_wrapping(&signed)?;
        self.send_local(
            NfeService::Autorizacao,
            Request::from_xml(xml)?,
            NfeResposta::Envio,
        )
    }

    fn consulta_recibo(
        &self,
        submission: &ProcessingStep<NfeResposta>,
    ) -> Result<ProcessingStep<NfeResposta>, EdocError> {
        let n_rec = match submission.response() {
            Some(NfeResposta::Envio(ret)) => ret.inf_rec.as_ref().and_then(|r| r.n_rec.clone()),
            _ => None,
        }
        .ok_or(EdocError::MissingField("nRec"))?;
        let root = schema::cons_reci_nfe(&self.versao, self.ambiente, &n_rec);
        self.send_local(
            NfeService::RetAutorizacao,
            Request::from_element(root)?,
            NfeResposta::Recibo,
        )
    }

    fn cancela_documento(
        &self,
        request: &Cancelamento,
    ) -> Result<ProcessingStep<NfeResposta>, EdocError> {
        let cnpj = ChaveAcesso::parse(&request.chave)?.cnpj().to_string();
        let mut evento = self.evento(TipoEvento::Cancelamento, &request.chave, &cnpj);
        if let Some(dh) = request.data_hora {
            evento.data_hora = dh;
        }
        evento.detalhe = vec![
            ("nProt", request.protocolo.clone()),
            ("xJust", request.justificativa.clone()),
        ];
        self.enviar_lote_evento(&[evento], None)
    }

    fn is_service_operational(&self, step: &ProcessingStep<NfeResposta>) -> bool {
        Self::c_stat(step) == Some(SERVICO_EM_OPERACAO)
    }

    fn is_already_filed(&self, step: &ProcessingStep<NfeResposta>) -> bool {
        Self::c_stat(step).is_some_and(|c| JA_ENVIADO.contains(&c))
    }

    fn is_accepted(&self, step: &ProcessingStep<NfeResposta>) -> bool {
        Self::c_stat(step) == Some(LOTE_RECEBIDO)
    }

    fn is_still_processing(&self, step: &ProcessingStep<NfeResposta>) -> bool {
        Self::c_stat(step) == Some(LOTE_EM_PROCESSAMENTO)
    }

    fn average_wait(&self, submission: &ProcessingStep<NfeResposta>) -> Duration {
        match submission.response() {
            Some(NfeResposta::Envio(ret)) => ret
                .inf_rec
                .as_ref()
                .and_then(|r| r.t_med.as_deref())
                .and_then(|t| t.trim().parse::<f64>().ok())
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .map_or(TEMPO_MEDIO_PADRAO, |wait| wait.min(TEMPO_MEDIO_MAXIMO)),
            _ => TEMPO_MEDIO_PADRAO,
        }
    }

    fn locate_url(&self, service: NfeService) -> Result<String, EdocError> {
        self.rota().url(service)
    }

    fn build_processed_bundle(
        &self,
        document: &NfeDocument,
        submission: &ProcessingStep<NfeResposta>,
        receipt: &ProcessingStep<NfeResposta>,
    ) -> Option<ProcessedDocument> {
        let Some(NfeResposta::Recibo(ret)) = receipt.response() else {
            return None;
        };
        let chave = document.key().map(|k| k.key().to_string());
        let prot: &ProtNfe = ret
            .prot_nfe
            .iter()
            .find(|p| p.ch_nfe.is_some() && p.ch_nfe == chave)
            .or_else(|| ret.prot_nfe.first())?;
        let nfe = raw_element(submission.request_xml(), "NFe")?;
        match monta_nfe_proc(nfe, prot, &self.versao) {
            Ok(xml) => Some(ProcessedDocument {
                xml,
                protocol: prot.n_prot.clone(),
            }),
            Err(e) => {
                debug!(error = %e, "could not assemble nfeProc");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Payload, RawResponse, SoapClient};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Capture {
        calls: RefCell<Vec<(String, String, Payload, RoutingHints)>>,
    }

    struct Client<'a> {
        url: String,
        capture: &'a Capture,
    }

    impl SoapClient for Client<'_> {
        fn invoke(
            &mut self,
            operation: &str,
            payload: &Payload,
            hints: &RoutingHints,
        ) -> Result<RawResponse, EdocError> {
            self.capture.calls.borrow_mut().push((
                self.url.clone(),
                operation.to_string(),
                payload.clone(),
                hints.clone(),
            ));
            Ok(RawResponse::http(
                200,
                "<soap:Envelope xmlns:soap=\"s\"><soap:Body><retEnvEvento><cStat>128</cStat></retEnvEvento></soap:Body></soap:Envelope>",
            ))
        }
    }

    impl Transport for Capture {
        fn open(&self, url: &str) -> Result<Box<dyn SoapClient + '_>, EdocError> {
            Ok(Box::new(Client {
                url: url.to_string(),
                capture: self,
            }))
        }
    }

    struct NoopSigner;

    impl Signer for NoopSigner {
        fn sign(&self, xml: &str, _element_id: &str) -> Result<String, EdocError> {
            Ok(xml.to_string())
        }
    }

    const CHAVE: &str = "35200159594315000157550010000000012062777161";

    #[test]
    fn manifestation_goes_to_national_environment() {
        let capture = Capture::default();
        let nfe = NFe::new(&capture, NoopSigner, Uf::SP, Ambiente::Homologacao);
        let step = nfe.ciencia_da_operacao(CHAVE, "12345678000199").unwrap();
        assert_eq!(step.response().and_then(NfeResposta::c_stat), Some("128"));

        let calls = capture.calls.borrow();
        let (url, op, _, hints) = &calls[0];
        assert_eq!(
            url,
            "https://hom.nfe.fazenda.gov.br/NFeRecepcaoEvento4/NFeRecepcaoEvento4.asmx?wsdl"
        );
        assert_eq!(op, "nfeRecepcaoEvento");
        assert_eq!(hints.c_uf, Some(91));
        assert!(hints.header.as_deref().unwrap().contains("<cUF>91</cUF>"));
        let root = step.request_root();
        assert_eq!(root.text_at(&["idLote"]).as_deref(), Some("1"));
        assert_eq!(root.text_at(&["evento", "infEvento", "cOrgao"]).as_deref(), Some("91"));
    }

    #[test]
    fn cancel_uses_key_cnpj_and_local_authority() {
        let capture = Capture::default();
        let nfe = NFe::new(&capture, NoopSigner, Uf::SP, Ambiente::Homologacao);
        let step = nfe
            .cancela_documento(&Cancelamento::new(
                CHAVE,
                "135200000000001",
                "erro de digitacao no pedido",
            ))
            .unwrap();
        let inf = step.request_root().find_path(&["evento", "infEvento"]).unwrap();
        assert_eq!(inf.attribute("Id"), Some(format!("ID110111{CHAVE}01").as_str()));
        assert_eq!(inf.child_text("CNPJ").as_deref(), Some("59594315000157"));
        assert_eq!(inf.child_text("cOrgao").as_deref(), Some("35"));
        assert_eq!(inf.text_at(&["detEvento", "nProt"]).as_deref(), Some("135200000000001"));
        assert!(capture.calls.borrow()[0].0.contains("homologacao.nfe.fazenda.sp.gov.br"));
    }

    #[test]
    fn cancel_rejects_malformed_key() {
        let nfe = NFe::new(Capture::default(), NoopSigner, Uf::SP, Ambiente::Homologacao);
        assert!(nfe.cancela_documento(&Cancelamento::new("123", "1", "x")).is_err());
    }

    #[test]
    fn empty_event_batch_is_refused() {
        let nfe = NFe::new(Capture::default(), NoopSigner, Uf::SP, Ambiente::Homologacao);
        assert!(matches!(
            nfe.enviar_lote_evento(&[], None),
            Err(EdocError::MissingField("evento"))
        ));
    }

    #[test]
    fn distribution_sends_single_criterion() {
        let capture = Capture::default();
        let nfe = NFe::new(&capture, NoopSigner, Uf::PR, Ambiente::Producao);
        let step = nfe
            .consultar_distribuicao(
                "59594315000157",
                &ConsultaDistribuicao::UltimoNsu("000000000000000".into()),
            )
            .unwrap();
        let root = step.request_root();
        assert_eq!(root.attribute("versao"), Some("1.01"));
        assert_eq!(root.child_text("cUFAutor").as_deref(), Some("41"));
        assert_eq!(root.text_at(&["distNSU", "ultNSU"]).as_deref(), Some("000000000000000"));
        assert!(root.find("consNSU").is_none());
        assert!(capture.calls.borrow()[0].0.contains("www1.nfe.fazenda.gov.br/NFeDistribuicaoDFe"));
    }

    fn lote_recebido(t_med: &str) -> ProcessingStep<NfeResposta> {
        let ret = schema::RetEnviNfe {
            c_stat: Some("103".into()),
            inf_rec: Some(schema::InfRec {
                n_rec: Some("1".into()),
                t_med: Some(t_med.into()),
            }),
            ..Default::default()
        };
        ProcessingStep::new(
            "nfeAutorizacaoLote",
            Element::new("enviNFe"),
            String::new(),
            RawResponse::http(200, ""),
            Some(NfeResposta::Envio(ret)),
        )
    }

    #[test]
    fn average_wait_reads_t_med() {
        let nfe = NFe::new(Capture::default(), NoopSigner, Uf::SP, Ambiente::Homologacao);
        let step = lote_recebido("3");
        assert_eq!(nfe.average_wait(&step), Duration::from_secs(3));
        assert!(nfe.is_accepted(&step));
    }

    #[test]
    fn average_wait_tolerates_odd_t_med() {
        let nfe = NFe::new(Capture::default(), NoopSigner, Uf::SP, Ambiente::Homologacao);
        for (t_med, expected) in [
            ("1e25", TEMPO_MEDIO_MAXIMO),
            ("1e19", TEMPO_MEDIO_MAXIMO),
            ("-4", TEMPO_MEDIO_PADRAO),
            ("NaN", TEMPO_MEDIO_PADRAO),
            ("inf", TEMPO_MEDIO_PADRAO),
            ("dois", TEMPO_MEDIO_PADRAO),
        ] {
            assert_eq!(nfe.average_wait(&lote_recebido(t_med)), expected, "{t_med}");
        }
    }
}
