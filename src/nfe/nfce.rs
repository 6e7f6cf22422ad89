//! NFC-e (model 65): consumer QR code and public query addresses.

use sha1::{Digest, Sha1};

use crate::core::{Ambiente, EdocError, Signer, Transport, Uf};

use super::adapter::NFe;
use super::document::NfeDocument;
use super::routing::Modelo;

/// QR code layout version.
pub const VERSAO_QRCODE: &str = "2";

/// Taxpayer security code issued by the state (CSC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Csc {
    /// Identifier printed in the QR code, e.g. `000001`.
    pub id: String,
    /// Secret hashed into the QR code; never printed.
    pub token: String,
}

impl Csc {
    pub fn new(id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            token: token.into(),
        }
    }
}

type UrlRow = (Uf, &'static str, &'static str);

#[rustfmt::skip]
static QRCODE: &[UrlRow] = &[
    (Uf::AC, "http://www.sefaznet.ac.gov.br/nfce/qrcode?p=", "http://www.hml.sefaznet.ac.gov.br/nfce/qrcode?p="),
    (Uf::AL, "http://nfce.sefaz.al.gov.br/QRCode/consultarNFCe.jsp?p=", "http://nfce.sefaz.al.gov.br/QRCode/consultarNFCe.jsp?p="),
    (Uf::AM, "http://sistemas.sefaz.am.gov.br/nfceweb/consultarNFCe.jsp?p=", "http://homnfce.sefaz.am.gov.br/nfceweb/consultarNFCe.jsp?p="),
    (Uf::AP, "https://www.sefaz.ap.gov.br/nfce/nfcep.php?p=", "https://www.sefaz.ap.gov.br/nfcehml/nfce.php?p="),
    (Uf::BA, "http://nfe.sefaz.ba.gov.br/servicos/nfce/qrcode.aspx?p=", "http://hnfe.sefaz.ba.gov.br/servicos/nfce/qrcode.aspx?p="),
    (Uf::CE, "http://nfce.sefaz.ce.gov.br/pages/ShowNFCe.html?p=", "http://nfceh.sefaz.ce.gov.br/pages/ShowNFCe.html?p="),
    (Uf::DF, "http://www.fazenda.df.gov.br/nfce/qrcode?p=", "http://www.fazenda.df.gov.br/nfce/qrcode?p="),
    (Uf::ES, "http://app.sefaz.es.gov.br/ConsultaNFCe?p=", "http://homologacao.sefaz.es.gov.br/ConsultaNFCe?p="),
    (Uf::GO, "http://nfe.sefaz.go.gov.br/nfeweb/sites/nfce/danfeNFCe?p=", "http://homolog.sefaz.go.gov.br/nfeweb/sites/nfce/danfeNFCe?p="),
    (Uf::MA, "http://nfce.sefaz.ma.gov.br/portal/consultarNFCe.jsp?p=", "http://homologacao.sefaz.ma.gov.br/portal/consultarNFCe.jsp?p="),
    (Uf::MG, "https://portalsped.fazenda.mg.gov.br/portalnfce/sistema/qrcode.xhtml?p=", "https://portalsped.fazenda.mg.gov.br/portalnfce/sistema/qrcode.xhtml?p="),
    (Uf::MS, "http://www.dfe.ms.gov.br/nfce/qrcode?p=", "http://www.dfe.ms.gov.br/nfce/qrcode?p="),
    (Uf::MT, "http://www.sefaz.mt.gov.br/nfce/consultanfce?p=", "http://homologacao.sefaz.mt.gov.br/nfce/consultanfce?p="),
    (Uf::PA, "https://appnfc.sefa.pa.gov.br/portal/view/consultas/nfce/nfceForm.seam?p=", "https://appnfc.sefa.pa.gov.br/portal-homologacao/view/consultas/nfce/nfceForm.seam?p="),
    (Uf::PB, "http://www.sefaz.pb.gov.br/nfce?p=", "http://www.sefaz.pb.gov.br/nfcehom?p="),
    (Uf::PE, "http://nfce.sefaz.pe.gov.br/nfce/consulta?p=", "http://nfcehomolog.sefaz.pe.gov.br/nfce/consulta?p="),
    (Uf::PI, "http://www.sefaz.pi.gov.br/nfce/qrcode?p=", "http://www.sefaz.pi.gov.br/nfce/qrcode?p="),
    (Uf::PR, "http://www.fazenda.pr.gov.br/nfce/qrcode?p=", "http://www.fazenda.pr.gov.br/nfce/qrcode?p="),
    (Uf::RJ, "http://www4.fazenda.rj.gov.br/consultaNFCe/QRCode?p=", "http://www4.fazenda.rj.gov.br/consultaNFCe/QRCode?p="),
    (Uf::RN, "http://nfce.set.rn.gov.br/consultarNFCe.aspx?p=", "http://hom.nfce.set.rn.gov.br/consultarNFCe.aspx?p="),
    (Uf::RO, "http://www.nfce.sefin.ro.gov.br/consultanfce/consulta.jsp?p=", "http://www.nfce.sefin.ro.gov.br/consultanfce/consulta.jsp?p="),
    (Uf::RR, "https://www.sefaz.rr.gov.br/nfce/servlet/qrcode?p=", "http://200.174.88.103:8080/nfce/servlet/qrcode?p="),
    (Uf::RS, "https://www.sefaz.rs.gov.br/NFCE/NFCE-COM.aspx?p=", "https://www.sefaz.rs.gov.br/NFCE/NFCE-COM.aspx?p="),
    (Uf::SC, "https://sat.sef.sc.gov.br/nfce/consulta?p=", "https://hom.sat.sef.sc.gov.br/nfce/consulta?p="),
    (Uf::SE, "http://www.nfce.se.gov.br/nfce/qrcode?p=", "http://www.hom.nfe.se.gov.br/nfce/qrcode?p="),
    (Uf::SP, "https://www.nfce.fazenda.sp.gov.br/NFCeConsultaPublica/Paginas/ConsultaQRCode.aspx?p=", "https://www.homologacao.nfce.fazenda.sp.gov.br/NFCeConsultaPublica/Paginas/ConsultaQRCode.aspx?p="),
    (Uf::TO, "http://www.sefaz.to.gov.br/nfce/qrcode?p=", "http://homologacao.sefaz.to.gov.br/nfce/qrcode?p="),
];

#[rustfmt::skip]
static CONSULTA: &[UrlRow] = &[
    (Uf::AC, "www.sefaznet.ac.gov.br/nfce/consulta", "www.sefaznet.ac.gov.br/nfce/consulta"),
    (Uf::AL, "www.sefaz.al.gov.br/nfce/consulta", "www.sefaz.al.gov.br/nfce/consulta"),
    (Uf::AM, "www.sefaz.am.gov.br/nfce/consulta", "www.sefaz.am.gov.br/nfce/consulta"),
    (Uf::AP, "www.sefaz.ap.gov.br/nfce/consulta", "www.sefaz.ap.gov.br/nfce/consulta"),
    (Uf::BA, "www.sefaz.ba.gov.br/nfce/consulta", "http://hinternet.sefaz.ba.gov.br/nfce/consulta"),
    (Uf::CE, "www.sefaz.ce.gov.br/nfce/consulta", "www.sefaz.ce.gov.br/nfce/consulta"),
    (Uf::DF, "www.fazenda.df.gov.br/nfce/consulta", "www.fazenda.df.gov.br/nfce/consulta"),
    (Uf::ES, "www.sefaz.es.gov.br/nfce/consulta", "www.sefaz.es.gov.br/nfce/consulta"),
    (Uf::GO, "www.sefaz.go.gov.br/nfce/consulta", "www.sefaz.go.gov.br/nfce/consulta"),
    (Uf::MA, "www.sefaz.ma.gov.br/nfce/consulta", "www.sefaz.ma.gov.br/nfce/consulta"),
    (Uf::MG, "http://nfce.fazenda.mg.gov.br/portalnfce", "http://hnfce.fazenda.mg.gov.br/portalnfce/"),
    (Uf::MS, "www.dfe.ms.gov.br/nfce/consulta", "www.dfe.ms.gov.br/nfce/consulta"),
    (Uf::MT, "http://www.sefaz.mt.gov.br/nfce/consultanfce", "http://homologacao.sefaz.mt.gov.br/nfce/consultanfce"),
    (Uf::PA, "www.sefa.pa.gov.br/nfce/consulta", "www.sefa.pa.gov.br/nfce/consulta"),
    (Uf::PB, "www.sefaz.pb.gov.br/nfce/consulta", "www.sefaz.pb.gov.br/nfcehom"),
    (Uf::PE, "http://nfce.sefaz.pe.gov.br/nfce/consulta", "http://nfce.sefaz.pe.gov.br/nfce/consulta"),
    (Uf::PI, "www.sefaz.pi.gov.br/nfce/consulta", "www.sefaz.pi.gov.br/nfce/consulta"),
    (Uf::PR, "http://www.fazenda.pr.gov.br/nfce/consulta", "http://www.fazenda.pr.gov.br/nfce/consulta"),
    (Uf::RJ, "www.fazenda.rj.gov.br/nfce/consulta", "www.fazenda.rj.gov.br/nfce/consulta"),
    (Uf::RN, "www.set.rn.gov.br/nfce/consulta", "www.set.rn.gov.br/nfce/consulta"),
    (Uf::RO, "www.sefin.ro.gov.br/nfce/consulta", "www.sefin.ro.gov.br/nfce/consulta"),
    (Uf::RR, "www.sefaz.rr.gov.br/nfce/consulta", "www.sefaz.rr.gov.br/nfce/consulta"),
    (Uf::RS, "www.sefaz.rs.gov.br/nfce/consulta", "www.sefaz.rs.gov.br/nfce/consulta"),
    (Uf::SC, "https://sat.sef.sc.gov.br/nfce/consulta", "https://hom.sat.sef.sc.gov.br/nfce/consulta"),
    (Uf::SE, "http://www.nfce.se.gov.br/nfce/consulta", "http://www.hom.nfe.se.gov.br/nfce/consulta"),
    (Uf::SP, "https://www.nfce.fazenda.sp.gov.br/consulta", "https://www.homologacao.nfce.fazenda.sp.gov.br/consulta"),
    (Uf::TO, "www.sefaz.to.gov.br/nfce/consulta", "http://homologacao.sefaz.to.gov.br/nfce/consulta.jsf"),
];

fn lookup(table: &[UrlRow], uf: Uf, ambiente: Ambiente) -> Result<&'static str, EdocError> {
    table
        .iter()
        .find(|(u, _, _)| *u == uf)
        .map(|&(_, producao, homologacao)| match ambiente {
            Ambiente::Producao => producao,
            Ambiente::Homologacao => homologacao,
        })
        .ok_or_else(|| EdocError::Config(format!("no NFC-e portal for {uf}")))
}

/// Base of the QR code address, ending in `?p=`.
pub fn url_qrcode(uf: Uf, ambiente: Ambiente) -> Result<&'static str, EdocError> {
    lookup(QRCODE, uf, ambiente)
}

/// Public query address printed on the receipt (`urlChave`).
pub fn url_consulta(uf: Uf, ambiente: Ambiente) -> Result<&'static str, EdocError> {
    lookup(CONSULTA, uf, ambiente)
}

/// QR code v2 for an online-issued NFC-e:
/// `<base>chave|2|tpAmb|cscId|SHA1(chave|2|tpAmb|cscId + token)`.
pub fn qr_code(chave: &str, uf: Uf, ambiente: Ambiente, csc: &Csc) -> Result<String, EdocError> {
    let base = url_qrcode(uf, ambiente)?;
    let chave = chave.strip_prefix("NFe").unwrap_or(chave);
    let parametros = format!("{chave}|{VERSAO_QRCODE}|{}|{}", ambiente.tp_amb(), csc.id);
    let mut hasher = Sha1::new();
    hasher.update(parametros.as_bytes());
    hasher.update(csc.token.as_bytes());
    let hash = hex::encode_upper(hasher.finalize());
    Ok(format!("{base}{parametros}|{hash}"))
}

/// Stamp `infNFeSupl` on `document` before it is signed and sent.
pub fn monta_qrcode(
    document: &mut NfeDocument,
    uf: Uf,
    ambiente: Ambiente,
    csc: &Csc,
) -> Result<(), EdocError> {
    let id = document.id().ok_or(EdocError::MissingField("Id"))?.to_string();
    let qr = qr_code(&id, uf, ambiente, csc)?;
    document.set_suplementar(&qr, url_consulta(uf, ambiente)?);
    Ok(())
}

impl<T: Transport, S: Signer> NFe<T, S> {
    /// Adapter preset for model 65.
    pub fn nfce(transport: T, signer: S, uf: Uf, ambiente: Ambiente) -> Self {
        Self::new(transport, signer, uf, ambiente).modelo(Modelo::Nfce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAVE: &str = "35200159594315000157650010000000012062777169";

    #[test]
    fn every_state_has_portals() {
        for uf in Uf::all().filter(|u| *u != Uf::AN) {
            for amb in [Ambiente::Producao, Ambiente::Homologacao] {
                assert!(url_qrcode(uf, amb).unwrap().ends_with("?p="), "{uf}");
                assert!(url_consulta(uf, amb).is_ok(), "{uf}");
            }
        }
        assert!(url_qrcode(Uf::AN, Ambiente::Producao).is_err());
    }

    #[test]
    fn qr_code_layout() {
        let csc = Csc::new("000001", "SEGREDO");
        let qr = qr_code(CHAVE, Uf::SP, Ambiente::Homologacao, &csc).unwrap();
        let prefix = format!(
            "https://www.homologacao.nfce.fazenda.sp.gov.br/NFCeConsultaPublica/Paginas/ConsultaQRCode.aspx?p={CHAVE}|2|2|000001|"
        );
        assert!(qr.starts_with(&prefix), "{qr}");
        let hash = &qr[prefix.len()..];
        assert_eq!(hash.len(), 40);
        assert!(hash.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert!(!qr.contains("SEGREDO"));
    }

    #[test]
    fn prefixed_id_gives_same_code() {
        let csc = Csc::new("1", "x");
        assert_eq!(
            qr_code(&format!("NFe{CHAVE}"), Uf::PR, Ambiente::Producao, &csc).unwrap(),
            qr_code(CHAVE, Uf::PR, Ambiente::Producao, &csc).unwrap()
        );
    }

    #[test]
    fn hash_covers_the_token() {
        let a = qr_code(CHAVE, Uf::RS, Ambiente::Producao, &Csc::new("1", "a")).unwrap();
        let b = qr_code(CHAVE, Uf::RS, Ambiente::Producao, &Csc::new("1", "b")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn stamps_supplementary_block_once() {
        let mut doc = NfeDocument::from_xml(&format!(
            r#"<NFe><infNFe Id="NFe{CHAVE}"><ide><mod>65</mod></ide></infNFe></NFe>"#
        ))
        .unwrap();
        let csc = Csc::new("000001", "t");
        monta_qrcode(&mut doc, Uf::SP, Ambiente::Producao, &csc).unwrap();
        monta_qrcode(&mut doc, Uf::SP, Ambiente::Producao, &csc).unwrap();
        assert_eq!(doc.element().find_all("infNFeSupl").count(), 1);
        assert_eq!(
            doc.element().text_at(&["infNFeSupl", "urlChave"]).as_deref(),
            Some("https://www.nfce.fazenda.sp.gov.br/consulta")
        );
    }
}
