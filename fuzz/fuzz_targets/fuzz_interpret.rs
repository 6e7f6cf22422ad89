#![no_main]

use libfuzzer_sys::fuzz_target;
use nota::{Element, RawResponse, interpret};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let raw = RawResponse::http(200, s);
        let _ = interpret::<nota::nfe::RetConsReciNfe>(
            "nfeRetAutorizacaoLote",
            Element::new("consReciNFe"),
            String::new(),
            raw.clone(),
        );
        let _ = interpret::<nota::nfse::ConsultarLoteRpsResposta>(
            "ConsultarLoteRpsV3",
            Element::new("ConsultarLoteRpsEnvio"),
            String::new(),
            raw,
        );
    }
});
