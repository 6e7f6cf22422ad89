#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(chave) = nota::ChaveAcesso::parse(s) {
            assert_eq!(chave.as_str().len(), 44);
            let _ = chave.componentes();
        }
    }
});
