#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Errors are fine, panics are bugs.
        if let Ok(el) = nota::Element::parse(s) {
            let _ = el.to_xml();
            let _ = el.descendant("cStat").map(|c| c.text_content());
        }
    }
});
