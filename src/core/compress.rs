//! gzip + base64, the transfer encoding of synchronous CT-e and MDF-e
//! submissions and of distributed DF-e documents.

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use super::error::EdocError;

fn compression(e: impl std::fmt::Display) -> EdocError {
    EdocError::Compression(e.to_string())
}

/// Gzip `xml` and encode the result as standard base64.
pub fn compress(xml: &str) -> Result<String, EdocError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(xml.as_bytes()).map_err(compression)?;
    let bytes = encoder.finish().map_err(compression)?;
    Ok(STANDARD.encode(bytes))
}

/// Inverse of [`compress`]; surrounding whitespace is ignored.
pub fn decompress(encoded: &str) -> Result<String, EdocError> {
    let bytes = STANDARD.decode(encoded.trim()).map_err(compression)?;
    let mut out = String::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_string(&mut out)
        .map_err(compression)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressed_payload_is_gzip() {
        let encoded = compress("<CTe/>").unwrap();
        let raw = STANDARD.decode(&encoded).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);
        assert_eq!(decompress(&format!(" {encoded}\n")).unwrap(), "<CTe/>");
    }

    #[test]
    fn garbage_is_a_compression_error() {
        assert!(matches!(decompress("@@@"), Err(EdocError::Compression(_))));
        assert!(matches!(decompress("AAAA"), Err(EdocError::Compression(_))));
    }
}
