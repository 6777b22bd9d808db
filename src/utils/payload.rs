// src/utils/payload.rs

use base64::{
    Engine,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};

use crate::error::AppError;

const MIB: usize = 1024 * 1024;

/// Standard alphabet, padding optional. Browsers' `FileReader` pads, other
/// clients frequently don't.
fn base64_engine() -> GeneralPurpose {
    GeneralPurpose::new(
        &alphabet::STANDARD,
        GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
    )
}

/// Drops a `data:<mime>;base64,` prefix if the client sent a full data URL.
pub fn strip_data_url(input: &str) -> &str {
    input
        .strip_prefix("data:")
        .and_then(|rest| rest.find(";base64,").map(|idx| &rest[idx + ";base64,".len()..]))
        .unwrap_or(input)
}

/// Decoded byte count of a base64 payload, computed from its length.
///
/// `len * 3 / 4` minus trailing padding. Exact for well-formed input, so the
/// size limit can be enforced before anything is decoded.
pub fn estimated_decoded_len(input: &str) -> usize {
    let body = strip_data_url(input);
    let significant = body.bytes().filter(|b| !b.is_ascii_whitespace()).count();
    let padding = body
        .bytes()
        .rev()
        .filter(|b| !b.is_ascii_whitespace())
        .take_while(|b| *b == b'=')
        .take(2)
        .count();

    (significant * 3 / 4).saturating_sub(padding)
}

/// Enforces the PDF size limit and checks that the payload is decodable.
/// Returns the decoded size in bytes.
pub fn check_pdf_payload(input: &str, max_bytes: usize) -> Result<usize, AppError> {
    let size = estimated_decoded_len(input);

    if size > max_bytes {
        return Err(AppError::BadRequest(format!(
            "PDF file is too large ({:.1} MB). Maximum allowed size is {} MB.",
            size as f64 / MIB as f64,
            max_bytes / MIB
        )));
    }

    if size == 0 {
        return Err(AppError::BadRequest("PDF data is empty.".to_string()));
    }

    let cleaned: String = strip_data_url(input)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let decoded = base64_engine()
        .decode(cleaned.as_bytes())
        .map_err(|e| AppError::BadRequest(format!("PDF data is not valid base64: {}", e)))?;

    Ok(decoded.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_len_accounts_for_padding() {
        assert_eq!(estimated_decoded_len("TWFu"), 3);
        assert_eq!(estimated_decoded_len("TWE="), 2);
        assert_eq!(estimated_decoded_len("TQ=="), 1);
        assert_eq!(estimated_decoded_len("TQ"), 1);
        assert_eq!(estimated_decoded_len(""), 0);
    }

    #[test]
    fn data_url_prefix_and_whitespace_are_ignored() {
        assert_eq!(strip_data_url("data:application/pdf;base64,TWFu"), "TWFu");
        assert_eq!(strip_data_url("TWFu"), "TWFu");
        assert_eq!(estimated_decoded_len("data:application/pdf;base64,TWFu\nTWE="), 5);
    }

    #[test]
    fn oversized_payload_is_rejected_before_decoding() {
        // 18 bytes against a 15 byte limit. Not valid base64 either, so reaching
        // the decoder would produce a different message.
        let payload = "!".repeat(24);
        let err = check_pdf_payload(&payload, 15).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("too large")));
    }

    #[test]
    fn payload_at_limit_is_accepted() {
        let size = check_pdf_payload("data:application/pdf;base64,JVBERi0xLjQK", 9).unwrap();
        assert_eq!(size, 9);
        assert!(check_pdf_payload("JVBERi0xLjQK", 8).is_err());
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let err = check_pdf_payload("not*base64*", MIB).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("base64")));
    }
}
