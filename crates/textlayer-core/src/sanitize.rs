//! Character sanitation for standard-font output
//!
//! The standard 14 fonts only encode the WinAnsi range, so typographic
//! characters commonly produced by word processors are substituted
//! with ASCII equivalents before drawing. Text that still falls
//! outside the encodable range after substitution is skipped rather
//! than written as mojibake.

/// Substitution table for common typographic characters.
const SUBSTITUTIONS: &[(char, &str)] = &[
    ('\u{2192}', "->"),  // arrow
    ('\u{2022}', "*"),   // bullet
    ('\u{2018}', "'"),   // left single quote
    ('\u{2019}', "'"),   // right single quote
    ('\u{201C}', "\""),  // left double quote
    ('\u{201D}', "\""),  // right double quote
    ('\u{2014}', "-"),   // em dash
    ('\u{2013}', "-"),   // en dash
    ('\u{2026}', "..."), // ellipsis
];

#[derive(Debug, Clone, PartialEq)]
pub enum SanitizeOutcome {
    /// All characters are encodable after substitution.
    Clean(String),
    /// Characters outside the encodable range remain; the item must
    /// be skipped and reported.
    Unsupported,
}

fn is_encodable(c: char) -> bool {
    // ASCII plus the Latin-1 printable range. U+0080..=U+009F is
    // excluded: WinAnsiEncoding assigns those codes different glyphs
    // than Latin-1, so text containing them must be skipped instead
    // of exported with the wrong glyphs.
    let code = c as u32;
    code <= 0x7F || (0xA0..=0xFF).contains(&code)
}

/// Substitute typographic characters and verify the result is fully
/// representable in a standard-font encoding.
pub fn sanitize_for_standard_font(text: &str) -> SanitizeOutcome {
    if text.chars().all(is_encodable) {
        return SanitizeOutcome::Clean(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if let Some((_, replacement)) = SUBSTITUTIONS.iter().find(|(from, _)| *from == c) {
            out.push_str(replacement);
        } else {
            out.push(c);
        }
    }

    if out.chars().all(is_encodable) {
        SanitizeOutcome::Clean(out)
    } else {
        SanitizeOutcome::Unsupported
    }
}

/// Encode sanitized text as Latin-1 bytes for a content-stream string
/// literal. Callers must only pass strings vetted by
/// [`sanitize_for_standard_font`].
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars().map(|c| (c as u32).min(0xFF) as u8).collect()
}
