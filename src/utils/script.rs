//! Devanagari script filter.
//!
//! OCR output for a Sanskrit page routinely contains Latin debris, digits
//! and stray symbols. Translation quality drops sharply when that noise is
//! fed to the model, so everything outside the Devanagari block and a small
//! punctuation whitelist is dropped before translation.

/// Devanagari Unicode block
const DEVANAGARI_START: char = '\u{0900}';
const DEVANAGARI_END: char = '\u{097F}';

/// Punctuation and whitespace retained alongside Devanagari. The danda
/// (U+0964) is the script's sentence terminator.
const WHITELIST: [char; 8] = [' ', '\n', '.', '।', '-', ',', ':', ';'];

/// Returns true when a character survives filtering.
pub fn is_retained(c: char) -> bool {
    (DEVANAGARI_START..=DEVANAGARI_END).contains(&c) || WHITELIST.contains(&c)
}

/// Keep only Devanagari characters plus the whitelist, preserving order.
/// Total function: never fails, never inserts or reorders.
pub fn filter_devanagari(text: &str) -> String {
    text.chars().filter(|c| is_retained(*c)).collect()
}
