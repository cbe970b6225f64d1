//! Formal SignWriting (FSW) notation checks.
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Optional `A` sequence prefix, one box marker with its max coordinate,
    /// then zero or more positioned symbols.
    static ref FSW_SIGN: Regex = Regex::new(
        r"^(A(S[1-3][0-9a-f]{2}[0-5][0-9a-f])+)?[BLMR][0-9]{3}x[0-9]{3}(S[1-3][0-9a-f]{2}[0-5][0-9a-f][0-9]{3}x[0-9]{3})*$"
    ).unwrap();
}

/// Strict check that `text` is exactly one FSW sign, with no whitespace.
pub fn is_valid_fsw(text: &str) -> bool {
    FSW_SIGN.is_match(text)
}
