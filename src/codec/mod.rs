//! Codecs between the on-disk JSON shape and the in-memory record model.
//!
//! All decode/encode functions are pure and synchronous; they hold no
//! shared state and are safe to call from any thread. Decoding arbitrary
//! external JSON is lossy (unknown keys are dropped), but decoding
//! freshly-encoded data is lossless: `decode(encode(decode(raw)))`
//! equals `decode(raw)` for any structurally valid input.

pub mod condition;
pub mod spawn;

pub use condition::Condition;
pub use spawn::{DropEntry, Drops, HerdMember, SpawnEntry, SpawnPool, WeightMultiplier};

/// Parse a float from user-edited text, falling back to `default` when the
/// text is not a number. The second element reports whether the fallback
/// was used, so callers can log a diagnostic without the parse ever failing.
pub fn parse_f64_or(text: &str, default: f64) -> (f64, bool) {
    match text.trim().parse::<f64>() {
        Ok(v) => (v, false),
        Err(_) => (default, true),
    }
}

/// Parse a non-negative integer from user-edited text, falling back to
/// `default`. Same contract as [`parse_f64_or`].
pub fn parse_u32_or(text: &str, default: u32) -> (u32, bool) {
    match text.trim().parse::<u32>() {
        Ok(v) => (v, false),
        Err(_) => (default, true),
    }
}

/// Parse a signed integer from user-edited text. Unlike the fallback
/// helpers this distinguishes "blank" (field left empty, `Ok(None)`)
/// from "malformed" (`Err(())`), which condition fields need.
pub fn parse_opt_i32(text: &str) -> Result<Option<i32>, ()> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<i32>().map(Some).map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_float_falls_back_without_raising() {
        assert_eq!(parse_f64_or("not a number", 1.0), (1.0, true));
        assert_eq!(parse_f64_or("", 1.0), (1.0, true));
        assert_eq!(parse_f64_or("2.5", 1.0), (2.5, false));
    }

    #[test]
    fn test_u32_fallback() {
        assert_eq!(parse_u32_or("7", 1), (7, false));
        assert_eq!(parse_u32_or("-3", 1), (1, true));
        assert_eq!(parse_u32_or("x", 5), (5, true));
    }

    #[test]
    fn test_opt_i32_blank_vs_malformed() {
        assert_eq!(parse_opt_i32("  "), Ok(None));
        assert_eq!(parse_opt_i32("-12"), Ok(Some(-12)));
        assert_eq!(parse_opt_i32("twelve"), Err(()));
    }
}
