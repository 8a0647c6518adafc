//! Pattern compilation helpers for prompt, pagination and error detection.

use regex::bytes::Regex as BytesRegex;

use crate::error::PlatformError;

/// Compile a prompt pattern string into a byte regex.
///
/// Anchors to the end of the text (allowing trailing whitespace) if the
/// pattern does not already carry an anchor, so a prompt is only recognised
/// where the device stopped writing.
pub fn compile_prompt_pattern(pattern: &str) -> Result<BytesRegex, PlatformError> {
    let anchored = if pattern.ends_with('$') {
        pattern.to_string()
    } else {
        format!("{}\\s*$", pattern)
    };

    compile_bytes(&anchored)
}

/// Compile a byte regex, reporting the offending pattern on failure.
pub fn compile_bytes(pattern: &str) -> Result<BytesRegex, PlatformError> {
    BytesRegex::new(pattern).map_err(|source| PlatformError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Compile a text regex, reporting the offending pattern on failure.
pub fn compile_text(pattern: &str) -> Result<regex::Regex, PlatformError> {
    regex::Regex::new(pattern).map_err(|source| PlatformError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_prompt_pattern() {
        let pattern = compile_prompt_pattern(r"router#").unwrap();
        assert!(pattern.is_match(b"router# "));
        assert!(!pattern.is_match(b"router# show"));

        let pattern = compile_prompt_pattern(r"router#$").unwrap();
        assert!(pattern.is_match(b"router#"));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = compile_text(r"(unclosed").unwrap_err();
        assert!(matches!(err, PlatformError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));
    }
}
