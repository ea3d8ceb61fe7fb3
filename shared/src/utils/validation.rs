//! Sanitization of raw user input

use regex::Regex;

/// Remove every character matching `pattern` from a user supplied code.
///
/// With the default pattern (`[^0-9]`) this keeps only digits, so
/// `" 12-34 "` becomes `"1234"`.
pub fn sanitize_verification_code(code: &str, pattern: &Regex) -> String {
    pattern.replace_all(code, "").into_owned()
}
