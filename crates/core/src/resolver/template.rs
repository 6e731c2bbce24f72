// Relative-path template expansion and URL escaping.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Placeholder tokens in a relative-path template: `{param}`.
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("invalid token regex"));

/// Extract placeholder names in template order.
pub fn parse_template(template: &str) -> Vec<String> {
    TOKEN_PATTERN
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Substitute every placeholder from `params`, percent-encoding the values.
/// The `*` wildcard standing in for an unset field passes through unescaped,
/// and placeholders with no entry are left as-is.
pub fn expand(template: &str, params: &HashMap<String, String>) -> String {
    TOKEN_PATTERN
        .replace_all(template, |caps: &regex::Captures| match params.get(&caps[1]) {
            Some(value) if value == "*" => value.clone(),
            Some(value) => percent_encode(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

pub fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        let is_unreserved =
            byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~');
        if is_unreserved {
            encoded.push(char::from(byte));
        } else {
            encoded.push('%');
            encoded.push_str(&format!("{:02X}", byte));
        }
    }
    encoded
}

/// Decode `%XX` escapes; malformed escapes pass through untouched.
pub fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                decoded.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}
