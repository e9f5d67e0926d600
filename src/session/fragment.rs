//! Redirect fragment parsing
//!
//! The identity provider redirects back with credentials in the URL fragment
//! (`#access_token=...&token_type=Bearer&expires_in=3600`). The host page
//! passes that fragment in as a string.

use std::collections::HashMap;

/// Parse a URL fragment into a key/value map
///
/// Pairs are separated by `&` or `;`. Each pair is split at its first `=` and
/// the value is percent-decoded. Pairs with no `=` or an empty key are skipped,
/// and a repeated key keeps its last value.
pub fn extract(fragment: &str) -> HashMap<String, String> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    let mut params = HashMap::new();

    for pair in fragment.split(['&', ';']) {
        let Some((key, value)) = pair.split_once('=') else {
            if !pair.is_empty() {
                tracing::debug!("Skipping fragment entry without '=': {}", pair);
            }
            continue;
        };

        if key.is_empty() {
            continue;
        }

        params.insert(key.to_string(), decode_value(value));
    }

    params
}

/// Percent-decode a value, keeping it verbatim if it does not decode to UTF-8
fn decode_value(value: &str) -> String {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_string())
}
