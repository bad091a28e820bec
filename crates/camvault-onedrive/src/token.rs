//! Token response parsing
//!
//! The token endpoint answers with a JSON object. Only the two string fields
//! `access_token` and `refresh_token` matter here, and they are located as
//! `"key":"value"` substrings instead of decoding the whole document, so
//! extra or reordered fields never break a login.

use camvault_core::domain::TokenPair;

use crate::{OneDriveError, Result};

pub const ACCESS_TOKEN_FIELD: &str = "access_token";
pub const REFRESH_TOKEN_FIELD: &str = "refresh_token";

/// Extracts the token pair from a token endpoint response body
///
/// # Errors
/// [`OneDriveError::TokenParse`] naming the first missing field.
pub fn parse_token_response(body: &str) -> Result<TokenPair> {
    let access_token = extract_string_field(body, ACCESS_TOKEN_FIELD).ok_or(
        OneDriveError::TokenParse {
            field: ACCESS_TOKEN_FIELD,
        },
    )?;
    let refresh_token = extract_string_field(body, REFRESH_TOKEN_FIELD).ok_or(
        OneDriveError::TokenParse {
            field: REFRESH_TOKEN_FIELD,
        },
    )?;
    Ok(TokenPair::new(access_token, refresh_token))
}

/// Finds `"key"` followed by `:` and a quoted string value
///
/// Whitespace around the colon is tolerated. Returns `None` when the key is
/// absent, its value is not a string, or the string is unterminated.
fn extract_string_field(body: &str, key: &str) -> Option<String> {
    let needle = format!("\"{}\"", key);
    let mut search_from = 0;

    while let Some(found) = body[search_from..].find(&needle) {
        let after_key = search_from + found + needle.len();
        let rest = body[after_key..].trim_start();
        if let Some(rest) = rest.strip_prefix(':') {
            if let Some(value) = rest.trim_start().strip_prefix('"') {
                return read_json_string(value);
            }
        }
        search_from = after_key;
    }
    None
}

/// Reads a JSON string body up to its closing quote, resolving simple escapes
fn read_json_string(input: &str) -> Option<String> {
    let mut out = String::new();
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return Some(out),
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                other => out.push(other),
            },
            other => out.push(other),
        }
    }
    None
}
