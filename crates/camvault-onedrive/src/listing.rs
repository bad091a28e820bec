//! Parsers for folder children responses
//!
//! Callers only see [`ChildrenParser`]; which parser is used comes from the
//! `onedrive.listing_parser` setting.

use camvault_core::{config::ListingParserKind, domain::naming::PICTURE_EXTENSION};
use serde::Deserialize;

/// Extracts picture names from the body of a `:/children` response
pub trait ChildrenParser: Send + Sync {
    fn parse(&self, body: &str) -> Vec<String>;
}

/// Splits the body on `"` and keeps every token naming a picture
///
/// Tokens containing a `/` are URLs or paths (download links, parent
/// references) rather than child names and are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct LenientChildrenParser;

impl ChildrenParser for LenientChildrenParser {
    fn parse(&self, body: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for token in body.split('"') {
            if token.contains(PICTURE_EXTENSION)
                && !token.contains('/')
                && !names.iter().any(|n| n == token)
            {
                names.push(token.to_string());
            }
        }
        names
    }
}

#[derive(Debug, Deserialize)]
struct ChildrenResponse {
    #[serde(default)]
    value: Vec<ChildItem>,
}

#[derive(Debug, Deserialize)]
struct ChildItem {
    name: Option<String>,
}

/// Decodes the body as JSON and keeps `value[].name` entries ending in `.jpg`
///
/// An undecodable body yields no names.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonChildrenParser;

impl ChildrenParser for JsonChildrenParser {
    fn parse(&self, body: &str) -> Vec<String> {
        match serde_json::from_str::<ChildrenResponse>(body) {
            Ok(response) => response
                .value
                .into_iter()
                .filter_map(|item| item.name)
                .filter(|name| name.ends_with(PICTURE_EXTENSION))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Children response is not valid JSON");
                Vec::new()
            }
        }
    }
}

/// Builds the parser selected in configuration
pub fn parser_for(kind: ListingParserKind) -> Box<dyn ChildrenParser> {
    match kind {
        ListingParserKind::Lenient => Box::new(LenientChildrenParser),
        ListingParserKind::Json => Box::new(JsonChildrenParser),
    }
}
