//! Human and JSON rendering of command results
//!
//! Human output goes to stdout with a status glyph per line; warnings and
//! errors go to stderr. JSON output prints one object per message so it can
//! be piped into `jq`.

use serde_json::{json, Value};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Trait for formatting CLI output
pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    fn print_json(&self, value: &Value);
    /// Aligned `key: value` lines under the previous message
    fn fields(&self, pairs: &[(&str, String)]);
}

pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("\u{2717} {message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("! {message}");
    }

    fn info(&self, message: &str) {
        println!("  {message}");
    }

    fn print_json(&self, _value: &Value) {}

    fn fields(&self, pairs: &[(&str, String)]) {
        let width = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0) + 1;
        for (key, value) in pairs {
            println!("  {:width$}  {value}", format!("{key}:"));
        }
    }
}

pub struct JsonFormatter;

impl JsonFormatter {
    fn message(level: &str, message: &str) -> Value {
        json!({ "level": level, "message": message })
    }
}

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!("{}", Self::message("success", message));
    }

    fn error(&self, message: &str) {
        eprintln!("{}", Self::message("error", message));
    }

    fn warn(&self, message: &str) {
        eprintln!("{}", Self::message("warning", message));
    }

    // Detail lines only make sense next to human output
    fn info(&self, _message: &str) {}

    fn print_json(&self, value: &Value) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(_) => println!("{value}"),
        }
    }

    fn fields(&self, _pairs: &[(&str, String)]) {}
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Human => Box::new(HumanFormatter),
    }
}
