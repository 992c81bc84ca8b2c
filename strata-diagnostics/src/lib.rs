// Console output for Strata
// Severity-styled messages plus SQL / JSON highlighting for terminal display

use colored::Colorize;
use std::fmt;

pub mod highlight;
mod json;
mod sql;

pub use highlight::{highlight, highlight_json, highlight_sql, ContentKind};

/// Message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    /// Info and warnings go to stdout, errors to stderr
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "{}", "info".blue().bold()),
            Severity::Warning => write!(f, "{}", "warning".yellow().bold()),
            Severity::Error => write!(f, "{}", "error".red().bold()),
            Severity::Fatal => write!(f, "{}", "fatal".white().on_red().bold()),
        }
    }
}

/// Style `prefix` for `severity` and append `body`: `"<prefix> <body>"`.
pub fn format_message(severity: Severity, prefix: &str, body: impl fmt::Display) -> String {
    let prefix = match severity {
        Severity::Info => prefix.bright_black().underline(),
        Severity::Warning => prefix.yellow().underline(),
        Severity::Error => prefix.red().underline(),
        Severity::Fatal => prefix.white().on_red().bold(),
    };
    format!("{} {}", prefix, body)
}

pub fn format_info(prefix: &str, info: impl fmt::Display) -> String {
    format_message(Severity::Info, prefix, info)
}

pub fn format_warning(prefix: &str, warning: impl fmt::Display) -> String {
    format_message(Severity::Warning, prefix, warning)
}

pub fn format_error(prefix: &str, error: impl fmt::Display) -> String {
    format_message(Severity::Error, prefix, error)
}

pub fn format_fatal(prefix: &str, error: impl fmt::Display) -> String {
    format_message(Severity::Fatal, prefix, error)
}

/// Underlined plain message
pub fn emphasize(message: &str) -> String {
    message.underline().to_string()
}

/// Yellow warning text without a prefix
pub fn warn(message: &str) -> String {
    message.yellow().to_string()
}

fn emit(severity: Severity, line: String) {
    if severity.is_error() {
        eprintln!("{}", line);
    } else {
        println!("{}", line);
    }
}

pub fn log_info(prefix: &str, info: impl fmt::Display) {
    emit(Severity::Info, format_info(prefix, info));
}

pub fn log_warning(prefix: &str, warning: impl fmt::Display) {
    emit(Severity::Warning, format_warning(prefix, warning));
}

pub fn log_error(prefix: &str, error: impl fmt::Display) {
    emit(Severity::Error, format_error(prefix, error));
}

pub fn log_fatal(prefix: &str, error: impl fmt::Display) {
    emit(Severity::Fatal, format_fatal(prefix, error));
}

/// Remove ANSI escape sequences from styled output
#[cfg(test)]
pub(crate) fn strip_styles(styled: &str) -> String {
    let mut plain = String::with_capacity(styled.len());
    let mut chars = styled.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\u{1b}' && chars.peek() == Some(&'[') {
            chars.next();
            // CSI sequence ends at the first byte in '@'..='~'
            for c in chars.by_ref() {
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
        } else {
            plain.push(c);
        }
    }

    plain
}
