// Content-aware highlighting

use std::fmt;
use std::str::FromStr;

use crate::{json, sql};

/// Kind of text being displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentKind {
    Sql,
    Json,
    #[default]
    Plain,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Sql => "sql",
            ContentKind::Json => "json",
            ContentKind::Plain => "plain",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sql" => Ok(ContentKind::Sql),
            "json" => Ok(ContentKind::Json),
            "plain" | "text" => Ok(ContentKind::Plain),
            other => Err(format!("unknown content kind '{}'", other)),
        }
    }
}

/// Style `text` for the terminal. The visible characters are never changed;
/// input the tokenizer does not recognize is passed through as is.
pub fn highlight(text: &str, kind: ContentKind) -> String {
    match kind {
        ContentKind::Sql => sql::highlight(text),
        ContentKind::Json => json::highlight(text),
        ContentKind::Plain => text.to_string(),
    }
}

pub fn highlight_sql(text: &str) -> String {
    highlight(text, ContentKind::Sql)
}

pub fn highlight_json(text: &str) -> String {
    highlight(text, ContentKind::Json)
}
