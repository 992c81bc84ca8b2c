use colored::Colorize;
use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum SqlToken {
    #[regex(r"[ \t\r\n\f]+")]
    Ws,
    #[regex(r"--[^\n]*")]
    LineComment,
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    #[regex(r"'([^']|'')*'")]
    String,
    #[regex(r#""([^"]|"")*""#)]
    #[regex(r"`[^`]*`")]
    QuotedIdent,
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,
    #[regex(r"\$[0-9]+")]
    #[token("?")]
    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*")]
    Param,
    #[regex(r"[A-Za-z_][A-Za-z0-9_$]*")]
    Word,
    #[regex(r"[-+*/%<>=!|&^~:;,.()\[\]]")]
    Punct,
}

const KEYWORDS: &[&str] = &[
    "add", "all", "alter", "and", "as", "asc", "begin", "between", "by", "cascade", "case",
    "check", "column", "commit", "constraint", "create", "cross", "database", "default", "delete",
    "desc", "distinct", "drop", "else", "end", "exists", "foreign", "from", "full", "group",
    "having", "if", "in", "index", "inner", "insert", "into", "is", "join", "key", "left", "like",
    "limit", "not", "offset", "on", "or", "order", "outer", "primary", "references", "release",
    "returning", "right", "rollback", "savepoint", "schema", "select", "set", "table", "then",
    "transaction", "truncate", "union", "unique", "update", "using", "values", "view", "when",
    "where", "with",
];

const LITERALS: &[&str] = &["true", "false", "null"];

fn is_one_of(word: &str, list: &[&str]) -> bool {
    list.iter().any(|k| k.eq_ignore_ascii_case(word))
}

pub(crate) fn highlight(source: &str) -> String {
    let mut out = String::with_capacity(source.len() * 2);
    let mut lexer = SqlToken::lexer(source);

    while let Some(token) = lexer.next() {
        let text = lexer.slice();
        let styled = match token {
            Ok(SqlToken::Word) if is_one_of(text, KEYWORDS) => text.blue().bold().to_string(),
            Ok(SqlToken::Word) if is_one_of(text, LITERALS) => text.magenta().to_string(),
            Ok(SqlToken::String) => text.green().to_string(),
            Ok(SqlToken::QuotedIdent) => text.cyan().to_string(),
            Ok(SqlToken::Number) => text.yellow().to_string(),
            Ok(SqlToken::Param) => text.magenta().to_string(),
            Ok(SqlToken::LineComment | SqlToken::BlockComment) => {
                text.bright_black().to_string()
            }
            // Unrecognized input passes through unstyled
            Ok(SqlToken::Ws | SqlToken::Word | SqlToken::Punct) | Err(_) => text.to_string(),
        };
        out.push_str(&styled);
    }

    out
}
