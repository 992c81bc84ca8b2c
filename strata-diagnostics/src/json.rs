use colored::Colorize;
use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum JsonToken {
    #[regex(r"[ \t\r\n]+")]
    Ws,
    #[regex(r#""([^"\\]|\\.)*""#)]
    String,
    #[regex(r"-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,
    #[token("true")]
    #[token("false")]
    #[token("null")]
    Literal,
    #[token(":")]
    Colon,
    #[regex(r"[{}\[\],]")]
    Punct,
}

pub(crate) fn highlight(source: &str) -> String {
    // Object keys are strings followed by ':', so look ahead over whitespace.
    let tokens: Vec<(Result<JsonToken, ()>, &str)> = {
        let mut lexer = JsonToken::lexer(source);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next() {
            tokens.push((token, lexer.slice()));
        }
        tokens
    };

    let mut out = String::with_capacity(source.len() * 2);
    for (i, (token, text)) in tokens.iter().enumerate() {
        let styled = match token {
            Ok(JsonToken::String) if is_key(&tokens, i) => text.cyan().to_string(),
            Ok(JsonToken::String) => text.green().to_string(),
            Ok(JsonToken::Number) => text.yellow().to_string(),
            Ok(JsonToken::Literal) => text.magenta().to_string(),
            Ok(JsonToken::Ws | JsonToken::Colon | JsonToken::Punct) | Err(_) => text.to_string(),
        };
        out.push_str(&styled);
    }

    out
}

fn is_key(tokens: &[(Result<JsonToken, ()>, &str)], index: usize) -> bool {
    tokens
        .iter()
        .skip(index + 1)
        .find(|(token, _)| *token != Ok(JsonToken::Ws))
        .is_some_and(|(token, _)| *token == Ok(JsonToken::Colon))
}
