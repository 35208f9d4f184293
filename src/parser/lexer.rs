//! Lexer for template bodies using logos
//!
//! Bodies are opaque text; the only structure the lexer recognises is the
//! double-brace delimiter pair that surrounds a placeholder.

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    // Delimiters (longer patterns win over single braces)
    #[token("{{")]
    RefOpen,
    #[token("}}")]
    RefClose,

    // A single brace outside a delimiter pair is ordinary text
    #[regex(r"[{}]")]
    Brace,

    #[regex(r"[^{}]+")]
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Token::lexer(source).filter_map(Result::ok).collect()
    }

    #[test]
    fn test_lex_plain_text() {
        assert_eq!(lex("SELECT 1"), vec![Token::Text]);
    }

    #[test]
    fn test_lex_placeholder() {
        assert_eq!(
            lex("FROM {{loc}} x"),
            vec![
                Token::Text,
                Token::RefOpen,
                Token::Text,
                Token::RefClose,
                Token::Text
            ]
        );
    }

    #[test]
    fn test_lex_single_braces() {
        assert_eq!(
            lex("a{b}c"),
            vec![Token::Text, Token::Brace, Token::Text, Token::Brace, Token::Text]
        );
    }

    #[test]
    fn test_lex_triple_brace() {
        assert_eq!(lex("{{{"), vec![Token::RefOpen, Token::Brace]);
    }
}
