//! Placeholder extraction and substitution for template bodies
//!
//! A placeholder is `{{` identifier `}}` where the identifier matches
//! `[A-Za-z_][A-Za-z0-9_]*`. Everything else in a body is opaque text,
//! including SQL string literals: `'{{x}}'` is still a reference to `x`.

pub mod lexer;

use logos::Logos;

use crate::error::{ParseError, Span};
use lexer::Token;

/// A single placeholder occurrence in a body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Referenced template (or literal) name
    pub name: String,
    /// Span of the whole `{{name}}` token
    pub span: Span,
}

/// Check whether `name` matches `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Extract every placeholder in `body`, in order of appearance
///
/// Repeated references are kept, so the result lines up one-to-one with the
/// occurrences that [`substitute`] rewrites.
pub fn extract(body: &str) -> Result<Vec<Reference>, ParseError> {
    let mut lex = Token::lexer(body);
    let mut references = Vec::new();

    while let Some(token) = lex.next() {
        if token != Ok(Token::RefOpen) {
            continue;
        }
        let open = lex.span();

        // The placeholder runs up to the first closing delimiter
        let close = loop {
            match lex.next() {
                Some(Ok(Token::RefClose)) => break lex.span(),
                Some(_) => continue,
                None => return Err(ParseError::unterminated(open.start..body.len())),
            }
        };

        let span = open.start..close.end;
        let name = &body[open.end..close.start];
        if !is_identifier(name) {
            return Err(ParseError::invalid_placeholder(&body[span.clone()], span));
        }

        references.push(Reference {
            name: name.to_string(),
            span,
        });
    }

    Ok(references)
}

/// Names referenced by `body`, deduplicated in first-occurrence order
pub fn dependency_names(body: &str) -> Result<Vec<String>, ParseError> {
    let mut names: Vec<String> = Vec::new();
    for reference in extract(body)? {
        if !names.contains(&reference.name) {
            names.push(reference.name);
        }
    }
    Ok(names)
}

/// Rewrite every placeholder occurrence in `body`
///
/// `resolve` returns the replacement text for a name, or `None` to leave the
/// placeholder as written. Replacement text is inserted verbatim and is not
/// scanned again.
pub fn substitute<F>(body: &str, mut resolve: F) -> Result<String, ParseError>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut output = String::with_capacity(body.len());
    let mut cursor = 0;

    for reference in extract(body)? {
        output.push_str(&body[cursor..reference.span.start]);
        match resolve(&reference.name) {
            Some(replacement) => output.push_str(&replacement),
            None => output.push_str(&body[reference.span.clone()]),
        }
        cursor = reference.span.end;
    }
    output.push_str(&body[cursor..]);

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(body: &str) -> Vec<String> {
        extract(body)
            .expect("Should extract")
            .into_iter()
            .map(|r| r.name)
            .collect()
    }

    #[test]
    fn test_identifier_grammar() {
        assert!(is_identifier("loc"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("Query_2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2nd"));
        assert!(!is_identifier("a b"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier("é"));
    }

    #[test]
    fn test_extract_none() {
        assert!(names("SELECT * FROM locations").is_empty());
    }

    #[test]
    fn test_extract_in_order_with_duplicates() {
        assert_eq!(
            names("SELECT * FROM {{b}} JOIN {{a}} USING (id) JOIN {{b}} x"),
            vec!["b", "a", "b"]
        );
    }

    #[test]
    fn test_extract_spans() {
        let refs = extract("FROM {{loc}}").unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].span, 5..12);
    }

    #[test]
    fn test_quoted_placeholder_is_a_reference() {
        assert_eq!(names("SELECT '{{loc}}'"), vec!["loc"]);
    }

    #[test]
    fn test_single_braces_are_text() {
        assert!(names("SELECT '{a}', '}}' FROM t").is_empty());
    }

    #[test]
    fn test_invalid_placeholder_content() {
        let err = extract("SELECT * FROM {{ loc }}").unwrap_err();
        assert_eq!(err, ParseError::invalid_placeholder("{{ loc }}", 14..23));
    }

    #[test]
    fn test_empty_placeholder() {
        let err = extract("x {{}} y").unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidPlaceholder { ref fragment, .. } if fragment == "{{}}"
        ));
    }

    #[test]
    fn test_nested_open_is_invalid() {
        let err = extract("{{a{{b}}").unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidPlaceholder { ref fragment, .. } if fragment == "{{a{{b}}"
        ));
    }

    #[test]
    fn test_unterminated_placeholder() {
        let err = extract("SELECT {{loc").unwrap_err();
        assert_eq!(err, ParseError::unterminated(7..12));
    }

    #[test]
    fn test_dependency_names_dedup() {
        assert_eq!(
            dependency_names("{{b}} {{a}} {{b}} {{c}} {{a}}").unwrap(),
            vec!["b", "a", "c"]
        );
    }

    #[test]
    fn test_substitute_every_occurrence() {
        let out = substitute("{{a}} + {{a}} + {{b}}", |name| match name {
            "a" => Some("x".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(out, "x + x + {{b}}");
    }

    #[test]
    fn test_substitute_does_not_rescan() {
        let out = substitute("{{a}}", |_| Some("{{a}}".to_string())).unwrap();
        assert_eq!(out, "{{a}}");
    }

    #[test]
    fn test_substitute_keeps_surrounding_text() {
        let out = substitute("  SELECT {{a}};\n", |name| Some(name.to_uppercase())).unwrap();
        assert_eq!(out, "  SELECT A;\n");
    }
}
