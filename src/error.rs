//! Error types for placeholder parsing and template compilation

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in a template body
pub type Span = std::ops::Range<usize>;

/// A malformed placeholder inside a template body
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Content between `{{` and `}}` is not an identifier
    #[error("invalid placeholder '{fragment}' at {span:?}: expected {{{{identifier}}}}")]
    InvalidPlaceholder { fragment: String, span: Span },

    /// An opening `{{` with no closing `}}`
    #[error("unterminated placeholder at {span:?}: missing closing '}}}}'")]
    Unterminated { span: Span },
}

impl ParseError {
    pub fn invalid_placeholder(fragment: impl Into<String>, span: Span) -> Self {
        Self::InvalidPlaceholder {
            fragment: fragment.into(),
            span,
        }
    }

    pub fn unterminated(span: Span) -> Self {
        Self::Unterminated { span }
    }

    /// Byte span of the offending fragment
    pub fn span(&self) -> &Span {
        match self {
            Self::InvalidPlaceholder { span, .. } => span,
            Self::Unterminated { span } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let span = self.span().clone();
        let label = match self {
            Self::InvalidPlaceholder { fragment, .. } => {
                format!("'{}' is not a template name", fragment)
            }
            Self::Unterminated { .. } => "placeholder opened here is never closed".to_string(),
        };

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_config(Config::default().with_color(false))
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span))
                    .with_message(label)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

/// Errors that can occur while registering, inspecting or compiling templates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Target or root name is not registered
    #[error("template not found: {name}")]
    NotFound { name: String },

    /// A placeholder names a template that is not registered
    #[error("unknown dependency '{name}' referenced by template '{referenced_by}'")]
    UnknownDependency { name: String, referenced_by: String },

    /// Dependency cycle reachable from the compile target
    #[error("circular template reference: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    /// Malformed placeholder in a template body
    #[error("malformed placeholder in template '{template}': {source}")]
    Parse {
        template: String,
        #[source]
        source: ParseError,
    },

    /// Literal parameter key is unusable
    #[error("invalid literal parameter '{key}': {reason}")]
    Config { key: String, reason: String },

    /// Template name does not match `[A-Za-z_][A-Za-z0-9_]*`
    #[error("invalid template name '{name}': expected [A-Za-z_][A-Za-z0-9_]*")]
    InvalidName { name: String },
}

impl QueryError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn unknown_dependency(name: impl Into<String>, referenced_by: impl Into<String>) -> Self {
        Self::UnknownDependency {
            name: name.into(),
            referenced_by: referenced_by.into(),
        }
    }

    /// Create a cycle error; `path` starts and ends with the repeated name
    pub fn cycle(path: Vec<String>) -> Self {
        Self::Cycle { path }
    }

    pub fn parse(template: impl Into<String>, source: ParseError) -> Self {
        Self::Parse {
            template: template.into(),
            source,
        }
    }

    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName { name: name.into() }
    }

    /// Get the cycle path if this is a cycle error
    pub fn cycle_path(&self) -> Option<&[String]> {
        match self {
            Self::Cycle { path } => Some(path),
            _ => None,
        }
    }

    /// Get the span of a malformed placeholder if available
    pub fn span(&self) -> Option<&Span> {
        match self {
            Self::Parse { source, .. } => Some(source.span()),
            _ => None,
        }
    }
}
