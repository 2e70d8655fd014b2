use thiserror::Error;

/// Template syntax error raised while parsing a template or one of its partials.
///
/// Parsing is fail-fast: whenever one of these is returned no template is
/// produced. Rendering never fails on missing data, so the only other producer
/// is the data-binding boundary ([`crate::data::to_value`]).
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Unclosed tag at end of document")]
    UnclosedTag,
    #[error("Unclosed literal tag at end of document")]
    UnclosedLiteralTag,
    #[error("Unclosed section at end of document - {0}")]
    UnclosedSection(String),
    #[error("Unmatched section close tag - expected {}, got {found}", .expected.as_deref().unwrap_or("no open section"))]
    UnmatchedSectionClose {
        expected: Option<String>,
        found: String,
    },
    #[error("Illegal empty tag")]
    EmptyTag,
    #[error("Incorrect delimiter tag - {0}")]
    IncorrectDelimiter(String),
    #[error("Line buffer overflow: line longer than {0} bytes")]
    LineBufferOverflow(usize),
    #[error("Template source is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("Partial not found: {0}")]
    PartialNotFound(String),
    #[error("Partial {name} failed to load: {source}")]
    PartialLoad {
        name: String,
        #[source]
        source: Box<TemplateError>,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Value error: {0}")]
    Value(String),
}

impl serde::ser::Error for TemplateError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        TemplateError::Value(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_close_names_both_sections() {
        let err = TemplateError::UnmatchedSectionClose {
            expected: Some("a".to_string()),
            found: "b".to_string(),
        };
        assert_eq!(err.to_string(), "Unmatched section close tag - expected a, got b");
    }

    #[test]
    fn test_unmatched_close_at_top_level() {
        let err = TemplateError::UnmatchedSectionClose {
            expected: None,
            found: "b".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unmatched section close tag - expected no open section, got b"
        );
    }
}
