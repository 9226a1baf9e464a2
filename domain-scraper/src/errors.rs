//! Error types for the scraping and digest core.
//!
//! Collaborators at the edges (mailer, CLI) use `anyhow`; everything that
//! touches the store or parses messages reports a `ScraperError` so callers
//! can tell "run scraping first" apart from a corrupt store.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, ScraperError>;

#[derive(Error, Debug)]
pub enum ScraperError {
    /// A message had no usable Message-ID header.
    #[error("message has no usable Message-ID header{}", source_suffix(.source_path))]
    MissingIdentifier { source_path: Option<PathBuf> },

    /// The store file is required but was never written.
    #[error("store file missing ({}); run domain scraping first", .path.display())]
    StoreNotFound { path: PathBuf },

    /// The store file exists but does not hold the expected JSON object.
    #[error("store file {} is corrupt: {source}", .path.display())]
    StoreCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse email headers: {0}")]
    Parse(#[from] mailparse::MailParseError),

    #[error("invalid header pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid digest template: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("failed to render digest: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("failed to encode JSON: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ScraperError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ScraperError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the error only means there is no store to read yet.
    pub fn is_store_not_found(&self) -> bool {
        matches!(self, ScraperError::StoreNotFound { .. })
    }
}

fn source_suffix(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" ({})", p.display()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    use handlebars::Handlebars;

    #[test]
    fn test_missing_identifier_message_includes_path() {
        let err = ScraperError::MissingIdentifier {
            source_path: Some(PathBuf::from("emails/input/a.eml")),
        };
        assert_eq!(
            err.to_string(),
            "message has no usable Message-ID header (emails/input/a.eml)"
        );

        let err = ScraperError::MissingIdentifier { source_path: None };
        assert_eq!(err.to_string(), "message has no usable Message-ID header");
    }

    #[test]
    fn test_store_not_found_hint() {
        let err = ScraperError::StoreNotFound {
            path: PathBuf::from("db/email_database.json"),
        };
        assert!(err.is_store_not_found());
        assert!(err.to_string().contains("run domain scraping first"));
    }

    #[test]
    fn test_template_errors_keep_their_source() {
        let template_err = Handlebars::new()
            .register_template_string("broken", "{{#if ready}}")
            .unwrap_err();
        let err = ScraperError::from(template_err);

        assert!(matches!(err, ScraperError::Template(_)));
        assert!(err.to_string().starts_with("invalid digest template"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_render_errors_keep_their_source() {
        let render_err = Handlebars::new().render("absent", &()).unwrap_err();
        let err = ScraperError::from(render_err);

        assert!(matches!(err, ScraperError::Render(_)));
        assert!(err.source().is_some());
    }
}
