use thiserror::Error;

/// Conditions that abort a run before any result is produced.
///
/// Problems limited to one submission or one pair are not errors of the run: an unreadable
/// submission is marked invalid and a failed pair is listed as skipped in the result.
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected option value.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not enough valid submissions: found {found}, need at least 2")]
    NotEnoughSubmissions { found: usize },

    #[error("Unknown language: {name} (available: {available})")]
    UnknownLanguage { name: String, available: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration file: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("Invalid exclusion pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
mod test {
    use super::Error;
    use std::io;

    #[test]
    fn from_io_error() {
        let err = Error::from(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("no such directory"));
    }

    #[test]
    fn not_enough_submissions_reports_count() {
        let err = Error::NotEnoughSubmissions { found: 1 };
        assert_eq!(err.to_string(), "Not enough valid submissions: found 1, need at least 2");
    }

    #[test]
    fn unknown_language_lists_alternatives() {
        let err = Error::UnknownLanguage {
            name: "cobol".to_owned(),
            available: "char, text".to_owned(),
        };
        assert!(err.to_string().contains("cobol"));
        assert!(err.to_string().contains("char, text"));
    }

    #[test]
    fn invalid_pattern() {
        let err = Error::from(regex::Regex::new("(").unwrap_err());
        assert!(err.to_string().starts_with("Invalid exclusion pattern"));
    }
}
