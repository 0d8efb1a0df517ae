#[derive(Debug, thiserror::Error)]
pub(crate) enum ScrapeError {
    #[error("Results count label `{locator}` was not found on {url}")]
    MissingResultsCount { locator: String, url: String },
    #[error("Results count label {0:?} does not contain a number")]
    UnreadableResultsCount(String),
    #[error("Input closed before a {0} was entered")]
    InputClosed(&'static str),
    #[error("Invalid selector `{locator}`: {reason}")]
    InvalidSelector { locator: String, reason: String },
    #[error("Table has no `{0}` column")]
    MissingColumn(&'static str),
}
