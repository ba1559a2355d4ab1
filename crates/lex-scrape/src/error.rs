use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("case-law query requires a consecutive year range, got {years:?}")]
    NonConsecutiveYears { years: Vec<i32> },

    #[error("case-law query requires at least one year")]
    EmptyYearRange,

    #[error(transparent)]
    Fetch(#[from] lex_fetch::error::FetchError),

    #[error("failed to build request url: {0}")]
    Url(#[from] url::ParseError),
}
