use bytes::Bytes;
use futures::stream::{self, Stream};
use lex_fetch::Fetcher;
use scraper::{Html, Selector};
use tracing::info;
use url::Url;

use crate::error::ScrapeError;

const BASE_URL: &str = "https://www.legislation.gov.uk";
const RESULTS_PER_PAGE: u32 = 50;

pub type ScrapedDocument = Result<(String, Bytes), ScrapeError>;

fn changes_url(year_affected: i32, page: u32) -> Result<Url, ScrapeError> {
    let mut url = Url::parse(&format!("{BASE_URL}/changes/affected/{year_affected}/data.feed"))?;
    url.query_pairs_mut()
        .append_pair("results-count", &RESULTS_PER_PAGE.to_string())
        .append_pair("page", &page.to_string());
    Ok(url)
}

fn has_results_table(html: &str) -> bool {
    let document = Html::parse_document(html);
    let selector = Selector::parse("table tbody tr").expect("static selector is valid");
    document.select(&selector).next().is_some()
}

/// Streams each changes-index page's raw HTML for the given `year_affected`
/// values, walking pages in ascending order (the source sorts entries by
/// date descending within each page) and stopping the moment a page carries
/// no results table.
pub fn scrape(
    fetcher: &Fetcher,
    years_affected: Vec<i32>,
    limit: Option<usize>,
) -> impl Stream<Item = ScrapedDocument> + '_ {
    struct State {
        years: std::vec::IntoIter<i32>,
        current_year: Option<i32>,
        page: u32,
        remaining: Option<usize>,
        exhausted: bool,
    }

    let initial = State {
        years: years_affected.into_iter(),
        current_year: None,
        page: 1,
        remaining: limit,
        exhausted: false,
    };

    stream::unfold((initial, fetcher), move |(mut state, fetcher)| async move {
        loop {
            if state.exhausted || state.remaining == Some(0) {
                return None;
            }

            let year = match state.current_year {
                Some(year) => year,
                None => match state.years.next() {
                    Some(year) => {
                        state.current_year = Some(year);
                        state.page = 1;
                        year
                    }
                    None => {
                        state.exhausted = true;
                        continue;
                    }
                },
            };

            let url = match changes_url(year, state.page) {
                Ok(url) => url,
                Err(err) => return Some((Err(err), (state, fetcher))),
            };

            match fetcher.get(url.as_str()).await {
                Ok(response) => {
                    let text = match response.text() {
                        Ok(text) => text,
                        Err(_) => {
                            state.current_year = None;
                            continue;
                        }
                    };

                    if !has_results_table(&text) {
                        info!(year_affected = year, page = state.page, "no results table, advancing year");
                        state.current_year = None;
                        continue;
                    }

                    info!(year_affected = year, page = state.page, "fetched changes page");
                    state.page += 1;
                    if let Some(remaining) = state.remaining.as_mut() {
                        *remaining -= 1;
                    }
                    return Some((Ok((url.to_string(), response.bytes)), (state, fetcher)));
                }
                Err(err) => return Some((Err(err.into()), (state, fetcher))),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_url_has_year_and_pagination() {
        let url = changes_url(2023, 3).unwrap();
        assert!(url.as_str().starts_with("https://www.legislation.gov.uk/changes/affected/2023/data.feed"));
        assert!(url.query_pairs().any(|(k, v)| k == "page" && v == "3"));
    }

    #[test]
    fn detects_absence_of_results_table() {
        assert!(!has_results_table("<html><body>no changes found</body></html>"));
        assert!(has_results_table("<table><tbody><tr><td>x</td></tr></tbody></table>"));
    }
}
