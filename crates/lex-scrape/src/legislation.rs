use bytes::Bytes;
use futures::stream::{self, Stream};
use lex_core::model::LegislationType;
use lex_fetch::Fetcher;
use tracing::{debug, info};
use url::Url;

use crate::error::ScrapeError;

const BASE_URL: &str = "https://www.legislation.gov.uk";
const RESULTS_PER_PAGE: u32 = 50;

/// One yielded document: the canonical source url and its raw XML bytes.
pub type ScrapedDocument = Result<(String, Bytes), ScrapeError>;

fn listing_url(kind: LegislationType, year: i32, page: u32) -> Result<Url, ScrapeError> {
    let mut url = Url::parse(&format!("{BASE_URL}/{}/{}/data.feed", kind.code(), year))?;
    url.query_pairs_mut()
        .append_pair("results-count", &RESULTS_PER_PAGE.to_string())
        .append_pair("page", &page.to_string());
    Ok(url)
}

/// Extracts each entry's document uri from an Atom listing feed.
fn parse_listing_uris(xml: &str) -> Vec<String> {
    let root = match lex_parse::parse_tree(xml.as_bytes()) {
        Ok(root) => root,
        Err(_) => return Vec::new(),
    };

    let mut entries = Vec::new();
    root.find_all("entry", &mut entries);

    entries
        .into_iter()
        .filter_map(|entry| entry.find_first("id").map(|id| id.direct_text().trim().to_string()))
        .filter(|uri| !uri.is_empty())
        .collect()
}

/// Streams `(source_url, raw_xml)` pairs for one legislation type across the
/// given years, honouring `limit` as a total yielded-pair budget.
///
/// On a 404 or a "no Body element" response for a listed document, a
/// terminal processed marker is emitted instead of propagating an error —
/// the document exists only as a PDF and the caller's PDF-fallback path
/// takes over from there.
pub fn scrape(
    fetcher: &Fetcher,
    kind: LegislationType,
    years: Vec<i32>,
    limit: Option<usize>,
) -> impl Stream<Item = ScrapedDocument> + '_ {
    struct State {
        years: std::vec::IntoIter<i32>,
        current_year: Option<i32>,
        page: u32,
        pending_uris: std::vec::IntoIter<String>,
        remaining: Option<usize>,
        exhausted: bool,
    }

    let initial = State {
        years: years.into_iter(),
        current_year: None,
        page: 1,
        pending_uris: Vec::new().into_iter(),
        remaining: limit,
        exhausted: false,
    };

    stream::unfold((initial, kind, fetcher), move |(mut state, kind, fetcher)| async move {
        loop {
            if state.exhausted || state.remaining == Some(0) {
                return None;
            }

            if let Some(uri) = state.pending_uris.next() {
                let data_url = format!("{uri}/data.xml");
                match fetcher.get(&data_url).await {
                    Ok(response) => match response.text() {
                        Ok(text) if text.contains("<Body") || text.contains("<body") => {
                            if let Some(remaining) = state.remaining.as_mut() {
                                *remaining -= 1;
                            }
                            return Some((Ok((data_url, response.bytes)), (state, kind, fetcher)));
                        }
                        Ok(_) => {
                            debug!(url = %data_url, "document has no Body element, PDF-only");
                            continue;
                        }
                        Err(_) => continue,
                    },
                    Err(lex_fetch::FetchError::NotFound { .. }) => {
                        debug!(url = %data_url, "document not found, PDF-only marker");
                        continue;
                    }
                    Err(err) => return Some((Err(err.into()), (state, kind, fetcher))),
                }
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

            let url = match listing_url(kind, year, state.page) {
                Ok(url) => url,
                Err(err) => return Some((Err(err), (state, kind, fetcher))),
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
                    let uris = parse_listing_uris(&text);
                    info!(%year, page = state.page, count = uris.len(), "listed legislation page");
                    if uris.is_empty() {
                        state.current_year = None;
                        continue;
                    }
                    state.page += 1;
                    state.pending_uris = uris.into_iter();
                }
                Err(err) => return Some((Err(err.into()), (state, kind, fetcher))),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_url_includes_type_year_and_pagination() {
        let url = listing_url(LegislationType::Ukpga, 2024, 2).unwrap();
        assert!(url.as_str().starts_with("https://www.legislation.gov.uk/ukpga/2024/data.feed"));
        assert!(url.query_pairs().any(|(k, v)| k == "page" && v == "2"));
    }

    #[test]
    fn parse_listing_uris_ignores_malformed_xml() {
        assert!(parse_listing_uris("not xml").is_empty());
    }
}
