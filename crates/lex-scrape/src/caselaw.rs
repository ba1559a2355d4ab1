use bytes::Bytes;
use futures::stream::{self, Stream};
use lex_core::model::Court;
use lex_fetch::Fetcher;
use tracing::{debug, info};
use url::Url;

use crate::error::ScrapeError;

const BASE_URL: &str = "https://caselaw.nationalarchives.gov.uk";

pub type ScrapedDocument = Result<(String, Bytes), ScrapeError>;

/// Builds the judgments-index query for one court over a year range.
///
/// The year range must be consecutive — a caller holding a non-consecutive
/// set of years (e.g. amendments-led mode re-scraping scattered stale
/// years) must split it into consecutive runs and call this once per run
///.
pub fn build_query(years: &[i32], court: Court) -> Result<Url, ScrapeError> {
    if years.is_empty() {
        return Err(ScrapeError::EmptyYearRange);
    }

    let mut sorted: Vec<i32> = years.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let consecutive = sorted.windows(2).all(|pair| pair[1] == pair[0] + 1);
    if !consecutive {
        return Err(ScrapeError::NonConsecutiveYears { years: sorted });
    }

    let from_year = sorted[0];
    let to_year = *sorted.last().unwrap();

    let mut url = Url::parse(&format!("{BASE_URL}/atom.xml"))?;
    url.query_pairs_mut()
        .append_pair("from_date", &format!("{from_year}-01-01"))
        .append_pair("to_date", &format!("{to_year}-12-31"))
        .append_pair("court", court.code())
        .append_pair("order", "-date");

    Ok(url)
}

fn parse_entries(xml: &str) -> (Vec<String>, Option<String>) {
    let root = match lex_parse::parse_tree(xml.as_bytes()) {
        Ok(root) => root,
        Err(_) => return (Vec::new(), None),
    };

    let mut entries = Vec::new();
    root.find_all("entry", &mut entries);
    let uris = entries
        .into_iter()
        .filter_map(|entry| entry.find_first("id").map(|id| id.direct_text().trim().to_string()))
        .filter(|uri| !uri.is_empty())
        .collect();

    let mut links = Vec::new();
    root.find_all("link", &mut links);
    let next = links
        .into_iter()
        .find(|link| link.attr("rel") == Some("next"))
        .and_then(|link| link.attr("href"))
        .map(str::to_string);

    (uris, next)
}

/// Streams each judgment's raw XML for the given courts across a
/// consecutive year range, following the listing's `next` link until
/// exhausted. One `court=<code>` query per requested court.
pub fn scrape(
    fetcher: &Fetcher,
    years: Vec<i32>,
    courts: Vec<Court>,
    limit: Option<usize>,
) -> impl Stream<Item = ScrapedDocument> + '_ {
    struct State {
        courts: std::vec::IntoIter<Court>,
        next_url: Option<Url>,
        pending_uris: std::vec::IntoIter<String>,
        remaining: Option<usize>,
        exhausted: bool,
    }

    let initial = State {
        courts: courts.into_iter(),
        next_url: None,
        pending_uris: Vec::new().into_iter(),
        remaining: limit,
        exhausted: false,
    };

    stream::unfold((initial, years, fetcher), move |(mut state, years, fetcher)| async move {
        loop {
            if state.exhausted || state.remaining == Some(0) {
                return None;
            }

            if let Some(uri) = state.pending_uris.next() {
                let data_url = format!("{uri}/data.xml");
                match fetcher.get(&data_url).await {
                    Ok(response) => {
                        if let Some(remaining) = state.remaining.as_mut() {
                            *remaining -= 1;
                        }
                        return Some((Ok((data_url, response.bytes)), (state, years, fetcher)));
                    }
                    Err(lex_fetch::FetchError::NotFound { .. }) => {
                        debug!(url = %data_url, "judgment document not found, skipping");
                        continue;
                    }
                    Err(err) => return Some((Err(err.into()), (state, years, fetcher))),
                }
            }

            let url = match state.next_url.take() {
                Some(url) => url,
                None => match state.courts.next() {
                    Some(court) => match build_query(&years, court) {
                        Ok(url) => url,
                        Err(err) => return Some((Err(err), (state, years, fetcher))),
                    },
                    None => {
                        state.exhausted = true;
                        continue;
                    }
                },
            };

            match fetcher.get(url.as_str()).await {
                Ok(response) => {
                    let text = match response.text() {
                        Ok(text) => text,
                        Err(_) => continue,
                    };
                    let (uris, next) = parse_entries(&text);
                    info!(count = uris.len(), has_next = next.is_some(), "listed judgments page");
                    state.next_url = next.and_then(|href| Url::parse(&href).ok());
                    if uris.is_empty() {
                        continue;
                    }
                    state.pending_uris = uris.into_iter();
                }
                Err(err) => return Some((Err(err.into()), (state, years, fetcher))),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_query_accepts_consecutive_years() {
        let url = build_query(&[2021, 2022, 2023], Court::Ewca).unwrap();
        assert!(url.query_pairs().any(|(k, v)| k == "from_date" && v == "2021-01-01"));
        assert!(url.query_pairs().any(|(k, v)| k == "to_date" && v == "2023-12-31"));
        assert!(url.query_pairs().any(|(k, v)| k == "court" && v == "EWCA"));
    }

    #[test]
    fn build_query_rejects_non_consecutive_years() {
        let err = build_query(&[2021, 2023], Court::Ewca).unwrap_err();
        assert!(matches!(err, ScrapeError::NonConsecutiveYears { .. }));
    }

    #[test]
    fn build_query_rejects_empty_years() {
        assert!(matches!(build_query(&[], Court::Ewca), Err(ScrapeError::EmptyYearRange)));
    }
}
