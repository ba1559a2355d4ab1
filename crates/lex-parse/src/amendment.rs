//! Amendment parser: one HTML changes-table row per `Amendment`.

use chrono::Utc;
use lex_core::error::ErrorCategory;
use lex_core::model::Amendment;
use lex_core::outcome::ParseOutcome;
use scraper::{Html, Selector};

const BASE_URL: &str = "http://www.legislation.gov.uk";

/// Parse every row of the changes table in `html` into an `Amendment`.
/// A row that fails validation (e.g. an empty url) becomes a `Fail` outcome
/// rather than aborting the whole batch.
pub fn parse(html: &str, source_url: &str) -> Vec<ParseOutcome<Amendment>> {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("table tbody tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();
    let link_selector = Selector::parse("a").unwrap();

    let mut outcomes = Vec::new();

    for row in document.select(&row_selector) {
        let cells: Vec<_> = row.select(&cell_selector).collect();
        if cells.len() < 7 {
            continue;
        }

        let cell_text = |i: usize| cells[i].text().collect::<String>();
        let cell_href = |i: usize| -> Option<String> {
            cells[i]
                .select(&link_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|href| format!("{BASE_URL}{href}"))
        };

        let (changed_year, changed_number) = split_year_number(&cell_text(1));
        let (affecting_year, affecting_number) = split_year_number(&cell_text(5));
        let changed_url = cell_href(1).unwrap_or_default();
        let affecting_url = cell_href(5).unwrap_or_default();

        let id = match Amendment::build_id(&changed_url, &affecting_url) {
            Ok(id) => id,
            Err(err) => {
                outcomes.push(ParseOutcome::fail(
                    source_url,
                    ErrorCategory::ValidationError,
                    err.to_string(),
                ));
                continue;
            }
        };

        outcomes.push(ParseOutcome::ok(Amendment {
            id,
            changed_legislation: cell_text(0).trim().to_string(),
            changed_year: changed_year.unwrap_or(0),
            changed_number: changed_number.unwrap_or(0),
            changed_url,
            changed_provision: non_empty(cell_text(2)),
            changed_provision_url: cell_href(2),
            affecting_legislation: cell_text(4).trim().to_string(),
            affecting_year: affecting_year.unwrap_or(0),
            affecting_number: affecting_number.unwrap_or(0),
            affecting_url,
            affecting_provision: non_empty(cell_text(6)),
            affecting_provision_url: cell_href(6),
            type_of_effect: cell_text(3).trim().to_string(),
            ai_explanation: None,
            created_at: Utc::now(),
        }));
    }

    outcomes
}

fn split_year_number(text: &str) -> (Option<i32>, Option<i32>) {
    let mut parts = text.split('\u{a0}');
    let year = parts.next().and_then(|s| s.trim().parse().ok());
    let number = parts.next().and_then(|s| s.trim().parse().ok());
    (year, number)
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_row() {
        let html = r#"
        <table><tbody>
        <tr>
            <td>Health and Safety at Work Act 1974</td>
            <td><a href="/ukpga/1974/37">1974&nbsp;37</a></td>
            <td><a href="/ukpga/1974/37/section/1">s. 1</a></td>
            <td>amended</td>
            <td>Some Act 2020</td>
            <td><a href="/ukpga/2020/1">2020&nbsp;1</a></td>
            <td><a href="/ukpga/2020/1/section/5">s. 5</a></td>
        </tr>
        </tbody></table>
        "#;
        let outcomes = parse(html, "http://example/changes");
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            ParseOutcome::Ok(amendment) => {
                assert_eq!(amendment.changed_year, 1974);
                assert_eq!(amendment.changed_number, 37);
                assert_eq!(amendment.affecting_year, 2020);
                assert!(amendment.id.starts_with("changed-"));
            }
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[test]
    fn row_with_no_links_fails_validation() {
        let html = r#"
        <table><tbody>
        <tr><td>A</td><td>1974&nbsp;37</td><td></td><td>amended</td><td>B</td><td>2020&nbsp;1</td><td></td></tr>
        </tbody></table>
        "#;
        let outcomes = parse(html, "http://example/changes");
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], ParseOutcome::Fail { .. }));
    }

    #[test]
    fn empty_table_yields_no_rows() {
        let outcomes = parse("<html><body>no table here</body></html>", "http://example");
        assert!(outcomes.is_empty());
    }
}
