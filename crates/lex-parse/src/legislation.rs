//! Legislation + LegislationSection parsers from a `data.xml` CLML document
//!.

use chrono::{DateTime, NaiveDate, Utc};
use lex_core::error::ErrorCategory;
use lex_core::model::{Legislation, LegislationSection, LegislationType};
use lex_core::outcome::ParseOutcome;
use lex_core::sort_key::normalize_provision;

use crate::xmltree::{parse_tree, Element};

/// Parse the `Legislation` header record. `uri` is the canonical URI the
/// scraper used to fetch this document, and doubles as the record id.
pub fn parse_legislation(xml: &[u8], uri: &str) -> ParseOutcome<Legislation> {
    let root = match parse_tree(xml) {
        Ok(root) => root,
        Err(err) => {
            return ParseOutcome::fail(uri, ErrorCategory::ParseError, err.to_string());
        }
    };

    let Some((kind, year, number)) = parse_uri_parts(uri) else {
        return ParseOutcome::fail(
            uri,
            ErrorCategory::ValidationError,
            "could not derive type/year/number from uri",
        );
    };

    let metadata = root.find_first("Metadata");

    let title = metadata
        .and_then(|m| m.find_first("Title"))
        .map(|e| e.direct_text())
        .unwrap_or_default();

    if title.is_empty() {
        return ParseOutcome::fail(uri, ErrorCategory::ValidationError, "missing title");
    }

    let description = metadata
        .and_then(|m| m.find_first("Description"))
        .map(|e| e.direct_text())
        .filter(|s| !s.is_empty());

    let enactment_date = metadata
        .and_then(|m| m.find_first("EnactmentDate"))
        .and_then(|e| e.attr("Date"))
        .and_then(parse_date);

    let modified_date = metadata
        .and_then(|m| m.find_first("ModifiedDate"))
        .and_then(|e| e.attr("Date"))
        .and_then(parse_date)
        .or(enactment_date);

    let status = metadata
        .and_then(|m| m.find_first("DocumentStatus"))
        .and_then(|e| e.attr("Value"))
        .unwrap_or("final")
        .to_string();

    let mut extent = Vec::new();
    if let Some(metadata) = metadata {
        let mut extents = Vec::new();
        metadata.find_all("Extent", &mut extents);
        for e in extents {
            if let Some(code) = e.attr("Code") {
                extent.push(code.to_string());
            }
        }
    }

    let mut provisions = Vec::new();
    root.find_all("P1", &mut provisions);
    let number_of_provisions = provisions.len() as i32;

    ParseOutcome::ok(Legislation {
        id: uri.to_string(),
        r#type: kind,
        year,
        number,
        title,
        description,
        enactment_date,
        modified_date,
        status,
        extent,
        number_of_provisions,
        created_at: Utc::now(),
    })
}

/// Parse every top-level numbered provision (`P1`) into a `LegislationSection`.
pub fn parse_sections(xml: &[u8], uri: &str) -> Vec<ParseOutcome<LegislationSection>> {
    let root = match parse_tree(xml) {
        Ok(root) => root,
        Err(err) => {
            return vec![ParseOutcome::fail(uri, ErrorCategory::ParseError, err.to_string())];
        }
    };

    let Some((kind, year, number)) = parse_uri_parts(uri) else {
        return vec![ParseOutcome::fail(
            uri,
            ErrorCategory::ValidationError,
            "could not derive type/year/number from uri",
        )];
    };

    let mut provisions = Vec::new();
    root.find_all("P1", &mut provisions);

    provisions
        .into_iter()
        .enumerate()
        .map(|(idx, p1)| build_section(p1, uri, kind, year, number, idx as i32))
        .collect()
}

fn build_section(
    p1: &Element,
    legislation_uri: &str,
    legislation_type: LegislationType,
    legislation_year: i32,
    legislation_number: i32,
    order: i32,
) -> ParseOutcome<LegislationSection> {
    let provision_number = p1
        .attr("Number")
        .map(|s| s.to_string())
        .or_else(|| p1.first_child_tag("Pnumber").map(|e| e.direct_text()))
        .unwrap_or_default();

    let provision_number = if provision_number.is_empty() {
        (order + 1).to_string()
    } else {
        provision_number
    };

    let title = p1
        .first_child_tag("Title")
        .or_else(|| p1.find_first("P1group").and_then(|g| g.first_child_tag("Title")))
        .map(|e| e.direct_text())
        .filter(|s| !s.is_empty());

    let text = crate::xml_to_markdown::render(p1);
    let sort_key = normalize_provision(&provision_number);

    let id = format!("{legislation_uri}/section/{provision_number}");

    ParseOutcome::ok(LegislationSection {
        id,
        legislation_id: legislation_uri.to_string(),
        legislation_type,
        year: legislation_year,
        number: legislation_number,
        provision_type: "section".to_string(),
        title,
        text,
        extent: Vec::new(),
        order,
        sort_key,
        created_at: Utc::now(),
    })
}

/// Derive `(type, year, number)` from a canonical legislation URI of the form
/// `.../{type}/{year}/{number}`.
fn parse_uri_parts(uri: &str) -> Option<(LegislationType, i32, i32)> {
    let trimmed = uri.trim_end_matches('/');
    let parts: Vec<&str> = trimmed.rsplit('/').take(3).collect();
    if parts.len() < 3 {
        return None;
    }
    let number: i32 = parts[0].parse().ok()?;
    let year: i32 = parts[1].parse().ok()?;
    let kind = LegislationType::from_code(parts[2])?;
    Some((kind, year, number))
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap().and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<Legislation>
      <Metadata>
        <Title>Example Act 2020</Title>
        <EnactmentDate Date="2020-01-01"/>
        <ModifiedDate Date="2021-06-01"/>
        <DocumentStatus Value="revised"/>
        <Extent Code="E+W"/>
        <Extent Code="S"/>
      </Metadata>
      <Body>
        <P1 Number="1"><Pnumber>1</Pnumber><Title>Short title</Title>Some text.</P1>
        <P1 Number="2"><Pnumber>2</Pnumber>More text.</P1>
      </Body>
    </Legislation>"#;

    #[test]
    fn parses_legislation_header() {
        let outcome = parse_legislation(SAMPLE.as_bytes(), "http://www.legislation.gov.uk/ukpga/2020/1");
        match outcome {
            ParseOutcome::Ok(leg) => {
                assert_eq!(leg.title, "Example Act 2020");
                assert_eq!(leg.year, 2020);
                assert_eq!(leg.number, 1);
                assert_eq!(leg.r#type, LegislationType::Ukpga);
                assert_eq!(leg.extent, vec!["E+W", "S"]);
                assert_eq!(leg.number_of_provisions, 2);
            }
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[test]
    fn parses_sections_with_order_and_sort_key() {
        let outcomes = parse_sections(SAMPLE.as_bytes(), "http://www.legislation.gov.uk/ukpga/2020/1");
        assert_eq!(outcomes.len(), 2);
        match &outcomes[0] {
            ParseOutcome::Ok(first) => {
                assert_eq!(first.order, 0);
                assert_eq!(first.title.as_deref(), Some("Short title"));
            }
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[test]
    fn invalid_uri_fails_gracefully() {
        let outcome = parse_legislation(SAMPLE.as_bytes(), "not-a-uri");
        assert!(matches!(outcome, ParseOutcome::Fail { .. }));
    }
}
