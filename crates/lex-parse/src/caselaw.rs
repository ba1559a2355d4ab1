//! Caselaw + CaselawSection parser from a judgment XML document (Akoma
//! Ntoso-style, as served by The National Archives' Find Case Law service),
//! ported from `original_source/src/lex/caselaw/`.

use chrono::{NaiveDate, Utc};
use lex_core::error::ErrorCategory;
use lex_core::model::{Caselaw, CaselawSection, Court, Division};
use lex_core::outcome::ParseOutcome;

use crate::xmltree::{parse_tree, Element};

pub fn parse_caselaw(xml: &[u8], uri: &str) -> ParseOutcome<Caselaw> {
    let root = match parse_tree(xml) {
        Ok(root) => root,
        Err(err) => return ParseOutcome::fail(uri, ErrorCategory::ParseError, err.to_string()),
    };

    let Some(cite_as) = root
        .find_first("neutralCitation")
        .map(|e| e.direct_text())
        .filter(|s| !s.is_empty())
    else {
        return ParseOutcome::fail(uri, ErrorCategory::ValidationError, "missing neutralCitation");
    };

    let Some((court, division, year, number)) = parse_cite_as(&cite_as) else {
        return ParseOutcome::fail(
            uri,
            ErrorCategory::ValidationError,
            format!("could not parse neutral citation: {cite_as}"),
        );
    };

    let name = root
        .find_first("FRBRname")
        .and_then(|e| e.attr("value"))
        .map(|s| s.to_string())
        .or_else(|| root.find_first("docTitle").map(|e| e.direct_text()))
        .unwrap_or_default();

    let date = root
        .find_first("FRBRdate")
        .and_then(|e| e.attr("date"))
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap().and_utc())
        .unwrap_or_else(Utc::now);

    let body = root.find_first("judgmentBody").unwrap_or(&root);
    let text = crate::xml_to_markdown::render(body);

    let mut refs = Vec::new();
    root.find_all("ref", &mut refs);
    let mut caselaw_references = Vec::new();
    let mut legislation_references = Vec::new();
    for r in refs {
        let Some(href) = r.attr("href") else { continue };
        match r.attr("uk:type") {
            Some("case") => caselaw_references.push(href.to_string()),
            Some("legislation") => legislation_references.push(href.to_string()),
            _ => {}
        }
    }

    ParseOutcome::ok(Caselaw {
        id: uri.to_string(),
        court,
        division,
        year,
        number,
        name,
        cite_as,
        date,
        text,
        caselaw_references,
        legislation_references,
        created_at: Utc::now(),
    })
}

pub fn parse_sections(xml: &[u8], uri: &str) -> Vec<ParseOutcome<CaselawSection>> {
    let root = match parse_tree(xml) {
        Ok(root) => root,
        Err(err) => return vec![ParseOutcome::fail(uri, ErrorCategory::ParseError, err.to_string())],
    };

    let Some(cite_as) = root.find_first("neutralCitation").map(|e| e.direct_text()) else {
        return vec![ParseOutcome::fail(
            uri,
            ErrorCategory::ValidationError,
            "missing neutralCitation",
        )];
    };

    let Some((court, division, year, number)) = parse_cite_as(&cite_as) else {
        return vec![ParseOutcome::fail(
            uri,
            ErrorCategory::ValidationError,
            "could not parse neutral citation",
        )];
    };

    let mut paragraphs = Vec::new();
    root.find_all("paragraph", &mut paragraphs);

    paragraphs
        .into_iter()
        .enumerate()
        .map(|(idx, p)| build_section(p, uri, &cite_as, court, division, year, number, idx as i32))
        .collect()
}

fn build_section(
    el: &Element,
    caselaw_id: &str,
    cite_as: &str,
    court: Court,
    division: Option<Division>,
    year: i32,
    number: i32,
    order: i32,
) -> ParseOutcome<CaselawSection> {
    let route = vec![format!("paragraph {}", order + 1)];
    let text = crate::xml_to_markdown::render(el);

    ParseOutcome::ok(CaselawSection {
        id: format!("{caselaw_id}/paragraph/{}", order + 1),
        caselaw_id: caselaw_id.to_string(),
        court,
        division,
        year,
        number,
        cite_as: cite_as.to_string(),
        route,
        order,
        text,
        created_at: Utc::now(),
    })
}

/// Parse a neutral citation like `"[2020] EWCA Civ 1"` into
/// `(court, division, year, number)`.
fn parse_cite_as(cite_as: &str) -> Option<(Court, Option<Division>, i32, i32)> {
    let year_start = cite_as.find('[')?;
    let year_end = cite_as.find(']')?;
    let year: i32 = cite_as[year_start + 1..year_end].trim().parse().ok()?;

    let rest: Vec<&str> = cite_as[year_end + 1..].split_whitespace().collect();
    if rest.is_empty() {
        return None;
    }
    let court = Court::from_code(rest[0])?;
    let (division, number_str) = if rest.len() >= 3 {
        (Division::from_code(rest[1]), rest[2])
    } else if rest.len() == 2 {
        (None, rest[1])
    } else {
        return None;
    };
    let number: i32 = number_str.parse().ok()?;
    Some((court, division, year, number))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<Judgment>
      <neutralCitation>[2020] EWCA Civ 1</neutralCitation>
      <FRBRname value="Example v Another"/>
      <FRBRdate date="2020-03-15"/>
      <judgmentBody>
        <paragraph>First paragraph text.</paragraph>
        <paragraph>Second paragraph, <ref href="http://www.legislation.gov.uk/id/ukpga/2018/12" uk:type="legislation">the Act</ref>.</paragraph>
      </judgmentBody>
    </Judgment>"#;

    #[test]
    fn parses_caselaw_header_and_references() {
        let outcome = parse_caselaw(SAMPLE.as_bytes(), "http://caselaw/ewca/civ/2020/1");
        match outcome {
            ParseOutcome::Ok(cl) => {
                assert_eq!(cl.court, Court::Ewca);
                assert_eq!(cl.division, Some(Division::Civil));
                assert_eq!(cl.year, 2020);
                assert_eq!(cl.number, 1);
                assert_eq!(cl.name, "Example v Another");
                assert_eq!(
                    cl.legislation_references,
                    vec!["http://www.legislation.gov.uk/id/ukpga/2018/12"]
                );
            }
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[test]
    fn parses_sections_per_paragraph() {
        let outcomes = parse_sections(SAMPLE.as_bytes(), "http://caselaw/ewca/civ/2020/1");
        assert_eq!(outcomes.len(), 2);
        match &outcomes[0] {
            ParseOutcome::Ok(section) => assert_eq!(section.order, 0),
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[test]
    fn malformed_citation_fails_gracefully() {
        let xml = r#"<Judgment><neutralCitation>not a citation</neutralCitation></Judgment>"#;
        let outcome = parse_caselaw(xml.as_bytes(), "http://x");
        assert!(matches!(outcome, ParseOutcome::Fail { .. }));
    }
}
