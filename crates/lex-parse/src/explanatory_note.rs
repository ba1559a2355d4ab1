//! Explanatory note parser. Notes are not scraped independently; they are
//! extracted from the same `data.xml` fetched for the legislation they
//! annotate, typically from an `ukm:DocumentClassification`
//! sibling document served alongside the Act.

use chrono::Utc;
use lex_core::error::ErrorCategory;
use lex_core::model::{ExplanatoryNote, NoteType};
use lex_core::outcome::ParseOutcome;

use crate::xmltree::{parse_tree, Element};

pub fn parse(xml: &[u8], legislation_id: &str) -> Vec<ParseOutcome<ExplanatoryNote>> {
    let root = match parse_tree(xml) {
        Ok(root) => root,
        Err(err) => {
            return vec![ParseOutcome::fail(
                legislation_id,
                ErrorCategory::ParseError,
                err.to_string(),
            )];
        }
    };

    let mut note_elements = Vec::new();
    root.find_all("ExplanatoryNote", &mut note_elements);

    note_elements
        .into_iter()
        .enumerate()
        .map(|(idx, el)| build_note(el, legislation_id, idx as i32))
        .collect()
}

fn build_note(el: &Element, legislation_id: &str, order: i32) -> ParseOutcome<ExplanatoryNote> {
    let Some(note_type_str) = el.attr("Type") else {
        return ParseOutcome::fail(
            legislation_id,
            ErrorCategory::ValidationError,
            "explanatory note missing Type attribute",
        );
    };

    let Some(note_type) = parse_note_type(note_type_str) else {
        return ParseOutcome::fail(
            legislation_id,
            ErrorCategory::ValidationError,
            format!("unrecognised note type: {note_type_str}"),
        );
    };

    let section_type = el.attr("SectionType").map(|s| s.to_string());
    let section_number = el.attr("SectionNumber").and_then(|s| s.parse().ok());

    let route: Vec<String> = el
        .first_child_tag("Route")
        .map(|r| {
            let mut parts = Vec::new();
            r.find_all("Crumb", &mut parts);
            parts.iter().map(|c| c.direct_text()).collect()
        })
        .unwrap_or_default();

    let text = crate::xml_to_markdown::render(el);

    ParseOutcome::ok(ExplanatoryNote {
        id: format!("{legislation_id}/explanatory-note/{order}"),
        legislation_id: legislation_id.to_string(),
        note_type,
        section_type: section_type.as_deref().and_then(parse_section_type),
        section_number,
        route,
        order,
        text,
        created_at: Utc::now(),
    })
}

fn parse_note_type(s: &str) -> Option<NoteType> {
    use NoteType::*;
    Some(match s {
        "overview" => Overview,
        "policy_background" => PolicyBackground,
        "legal_background" => LegalBackground,
        "extent" => Extent,
        "provisions" => Provisions,
        "commencement" => Commencement,
        _ => return None,
    })
}

fn parse_section_type(s: &str) -> Option<lex_core::model::SectionType> {
    use lex_core::model::SectionType::*;
    Some(match s {
        "section" => Section,
        "schedule" => Schedule,
        "part" => Part,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_note_with_route_and_order() {
        let xml = r#"<Document>
          <ExplanatoryNote Type="overview" SectionType="section" SectionNumber="1">
            <Route><Crumb>Part 1</Crumb><Crumb>Section 1</Crumb></Route>
            Some overview text.
          </ExplanatoryNote>
        </Document>"#;
        let outcomes = parse(xml.as_bytes(), "http://www.legislation.gov.uk/ukpga/2020/1");
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            ParseOutcome::Ok(note) => {
                assert_eq!(note.note_type, NoteType::Overview);
                assert_eq!(note.route, vec!["Part 1", "Section 1"]);
                assert_eq!(note.order, 0);
            }
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[test]
    fn missing_type_fails() {
        let xml = r#"<Document><ExplanatoryNote>no type</ExplanatoryNote></Document>"#;
        let outcomes = parse(xml.as_bytes(), "http://legislation/1");
        assert!(matches!(outcomes[0], ParseOutcome::Fail { .. }));
    }
}
