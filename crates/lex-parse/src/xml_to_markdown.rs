//! XML-to-Markdown renderer for legislation provisions.
//!
//! Pure function: no I/O, never aborts on a malformed fragment (a missing
//! child just renders as an empty string for that piece).

use crate::xmltree::{Element, Node};

/// Render the `Body` (or equivalent provision root) element of a legislation
/// XML document to Markdown.
pub fn render(root: &Element) -> String {
    let mut skip_next_pnumber = false;
    render_children(root, 0, &mut skip_next_pnumber, &[])
}

fn render_children(el: &Element, level: usize, skip_next_pnumber: &mut bool, exclude: &[&str]) -> String {
    let mut out = String::new();
    for node in &el.children {
        match node {
            Node::Text(t) => out.push_str(&normalize_quotes(t)),
            Node::Element(child) => {
                if exclude.contains(&child.tag.as_str()) {
                    continue;
                }
                out.push_str(&render_node(child, level, skip_next_pnumber));
            }
        }
    }
    out
}

fn render_node(el: &Element, level: usize, skip_next_pnumber: &mut bool) -> String {
    match el.tag.as_str() {
        "Part" => {
            let number = el.first_child_tag("Number").map(|e| e.direct_text()).unwrap_or_default();
            let title = el.first_child_tag("Title").map(|e| e.direct_text()).unwrap_or_default();
            let mut out = format!("## {number}\n## {title}\n");
            out.push_str(&render_children(el, level, skip_next_pnumber, &["Number", "Title"]));
            out
        }
        "P1group" => {
            let title = el.first_child_tag("Title").map(|e| e.direct_text());
            let pnumber_text = el.first_child_tag("Pnumber").map(|e| e.direct_text());
            match (title, pnumber_text) {
                (Some(title), Some(pnum)) if !pnum.contains("Article") => {
                    *skip_next_pnumber = true;
                    let mut out = format!("Section {pnum}) **{title}**\n");
                    out.push_str(&render_children(el, level, skip_next_pnumber, &["Title", "Pnumber"]));
                    out
                }
                _ => render_children(el, level, skip_next_pnumber, &[]),
            }
        }
        "Pblock" => {
            let title = el.first_child_tag("Title").map(|e| e.direct_text());
            let mut out = String::new();
            if let Some(title) = &title {
                out.push_str(&format!("*{title}*\n"));
            }
            let exclude: &[&str] = if title.is_some() { &["Title"] } else { &[] };
            out.push_str(&render_children(el, level, skip_next_pnumber, exclude));
            out
        }
        "BlockAmendment" => {
            let inner = render_children(el, level + 1, skip_next_pnumber, &[]);
            let indent = "\t".repeat(indent_depth(level) + 1);
            inner.replace('\n', &format!("\n{indent}"))
        }
        "Pnumber" => {
            let text = el.direct_text();
            if *skip_next_pnumber {
                *skip_next_pnumber = false;
                String::new()
            } else {
                let indent = "\t".repeat(indent_depth(level));
                format!("\n{indent}{text}) ")
            }
        }
        tag if numbered_paragraph_level(tag).is_some() => {
            let new_level = numbered_paragraph_level(tag).unwrap();
            render_children(el, new_level, skip_next_pnumber, &[])
        }
        _ => render_children(el, level, skip_next_pnumber, &[]),
    }
}

/// Indentation depth for a numbered-paragraph level: `max(0, level-2)` tabs.
fn indent_depth(level: usize) -> usize {
    level.saturating_sub(2)
}

/// `P1`..`Pn` elements become a nested level equal to their trailing digits.
fn numbered_paragraph_level(tag: &str) -> Option<usize> {
    if !tag.starts_with('P') {
        return None;
    }
    tag[1..].parse::<usize>().ok()
}

/// Strip the stray space a curly open/close quote is glued to, leaving the
/// quote glyph itself untouched: `"<sp>` -> `"`, `<sp>"` -> `"`.
fn normalize_quotes(text: &str) -> String {
    text.replace("\u{201C} ", "\u{201C}").replace(" \u{201D}", "\u{201D}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xmltree::parse_tree;

    fn render_xml(xml: &str) -> String {
        let tree = parse_tree(xml.as_bytes()).unwrap();
        let body = tree.first_child_tag("Body").unwrap_or(&tree);
        render(body)
    }

    #[test]
    fn pnumber_renders_with_indent() {
        let xml = "<Body><P1><Pnumber>1</Pnumber>Some text.</P1></Body>";
        let out = render_xml(xml);
        assert!(out.contains("1) "));
        assert!(out.contains("Some text."));
    }

    #[test]
    fn part_emits_two_headers() {
        let xml = "<Body><Part><Number>1</Number><Title>General</Title></Part></Body>";
        let out = render_xml(xml);
        assert_eq!(out, "## 1\n## General\n");
    }

    #[test]
    fn p1group_emits_section_header_and_suppresses_next_pnumber() {
        let xml = "<Body><P1group><Title>Interpretation</Title><Pnumber>1</Pnumber><P2><Pnumber>1</Pnumber>body text</P2></P1group></Body>";
        let out = render_xml(xml);
        assert!(out.starts_with("Section 1) **Interpretation**\n"));
        // the P2's Pnumber ("1") should have been suppressed, not rendered twice
        assert_eq!(out.matches("1)").count(), 1);
        assert!(out.contains("body text"));
    }

    #[test]
    fn p1group_with_article_pnumber_is_not_suppressed() {
        let xml = "<Body><P1group><Title>Scope</Title><Pnumber>Article 1</Pnumber><P2><Pnumber>2</Pnumber>body</P2></P1group></Body>";
        let out = render_xml(xml);
        assert!(!out.contains("Section Article 1"));
        assert!(out.contains("2) "));
    }

    #[test]
    fn pblock_with_title_emits_italic_heading() {
        let xml = "<Body><Pblock><Title>Definitions</Title>content here</Pblock></Body>";
        let out = render_xml(xml);
        assert!(out.starts_with("*Definitions*\n"));
        assert!(out.contains("content here"));
    }

    #[test]
    fn block_amendment_increases_indent() {
        let xml = "<Body><P3><BlockAmendment><P1><Pnumber>1</Pnumber>a</P1><P1><Pnumber>2</Pnumber>b</P1></BlockAmendment></P3></Body>";
        let out = render_xml(xml);
        // nested paragraph indentation includes at least one tab from BlockAmendment
        assert!(out.contains('\t'));
    }

    #[test]
    fn curly_quotes_normalised() {
        let xml = "<Body><P1>\u{201C} quoted \u{201D}</P1></Body>";
        let out = render_xml(xml);
        // the quote glyphs are kept, but the space they were glued to is
        // stripped so they hug the content instead of floating beside it
        assert!(out.contains("\u{201C}quoted\u{201D}"));
        assert!(!out.contains("\u{201C} "));
        assert!(!out.contains(" \u{201D}"));
    }

    #[test]
    fn malformed_fragment_does_not_panic() {
        let xml = "<Body><P1><Pnumber></Pnumber></P1></Body>";
        let _ = render_xml(xml);
    }
}
