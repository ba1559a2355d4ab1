//! Minimal generic XML tree, built once per document so the Markdown
//! renderer can look at structural context (parent/child relationships)
//! instead of reacting to a flat event stream.

use quick_xml::events::Event;
use quick_xml::Reader;

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone)]
pub enum Node {
    Text(String),
    Element(Element),
}

impl Element {
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn first_child_tag(&self, tag: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.tag == tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Depth-first search for the first descendant (or self) with `tag`.
    pub fn find_first(&self, tag: &str) -> Option<&Element> {
        if self.tag == tag {
            return Some(self);
        }
        for child in self.child_elements() {
            if let Some(found) = child.find_first(tag) {
                return Some(found);
            }
        }
        None
    }

    /// Depth-first collection of every descendant (or self) with `tag`.
    pub fn find_all<'a>(&'a self, tag: &str, out: &mut Vec<&'a Element>) {
        if self.tag == tag {
            out.push(self);
        }
        for child in self.child_elements() {
            child.find_all(tag, out);
        }
    }

    pub fn direct_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Concatenated text of this element and all descendants.
    pub fn all_text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => out.push_str(&e.all_text()),
            }
        }
        out
    }
}

pub fn parse_tree(bytes: &[u8]) -> Result<Element, quick_xml::Error> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = vec![Element {
        tag: "#root".to_string(),
        attrs: Vec::new(),
        children: Vec::new(),
    }];
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let tag = local_name(&e.name().as_ref().to_vec());
                let attrs = read_attrs(&e);
                stack.push(Element {
                    tag,
                    attrs,
                    children: Vec::new(),
                });
            }
            Event::Empty(e) => {
                let tag = local_name(&e.name().as_ref().to_vec());
                let attrs = read_attrs(&e);
                let el = Element {
                    tag,
                    attrs,
                    children: Vec::new(),
                };
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Element(el));
                }
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    let finished = stack.pop().unwrap();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Element(finished));
                    }
                }
            }
            Event::Text(t) => {
                let text = t.unescape().unwrap_or_default().into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(stack.into_iter().next().unwrap())
}

fn read_attrs(e: &quick_xml::events::BytesStart) -> Vec<(String, String)> {
    e.attributes()
        .filter_map(|a| a.ok())
        .map(|a| {
            let key = local_name(a.key.as_ref());
            let value = a.unescape_value().unwrap_or_default().into_owned();
            (key, value)
        })
        .collect()
}

fn local_name(qname: &[u8]) -> String {
    let s = String::from_utf8_lossy(qname);
    match s.rfind(':') {
        Some(idx) => s[idx + 1..].to_string(),
        None => s.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements() {
        let xml = b"<Body><P1><Pnumber>1</Pnumber><Text>hello</Text></P1></Body>";
        let root = parse_tree(xml).unwrap();
        let body = root.first_child_tag("Body").unwrap();
        let p1 = body.first_child_tag("P1").unwrap();
        assert!(p1.first_child_tag("Pnumber").is_some());
        assert_eq!(p1.first_child_tag("Text").unwrap().direct_text(), "hello");
    }
}
