//! XML for OCPP-S envelopes
//!
//! Requests are written from the same JSON payloads the OCPP-J channel sends.
//! Responses are read with `quick-xml` into a small element tree with
//! namespace prefixes stripped, then folded back into a `Value` of strings
//! for the shared response parser.

use std::borrow::Cow;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};
use thiserror::Error;

/// Deepest element nesting accepted from a station. SOAP replies stay
/// well under ten levels.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Malformed(#[from] quick_xml::Error),
    #[error("nesting deeper than {} elements", MAX_DEPTH)]
    TooDeep,
    #[error("element <{0}> is not closed")]
    Unclosed(String),
    #[error("closing tag without matching element")]
    UnexpectedEnd,
    #[error("document has no root element")]
    Empty,
}

/// One element of a parsed document. Attributes are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Local name, prefix removed.
    pub name: String,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    /// First descendant (or self) with the given local name, depth first.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Leaf elements become strings; repeated siblings become arrays.
    pub fn to_json(&self) -> Value {
        if self.children.is_empty() {
            return Value::String(self.text.trim().to_string());
        }
        let mut map = Map::new();
        for child in &self.children {
            let value = child.to_json();
            match map.get_mut(&child.name) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    map.insert(child.name.clone(), value);
                }
            }
        }
        Value::Object(map)
    }
}

pub fn escape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Serialize `value` as the content of `<name>`. Arrays repeat the element,
/// nulls are omitted.
pub fn write_element(out: &mut String, name: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                write_element(out, name, item);
            }
        }
        Value::Object(fields) => {
            out.push('<');
            out.push_str(name);
            out.push('>');
            for (key, field) in fields {
                write_element(out, key, field);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        Value::String(s) => push_leaf(out, name, &escape(s)),
        Value::Number(n) => push_leaf(out, name, &n.to_string()),
        Value::Bool(b) => push_leaf(out, name, if *b { "true" } else { "false" }),
    }
}

fn push_leaf(out: &mut String, name: &str, text: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
    out.push_str(text);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn local_name(qualified: &[u8]) -> String {
    String::from_utf8_lossy(qualified).into_owned()
}

fn leaf(name: String) -> XmlElement {
    XmlElement {
        name,
        children: Vec::new(),
        text: String::new(),
    }
}

/// Parse a document into its root element. Namespace prefixes are dropped,
/// end tags must match their start tags and entities (named or numeric) are
/// decoded.
pub fn parse(input: &str) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().check_end_names = true;

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    let mut attach = |stack: &mut Vec<XmlElement>, element: XmlElement| match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            root.get_or_insert(element);
        }
    };

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(XmlError::TooDeep);
                }
                stack.push(leaf(local_name(start.local_name().as_ref())));
            }
            Event::Empty(start) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(XmlError::TooDeep);
                }
                let element = leaf(local_name(start.local_name().as_ref()));
                attach(&mut stack, element);
            }
            Event::End(_) => {
                let element = stack.pop().ok_or(XmlError::UnexpectedEnd)?;
                attach(&mut stack, element);
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }
    root.ok_or(XmlError::Empty)
}
