//! Owned XML element tree.
//!
//! Requests are assembled as [`Element`] trees and serialized without an
//! XML declaration; responses are parsed back into trees and read through
//! the [`FromXml`] trait. Lookups use local names, so `ns2:retEnviNFe` and
//! `retEnviNFe` match alike.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::io::{Cursor, Write};

use super::error::EdocError;

/// A typed view over a response element.
///
/// Implementations never fail: fields the element does not carry are left
/// `None`. Only the tree parse itself can reject a response.
pub trait FromXml: Sized {
    /// Local name of the element this type reads (`retConsStatServ`...).
    const ROOT: &'static str;

    fn from_element(element: &Element) -> Self;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

fn xml_io(e: std::io::Error) -> EdocError {
    EdocError::Xml(format!("XML write error: {e}"))
}

fn xml_read(e: impl std::fmt::Display) -> EdocError {
    EdocError::Xml(e.to_string())
}

fn local(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    // ---- Building ----

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Append `<name>text</name>`.
    pub fn text_child(self, name: &str, text: impl Into<String>) -> Self {
        self.child(Element::new(name).text(text))
    }

    /// Append `<name>text</name>` only when `text` is present.
    pub fn opt_child(self, name: &str, text: Option<impl Into<String>>) -> Self {
        match text {
            Some(t) => self.text_child(name, t),
            None => self,
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Drop every direct child element with local name `name`.
    pub fn remove(&mut self, name: &str) {
        self.children
            .retain(|n| !matches!(n, Node::Element(e) if e.local_name() == name));
    }

    /// Replace the direct text content, keeping child elements.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.retain(|n| matches!(n, Node::Element(_)));
        self.children.insert(0, Node::Text(text.into()));
    }

    /// Set the text of the direct child `name`, appending it when missing.
    pub fn set_child_text(&mut self, name: &str, text: impl Into<String>) {
        match self.find_mut(name) {
            Some(child) => child.set_text(text),
            None => self.push(Element::new(name).text(text)),
        }
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.local_name() == name)
    }

    /// Visit every descendant named `name`, depth first.
    pub fn for_each_descendant_mut(&mut self, name: &str, f: &mut impl FnMut(&mut Element)) {
        for child in self.elements_mut() {
            if child.local_name() == name {
                f(child);
            }
            child.for_each_descendant_mut(name, f);
        }
    }

    // ---- Reading ----

    /// Qualified name as it appeared in the document.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        local(&self.name)
    }

    /// Attribute value by local name; namespace declarations are skipped.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .filter(|(k, _)| k != "xmlns" && !k.starts_with("xmlns:"))
            .find(|(k, _)| local(k) == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn nodes(&self) -> &[Node] {
        &self.children
    }

    /// Child elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn has_element_children(&self) -> bool {
        self.elements().next().is_some()
    }

    /// First direct child with the given local name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.local_name() == name)
    }

    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.local_name() == name)
    }

    /// Follow a chain of child names.
    pub fn find_path(&self, path: &[&str]) -> Option<&Element> {
        path.iter().try_fold(self, |el, name| el.find(name))
    }

    /// First descendant (depth-first, self excluded) with the given local name.
    pub fn descendant(&self, name: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.local_name() == name {
                return Some(child);
            }
            if let Some(found) = child.descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated direct text content.
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Trimmed text of the element at `path`; empty text reads as absent.
    pub fn text_at(&self, path: &[&str]) -> Option<String> {
        let text = self.find_path(path)?.text_content();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Trimmed text of the direct child `name`.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.text_at(&[name])
    }

    // ---- Parsing ----

    /// Parse a document into its root element.
    ///
    /// Declarations, comments and processing instructions are dropped.
    /// Whitespace-only text between elements is discarded.
    pub fn parse(xml: &str) -> Result<Element, EdocError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event().map_err(xml_read)? {
                Event::Start(ref e) => stack.push(start_element(e)?),
                Event::Empty(ref e) => {
                    let el = start_element(e)?;
                    attach(&mut stack, &mut root, el);
                }
                Event::End(_) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| EdocError::Xml("unexpected closing tag".into()))?;
                    attach(&mut stack, &mut root, el);
                }
                Event::Text(ref e) => {
                    let text = e.unescape().map_err(xml_read)?;
                    if let Some(top) = stack.last_mut() {
                        top.children.push(Node::Text(text.into_owned()));
                    }
                }
                Event::CData(ref e) => {
                    if let Some(top) = stack.last_mut() {
                        let bytes: &[u8] = e;
                        let text = String::from_utf8_lossy(bytes).into_owned();
                        top.children.push(Node::Text(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(EdocError::Xml(format!(
                "unclosed element: {}",
                stack.last().map(|e| e.name.as_str()).unwrap_or_default()
            )));
        }
        root.ok_or_else(|| EdocError::Xml("document has no root element".into()))
    }

    // ---- Serializing ----

    /// Serialize without an XML declaration.
    pub fn to_xml(&self) -> Result<String, EdocError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        write_element(&mut writer, self)?;
        into_string(writer)
    }

    /// Serialize with `raw` spliced in verbatim after the existing children.
    ///
    /// Used to embed an already-signed document without re-serializing it,
    /// which would invalidate the signature.
    pub fn to_xml_wrapping(&self, raw: &str) -> Result<String, EdocError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Start(start_tag(self)))
            .map_err(xml_io)?;
        for node in &self.children {
            write_node(&mut writer, node)?;
        }
        writer
            .get_mut()
            .write_all(strip_declaration(raw).as_bytes())
            .map_err(xml_io)?;
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(xml_io)?;
        into_string(writer)
    }
}

/// Drop a leading `<?xml ...?>` declaration and surrounding whitespace.
pub fn strip_declaration(xml: &str) -> &str {
    let xml = xml.trim();
    if xml.starts_with("<?xml") {
        if let Some(end) = xml.find("?>") {
            return xml[end + 2..].trim_start();
        }
    }
    xml
}

/// Slice the first `<name ...>...</name>` fragment out of `xml` verbatim.
///
/// Only unprefixed tags are matched, which is how every fiscal schema
/// serializes its documents.
pub fn raw_element<'a>(xml: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{name}");
    let close = format!("</{name}>");
    let mut from = 0;
    let start = loop {
        let at = from + xml[from..].find(&open)?;
        match xml[at + open.len()..].chars().next() {
            Some(c) if c == '>' || c == '/' || c.is_whitespace() => break at,
            _ => from = at + open.len(),
        }
    };
    let rest = &xml[start..];
    if let Some(tag_end) = rest.find('>') {
        if rest[..tag_end].ends_with('/') {
            return Some(&rest[..=tag_end]);
        }
    }
    let end = rest.find(&close)?;
    Some(&rest[..end + close.len()])
}

fn start_element(e: &BytesStart<'_>) -> Result<Element, EdocError> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(xml_read)?
        .to_string();
    let mut el = Element::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(xml_read)?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(xml_read)?
            .to_string();
        let value = attr.unescape_value().map_err(xml_read)?.into_owned();
        el.attributes.push((key, value));
    }
    Ok(el)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(el)),
        // content after the first root is ignored
        None => {
            if root.is_none() {
                *root = Some(el);
            }
        }
    }
}

fn start_tag(el: &Element) -> BytesStart<'_> {
    let mut tag = BytesStart::new(el.name.as_str());
    for (k, v) in &el.attributes {
        tag.push_attribute((k.as_str(), v.as_str()));
    }
    tag
}

fn write_element(writer: &mut Writer<Cursor<Vec<u8>>>, el: &Element) -> Result<(), EdocError> {
    if el.children.is_empty() {
        return writer
            .write_event(Event::Empty(start_tag(el)))
            .map_err(xml_io);
    }
    writer
        .write_event(Event::Start(start_tag(el)))
        .map_err(xml_io)?;
    for node in &el.children {
        write_node(writer, node)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(el.name.as_str())))
        .map_err(xml_io)
}

fn write_node(writer: &mut Writer<Cursor<Vec<u8>>>, node: &Node) -> Result<(), EdocError> {
    match node {
        Node::Element(child) => write_element(writer, child),
        Node::Text(text) => writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io),
    }
}

fn into_string(writer: Writer<Cursor<Vec<u8>>>) -> Result<String, EdocError> {
    let buf = writer.into_inner().into_inner();
    String::from_utf8(buf).map_err(|e| EdocError::Xml(format!("XML UTF-8 error: {e}")))
}
