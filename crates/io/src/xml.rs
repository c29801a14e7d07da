//! Minimal owned XML tree over quick-xml.
//!
//! Element and attribute names are kept as qualified strings (`table:table-cell`).
//! Parts produced by this crate always bind the standard ODF prefixes, so
//! post-processing matches on the prefixed name directly.

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::XmlError;

#[derive(Clone, Debug, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    /// Attributes in document order, values unescaped
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), attributes: Vec::new(), children: Vec::new() }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Set or replace an attribute, keeping its position when replaced.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    /// Set an attribute only when absent. Returns whether it was added.
    pub fn set_attr_if_missing(&mut self, key: &str, value: impl Into<String>) -> bool {
        if self.attr(key).is_some() {
            return false;
        }
        self.attributes.push((key.to_string(), value.into()));
        true
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(idx).1)
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn insert(&mut self, index: usize, child: XmlElement) {
        let index = index.min(self.children.len());
        self.children.insert(index, XmlNode::Element(child));
    }

    /// Append text, merging with a trailing text node.
    pub fn push_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(&text);
        } else {
            self.children.push(XmlNode::Text(text));
        }
    }

    /// Replace all children with a single text node (or nothing when empty).
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.children.clear();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text));
        }
    }

    /// Concatenated direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(XmlNode::as_element_mut)
    }

    pub fn children_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        let name = name.to_owned();
        self.elements().filter(move |e| e.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.name == name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// First child element named `name` whose `key` attribute equals `value`.
    pub fn find_child_mut(&mut self, name: &str, key: &str, value: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.name == name && e.attr(key) == Some(value))
    }

    /// First child named `name`, appended when absent.
    pub fn ensure_child(&mut self, name: &str) -> &mut XmlElement {
        let found = self.children.iter().position(|n| n.as_element().is_some_and(|e| e.name == name));
        let idx = found.unwrap_or_else(|| {
            self.children.push(XmlNode::Element(XmlElement::new(name)));
            self.children.len() - 1
        });
        self.element_at(idx)
    }

    /// First child named `name` carrying `key="value"`, appended when
    /// absent. The flag is true when the child was created.
    pub fn ensure_child_with(&mut self, name: &str, key: &str, value: &str) -> (&mut XmlElement, bool) {
        let found = self
            .children
            .iter()
            .position(|n| n.as_element().is_some_and(|e| e.name == name && e.attr(key) == Some(value)));
        let created = found.is_none();
        let idx = found.unwrap_or_else(|| {
            self.children.push(XmlNode::Element(XmlElement::new(name).with_attr(key, value)));
            self.children.len() - 1
        });
        (self.element_at(idx), created)
    }

    fn element_at(&mut self, idx: usize) -> &mut XmlElement {
        match &mut self.children[idx] {
            XmlNode::Element(e) => e,
            XmlNode::Text(_) => unreachable!("index was selected for an element"),
        }
    }

    /// Drop child elements for which `keep` returns false. Text is kept.
    pub fn retain_elements<F>(&mut self, mut keep: F)
    where
        F: FnMut(&XmlElement) -> bool,
    {
        self.children.retain(|n| match n {
            XmlNode::Element(e) => keep(e),
            XmlNode::Text(_) => true,
        });
    }

    /// Depth-first pre-order visit of this element and every descendant.
    pub fn walk_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut XmlElement),
    {
        f(self);
        for child in self.elements_mut() {
            child.walk_mut(f);
        }
    }

    pub fn walk<F>(&self, f: &mut F)
    where
        F: FnMut(&XmlElement),
    {
        f(self);
        for child in self.elements() {
            child.walk(f);
        }
    }
}

/// Parse a document into its root element. Declarations, comments and
/// processing instructions are dropped.
pub fn parse(xml: &str) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| XmlError::Parse {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;
        match event {
            Event::Start(ref e) => stack.push(element_from(e)?),
            Event::Empty(ref e) => {
                let element = element_from(e)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(ref e) => {
                let raw = String::from_utf8_lossy(e.as_ref()).to_string();
                let text = unescape(&raw).map_err(|err| parse_error(&reader, err))?;
                append_text(&mut stack, &text);
            }
            Event::CData(ref e) => {
                let text = String::from_utf8_lossy(e.as_ref()).to_string();
                append_text(&mut stack, &text);
            }
            Event::GeneralRef(ref e) => {
                let resolved = match e.resolve_char_ref().map_err(|err| parse_error(&reader, err))? {
                    Some(ch) => ch.to_string(),
                    None => {
                        let name = String::from_utf8_lossy(e.as_ref()).to_string();
                        resolve_predefined_entity(&name)
                            .map(str::to_string)
                            .ok_or_else(|| parse_error(&reader, format!("unknown entity '&{name};'")))?
                    }
                };
                append_text(&mut stack, &resolved);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    root.ok_or(XmlError::NoRoot)
}

/// Serialize with a UTF-8 declaration and no indentation. Childless
/// elements are written self-closing.
pub fn write(root: &XmlElement) -> Result<Vec<u8>, XmlError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_error)?;
    write_element(&mut writer, root)?;
    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_error);
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e)?,
            XmlNode::Text(t) => writer.write_event(Event::Text(BytesText::new(t))).map_err(write_error)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(write_error)
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()).to_string());
    for attr in start.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let raw = String::from_utf8_lossy(&attr.value).to_string();
        let value = unescape(&raw).map_err(|e| XmlError::Parse { position: 0, message: e.to_string() })?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn append_text(stack: &mut [XmlElement], text: &str) {
    // text outside the root element is insignificant
    if let Some(parent) = stack.last_mut() {
        if !text.is_empty() {
            parent.push_text(text);
        }
    }
}

fn parse_error<E: std::fmt::Display>(reader: &Reader<&[u8]>, err: E) -> XmlError {
    XmlError::Parse { position: reader.buffer_position() as u64, message: err.to_string() }
}

fn write_error<E: std::fmt::Display>(err: E) -> XmlError {
    XmlError::Write(err.to_string())
}
