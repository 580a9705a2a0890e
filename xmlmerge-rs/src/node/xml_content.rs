//! XML content types for tree nodes.
//!
//! This module provides `XmlContent`, which represents what a single node in
//! the document arena holds: the document itself, an element (tag with
//! attributes), text, a comment or a processing instruction.

use super::namespace::{is_xmlns_attr, split_qname};

/// Represents the content of an XML node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlContent {
    /// The document node that owns the document element.
    Document,
    /// An XML element with a qualified name and attributes.
    Element(XmlElement),
    /// XML text content (CDATA sections are folded into text).
    Text(XmlText),
    /// XML comment.
    Comment(XmlComment),
    /// XML processing instruction.
    ProcessingInstruction(XmlProcessingInstruction),
}

impl XmlContent {
    /// Returns true if this is the document node.
    pub fn is_document(&self) -> bool {
        matches!(self, XmlContent::Document)
    }

    /// Returns true if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self, XmlContent::Element(_))
    }

    /// Returns true if this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self, XmlContent::Text(_))
    }

    /// Returns true if this is a comment node.
    pub fn is_comment(&self) -> bool {
        matches!(self, XmlContent::Comment(_))
    }

    /// Returns a reference to the element, if this is an element node.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlContent::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns a mutable reference to the element, if this is an element node.
    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlContent::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns a reference to the text, if this is a text node.
    pub fn as_text(&self) -> Option<&XmlText> {
        match self {
            XmlContent::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Returns a mutable reference to the text, if this is a text node.
    pub fn as_text_mut(&mut self) -> Option<&mut XmlText> {
        match self {
            XmlContent::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// A single attribute, including namespace declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    name: String,
    value: String,
}

impl XmlAttribute {
    /// Creates a new attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        XmlAttribute {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the qualified attribute name.
    pub fn qname(&self) -> &str {
        &self.name
    }

    /// Returns the attribute value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Sets the attribute value.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Returns the prefix of the attribute name, if any.
    pub fn prefix(&self) -> Option<&str> {
        split_qname(&self.name).0
    }

    /// Returns the local part of the attribute name.
    pub fn local_name(&self) -> &str {
        split_qname(&self.name).1
    }

    /// Returns true if this attribute declares a namespace.
    pub fn is_namespace_decl(&self) -> bool {
        is_xmlns_attr(&self.name)
    }
}

/// An XML element with a qualified name and attributes.
///
/// Attributes are kept in document order. Namespace declarations are stored
/// as ordinary attributes so they round-trip through the printer unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// The qualified name of the element (e.g., "div", "ns:element").
    name: String,
    attributes: Vec<XmlAttribute>,
}

impl XmlElement {
    /// Creates a new XML element with the given name and attributes.
    pub fn new(name: impl Into<String>, attributes: Vec<XmlAttribute>) -> Self {
        XmlElement {
            name: name.into(),
            attributes,
        }
    }

    /// Returns the qualified name.
    pub fn qname(&self) -> &str {
        &self.name
    }

    /// Returns the prefix of the element name, if any.
    pub fn prefix(&self) -> Option<&str> {
        split_qname(&self.name).0
    }

    /// Returns the local part of the element name.
    pub fn local_name(&self) -> &str {
        split_qname(&self.name).1
    }

    /// Returns all attributes in document order.
    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    /// Returns the attribute at `index`.
    pub fn attribute_at(&self, index: usize) -> Option<&XmlAttribute> {
        self.attributes.get(index)
    }

    /// Returns a mutable reference to the attribute at `index`.
    pub fn attribute_at_mut(&mut self, index: usize) -> Option<&mut XmlAttribute> {
        self.attributes.get_mut(index)
    }

    /// Looks up an attribute value by qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Sets an attribute, overwriting an existing one in place or appending it.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.set_value(value),
            None => self.attributes.push(XmlAttribute::new(name, value)),
        }
    }

    /// Removes the attribute at `index`, returning it.
    pub fn remove_attribute_at(&mut self, index: usize) -> Option<XmlAttribute> {
        if index < self.attributes.len() {
            Some(self.attributes.remove(index))
        } else {
            None
        }
    }

    /// Removes an attribute by qualified name.
    pub fn remove_attribute(&mut self, name: &str) -> Option<XmlAttribute> {
        let index = self.attributes.iter().position(|a| a.name == name)?;
        self.remove_attribute_at(index)
    }

    /// Iterates over namespace declarations as `(prefix, uri)`, with an empty
    /// prefix for the default namespace.
    pub fn namespace_decls(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().filter_map(|a| {
            super::namespace::xmlns_prefix(&a.name).map(|prefix| (prefix, a.value.as_str()))
        })
    }
}

/// XML text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlText {
    text: String,
}

impl XmlText {
    /// Creates a new text node.
    pub fn new(text: impl Into<String>) -> Self {
        XmlText { text: text.into() }
    }

    /// Returns the text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Overwrites the text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

/// XML comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlComment {
    text: String,
}

impl XmlComment {
    /// Creates a new comment.
    pub fn new(text: impl Into<String>) -> Self {
        XmlComment { text: text.into() }
    }

    /// Returns the comment text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Overwrites the comment text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

/// XML processing instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlProcessingInstruction {
    target: String,
    data: String,
}

impl XmlProcessingInstruction {
    /// Creates a new processing instruction.
    pub fn new(target: impl Into<String>, data: impl Into<String>) -> Self {
        XmlProcessingInstruction {
            target: target.into(),
            data: data.into(),
        }
    }

    /// Returns the PI target.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the PI data.
    pub fn data(&self) -> &str {
        &self.data
    }
}
