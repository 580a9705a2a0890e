//! XML parser that builds document trees.
//!
//! This parser uses quick-xml's streaming API. Text is kept exactly as
//! written, with adjacent text, CDATA and entity references merged into one
//! text node. Whitespace-only text is dropped only from elements whose other
//! children are all markup, so indentation does not survive as content while
//! mixed content and whitespace-only values stay intact.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::node::{
    Document, NodeId, XmlAttribute, XmlComment, XmlContent, XmlElement,
    XmlProcessingInstruction, XmlText,
};

/// XML parser that builds document trees.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlParser;

impl XmlParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        XmlParser
    }

    /// Parses XML from a string.
    pub fn parse_str(&self, xml: &str) -> Result<Document> {
        let mut reader = Reader::from_str(xml);
        self.parse_reader(&mut reader)
    }

    /// Parses XML from a file.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        let file = File::open(path)?;
        self.parse_read(file)
    }

    /// Parses XML from any byte stream.
    pub fn parse_read<R: Read>(&self, input: R) -> Result<Document> {
        let mut reader = Reader::from_reader(BufReader::new(input));
        self.parse_reader(&mut reader)
    }

    /// Parses XML from a quick-xml Reader.
    fn parse_reader<R: BufRead>(&self, reader: &mut Reader<R>) -> Result<Document> {
        // Whitespace is handled in flush_text
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        let mut doc = Document::new();
        let mut node_stack: Vec<NodeId> = vec![doc.root()];
        let mut current_text: Option<String> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    flush_text(&mut doc, &node_stack, &mut current_text)?;
                    let element = self.parse_element(e, reader)?;
                    let parent = current_parent(&node_stack);
                    let node = append_element(&mut doc, parent, element)?;
                    node_stack.push(node);
                }
                Ok(Event::End(_)) => {
                    flush_text(&mut doc, &node_stack, &mut current_text)?;
                    if let Some(element) = node_stack.pop() {
                        drop_indentation(&mut doc, element);
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    // Self-closing tag - handle like Start + End
                    flush_text(&mut doc, &node_stack, &mut current_text)?;
                    let element = self.parse_element(e, reader)?;
                    let parent = current_parent(&node_stack);
                    append_element(&mut doc, parent, element)?;
                }
                Ok(Event::Text(e)) => {
                    let raw =
                        std::str::from_utf8(e.as_ref()).map_err(|e| Error::Parse(e.to_string()))?;
                    let text = unescape(raw).map_err(|e| Error::Parse(e.to_string()))?;
                    push_text(&mut current_text, &text);
                }
                Ok(Event::CData(ref e)) => {
                    let text = String::from_utf8_lossy(e.as_ref());
                    push_text(&mut current_text, &text);
                }
                Ok(Event::GeneralRef(ref e)) => {
                    let resolved = match e
                        .resolve_char_ref()
                        .map_err(|e| Error::Parse(e.to_string()))?
                    {
                        Some(ch) => ch.to_string(),
                        None => {
                            let name = e.decode().map_err(|e| Error::Parse(e.to_string()))?;
                            resolve_predefined_entity(&name)
                                .ok_or_else(|| {
                                    Error::Parse(format!("Unknown entity reference &{};", name))
                                })?
                                .to_string()
                        }
                    };
                    push_text(&mut current_text, &resolved);
                }
                Ok(Event::Comment(ref e)) => {
                    flush_text(&mut doc, &node_stack, &mut current_text)?;
                    let comment_text = String::from_utf8_lossy(e.as_ref()).to_string();
                    let comment = doc.create_node(XmlContent::Comment(XmlComment::new(comment_text)));
                    doc.append_child(current_parent(&node_stack), comment);
                }
                Ok(Event::PI(ref e)) => {
                    flush_text(&mut doc, &node_stack, &mut current_text)?;
                    let content = String::from_utf8_lossy(e.as_ref()).to_string();
                    let (target, data) = match content.split_once(char::is_whitespace) {
                        Some((target, data)) => (target.to_string(), data.trim_start().to_string()),
                        None => (content, String::new()),
                    };
                    let pi = doc.create_node(XmlContent::ProcessingInstruction(
                        XmlProcessingInstruction::new(target, data),
                    ));
                    doc.append_child(current_parent(&node_stack), pi);
                }
                Ok(Event::Decl(_)) | Ok(Event::DocType(_)) => {
                    // The printer writes its own declaration; DTDs are not kept
                }
                Ok(Event::Eof) => {
                    flush_text(&mut doc, &node_stack, &mut current_text)?;
                    break;
                }
                Err(e) => return Err(Error::Parse(format!("XML parse error: {}", e))),
            }
            buf.clear();
        }

        if node_stack.len() > 1 {
            return Err(Error::Parse("Unexpected end of document".to_string()));
        }
        if doc.document_element().is_none() {
            return Err(Error::Parse("Document has no root element".to_string()));
        }
        Ok(doc)
    }

    /// Parses an element's name and attributes.
    fn parse_element<R: BufRead>(&self, e: &BytesStart, reader: &Reader<R>) -> Result<XmlElement> {
        let name = reader
            .decoder()
            .decode(e.name().as_ref())
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();

        let mut attributes = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|e| Error::Parse(format!("Attribute error: {}", e)))?;
            let key = reader
                .decoder()
                .decode(attr.key.as_ref())
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            attributes.push(XmlAttribute::new(key, value));
        }

        Ok(XmlElement::new(name, attributes))
    }
}

fn current_parent(node_stack: &[NodeId]) -> NodeId {
    node_stack.last().copied().unwrap_or(0)
}

/// Adds an element under `parent`, rejecting a second top-level element.
fn append_element(doc: &mut Document, parent: NodeId, element: XmlElement) -> Result<NodeId> {
    if parent == doc.root() && doc.document_element().is_some() {
        return Err(Error::Parse(format!(
            "Multiple root elements: unexpected <{}>",
            element.qname()
        )));
    }
    let node = doc.create_node(XmlContent::Element(element));
    doc.append_child(parent, node);
    Ok(node)
}

fn push_text(current_text: &mut Option<String>, text: &str) {
    match current_text {
        Some(existing) => existing.push_str(text),
        None => *current_text = Some(text.to_string()),
    }
}

fn is_xml_whitespace(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

/// Emits accumulated text as a node under the current element.
///
/// Whitespace outside the root element is ignored; any other text there is
/// an error.
fn flush_text(
    doc: &mut Document,
    node_stack: &[NodeId],
    current_text: &mut Option<String>,
) -> Result<()> {
    let Some(text) = current_text.take() else {
        return Ok(());
    };
    let parent = current_parent(node_stack);
    if parent == doc.root() {
        if is_xml_whitespace(&text) {
            return Ok(());
        }
        return Err(Error::Parse(format!(
            "Text outside the root element: {:?}",
            text.trim()
        )));
    }
    let node = doc.create_node(XmlContent::Text(XmlText::new(text)));
    doc.append_child(parent, node);
    Ok(())
}

/// Removes whitespace-only text from a closed element that holds markup and
/// no other text.
fn drop_indentation(doc: &mut Document, element: NodeId) {
    let children = doc.children(element);
    let mut has_markup = false;
    for &child in children {
        match doc.content(child).as_text() {
            Some(text) if !is_xml_whitespace(text.text()) => return,
            Some(_) => {}
            None => has_markup = true,
        }
    }
    if !has_markup {
        return;
    }
    let blanks: Vec<NodeId> = children
        .iter()
        .copied()
        .filter(|&child| doc.content(child).is_text())
        .collect();
    for blank in blanks {
        doc.remove_child(element, blank);
    }
}

/// Parses XML from a file.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    XmlParser::new().parse_file(path)
}

/// Parses XML from a string.
pub fn parse_str(xml: &str) -> Result<Document> {
    XmlParser::new().parse_str(xml)
}

/// Parses XML from a byte stream.
pub fn parse_read<R: Read>(input: R) -> Result<Document> {
    XmlParser::new().parse_read(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(doc: &Document, id: NodeId) -> &str {
        doc.content(id).as_text().expect("Expected text node").text()
    }

    #[test]
    fn test_parse_simple_xml() {
        let doc = parse_str(r#"<root><child>text</child></root>"#).unwrap();

        assert_eq!(doc.children(doc.root()).len(), 1);
        let root = doc.document_element().unwrap();
        assert_eq!(doc.element(root).unwrap().qname(), "root");

        let child = doc.children(root)[0];
        assert_eq!(doc.element(child).unwrap().qname(), "child");
        assert_eq!(text_of(&doc, doc.children(child)[0]), "text");
    }

    #[test]
    fn test_parse_with_attributes() {
        let doc = parse_str(r#"<root id="foo" class="bar">content</root>"#).unwrap();
        let root = doc.document_element().unwrap();
        let e = doc.element(root).unwrap();

        assert_eq!(e.attribute("id"), Some("foo"));
        assert_eq!(e.attribute("class"), Some("bar"));
        assert_eq!(e.attributes()[0].qname(), "id");
    }

    #[test]
    fn test_whitespace_only_text_dropped() {
        let doc = parse_str("<root>\n  <a> keep  me </a>\n</root>").unwrap();
        let root = doc.document_element().unwrap();

        assert_eq!(doc.children(root).len(), 1);
        let a = doc.children(root)[0];
        assert_eq!(text_of(&doc, doc.children(a)[0]), " keep  me ");
    }

    #[test]
    fn test_entities_and_cdata_merge() {
        let doc = parse_str(r#"<root>a &amp; b &#65;<![CDATA[<c>]]></root>"#).unwrap();
        let root = doc.document_element().unwrap();

        assert_eq!(doc.children(root).len(), 1);
        assert_eq!(text_of(&doc, doc.children(root)[0]), "a & b A<c>");
    }

    #[test]
    fn test_attribute_entities() {
        let doc = parse_str(r#"<root attr="&lt;&quot;x&quot;&gt;"/>"#).unwrap();
        let root = doc.document_element().unwrap();
        assert_eq!(doc.element(root).unwrap().attribute("attr"), Some("<\"x\">"));
    }

    #[test]
    fn test_comments_and_pis() {
        let doc = parse_str("<?xml version=\"1.0\"?><!-- top --><root><?app do it?><!--in--></root>")
            .unwrap();
        let top = doc.children(doc.root());
        assert_eq!(top.len(), 2);
        assert!(doc.content(top[0]).is_comment());

        let root = doc.document_element().unwrap();
        match doc.content(doc.children(root)[0]) {
            XmlContent::ProcessingInstruction(pi) => {
                assert_eq!(pi.target(), "app");
                assert_eq!(pi.data(), "do it");
            }
            other => panic!("Expected processing instruction, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_elements() {
        let doc = parse_str(r#"<a><b><c>deep</c></b></a>"#).unwrap();
        let a = doc.document_element().unwrap();
        let b = doc.children(a)[0];
        let c = doc.children(b)[0];
        assert_eq!(text_of(&doc, doc.children(c)[0]), "deep");
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(parse_str("<root><a></root>"), Err(Error::Parse(_))));
        assert!(matches!(parse_str("<root>"), Err(Error::Parse(_))));
        assert!(matches!(parse_str(""), Err(Error::Parse(_))));
        assert!(matches!(parse_str("<a/><b/>"), Err(Error::Parse(_))));
        assert!(matches!(parse_str("<a>&bogus;</a>"), Err(Error::Parse(_))));
        assert!(matches!(parse_str("<r/>garbage"), Err(Error::Parse(_))));
        assert!(matches!(parse_str("junk<r/>"), Err(Error::Parse(_))));
        assert!(matches!(parse_str("<r/><!--c-->x"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_whitespace_around_root_ignored() {
        let doc = parse_str("\n  <!-- c -->\n<r/>\n\t").unwrap();
        assert_eq!(doc.children(doc.root()).len(), 2);
    }

    #[test]
    fn test_mixed_content_whitespace_kept() {
        let doc = parse_str("<p>hello <b>x</b> <i>y</i></p>").unwrap();
        let p = doc.document_element().unwrap();
        let children = doc.children(p);

        assert_eq!(children.len(), 4);
        assert_eq!(text_of(&doc, children[0]), "hello ");
        assert_eq!(text_of(&doc, children[2]), " ");
        assert_eq!(doc.element(children[3]).unwrap().qname(), "i");
    }

    #[test]
    fn test_whitespace_only_value_kept() {
        let doc = parse_str("<r><a> </a><b>\n\t</b></r>").unwrap();
        let r = doc.document_element().unwrap();
        let a = doc.children(r)[0];
        let b = doc.children(r)[1];

        assert_eq!(doc.children(r).len(), 2);
        assert_eq!(text_of(&doc, doc.children(a)[0]), " ");
        assert_eq!(text_of(&doc, doc.children(b)[0]), "\n\t");
    }

    #[test]
    fn test_parse_read() {
        let doc = parse_read("<root><a/></root>".as_bytes()).unwrap();
        let root = doc.document_element().unwrap();
        assert_eq!(doc.children(root).len(), 1);
    }
}
