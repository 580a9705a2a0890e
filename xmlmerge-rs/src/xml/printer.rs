//! XML printer that outputs document trees.
//!
//! Elements whose children include text are written on one line so the text
//! is never padded with indentation; everything else is indented one level
//! per depth when pretty printing is on.

use std::io::Write;

use crate::node::{Document, NodeId, XmlContent, XmlElement};

/// Options for XML printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlPrinterOptions {
    /// Whether to pretty-print with indentation.
    pub pretty_print: bool,
    /// Spaces per indentation level.
    pub indent: usize,
}

impl Default for XmlPrinterOptions {
    fn default() -> Self {
        XmlPrinterOptions {
            pretty_print: true,
            indent: 2,
        }
    }
}

impl XmlPrinterOptions {
    /// Options for single-line output.
    pub fn compact() -> Self {
        XmlPrinterOptions {
            pretty_print: false,
            indent: 0,
        }
    }
}

/// XML printer that outputs document trees.
pub struct XmlPrinter<W: Write> {
    writer: W,
    options: XmlPrinterOptions,
}

impl<W: Write> XmlPrinter<W> {
    /// Creates a new XML printer with default (indented) options.
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, XmlPrinterOptions::default())
    }

    /// Creates a new XML printer with the given options.
    pub fn with_options(writer: W, options: XmlPrinterOptions) -> Self {
        XmlPrinter { writer, options }
    }

    /// Prints a whole document, starting with the XML declaration.
    pub fn print(&mut self, doc: &Document) -> std::io::Result<()> {
        write!(self.writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        self.newline()?;
        for &child in doc.children(doc.root()) {
            self.print_node(doc, child, 0, self.options.pretty_print)?;
        }
        if !self.options.pretty_print {
            writeln!(self.writer)?;
        }
        self.writer.flush()
    }

    /// Prints a single subtree without a declaration.
    pub fn print_fragment(&mut self, doc: &Document, node: NodeId) -> std::io::Result<()> {
        self.print_node(doc, node, 0, false)?;
        self.writer.flush()
    }

    fn print_node(
        &mut self,
        doc: &Document,
        node: NodeId,
        depth: usize,
        block: bool,
    ) -> std::io::Result<()> {
        if block {
            self.write_indent(depth)?;
        }
        match doc.content(node) {
            XmlContent::Document => {
                for &child in doc.children(node) {
                    self.print_node(doc, child, depth, block)?;
                }
                return Ok(());
            }
            XmlContent::Text(text) => {
                write!(self.writer, "{}", escape_text(text.text()))?;
            }
            XmlContent::Comment(comment) => {
                write!(self.writer, "<!--{}-->", comment.text())?;
            }
            XmlContent::ProcessingInstruction(pi) => {
                if pi.data().is_empty() {
                    write!(self.writer, "<?{}?>", pi.target())?;
                } else {
                    write!(self.writer, "<?{} {}?>", pi.target(), pi.data())?;
                }
            }
            XmlContent::Element(element) => {
                self.print_element(doc, node, element, depth, block)?;
            }
        }
        if block {
            self.newline()?;
        }
        Ok(())
    }

    fn print_element(
        &mut self,
        doc: &Document,
        node: NodeId,
        element: &XmlElement,
        depth: usize,
        block: bool,
    ) -> std::io::Result<()> {
        write!(self.writer, "<{}", element.qname())?;
        for attr in element.attributes() {
            write!(
                self.writer,
                " {}=\"{}\"",
                attr.qname(),
                escape_attr(attr.value())
            )?;
        }

        let children = doc.children(node);
        if children.is_empty() {
            return write!(self.writer, "/>");
        }
        write!(self.writer, ">")?;

        // Mixed content stays inline
        let child_block = block && !children.iter().any(|&c| doc.content(c).is_text());
        if child_block {
            self.newline()?;
        }
        for &child in children {
            self.print_node(doc, child, depth + 1, child_block)?;
        }
        if child_block {
            self.write_indent(depth)?;
        }
        write!(self.writer, "</{}>", element.qname())
    }

    fn newline(&mut self) -> std::io::Result<()> {
        if self.options.pretty_print {
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_indent(&mut self, depth: usize) -> std::io::Result<()> {
        if self.options.pretty_print && self.options.indent > 0 {
            write!(self.writer, "{:width$}", "", width = depth * self.options.indent)?;
        }
        Ok(())
    }
}

/// Escapes special XML characters in text content.
fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escapes special XML characters in attribute values.
fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\t' => result.push_str("&#9;"),
            '\n' => result.push_str("&#10;"),
            '\r' => result.push_str("&#13;"),
            _ => result.push(c),
        }
    }
    result
}

/// Serializes a document with the given options.
pub fn to_bytes(doc: &Document, options: &XmlPrinterOptions) -> std::io::Result<Vec<u8>> {
    let mut output = Vec::new();
    XmlPrinter::with_options(&mut output, options.clone()).print(doc)?;
    Ok(output)
}

/// Prints a document to a string on a single line.
pub fn print_to_string(doc: &Document) -> std::io::Result<String> {
    let output = to_bytes(doc, &XmlPrinterOptions::compact())?;
    Ok(String::from_utf8_lossy(&output).to_string())
}

/// Prints a document to a string with pretty printing.
pub fn print_to_string_pretty(doc: &Document) -> std::io::Result<String> {
    let output = to_bytes(doc, &XmlPrinterOptions::default())?;
    Ok(String::from_utf8_lossy(&output).to_string())
}
