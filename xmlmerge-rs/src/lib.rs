//! XML Patch Merge
//!
//! Applies an XML diff document to a baseline XML document, following the
//! operation model of RFC 5261 (XML Patch Operations).
//!
//! # Overview
//!
//! A diff document is a root element holding an ordered list of operations.
//! Each operation addresses its target with an XPath selector:
//!
//! - `<add sel="…" type="@name">value</add>` sets an attribute
//! - `<add sel="…"><element/></add>` appends a child element
//! - `<remove sel="…"/>` removes an element, attribute or other node
//! - `<replace sel="…">value</replace>` replaces a text value
//!
//! Operations run strictly in document order against the current state of
//! the baseline tree. Selector prefixes resolve through the namespace
//! declarations found in the baseline.
//!
//! # Example
//!
//! ```
//! use xml_merge::{MergeOptions, XmlMerge, XmlPrinterOptions};
//!
//! let merge = XmlMerge::with_options(MergeOptions {
//!     printer: XmlPrinterOptions::compact(),
//! });
//! let output = merge
//!     .merge_str("<root/>", r#"<diff><add sel="/root" type="@id">42</add></diff>"#)
//!     .unwrap();
//! assert!(output.ends_with("<root id=\"42\"/>\n"));
//! ```

pub mod error;
pub mod merge;
pub mod node;
pub mod patch;
pub mod xml;
pub mod xpath;

// Re-export commonly used types
pub use error::{Error, PatchFormatError, Result};
pub use merge::{MergeOptions, MergeReport, XmlMerge};
pub use node::{
    Document, NamespaceContext, NodeId, NodeRef, XmlAttribute, XmlComment, XmlContent, XmlElement,
    XmlProcessingInstruction, XmlText,
};
pub use patch::{interpret, AddTarget, Applied, Fragment, PatchOperation, Patcher};
pub use xml::{parse_file, parse_read, parse_str, XmlParser, XmlPrinter, XmlPrinterOptions};
pub use xpath::{resolve, Selector};
