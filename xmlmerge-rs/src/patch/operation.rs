//! Decoding of diff elements into typed operations.

use super::{ADD_TAG, ATTRIBUTE_MARKER, REMOVE_TAG, REPLACE_TAG, SEL_ATTR, TYPE_ATTR};
use crate::error::PatchFormatError;
use crate::node::{Document, NodeId, NodeRef, XmlContent, XmlText};

/// A single decoded patch operation.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOperation<'d> {
    /// Add an attribute or a child element to the selected element.
    Add {
        selector: String,
        target: AddTarget<'d>,
    },
    /// Remove the selected node or attribute.
    Remove { selector: String },
    /// Replace the text value of the selected node or attribute.
    Replace { selector: String, value: String },
}

impl PatchOperation<'_> {
    /// The diff tag this operation was decoded from.
    pub fn tag(&self) -> &'static str {
        match self {
            PatchOperation::Add { .. } => ADD_TAG,
            PatchOperation::Remove { .. } => REMOVE_TAG,
            PatchOperation::Replace { .. } => REPLACE_TAG,
        }
    }

    pub fn selector(&self) -> &str {
        match self {
            PatchOperation::Add { selector, .. }
            | PatchOperation::Remove { selector }
            | PatchOperation::Replace { selector, .. } => selector,
        }
    }
}

/// What an `add` inserts.
#[derive(Debug, Clone, PartialEq)]
pub enum AddTarget<'d> {
    /// Set attribute `name` to `value` on the selected element.
    Attribute { name: String, value: String },
    /// Append a copy of this element as the last child of the selection.
    Element(Fragment<'d>),
}

/// An element subtree inside the diff document.
#[derive(Debug, Clone, Copy)]
pub struct Fragment<'d> {
    pub doc: &'d Document,
    pub node: NodeId,
}

impl PartialEq for Fragment<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.node == other.node
    }
}

/// Decodes the diff element `node` of `doc` into a [`PatchOperation`].
pub fn interpret(doc: &Document, node: NodeId) -> Result<PatchOperation<'_>, PatchFormatError> {
    let element = match doc.content(node) {
        XmlContent::Element(element) => element,
        XmlContent::Text(_) => return Err(PatchFormatError::UnknownOperation("#text".into())),
        XmlContent::Comment(_) => return Err(PatchFormatError::UnknownOperation("#comment".into())),
        XmlContent::ProcessingInstruction(pi) => {
            return Err(PatchFormatError::UnknownOperation(pi.target().to_string()))
        }
        XmlContent::Document => {
            return Err(PatchFormatError::UnknownOperation("#document".into()))
        }
    };
    let tag = element.qname();
    if ![ADD_TAG, REMOVE_TAG, REPLACE_TAG].contains(&tag) {
        return Err(PatchFormatError::UnknownOperation(tag.to_string()));
    }

    let selector = match element.attribute(SEL_ATTR) {
        Some(sel) if !sel.is_empty() => sel.to_string(),
        _ => return Err(PatchFormatError::MissingSelector(tag.to_string())),
    };

    match tag {
        ADD_TAG => {
            let target = match element.attribute(TYPE_ATTR) {
                Some(kind) if !kind.is_empty() => {
                    let name = kind
                        .strip_prefix(ATTRIBUTE_MARKER)
                        .filter(|name| !name.is_empty())
                        .ok_or_else(|| PatchFormatError::InvalidAttributeType(kind.to_string()))?;
                    let value = doc
                        .first_text_child(node)
                        .and_then(|text| doc.content(text).as_text())
                        .map(XmlText::text)
                        .unwrap_or_default();
                    AddTarget::Attribute {
                        name: name.to_string(),
                        value: value.to_string(),
                    }
                }
                _ => {
                    let child = doc
                        .children(node)
                        .iter()
                        .copied()
                        .find(|&c| doc.content(c).is_element())
                        .ok_or_else(|| PatchFormatError::MissingPayload(tag.to_string()))?;
                    AddTarget::Element(Fragment { doc, node: child })
                }
            };
            Ok(PatchOperation::Add { selector, target })
        }
        REMOVE_TAG => Ok(PatchOperation::Remove { selector }),
        _ => {
            let first = doc
                .children(node)
                .first()
                .copied()
                .ok_or_else(|| PatchFormatError::MissingPayload(tag.to_string()))?;
            Ok(PatchOperation::Replace {
                selector,
                value: doc.string_value(NodeRef::Node(first)),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    fn first_op(xml: &str) -> (Document, NodeId) {
        let doc = parse_str(xml).unwrap();
        let root = doc.document_element().unwrap();
        let op = doc.children(root)[0];
        (doc, op)
    }

    #[test]
    fn test_add_attribute() {
        let (doc, node) = first_op(r#"<d><add sel="/root" type="@id">42</add></d>"#);
        let op = interpret(&doc, node).unwrap();
        assert_eq!(op.tag(), "add");
        assert_eq!(op.selector(), "/root");
        assert_eq!(
            op,
            PatchOperation::Add {
                selector: "/root".to_string(),
                target: AddTarget::Attribute {
                    name: "id".to_string(),
                    value: "42".to_string(),
                },
            }
        );
    }

    #[test]
    fn test_add_attribute_without_text_is_empty() {
        let (doc, node) = first_op(r#"<d><add sel="/root" type="@flag"/></d>"#);
        match interpret(&doc, node).unwrap() {
            PatchOperation::Add {
                target: AddTarget::Attribute { name, value },
                ..
            } => {
                assert_eq!(name, "flag");
                assert_eq!(value, "");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_add_element_takes_first_element_child() {
        let (doc, node) = first_op(r#"<d><add sel="/root"><!--x--><new a="1"/><other/></add></d>"#);
        match interpret(&doc, node).unwrap() {
            PatchOperation::Add {
                target: AddTarget::Element(fragment),
                ..
            } => {
                assert_eq!(doc.element(fragment.node).unwrap().qname(), "new");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_add_errors() {
        let (doc, node) = first_op(r#"<d><add sel="/root">text only</add></d>"#);
        assert_eq!(
            interpret(&doc, node),
            Err(PatchFormatError::MissingPayload("add".to_string()))
        );

        let (doc, node) = first_op(r#"<d><add sel="/root" type="id">1</add></d>"#);
        assert_eq!(
            interpret(&doc, node),
            Err(PatchFormatError::InvalidAttributeType("id".to_string()))
        );

        let (doc, node) = first_op(r#"<d><add sel="/root" type="@">1</add></d>"#);
        assert_eq!(
            interpret(&doc, node),
            Err(PatchFormatError::InvalidAttributeType("@".to_string()))
        );
    }

    #[test]
    fn test_remove() {
        let (doc, node) = first_op(r#"<d><remove sel="/root/a"/></d>"#);
        assert_eq!(
            interpret(&doc, node).unwrap(),
            PatchOperation::Remove {
                selector: "/root/a".to_string()
            }
        );
    }

    #[test]
    fn test_replace_value() {
        let (doc, node) = first_op(r#"<d><replace sel="/root/a/text()">2</replace></d>"#);
        assert_eq!(
            interpret(&doc, node).unwrap(),
            PatchOperation::Replace {
                selector: "/root/a/text()".to_string(),
                value: "2".to_string(),
            }
        );

        let (doc, node) = first_op(r#"<d><replace sel="/root/a"><v>x<b>y</b></v></replace></d>"#);
        match interpret(&doc, node).unwrap() {
            PatchOperation::Replace { value, .. } => assert_eq!(value, "xy"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_whitespace_payloads_kept() {
        let (doc, node) = first_op(r#"<d><replace sel="/r/a"> </replace></d>"#);
        assert_eq!(
            interpret(&doc, node).unwrap(),
            PatchOperation::Replace {
                selector: "/r/a".to_string(),
                value: " ".to_string(),
            }
        );

        let (doc, node) = first_op(r#"<d><add sel="/r" type="@x"> </add></d>"#);
        match interpret(&doc, node).unwrap() {
            PatchOperation::Add {
                target: AddTarget::Attribute { name, value },
                ..
            } => {
                assert_eq!(name, "x");
                assert_eq!(value, " ");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_replace_without_payload() {
        let (doc, node) = first_op(r#"<d><replace sel="/root/a"/></d>"#);
        assert_eq!(
            interpret(&doc, node),
            Err(PatchFormatError::MissingPayload("replace".to_string()))
        );
    }

    #[test]
    fn test_unknown_and_missing_selector() {
        let (doc, node) = first_op(r#"<d><move sel="/a"/></d>"#);
        assert_eq!(
            interpret(&doc, node),
            Err(PatchFormatError::UnknownOperation("move".to_string()))
        );

        let (doc, node) = first_op(r#"<d><p:add xmlns:p="urn:p" sel="/a"/></d>"#);
        assert_eq!(
            interpret(&doc, node),
            Err(PatchFormatError::UnknownOperation("p:add".to_string()))
        );

        let (doc, node) = first_op(r#"<d><remove/></d>"#);
        assert_eq!(
            interpret(&doc, node),
            Err(PatchFormatError::MissingSelector("remove".to_string()))
        );

        let (doc, node) = first_op(r#"<d><replace sel="">x</replace></d>"#);
        assert_eq!(
            interpret(&doc, node),
            Err(PatchFormatError::MissingSelector("replace".to_string()))
        );
    }
}
