//! Application of patch operations to a document.

use tracing::{debug, warn};

use super::operation::{AddTarget, Fragment, PatchOperation};
use super::{ADD_TAG, REMOVE_TAG, REPLACE_TAG};
use crate::error::{Error, Result};
use crate::node::namespace::{lookup_namespace_uri, undeclared_prefixes};
use crate::node::{Document, NamespaceContext, NodeId, NodeRef, XmlContent, XmlText};
use crate::xpath::Selector;

/// Outcome of applying one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The document was modified.
    Changed,
    /// The operation had nothing to act on.
    Skipped,
}

/// Applies operations to a document, resolving selectors against a fixed
/// namespace context.
pub struct Patcher<'n> {
    namespaces: &'n NamespaceContext,
}

impl<'n> Patcher<'n> {
    pub fn new(namespaces: &'n NamespaceContext) -> Self {
        Patcher { namespaces }
    }

    /// Applies `op` to `doc`.
    ///
    /// The selector is compiled and resolved against the current state of
    /// the document, so earlier operations are visible to later ones.
    pub fn apply(&self, doc: &mut Document, op: &PatchOperation) -> Result<Applied> {
        let selector = Selector::compile(op.selector())?;
        let target = selector.evaluate(doc, self.namespaces)?;
        let applied = match op {
            PatchOperation::Add { target: what, .. } => {
                let node = target.ok_or_else(|| not_found(ADD_TAG, &selector))?;
                self.add(doc, node, what, &selector)?
            }
            PatchOperation::Remove { .. } => match target {
                Some(node) => self.remove(doc, node, &selector)?,
                None => {
                    warn!(selector = %selector.as_str(), "remove target not found, skipping");
                    Applied::Skipped
                }
            },
            PatchOperation::Replace { value, .. } => {
                let node = target.ok_or_else(|| not_found(REPLACE_TAG, &selector))?;
                self.replace(doc, node, value, &selector)?
            }
        };
        debug!(op = op.tag(), selector = %selector.as_str(), ?applied, "operation applied");
        Ok(applied)
    }

    fn add(
        &self,
        doc: &mut Document,
        node: NodeRef,
        what: &AddTarget,
        selector: &Selector,
    ) -> Result<Applied> {
        let NodeRef::Node(id) = node else {
            return Err(invalid(ADD_TAG, selector, "cannot add to an attribute"));
        };
        match what {
            AddTarget::Attribute { name, value } => {
                let element = doc
                    .element_mut(id)
                    .ok_or_else(|| invalid(ADD_TAG, selector, "attributes can only be added to elements"))?;
                element.set_attribute(name, value.as_str());
            }
            AddTarget::Element(fragment) => {
                let accepts_children = match doc.content(id) {
                    XmlContent::Element(_) => true,
                    XmlContent::Document => doc.document_element().is_none(),
                    _ => false,
                };
                if !accepts_children {
                    return Err(invalid(ADD_TAG, selector, "target cannot take child elements"));
                }
                let copy = doc.import_subtree(fragment.doc, fragment.node);
                redeclare_namespaces(doc, id, copy, fragment);
                doc.append_child(id, copy);
            }
        }
        Ok(Applied::Changed)
    }

    fn remove(&self, doc: &mut Document, node: NodeRef, selector: &Selector) -> Result<Applied> {
        match node {
            NodeRef::Attribute { owner, index } => {
                doc.element_mut(owner)
                    .and_then(|element| element.remove_attribute_at(index))
                    .ok_or_else(|| invalid(REMOVE_TAG, selector, "attribute no longer exists"))?;
            }
            NodeRef::Node(id) => {
                if id == doc.root() || Some(id) == doc.document_element() {
                    return Err(invalid(
                        REMOVE_TAG,
                        selector,
                        "the document element cannot be removed",
                    ));
                }
                let parent = doc
                    .parent(id)
                    .ok_or_else(|| invalid(REMOVE_TAG, selector, "node is detached"))?;
                doc.remove_child(parent, id);
            }
        }
        Ok(Applied::Changed)
    }

    fn replace(
        &self,
        doc: &mut Document,
        node: NodeRef,
        value: &str,
        selector: &Selector,
    ) -> Result<Applied> {
        let id = match node {
            NodeRef::Attribute { owner, index } => {
                let attr = doc
                    .element_mut(owner)
                    .and_then(|element| element.attribute_at_mut(index))
                    .ok_or_else(|| invalid(REPLACE_TAG, selector, "attribute no longer exists"))?;
                attr.set_value(value);
                return Ok(Applied::Changed);
            }
            NodeRef::Node(id) => id,
        };

        match doc.content(id) {
            XmlContent::Element(_) => match doc.first_text_child(id) {
                Some(text) => set_text(doc, text, value),
                None => {
                    let text = doc.create_node(XmlContent::Text(XmlText::new(value)));
                    doc.append_child(id, text);
                }
            },
            XmlContent::Text(_) => set_text(doc, id, value),
            XmlContent::Comment(_) => {
                if let XmlContent::Comment(comment) = doc.content_mut(id) {
                    comment.set_text(value);
                }
            }
            XmlContent::Document | XmlContent::ProcessingInstruction(_) => {
                return Err(invalid(REPLACE_TAG, selector, "node has no replaceable value"));
            }
        }
        Ok(Applied::Changed)
    }
}

fn set_text(doc: &mut Document, id: NodeId, value: &str) {
    if let Some(text) = doc.content_mut(id).as_text_mut() {
        text.set_text(value);
    }
}

/// Declares on the imported root `copy` every prefix the fragment inherits
/// from its ancestors in the diff document, unless `parent` already binds it
/// to the same URI.
fn redeclare_namespaces(doc: &mut Document, parent: NodeId, copy: NodeId, fragment: &Fragment) {
    for prefix in undeclared_prefixes(fragment.doc, fragment.node) {
        let Some(uri) = lookup_namespace_uri(fragment.doc, fragment.node, &prefix) else {
            continue;
        };
        if lookup_namespace_uri(doc, parent, &prefix) == Some(uri) {
            continue;
        }
        let name = if prefix.is_empty() {
            "xmlns".to_string()
        } else {
            format!("xmlns:{}", prefix)
        };
        if let Some(element) = doc.element_mut(copy) {
            element.set_attribute(&name, uri);
        }
    }
}

fn not_found(operation: &'static str, selector: &Selector) -> Error {
    Error::TargetNotFound {
        operation,
        selector: selector.as_str().to_string(),
    }
}

fn invalid(operation: &'static str, selector: &Selector, reason: &'static str) -> Error {
    Error::InvalidTarget {
        operation,
        selector: selector.as_str().to_string(),
        reason,
    }
}
