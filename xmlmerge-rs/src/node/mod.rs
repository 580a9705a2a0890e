//! Node structures for XML tree representation.
//!
//! A `Document` is an arena of nodes addressed by `NodeId`. The id is the
//! identity of a node: two siblings with identical content are still distinct
//! nodes, which is what removal relies on. Node 0 is always the document node.
//!
//! Removing a node only unlinks it from its parent; the arena slot stays
//! allocated but is no longer reachable from the document node.

pub mod namespace;
mod xml_content;

pub use namespace::{ExpandedName, NamespaceContext};
pub use xml_content::{
    XmlAttribute, XmlComment, XmlContent, XmlElement, XmlProcessingInstruction, XmlText,
};

use rustc_hash::FxHashMap;

/// Index of a node in its document's arena.
pub type NodeId = usize;

/// A resolved reference into a document: a node, or an attribute of an
/// element.
///
/// Only valid until the document is next mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// A node in the arena.
    Node(NodeId),
    /// The attribute at `index` on element `owner`.
    Attribute {
        /// The element carrying the attribute.
        owner: NodeId,
        /// Position in the owner's attribute list.
        index: usize,
    },
}

impl NodeRef {
    /// Returns the arena node, or the owning element for an attribute.
    pub fn node_id(&self) -> NodeId {
        match *self {
            NodeRef::Node(id) => id,
            NodeRef::Attribute { owner, .. } => owner,
        }
    }

    /// Returns true if this refers to an attribute.
    pub fn is_attribute(&self) -> bool {
        matches!(self, NodeRef::Attribute { .. })
    }
}

/// The inner data of a node in the arena.
#[derive(Debug, Clone)]
struct NodeInner {
    content: XmlContent,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A mutable XML document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeInner>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document containing only the document node.
    pub fn new() -> Self {
        Document {
            nodes: vec![NodeInner {
                content: XmlContent::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Returns the document node.
    pub fn root(&self) -> NodeId {
        0
    }

    /// Returns the single top-level element, if present.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|&id| self.content(id).is_element())
    }

    /// Number of arena slots, including detached nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the content of a node.
    ///
    /// Panics if `id` does not belong to this document.
    pub fn content(&self, id: NodeId) -> &XmlContent {
        &self.nodes[id].content
    }

    /// Returns a mutable reference to the content of a node.
    pub fn content_mut(&mut self, id: NodeId) -> &mut XmlContent {
        &mut self.nodes[id].content
    }

    /// Returns the parent of a node, `None` for the document node and
    /// detached nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Returns the children of a node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Returns the zero-based position of a node among its siblings.
    pub fn child_pos(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Returns true if the node is reachable from the document node.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current == self.root()
    }

    /// Allocates a detached node.
    pub fn create_node(&mut self, content: XmlContent) -> NodeId {
        self.nodes.push(NodeInner {
            content,
            parent: None,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    /// Appends a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child].parent.is_none());
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    /// Unlinks `child` from `parent`, comparing by identity.
    ///
    /// Returns false if `child` is not a child of `parent`. At most one entry
    /// is removed.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(pos) = self.nodes[parent].children.iter().position(|&c| c == child) else {
            return false;
        };
        self.nodes[parent].children.remove(pos);
        self.nodes[child].parent = None;
        true
    }

    /// Deep-copies the subtree at `src_id` in `src` into this document and
    /// returns the detached copy.
    pub fn import_subtree(&mut self, src: &Document, src_id: NodeId) -> NodeId {
        let copy = self.create_node(src.content(src_id).clone());
        for &child in src.children(src_id) {
            let child_copy = self.import_subtree(src, child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Returns `id` and all nodes below it in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            result.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        result
    }

    /// Maps every attached node to its position in document order.
    pub fn document_order(&self) -> FxHashMap<NodeId, usize> {
        self.descendants(self.root())
            .into_iter()
            .enumerate()
            .map(|(pos, id)| (id, pos))
            .collect()
    }

    /// Returns the first text child of a node.
    pub fn first_text_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.content(c).is_text())
    }

    /// Returns the element if `id` is one.
    pub fn element(&self, id: NodeId) -> Option<&XmlElement> {
        self.content(id).as_element()
    }

    /// Returns the element mutably if `id` is one.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut XmlElement> {
        self.content_mut(id).as_element_mut()
    }

    /// Returns the attribute a `NodeRef::Attribute` points at.
    pub fn attribute(&self, node: NodeRef) -> Option<&XmlAttribute> {
        match node {
            NodeRef::Attribute { owner, index } => self.element(owner)?.attribute_at(index),
            NodeRef::Node(_) => None,
        }
    }

    /// Concatenated text of all text descendants (the XPath string value of
    /// an element or the document).
    pub fn text_content(&self, id: NodeId) -> String {
        match self.content(id) {
            XmlContent::Text(t) => t.text().to_string(),
            XmlContent::Comment(c) => c.text().to_string(),
            XmlContent::ProcessingInstruction(pi) => pi.data().to_string(),
            XmlContent::Element(_) | XmlContent::Document => self
                .descendants(id)
                .into_iter()
                .filter_map(|n| self.content(n).as_text())
                .map(XmlText::text)
                .collect(),
        }
    }

    /// String value of any `NodeRef`.
    pub fn string_value(&self, node: NodeRef) -> String {
        match node {
            NodeRef::Node(id) => self.text_content(id),
            NodeRef::Attribute { .. } => self
                .attribute(node)
                .map(|a| a.value().to_string())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name: &str) -> XmlContent {
        XmlContent::Element(XmlElement::new(name, Vec::new()))
    }

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let root = doc.create_node(element("root"));
        doc.append_child(doc.root(), root);
        let a1 = doc.create_node(element("a"));
        let a2 = doc.create_node(element("a"));
        doc.append_child(root, a1);
        doc.append_child(root, a2);
        (doc, root, a1, a2)
    }

    #[test]
    fn test_add_child() {
        let (doc, root, a1, a2) = sample();
        assert_eq!(doc.document_element(), Some(root));
        assert_eq!(doc.children(root), &[a1, a2]);
        assert_eq!(doc.parent(a1), Some(root));
        assert_eq!(doc.child_pos(a2), Some(1));
        assert_eq!(doc.child_pos(doc.root()), None);
    }

    #[test]
    fn test_remove_child_by_identity() {
        let (mut doc, root, a1, a2) = sample();
        // Both children have equal content; only the selected one goes.
        assert_eq!(doc.content(a1), doc.content(a2));
        assert!(doc.remove_child(root, a2));
        assert_eq!(doc.children(root), &[a1]);
        assert!(!doc.is_attached(a2));
        assert!(doc.is_attached(a1));
        assert!(!doc.remove_child(root, a2));
    }

    #[test]
    fn test_import_subtree() {
        let (mut src, _, a1, _) = sample();
        let text = src.create_node(XmlContent::Text(XmlText::new("hi")));
        src.append_child(a1, text);

        let mut dst = Document::new();
        let copy = dst.import_subtree(&src, a1);
        assert_eq!(dst.parent(copy), None);
        dst.append_child(dst.root(), copy);
        assert_eq!(dst.text_content(dst.root()), "hi");
        assert_eq!(dst.element(copy).unwrap().qname(), "a");
    }

    #[test]
    fn test_document_order() {
        let (mut doc, root, a1, a2) = sample();
        let late = doc.create_node(element("b"));
        doc.append_child(a1, late);

        let order = doc.document_order();
        assert!(order[&root] < order[&a1]);
        assert!(order[&a1] < order[&late]);
        assert!(order[&late] < order[&a2]);
    }

    #[test]
    fn test_string_value() {
        let (mut doc, root, a1, a2) = sample();
        let t1 = doc.create_node(XmlContent::Text(XmlText::new("1")));
        let t2 = doc.create_node(XmlContent::Text(XmlText::new("2")));
        doc.append_child(a1, t1);
        doc.append_child(a2, t2);
        doc.element_mut(root).unwrap().set_attribute("id", "x");

        assert_eq!(doc.string_value(NodeRef::Node(root)), "12");
        assert_eq!(doc.first_text_child(a2), Some(t2));
        assert_eq!(
            doc.string_value(NodeRef::Attribute {
                owner: root,
                index: 0
            }),
            "x"
        );
    }
}
