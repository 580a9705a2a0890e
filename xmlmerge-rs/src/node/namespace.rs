//! Namespace handling for XML elements.

use rustc_hash::FxHashMap;

use super::{Document, NodeId, XmlContent};

/// The namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Represents an expanded XML name (namespace URI + local name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpandedName {
    /// The namespace URI (empty string for no namespace).
    pub namespace_uri: String,
    /// The local part of the name (without prefix).
    pub local_name: String,
}

impl ExpandedName {
    /// Creates a new expanded name with a namespace.
    pub fn new(uri: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace_uri: uri.into(),
            local_name: local.into(),
        }
    }

    /// Creates an expanded name with no namespace.
    pub fn no_namespace(local: impl Into<String>) -> Self {
        Self::new("", local)
    }
}

/// Flat prefix to URI mapping used when evaluating selectors.
///
/// Built once per merge from every namespace declaration in the baseline
/// document. Scoping is not tracked here: a prefix declared twice keeps the
/// last binding seen in document order.
#[derive(Debug, Clone, Default)]
pub struct NamespaceContext {
    bindings: FxHashMap<String, String>,
}

impl NamespaceContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every namespace declaration in `doc`.
    pub fn build(doc: &Document) -> Self {
        let mut ctx = NamespaceContext::new();
        for id in doc.descendants(doc.root()) {
            if let XmlContent::Element(element) = doc.content(id) {
                for (prefix, uri) in element.namespace_decls() {
                    ctx.bind(prefix, uri);
                }
            }
        }
        ctx
    }

    /// Binds a prefix to a URI, replacing any earlier binding.
    pub fn bind(&mut self, prefix: &str, uri: &str) {
        self.bindings.insert(prefix.to_string(), uri.to_string());
    }

    /// Resolves a prefix to its URI. The `xml` prefix is always bound.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        match self.bindings.get(prefix) {
            Some(uri) => Some(uri.as_str()),
            None if prefix == "xml" => Some(XML_NAMESPACE),
            None => None,
        }
    }

    /// Returns the default namespace (empty prefix binding), ignoring an
    /// empty undeclaration.
    pub fn default_namespace(&self) -> Option<&str> {
        self.bindings
            .get("")
            .map(String::as_str)
            .filter(|uri| !uri.is_empty())
    }

    /// Number of declared bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if no namespace was declared.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates over `(prefix, uri)` bindings in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
    }
}

/// Resolves `prefix` in the scope of `node`, walking up through its ancestors.
///
/// The empty prefix looks up the default namespace. Returns `None` when the
/// prefix is unbound or the default namespace was undeclared with `xmlns=""`.
pub fn lookup_namespace_uri<'d>(doc: &'d Document, node: NodeId, prefix: &str) -> Option<&'d str> {
    if prefix == "xml" {
        return Some(XML_NAMESPACE);
    }
    let mut current = Some(node);
    while let Some(id) = current {
        if let XmlContent::Element(element) = doc.content(id) {
            if let Some((_, uri)) = element.namespace_decls().find(|(p, _)| *p == prefix) {
                return if uri.is_empty() { None } else { Some(uri) };
            }
        }
        current = doc.parent(id);
    }
    None
}

/// Returns the expanded name of an element node.
pub fn element_expanded_name(doc: &Document, node: NodeId) -> Option<ExpandedName> {
    let element = doc.content(node).as_element()?;
    let uri = lookup_namespace_uri(doc, node, element.prefix().unwrap_or(""));
    Some(ExpandedName::new(uri.unwrap_or(""), element.local_name()))
}

/// Prefixes used by names in the subtree at `node` that are not declared
/// inside that subtree. The default namespace is reported as `""`.
pub fn undeclared_prefixes(doc: &Document, node: NodeId) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for id in doc.descendants(node) {
        let Some(element) = doc.content(id).as_element() else {
            continue;
        };
        let mut used = vec![element.prefix().unwrap_or("")];
        used.extend(
            element
                .attributes()
                .iter()
                .filter(|a| !a.is_namespace_decl())
                .filter_map(|a| a.prefix()),
        );
        for prefix in used {
            if prefix == "xml" || found.iter().any(|p| p == prefix) {
                continue;
            }
            if !declared_within(doc, node, id, prefix) {
                found.push(prefix.to_string());
            }
        }
    }
    found
}

/// True if `prefix` is declared on `id` or an ancestor up to and including `top`.
fn declared_within(doc: &Document, top: NodeId, id: NodeId, prefix: &str) -> bool {
    let mut current = Some(id);
    while let Some(n) = current {
        if let Some(element) = doc.content(n).as_element() {
            if element.namespace_decls().any(|(p, _)| p == prefix) {
                return true;
            }
        }
        if n == top {
            break;
        }
        current = doc.parent(n);
    }
    false
}

/// Splits a qualified name into prefix and local name.
///
/// Returns (Some(prefix), local) for "prefix:local"
/// Returns (None, name) for "name" without prefix
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some(pos) = qname.find(':') {
        (Some(&qname[..pos]), &qname[pos + 1..])
    } else {
        (None, qname)
    }
}

/// Checks if an attribute name is a namespace declaration.
pub fn is_xmlns_attr(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

/// Returns the prefix declared by a namespace attribute: `""` for `xmlns`,
/// `p` for `xmlns:p`, and `None` for other attributes.
pub fn xmlns_prefix(name: &str) -> Option<&str> {
    if name == "xmlns" {
        Some("")
    } else {
        name.strip_prefix("xmlns:")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("svg:rect"), (Some("svg"), "rect"));
        assert_eq!(split_qname("rect"), (None, "rect"));
        assert_eq!(split_qname("ns:foo:bar"), (Some("ns"), "foo:bar"));
    }

    #[test]
    fn test_is_xmlns() {
        assert!(is_xmlns_attr("xmlns"));
        assert!(is_xmlns_attr("xmlns:svg"));
        assert!(!is_xmlns_attr("xml:space"));
        assert!(!is_xmlns_attr("href"));
        assert_eq!(xmlns_prefix("xmlns"), Some(""));
        assert_eq!(xmlns_prefix("xmlns:svg"), Some("svg"));
        assert_eq!(xmlns_prefix("href"), None);
    }

    #[test]
    fn test_build_collects_all_declarations() {
        let doc = parse_str(
            r#"<r:repo xmlns:r="urn:repo" xmlns="urn:default"><r:item xmlns:d="urn:dc"/></r:repo>"#,
        )
        .unwrap();
        let ctx = NamespaceContext::build(&doc);

        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.resolve("r"), Some("urn:repo"));
        assert_eq!(ctx.resolve("d"), Some("urn:dc"));
        assert_eq!(ctx.default_namespace(), Some("urn:default"));
        assert_eq!(ctx.resolve("missing"), None);
    }

    #[test]
    fn test_last_declaration_wins() {
        let doc = parse_str(r#"<a xmlns:p="urn:one"><b xmlns:p="urn:two"/></a>"#).unwrap();
        let ctx = NamespaceContext::build(&doc);
        assert_eq!(ctx.resolve("p"), Some("urn:two"));
    }

    #[test]
    fn test_empty_document_yields_empty_context() {
        let ctx = NamespaceContext::build(&Document::new());
        assert!(ctx.is_empty());
        assert_eq!(ctx.resolve("xml"), Some(XML_NAMESPACE));
    }

    #[test]
    fn test_scoped_lookup() {
        let doc = parse_str(
            r#"<a xmlns="urn:a" xmlns:p="urn:p"><b xmlns=""><c/></b><p:d/></a>"#,
        )
        .unwrap();
        let a = doc.document_element().unwrap();
        let b = doc.children(a)[0];
        let c = doc.children(b)[0];
        let d = doc.children(a)[1];

        assert_eq!(lookup_namespace_uri(&doc, a, ""), Some("urn:a"));
        assert_eq!(lookup_namespace_uri(&doc, c, ""), None);
        assert_eq!(lookup_namespace_uri(&doc, c, "p"), Some("urn:p"));
        assert_eq!(
            element_expanded_name(&doc, d),
            Some(ExpandedName::new("urn:p", "d"))
        );
        assert_eq!(
            element_expanded_name(&doc, c),
            Some(ExpandedName::no_namespace("c"))
        );
    }

    #[test]
    fn test_undeclared_prefixes() {
        let doc = parse_str(
            r#"<diff xmlns:f="urn:f"><add sel="/x"><f:item f:kind="a"><g:sub xmlns:g="urn:g"/></f:item></add></diff>"#,
        )
        .unwrap();
        let diff = doc.document_element().unwrap();
        let add = doc.children(diff)[0];
        let item = doc.children(add)[0];

        assert_eq!(undeclared_prefixes(&doc, item), vec!["f".to_string()]);
        assert_eq!(undeclared_prefixes(&doc, diff), vec!["".to_string()]);
    }
}
