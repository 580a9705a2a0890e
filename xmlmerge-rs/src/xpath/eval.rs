//! Selector evaluation engine.
//!
//! Evaluates parsed expressions against a live [`Document`]. Node sets are
//! kept in document order with duplicates removed; positional predicates use
//! axis order, so reverse axes count back from the context node.

use rustc_hash::{FxHashMap, FxHashSet};

use super::parser::{Axis, BinaryOp, Expr, Function, NodeTest, PathExpr, PathStart, Step};
use crate::error::{Error, Result};
use crate::node::namespace::lookup_namespace_uri;
use crate::node::{Document, NamespaceContext, NodeId, NodeRef, XmlContent};

/// Result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    NodeSet(Vec<NodeRef>),
    Boolean(bool),
    Number(f64),
    String(String),
}

/// Evaluation context for one node.
#[derive(Debug, Clone, Copy)]
struct Context {
    node: NodeRef,
    position: usize,
    size: usize,
}

/// Evaluates expressions against one document and namespace context.
pub struct Evaluator<'a> {
    doc: &'a Document,
    namespaces: &'a NamespaceContext,
    expression: &'a str,
    order: FxHashMap<NodeId, usize>,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator. `expression` is only used in error messages.
    pub fn new(doc: &'a Document, namespaces: &'a NamespaceContext, expression: &'a str) -> Self {
        Evaluator {
            doc,
            namespaces,
            expression,
            order: doc.document_order(),
        }
    }

    /// Evaluates `expr` with the document node as context and returns the
    /// selected nodes in document order.
    pub fn select(&self, expr: &Expr) -> Result<Vec<NodeRef>> {
        let ctx = Context {
            node: NodeRef::Node(self.doc.root()),
            position: 1,
            size: 1,
        };
        match self.eval(expr, &ctx)? {
            Value::NodeSet(nodes) => Ok(nodes),
            other => Err(self.error(format!(
                "expression does not select nodes (evaluates to {})",
                self.string(&other)
            ))),
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::selector(self.expression, message)
    }

    fn eval(&self, expr: &Expr, ctx: &Context) -> Result<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Literal(s) => Ok(Value::String(s.clone())),
            Expr::Negate(inner) => {
                let value = self.eval(inner, ctx)?;
                Ok(Value::Number(-self.number(&value)))
            }
            Expr::Binary(left, op, right) => self.eval_binary(left, *op, right, ctx),
            Expr::Union(left, right) => {
                let mut nodes = self.node_set(left, ctx)?;
                nodes.extend(self.node_set(right, ctx)?);
                Ok(Value::NodeSet(self.in_document_order(nodes)))
            }
            Expr::Path(path) => Ok(Value::NodeSet(self.eval_path(path, ctx)?)),
            Expr::Filter(primary, predicates) => {
                let nodes = self.node_set(primary, ctx)?;
                Ok(Value::NodeSet(self.apply_predicates(nodes, predicates)?))
            }
            Expr::Function(function, args) => self.call(*function, args, ctx),
        }
    }

    fn node_set(&self, expr: &Expr, ctx: &Context) -> Result<Vec<NodeRef>> {
        match self.eval(expr, ctx)? {
            Value::NodeSet(nodes) => Ok(nodes),
            _ => Err(self.error("expected a node-set")),
        }
    }

    fn eval_binary(&self, left: &Expr, op: BinaryOp, right: &Expr, ctx: &Context) -> Result<Value> {
        match op {
            BinaryOp::Or => {
                let l = self.eval(left, ctx)?;
                if self.boolean(&l) {
                    return Ok(Value::Boolean(true));
                }
                let r = self.eval(right, ctx)?;
                Ok(Value::Boolean(self.boolean(&r)))
            }
            BinaryOp::And => {
                let l = self.eval(left, ctx)?;
                if !self.boolean(&l) {
                    return Ok(Value::Boolean(false));
                }
                let r = self.eval(right, ctx)?;
                Ok(Value::Boolean(self.boolean(&r)))
            }
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq => {
                let l = self.eval(left, ctx)?;
                let r = self.eval(right, ctx)?;
                Ok(Value::Boolean(self.compare(op, &l, &r)))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let l = self.eval(left, ctx)?;
                let r = self.eval(right, ctx)?;
                let (a, b) = (self.number(&l), self.number(&r));
                Ok(Value::Number(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    _ => a % b,
                }))
            }
        }
    }

    fn eval_path(&self, path: &PathExpr, ctx: &Context) -> Result<Vec<NodeRef>> {
        let mut nodes = match &path.start {
            PathStart::Root => vec![NodeRef::Node(self.doc.root())],
            PathStart::Context => vec![ctx.node],
            PathStart::Expr(expr) => self.node_set(expr, ctx)?,
        };
        for step in &path.steps {
            nodes = self.eval_step(&nodes, step)?;
        }
        Ok(nodes)
    }

    fn eval_step(&self, input: &[NodeRef], step: &Step) -> Result<Vec<NodeRef>> {
        let mut result = Vec::new();
        for &node in input {
            let mut candidates = Vec::new();
            for candidate in self.axis_nodes(node, step.axis) {
                if self.matches(candidate, step.axis, &step.node_test)? {
                    candidates.push(candidate);
                }
            }
            // Proximity positions count away from the context node
            if step.axis.is_reverse() {
                candidates.reverse();
            }
            result.extend(self.apply_predicates(candidates, &step.predicates)?);
        }
        Ok(self.in_document_order(result))
    }

    fn apply_predicates(&self, mut nodes: Vec<NodeRef>, predicates: &[Expr]) -> Result<Vec<NodeRef>> {
        for predicate in predicates {
            let size = nodes.len();
            let mut kept = Vec::with_capacity(size);
            for (i, &node) in nodes.iter().enumerate() {
                let ctx = Context {
                    node,
                    position: i + 1,
                    size,
                };
                let include = match self.eval(predicate, &ctx)? {
                    Value::Number(n) => n == (i + 1) as f64,
                    other => self.boolean(&other),
                };
                if include {
                    kept.push(node);
                }
            }
            nodes = kept;
        }
        Ok(nodes)
    }

    /// Nodes along `axis` from `node`, in document order.
    fn axis_nodes(&self, node: NodeRef, axis: Axis) -> Vec<NodeRef> {
        let doc = self.doc;
        let id = match node {
            NodeRef::Node(id) => id,
            NodeRef::Attribute { owner, .. } => {
                return match axis {
                    Axis::SelfAxis | Axis::DescendantOrSelf => vec![node],
                    Axis::Parent => vec![NodeRef::Node(owner)],
                    Axis::Ancestor => self.ancestors_or_self(owner),
                    Axis::AncestorOrSelf => {
                        let mut nodes = self.ancestors_or_self(owner);
                        nodes.push(node);
                        nodes
                    }
                    Axis::Following => {
                        let mut nodes: Vec<NodeRef> = doc
                            .descendants(owner)
                            .into_iter()
                            .skip(1)
                            .map(NodeRef::Node)
                            .collect();
                        nodes.extend(self.following(owner));
                        nodes
                    }
                    Axis::Preceding => self.preceding(owner),
                    _ => Vec::new(),
                };
            }
        };

        match axis {
            Axis::Child => doc.children(id).iter().copied().map(NodeRef::Node).collect(),
            Axis::Descendant => doc
                .descendants(id)
                .into_iter()
                .skip(1)
                .map(NodeRef::Node)
                .collect(),
            Axis::DescendantOrSelf => doc.descendants(id).into_iter().map(NodeRef::Node).collect(),
            Axis::Parent => doc.parent(id).map(NodeRef::Node).into_iter().collect(),
            Axis::Ancestor => match doc.parent(id) {
                Some(parent) => self.ancestors_or_self(parent),
                None => Vec::new(),
            },
            Axis::AncestorOrSelf => self.ancestors_or_self(id),
            Axis::FollowingSibling => match (doc.parent(id), doc.child_pos(id)) {
                (Some(parent), Some(pos)) => doc.children(parent)[pos + 1..]
                    .iter()
                    .copied()
                    .map(NodeRef::Node)
                    .collect(),
                _ => Vec::new(),
            },
            Axis::PrecedingSibling => match (doc.parent(id), doc.child_pos(id)) {
                (Some(parent), Some(pos)) => doc.children(parent)[..pos]
                    .iter()
                    .copied()
                    .map(NodeRef::Node)
                    .collect(),
                _ => Vec::new(),
            },
            Axis::Following => self.following(id),
            Axis::Preceding => self.preceding(id),
            Axis::SelfAxis => vec![node],
            Axis::Attribute => match doc.element(id) {
                Some(element) => element
                    .attributes()
                    .iter()
                    .enumerate()
                    .filter(|(_, a)| !a.is_namespace_decl())
                    .map(|(index, _)| NodeRef::Attribute { owner: id, index })
                    .collect(),
                None => Vec::new(),
            },
        }
    }

    /// `id` and its ancestors, root first.
    fn ancestors_or_self(&self, id: NodeId) -> Vec<NodeRef> {
        let mut nodes = Vec::new();
        let mut current = Some(id);
        while let Some(n) = current {
            nodes.push(NodeRef::Node(n));
            current = self.doc.parent(n);
        }
        nodes.reverse();
        nodes
    }

    fn following(&self, id: NodeId) -> Vec<NodeRef> {
        let doc = self.doc;
        let mut nodes = Vec::new();
        let mut current = Some(id);
        while let Some(n) = current {
            if let (Some(parent), Some(pos)) = (doc.parent(n), doc.child_pos(n)) {
                for &sibling in &doc.children(parent)[pos + 1..] {
                    nodes.extend(doc.descendants(sibling).into_iter().map(NodeRef::Node));
                }
            }
            current = doc.parent(n);
        }
        self.in_document_order(nodes)
    }

    fn preceding(&self, id: NodeId) -> Vec<NodeRef> {
        let ancestors: FxHashSet<NodeId> = self
            .ancestors_or_self(id)
            .into_iter()
            .map(|n| n.node_id())
            .collect();
        self.doc
            .descendants(self.doc.root())
            .into_iter()
            .take_while(|&n| n != id)
            .filter(|n| !ancestors.contains(n))
            .map(NodeRef::Node)
            .collect()
    }

    fn matches(&self, node: NodeRef, axis: Axis, test: &NodeTest) -> Result<bool> {
        let doc = self.doc;
        match node {
            NodeRef::Attribute { owner, .. } => {
                let Some(attr) = doc.attribute(node) else {
                    return Ok(false);
                };
                // Attributes only match name tests on the attribute axis
                if axis != Axis::Attribute && !matches!(test, NodeTest::Node) {
                    return Ok(false);
                }
                match test {
                    NodeTest::Any | NodeTest::Node => Ok(true),
                    NodeTest::Name { prefix, local } => {
                        if attr.local_name() != local.as_str() {
                            return Ok(false);
                        }
                        let actual = attr
                            .prefix()
                            .and_then(|p| lookup_namespace_uri(doc, owner, p))
                            .unwrap_or("");
                        match prefix {
                            Some(p) => Ok(actual == self.resolve_prefix(p)?),
                            None => Ok(attr.prefix().is_none()),
                        }
                    }
                    NodeTest::PrefixWildcard(p) => {
                        let uri = self.resolve_prefix(p)?;
                        Ok(attr
                            .prefix()
                            .and_then(|ap| lookup_namespace_uri(doc, owner, ap))
                            == Some(uri))
                    }
                    _ => Ok(false),
                }
            }
            NodeRef::Node(id) => {
                let content = doc.content(id);
                match test {
                    NodeTest::Node => Ok(true),
                    NodeTest::Text => Ok(content.is_text()),
                    NodeTest::Comment => Ok(content.is_comment()),
                    NodeTest::ProcessingInstruction(target) => Ok(match content {
                        XmlContent::ProcessingInstruction(pi) => {
                            target.as_deref().map_or(true, |t| t == pi.target())
                        }
                        _ => false,
                    }),
                    _ if axis == Axis::Attribute => Ok(false),
                    NodeTest::Any => Ok(content.is_element()),
                    NodeTest::Name { prefix, local } => {
                        let expected = match prefix {
                            Some(p) => Some(self.resolve_prefix(p)?),
                            None => None,
                        };
                        let Some(element) = content.as_element() else {
                            return Ok(false);
                        };
                        if element.local_name() != local.as_str() {
                            return Ok(false);
                        }
                        let actual =
                            lookup_namespace_uri(doc, id, element.prefix().unwrap_or(""))
                                .unwrap_or("");
                        match expected {
                            Some(uri) => Ok(actual == uri),
                            None => Ok(actual.is_empty()
                                || self.namespaces.default_namespace() == Some(actual)),
                        }
                    }
                    NodeTest::PrefixWildcard(p) => {
                        let Some(element) = content.as_element() else {
                            return Ok(false);
                        };
                        let uri = self.resolve_prefix(p)?;
                        Ok(lookup_namespace_uri(doc, id, element.prefix().unwrap_or(""))
                            == Some(uri))
                    }
                }
            }
        }
    }

    fn resolve_prefix(&self, prefix: &str) -> Result<&'a str> {
        self.namespaces
            .resolve(prefix)
            .ok_or_else(|| self.error(format!("undeclared namespace prefix '{}'", prefix)))
    }

    fn order_key(&self, node: NodeRef) -> (usize, usize) {
        match node {
            NodeRef::Node(id) => (self.order.get(&id).copied().unwrap_or(usize::MAX), 0),
            NodeRef::Attribute { owner, index } => (
                self.order.get(&owner).copied().unwrap_or(usize::MAX),
                index + 1,
            ),
        }
    }

    fn in_document_order(&self, mut nodes: Vec<NodeRef>) -> Vec<NodeRef> {
        nodes.sort_by_key(|&n| self.order_key(n));
        nodes.dedup();
        nodes
    }

    fn call(&self, function: Function, args: &[Expr], ctx: &Context) -> Result<Value> {
        let values = args
            .iter()
            .map(|arg| self.eval(arg, ctx))
            .collect::<Result<Vec<_>>>()?;
        // Zero-argument forms default to the context node
        let arg_or_context = || {
            values
                .first()
                .cloned()
                .unwrap_or_else(|| Value::NodeSet(vec![ctx.node]))
        };

        Ok(match function {
            Function::Last => Value::Number(ctx.size as f64),
            Function::Position => Value::Number(ctx.position as f64),
            Function::Count => match &values[0] {
                Value::NodeSet(nodes) => Value::Number(nodes.len() as f64),
                _ => return Err(self.error("count() expects a node-set")),
            },
            Function::Not => Value::Boolean(!self.boolean(&values[0])),
            Function::True => Value::Boolean(true),
            Function::False => Value::Boolean(false),
            Function::Boolean => Value::Boolean(self.boolean(&values[0])),
            Function::Number => Value::Number(self.number(&arg_or_context())),
            Function::String => Value::String(self.string(&arg_or_context())),
            Function::Concat => Value::String(values.iter().map(|v| self.string(v)).collect()),
            Function::Contains => {
                Value::Boolean(self.string(&values[0]).contains(&self.string(&values[1])))
            }
            Function::StartsWith => {
                Value::Boolean(self.string(&values[0]).starts_with(&self.string(&values[1])))
            }
            Function::StringLength => {
                Value::Number(self.string(&arg_or_context()).chars().count() as f64)
            }
            Function::NormalizeSpace => Value::String(
                self.string(&arg_or_context())
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            Function::Name | Function::LocalName | Function::NamespaceUri => {
                let first = match arg_or_context() {
                    Value::NodeSet(nodes) => nodes.first().copied(),
                    _ => return Err(self.error("name functions expect a node-set")),
                };
                Value::String(
                    first
                        .map(|node| self.node_name(node, function))
                        .unwrap_or_default(),
                )
            }
        })
    }

    fn node_name(&self, node: NodeRef, function: Function) -> String {
        let doc = self.doc;
        let (qname, prefix, local, scope) = match node {
            NodeRef::Attribute { owner, .. } => match doc.attribute(node) {
                Some(attr) => (attr.qname(), attr.prefix(), attr.local_name(), owner),
                None => return String::new(),
            },
            NodeRef::Node(id) => match doc.content(id) {
                XmlContent::Element(e) => (e.qname(), Some(e.prefix().unwrap_or("")), e.local_name(), id),
                XmlContent::ProcessingInstruction(pi) => (pi.target(), None, pi.target(), id),
                _ => return String::new(),
            },
        };
        match function {
            Function::Name => qname.to_string(),
            Function::LocalName => local.to_string(),
            _ => prefix
                .and_then(|p| lookup_namespace_uri(doc, scope, p))
                .unwrap_or("")
                .to_string(),
        }
    }

    fn compare(&self, op: BinaryOp, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::NodeSet(a), Value::NodeSet(b)) => a.iter().any(|&x| {
                let sx = Value::String(self.doc.string_value(x));
                b.iter().any(|&y| {
                    compare_atoms(op, &sx, &Value::String(self.doc.string_value(y)))
                })
            }),
            (Value::NodeSet(a), Value::Boolean(_)) => {
                compare_atoms(op, &Value::Boolean(!a.is_empty()), right)
            }
            (Value::Boolean(_), Value::NodeSet(b)) => {
                compare_atoms(op, left, &Value::Boolean(!b.is_empty()))
            }
            (Value::NodeSet(a), _) => a
                .iter()
                .any(|&x| compare_atoms(op, &Value::String(self.doc.string_value(x)), right)),
            (_, Value::NodeSet(b)) => b
                .iter()
                .any(|&y| compare_atoms(op, left, &Value::String(self.doc.string_value(y)))),
            _ => compare_atoms(op, left, right),
        }
    }

    fn boolean(&self, value: &Value) -> bool {
        match value {
            Value::NodeSet(nodes) => !nodes.is_empty(),
            atom => atom_boolean(atom),
        }
    }

    fn number(&self, value: &Value) -> f64 {
        match value {
            Value::NodeSet(_) => parse_number(&self.string(value)),
            atom => atom_number(atom),
        }
    }

    fn string(&self, value: &Value) -> String {
        match value {
            Value::NodeSet(nodes) => nodes
                .first()
                .map(|&n| self.doc.string_value(n))
                .unwrap_or_default(),
            atom => atom_string(atom),
        }
    }
}

fn compare_atoms(op: BinaryOp, left: &Value, right: &Value) -> bool {
    match op {
        BinaryOp::Eq | BinaryOp::NotEq => {
            let equal = if matches!(left, Value::Boolean(_)) || matches!(right, Value::Boolean(_)) {
                atom_boolean(left) == atom_boolean(right)
            } else if matches!(left, Value::Number(_)) || matches!(right, Value::Number(_)) {
                atom_number(left) == atom_number(right)
            } else {
                atom_string(left) == atom_string(right)
            };
            (op == BinaryOp::Eq) == equal
        }
        _ => {
            let (a, b) = (atom_number(left), atom_number(right));
            match op {
                BinaryOp::Lt => a < b,
                BinaryOp::LtEq => a <= b,
                BinaryOp::Gt => a > b,
                _ => a >= b,
            }
        }
    }
}

fn atom_boolean(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !s.is_empty(),
        Value::NodeSet(nodes) => !nodes.is_empty(),
    }
}

fn atom_number(value: &Value) -> f64 {
    match value {
        Value::Boolean(b) => f64::from(u8::from(*b)),
        Value::Number(n) => *n,
        Value::String(s) => parse_number(s),
        Value::NodeSet(_) => f64::NAN,
    }
}

fn atom_string(value: &Value) -> String {
    match value {
        Value::Boolean(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.clone(),
        Value::NodeSet(_) => String::new(),
    }
}

/// Parses a string the way XPath's `number()` does: optional minus, digits
/// with an optional fraction, surrounding whitespace allowed.
fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let valid = !digits.is_empty()
        && digits != "."
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1;
    if valid {
        trimmed.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;
    use crate::xpath::parser::parse;

    const DOC: &str = r#"<root xmlns:f="urn:f">
        <item id="1">one</item>
        <item id="2" kind="x">two</item>
        <f:item id="3">three</f:item>
        <!-- note -->
        <group><item id="4">four</item></group>
    </root>"#;

    fn select(xml: &str, expr: &str) -> Result<Vec<NodeRef>> {
        let doc = parse_str(xml).unwrap();
        let ns = NamespaceContext::build(&doc);
        let parsed = parse(expr).map_err(|m| Error::selector(expr, m))?;
        Evaluator::new(&doc, &ns, expr).select(&parsed)
    }

    fn strings(xml: &str, expr: &str) -> Vec<String> {
        let doc = parse_str(xml).unwrap();
        let ns = NamespaceContext::build(&doc);
        let parsed = parse(expr).unwrap();
        Evaluator::new(&doc, &ns, expr)
            .select(&parsed)
            .unwrap()
            .into_iter()
            .map(|n| doc.string_value(n))
            .collect()
    }

    #[test]
    fn test_child_paths() {
        assert_eq!(strings(DOC, "/root/item"), vec!["one", "two"]);
        assert_eq!(strings(DOC, "/root/item/text()"), vec!["one", "two"]);
        assert_eq!(strings(DOC, "/root/*[3]"), vec!["three"]);
    }

    #[test]
    fn test_descendants_in_document_order() {
        assert_eq!(strings(DOC, "//item/@id"), vec!["1", "2", "4"]);
        assert_eq!(strings(DOC, "//@id"), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_attribute_predicates() {
        assert_eq!(strings(DOC, "/root/item[@id='2']"), vec!["two"]);
        assert_eq!(strings(DOC, "/root/item[@kind]"), vec!["two"]);
        assert_eq!(strings(DOC, "/root/item[@id > 1]/@kind"), vec!["x"]);
        assert_eq!(strings(DOC, "/root/item[not(@kind)]"), vec!["one"]);
        assert_eq!(strings(DOC, "/root/item[. = 'one']/@id"), vec!["1"]);
    }

    #[test]
    fn test_positions() {
        assert_eq!(strings(DOC, "/root/item[last()]"), vec!["two"]);
        assert_eq!(strings(DOC, "/root/item[position() = 1]"), vec!["one"]);
        assert_eq!(strings(DOC, "(//item)[3]"), vec!["four"]);
        assert_eq!(strings(DOC, "//item[1]"), vec!["one", "four"]);
    }

    #[test]
    fn test_reverse_axis_positions() {
        assert_eq!(
            strings(DOC, "/root/group/preceding-sibling::*[1]"),
            vec!["three"]
        );
        assert_eq!(strings(DOC, "//group/item/ancestor::*[1]/item/@id"), vec!["4"]);
        assert_eq!(
            strings(DOC, "//group/item/ancestor::*[last()]/item[1]/@id"),
            vec!["1"]
        );
        assert_eq!(strings(DOC, "/root/item[2]/following-sibling::*[1]/@id"), vec!["3"]);
        assert_eq!(strings(DOC, "//group/item/preceding::*[1]/@id"), vec!["3"]);
        assert_eq!(strings(DOC, "//group/item/preceding::item[1]/@id"), vec!["2"]);
        assert_eq!(
            strings(DOC, "/root/group/preceding-sibling::*[last()]/@id"),
            vec!["1"]
        );
        assert_eq!(
            strings(DOC, "//group/item/ancestor-or-self::*[2]/item/@id"),
            vec!["4"]
        );
    }

    #[test]
    fn test_reverse_axis_results_in_document_order() {
        assert_eq!(
            strings(DOC, "//group/item/preceding::item/@id"),
            vec!["1", "2"]
        );
        assert_eq!(
            strings(DOC, "/root/group/preceding-sibling::*/@id"),
            vec!["1", "2", "3"]
        );
    }

    #[test]
    fn test_namespaces() {
        assert_eq!(strings(DOC, "/root/f:item"), vec!["three"]);
        assert_eq!(strings(DOC, "/root/f:*/@id"), vec!["3"]);
    }

    #[test]
    fn test_default_namespace_matches_bare_names() {
        let xml = r#"<repo xmlns="urn:repo"><field id="1"/></repo>"#;
        assert_eq!(strings(xml, "/repo/field/@id"), vec!["1"]);
    }

    #[test]
    fn test_undeclared_prefix_is_error() {
        assert!(matches!(
            select(DOC, "/root/g:item"),
            Err(Error::Selector { .. })
        ));
    }

    #[test]
    fn test_non_node_set_is_error() {
        assert!(matches!(select(DOC, "1 + 1"), Err(Error::Selector { .. })));
        assert!(matches!(
            select(DOC, "count(//item)"),
            Err(Error::Selector { .. })
        ));
    }

    #[test]
    fn test_parent_and_comment() {
        assert_eq!(strings(DOC, "/root/comment()"), vec![" note "]);
        assert_eq!(strings(DOC, "//item[@id='4']/../../item[1]/@id"), vec!["1"]);
    }

    #[test]
    fn test_functions_in_predicates() {
        assert_eq!(
            strings(DOC, "//item[contains(., 'ou')]/@id"),
            vec!["4"]
        );
        assert_eq!(
            strings(DOC, "//*[starts-with(name(), 'f:')]"),
            vec!["three"]
        );
        assert_eq!(
            strings(DOC, "//*[local-name() = 'item' and string-length(.) = 5]/@id"),
            vec!["3"]
        );
        assert_eq!(
            strings(DOC, "/root/*[count(item) = 1]/item"),
            vec!["four"]
        );
        assert_eq!(
            strings(DOC, "//item[concat(@id, '-', .) = '2-two']"),
            vec!["two"]
        );
        assert_eq!(
            strings(DOC, "//*[namespace-uri() = 'urn:f']"),
            vec!["three"]
        );
    }

    #[test]
    fn test_arithmetic_and_union() {
        assert_eq!(strings(DOC, "/root/item[last() - 1]"), vec!["one"]);
        assert_eq!(strings(DOC, "/root/item[@id mod 2 = 0]"), vec!["two"]);
        assert_eq!(strings(DOC, "/root/group/item | /root/item[1]"), vec!["one", "four"]);
    }

    #[test]
    fn test_number_conversions() {
        assert_eq!(parse_number(" 12 "), 12.0);
        assert_eq!(parse_number("-1.5"), -1.5);
        assert!(parse_number("1e3").is_nan());
        assert!(parse_number("").is_nan());
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NAN), "NaN");
    }
}
