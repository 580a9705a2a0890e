//! Selector compilation and resolution.
//!
//! Selectors are XPath 1.0 location paths. A compiled [`Selector`] can be
//! evaluated against any document; it holds no references into the tree, so
//! it stays valid across mutations while the [`NodeRef`]s it returns do not.

mod eval;
mod lexer;
mod parser;

use tracing::trace;

use crate::error::{Error, Result};
use crate::node::{Document, NamespaceContext, NodeRef};

/// A compiled selector expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    expression: String,
    expr: parser::Expr,
}

impl Selector {
    /// Compiles `expression`. Syntax errors, unknown functions and wrong
    /// argument counts are reported here.
    pub fn compile(expression: &str) -> Result<Self> {
        let expr = parser::parse(expression).map_err(|m| Error::selector(expression, m))?;
        Ok(Selector {
            expression: expression.to_string(),
            expr,
        })
    }

    /// The expression as written.
    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// Returns the first selected node in document order, or `None` when
    /// nothing matches.
    pub fn evaluate(&self, doc: &Document, namespaces: &NamespaceContext) -> Result<Option<NodeRef>> {
        let nodes = self.evaluate_all(doc, namespaces)?;
        trace!(selector = %self.expression, matches = nodes.len(), "selector evaluated");
        Ok(nodes.into_iter().next())
    }

    /// Returns every selected node in document order.
    pub fn evaluate_all(&self, doc: &Document, namespaces: &NamespaceContext) -> Result<Vec<NodeRef>> {
        eval::Evaluator::new(doc, namespaces, &self.expression).select(&self.expr)
    }
}

/// Compiles and evaluates `expression` in one step.
pub fn resolve(doc: &Document, expression: &str, namespaces: &NamespaceContext) -> Result<Option<NodeRef>> {
    Selector::compile(expression)?.evaluate(doc, namespaces)
}
