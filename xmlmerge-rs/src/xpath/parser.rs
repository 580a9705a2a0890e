//! Selector parser.
//!
//! Recursive descent parser for the XPath 1.0 expression grammar. Function
//! names and arities are checked here so a bad selector fails before any
//! document is touched.

use super::lexer::{tokenize, Token};

/// Selector expression AST node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Binary operation.
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    /// Unary negation.
    Negate(Box<Expr>),
    /// Union of two node sets (`|`).
    Union(Box<Expr>, Box<Expr>),
    /// Location path, possibly starting from a filter expression.
    Path(PathExpr),
    /// Primary expression with predicates.
    Filter(Box<Expr>, Vec<Expr>),
    /// Function call.
    Function(Function, Vec<Expr>),
    /// Number literal.
    Number(f64),
    /// String literal.
    Literal(String),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// A path: where it starts and the steps that follow.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    pub start: PathStart,
    pub steps: Vec<Step>,
}

/// Starting point of a path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathStart {
    /// Absolute path from the document node.
    Root,
    /// Relative path from the context node.
    Context,
    /// Path continuing from a filter expression.
    Expr(Box<Expr>),
}

/// Location step in a path.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn descendant_or_self() -> Self {
        Step {
            axis: Axis::DescendantOrSelf,
            node_test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

/// Supported axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    SelfAxis,
    Attribute,
}

impl Axis {
    fn from_name(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Axis::Child),
            "descendant" => Some(Axis::Descendant),
            "descendant-or-self" => Some(Axis::DescendantOrSelf),
            "parent" => Some(Axis::Parent),
            "ancestor" => Some(Axis::Ancestor),
            "ancestor-or-self" => Some(Axis::AncestorOrSelf),
            "following-sibling" => Some(Axis::FollowingSibling),
            "preceding-sibling" => Some(Axis::PrecedingSibling),
            "following" => Some(Axis::Following),
            "preceding" => Some(Axis::Preceding),
            "self" => Some(Axis::SelfAxis),
            "attribute" => Some(Axis::Attribute),
            _ => None,
        }
    }

    /// Reverse axes number their nodes backwards from the context node.
    pub fn is_reverse(&self) -> bool {
        matches!(
            self,
            Axis::Ancestor | Axis::AncestorOrSelf | Axis::Preceding | Axis::PrecedingSibling
        )
    }
}

/// Node test in a location step.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// `*`: any node of the axis' principal type.
    Any,
    /// `name` or `prefix:name`.
    Name {
        prefix: Option<String>,
        local: String,
    },
    /// `prefix:*`.
    PrefixWildcard(String),
    /// `node()`.
    Node,
    /// `text()`.
    Text,
    /// `comment()`.
    Comment,
    /// `processing-instruction()` with an optional target.
    ProcessingInstruction(Option<String>),
}

/// Core functions understood by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Last,
    Position,
    Count,
    Not,
    True,
    False,
    Boolean,
    Number,
    String,
    Concat,
    Contains,
    StartsWith,
    StringLength,
    NormalizeSpace,
    Name,
    LocalName,
    NamespaceUri,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "last" => Function::Last,
            "position" => Function::Position,
            "count" => Function::Count,
            "not" => Function::Not,
            "true" => Function::True,
            "false" => Function::False,
            "boolean" => Function::Boolean,
            "number" => Function::Number,
            "string" => Function::String,
            "concat" => Function::Concat,
            "contains" => Function::Contains,
            "starts-with" => Function::StartsWith,
            "string-length" => Function::StringLength,
            "normalize-space" => Function::NormalizeSpace,
            "name" => Function::Name,
            "local-name" => Function::LocalName,
            "namespace-uri" => Function::NamespaceUri,
            _ => return None,
        })
    }

    /// Minimum and maximum argument count (`None` for unbounded).
    fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Function::Last | Function::Position | Function::True | Function::False => {
                (0, Some(0))
            }
            Function::Count | Function::Not | Function::Boolean => (1, Some(1)),
            Function::Number
            | Function::String
            | Function::StringLength
            | Function::NormalizeSpace
            | Function::Name
            | Function::LocalName
            | Function::NamespaceUri => (0, Some(1)),
            Function::Contains | Function::StartsWith => (2, Some(2)),
            Function::Concat => (2, None),
        }
    }
}

/// Selector parser.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Tokenizes `input` and prepares to parse it.
    pub fn new(input: &str) -> Result<Self, String> {
        Ok(Parser {
            tokens: tokenize(input)?,
            pos: 0,
        })
    }

    /// Parses a complete expression.
    pub fn parse(mut self) -> Result<Expr, String> {
        if self.tokens.is_empty() {
            return Err("empty expression".to_string());
        }
        let expr = self.parse_or_expr()?;
        match self.current() {
            None => Ok(expr),
            Some(token) => Err(format!("unexpected token {:?}", token)),
        }
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.current() == Some(token)
    }

    fn expect(&mut self, token: Token) -> Result<(), String> {
        match self.advance() {
            Some(t) if t == token => Ok(()),
            Some(t) => Err(format!("expected {:?}, found {:?}", token, t)),
            None => Err(format!("expected {:?}, found end of expression", token)),
        }
    }

    fn parse_or_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and_expr()?;
        while self.check(&Token::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::Or, Box::new(right));
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_equality_expr()?;
        while self.check(&Token::And) {
            self.advance();
            let right = self.parse_equality_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::And, Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_relational_expr()?;
        loop {
            let op = match self.current() {
                Some(Token::Eq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_relational_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_additive_expr()?;
        loop {
            let op = match self.current() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::LtEq) => BinaryOp::LtEq,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::GtEq) => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_multiplicative_expr()?;
        loop {
            let op = match self.current() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let op = match self.current() {
                Some(Token::Multiply) => BinaryOp::Mul,
                Some(Token::Div) => BinaryOp::Div,
                Some(Token::Mod) => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, String> {
        if self.check(&Token::Minus) {
            self.advance();
            let inner = self.parse_unary_expr()?;
            return Ok(Expr::Negate(Box::new(inner)));
        }
        self.parse_union_expr()
    }

    fn parse_union_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_path_expr()?;
        while self.check(&Token::Pipe) {
            self.advance();
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_path_expr(&mut self) -> Result<Expr, String> {
        match self.current() {
            Some(Token::LeftParen)
            | Some(Token::Literal(_))
            | Some(Token::Number(_))
            | Some(Token::FunctionName(_)) => {
                let primary = self.parse_primary_expr()?;
                let predicates = self.parse_predicates()?;
                let filter = if predicates.is_empty() {
                    primary
                } else {
                    Expr::Filter(Box::new(primary), predicates)
                };
                if matches!(self.current(), Some(Token::Slash) | Some(Token::DoubleSlash)) {
                    let mut steps = Vec::new();
                    self.parse_relative_path(&mut steps, true)?;
                    Ok(Expr::Path(PathExpr {
                        start: PathStart::Expr(Box::new(filter)),
                        steps,
                    }))
                } else {
                    Ok(filter)
                }
            }
            _ => self.parse_location_path(),
        }
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Some(Token::LeftParen) => {
                let inner = self.parse_or_expr()?;
                self.expect(Token::RightParen)?;
                Ok(inner)
            }
            Some(Token::Literal(s)) => Ok(Expr::Literal(s)),
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::FunctionName(name)) => self.parse_function_call(&name),
            other => Err(format!("unexpected token {:?}", other)),
        }
    }

    fn parse_function_call(&mut self, name: &str) -> Result<Expr, String> {
        let function =
            Function::from_name(name).ok_or_else(|| format!("unknown function '{}'", name))?;
        self.expect(Token::LeftParen)?;
        let mut args = Vec::new();
        if !self.check(&Token::RightParen) {
            loop {
                args.push(self.parse_or_expr()?);
                if self.check(&Token::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RightParen)?;

        let (min, max) = function.arity();
        if args.len() < min || max.is_some_and(|max| args.len() > max) {
            return Err(format!(
                "wrong number of arguments for '{}': {}",
                name,
                args.len()
            ));
        }
        Ok(Expr::Function(function, args))
    }

    fn parse_location_path(&mut self) -> Result<Expr, String> {
        let mut steps = Vec::new();
        let start = match self.current() {
            Some(Token::Slash) => {
                self.advance();
                if self.starts_step() {
                    self.parse_step_into(&mut steps)?;
                    self.parse_relative_path(&mut steps, false)?;
                }
                PathStart::Root
            }
            Some(Token::DoubleSlash) => {
                self.parse_relative_path(&mut steps, true)?;
                PathStart::Root
            }
            _ => {
                self.parse_step_into(&mut steps)?;
                self.parse_relative_path(&mut steps, false)?;
                PathStart::Context
            }
        };
        Ok(Expr::Path(PathExpr { start, steps }))
    }

    /// Parses `('/' | '//') Step` repetitions. With `require_first`, at least
    /// one separator must be present.
    fn parse_relative_path(&mut self, steps: &mut Vec<Step>, require_first: bool) -> Result<(), String> {
        let mut required = require_first;
        loop {
            match self.current() {
                Some(Token::Slash) => {
                    self.advance();
                }
                Some(Token::DoubleSlash) => {
                    self.advance();
                    steps.push(Step::descendant_or_self());
                }
                _ if required => return Err("expected '/' or '//'".to_string()),
                _ => return Ok(()),
            }
            required = false;
            self.parse_step_into(steps)?;
        }
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.current(),
            Some(Token::Name(_))
                | Some(Token::Star)
                | Some(Token::PrefixWildcard(_))
                | Some(Token::NodeType(_))
                | Some(Token::Axis(_))
                | Some(Token::At)
                | Some(Token::Dot)
                | Some(Token::DoubleDot)
        )
    }

    fn parse_step_into(&mut self, steps: &mut Vec<Step>) -> Result<(), String> {
        let step = match self.current() {
            Some(Token::Dot) => {
                self.advance();
                Step {
                    axis: Axis::SelfAxis,
                    node_test: NodeTest::Node,
                    predicates: Vec::new(),
                }
            }
            Some(Token::DoubleDot) => {
                self.advance();
                Step {
                    axis: Axis::Parent,
                    node_test: NodeTest::Node,
                    predicates: Vec::new(),
                }
            }
            _ => {
                let axis = match self.current() {
                    Some(Token::At) => {
                        self.advance();
                        Axis::Attribute
                    }
                    Some(Token::Axis(name)) => {
                        let axis = Axis::from_name(name)
                            .ok_or_else(|| format!("unsupported axis '{}'", name))?;
                        self.advance();
                        axis
                    }
                    _ => Axis::Child,
                };
                let node_test = self.parse_node_test()?;
                let predicates = self.parse_predicates()?;
                Step {
                    axis,
                    node_test,
                    predicates,
                }
            }
        };
        steps.push(step);
        Ok(())
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, String> {
        match self.advance() {
            Some(Token::Star) => Ok(NodeTest::Any),
            Some(Token::PrefixWildcard(prefix)) => Ok(NodeTest::PrefixWildcard(prefix)),
            Some(Token::Name(name)) => Ok(match name.split_once(':') {
                Some((prefix, local)) => NodeTest::Name {
                    prefix: Some(prefix.to_string()),
                    local: local.to_string(),
                },
                None => NodeTest::Name {
                    prefix: None,
                    local: name,
                },
            }),
            Some(Token::NodeType(kind)) => {
                self.expect(Token::LeftParen)?;
                let test = match kind.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    _ => match self.current() {
                        Some(Token::Literal(target)) => {
                            let target = target.clone();
                            self.advance();
                            NodeTest::ProcessingInstruction(Some(target))
                        }
                        _ => NodeTest::ProcessingInstruction(None),
                    },
                };
                self.expect(Token::RightParen)?;
                Ok(test)
            }
            Some(token) => Err(format!("expected a node test, found {:?}", token)),
            None => Err("expected a node test, found end of expression".to_string()),
        }
    }

    fn parse_predicates(&mut self) -> Result<Vec<Expr>, String> {
        let mut predicates = Vec::new();
        while self.check(&Token::LeftBracket) {
            self.advance();
            predicates.push(self.parse_or_expr()?);
            self.expect(Token::RightBracket)?;
        }
        Ok(predicates)
    }
}

/// Parses a selector expression.
pub fn parse(input: &str) -> Result<Expr, String> {
    Parser::new(input)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_test(local: &str) -> NodeTest {
        NodeTest::Name {
            prefix: None,
            local: local.to_string(),
        }
    }

    fn path(expr: Expr) -> PathExpr {
        match expr {
            Expr::Path(p) => p,
            other => panic!("expected path, got {other:?}"),
        }
    }

    #[test]
    fn test_absolute_path() {
        let p = path(parse("/root/a/text()").unwrap());
        assert_eq!(p.start, PathStart::Root);
        assert_eq!(p.steps.len(), 3);
        assert_eq!(p.steps[0].node_test, name_test("root"));
        assert_eq!(p.steps[2].node_test, NodeTest::Text);
        assert!(p.steps.iter().all(|s| s.axis == Axis::Child));
    }

    #[test]
    fn test_root_only() {
        let p = path(parse("/").unwrap());
        assert_eq!(p.start, PathStart::Root);
        assert!(p.steps.is_empty());
    }

    #[test]
    fn test_descendant_shorthand() {
        let p = path(parse("//item/@id").unwrap());
        assert_eq!(p.steps.len(), 3);
        assert_eq!(p.steps[0].axis, Axis::DescendantOrSelf);
        assert_eq!(p.steps[1].node_test, name_test("item"));
        assert_eq!(p.steps[2].axis, Axis::Attribute);
    }

    #[test]
    fn test_prefixed_step_with_predicate() {
        let p = path(parse("/f:repo/f:field[@id='7'][2]").unwrap());
        let step = &p.steps[1];
        assert_eq!(
            step.node_test,
            NodeTest::Name {
                prefix: Some("f".to_string()),
                local: "field".to_string()
            }
        );
        assert_eq!(step.predicates.len(), 2);
        assert_eq!(step.predicates[1], Expr::Number(2.0));
    }

    #[test]
    fn test_explicit_axes_and_abbreviations() {
        let p = path(parse("../preceding-sibling::b/.").unwrap());
        assert_eq!(p.start, PathStart::Context);
        assert_eq!(p.steps[0].axis, Axis::Parent);
        assert_eq!(p.steps[1].axis, Axis::PrecedingSibling);
        assert_eq!(p.steps[2].axis, Axis::SelfAxis);
    }

    #[test]
    fn test_filter_expression_path() {
        let p = path(parse("(/a/b)[last()]/c").unwrap());
        assert!(matches!(p.start, PathStart::Expr(ref e) if matches!(**e, Expr::Filter(_, _))));
        assert_eq!(p.steps.len(), 1);
    }

    #[test]
    fn test_operator_precedence() {
        let expr = parse("1 + 2 * 3 = 7 and true()").unwrap();
        match expr {
            Expr::Binary(left, BinaryOp::And, _) => match *left {
                Expr::Binary(sum, BinaryOp::Eq, _) => {
                    assert!(matches!(*sum, Expr::Binary(_, BinaryOp::Add, _)))
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_union() {
        assert!(matches!(parse("/a | /b").unwrap(), Expr::Union(_, _)));
    }

    #[test]
    fn test_errors() {
        assert!(parse("").is_err());
        assert!(parse("/a[").is_err());
        assert!(parse("/a]").is_err());
        assert!(parse("/a/").is_err());
        assert!(parse("foo()").is_err());
        assert!(parse("count()").is_err());
        assert!(parse("namespace::x").is_err());
        assert!(parse("/a/@").is_err());
    }
}
