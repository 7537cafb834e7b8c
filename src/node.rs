use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// One node of a boolean circuit.
///
/// A node is either a leaf carrying a constant, or an operator over an
/// ordered sequence of child nodes. Children are [`Arc`]-shared so that
/// concurrently running evaluation tasks can reference the same subtree
/// without copying or locking: nodes are immutable once constructed.
#[derive(Debug, Clone)]
pub enum Node {
    Leaf(bool),
    Not(Arc<Node>),
    And(Vec<Arc<Node>>),
    Or(Vec<Arc<Node>>),
    If(Arc<Node>, Arc<Node>, Arc<Node>),
    /// True iff more than `k` arguments are true.
    Gt(usize, Vec<Arc<Node>>),
    /// True iff fewer than `k` arguments are true.
    Lt(usize, Vec<Arc<Node>>),
}

// Constructors
impl Node {
    pub fn leaf(value: bool) -> Arc<Node> {
        Arc::new(Node::Leaf(value))
    }

    pub fn not(arg: Arc<Node>) -> Arc<Node> {
        Arc::new(Node::Not(arg))
    }

    pub fn and(args: Vec<Arc<Node>>) -> Arc<Node> {
        assert!(args.len() >= 2, "AND requires at least 2 arguments");
        Arc::new(Node::And(args))
    }

    pub fn or(args: Vec<Arc<Node>>) -> Arc<Node> {
        assert!(args.len() >= 2, "OR requires at least 2 arguments");
        Arc::new(Node::Or(args))
    }

    pub fn ite(condition: Arc<Node>, then: Arc<Node>, other: Arc<Node>) -> Arc<Node> {
        Arc::new(Node::If(condition, then, other))
    }

    pub fn gt(threshold: usize, args: Vec<Arc<Node>>) -> Arc<Node> {
        assert!(!args.is_empty(), "GT requires at least 1 argument");
        Arc::new(Node::Gt(threshold, args))
    }

    pub fn lt(threshold: usize, args: Vec<Arc<Node>>) -> Arc<Node> {
        assert!(!args.is_empty(), "LT requires at least 1 argument");
        Arc::new(Node::Lt(threshold, args))
    }
}

// Checks
impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn join(f: &mut Formatter<'_>, args: &[Arc<Node>]) -> std::fmt::Result {
            for (i, a) in args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", a)?;
            }
            Ok(())
        }

        match self {
            Node::Leaf(v) => write!(f, "{}", v),
            Node::Not(a) => write!(f, "NOT({})", a),
            Node::And(args) => {
                write!(f, "AND(")?;
                join(f, args)?;
                write!(f, ")")
            }
            Node::Or(args) => {
                write!(f, "OR(")?;
                join(f, args)?;
                write!(f, ")")
            }
            Node::If(c, t, e) => write!(f, "IF({}, {}, {})", c, t, e),
            Node::Gt(k, args) => {
                write!(f, "GT_{}(", k)?;
                join(f, args)?;
                write!(f, ")")
            }
            Node::Lt(k, args) => {
                write!(f, "LT_{}(", k)?;
                join(f, args)?;
                write!(f, ")")
            }
        }
    }
}

/// An immutable boolean circuit, identified by its root node.
///
/// Shared read-only by all concurrently running evaluation tasks.
#[derive(Debug, Clone)]
pub struct Circuit {
    root: Arc<Node>,
}

impl Circuit {
    pub fn new(root: Arc<Node>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }
}

impl Display for Circuit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf() {
        let t = Node::leaf(true);
        assert!(t.is_leaf());
        assert_eq!(t.to_string(), "true");
    }

    #[test]
    fn test_display() {
        let c = Node::gt(2, vec![Node::leaf(true), Node::not(Node::leaf(false))]);
        assert_eq!(c.to_string(), "GT_2(true, NOT(false))");
    }

    #[test]
    fn test_shared_subtree() {
        let shared = Node::and(vec![Node::leaf(true), Node::leaf(false)]);
        let c = Circuit::new(Node::or(vec![shared.clone(), shared]));
        assert_eq!(c.to_string(), "OR(AND(true, false), AND(true, false))");
    }

    #[test]
    #[should_panic(expected = "at least 2")]
    fn test_and_arity() {
        Node::and(vec![Node::leaf(true)]);
    }
}
