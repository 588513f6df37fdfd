use crate::{AsValue, BinaryOpType, ColumnRef, Method, Result, UnaryOpType, Value};
use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
    ops::{BitAnd, BitOr, Not},
};

/// Predicate, projection and ordering tree consumed by [`crate::ExpressionCompiler`].
///
/// Trees are usually built from the column constants generated by `#[derive(Entity)]`:
///
/// ```rust
/// use litesql_core::{ColumnRef, Node};
/// const STATUS: ColumnRef = ColumnRef { name: "status", field: "status", table: "orders" };
/// const AMOUNT: ColumnRef = ColumnRef { name: "amount", field: "amount", table: "orders" };
/// let predicate = STATUS.eq(1) & (AMOUNT.gt(100) | !STATUS.is_in(vec![3, 4]));
/// assert!(matches!(predicate, Node::Binary { .. }));
/// ```
#[derive(Debug, Clone)]
pub enum Node {
    /// A column, optionally qualified with an explicit alias.
    Member {
        column: ColumnRef,
        alias: Option<Cow<'static, str>>,
    },
    Constant(Value),
    Binary {
        op: BinaryOpType,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Call {
        method: Method,
        receiver: Box<Node>,
        args: Vec<Node>,
    },
    /// Value constructed from argument values when the tree is compiled.
    New {
        type_name: &'static str,
        args: Vec<Node>,
        build: fn(Vec<Value>) -> Result<Value>,
    },
    /// Transparent conversion, typically nullable widening.
    Convert(Box<Node>),
    Unary {
        op: UnaryOpType,
        node: Box<Node>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Member,
    Constant,
    Binary,
    Call,
    New,
    Convert,
    Unary,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Member => "member access",
            NodeKind::Constant => "constant",
            NodeKind::Binary => "binary",
            NodeKind::Call => "method call",
            NodeKind::New => "constructor",
            NodeKind::Convert => "conversion",
            NodeKind::Unary => "unary",
        })
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Member { .. } => NodeKind::Member,
            Node::Constant(..) => NodeKind::Constant,
            Node::Binary { .. } => NodeKind::Binary,
            Node::Call { .. } => NodeKind::Call,
            Node::New { .. } => NodeKind::New,
            Node::Convert(..) => NodeKind::Convert,
            Node::Unary { .. } => NodeKind::Unary,
        }
    }

    pub fn value(value: impl Into<Value>) -> Node {
        Node::Constant(value.into())
    }

    /// Value built at compile time from `args`.
    pub fn construct(
        type_name: &'static str,
        args: Vec<Node>,
        build: fn(Vec<Value>) -> Result<Value>,
    ) -> Node {
        Node::New {
            type_name,
            args,
            build,
        }
    }

    pub fn binary(self, op: BinaryOpType, rhs: impl Into<Node>) -> Node {
        Node::Binary {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs.into()),
        }
    }

    pub fn call(self, method: Method, arg: impl Into<Node>) -> Node {
        Node::Call {
            method,
            receiver: Box::new(self),
            args: vec![arg.into()],
        }
    }

    pub fn eq(self, rhs: impl Into<Node>) -> Node {
        self.binary(BinaryOpType::Equal, rhs)
    }
    pub fn ne(self, rhs: impl Into<Node>) -> Node {
        self.binary(BinaryOpType::NotEqual, rhs)
    }
    pub fn lt(self, rhs: impl Into<Node>) -> Node {
        self.binary(BinaryOpType::Less, rhs)
    }
    pub fn le(self, rhs: impl Into<Node>) -> Node {
        self.binary(BinaryOpType::LessEqual, rhs)
    }
    pub fn gt(self, rhs: impl Into<Node>) -> Node {
        self.binary(BinaryOpType::Greater, rhs)
    }
    pub fn ge(self, rhs: impl Into<Node>) -> Node {
        self.binary(BinaryOpType::GreaterEqual, rhs)
    }
    pub fn and(self, rhs: impl Into<Node>) -> Node {
        self.binary(BinaryOpType::And, rhs)
    }
    pub fn or(self, rhs: impl Into<Node>) -> Node {
        self.binary(BinaryOpType::Or, rhs)
    }
}

impl From<ColumnRef> for Node {
    fn from(column: ColumnRef) -> Self {
        Node::Member {
            column,
            alias: None,
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::Constant(value)
    }
}

impl<T: AsValue> From<T> for Node {
    fn from(value: T) -> Self {
        Node::Constant(value.as_value())
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Constant(value.into())
    }
}

impl Not for Node {
    type Output = Node;
    fn not(self) -> Node {
        Node::Unary {
            op: UnaryOpType::Not,
            node: Box::new(self),
        }
    }
}

impl BitAnd for Node {
    type Output = Node;
    fn bitand(self, rhs: Node) -> Node {
        self.and(rhs)
    }
}

impl BitOr for Node {
    type Output = Node;
    fn bitor(self, rhs: Node) -> Node {
        self.or(rhs)
    }
}
