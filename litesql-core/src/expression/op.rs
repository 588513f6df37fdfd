use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpType {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOpType {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOpType::Equal
                | BinaryOpType::NotEqual
                | BinaryOpType::Less
                | BinaryOpType::Greater
                | BinaryOpType::LessEqual
                | BinaryOpType::GreaterEqual
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOpType::And | BinaryOpType::Or)
    }

    /// SQL spelling.
    pub fn sql(&self) -> &'static str {
        match self {
            BinaryOpType::Addition => "+",
            BinaryOpType::Subtraction => "-",
            BinaryOpType::Multiplication => "*",
            BinaryOpType::Division => "/",
            BinaryOpType::Equal => "=",
            BinaryOpType::NotEqual => "<>",
            BinaryOpType::Less => "<",
            BinaryOpType::Greater => ">",
            BinaryOpType::LessEqual => "<=",
            BinaryOpType::GreaterEqual => ">=",
            BinaryOpType::And => "AND",
            BinaryOpType::Or => "OR",
        }
    }
}

impl Display for BinaryOpType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOpType::Addition => "Addition",
            BinaryOpType::Subtraction => "Subtraction",
            BinaryOpType::Multiplication => "Multiplication",
            BinaryOpType::Division => "Division",
            BinaryOpType::Equal => "Equal",
            BinaryOpType::NotEqual => "NotEqual",
            BinaryOpType::Less => "Less",
            BinaryOpType::Greater => "Greater",
            BinaryOpType::LessEqual => "LessEqual",
            BinaryOpType::GreaterEqual => "GreaterEqual",
            BinaryOpType::And => "And",
            BinaryOpType::Or => "Or",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpType {
    Negative,
    Not,
}

impl Display for UnaryOpType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOpType::Negative => "Negative",
            UnaryOpType::Not => "Not",
        })
    }
}

/// Methods with a SQL translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Contains,
    StartsWith,
    EndsWith,
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Contains => "Contains",
            Method::StartsWith => "StartsWith",
            Method::EndsWith => "EndsWith",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    ASC,
    DESC,
}

impl Order {
    pub fn sql(&self) -> &'static str {
        match self {
            Order::ASC => "ASC",
            Order::DESC => "DESC",
        }
    }
}
