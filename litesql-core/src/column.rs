use crate::{Method, Node, Value};
use std::borrow::Cow;

/// Reference to a persisted entity field.
///
/// `#[derive(Entity)]` emits one of these as an associated constant per persisted
/// field, so `Order::status` is the handle used to build predicates on it.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Storage column name.
    pub name: &'static str,
    /// Rust field name, the base for parameter names.
    pub field: &'static str,
    /// Table name.
    pub table: &'static str,
}

impl ColumnRef {
    /// Qualify the column with an explicit table alias, needed on the joined side of
    /// a join predicate.
    pub fn of(self, alias: impl Into<Cow<'static, str>>) -> Node {
        Node::Member {
            column: self,
            alias: Some(alias.into()),
        }
    }
    pub fn eq(self, value: impl Into<Node>) -> Node {
        Node::from(self).eq(value)
    }
    pub fn ne(self, value: impl Into<Node>) -> Node {
        Node::from(self).ne(value)
    }
    pub fn lt(self, value: impl Into<Node>) -> Node {
        Node::from(self).lt(value)
    }
    pub fn le(self, value: impl Into<Node>) -> Node {
        Node::from(self).le(value)
    }
    pub fn gt(self, value: impl Into<Node>) -> Node {
        Node::from(self).gt(value)
    }
    pub fn ge(self, value: impl Into<Node>) -> Node {
        Node::from(self).ge(value)
    }
    pub fn contains(self, value: impl Into<Node>) -> Node {
        Node::from(self).call(Method::Contains, value)
    }
    pub fn starts_with(self, value: impl Into<Node>) -> Node {
        Node::from(self).call(Method::StartsWith, value)
    }
    pub fn ends_with(self, value: impl Into<Node>) -> Node {
        Node::from(self).call(Method::EndsWith, value)
    }
    /// Membership test against a list of values, `values.contains(column)`.
    pub fn is_in(self, values: impl Into<Node>) -> Node {
        values.into().call(Method::Contains, self)
    }
    /// Nullable widening, as when comparing an optional field with a plain value.
    pub fn convert(self) -> Node {
        Node::Convert(Box::new(self.into()))
    }
}

/// Mapping metadata of one persisted field.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub column_ref: ColumnRef,
    /// Typed NULL describing the column type.
    pub value: Value,
    pub nullable: bool,
    pub primary_key: bool,
    /// Per-column override of the auto generated key setting, `None` defers to the
    /// entity and then to the client configuration.
    pub auto_increment: Option<bool>,
}

impl ColumnDef {
    pub fn name(&self) -> &'static str {
        self.column_ref.name
    }
    pub fn field(&self) -> &'static str {
        self.column_ref.field
    }
    pub fn table(&self) -> &'static str {
        self.column_ref.table
    }
}
