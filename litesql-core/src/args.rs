use crate::{AsValue, SqlValue, Value};

/// One template argument: a plain value or SQL that travels with its value.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Value),
    Sql(SqlValue),
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<SqlValue> for Arg {
    fn from(value: SqlValue) -> Self {
        Arg::Sql(value)
    }
}

impl<T: AsValue> From<T> for Arg {
    fn from(value: T) -> Self {
        Arg::Value(value.as_value())
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Value(value.into())
    }
}

/// Named template arguments, looked up by placeholder name.
///
/// ```rust
/// use litesql_core::{Arg, bag};
/// let args = bag! { "status" => 2, "name" => "bob" };
/// assert_eq!(args.get("status"), Some(&Arg::from(2)));
/// ```
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Bag(Vec<(String, Arg)>);

impl Bag {
    pub fn new() -> Self {
        Default::default()
    }

    /// Set `name`, replacing a previous value with the same name.
    pub fn insert(&mut self, name: &str, value: impl Into<Arg>) -> &mut Self {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k == name) {
            Some((_, current)) => *current = value,
            None => self.0.push((name.to_owned(), value)),
        }
        self
    }

    pub fn with(mut self, name: &str, value: impl Into<Arg>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arg> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[macro_export]
macro_rules! bag {
    ($($name:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut bag = $crate::Bag::new();
        $(bag.insert($name, $value);)*
        bag
    }};
}

/// Arguments of one template, matched to placeholders by position or by name.
#[derive(Debug, Clone)]
pub enum Args {
    Positional(Vec<Arg>),
    Named(Bag),
}

impl Args {
    pub fn is_empty(&self) -> bool {
        match self {
            Args::Positional(v) => v.is_empty(),
            Args::Named(v) => v.is_empty(),
        }
    }
}

pub trait IntoArgs {
    fn into_args(self) -> Args;
}

impl IntoArgs for Args {
    fn into_args(self) -> Args {
        self
    }
}

impl IntoArgs for () {
    fn into_args(self) -> Args {
        Args::Positional(Vec::new())
    }
}

impl IntoArgs for Bag {
    fn into_args(self) -> Args {
        Args::Named(self)
    }
}

impl IntoArgs for Vec<Arg> {
    fn into_args(self) -> Args {
        Args::Positional(self)
    }
}

macro_rules! impl_into_args_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<Arg>),+> IntoArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_args(self) -> Args {
                let ($($name,)+) = self;
                Args::Positional(vec![$($name.into()),+])
            }
        }
    };
}

impl_into_args_tuple!(A);
impl_into_args_tuple!(A, B);
impl_into_args_tuple!(A, B, C);
impl_into_args_tuple!(A, B, C, D);
impl_into_args_tuple!(A, B, C, D, E);
impl_into_args_tuple!(A, B, C, D, E, F);
impl_into_args_tuple!(A, B, C, D, E, F, G);
impl_into_args_tuple!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bag_replaces() {
        let mut bag = bag! { "a" => 1, "b" => "x" };
        bag.insert("a", 2i64);
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get("a"), Some(&Arg::Value(Value::Int64(Some(2)))));
        assert_eq!(bag.get("c"), None);
    }

    #[test]
    fn tuples() {
        let Args::Positional(args) = (1, "a", SqlValue::bound(2.5)).into_args() else {
            panic!("Expected positional arguments");
        };
        assert_eq!(args.len(), 3);
        assert!(matches!(args[2], Arg::Sql(..)));
        assert!(().into_args().is_empty());
    }
}
