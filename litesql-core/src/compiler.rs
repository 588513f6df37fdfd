use crate::{
    BinaryOpType, ColumnRef, Dialect, LiteSqlError, Method, Node, NodeKind, ParameterNames,
    Result, SqlFragment, UnaryOpType, Value,
    writer::{Context, Fragment},
};

/// Compiles [`Node`] trees into SQL fragments with bound parameters.
///
/// The clause in the context selects the reading: predicates for filters, column
/// equalities for [`Fragment::SqlJoin`], a bare column for [`Fragment::SqlSelectOrderBy`].
/// Parameter names derive from the field name and are made unique against the names
/// already used by the statement.
pub struct ExpressionCompiler<'a> {
    dialect: &'a dyn Dialect,
    names: &'a mut ParameterNames,
    context: Context<'a>,
}

fn member(node: &Node) -> Option<(&ColumnRef, Option<&str>)> {
    match node {
        Node::Member { column, alias } => Some((column, alias.as_deref())),
        Node::Convert(inner) => member(inner),
        _ => None,
    }
}

fn error(kind: NodeKind, reason: impl Into<String>) -> crate::Error {
    LiteSqlError::compile(kind, reason).into()
}

impl<'a> ExpressionCompiler<'a> {
    pub fn new(dialect: &'a dyn Dialect, names: &'a mut ParameterNames, context: Context<'a>) -> Self {
        Self {
            dialect,
            names,
            context,
        }
    }

    pub fn compile(&mut self, node: &Node) -> Result<SqlFragment> {
        let mut out = SqlFragment::new();
        match self.context.fragment {
            Fragment::SqlJoin => self.write_join(&mut out, node)?,
            Fragment::SqlSelectOrderBy => {
                let (column, alias) = member(node).ok_or_else(|| {
                    error(node.kind(), "expected a column of the queried tables")
                })?;
                out.push_text(self.column(column, alias));
            }
            _ => self.write_predicate(&mut out, node)?,
        }
        Ok(out)
    }

    fn column(&self, column: &ColumnRef, alias: Option<&str>) -> String {
        let mut out = String::new();
        self.dialect
            .write_column_ref(&self.context, &mut out, alias, column);
        out
    }

    fn write_predicate(&mut self, out: &mut SqlFragment, node: &Node) -> Result<()> {
        match node {
            Node::Binary { op, lhs, rhs } if op.is_logical() => {
                out.push_text("(");
                self.write_predicate(out, lhs)?;
                out.push_text(format!(" {} ", op.sql()));
                self.write_predicate(out, rhs)?;
                out.push_text(")");
                Ok(())
            }
            Node::Binary { op, lhs, rhs } if op.is_comparison() => {
                self.write_comparison(out, *op, lhs, rhs)
            }
            Node::Binary { op, .. } => Err(error(
                NodeKind::Binary,
                format!("operator {} does not produce a condition", op),
            )),
            Node::Call {
                method,
                receiver,
                args,
            } => self.write_call(out, *method, receiver, args, false),
            Node::Unary {
                op: UnaryOpType::Not,
                node,
            } => self.write_not(out, node),
            Node::Unary { op, .. } => Err(error(
                NodeKind::Unary,
                format!("operator {} does not produce a condition", op),
            )),
            Node::Convert(inner) => self.write_predicate(out, inner),
            Node::Member { column, .. } => Err(error(
                NodeKind::Member,
                format!("column `{}` alone is not a condition", column.name),
            )),
            Node::Constant(..) | Node::New { .. } => {
                Err(error(node.kind(), "a value alone is not a condition"))
            }
        }
    }

    fn write_not(&mut self, out: &mut SqlFragment, node: &Node) -> Result<()> {
        match node {
            Node::Call {
                method,
                receiver,
                args,
            } => self.write_call(out, *method, receiver, args, true),
            Node::Unary {
                op: UnaryOpType::Not,
                node,
            } => self.write_predicate(out, node),
            Node::Convert(inner) => self.write_not(out, inner),
            _ => {
                out.push_text("NOT (");
                self.write_predicate(out, node)?;
                out.push_text(")");
                Ok(())
            }
        }
    }

    fn write_comparison(
        &mut self,
        out: &mut SqlFragment,
        op: BinaryOpType,
        lhs: &Node,
        rhs: &Node,
    ) -> Result<()> {
        let Some((column, alias)) = member(lhs) else {
            return Err(error(
                lhs.kind(),
                "the left operand of a comparison must be a column",
            ));
        };
        let value = self.evaluate(rhs)?;
        let mut text = self.column(column, alias);
        if value.is_null() {
            match op {
                BinaryOpType::Equal => text.push_str(" IS NULL"),
                BinaryOpType::NotEqual => text.push_str(" IS NOT NULL"),
                _ => {
                    return Err(error(
                        NodeKind::Constant,
                        format!("NULL cannot be compared with {}", op),
                    ));
                }
            }
            out.push_text(text);
            return Ok(());
        }
        text.push(' ');
        text.push_str(op.sql());
        text.push(' ');
        out.push_text(text);
        let name = self.names.claim(column.field);
        out.push_param(name, value);
        Ok(())
    }

    fn write_call(
        &mut self,
        out: &mut SqlFragment,
        method: Method,
        receiver: &Node,
        args: &[Node],
        negate: bool,
    ) -> Result<()> {
        let [arg] = args else {
            return Err(error(
                NodeKind::Call,
                format!("{} expects one argument, got {}", method, args.len()),
            ));
        };
        if let Some((column, alias)) = member(receiver) {
            let Value::Varchar(Some(text)) = self.evaluate(arg)? else {
                return Err(error(
                    NodeKind::Call,
                    format!("{} on column `{}` expects a text argument", method, column.name),
                ));
            };
            let pattern = match method {
                Method::Contains => self.dialect.for_contains(&text),
                Method::StartsWith => self.dialect.for_starts_with(&text),
                Method::EndsWith => self.dialect.for_ends_with(&text),
            };
            let mut sql = self.column(column, alias);
            sql.push_str(if negate { " NOT LIKE " } else { " LIKE " });
            out.push_text(sql);
            return out.splice(self.names, column.field, pattern);
        }
        if method != Method::Contains {
            return Err(error(
                NodeKind::Call,
                format!("{} needs a column as receiver", method),
            ));
        }
        let Some((column, alias)) = member(arg) else {
            return Err(error(
                arg.kind(),
                "the argument of a list membership test must be a column",
            ));
        };
        let Value::List(Some(items), ..) = self.evaluate(receiver)? else {
            return Err(error(
                receiver.kind(),
                "the receiver of a membership test must be a list of values",
            ));
        };
        if items.is_empty() {
            // Nothing is a member of an empty list.
            out.push_text(if negate { "1=1" } else { "1=0" });
            return Ok(());
        }
        let mut sql = self.column(column, alias);
        sql.push_str(if negate { " NOT IN " } else { " IN " });
        out.push_text(sql);
        let list = self.dialect.for_list(items);
        out.splice(self.names, column.field, list)
    }

    fn write_join(&mut self, out: &mut SqlFragment, node: &Node) -> Result<()> {
        match node {
            Node::Binary { op, lhs, rhs } if op.is_logical() => {
                out.push_text("(");
                self.write_join(out, lhs)?;
                out.push_text(format!(" {} ", op.sql()));
                self.write_join(out, rhs)?;
                out.push_text(")");
                Ok(())
            }
            Node::Binary { op, lhs, rhs } if op.is_comparison() => {
                let (Some((l, l_alias)), Some((r, r_alias))) = (member(lhs), member(rhs)) else {
                    return Err(error(
                        NodeKind::Binary,
                        "join conditions compare two columns",
                    ));
                };
                out.push_text(format!(
                    "{} {} {}",
                    self.column(l, l_alias),
                    op.sql(),
                    self.column(r, r_alias)
                ));
                Ok(())
            }
            Node::Convert(inner) => self.write_join(out, inner),
            _ => Err(error(
                node.kind(),
                "join conditions compare two columns",
            )),
        }
    }

    /// Value side of a comparison or method call.
    fn evaluate(&self, node: &Node) -> Result<Value> {
        match node {
            Node::Constant(value) => Ok(value.clone()),
            Node::Convert(inner) => self.evaluate(inner),
            Node::New {
                type_name,
                args,
                build,
            } => {
                let values = args
                    .iter()
                    .map(|v| self.evaluate(v))
                    .collect::<Result<Vec<_>>>()?;
                build(values).map_err(|e| {
                    error(
                        NodeKind::New,
                        format!("constructing {} failed: {:#}", type_name, e),
                    )
                })
            }
            Node::Member { column, .. } => Err(error(
                NodeKind::Member,
                format!("expected a value but found column `{}`", column.name),
            )),
            _ => Err(error(node.kind(), "cannot be evaluated to a value")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AsValue, MySql, Oracle, Postgres, Sqlite};
    use rust_decimal::Decimal;

    const ID: ColumnRef = ColumnRef {
        name: "id",
        field: "id",
        table: "orders",
    };
    const NAME: ColumnRef = ColumnRef {
        name: "customer_name",
        field: "name",
        table: "orders",
    };
    const USER_ID: ColumnRef = ColumnRef {
        name: "user_id",
        field: "user_id",
        table: "orders",
    };
    const USERS_ID: ColumnRef = ColumnRef {
        name: "id",
        field: "id",
        table: "users",
    };

    fn compile(dialect: &dyn Dialect, fragment: Fragment, node: Node) -> Result<(String, SqlFragment)> {
        let mut names = ParameterNames::new();
        let mut compiler = ExpressionCompiler::new(dialect, &mut names, Context::new(fragment, true, "t"));
        let result = compiler.compile(&node)?;
        Ok((result.render(dialect), result))
    }

    fn predicate(dialect: &dyn Dialect, node: Node) -> (String, SqlFragment) {
        compile(dialect, Fragment::SqlSelectWhere, node).expect("Failed to compile the predicate")
    }

    #[test]
    fn comparison_and_logic() {
        let (sql, fragment) = predicate(&Sqlite, ID.gt(5) & (NAME.eq("bob") | ID.le(2)));
        assert_eq!(
            sql,
            "(t.`id` > :id AND (t.`customer_name` = :name OR t.`id` <= :id1))"
        );
        let names = fragment.params().iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["id", "name", "id1"]);
        assert_eq!(fragment.params()[2].value, Value::Int32(Some(2)));
    }

    #[test]
    fn same_structure_across_dialects() {
        let node = || ID.ne(1) & NAME.starts_with("a");
        assert_eq!(
            predicate(&Sqlite, node()).0,
            "(t.`id` <> :id AND t.`customer_name` LIKE :name)"
        );
        assert_eq!(
            predicate(&Postgres, node()).0,
            "(t.\"id\" <> @id AND t.\"customer_name\" LIKE @name)"
        );
        assert_eq!(
            predicate(&MySql, node()).0,
            "(t.`id` <> @id AND t.`customer_name` LIKE @name)"
        );
        assert_eq!(
            predicate(&Oracle, node()).0,
            "(t.\"id\" <> :id AND t.\"customer_name\" LIKE :name)"
        );
    }

    #[test]
    fn null_comparisons_bind_nothing() {
        let (sql, fragment) = predicate(&Sqlite, NAME.eq(Option::<String>::None));
        assert_eq!(sql, "t.`customer_name` IS NULL");
        assert!(fragment.params().is_empty());
        let (sql, fragment) = predicate(&Sqlite, NAME.ne(Value::Null));
        assert_eq!(sql, "t.`customer_name` IS NOT NULL");
        assert!(fragment.params().is_empty());
        let error = compile(&Sqlite, Fragment::SqlSelectWhere, ID.gt(Value::Null)).unwrap_err();
        assert!(error.downcast_ref::<LiteSqlError>().unwrap().is_compile());
    }

    #[test]
    fn wildcard_goes_into_value() {
        let (sql, fragment) = predicate(&Postgres, NAME.contains("li"));
        assert_eq!(sql, "t.\"customer_name\" LIKE @name");
        assert_eq!(fragment.params()[0].value, Value::Varchar(Some("%li%".into())));
        let (sql, fragment) = predicate(&Sqlite, !NAME.ends_with("son"));
        assert_eq!(sql, "t.`customer_name` NOT LIKE :name");
        assert_eq!(fragment.params()[0].value, Value::Varchar(Some("%son".into())));
    }

    #[test]
    fn list_membership() {
        let (sql, fragment) = predicate(&Sqlite, ID.is_in(vec![7, 3, 9]));
        assert_eq!(sql, "t.`id` IN (:inParam0,:inParam1,:inParam2)");
        let values = fragment.params().iter().map(|p| p.value.clone()).collect::<Vec<_>>();
        assert_eq!(values, [7.as_value(), 3.as_value(), 9.as_value()]);
        let (sql, _) = predicate(&Postgres, !ID.is_in(vec![1]));
        assert_eq!(sql, "t.\"id\" NOT IN (@inParam0)");
        let (sql, fragment) = predicate(&Sqlite, ID.is_in(Vec::<i32>::new()));
        assert_eq!(sql, "1=0");
        assert!(fragment.params().is_empty());
    }

    #[test]
    fn two_lists_in_one_predicate() {
        let (sql, fragment) =
            predicate(&Sqlite, ID.is_in(vec![1, 2]) | USER_ID.is_in(vec![3, 4]));
        assert_eq!(
            sql,
            "(t.`id` IN (:inParam0,:inParam1) OR t.`user_id` IN (:inParam01,:inParam11))"
        );
        assert_eq!(fragment.params().len(), 4);
    }

    #[test]
    fn join_mode() {
        let (sql, fragment) = compile(
            &Sqlite,
            Fragment::SqlJoin,
            USER_ID.eq(USERS_ID.of("u")),
        )
        .unwrap();
        assert_eq!(sql, "t.`user_id` = u.`id`");
        assert!(fragment.params().is_empty());
        assert!(compile(&Sqlite, Fragment::SqlJoin, USER_ID.eq(5)).is_err());
    }

    #[test]
    fn order_member() {
        let (sql, _) = compile(&Oracle, Fragment::SqlSelectOrderBy, NAME.into()).unwrap();
        assert_eq!(sql, "t.\"customer_name\"");
        assert!(compile(&Oracle, Fragment::SqlSelectOrderBy, Node::value(1)).is_err());
    }

    #[test]
    fn convert_and_new() {
        fn decimal(args: Vec<Value>) -> Result<Value> {
            let [mantissa, scale] = <[Value; 2]>::try_from(args)
                .map_err(|_| crate::Error::msg("expected two arguments"))?;
            Ok(Decimal::new(i64::try_from_value(mantissa)?, u32::try_from_value(scale)?).as_value())
        }
        let price = ColumnRef {
            name: "price",
            field: "price",
            table: "orders",
        };
        let node = price
            .convert()
            .ge(Node::construct("Decimal", vec![Node::value(1250i64), Node::value(2u32)], decimal));
        let (sql, fragment) = predicate(&Sqlite, node);
        assert_eq!(sql, "t.`price` >= :price");
        assert_eq!(fragment.params()[0].value, Decimal::new(1250, 2).as_value());
    }

    #[test]
    fn unsupported_shapes() {
        let kind = |node: Node| {
            match compile(&Sqlite, Fragment::SqlSelectWhere, node)
                .unwrap_err()
                .downcast_ref::<LiteSqlError>()
            {
                Some(LiteSqlError::Compile { kind, .. }) => *kind,
                other => panic!("Unexpected error {:?}", other),
            }
        };
        assert_eq!(kind(ID.into()), NodeKind::Member);
        assert_eq!(kind(Node::from(ID).binary(BinaryOpType::Addition, 1)), NodeKind::Binary);
        assert_eq!(kind(Node::value(3).eq(ID)), NodeKind::Constant);
        assert_eq!(kind(ID.eq(NAME)), NodeKind::Member);
        assert_eq!(kind(Node::value(vec![1]).call(Method::StartsWith, ID)), NodeKind::Call);
    }

    #[test]
    fn negated_comparison() {
        let (sql, _) = predicate(&Sqlite, !(ID.eq(1) & NAME.eq("x")));
        assert_eq!(sql, "NOT ((t.`id` = :id AND t.`customer_name` = :name))");
        let (sql, _) = predicate(&Sqlite, !!NAME.contains("x"));
        assert_eq!(sql, "t.`customer_name` LIKE :name");
    }
}
