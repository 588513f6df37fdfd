use crate::{
    Arg, Args, AsValue, Dialect, Entity, Error, Executor, ExpressionCompiler, IntoArgs,
    LiteSqlError, Node, NodeKind, Order, ParameterBinding, ParameterNames, Result, RowSet,
    RowsAffected, SqlFragment, SqlValue, Token, format_positional, placeholder_names,
    scan_template, separated_by,
    dialect::{page_bounds, with_order_by},
    writer::{Context, Fragment},
};
use std::{
    borrow::Cow,
    collections::HashMap,
    fmt::{self, Debug, Display, Formatter, Write},
    marker::PhantomData,
    sync::Arc,
};
use time::PrimitiveDateTime;

/// One page of rows together with the totals of the unpaged statement.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<E> {
    pub rows: Vec<E>,
    pub total_rows: u64,
    /// `(total_rows - 1) / page_size + 1`, so one page even when there are no rows.
    pub total_pages: u64,
}

/// Incremental SQL statement with its parameters.
///
/// Templates are appended piece by piece, each placeholder becoming a binding whose
/// name is unique within the statement. Typed builders (`E: Entity`) also compile
/// predicates and orderings from [`Node`] trees. Terminal operations render the
/// statement for the dialect and send it to an [`Executor`].
pub struct QueryBuilder<E = ()> {
    dialect: Arc<dyn Dialect>,
    body: SqlFragment,
    names: ParameterNames,
    order_by: String,
    alias: Cow<'static, str>,
    qualify_columns: bool,
    entity: PhantomData<fn() -> E>,
}

impl<E> Debug for QueryBuilder<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("dialect", &self.dialect.name())
            .field("body", &self.body)
            .field("order_by", &self.order_by)
            .field("alias", &self.alias)
            .finish()
    }
}

impl QueryBuilder<()> {
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            body: SqlFragment::new(),
            names: ParameterNames::new(),
            order_by: String::new(),
            alias: Cow::Borrowed("t"),
            qualify_columns: true,
            entity: PhantomData,
        }
    }
}

impl<E> QueryBuilder<E> {
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Same statement, rows mapped to `T`.
    pub fn with_entity<T>(self) -> QueryBuilder<T> {
        QueryBuilder {
            dialect: self.dialect,
            body: self.body,
            names: self.names,
            order_by: self.order_by,
            alias: self.alias,
            qualify_columns: self.qualify_columns,
            entity: PhantomData,
        }
    }

    /// Alias used for columns that don't specify one.
    pub fn with_alias(mut self, alias: impl Into<Cow<'static, str>>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn params(&self) -> &[ParameterBinding] {
        self.body.params()
    }

    /// Append a template, binding its placeholders.
    ///
    /// Positional arguments bind the distinct placeholders in order of first
    /// appearance, a [`crate::Bag`] binds them by name. A placeholder repeated inside
    /// the template refers to a single binding.
    pub fn append(&mut self, template: &str, args: impl IntoArgs) -> Result<&mut Self> {
        let tokens = scan_template(template.trim());
        let names = placeholder_names(&tokens)
            .into_iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        let args = args.into_args();
        if names.is_empty() && !args.is_empty() {
            return Err(LiteSqlError::RawTemplateViolation(format!(
                "values were provided for `{}` which has no placeholders",
                template.trim()
            ))
            .into());
        }
        let mut resolved = match args {
            Args::Positional(values) => {
                if values.len() < names.len() {
                    return Err(LiteSqlError::ParameterCount(format!(
                        "`{}` has {} placeholders but {} values were provided",
                        template.trim(),
                        names.len(),
                        values.len()
                    ))
                    .into());
                }
                if values.len() > names.len() {
                    log::debug!(
                        "Ignoring {} extra values for `{}`",
                        values.len() - names.len(),
                        template.trim()
                    );
                }
                names.iter().cloned().zip(values).collect::<HashMap<_, _>>()
            }
            Args::Named(bag) => names
                .iter()
                .map(|name| match bag.get(name) {
                    Some(v) => Ok((name.clone(), v.clone())),
                    None => Err(Error::from(LiteSqlError::ParameterCount(format!(
                        "no value named `{}` for `{}`",
                        name,
                        template.trim()
                    )))),
                })
                .collect::<Result<HashMap<_, _>>>()?,
        };
        let mut piece = SqlFragment::new();
        let mut emitted = HashMap::<String, Vec<Token>>::new();
        piece.push_text(" ");
        for token in tokens {
            let Token::Param(name) = token else {
                piece.push_tokens([token]);
                continue;
            };
            if let Some(tokens) = emitted.get(&name) {
                piece.push_tokens(tokens.iter().cloned());
                continue;
            }
            let mut value = SqlFragment::new();
            match resolved.remove(&name) {
                Some(Arg::Value(v)) => {
                    value.push_param(self.names.claim(&name), v);
                }
                Some(Arg::Sql(v)) => value.splice(&mut self.names, &name, v)?,
                None => {
                    log::error!("Placeholder `{}` was not resolved", name);
                }
            }
            emitted.insert(name, value.tokens().to_vec());
            piece.extend(value);
        }
        self.body.extend(piece);
        Ok(self)
    }

    pub fn append_if(
        &mut self,
        condition: bool,
        template: &str,
        args: impl IntoArgs,
    ) -> Result<&mut Self> {
        if condition {
            self.append(template, args)?;
        }
        Ok(self)
    }

    /// Like [`QueryBuilder::append_if`] but the arguments are computed only when
    /// `condition` holds.
    pub fn append_if_with<A: IntoArgs>(
        &mut self,
        condition: bool,
        template: &str,
        args: impl FnOnce() -> A,
    ) -> Result<&mut Self> {
        if condition {
            self.append(template, args())?;
        }
        Ok(self)
    }

    /// Append text with `{0}`, `{1}` replaced by `args`, no parameter is bound.
    pub fn append_format(&mut self, template: &str, args: &[&dyn Display]) -> Result<&mut Self> {
        let text = format_positional(template.trim(), args)?;
        self.body.push_text(" ").push_text(text);
        Ok(self)
    }

    /// Append `prefix (sub)`, renaming the bindings of `sub` that collide with the
    /// ones already here.
    pub fn append_subquery(&mut self, prefix: &str, sub: impl Into<SqlFragment>) -> &mut Self {
        let mut sub = sub.into();
        sub.claim_names(&mut self.names);
        self.body.push_text(format!(" {} (", prefix.trim()));
        self.body.extend(sub);
        self.body.push_text(")");
        self
    }

    pub fn for_contains(&self, value: &str) -> SqlValue {
        self.dialect.for_contains(value)
    }

    pub fn for_starts_with(&self, value: &str) -> SqlValue {
        self.dialect.for_starts_with(value)
    }

    pub fn for_ends_with(&self, value: &str) -> SqlValue {
        self.dialect.for_ends_with(value)
    }

    pub fn for_date_time(&self, value: PrimitiveDateTime) -> Result<SqlValue> {
        self.dialect.for_date_time(value)
    }

    pub fn for_list<T: AsValue>(&self, values: impl IntoIterator<Item = T>) -> SqlValue {
        self.dialect
            .for_list(values.into_iter().map(AsValue::as_value).collect())
    }

    fn compile(&mut self, fragment: Fragment, node: &Node) -> Result<SqlFragment> {
        let context = Context::new(fragment, self.qualify_columns, &self.alias);
        ExpressionCompiler::new(self.dialect.as_ref(), &mut self.names, context).compile(node)
    }

    /// Append ` AND (predicate)`.
    pub fn filter(&mut self, predicate: impl Into<Node>) -> Result<&mut Self> {
        let fragment = if self.qualify_columns {
            Fragment::SqlSelectWhere
        } else {
            Fragment::SqlDeleteWhere
        };
        let predicate = self.compile(fragment, &predicate.into())?;
        self.body.push_text(" AND (");
        self.body.extend(predicate);
        self.body.push_text(")");
        Ok(self)
    }

    pub fn filter_if(&mut self, condition: bool, predicate: impl Into<Node>) -> Result<&mut Self> {
        if condition {
            self.filter(predicate)?;
        }
        Ok(self)
    }

    /// Join `U` under `alias`. Columns of `U` in `predicate` must carry the alias,
    /// see [`crate::ColumnRef::of`].
    ///
    /// Filters applied before the join move after it, into the new `WHERE 1=1` clause.
    pub fn left_join<U: Entity>(
        &mut self,
        alias: &str,
        predicate: impl Into<Node>,
    ) -> Result<&mut Self> {
        let predicate = self.compile(Fragment::SqlJoin, &predicate.into())?;
        let filters = self.body.take_filter_clause();
        if filters.is_none() {
            log::debug!("Joining `{}` on a statement without filter clause", U::table_name());
        }
        let mut text = String::from(" LEFT JOIN ");
        self.dialect
            .write_table_ref(&mut text, U::table_name(), Some(alias));
        text.push_str(" ON ");
        self.body.push_text(text);
        self.body.extend(predicate);
        self.body.push_sentinel();
        self.body.push_tokens(filters.into_iter().flatten());
        Ok(self)
    }

    /// Select `source`, usually a column of a joined table, as the column of
    /// `target`. The selected value replaces the one of the main table.
    ///
    /// `SELECT t.a, t.b FROM x t` with `u.c` as `b` becomes `SELECT t.a, u.c AS b FROM x t`.
    pub fn select_join(
        &mut self,
        source: impl Into<Node>,
        target: impl Into<Node>,
    ) -> Result<&mut Self> {
        let target = target.into();
        let source = self
            .compile(Fragment::SqlSelectOrderBy, &source.into())?
            .render(self.dialect.as_ref());
        let replaced = self
            .compile(Fragment::SqlSelectOrderBy, &target)?
            .render(self.dialect.as_ref());
        let context = Context::new(Fragment::SqlSelectOrderBy, false, &self.alias);
        let label = ExpressionCompiler::new(self.dialect.as_ref(), &mut self.names, context)
            .compile(&target)?
            .render(self.dialect.as_ref());
        let found = self.body.edit_select_list(|items| {
            items.retain(|v| *v != replaced);
            items.push(format!("{} AS {}", source, label));
        });
        if !found {
            return Err(LiteSqlError::compile(
                NodeKind::Member,
                format!("selecting {} as {} needs a SELECT ... FROM statement", source, label),
            )
            .into());
        }
        Ok(self)
    }

    pub fn order_by(&mut self, member: impl Into<Node>) -> Result<&mut Self> {
        self.push_order(member.into(), Order::ASC)
    }

    pub fn order_by_descending(&mut self, member: impl Into<Node>) -> Result<&mut Self> {
        self.push_order(member.into(), Order::DESC)
    }

    fn push_order(&mut self, member: Node, order: Order) -> Result<&mut Self> {
        let column = self
            .compile(Fragment::SqlSelectOrderBy, &member)?
            .render(self.dialect.as_ref());
        self.order_by.push_str(if self.order_by.is_empty() {
            "ORDER BY "
        } else {
            ", "
        });
        let _ = write!(self.order_by, "{} {}", column, order.sql());
        Ok(self)
    }

    /// Whole statement, ordering included.
    pub fn build(&self) -> SqlFragment {
        let mut result = self.body.clone();
        if !self.order_by.is_empty() {
            result.push_text(" ").push_text(&self.order_by);
        }
        result.trim();
        result
    }

    /// Statement text for the dialect.
    pub fn sql(&self) -> String {
        self.build().render(self.dialect.as_ref())
    }

    fn body_sql(&self) -> String {
        self.body.render(self.dialect.as_ref()).trim().to_owned()
    }

    pub async fn fetch_rows<Exec: Executor>(&self, executor: &mut Exec) -> Result<RowSet> {
        executor
            .run(self.sql(), self.body.params().to_vec())
            .await
    }

    /// Scalar result, the first column of the first row (`NULL` if there are none).
    pub async fn scalar<T: AsValue, Exec: Executor>(&self, executor: &mut Exec) -> Result<T> {
        let value = self.fetch_rows(executor).await?.scalar().unwrap_or_default();
        T::try_from_value(value)
    }

    /// Whether the statement returns a non null scalar.
    pub async fn exists<Exec: Executor>(&self, executor: &mut Exec) -> Result<bool> {
        Ok(self
            .fetch_rows(executor)
            .await?
            .scalar()
            .is_some_and(|v| !v.is_null()))
    }

    /// Number of rows the statement returns.
    pub async fn count<Exec: Executor>(&self, executor: &mut Exec) -> Result<u64> {
        let sql = self
            .dialect
            .count_sql(&with_order_by(&self.body_sql(), &self.order_by));
        let value = executor
            .run(sql, self.body.params().to_vec())
            .await?
            .scalar()
            .unwrap_or_default();
        Ok(Option::<u64>::try_from_value(value)?.unwrap_or_default())
    }

    /// Row count and number of pages of `page_size` rows.
    pub async fn count_with_page_count<Exec: Executor>(
        &self,
        executor: &mut Exec,
        page_size: u64,
    ) -> Result<(u64, u64)> {
        if page_size == 0 {
            return Err(LiteSqlError::PageSize("page size must be at least 1".into()).into());
        }
        let count = self.count(executor).await?;
        Ok((count, count.saturating_sub(1) / page_size + 1))
    }

    pub async fn execute<Exec: Executor>(&self, executor: &mut Exec) -> Result<RowsAffected> {
        Ok(self.fetch_rows(executor).await?.rows_affected())
    }
}

impl<E: Entity> QueryBuilder<E> {
    /// Builder for `E` without any text.
    pub fn for_entity(dialect: Arc<dyn Dialect>) -> Self {
        QueryBuilder::new(dialect).with_entity()
    }

    /// Builder holding only a filter clause, for statements whose columns are not
    /// qualified (`DELETE`).
    pub fn condition(dialect: Arc<dyn Dialect>) -> Self {
        let mut result = Self::for_entity(dialect);
        result.qualify_columns = false;
        result.body.push_sentinel();
        result
    }

    /// `SELECT alias.c0, alias.c1 FROM table alias WHERE 1=1`.
    pub fn select(&mut self, alias: impl Into<Cow<'static, str>>) -> &mut Self {
        self.alias = alias.into();
        self.qualify_columns = true;
        let context = Context::new(Fragment::None, true, &self.alias);
        let mut text = String::from(" SELECT ");
        separated_by(
            &mut text,
            E::columns(),
            |out, c| {
                self.dialect
                    .write_column_ref(&context, out, None, &c.column_ref)
            },
            ", ",
        );
        text.push_str(" FROM ");
        self.dialect
            .write_table_ref(&mut text, E::table_name(), Some(&*self.alias));
        self.body.push_text(text).push_sentinel();
        self
    }

    pub async fn fetch_list<Exec: Executor>(&self, executor: &mut Exec) -> Result<Vec<E>> {
        self.fetch_rows(executor)
            .await?
            .into_labeled()
            .map(E::from_row)
            .collect()
    }

    pub async fn fetch_one<Exec: Executor>(&self, executor: &mut Exec) -> Result<Option<E>> {
        self.fetch_rows(executor)
            .await?
            .into_labeled()
            .next()
            .map(E::from_row)
            .transpose()
    }

    /// Rows of page `page` (starting at 1) of `page_size` rows.
    pub async fn fetch_page<Exec: Executor>(
        &self,
        executor: &mut Exec,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<E>> {
        check_page(page, page_size)?;
        let sql = self
            .dialect
            .page_sql(&self.body_sql(), &self.order_by, page_size, page)?;
        executor
            .run(sql, self.body.params().to_vec())
            .await?
            .into_labeled()
            .map(E::from_row)
            .collect()
    }

    /// Page rows together with the totals.
    pub async fn fetch_paged<Exec: Executor>(
        &self,
        executor: &mut Exec,
        page: u64,
        page_size: u64,
    ) -> Result<PageResult<E>> {
        check_page(page, page_size)?;
        let (total_rows, total_pages) = self.count_with_page_count(executor, page_size).await?;
        let rows = self.fetch_page(executor, page, page_size).await?;
        Ok(PageResult {
            rows,
            total_rows,
            total_pages,
        })
    }

    /// `DELETE FROM table` followed by the filter clause of a [`QueryBuilder::condition`].
    pub async fn delete<Exec: Executor>(&self, executor: &mut Exec) -> Result<RowsAffected> {
        if self.qualify_columns {
            return Err(LiteSqlError::compile(
                NodeKind::Member,
                format!(
                    "DELETE FROM `{}` takes unqualified columns, use a condition builder",
                    E::table_name()
                ),
            )
            .into());
        }
        let mut sql = String::from("DELETE FROM ");
        self.dialect
            .write_identifier_quoted(&mut sql, E::table_name());
        sql.push_str(&self.body.render(self.dialect.as_ref()));
        Ok(executor
            .run(sql, self.body.params().to_vec())
            .await?
            .rows_affected())
    }
}

fn check_page(page: u64, page_size: u64) -> Result<()> {
    if page == 0 || page_size == 0 {
        return Err(LiteSqlError::PageSize(format!(
            "page {} of size {} does not exist, both start at 1",
            page, page_size
        ))
        .into());
    }
    page_bounds(page_size, page).map(|_| ())
}

impl<E> From<QueryBuilder<E>> for SqlFragment {
    fn from(value: QueryBuilder<E>) -> Self {
        let mut result = value.build();
        result.seal_sentinels().trim();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ColumnDef, ColumnRef, MySql, Oracle, Postgres, Row, RowLabeled, Sqlite, Value, bag,
    };
    use indoc::indoc;
    use std::{collections::VecDeque, sync::LazyLock};

    #[derive(Debug, PartialEq)]
    struct Order {
        id: i64,
        status: i32,
        name: Option<String>,
    }

    #[allow(non_upper_case_globals)]
    impl Order {
        const id: ColumnRef = ColumnRef {
            name: "id",
            field: "id",
            table: "orders",
        };
        const status: ColumnRef = ColumnRef {
            name: "status",
            field: "status",
            table: "orders",
        };
        const name: ColumnRef = ColumnRef {
            name: "customer",
            field: "name",
            table: "orders",
        };
    }

    impl Entity for Order {
        fn table_name() -> &'static str {
            "orders"
        }
        fn columns() -> &'static [ColumnDef] {
            static COLUMNS: LazyLock<Vec<ColumnDef>> = LazyLock::new(|| {
                vec![
                    ColumnDef {
                        column_ref: Order::id,
                        value: Value::Int64(None),
                        nullable: false,
                        primary_key: true,
                        auto_increment: None,
                    },
                    ColumnDef {
                        column_ref: Order::status,
                        value: Value::Int32(None),
                        nullable: false,
                        primary_key: false,
                        auto_increment: None,
                    },
                    ColumnDef {
                        column_ref: Order::name,
                        value: Value::Varchar(None),
                        nullable: true,
                        primary_key: false,
                        auto_increment: None,
                    },
                ]
            });
            &COLUMNS
        }
        fn row(&self) -> Row {
            vec![
                self.id.as_value(),
                self.status.as_value(),
                self.name.clone().as_value(),
            ]
            .into_boxed_slice()
        }
        fn from_row(row: RowLabeled) -> Result<Self> {
            let get = |name: &str| {
                row.get_column(name)
                    .cloned()
                    .ok_or_else(|| Error::msg(format!("Column `{}` does not exist", name)))
            };
            Ok(Order {
                id: i64::try_from_value(get("id")?)?,
                status: i32::try_from_value(get("status")?)?,
                name: Option::<String>::try_from_value(get("customer")?)?,
            })
        }
    }

    struct User;

    impl Entity for User {
        fn table_name() -> &'static str {
            "users"
        }
        fn columns() -> &'static [ColumnDef] {
            &[]
        }
        fn row(&self) -> Row {
            Default::default()
        }
        fn from_row(_: RowLabeled) -> Result<Self> {
            Ok(User)
        }
    }

    const USERS_ID: ColumnRef = ColumnRef {
        name: "id",
        field: "id",
        table: "users",
    };

    const USERS_NAME: ColumnRef = ColumnRef {
        name: "full_name",
        field: "name",
        table: "users",
    };

    #[derive(Default)]
    struct Script {
        statements: Vec<(String, Vec<ParameterBinding>)>,
        responses: VecDeque<RowSet>,
    }

    impl Executor for Script {
        fn dialect(&self) -> &dyn Dialect {
            &Sqlite
        }
        fn run(
            &mut self,
            sql: String,
            params: Vec<ParameterBinding>,
        ) -> impl Future<Output = Result<RowSet>> + Send {
            self.statements.push((sql, params));
            let response = self.responses.pop_front().unwrap_or_default();
            async move { Ok(response) }
        }
    }

    fn row(values: Vec<Value>) -> Row {
        values.into_boxed_slice()
    }

    fn sqlite() -> Arc<dyn Dialect> {
        Arc::new(Sqlite)
    }

    fn bound(builder: &QueryBuilder<impl Sized>) -> Vec<(&str, &Value)> {
        builder
            .params()
            .iter()
            .map(|p| (p.name.as_str(), &p.value))
            .collect()
    }

    #[test]
    fn append_binds_positionally() {
        let mut query = QueryBuilder::new(sqlite());
        query
            .append("SELECT * FROM orders WHERE status = @status", (2,))
            .unwrap()
            .append("AND (customer = :name OR alias = @name)", ("bob", 99))
            .unwrap();
        assert_eq!(
            query.sql(),
            "SELECT * FROM orders WHERE status = :status AND (customer = :name OR alias = :name)"
        );
        assert_eq!(
            bound(&query),
            [("status", &2.as_value()), ("name", &"bob".into())]
        );
    }

    #[test]
    fn colliding_placeholders_get_distinct_names() {
        let mut query = QueryBuilder::new(Arc::new(Postgres));
        query
            .append("SELECT * FROM t WHERE a = @id", (1,))
            .unwrap()
            .append("OR b = @id", (2,))
            .unwrap();
        assert_eq!(query.sql(), "SELECT * FROM t WHERE a = @id OR b = @id1");
        assert_eq!(bound(&query), [("id", &1.as_value()), ("id1", &2.as_value())]);
    }

    #[test]
    fn named_arguments() {
        let mut query = QueryBuilder::new(sqlite());
        query
            .append(
                "UPDATE orders SET status = @status WHERE id = @id",
                bag! { "id" => 5i64, "status" => 3, "unused" => true },
            )
            .unwrap();
        assert_eq!(
            query.sql(),
            "UPDATE orders SET status = :status WHERE id = :id"
        );
        let error = query
            .append("AND customer = @name", bag! { "id" => 1 })
            .unwrap_err();
        assert!(error.downcast_ref::<LiteSqlError>().unwrap().is_parameter_count());
    }

    #[test]
    fn template_errors() {
        let mut query = QueryBuilder::new(sqlite());
        let error = query.append("WHERE a = @a AND b = @b", (1,)).unwrap_err();
        assert!(error.downcast_ref::<LiteSqlError>().unwrap().is_parameter_count());
        let error = query.append("WHERE 1 = 1", (1,)).unwrap_err();
        assert!(error.downcast_ref::<LiteSqlError>().unwrap().is_raw_template_violation());
        let error = query.append_format("WHERE a = @a", &[]).unwrap_err();
        assert!(error.downcast_ref::<LiteSqlError>().unwrap().is_raw_template_violation());
        assert_eq!(query.sql(), "");
    }

    #[test]
    fn casts_and_literals_are_text() {
        let mut query = QueryBuilder::new(Arc::new(MySql));
        query
            .append("SELECT created::date, ':skip', @@version FROM t WHERE x = :x", (1,))
            .unwrap();
        assert_eq!(
            query.sql(),
            "SELECT created::date, ':skip', @@version FROM t WHERE x = @x"
        );
    }

    #[test]
    fn conditional_appends() {
        let mut query = QueryBuilder::new(sqlite());
        let mut evaluated = false;
        query
            .append("SELECT * FROM orders WHERE 1=1", ())
            .unwrap()
            .append_if(false, "AND status = @status", (1,))
            .unwrap()
            .append_if_with(false, "AND id = @id", || {
                evaluated = true;
                (1,)
            })
            .unwrap()
            .append_if(true, "AND customer = @name", ("x",))
            .unwrap();
        assert!(!evaluated);
        assert_eq!(query.sql(), "SELECT * FROM orders WHERE 1=1 AND customer = :name");
        assert!(query.append_if(true, "AND a = @a", ()).is_err());
    }

    #[test]
    fn helpers_splice_their_template() {
        let mut query = QueryBuilder::new(sqlite());
        let list = query.for_list([4, 5, 6]);
        let like = query.for_contains("ob");
        let date = query
            .for_date_time(time::macros::datetime!(2024-03-01 10:00:00))
            .unwrap();
        query
            .append(
                "SELECT * FROM orders WHERE id IN @ids AND customer LIKE @name AND created > @created",
                (list, like, date),
            )
            .unwrap();
        assert_eq!(
            query.sql(),
            "SELECT * FROM orders WHERE id IN (:inParam0,:inParam1,:inParam2) AND customer LIKE :name AND created > strftime('%Y-%m-%d %H:%M:%S', :created)"
        );
        assert_eq!(query.params().len(), 5);
        assert_eq!(query.params()[4].value, Value::Varchar(Some("2024-03-01 10:00:00".into())));
    }

    #[test]
    fn subquery_renames_colliding_names() {
        let mut sub = QueryBuilder::new(sqlite());
        sub.append("SELECT user_id FROM payments WHERE amount > @amount", (10,))
            .unwrap();
        let mut query = QueryBuilder::new(sqlite());
        query
            .append("SELECT * FROM users WHERE amount < @amount", (100,))
            .unwrap()
            .append_subquery("AND id IN", sub);
        assert_eq!(
            query.sql(),
            "SELECT * FROM users WHERE amount < :amount AND id IN (SELECT user_id FROM payments WHERE amount > :amount1)"
        );
        assert_eq!(
            bound(&query),
            [("amount", &100.as_value()), ("amount1", &10.as_value())]
        );
    }

    #[test]
    fn typed_select() {
        let mut query = QueryBuilder::<Order>::for_entity(sqlite());
        query
            .select("o")
            .filter(Order::status.eq(1) & Order::name.starts_with("A"))
            .unwrap()
            .filter_if(false, Order::id.gt(10))
            .unwrap()
            .order_by_descending(Order::id)
            .unwrap()
            .order_by(Order::name)
            .unwrap();
        assert_eq!(
            query.sql(),
            "SELECT o.`id`, o.`status`, o.`customer` FROM `orders` o WHERE 1=1 AND ((o.`status` = :status AND o.`customer` LIKE :name)) ORDER BY o.`id` DESC, o.`customer` ASC"
        );
    }

    #[test]
    fn left_join_before_filters() {
        let mut query = QueryBuilder::<Order>::for_entity(Arc::new(Postgres));
        query
            .select("t")
            .left_join::<User>("u", Order::id.eq(USERS_ID.of("u")))
            .unwrap()
            .filter(Order::status.ne(Value::Null))
            .unwrap();
        assert_eq!(
            query.sql(),
            indoc! {r#"
                SELECT t."id", t."status", t."customer" FROM "orders" t LEFT JOIN "users" u ON t."id" = u."id" WHERE 1=1 AND (t."status" IS NOT NULL)
            "#}
            .trim()
        );
    }

    #[test]
    fn left_join_moves_the_filter_clause() {
        let mut query = QueryBuilder::<Order>::for_entity(sqlite());
        query
            .select("t")
            .filter(Order::id.eq(1i64))
            .unwrap()
            .left_join::<User>("u", Order::id.eq(USERS_ID.of("u")))
            .unwrap()
            .filter(USERS_NAME.of("u").eq("Ada"))
            .unwrap();
        assert_eq!(
            query.sql(),
            "SELECT t.`id`, t.`status`, t.`customer` FROM `orders` t LEFT JOIN `users` u ON t.`id` = u.`id` WHERE 1=1 AND (t.`id` = :id) AND (u.`full_name` = :name)"
        );
        assert_eq!(bound(&query), [("id", &1i64.as_value()), ("name", &"Ada".into())]);
    }

    #[tokio::test]
    async fn joined_column_into_entity_field() {
        let mut script = Script::default();
        script.responses.push_back(RowSet::new(
            ["id", "status", "customer"],
            vec![row(vec![
                Value::Int64(Some(4)),
                Value::Int32(Some(2)),
                Value::Varchar(Some("Ada".into())),
            ])],
        ));
        let mut query = QueryBuilder::<Order>::for_entity(Arc::new(Postgres));
        query
            .select("t")
            .left_join::<User>("u", Order::id.eq(USERS_ID.of("u")))
            .unwrap()
            .select_join(USERS_NAME.of("u"), Order::name)
            .unwrap()
            .filter(Order::status.eq(2))
            .unwrap();
        assert_eq!(
            query.sql(),
            indoc! {r#"
                SELECT t."id", t."status", u."full_name" AS "customer" FROM "orders" t LEFT JOIN "users" u ON t."id" = u."id" WHERE 1=1 AND (t."status" = @status)
            "#}
            .trim()
        );
        let orders = query.fetch_list(&mut script).await.unwrap();
        assert_eq!(
            orders,
            [Order {
                id: 4,
                status: 2,
                name: Some("Ada".into())
            }]
        );

        let mut raw = QueryBuilder::<Order>::for_entity(sqlite());
        raw.append("DELETE FROM orders", ()).unwrap();
        let error = raw.select_join(USERS_NAME.of("u"), Order::name).unwrap_err();
        assert!(error.downcast_ref::<LiteSqlError>().unwrap().is_compile());
        let error = QueryBuilder::<Order>::for_entity(sqlite())
            .select("t")
            .select_join(Value::Int32(Some(1)), Order::name)
            .unwrap_err();
        assert!(error.downcast_ref::<LiteSqlError>().unwrap().is_compile());
    }

    #[tokio::test]
    async fn paging() {
        let mut script = Script::default();
        script
            .responses
            .push_back(RowSet::new(["count"], vec![row(vec![Value::Int64(Some(0))])]));
        let mut query = QueryBuilder::<Order>::for_entity(sqlite());
        query.select("t").order_by(Order::id).unwrap();
        assert_eq!(query.count_with_page_count(&mut script, 10).await.unwrap(), (0, 1));
        assert_eq!(
            script.statements[0].0,
            "SELECT COUNT(*) FROM (SELECT t.`id`, t.`status`, t.`customer` FROM `orders` t WHERE 1=1 ORDER BY t.`id` ASC) T"
        );
        let error = query.count_with_page_count(&mut script, 0).await.unwrap_err();
        assert!(error.downcast_ref::<LiteSqlError>().unwrap().is_page_size());
        let error = query.fetch_page(&mut script, 0, 10).await.unwrap_err();
        assert!(error.downcast_ref::<LiteSqlError>().unwrap().is_page_size());
        let error = query.fetch_page(&mut script, u64::MAX, 10).await.unwrap_err();
        assert!(error.downcast_ref::<LiteSqlError>().unwrap().is_page_size());
        let error = query
            .fetch_page(&mut script, 2, u64::MAX / 2 + 1)
            .await
            .unwrap_err();
        assert!(error.downcast_ref::<LiteSqlError>().unwrap().is_page_size());
        let error = query.fetch_paged(&mut script, u64::MAX, 10).await.unwrap_err();
        assert!(error.downcast_ref::<LiteSqlError>().unwrap().is_page_size());
        assert_eq!(script.statements.len(), 1);

        script.responses.push_back(RowSet::new(["count"], vec![row(vec![Value::Int64(Some(21))])]));
        script.responses.push_back(RowSet::new(
            ["id", "status", "customer"],
            vec![row(vec![
                Value::Int64(Some(21)),
                Value::Int32(Some(1)),
                Value::Varchar(None),
            ])],
        ));
        let page = query.fetch_paged(&mut script, 3, 10).await.unwrap();
        assert_eq!(page.total_rows, 21);
        assert_eq!(page.total_pages, 3);
        assert_eq!(
            page.rows,
            [Order {
                id: 21,
                status: 1,
                name: None
            }]
        );
        assert!(script.statements[2].0.ends_with("ORDER BY t.`id` ASC LIMIT 10 OFFSET 20"));
    }

    #[test]
    fn oracle_page_wraps_order_inside() {
        let mut query = QueryBuilder::<Order>::for_entity(Arc::new(Oracle));
        query.select("t").order_by(Order::id).unwrap();
        let sql = query
            .dialect()
            .page_sql(&query.body_sql(), &query.order_by, 5, 2)
            .unwrap();
        assert!(sql.contains("ORDER BY t.\"id\" ASC) row_limit WHERE ROWNUM <= 10) WHERE rownum_ > 5"));
    }

    #[tokio::test]
    async fn exists_scalar_and_one() {
        let mut script = Script::default();
        script.responses.push_back(RowSet::new(["x"], vec![row(vec![Value::Int32(None)])]));
        script.responses.push_back(RowSet::new(["x"], vec![row(vec![Value::Int32(Some(1))])]));
        script.responses.push_back(RowSet::new(["x"], vec![row(vec![Value::Int64(Some(7))])]));
        let mut query = QueryBuilder::new(sqlite());
        query.append("SELECT 1 FROM orders WHERE id = @id", (7,)).unwrap();
        assert!(!query.exists(&mut script).await.unwrap());
        assert!(query.exists(&mut script).await.unwrap());
        assert_eq!(query.scalar::<i64, _>(&mut script).await.unwrap(), 7);
        assert_eq!(query.scalar::<Option<i64>, _>(&mut script).await.unwrap(), None);
        let none = query.with_entity::<Order>().fetch_one(&mut script).await.unwrap();
        assert_eq!(none, None);
        assert_eq!(script.statements.len(), 5);
        assert_eq!(script.statements[0].1, [ParameterBinding::new("id", 7)]);
    }

    #[tokio::test]
    async fn delete_by_condition() {
        let mut script = Script::default();
        script.responses.push_back(RowSet::affected(2));
        let mut condition = QueryBuilder::<Order>::condition(sqlite());
        condition
            .filter(Order::status.eq(9) | Order::id.is_in(vec![1i64, 2]))
            .unwrap();
        let result = condition.delete(&mut script).await.unwrap();
        assert_eq!(result.rows_affected, 2);
        assert_eq!(
            script.statements[0].0,
            "DELETE FROM `orders` WHERE 1=1 AND ((`status` = :status OR `id` IN (:inParam0,:inParam1)))"
        );
        let mut select = QueryBuilder::<Order>::for_entity(sqlite());
        select.select("t");
        let error = select.delete(&mut script).await.unwrap_err();
        assert!(error.downcast_ref::<LiteSqlError>().unwrap().is_compile());
        assert_eq!(script.statements.len(), 1);
    }
}
