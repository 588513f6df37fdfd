use crate::{
    ColumnDef, Dialect, Entity, ParameterNames, Result, SqlFragment, Value, is_auto_increment,
    require_primary_key, separated_by,
};

/// `INSERT INTO table (c0, c1) VALUES (:c0, :c1), (:c01, :c11)`, one tuple per entity.
///
/// Auto generated primary keys are left out, `auto_increment` is the client default.
pub fn write_insert<'a, E: Entity + 'a>(
    dialect: &dyn Dialect,
    entities: impl IntoIterator<Item = &'a E>,
    auto_increment: bool,
) -> SqlFragment {
    let columns = E::columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| !is_auto_increment::<E>(c, auto_increment))
        .collect::<Vec<_>>();
    let mut text = String::from("INSERT INTO ");
    dialect.write_identifier_quoted(&mut text, E::table_name());
    text.push_str(" (");
    separated_by(
        &mut text,
        columns.iter(),
        |out, (_, c): &(usize, &ColumnDef)| dialect.write_identifier_quoted(out, c.name()),
        ", ",
    );
    text.push_str(") VALUES ");
    let mut out = SqlFragment::new();
    out.push_text(text);
    let mut names = ParameterNames::new();
    for (i, entity) in entities.into_iter().enumerate() {
        out.push_text(if i == 0 { "(" } else { ", (" });
        let mut row = entity.row().into_vec();
        for (j, (index, column)) in columns.iter().enumerate() {
            if j > 0 {
                out.push_text(", ");
            }
            let value = row.get_mut(*index).map(std::mem::take).unwrap_or_default();
            out.push_param(names.claim(column.field()), value);
        }
        out.push_text(")");
    }
    out
}

/// `UPDATE table SET c = :c, ... WHERE key = :key` writing the columns at `changed`.
pub fn write_update<E: Entity>(
    dialect: &dyn Dialect,
    entity: &E,
    changed: &[usize],
) -> Result<SqlFragment> {
    let key = require_primary_key::<E>()?;
    let columns = E::columns();
    let mut row = entity.row().into_vec();
    let mut names = ParameterNames::new();
    let mut out = SqlFragment::new();
    let mut text = String::from("UPDATE ");
    dialect.write_identifier_quoted(&mut text, E::table_name());
    text.push_str(" SET ");
    out.push_text(text);
    for (i, index) in changed.iter().enumerate() {
        let Some(column) = columns.get(*index) else {
            continue;
        };
        let mut text = String::new();
        if i > 0 {
            text.push_str(", ");
        }
        dialect.write_identifier_quoted(&mut text, column.name());
        text.push_str(" = ");
        out.push_text(text);
        let value = row.get_mut(*index).map(std::mem::take).unwrap_or_default();
        out.push_param(names.claim(column.field()), value);
    }
    let value = entity.primary_key().unwrap_or_default();
    write_key_filter(dialect, &mut out, &mut names, key, value);
    Ok(out)
}

/// `DELETE FROM table WHERE key = :key`.
pub fn write_delete_by_id<E: Entity>(dialect: &dyn Dialect, id: Value) -> Result<SqlFragment> {
    let key = require_primary_key::<E>()?;
    let mut out = SqlFragment::new();
    let mut text = String::from("DELETE FROM ");
    dialect.write_identifier_quoted(&mut text, E::table_name());
    out.push_text(text);
    write_key_filter(dialect, &mut out, &mut ParameterNames::new(), key, id);
    Ok(out)
}

fn write_key_filter(
    dialect: &dyn Dialect,
    out: &mut SqlFragment,
    names: &mut ParameterNames,
    key: &ColumnDef,
    value: Value,
) {
    let mut text = String::from(" WHERE ");
    dialect.write_identifier_quoted(&mut text, key.name());
    text.push_str(" = ");
    out.push_text(text);
    out.push_param(names.claim(key.field()), value);
}
