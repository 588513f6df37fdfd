use crate::{Dialect, LiteSqlError, Result, Value};
use std::collections::{HashMap, HashSet};

/// Piece of SQL text awaiting rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    /// Parameter marker, rendered through the dialect.
    Param(String),
    /// Position reserved for the marker of the value a [`SqlValue`] wraps.
    Slot,
    /// The `WHERE 1=1` opening of a filter clause.
    Sentinel,
}

impl Token {
    pub fn text(value: impl Into<String>) -> Token {
        Token::Text(value.into())
    }
}

pub(crate) const SENTINEL: &str = " WHERE 1=1";

/// A named value bound to a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBinding {
    pub name: String,
    pub value: Value,
}

impl ParameterBinding {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
    /// Typed NULL naming the declared type of the binding.
    pub fn declared_type(&self) -> Value {
        self.value.as_type()
    }
}

/// SQL text that must travel together with the value(s) it binds.
///
/// Produced by the pattern, date and list helpers of a dialect. When used as a
/// template argument, its template replaces the placeholder and its value becomes
/// the binding. A list value binds one parameter per marker of the template, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlValue {
    pub template: Vec<Token>,
    pub value: Value,
}

impl SqlValue {
    /// Just the value, bound in place of the placeholder.
    pub fn bound(value: impl Into<Value>) -> Self {
        Self {
            template: vec![Token::Slot],
            value: value.into(),
        }
    }

    /// Template where `{0}` stands for the marker of the bound value.
    pub fn wrapped(template: &str, value: impl Into<Value>) -> Self {
        let mut tokens = Vec::new();
        let mut parts = template.split("{0}").peekable();
        while let Some(part) = parts.next() {
            if !part.is_empty() {
                tokens.push(Token::text(part));
            }
            if parts.peek().is_some() {
                tokens.push(Token::Slot);
            }
        }
        Self {
            template: tokens,
            value: value.into(),
        }
    }

    /// Parameter names appearing in the template, in order.
    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.template.iter().filter_map(|t| match t {
            Token::Param(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

/// Names already taken inside one statement.
#[derive(Default, Debug, Clone)]
pub struct ParameterNames {
    taken: HashSet<String>,
    /// Next suffix to try for each base name.
    suffixes: HashMap<String, usize>,
}

impl ParameterNames {
    pub fn new() -> Self {
        Default::default()
    }

    /// Reserve `base`, or `base` followed by the next free numeric suffix.
    pub fn claim(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_owned()) {
            return base.to_owned();
        }
        let suffix = self.suffixes.entry(base.to_owned()).or_insert(1);
        loop {
            let candidate = format!("{base}{suffix}");
            *suffix += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(name)
    }
}

/// Ordered SQL tokens and the bindings their markers refer to.
///
/// Every [`Token::Param`] refers to exactly one binding with the same name and binding
/// names are unique. A name may appear in more than one marker.
#[derive(Default, Debug, Clone)]
pub struct SqlFragment {
    tokens: Vec<Token>,
    params: Vec<ParameterBinding>,
}

impl SqlFragment {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn params(&self) -> &[ParameterBinding] {
        &self.params
    }

    pub fn into_params(self) -> Vec<ParameterBinding> {
        self.params
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn push_text(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if text.is_empty() {
            return self;
        }
        if let Some(Token::Text(last)) = self.tokens.last_mut() {
            last.push_str(text);
        } else {
            self.tokens.push(Token::text(text));
        }
        self
    }

    /// Marker plus a new binding, `name` must already be unique.
    pub fn push_param(&mut self, name: String, value: Value) -> &mut Self {
        self.tokens.push(Token::Param(name.clone()));
        self.params.push(ParameterBinding { name, value });
        self
    }

    /// Marker referring to an existing binding.
    pub(crate) fn push_marker(&mut self, name: String) -> &mut Self {
        self.tokens.push(Token::Param(name));
        self
    }

    /// Tokens whose markers refer to bindings already present.
    pub(crate) fn push_tokens(&mut self, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        for token in tokens {
            match token {
                Token::Text(text) => {
                    self.push_text(text);
                }
                token => self.tokens.push(token),
            }
        }
        self
    }

    pub fn push_sentinel(&mut self) -> &mut Self {
        self.tokens.push(Token::Sentinel);
        self
    }

    /// Remove the last filter sentinel and the filter text written after it, which is
    /// returned. `None` when there is no sentinel.
    pub fn take_filter_clause(&mut self) -> Option<Vec<Token>> {
        let position = self.tokens.iter().rposition(|t| *t == Token::Sentinel)?;
        let mut clause = self.tokens.split_off(position);
        clause.remove(0);
        Some(clause)
    }

    /// Edit the items between the first `SELECT` and its `FROM`. Returns whether a
    /// select list was found.
    pub(crate) fn edit_select_list(&mut self, edit: impl FnOnce(&mut Vec<String>)) -> bool {
        for token in self.tokens.iter_mut() {
            let Token::Text(text) = token else {
                continue;
            };
            let Some(from) = text.find(" FROM ") else {
                continue;
            };
            let Some(select) = text[..from].find("SELECT ") else {
                continue;
            };
            let start = select + "SELECT ".len();
            let mut items = text[start..from]
                .split(", ")
                .filter(|v| !v.trim().is_empty())
                .map(str::to_owned)
                .collect::<Vec<_>>();
            edit(&mut items);
            text.replace_range(start..from, &items.join(", "));
            return true;
        }
        false
    }

    /// Strip whitespace around the whole text.
    pub(crate) fn trim(&mut self) -> &mut Self {
        if let Some(Token::Text(first)) = self.tokens.first_mut() {
            *first = first.trim_start().to_owned();
        }
        if let Some(Token::Text(last)) = self.tokens.last_mut() {
            last.truncate(last.trim_end().len());
        }
        self.tokens.retain(|t| !matches!(t, Token::Text(v) if v.is_empty()));
        self
    }

    /// Turn filter sentinels into plain text so they can't be removed anymore.
    pub(crate) fn seal_sentinels(&mut self) -> &mut Self {
        let tokens = std::mem::take(&mut self.tokens);
        for token in tokens {
            match token {
                Token::Sentinel => {
                    self.push_text(SENTINEL);
                }
                token => {
                    self.push_tokens([token]);
                }
            }
        }
        self
    }

    /// Move `other` to the end, parameters included. Names must not collide.
    pub fn extend(&mut self, other: SqlFragment) -> &mut Self {
        self.push_tokens(other.tokens);
        self.params.extend(other.params);
        self
    }

    /// Rename parameters in a single pass over markers and bindings.
    pub fn rename(&mut self, renames: &HashMap<String, String>) {
        if renames.is_empty() {
            return;
        }
        for token in self.tokens.iter_mut() {
            if let Token::Param(name) = token {
                if let Some(renamed) = renames.get(name.as_str()) {
                    *name = renamed.clone();
                }
            }
        }
        for param in self.params.iter_mut() {
            if let Some(renamed) = renames.get(param.name.as_str()) {
                param.name = renamed.clone();
            }
        }
    }

    /// Make every parameter name unique against `names`, renaming the colliding ones.
    pub fn claim_names(&mut self, names: &mut ParameterNames) {
        let renames = self
            .params
            .iter()
            .filter_map(|p| {
                let unique = names.claim(&p.name);
                (unique != p.name).then(|| (p.name.clone(), unique))
            })
            .collect::<HashMap<_, _>>();
        self.rename(&renames);
    }

    /// Emit `value` for the placeholder `name`.
    ///
    /// A scalar value fills the slots of the template with a marker named after the
    /// placeholder. A list value binds its items to the markers the template carries;
    /// markers already taken in this statement are rewritten in place to a free name.
    pub fn splice(&mut self, names: &mut ParameterNames, name: &str, value: SqlValue) -> Result<()> {
        match value.value {
            Value::List(Some(items), ..) => {
                let markers = value
                    .template
                    .iter()
                    .filter(|t| matches!(t, Token::Param(..)))
                    .count();
                if markers != items.len() {
                    return Err(LiteSqlError::ParameterCount(format!(
                        "the list template for `{}` has {} markers but the list has {} items",
                        name,
                        markers,
                        items.len()
                    ))
                    .into());
                }
                let start = self.tokens.len();
                for token in value.template {
                    match token {
                        Token::Text(text) => {
                            self.push_text(text);
                        }
                        token => self.tokens.push(token),
                    }
                }
                let positions = (start..self.tokens.len())
                    .filter(|i| matches!(self.tokens[*i], Token::Param(..)))
                    .collect::<Vec<_>>();
                for (position, item) in positions.into_iter().zip(items) {
                    let Token::Param(stale) = &self.tokens[position] else {
                        continue;
                    };
                    let unique = names.claim(stale);
                    if unique != *stale {
                        log::trace!("Renaming list marker `{}` to `{}`", stale, unique);
                        self.tokens[position] = Token::Param(unique.clone());
                    }
                    self.params.push(ParameterBinding {
                        name: unique,
                        value: item,
                    });
                }
            }
            scalar => {
                let unique = names.claim(name);
                for token in value.template {
                    match token {
                        Token::Slot => {
                            self.push_marker(unique.clone());
                        }
                        Token::Text(text) => {
                            self.push_text(text);
                        }
                        token => self.tokens.push(token),
                    }
                }
                self.params.push(ParameterBinding {
                    name: unique,
                    value: scalar,
                });
            }
        }
        Ok(())
    }

    /// Final SQL text with markers in the syntax of `dialect`.
    pub fn render(&self, dialect: &dyn Dialect) -> String {
        let values = self
            .params
            .iter()
            .map(|p| (p.name.as_str(), &p.value))
            .collect::<HashMap<_, _>>();
        let mut out = String::with_capacity(128);
        for token in &self.tokens {
            match token {
                Token::Text(text) => out.push_str(text),
                Token::Param(name) => dialect.write_parameter_marker(
                    &mut out,
                    name,
                    values.get(name.as_str()).copied().unwrap_or(&Value::Null),
                ),
                Token::Slot => {
                    log::error!("Unfilled value slot while rendering a statement");
                }
                Token::Sentinel => out.push_str(SENTINEL),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sqlite;

    #[test]
    fn claim_suffix() {
        let mut names = ParameterNames::new();
        assert_eq!(names.claim("id"), "id");
        assert_eq!(names.claim("id"), "id1");
        assert_eq!(names.claim("id"), "id2");
        assert_eq!(names.claim("id1"), "id11");
    }

    #[test]
    fn wrapped_template() {
        let value = SqlValue::wrapped("strftime('%Y', {0})", "2024");
        assert_eq!(
            value.template,
            vec![
                Token::text("strftime('%Y', "),
                Token::Slot,
                Token::text(")")
            ]
        );
    }

    #[test]
    fn list_splice_renames_taken_markers() {
        let mut names = ParameterNames::new();
        names.claim("inParam0");
        let mut fragment = SqlFragment::new();
        fragment.push_text("x IN ");
        let list = SqlValue {
            template: vec![
                Token::text("("),
                Token::Param("inParam0".into()),
                Token::text(","),
                Token::Param("inParam1".into()),
                Token::text(")"),
            ],
            value: vec![5, 6].into(),
        };
        fragment.splice(&mut names, "ids", list).unwrap();
        assert_eq!(fragment.render(&Sqlite), "x IN (:inParam01,:inParam1)");
        let names = fragment.params().iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["inParam01", "inParam1"]);
        assert_eq!(fragment.params()[0].value, Value::Int32(Some(5)));
    }

    #[test]
    fn claim_suffix_continues() {
        let mut names = ParameterNames::new();
        names.claim("id2");
        let claimed = (0..4).map(|_| names.claim("id")).collect::<Vec<_>>();
        assert_eq!(claimed, ["id", "id1", "id3", "id4"]);
        assert_eq!(names.claim("id3"), "id31");
        assert!(names.contains("id4"));
    }

    #[test]
    fn filter_clause_removal() {
        let mut fragment = SqlFragment::new();
        fragment.push_text("SELECT 1 FROM `a` t").push_sentinel();
        fragment.push_text(" AND (t.`id` = ");
        fragment.push_param("id".into(), Value::Int32(Some(1)));
        fragment.push_text(")");
        let clause = fragment.take_filter_clause().unwrap();
        assert_eq!(
            clause,
            [
                Token::text(" AND (t.`id` = "),
                Token::Param("id".into()),
                Token::text(")")
            ]
        );
        assert!(fragment.take_filter_clause().is_none());
        assert_eq!(fragment.render(&Sqlite), "SELECT 1 FROM `a` t");
    }

    #[test]
    fn select_list_edit() {
        let mut fragment = SqlFragment::new();
        fragment.push_text(" SELECT t.`a`, t.`b` FROM `x` t").push_sentinel();
        assert!(fragment.edit_select_list(|items| {
            items.retain(|v| v != "t.`a`");
            items.push("u.`c` AS `a`".into());
        }));
        assert_eq!(fragment.render(&Sqlite), " SELECT t.`b`, u.`c` AS `a` FROM `x` t WHERE 1=1");
        let mut plain = SqlFragment::new();
        plain.push_text("DELETE FROM `x`");
        assert!(!plain.edit_select_list(|_| {}));
    }
}
