/// Clause being compiled, it decides how an expression is read.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    SqlSelectWhere,
    SqlJoin,
    SqlSelectOrderBy,
    SqlDeleteWhere,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context<'a> {
    pub fragment: Fragment,
    pub qualify_columns: bool,
    /// Alias of the main table, used for columns without an explicit one.
    pub alias: &'a str,
}

impl<'a> Context<'a> {
    pub fn new(fragment: Fragment, qualify_columns: bool, alias: &'a str) -> Self {
        Self {
            fragment,
            qualify_columns,
            alias,
        }
    }

    pub fn switch_fragment(&self, fragment: Fragment) -> Context<'a> {
        Context { fragment, ..*self }
    }
}

impl Default for Context<'_> {
    fn default() -> Self {
        Context::new(Fragment::None, true, "t")
    }
}
