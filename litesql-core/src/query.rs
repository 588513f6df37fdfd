use crate::Value;
use std::sync::Arc;

pub type RowNames = Arc<[String]>;
pub type Row = Box<[Value]>;

/// A row together with its column labels.
#[derive(Default, Clone, Debug)]
pub struct RowLabeled {
    pub labels: RowNames,
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| &self.values[i])
    }
}

/// Outcome of a statement that modifies data.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    pub rows_affected: u64,
    pub last_affected_id: Option<i64>,
}

/// Everything a driver returns for one statement.
#[derive(Default, Debug, Clone)]
pub struct RowSet {
    pub labels: RowNames,
    pub rows: Vec<Row>,
    pub rows_affected: u64,
    pub last_affected_id: Option<i64>,
}

impl RowSet {
    pub fn new(labels: impl IntoIterator<Item = impl Into<String>>, rows: Vec<Row>) -> Self {
        Self {
            labels: labels.into_iter().map(|v| v.into()).collect::<Vec<String>>().into(),
            rows,
            ..Default::default()
        }
    }
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            ..Default::default()
        }
    }
    pub fn with_last_affected_id(mut self, id: i64) -> Self {
        self.last_affected_id = Some(id);
        self
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    pub fn rows_affected(&self) -> RowsAffected {
        RowsAffected {
            rows_affected: self.rows_affected,
            last_affected_id: self.last_affected_id,
        }
    }
    /// First column of the first row.
    pub fn scalar(self) -> Option<Value> {
        self.rows
            .into_iter()
            .next()
            .and_then(|row| row.into_vec().into_iter().next())
    }
    pub fn into_labeled(self) -> impl Iterator<Item = RowLabeled> {
        let labels = self.labels;
        self.rows.into_iter().map(move |values| RowLabeled {
            labels: labels.clone(),
            values,
        })
    }
}
