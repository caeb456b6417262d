use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum StatementError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// A SQL statement with positional (`$n`) parameters. Values never appear in `sql`.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
    /// Ordering over the statement's output columns, applied by the store
    /// to the rows it hands back
    pub order_by: Option<&'static str>,
}

impl Statement {
    pub fn ordered_by(mut self, columns: &'static str) -> Self {
        self.order_by = Some(columns);
        self
    }
}

/// Collects bound values while a statement is being assembled
#[derive(Debug, Default)]
pub struct StatementBuilder {
    params: Vec<Value>,
}

impl StatementBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value and return its placeholder, with an optional type cast
    pub fn param(&mut self, value: Value, cast: Option<&str>) -> String {
        self.params.push(value);
        match cast {
            Some(cast) => format!("${}::{}", self.params.len(), cast),
            None => format!("${}", self.params.len()),
        }
    }

    pub fn finish(self, sql: String) -> Statement {
        Statement {
            sql,
            params: self.params,
            order_by: None,
        }
    }
}

/// Validate and double-quote a table or column name
pub fn quote_identifier(name: &str) -> Result<String, StatementError> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StatementError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name))
}
