//! Queryable dataset handle.
//!
//! A [`Dataset`] loads a landed newline-delimited JSON artifact into an
//! in-memory SQLite table so validators can express checks as SQL. The
//! original artifact path is kept alongside the connection: its
//! modification time is what freshness checks inspect.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;

/// Errors from dataset loading and querying.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("dataset record on line {line} is not an object")]
    NotAnObject { line: usize },

    #[error("query failed: {0}")]
    Sql(#[from] rusqlite::Error),
}

/// Inferred storage type of a dataset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Boolean,
    Integer,
    Real,
    Text,
}

impl ColumnType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
        }
    }

    fn sql_affinity(self) -> &'static str {
        match self {
            Self::Boolean | Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }

    // integer observations widen to real; anything mixed with text is text
    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (Self::Integer | Self::Real, Self::Integer | Self::Real) => Self::Real,
            _ => Self::Text,
        }
    }
}

/// One column of a loaded dataset.
#[derive(Debug, Clone)]
pub struct DatasetColumn {
    pub name: String,
    pub data_type: ColumnType,
}

/// A named dataset backed by an in-memory SQLite table.
#[derive(Debug)]
pub struct Dataset {
    name: String,
    artifact: PathBuf,
    conn: Connection,
    columns: Vec<DatasetColumn>,
}

impl Dataset {
    /// Load a newline-delimited JSON artifact. Column names and types are
    /// inferred from the records; blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] when the artifact cannot be read, a line is
    /// not a JSON object, or table creation fails.
    pub fn from_ndjson(path: impl Into<PathBuf>, name: impl Into<String>) -> Result<Self, DatasetError> {
        let artifact = path.into();
        let name = name.into();
        let content = fs::read_to_string(&artifact)?;

        let mut rows: Vec<serde_json::Map<String, serde_json::Value>> = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let value: serde_json::Value = serde_json::from_str(line)
                .map_err(|source| DatasetError::Json { line: idx + 1, source })?;
            match value {
                serde_json::Value::Object(map) => rows.push(map),
                _ => return Err(DatasetError::NotAnObject { line: idx + 1 }),
            }
        }

        let columns = infer_columns(&rows);
        let conn = Connection::open_in_memory()?;
        create_table(&conn, &name, &columns)?;
        insert_rows(&conn, &name, &columns, &rows)?;

        tracing::debug!(
            dataset = name,
            rows = rows.len(),
            columns = columns.len(),
            "Loaded dataset"
        );
        Ok(Self {
            name,
            artifact,
            conn,
            columns,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the artifact this dataset was loaded from.
    #[must_use]
    pub fn artifact_path(&self) -> &Path {
        &self.artifact
    }

    #[must_use]
    pub fn columns(&self) -> &[DatasetColumn] {
        &self.columns
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Replace `{dataset}` placeholders with this dataset's quoted table
    /// name.
    #[must_use]
    pub fn render_sql(&self, template: &str) -> String {
        template.replace("{dataset}", &quote_ident(&self.name))
    }

    /// Total number of rows.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Sql`] on query failure.
    pub fn row_count(&self) -> Result<i64, DatasetError> {
        self.count(&format!("SELECT COUNT(*) FROM {}", quote_ident(&self.name)))
    }

    /// Run a query expected to return a single integer.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Sql`] on query failure.
    pub fn count(&self, sql: &str) -> Result<i64, DatasetError> {
        Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
    }

    /// Run a query and return the first column of the first row, or `None`
    /// when the query yields no rows.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Sql`] on query failure.
    pub fn query_scalar(&self, sql: &str) -> Result<Option<serde_json::Value>, DatasetError> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => {
                let value: SqlValue = row.get(0)?;
                Ok(Some(sql_to_json(value)))
            }
            None => Ok(None),
        }
    }

    /// Rows where `column` is null.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Sql`] on query failure.
    pub fn null_count(&self, column: &str) -> Result<i64, DatasetError> {
        self.count(&format!(
            "SELECT COUNT(*) FROM {} WHERE {} IS NULL",
            quote_ident(&self.name),
            quote_ident(column)
        ))
    }

    /// Number of distinct non-null values appearing more than once.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Sql`] on query failure.
    pub fn duplicate_group_count(&self, column: &str) -> Result<i64, DatasetError> {
        let col = quote_ident(column);
        self.count(&format!(
            "SELECT COUNT(*) FROM (SELECT {col} FROM {} WHERE {col} IS NOT NULL \
             GROUP BY {col} HAVING COUNT(*) > 1)",
            quote_ident(&self.name)
        ))
    }

    /// Non-null values numerically below `min`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Sql`] on query failure.
    pub fn count_below(&self, column: &str, min: f64) -> Result<i64, DatasetError> {
        let col = quote_ident(column);
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {col} IS NOT NULL AND CAST({col} AS REAL) < ?1",
            quote_ident(&self.name)
        );
        Ok(self.conn.query_row(&sql, [min], |row| row.get(0))?)
    }

    /// Non-null values numerically above `max`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Sql`] on query failure.
    pub fn count_above(&self, column: &str, max: f64) -> Result<i64, DatasetError> {
        let col = quote_ident(column);
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {col} IS NOT NULL AND CAST({col} AS REAL) > ?1",
            quote_ident(&self.name)
        );
        Ok(self.conn.query_row(&sql, [max], |row| row.get(0))?)
    }

    /// Non-null values outside `allowed`. Nulls are exempt; `not_null`
    /// covers those.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Sql`] on query failure.
    pub fn count_not_in(
        &self,
        column: &str,
        allowed: &[serde_json::Value],
    ) -> Result<i64, DatasetError> {
        if allowed.is_empty() {
            return self.count(&format!(
                "SELECT COUNT(*) FROM {} WHERE {} IS NOT NULL",
                quote_ident(&self.name),
                quote_ident(column)
            ));
        }
        let col = quote_ident(column);
        let placeholders = (1..=allowed.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {col} IS NOT NULL AND {col} NOT IN ({placeholders})",
            quote_ident(&self.name)
        );
        let params: Vec<SqlValue> = allowed.iter().map(json_to_sql).collect();
        Ok(self
            .conn
            .query_row(&sql, rusqlite::params_from_iter(params), |row| row.get(0))?)
    }

    /// Non-null values not containing `needle` as a substring.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Sql`] on query failure.
    pub fn count_without_substring(&self, column: &str, needle: &str) -> Result<i64, DatasetError> {
        let col = quote_ident(column);
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {col} IS NOT NULL AND instr({col}, ?1) = 0",
            quote_ident(&self.name)
        );
        Ok(self.conn.query_row(&sql, [needle], |row| row.get(0))?)
    }
}

fn infer_columns(rows: &[serde_json::Map<String, serde_json::Value>]) -> Vec<DatasetColumn> {
    let mut order: Vec<String> = Vec::new();
    let mut types: std::collections::HashMap<String, Option<ColumnType>> =
        std::collections::HashMap::new();

    for row in rows {
        for (key, value) in row {
            if !types.contains_key(key) {
                order.push(key.clone());
                types.insert(key.clone(), None);
            }
            if let Some(observed) = json_type(value) {
                let slot = types.get_mut(key).expect("key inserted above");
                *slot = Some(match *slot {
                    Some(existing) => existing.merge(observed),
                    None => observed,
                });
            }
        }
    }

    order
        .into_iter()
        .map(|name| {
            let data_type = types[&name].unwrap_or(ColumnType::Text);
            DatasetColumn { name, data_type }
        })
        .collect()
}

fn create_table(conn: &Connection, name: &str, columns: &[DatasetColumn]) -> Result<(), DatasetError> {
    let body = if columns.is_empty() {
        // Keeps COUNT(*) and custom SQL working for an empty artifact.
        "\"__empty\" INTEGER".to_string()
    } else {
        columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.data_type.sql_affinity()))
            .collect::<Vec<_>>()
            .join(", ")
    };
    conn.execute(&format!("CREATE TABLE {} ({body})", quote_ident(name)), [])?;
    Ok(())
}

fn insert_rows(
    conn: &Connection,
    name: &str,
    columns: &[DatasetColumn],
    rows: &[serde_json::Map<String, serde_json::Value>],
) -> Result<(), DatasetError> {
    if columns.is_empty() || rows.is_empty() {
        return Ok(());
    }
    let col_list = columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({col_list}) VALUES ({placeholders})",
        quote_ident(name)
    );
    let mut stmt = conn.prepare(&sql)?;
    for row in rows {
        let params: Vec<SqlValue> = columns
            .iter()
            .map(|c| row.get(&c.name).map_or(SqlValue::Null, json_to_sql))
            .collect();
        stmt.execute(rusqlite::params_from_iter(params))?;
    }
    Ok(())
}

fn json_type(value: &serde_json::Value) -> Option<ColumnType> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(_) => Some(ColumnType::Boolean),
        serde_json::Value::Number(n) if n.is_f64() => Some(ColumnType::Real),
        serde_json::Value::Number(_) => Some(ColumnType::Integer),
        _ => Some(ColumnType::Text),
    }
}

fn json_to_sql(value: &serde_json::Value) -> SqlValue {
    match value {
        serde_json::Value::Null => SqlValue::Null,
        serde_json::Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real))
            .unwrap_or(SqlValue::Null),
        serde_json::Value::String(s) => SqlValue::Text(s.clone()),
        // Nested structures are stored as their JSON text.
        other => SqlValue::Text(other.to_string()),
    }
}

fn sql_to_json(value: SqlValue) -> serde_json::Value {
    match value {
        SqlValue::Null | SqlValue::Blob(_) => serde_json::Value::Null,
        SqlValue::Integer(i) => serde_json::Value::from(i),
        SqlValue::Real(f) => serde_json::Number::from_f64(f)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        SqlValue::Text(s) => serde_json::Value::String(s),
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
