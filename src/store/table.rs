use super::types::{ColumnType, Scalar, StructField};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    RaggedColumn { column: String, expected: usize, actual: usize },
    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),
}

/// A named, typed, ordered sequence of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType, values: Vec<Scalar>) -> Self {
        Self { name: name.into(), column_type, values }
    }

    /// Builds a column from anything convertible into `Scalar`.
    pub fn from_values<T: Into<Scalar>>(
        name: impl Into<String>,
        column_type: ColumnType,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        Self::new(name, column_type, values.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn field(&self) -> StructField {
        StructField::new(self.name.clone(), self.column_type.clone())
    }
}

/// One entry of the `table.column_types` metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTypeDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// An in-memory batch of equally long columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        for (i, column) in columns.iter().enumerate() {
            if column.len() != row_count {
                return Err(TableError::RaggedColumn {
                    column: column.name.clone(),
                    expected: row_count,
                    actual: column.len(),
                });
            }
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Self { columns, row_count })
    }

    pub fn row_count(&self) -> usize { self.row_count }
    pub fn columns(&self) -> &[Column] { &self.columns }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Resolves a name as reported by [`Table::column_types`] to a path: the
    /// top-level column index followed by struct field indices.
    ///
    /// An exact top-level match wins over a dotted reading of the name.
    pub fn column_path(&self, name: &str) -> Option<Vec<usize>> {
        if let Some(idx) = self.column_index(name) {
            return Some(vec![idx]);
        }
        let mut segments = split_column_path(name)?.into_iter();
        let head = self.column_index(&segments.next()?)?;

        let mut path = vec![head];
        let mut column_type = &self.columns[head].column_type;
        for segment in segments {
            let ColumnType::Struct { fields } = column_type else {
                return None;
            };
            let pos = fields.iter().position(|f| f.name == segment)?;
            path.push(pos);
            column_type = &fields[pos].column_type;
        }
        Some(path)
    }

    /// Values along a path from [`Table::column_path`]. A null struct yields null children.
    pub fn project(&self, path: &[usize]) -> Option<Vec<Scalar>> {
        let (&head, fields) = path.split_first()?;
        let column = self.columns.get(head)?;
        Some(column.values.iter().map(|v| project_value(v, fields)).collect())
    }

    /// Keeps only the rows whose mask entry is `true`.
    pub fn filter(&self, mask: &[bool]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                column_type: c.column_type.clone(),
                values: c
                    .values
                    .iter()
                    .zip(mask)
                    .filter(|(_, keep)| **keep)
                    .map(|(v, _)| v.clone())
                    .collect(),
            })
            .collect();
        Table {
            columns,
            row_count: mask.iter().take(self.row_count).filter(|k| **k).count(),
        }
    }

    /// Column metadata as reported by `table.column_types`.
    ///
    /// With `include_nested`, the children of struct columns follow their parent
    /// as `parent.child`; a child name containing a `.` is back-quoted.
    pub fn column_types(&self, include_nested: bool) -> Vec<ColumnTypeDescriptor> {
        let mut out = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            collect_field(&column.field(), "", include_nested, &mut out);
        }
        out
    }
}

/// Splits `a.b.c` on dots outside back-quotes. `None` for an unterminated quote.
fn split_column_path(name: &str) -> Option<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for ch in name.chars() {
        match ch {
            '`' => quoted = !quoted,
            '.' if !quoted => segments.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    if quoted {
        return None;
    }
    segments.push(current);
    Some(segments)
}

fn project_value(value: &Scalar, fields: &[usize]) -> Scalar {
    fields
        .iter()
        .try_fold(value, |v, &i| match v {
            Scalar::Struct(children) => children.get(i),
            _ => None,
        })
        .cloned()
        .unwrap_or(Scalar::Null)
}

fn collect_field(
    field: &StructField,
    parent: &str,
    include_nested: bool,
    out: &mut Vec<ColumnTypeDescriptor>,
) {
    let prefix = if parent.is_empty() { String::new() } else { format!("{}.", parent) };
    let name = if field.name.contains('.') {
        format!("{}`{}`", prefix, field.name)
    } else {
        format!("{}{}", prefix, field.name)
    };

    out.push(ColumnTypeDescriptor { name: name.clone(), column_type: field.column_type.clone() });

    if include_nested {
        if let ColumnType::Struct { fields } = &field.column_type {
            for child in fields {
                collect_field(child, &name, include_nested, out);
            }
        }
    }
}
