use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The declared type of a column, as reported by `table.column_types`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    Decimal,
    String,
    Date,
    Timestamp,
    Struct { fields: Vec<StructField> },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    pub column_type: ColumnType,
}

impl StructField {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self { name: name.into(), column_type }
    }
}

impl ColumnType {
    /// Types whose rows can carry a NaN marker that a plain null filter does not remove.
    ///
    /// `Float` and the narrow integer types are excluded.
    pub fn may_contain_nan(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Long | ColumnType::Double)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::Timestamp)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Struct { fields } => {
                write!(f, "struct<")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}:{}", field.name, field.column_type)?;
                }
                write!(f, ">")
            }
            other => write!(f, "{}", format!("{:?}", other).to_lowercase()),
        }
    }
}

/// Start of day, used wherever a date meets a timestamp.
#[inline(always)]
pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Struct(Vec<Scalar>),
}

impl Scalar {
    #[inline(always)]
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Null, or a float NaN. Both count as "missing" for difference purposes.
    #[inline(always)]
    pub fn is_missing(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Boolean(_) => "boolean",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Str(_) => "string",
            Scalar::Date(_) => "date",
            Scalar::Timestamp(_) => "timestamp",
            Scalar::Struct(_) => "struct",
        }
    }

    /// Ordering used by window `ORDER BY`: nulls first, then by value.
    /// Values of unrelated types order by their type rank.
    pub fn sort_cmp(&self, other: &Scalar) -> Ordering {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => Ordering::Equal,
            (Scalar::Null, _) => Ordering::Less,
            (_, Scalar::Null) => Ordering::Greater,
            (Scalar::Int(a), Scalar::Float(b)) => (*a as f64).total_cmp(b),
            (Scalar::Float(a), Scalar::Int(b)) => a.total_cmp(&(*b as f64)),
            (Scalar::Date(a), Scalar::Timestamp(b)) => midnight(*a).cmp(b),
            (Scalar::Timestamp(a), Scalar::Date(b)) => a.cmp(&midnight(*b)),
            (Scalar::Boolean(a), Scalar::Boolean(b)) => a.cmp(b),
            (Scalar::Int(a), Scalar::Int(b)) => a.cmp(b),
            (Scalar::Float(a), Scalar::Float(b)) => a.total_cmp(b),
            (Scalar::Str(a), Scalar::Str(b)) => a.cmp(b),
            (Scalar::Date(a), Scalar::Date(b)) => a.cmp(b),
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => a.cmp(b),
            (Scalar::Struct(a), Scalar::Struct(b)) => a
                .iter()
                .zip(b)
                .map(|(x, y)| x.sort_cmp(y))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (a, b) => a.type_rank().cmp(&b.type_rank()),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Scalar::Null => 0,
            Scalar::Boolean(_) => 1,
            Scalar::Int(_) | Scalar::Float(_) => 2,
            Scalar::Str(_) => 3,
            Scalar::Date(_) | Scalar::Timestamp(_) => 4,
            Scalar::Struct(_) => 5,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "NULL"),
            Scalar::Boolean(b) => write!(f, "{}", b),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Str(s) => write!(f, "'{}'", s),
            Scalar::Date(d) => write!(f, "DATE '{}'", d),
            Scalar::Timestamp(t) => write!(f, "TIMESTAMP '{}'", t),
            Scalar::Struct(values) => {
                write!(f, "(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self { Scalar::Int(v) }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self { Scalar::Int(v as i64) }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self { Scalar::Float(v) }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self { Scalar::Boolean(v) }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self { Scalar::Str(v.to_string()) }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self { Scalar::Str(v) }
}

impl From<NaiveDate> for Scalar {
    fn from(v: NaiveDate) -> Self { Scalar::Date(v) }
}

impl From<NaiveDateTime> for Scalar {
    fn from(v: NaiveDateTime) -> Self { Scalar::Timestamp(v) }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Scalar::Null)
    }
}
