use std::collections::BTreeSet;
use std::fmt;

use super::error::Diagnostic;
use super::metrics::DerivedMetric;

// ---------------------------------------------------------------------------
// Well-known column names of the player table
// ---------------------------------------------------------------------------

pub mod columns {
    pub const PLAYER: &str = "Player";
    pub const NATION: &str = "Nation";
    pub const POS: &str = "Pos";
    pub const COMP: &str = "Comp";
    pub const AGE: &str = "Age";
    pub const MP: &str = "MP";
    pub const MIN: &str = "Min";
    pub const GLS: &str = "Gls";
    pub const AST: &str = "Ast";

    /// Columns every dashboard feature relies on. `Age` is optional.
    pub const REQUIRED: [&str; 8] = [PLAYER, POS, COMP, NATION, MP, MIN, GLS, AST];
}

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
/// Groupings key on `Value` through `BTreeMap`, so it must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        use Value::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Less,
            (_, Null) => Ordering::Greater,
            (Integer(a), Integer(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            // Mixed numerics compare by magnitude, numbers sort before text.
            (Integer(_) | Float(_), Integer(_) | Float(_)) => {
                let a = self.as_f64().unwrap_or_default();
                let b = other.as_f64().unwrap_or_default();
                a.total_cmp(&b)
                    .then_with(|| matches!(self, Float(_)).cmp(&matches!(other, Float(_))))
            }
            (Text(_), _) => Ordering::Greater,
            (_, Text(_)) => Ordering::Less,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Numeric view of the cell. Text, null and NaN have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) if v.is_nan() => None,
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Storage type inferred for a whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub dtype: ColumnType,
}

impl Field {
    pub fn new(name: impl Into<String>, dtype: ColumnType) -> Self {
        Field {
            name: name.into(),
            dtype,
        }
    }
}

/// Ordered column list, in source order followed by derived columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Schema { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

// ---------------------------------------------------------------------------
// Record – one row (one player in one competition)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Record { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Cell at a column position; out-of-range positions read as null.
    pub fn get(&self, index: usize) -> &Value {
        static NULL: Value = Value::Null;
        self.values.get(index).unwrap_or(&NULL)
    }

    pub(crate) fn set(&mut self, index: usize, value: Value) {
        if index < self.values.len() {
            self.values[index] = value;
        } else {
            self.values.resize(index, Value::Null);
            self.values.push(value);
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – an immutable, ordered player table
// ---------------------------------------------------------------------------

/// An ordered collection of records sharing one schema.
///
/// A loaded dataset is never mutated: filters and derivations return new
/// datasets that carry over the schema, the computed metric set and the
/// load-time diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    schema: Schema,
    records: Vec<Record>,
    metrics: BTreeSet<DerivedMetric>,
    diagnostics: Vec<Diagnostic>,
}

impl Dataset {
    pub fn new(schema: Schema, records: Vec<Record>) -> Self {
        Dataset {
            schema,
            records,
            metrics: BTreeSet::new(),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn with_derivation(
        mut self,
        metrics: BTreeSet<DerivedMetric>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        self.metrics = metrics;
        self.diagnostics = diagnostics;
        self
    }

    /// A new dataset with the same schema and capabilities but other rows.
    pub fn with_records(&self, records: Vec<Record>) -> Dataset {
        Dataset {
            schema: self.schema.clone(),
            records,
            metrics: self.metrics.clone(),
            diagnostics: self.diagnostics.clone(),
        }
    }

    /// A copy with `field` appended (or replaced when a column of that name
    /// exists). `values` is indexed by row.
    pub fn with_column(&self, field: Field, values: Vec<Value>) -> Dataset {
        let mut fields = self.schema.fields().to_vec();
        let index = match self.schema.index_of(&field.name) {
            Some(i) => {
                fields[i] = field;
                i
            }
            None => {
                fields.push(field);
                fields.len() - 1
            }
        };
        let mut values = values.into_iter();
        let records = self
            .records
            .iter()
            .map(|r| {
                let mut r = r.clone();
                r.set(index, values.next().unwrap_or(Value::Null));
                r
            })
            .collect();
        Dataset {
            schema: Schema::new(fields),
            records,
            metrics: self.metrics.clone(),
            diagnostics: self.diagnostics.clone(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.contains(name)
    }

    /// Whether the loader could compute `metric` for this table.
    pub fn has_metric(&self, metric: DerivedMetric) -> bool {
        self.metrics.contains(&metric)
    }

    pub fn metrics(&self) -> &BTreeSet<DerivedMetric> {
        &self.metrics
    }

    /// Schema warnings collected when the table was loaded.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Iterate one column's cells in row order.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let index = self.schema.index_of(name)?;
        Some(self.records.iter().map(move |r| r.get(index)))
    }

    /// Non-null numeric cells of a column. Absent column yields nothing.
    pub fn numbers(&self, name: &str) -> Vec<f64> {
        match self.column(name) {
            Some(cells) => cells.filter_map(Value::as_f64).collect(),
            None => Vec::new(),
        }
    }

    /// Cell of `record` in column `name`, null when the column is absent.
    pub fn value<'a>(&self, record: &'a Record, name: &str) -> &'a Value {
        static NULL: Value = Value::Null;
        match self.schema.index_of(name) {
            Some(i) => record.get(i),
            None => &NULL,
        }
    }

    /// Display name of the player in `record`, `"N/A"` when unknown.
    pub fn player_name(&self, record: &Record) -> String {
        match self.value(record, columns::PLAYER) {
            Value::Null => "N/A".to_string(),
            v => v.to_string(),
        }
    }
}
