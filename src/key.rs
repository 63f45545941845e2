use std::borrow::Cow;
use std::fmt;

use sea_orm::Value;

/// One component of a composite primary key: a column name paired with its
/// typed value.
///
/// The value is the mapper's own [`Value`] enum, so equality is type-aware
/// (`Int(1)` and `BigInt(1)` are different keys). A value carrying `None`
/// (e.g. `Value::Int(None)`) marks the component as unassigned, letting the
/// store generate it on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyField {
    name: Cow<'static, str>,
    value: Value,
}

impl KeyField {
    pub fn new<N, V>(name: N, value: V) -> Self
    where
        N: Into<Cow<'static, str>>,
        V: Into<Value>,
    {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }
}

/// A composite primary key: an ordered list of [`KeyField`]s.
///
/// Equality is set equality: field order does not matter, every name/value
/// pair must match and the cardinality must agree. For a given entity type
/// the cardinality and field names are fixed.
#[derive(Debug, Clone, Default)]
pub struct PrimaryKey(Vec<KeyField>);

impl PrimaryKey {
    #[must_use]
    pub fn new(fields: Vec<KeyField>) -> Self {
        Self(fields)
    }

    /// Convenience constructor for the common single-column key.
    pub fn single<N, V>(name: N, value: V) -> Self
    where
        N: Into<Cow<'static, str>>,
        V: Into<Value>,
    {
        Self(vec![KeyField::new(name, value)])
    }

    #[must_use]
    pub fn fields(&self) -> &[KeyField] {
        &self.0
    }

    /// Value of the component named `name`, if present.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|field| field.name == name)
            .map(KeyField::value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for PrimaryKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|field| other.0.contains(field))
    }
}

impl From<KeyField> for PrimaryKey {
    fn from(field: KeyField) -> Self {
        Self(vec![field])
    }
}

impl FromIterator<KeyField> for PrimaryKey {
    fn from_iter<I: IntoIterator<Item = KeyField>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PrimaryKey {
    type Item = KeyField;
    type IntoIter = std::vec::IntoIter<KeyField>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.len() > 1 {
            write!(f, "(")?;
        }
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={:?}", field.name, field.value)?;
        }
        if self.0.len() > 1 {
            write!(f, ")")?;
        }
        Ok(())
    }
}
