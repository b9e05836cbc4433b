//! Tri-state attribute values
//!
//! A model attribute is either left out of the configuration (`Unset`),
//! explicitly cleared (`Null`), or carries a value. Model structs mark every
//! `Field` with
//! `#[serde(default, skip_serializing_if = "Field::is_unset")]`
//! so that an unset attribute never appears in the serialized record.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Unset,
    Null,
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Unset
    }
}

impl<T> Field<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Field::Unset)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    /// Unset or null
    pub fn is_empty(&self) -> bool {
        !matches!(self, Field::Value(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Field::Unset => Field::Unset,
            Field::Null => Field::Null,
            Field::Value(v) => Field::Value(v),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Unset => Field::Unset,
            Field::Null => Field::Null,
            Field::Value(v) => Field::Value(f(v)),
        }
    }

    /// `Value` for `Some`, `Null` for `None`
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Value(v),
            None => Field::Null,
        }
    }
}

impl<T: Clone> Field<T> {
    pub fn cloned_option(&self) -> Option<T> {
        self.value().cloned()
    }
}

impl<T: Default> Field<T> {
    /// `Value` for `Some`, the zero value for `None`.
    ///
    /// The remote API omits zeroed numeric attributes; treating them as zero
    /// keeps them from showing up as drift on every refresh.
    pub fn with_default(value: Option<T>) -> Self {
        Field::Value(value.unwrap_or_default())
    }

    pub fn value_or_default(&self) -> T
    where
        T: Clone,
    {
        self.value().cloned().unwrap_or_default()
    }
}

impl Field<String> {
    pub fn as_deref(&self) -> Option<&str> {
        self.value().map(String::as_str)
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Value(value)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Value(v) => v.serialize(serializer),
            Field::Unset | Field::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Field::from_option(Option::<T>::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default, skip_serializing_if = "Field::is_unset")]
        label: Field<String>,
        #[serde(default, skip_serializing_if = "Field::is_unset")]
        ttl: Field<i64>,
    }

    #[test]
    fn test_unset_is_skipped() {
        let sample = Sample {
            label: Field::Value("db1".to_string()),
            ttl: Field::Unset,
        };
        assert_eq!(serde_json::to_value(&sample).unwrap(), json!({"label": "db1"}));
    }

    #[test]
    fn test_null_is_kept() {
        let sample = Sample {
            label: Field::Null,
            ttl: Field::Value(0),
        };
        assert_eq!(
            serde_json::to_value(&sample).unwrap(),
            json!({"label": null, "ttl": 0})
        );
    }

    #[test]
    fn test_deserialize_tri_state() {
        let sample: Sample = serde_json::from_value(json!({"label": null})).unwrap();
        assert_eq!(sample.label, Field::Null);
        assert_eq!(sample.ttl, Field::Unset);

        let sample: Sample = serde_json::from_value(json!({"ttl": 300})).unwrap();
        assert_eq!(sample.ttl, Field::Value(300));
        assert!(sample.label.is_unset());
    }

    #[test]
    fn test_with_default() {
        assert_eq!(Field::<i64>::with_default(None), Field::Value(0));
        assert_eq!(Field::with_default(Some(30)), Field::Value(30));
    }
}
