//! Declarative attribute schemas
//!
//! A [`ResourceSchema`] is built once per resource kind at startup and passed
//! around by reference. It knows each attribute's type, whether the user may
//! set it, whether changing it forces replacement, and its default.

use crate::error::{CloudError, Result};
use crate::identity::{DELIMITER, SegmentKind};
use serde_json::{Map, Value};

/// Semantic type of an attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrType {
    String,
    Int,
    Float,
    Bool,
    /// Ordered list
    List(Box<AttrType>),
    /// Unordered collection, compared without regard to order
    Set(Box<AttrType>),
    /// Nested block with free-form keys
    Object,
}

impl AttrType {
    pub fn list_of(inner: AttrType) -> Self {
        AttrType::List(Box::new(inner))
    }

    pub fn set_of(inner: AttrType) -> Self {
        AttrType::Set(Box::new(inner))
    }

    fn is_collection(&self) -> bool {
        matches!(self, AttrType::List(_) | AttrType::Set(_))
    }

    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (AttrType::String, Value::String(_)) => true,
            (AttrType::Int, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (AttrType::Float, Value::Number(_)) => true,
            (AttrType::Bool, Value::Bool(_)) => true,
            (AttrType::List(inner) | AttrType::Set(inner), Value::Array(items)) => {
                items.iter().all(|item| inner.accepts(item))
            }
            (AttrType::Object, Value::Object(_)) => true,
            _ => false,
        }
    }

    fn name(&self) -> String {
        match self {
            AttrType::String => "string".to_string(),
            AttrType::Int => "integer".to_string(),
            AttrType::Float => "number".to_string(),
            AttrType::Bool => "bool".to_string(),
            AttrType::List(inner) => format!("list of {}", inner.name()),
            AttrType::Set(inner) => format!("set of {}", inner.name()),
            AttrType::Object => "block".to_string(),
        }
    }
}

/// Who owns an attribute's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    /// Assigned by the remote system; never set by the user
    Computed,
    /// Set by the user and updatable in place
    Settable,
    /// Set by the user at create time; changing it requires replacement
    Immutable,
}

/// Schema of a single attribute
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: &'static str,
    pub attr_type: AttrType,
    pub mutability: Mutability,
    pub required: bool,
    pub default: Option<Value>,
    /// The value becomes a segment of the resource identity
    pub identity: bool,
    pub description: &'static str,
}

impl AttributeSchema {
    fn new(name: &'static str, attr_type: AttrType, mutability: Mutability) -> Self {
        Self {
            name,
            attr_type,
            mutability,
            required: false,
            default: None,
            identity: false,
            description: "",
        }
    }

    pub fn required(name: &'static str, attr_type: AttrType) -> Self {
        Self {
            required: true,
            ..Self::new(name, attr_type, Mutability::Settable)
        }
    }

    pub fn optional(name: &'static str, attr_type: AttrType) -> Self {
        Self::new(name, attr_type, Mutability::Settable)
    }

    pub fn computed(name: &'static str, attr_type: AttrType) -> Self {
        Self::new(name, attr_type, Mutability::Computed)
    }

    /// Changing this attribute after create forces replacement
    pub fn immutable(mut self) -> Self {
        self.mutability = Mutability::Immutable;
        self
    }

    /// The declared value is used as an identity segment
    pub fn identity_segment(mut self) -> Self {
        self.identity = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn is_settable(&self) -> bool {
        self.mutability != Mutability::Computed
    }

    pub fn is_immutable(&self) -> bool {
        self.mutability == Mutability::Immutable
    }
}

/// Schema of one resource kind
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub description: &'static str,
    /// Positional layout of the kind's identity
    pub identity: Vec<SegmentKind>,
    pub attributes: Vec<AttributeSchema>,
}

impl ResourceSchema {
    pub fn new(type_name: &'static str, identity: Vec<SegmentKind>) -> Self {
        Self {
            type_name,
            description: "",
            identity,
            attributes: Vec::new(),
        }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn attribute(mut self, attribute: AttributeSchema) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn settable(&self) -> impl Iterator<Item = &AttributeSchema> {
        self.attributes.iter().filter(|a| a.is_settable())
    }

    /// Check a declared plan against the schema
    pub fn validate(&self, plan: &Value) -> Result<()> {
        let object = as_object(plan)?;

        for key in object.keys() {
            let Some(attribute) = self.get(key) else {
                return Err(CloudError::validation(
                    key.as_str(),
                    format!("unsupported attribute for {}", self.type_name),
                ));
            };
            let value = &object[key];
            if attribute.mutability == Mutability::Computed && !value.is_null() {
                return Err(CloudError::validation(
                    key.as_str(),
                    "attribute is computed by the remote system and cannot be set",
                ));
            }
            if !attribute.attr_type.accepts(value) {
                return Err(CloudError::validation(
                    key.as_str(),
                    format!("expected {}", attribute.attr_type.name()),
                ));
            }
            if attribute.identity
                && let Some(s) = value.as_str()
                && s.contains(DELIMITER)
            {
                return Err(CloudError::validation(
                    key.as_str(),
                    format!("{:?} is used in the identity and must not contain '{}'", s, DELIMITER),
                ));
            }
        }

        for attribute in self.attributes.iter().filter(|a| a.required) {
            if object.get(attribute.name).is_none_or(Value::is_null) {
                return Err(CloudError::validation(
                    attribute.name,
                    "required attribute is missing",
                ));
            }
        }

        Ok(())
    }

    /// Fill settable attributes the plan leaves unset with their declared default
    pub fn apply_defaults(&self, plan: &mut Value) -> Result<()> {
        let object = as_object_mut(plan)?;
        for attribute in self.settable() {
            if let Some(default) = &attribute.default
                && !object.contains_key(attribute.name)
            {
                object.insert(attribute.name.to_string(), default.clone());
            }
        }
        Ok(())
    }

    /// Wrap scalars given for collection attributes into one-element lists
    pub fn normalize(&self, plan: &mut Value) -> Result<()> {
        let object = as_object_mut(plan)?;
        for attribute in &self.attributes {
            if !attribute.attr_type.is_collection() {
                continue;
            }
            if let Some(value) = object.get_mut(attribute.name)
                && !value.is_array()
                && !value.is_null()
            {
                *value = Value::Array(vec![value.take()]);
            }
        }
        Ok(())
    }

    /// Restore immutable attributes in `updated` from `prior`.
    ///
    /// A snapshot read after create never overwrites what the user declared
    /// for an immutable attribute.
    pub fn preserve_immutable(&self, prior: &Value, updated: &mut Value) -> Result<()> {
        let prior = as_object(prior)?;
        let updated = as_object_mut(updated)?;
        for attribute in self.attributes.iter().filter(|a| a.is_immutable()) {
            match prior.get(attribute.name) {
                Some(value) => {
                    updated.insert(attribute.name.to_string(), value.clone());
                }
                None => {
                    updated.remove(attribute.name);
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn as_object(value: &Value) -> Result<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| CloudError::InvalidState("resource record must be an object".to_string()))
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>> {
    value
        .as_object_mut()
        .ok_or_else(|| CloudError::InvalidState("resource record must be an object".to_string()))
}
