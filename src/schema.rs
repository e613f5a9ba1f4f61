//! Configuration values, attribute schemas and per-resource state.
//!
//! The configuration layer hands resources loosely typed maps. This module
//! gives those maps a shape: [`Value`] is the tagged union for a single
//! attribute, [`Schema`] declares which attributes a resource accepts, and
//! [`ResourceData`] is the planned/persisted state a resource operation
//! reads from and writes to.

use crate::{ProviderError, Result};
use std::collections::BTreeMap;

/// A configuration value.
///
/// `Set` keeps its elements sorted and deduplicated so two sets with the
/// same members compare equal. `List` keeps the order it was given.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// String
    String(String),
    /// Ordered sequence
    List(Vec<Value>),
    /// Unordered collection of unique values
    Set(Vec<Value>),
    /// String-keyed mapping
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Builds a set, sorting and deduplicating the elements.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        let mut items: Vec<Value> = items.into_iter().collect();
        items.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        items.dedup();
        Value::Set(items)
    }

    /// Builds a list of strings.
    pub fn strings<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Value::List(items.into_iter().map(|s| Value::String(s.into())).collect())
    }

    /// Builds a set of strings.
    pub fn string_set<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Value::set(items.into_iter().map(|s| Value::String(s.into())))
    }

    fn sort_key(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => format!("{:?}", other),
        }
    }

    /// Returns true for the zero value of each variant.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::String(s) => s.is_empty(),
            Value::List(items) | Value::Set(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Elements of a list or a set.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// String elements of a list or a set, in stored order.
    ///
    /// Non-string elements are skipped.
    pub fn to_strings(&self) -> Vec<String> {
        self.as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

/// Declared type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Int,
    Bool,
    List,
    Set,
    Map,
}

impl AttributeType {
    fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (AttributeType::String, Value::String(_))
                | (AttributeType::Int, Value::Int(_))
                | (AttributeType::Bool, Value::Bool(_))
                | (AttributeType::List, Value::List(_))
                | (AttributeType::Set, Value::Set(_))
                | (AttributeType::Set, Value::List(_))
                | (AttributeType::Map, Value::Map(_))
        )
    }
}

/// Normalizes a string value before it is stored in state.
pub type Normalizer = fn(&str) -> String;

/// Checks a configured value. Receives the attribute name for messages.
pub type Validator = fn(&str, &Value) -> Result<()>;

/// Decides whether a configured value means the same as the prior state.
///
/// Called with the planned and the prior value. Returning true keeps the
/// prior value, so [`ResourceData::has_change`] reports no change.
pub type DiffSuppress = fn(&Value, &Value) -> bool;

/// One attribute of a resource schema.
///
/// Built with chained setters:
///
/// ```
/// use vaultres::schema::{Attribute, AttributeType, Value};
///
/// let attr = Attribute::new("backend", AttributeType::String)
///     .optional()
///     .force_new()
///     .default_value("approle")
///     .description("Unique name of the auth backend to configure.");
///
/// assert_eq!(attr.default, Some(Value::from("approle")));
/// ```
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub ty: AttributeType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    pub default: Option<Value>,
    pub description: String,
    pub normalize: Option<Normalizer>,
    pub validate: Option<Validator>,
    pub suppress_diff: Option<DiffSuppress>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, ty: AttributeType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            default: None,
            description: String::new(),
            normalize: None,
            validate: None,
            suppress_diff: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Changing the attribute replaces the remote object.
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn normalize(mut self, f: Normalizer) -> Self {
        self.normalize = Some(f);
        self
    }

    pub fn validate(mut self, f: Validator) -> Self {
        self.validate = Some(f);
        self
    }

    pub fn suppress_diff(mut self, f: DiffSuppress) -> Self {
        self.suppress_diff = Some(f);
        self
    }
}

/// Attribute declarations for one resource type.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    /// Looks up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Turns raw configuration into planned resource data.
    ///
    /// Unknown attributes, missing required attributes, type mismatches and
    /// validator failures are errors. Lists given for set attributes become
    /// sets. Defaults fill absent optional attributes, normalizers rewrite
    /// string values. When `prior` is given, its id and values become the
    /// baseline for [`ResourceData::has_change`] and computed attributes
    /// that are not configured keep their prior value. A configured value
    /// that the attribute's [`DiffSuppress`] deems equivalent is replaced by
    /// the prior value.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::UnknownAttribute`]
    /// - [`ProviderError::MissingAttribute`]
    /// - [`ProviderError::InvalidAttribute`]
    pub fn plan(
        &self,
        config: BTreeMap<String, Value>,
        prior: Option<&ResourceData>,
    ) -> Result<ResourceData> {
        for key in config.keys() {
            if self.attribute(key).is_none() {
                return Err(ProviderError::UnknownAttribute(key.clone()));
            }
        }

        let mut values = BTreeMap::new();
        for attr in &self.attributes {
            let configured = config.get(&attr.name).filter(|v| **v != Value::Null);

            let value = match configured {
                Some(value) => {
                    if !attr.required && !attr.optional {
                        return Err(ProviderError::invalid(
                            &attr.name,
                            "attribute is computed and cannot be set",
                        ));
                    }
                    if !attr.ty.accepts(value) {
                        return Err(ProviderError::invalid(
                            &attr.name,
                            format!("expected {:?}, got {}", attr.ty, value.type_name()),
                        ));
                    }
                    if let Some(validate) = attr.validate {
                        validate(&attr.name, value)?;
                    }
                    let value = coerce(attr, value.clone());
                    match (attr.suppress_diff, prior.and_then(|p| p.get(&attr.name))) {
                        (Some(same), Some(prior_value)) if same(&value, prior_value) => {
                            prior_value.clone()
                        }
                        _ => value,
                    }
                }
                None if attr.required => {
                    return Err(ProviderError::MissingAttribute(attr.name.clone()));
                }
                None => match (&attr.default, prior) {
                    (Some(default), _) => default.clone(),
                    (None, Some(prior)) if attr.computed => match prior.get(&attr.name) {
                        Some(value) => value.clone(),
                        None => continue,
                    },
                    _ => continue,
                },
            };

            values.insert(attr.name.clone(), value);
        }

        Ok(ResourceData {
            id: prior.and_then(|p| p.id.clone()),
            prior: prior.map(|p| p.values.clone()).unwrap_or_default(),
            values,
        })
    }

    /// Names of force-new attributes whose planned value differs from the
    /// prior state.
    pub fn replacement_reasons(&self, data: &ResourceData) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|a| a.force_new && data.id().is_some() && data.has_change(&a.name))
            .map(|a| a.name.clone())
            .collect()
    }
}

fn coerce(attr: &Attribute, value: Value) -> Value {
    let value = match (attr.ty, value) {
        (AttributeType::Set, Value::List(items)) => Value::set(items),
        (_, value) => value,
    };
    match (attr.normalize, value) {
        (Some(normalize), Value::String(s)) => Value::String(normalize(&s)),
        (_, value) => value,
    }
}

/// Planned or persisted state of one resource instance.
///
/// Resource operations read configuration from it and write the state they
/// observe on the server back into it. An instance with no id does not
/// exist (yet, or any more).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: Option<String>,
    values: BTreeMap<String, Value>,
    prior: BTreeMap<String, Value>,
}

impl ResourceData {
    /// Creates empty data with no id.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates data that only carries an id, as an import does.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Id or the empty string.
    pub fn id_or_empty(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Marks the instance as gone.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Value if it is set and not the zero value.
    pub fn get_ok(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_zero())
    }

    /// Value if it is set, even when it is the zero value.
    pub fn get_ok_exists(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| **v != Value::Null)
    }

    /// String value or `""`.
    pub fn get_str(&self, key: &str) -> &str {
        self.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Integer value or `0`.
    pub fn get_int(&self, key: &str) -> i64 {
        self.get(key).and_then(Value::as_int).unwrap_or(0)
    }

    /// Boolean value or `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// String elements of a list or set value, empty when unset.
    pub fn get_strings(&self, key: &str) -> Vec<String> {
        self.get(key).map(Value::to_strings).unwrap_or_default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Removes a value from state.
    pub fn unset(&mut self, key: &str) {
        self.values.remove(key);
    }

    /// True if the value differs from the prior state.
    pub fn has_change(&self, key: &str) -> bool {
        let normalize = |v: Option<&Value>| v.filter(|v| !v.is_zero()).cloned();
        normalize(self.values.get(key)) != normalize(self.prior.get(key))
    }

    /// Current values, as the configuration layer persists them.
    pub fn state(&self) -> &BTreeMap<String, Value> {
        &self.values
    }
}
