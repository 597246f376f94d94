use crate::core::diagnostics::Diagnostics;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

static COMPILED_PATTERNS: Lazy<Mutex<HashMap<&'static str, Regex>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Compiles a validator pattern once per process.
fn compiled(pattern: &'static str) -> Result<Regex, regex::Error> {
    let mut cache = COMPILED_PATTERNS
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(re) = cache.get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)?;
    cache.insert(pattern, re.clone());
    Ok(re)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    String,
    Int,
    Bool,
    List,
    Set,
    Map,
}

impl ValueType {
    pub fn zero_value(self) -> Value {
        match self {
            ValueType::String => Value::String(String::new()),
            ValueType::Int => Value::from(0),
            ValueType::Bool => Value::Bool(false),
            ValueType::List | ValueType::Set => Value::Array(Vec::new()),
            ValueType::Map => Value::Object(Map::new()),
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            ValueType::String => value.is_string(),
            ValueType::Int => value.is_i64() || value.is_u64(),
            ValueType::Bool => value.is_boolean(),
            ValueType::List | ValueType::Set => value.is_array(),
            ValueType::Map => value.is_object(),
        }
    }
}

/// Element of a list, set or map attribute.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Value(ValueType),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Validator {
    IntBetween { min: i64, max: i64 },
    StringInSlice { values: &'static [&'static str] },
    StringMatch { pattern: &'static str, message: &'static str },
    StringLenBetween { min: usize, max: usize },
}

impl Validator {
    fn check(&self, name: &str, value: &Value) -> Option<String> {
        match self {
            Validator::IntBetween { min, max } => {
                let v = value.as_i64()?;
                (v < *min || v > *max).then(|| {
                    format!(
                        "expected {} to be in the range ({} - {}), got {}",
                        name, min, max, v
                    )
                })
            }
            Validator::StringInSlice { values } => {
                let v = value.as_str()?;
                (!values.contains(&v))
                    .then(|| format!("expected {} to be one of {:?}, got {}", name, values, v))
            }
            Validator::StringMatch { pattern, message } => {
                let v = value.as_str()?;
                match compiled(*pattern) {
                    Ok(re) if re.is_match(v) => None,
                    Ok(_) => Some(format!("invalid value for {} ({})", name, message)),
                    Err(e) => Some(format!("invalid pattern for {}: {}", name, e)),
                }
            }
            Validator::StringLenBetween { min, max } => {
                let v = value.as_str()?;
                let len = v.chars().count();
                (len < *min || len > *max).then(|| {
                    format!(
                        "expected length of {} to be in the range ({} - {}), got {}",
                        name, min, max, v
                    )
                })
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub force_new: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_default: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elem: Option<Element>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
}

impl Attribute {
    fn of(value_type: ValueType) -> Self {
        Self {
            value_type,
            ..Default::default()
        }
    }

    pub fn string() -> Self {
        Self::of(ValueType::String)
    }

    pub fn int() -> Self {
        Self::of(ValueType::Int)
    }

    pub fn bool() -> Self {
        Self::of(ValueType::Bool)
    }

    pub fn list_of_strings() -> Self {
        Self {
            elem: Some(Element::Value(ValueType::String)),
            ..Self::of(ValueType::List)
        }
    }

    pub fn set_of_strings() -> Self {
        Self {
            elem: Some(Element::Value(ValueType::String)),
            ..Self::of(ValueType::Set)
        }
    }

    pub fn map_of_strings() -> Self {
        Self {
            elem: Some(Element::Value(ValueType::String)),
            ..Self::of(ValueType::Map)
        }
    }

    pub fn list_block(block: Block) -> Self {
        Self {
            elem: Some(Element::Block(block)),
            ..Self::of(ValueType::List)
        }
    }

    pub fn set_block(block: Block) -> Self {
        Self {
            elem: Some(Element::Block(block)),
            ..Self::of(ValueType::Set)
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
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

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.optional = true;
        self.default = Some(value.into());
        self
    }

    pub fn env_default(mut self, var: &'static str) -> Self {
        self.env_default = Some(var);
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    fn block(&self) -> Option<&Block> {
        match &self.elem {
            Some(Element::Block(block)) => Some(block),
            _ => None,
        }
    }

    fn resolve_default(&self) -> Option<Value> {
        if let Some(var) = self.env_default {
            if let Ok(value) = std::env::var(var) {
                return Some(Value::String(value));
            }
        }
        self.default.clone()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Block {
    pub attributes: BTreeMap<String, Attribute>,
}

fn is_null(value: Option<&Value>) -> bool {
    value.map_or(true, Value::is_null)
}

fn child_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.insert(name.to_string(), attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Fills unset attributes from their defaults (env defaults first) and
    /// sorts set attributes.
    pub fn apply_defaults(&self, obj: &mut Map<String, Value>) {
        for (name, attr) in &self.attributes {
            if is_null(obj.get(name)) {
                if let Some(default) = attr.resolve_default() {
                    obj.insert(name.clone(), default);
                }
                continue;
            }

            if let Some(Value::Array(items)) = obj.get_mut(name) {
                if let Some(block) = attr.block() {
                    for item in items.iter_mut() {
                        if let Value::Object(item) = item {
                            block.apply_defaults(item);
                        }
                    }
                }
                if attr.value_type == ValueType::Set {
                    items.sort_by_key(|item| item.to_string());
                    items.dedup();
                }
            }
        }
    }

    /// Drops computed-only attributes a caller echoed back from state.
    pub fn strip_computed(&self, obj: &mut Map<String, Value>) {
        for (name, attr) in &self.attributes {
            if attr.is_computed_only() {
                obj.remove(name);
                continue;
            }
            if let (Some(block), Some(Value::Array(items))) = (attr.block(), obj.get_mut(name)) {
                for item in items.iter_mut() {
                    if let Value::Object(item) = item {
                        block.strip_computed(item);
                    }
                }
            }
        }
    }

    pub fn validate(&self, obj: &Map<String, Value>, path: &str) -> Diagnostics {
        let mut diags = Diagnostics::new();

        for key in obj.keys() {
            if !self.attributes.contains_key(key) && key != "id" {
                diags.error(
                    format!("An argument named \"{}\" is not expected here", key),
                    Some(child_path(path, key)),
                );
            }
        }

        for (name, attr) in &self.attributes {
            let attr_path = child_path(path, name);
            let value = match obj.get(name) {
                Some(value) if !value.is_null() => value,
                _ => {
                    if attr.required {
                        diags.error(
                            format!("The argument \"{}\" is required", name),
                            Some(attr_path),
                        );
                    }
                    continue;
                }
            };

            if attr.is_computed_only() {
                diags.error(
                    format!("\"{}\" is computed and cannot be set", name),
                    Some(attr_path),
                );
                continue;
            }

            if !attr.value_type.accepts(value) {
                diags.error(
                    format!(
                        "Incorrect attribute value type: {} must be {:?}",
                        name, attr.value_type
                    ),
                    Some(attr_path),
                );
                continue;
            }

            for validator in &attr.validators {
                if let Some(message) = validator.check(name, value) {
                    diags.error(message, Some(attr_path.clone()));
                }
            }

            match value {
                Value::Array(items) => {
                    if let Some(max) = attr.max_items {
                        if items.len() > max {
                            diags.error(
                                format!(
                                    "Too many {} blocks: no more than {} allowed",
                                    name, max
                                ),
                                Some(attr_path.clone()),
                            );
                        }
                    }
                    for (i, item) in items.iter().enumerate() {
                        let item_path = format!("{}[{}]", attr_path, i);
                        match (&attr.elem, item) {
                            (Some(Element::Block(block)), Value::Object(item)) => {
                                diags.extend(block.validate(item, &item_path));
                            }
                            (Some(Element::Value(t)), item) if !t.accepts(item) => {
                                diags.error(
                                    format!("Incorrect element type: expected {:?}", t),
                                    Some(item_path),
                                );
                            }
                            (Some(Element::Block(_)), _) => {
                                diags.error("Expected a block", Some(item_path));
                            }
                            _ => {}
                        }
                    }
                }
                Value::Object(entries) => {
                    if let Some(Element::Value(t)) = &attr.elem {
                        for (key, entry) in entries {
                            if !t.accepts(entry) {
                                diags.error(
                                    format!("Incorrect element type: expected {:?}", t),
                                    Some(format!("{}.{}", attr_path, key)),
                                );
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        diags
    }

    /// Copies computed values the plan left unset from the prior state,
    /// pairing nested blocks by list index.
    pub fn merge_computed(&self, prior: &Map<String, Value>, planned: &mut Map<String, Value>) {
        for (name, attr) in &self.attributes {
            if attr.computed && is_null(planned.get(name)) {
                if let Some(value) = prior.get(name).filter(|v| !v.is_null()) {
                    planned.insert(name.clone(), value.clone());
                }
                continue;
            }

            let Some(block) = attr.block() else { continue };
            if let (Some(Value::Array(old)), Some(Value::Array(new))) =
                (prior.get(name), planned.get_mut(name))
            {
                for (old_item, new_item) in old.iter().zip(new.iter_mut()) {
                    if let (Value::Object(old_item), Value::Object(new_item)) = (old_item, new_item)
                    {
                        block.merge_computed(old_item, new_item);
                    }
                }
            }
        }
    }

    /// Unset attributes whose prior value is the zero value of their type
    /// keep that value, so Read's `""` or `[]` does not show up as a diff.
    /// Nested blocks pair by list index.
    pub fn keep_zero_values(&self, prior: &Map<String, Value>, planned: &mut Map<String, Value>) {
        for (name, attr) in &self.attributes {
            if attr.is_computed_only() {
                continue;
            }
            if is_null(planned.get(name)) {
                if let Some(old) = prior
                    .get(name)
                    .filter(|old| **old == attr.value_type.zero_value())
                {
                    planned.insert(name.clone(), old.clone());
                }
                continue;
            }

            let Some(block) = attr.block() else { continue };
            if let (Some(Value::Array(old)), Some(Value::Array(new))) =
                (prior.get(name), planned.get_mut(name))
            {
                for (old_item, new_item) in old.iter().zip(new.iter_mut()) {
                    if let (Value::Object(old_item), Value::Object(new_item)) = (old_item, new_item)
                    {
                        block.keep_zero_values(old_item, new_item);
                    }
                }
            }
        }
    }

    pub fn requires_replace(
        &self,
        prior: &Map<String, Value>,
        planned: &Map<String, Value>,
    ) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|(_, attr)| attr.force_new)
            .filter(|(name, attr)| {
                let zero = attr.value_type.zero_value();
                let old = prior.get(*name).filter(|v| !v.is_null()).unwrap_or(&zero);
                let new = planned.get(*name).filter(|v| !v.is_null()).unwrap_or(&zero);
                old != new
            })
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceSchema {
    pub description: String,
    pub block: Block,
}

impl ResourceSchema {
    pub fn new(description: &str, block: Block) -> Self {
        Self {
            description: description.to_string(),
            block,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderSchema {
    pub provider: Block,
    pub resources: BTreeMap<String, ResourceSchema>,
    pub data_sources: BTreeMap<String, ResourceSchema>,
}
