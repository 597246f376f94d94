use crate::core::schema::Block;
use serde_json::{Map, Value};

/// The attribute bag a resource reads its inputs from and writes its state to.
///
/// `attrs` holds the planned (or current) values, `prior` the state Terraform
/// stored after the previous apply. Absent keys read as the zero value of
/// their type, as in the Terraform SDK.
#[derive(Debug, Clone, Default)]
pub struct ResourceData {
    id: String,
    attrs: Map<String, Value>,
    prior: Map<String, Value>,
}

impl ResourceData {
    pub fn new(attrs: Map<String, Value>) -> Self {
        let id = attrs
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            id,
            attrs,
            prior: Map::new(),
        }
    }

    /// Builds the bag for an update: the id comes from the prior state.
    pub fn with_prior(prior: Map<String, Value>, planned: Map<String, Value>) -> Self {
        let mut data = Self::new(planned);
        if let Some(id) = prior.get("id").and_then(Value::as_str) {
            data.id = id.to_string();
        }
        data.prior = prior;
        data
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key).filter(|v| !v.is_null())
    }

    /// Some only when the attribute is set to a non-zero value.
    pub fn get_ok(&self, key: &str) -> Option<&Value> {
        self.get(key).filter(|v| !is_zero(v))
    }

    pub fn get_str(&self, key: &str) -> &str {
        self.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn get_int(&self, key: &str) -> i64 {
        self.get(key).and_then(Value::as_i64).unwrap_or(0)
    }

    pub fn get_list(&self, key: &str) -> &[Value] {
        self.get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get_map(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        string_list(self.get_list(key))
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.attrs.insert(key.to_string(), value.into());
    }

    /// Unset and zero values compare equal, at any depth.
    pub fn has_change(&self, key: &str) -> bool {
        let (old, new) = self.get_change(key);
        without_zero_values(&old) != without_zero_values(&new)
    }

    pub fn get_change(&self, key: &str) -> (Value, Value) {
        let normalize = |v: Option<&Value>| match v {
            Some(v) if !v.is_null() => v.clone(),
            _ => Value::Null,
        };
        (normalize(self.prior.get(key)), normalize(self.attrs.get(key)))
    }

    /// Final state to hand back to Terraform; None when the object is gone.
    pub fn into_state(mut self, block: &Block) -> Option<Map<String, Value>> {
        if self.id.is_empty() {
            return None;
        }
        if block.get("id").is_none() {
            self.attrs.insert("id".to_string(), Value::String(self.id));
        }
        Some(self.attrs)
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
    }
}

fn without_zero_values(value: &Value) -> Value {
    match value {
        Value::Object(entries) => Value::Object(
            entries
                .iter()
                .filter(|(_, v)| !is_zero(v))
                .map(|(k, v)| (k.clone(), without_zero_values(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(without_zero_values).collect()),
        v if is_zero(v) => Value::Null,
        v => v.clone(),
    }
}

pub fn string_list(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}
