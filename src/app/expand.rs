//! Translation between Terraform attribute blocks and Unleash JSON models.

use crate::app::strategy_params::format_parameter;
use crate::core::resource_data::string_list;
use crate::domain::model::{
    Environment, FeatureStrategy, FeatureTag, StrategyConstraint, Variant, VariantPayload,
};
use serde_json::{json, Map, Value};

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn bool_field(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn list_field<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    obj.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn objects(items: &[Value]) -> impl Iterator<Item = &Map<String, Value>> {
    items.iter().filter_map(Value::as_object)
}

pub fn expand_variant(obj: &Map<String, Value>) -> Variant {
    let payload = objects(list_field(obj, "payload"))
        .next()
        .map(|payload| VariantPayload {
            payload_type: str_field(payload, "type").to_string(),
            value: str_field(payload, "value").to_string(),
        });

    Variant {
        name: str_field(obj, "name").to_string(),
        stickiness: str_field(obj, "stickiness").to_string(),
        weight: obj.get("weight").and_then(Value::as_i64).unwrap_or(0),
        weight_type: str_field(obj, "weight_type").to_string(),
        payload,
    }
}

pub fn expand_variants(items: &[Value]) -> Vec<Variant> {
    objects(items).map(expand_variant).collect()
}

pub fn expand_constraint(obj: &Map<String, Value>) -> StrategyConstraint {
    StrategyConstraint {
        context_name: str_field(obj, "context_name").to_string(),
        operator: str_field(obj, "operator").to_string(),
        value: str_field(obj, "value").to_string(),
        values: string_list(list_field(obj, "values")),
        inverted: bool_field(obj, "inverted"),
        case_insensitive: bool_field(obj, "case_insensitive"),
    }
}

/// Strategy parameters are always sent as strings.
pub fn expand_parameters(params: Option<&Map<String, Value>>) -> Map<String, Value> {
    params
        .into_iter()
        .flatten()
        .map(|(k, v)| (k.clone(), Value::String(format_parameter(v))))
        .collect()
}

/// None for a strategy block without a name.
pub fn expand_strategy(obj: &Map<String, Value>) -> Option<FeatureStrategy> {
    let name = str_field(obj, "name");
    if name.is_empty() {
        return None;
    }

    Some(FeatureStrategy {
        id: str_field(obj, "id").to_string(),
        name: name.to_string(),
        parameters: expand_parameters(obj.get("parameters").and_then(Value::as_object)),
        constraints: objects(list_field(obj, "constraint"))
            .map(expand_constraint)
            .collect(),
        variants: expand_variants(list_field(obj, "variant")),
    })
}

pub fn expand_environment(value: &Value) -> Environment {
    let empty = Map::new();
    let obj = value.as_object().unwrap_or(&empty);
    Environment {
        name: str_field(obj, "name").to_string(),
        enabled: bool_field(obj, "enabled"),
        strategies: objects(list_field(obj, "strategy"))
            .filter_map(expand_strategy)
            .collect(),
    }
}

pub fn expand_tag(value: &Value) -> FeatureTag {
    let empty = Map::new();
    let obj = value.as_object().unwrap_or(&empty);
    FeatureTag {
        tag_type: str_field(obj, "type").to_string(),
        value: str_field(obj, "value").to_string(),
    }
}

pub fn flatten_parameters(params: &Map<String, Value>) -> Value {
    Value::Object(
        params
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(format_parameter(v))))
            .collect(),
    )
}

pub fn flatten_variant(variant: &Variant) -> Value {
    let mut obj = json!({
        "name": variant.name,
        "stickiness": variant.stickiness,
        "weight": variant.weight,
        "weight_type": variant.weight_type,
    });
    if let Some(payload) = &variant.payload {
        obj["payload"] = json!([{"type": payload.payload_type, "value": payload.value}]);
    }
    obj
}

/// Keeps only the variants named in configuration, in configuration order.
pub fn flatten_configured_variants(configured: &[Value], from_api: &[Variant]) -> Value {
    Value::Array(
        objects(configured)
            .filter_map(|cfg| {
                let name = str_field(cfg, "name");
                from_api.iter().find(|v| v.name == name)
            })
            .map(flatten_variant)
            .collect(),
    )
}

pub fn flatten_constraint(constraint: &StrategyConstraint) -> Value {
    json!({
        "context_name": constraint.context_name,
        "operator": constraint.operator,
        "value": constraint.value,
        "values": constraint.values,
        "inverted": constraint.inverted,
        "case_insensitive": constraint.case_insensitive,
    })
}

pub fn flatten_strategy(strategy: &FeatureStrategy) -> Value {
    json!({
        "id": strategy.id,
        "name": strategy.name,
        "parameters": flatten_parameters(&strategy.parameters),
        "constraint": strategy.constraints.iter().map(flatten_constraint).collect::<Vec<_>>(),
        "variant": strategy.variants.iter().map(flatten_variant).collect::<Vec<_>>(),
    })
}

pub fn flatten_environments(environments: &[&Environment]) -> Value {
    Value::Array(
        environments
            .iter()
            .map(|env| {
                json!({
                    "name": env.name,
                    "enabled": env.enabled,
                    "strategy": env.strategies.iter().map(flatten_strategy).collect::<Vec<_>>(),
                })
            })
            .collect(),
    )
}

pub fn flatten_tags(tags: &[&FeatureTag]) -> Value {
    Value::Array(
        tags.iter()
            .map(|tag| json!({"type": tag.tag_type, "value": tag.value}))
            .collect(),
    )
}
