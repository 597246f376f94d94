use crate::adapters::unleash_client::UnleashClient;
use crate::app::expand::{expand_variants, flatten_configured_variants};
use crate::app::resources::feature_v2::variant_block;
use crate::app::strategy_params::{format_parameter, parse_parameter, ParameterType};
use crate::core::resource_data::ResourceData;
use crate::core::schema::{Attribute, Block, ResourceSchema};
use crate::domain::model::{FeatureStrategy, StrategyDefinition};
use crate::domain::ports::Resource;
use crate::utils::error::{ProviderError, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Checks configured parameters against the strategy definition and keeps
/// the ones it declares. Values stay strings on the wire.
pub(crate) fn convert_parameters(
    definition: &StrategyDefinition,
    given: &Map<String, Value>,
) -> Result<Map<String, Value>> {
    let mut converted = Map::new();
    for param in &definition.parameters {
        let Some(raw) = given.get(&param.name).and_then(Value::as_str) else {
            if param.required {
                return Err(ProviderError::StrategyParametersRequired);
            }
            continue;
        };
        parse_parameter(ParameterType::from_definition(&param.parameter_type), raw)?;
        converted.insert(param.name.clone(), Value::String(raw.to_string()));
    }
    Ok(converted)
}

/// Formats stored values back to strings for the parameters the
/// definition declares.
pub(crate) fn flatten_assigned_parameters(
    definition: &StrategyDefinition,
    stored: &Map<String, Value>,
) -> Map<String, Value> {
    definition
        .parameters
        .iter()
        .filter_map(|param| {
            stored
                .get(&param.name)
                .map(|v| (param.name.clone(), Value::String(format_parameter(v))))
        })
        .collect()
}

pub struct StrategyAssignmentResource;

impl StrategyAssignmentResource {
    async fn strategy_from_data(
        &self,
        d: &ResourceData,
        client: &UnleashClient,
    ) -> Result<FeatureStrategy> {
        let name = d.get_str("strategy_name").to_string();

        let parameters = match d.get_map("parameters").filter(|given| !given.is_empty()) {
            Some(given) => {
                let definition = client.get_strategy_definition(&name).await?;
                convert_parameters(&definition, given)?
            }
            None => Map::new(),
        };

        Ok(FeatureStrategy {
            id: d.id().to_string(),
            name,
            parameters,
            constraints: Vec::new(),
            variants: expand_variants(d.get_list("variant")),
        })
    }
}

#[async_trait]
impl Resource for StrategyAssignmentResource {
    fn type_name(&self) -> &'static str {
        "unleash_strategy_assignment"
    }

    fn schema(&self) -> ResourceSchema {
        let block = Block::new()
            .attribute(
                "feature_name",
                Attribute::string()
                    .required()
                    .force_new()
                    .description("Feature name to assign the strategy to"),
            )
            .attribute(
                "project_id",
                Attribute::string()
                    .required()
                    .force_new()
                    .description("The unleash project the feature is in"),
            )
            .attribute(
                "environment",
                Attribute::string()
                    .required()
                    .force_new()
                    .description("The environment where the strategy will take place"),
            )
            .attribute(
                "strategy_name",
                Attribute::string()
                    .required()
                    .force_new()
                    .description("Strategy unique name"),
            )
            .attribute(
                "strategy_id",
                Attribute::string().computed().description("Strategy id"),
            )
            .attribute(
                "parameters",
                Attribute::map_of_strings()
                    .optional()
                    .description("Strategy parameters. All the values need to informed as strings."),
            )
            .attribute(
                "variant",
                Attribute::list_block(variant_block())
                    .optional()
                    .description("Feature variant"),
            );

        ResourceSchema::new(
            "Provides a resource for add strategy to a feature toggle in the given environment.",
            block,
        )
    }

    async fn create(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let strategy = self.strategy_from_data(d, client).await?;
        let added = client
            .add_strategy(
                d.get_str("project_id"),
                d.get_str("feature_name"),
                d.get_str("environment"),
                &strategy,
            )
            .await?;
        tracing::info!(
            "Assigned strategy {} ({}) to feature {}",
            added.name,
            added.id,
            d.get_str("feature_name")
        );

        d.set_id(added.id);
        self.read(d, client).await
    }

    async fn read(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let project = d.get_str("project_id").to_string();
        let feature_name = d.get_str("feature_name").to_string();

        let feature = match client.get_feature(&project, &feature_name).await {
            Ok(feature) => feature,
            Err(e) if e.is_not_found() => {
                tracing::warn!("Feature {} is gone, removing strategy {}", feature_name, d.id());
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let strategy_name = d.get_str("strategy_name").to_string();
        let definition = client.get_strategy_definition(&strategy_name).await?;

        let environment = d.get_str("environment");
        let Some(env) = feature.environments.iter().find(|e| e.name == environment) else {
            return Ok(());
        };
        let assigned = env
            .strategies
            .iter()
            .find(|s| !d.id().is_empty() && s.id == d.id())
            .or_else(|| env.strategies.iter().find(|s| s.name == strategy_name));

        if let Some(strategy) = assigned {
            let parameters = flatten_assigned_parameters(&definition, &strategy.parameters);
            let variants = flatten_configured_variants(d.get_list("variant"), &strategy.variants);
            d.set("strategy_name", strategy.name.as_str());
            d.set("strategy_id", strategy.id.as_str());
            d.set("parameters", parameters);
            d.set("variant", variants);
        }
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let strategy = self.strategy_from_data(d, client).await?;
        client
            .update_strategy(
                d.get_str("project_id"),
                d.get_str("feature_name"),
                d.get_str("environment"),
                &strategy,
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        client
            .delete_strategy(
                d.get_str("project_id"),
                d.get_str("feature_name"),
                d.get_str("environment"),
                d.id(),
            )
            .await?;
        d.clear_id();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::StrategyParameter;
    use serde_json::json;

    fn rollout_definition() -> StrategyDefinition {
        StrategyDefinition {
            name: "flexibleRollout".to_string(),
            description: String::new(),
            parameters: vec![
                StrategyParameter {
                    name: "rollout".to_string(),
                    parameter_type: "percentage".to_string(),
                    required: true,
                    ..Default::default()
                },
                StrategyParameter {
                    name: "stickiness".to_string(),
                    parameter_type: "string".to_string(),
                    required: true,
                    ..Default::default()
                },
                StrategyParameter {
                    name: "groupId".to_string(),
                    parameter_type: "string".to_string(),
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn test_convert_parameters_checks_definition() {
        let given = json!({"rollout": "25", "stickiness": "default", "extra": "x"});
        let converted =
            convert_parameters(&rollout_definition(), given.as_object().unwrap()).unwrap();
        assert_eq!(
            Value::Object(converted),
            json!({"rollout": "25", "stickiness": "default"})
        );

        let missing = json!({"rollout": "25"});
        assert!(matches!(
            convert_parameters(&rollout_definition(), missing.as_object().unwrap()),
            Err(ProviderError::StrategyParametersRequired)
        ));

        let bad = json!({"rollout": "a quarter", "stickiness": "default"});
        assert!(matches!(
            convert_parameters(&rollout_definition(), bad.as_object().unwrap()),
            Err(ProviderError::PercentageConversion)
        ));
    }

    #[test]
    fn test_flatten_assigned_parameters() {
        let stored = json!({"rollout": 25, "stickiness": "default", "legacy": true});
        let flat = flatten_assigned_parameters(&rollout_definition(), stored.as_object().unwrap());
        assert_eq!(
            Value::Object(flat),
            json!({"rollout": "25", "stickiness": "default"})
        );
    }
}
