use crate::adapters::unleash_client::UnleashClient;
use crate::app::expand::{expand_environment, expand_tag, flatten_environments, flatten_tags};
use crate::app::resources::feature::{feature_attributes, feature_from_data, read_feature};
use crate::core::resource_data::ResourceData;
use crate::core::schema::{Attribute, Block, ResourceSchema, Validator};
use crate::domain::model::{Environment, FeatureStrategy, FeatureTag, FeatureToggle};
use crate::domain::ports::Resource;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

const CONTEXT_NAMES: &[&str] = &["appName", "currentTime", "environment", "sessionId", "userId"];

const OPERATORS: &[&str] = &[
    "IN",
    "NOT_IN",
    "STR_CONTAINS",
    "STR_STARTS_WITH",
    "STR_ENDS_WITH",
    "NUM_EQ",
    "NUM_GT",
    "NUM_GTE",
    "NUM_LT",
    "NUM_LTE",
    "SEMVER_EQ",
    "SEMVER_GT",
    "SEMVER_LT",
];

/// Variant block shared with strategy assignments.
pub(crate) fn variant_block() -> Block {
    Block::new()
        .attribute("name", Attribute::string().required().description("Variant name"))
        .attribute(
            "stickiness",
            Attribute::string()
                .default_value("default")
                .description("Variant stickiness. Default is `default`."),
        )
        .attribute(
            "weight",
            Attribute::int()
                .optional()
                .computed()
                .validate(Validator::IntBetween { min: 0, max: 1000 })
                .description("Variant weight. Only considered when the `weight_type` is `fix`. It is calculated automatically if the `weight_type` is `variable`."),
        )
        .attribute(
            "weight_type",
            Attribute::string()
                .default_value("variable")
                .description("Variant weight type. The weight type can be `fix` or `variable`. Default is `variable`."),
        )
        .attribute(
            "payload",
            Attribute::set_block(
                Block::new()
                    .attribute("type", Attribute::string().required())
                    .attribute(
                        "value",
                        Attribute::string()
                            .required()
                            .description("Always a string value, independent of the type."),
                    ),
            )
            .optional()
            .max_items(1)
            .description("Variant payload. The type of the payload can be `string`, `json` or `csv` or `number`"),
        )
}

fn constraint_block() -> Block {
    Block::new()
        .attribute(
            "context_name",
            Attribute::string()
                .required()
                .validate(Validator::StringInSlice { values: CONTEXT_NAMES })
                .description("Constraint context. Can be `appName`, `currentTime`, `environment`, `sessionId` or `userId`"),
        )
        .attribute(
            "operator",
            Attribute::string()
                .required()
                .validate(Validator::StringInSlice { values: OPERATORS })
                .description("Constraint operator. Can be `IN`, `NOT_IN`, `STR_CONTAINS`, `STR_STARTS_WITH`, `STR_ENDS_WITH`, `NUM_EQ`, `NUM_GT`, `NUM_GTE`, `NUM_LT`, `NUM_LTE`, `SEMVER_EQ`, `SEMVER_GT` or `SEMVER_LT`"),
        )
        .attribute(
            "value",
            Attribute::string()
                .optional()
                .description("Value to use in the evaluation of the constraint. Applies only to `DATE_`, `NUM_` and `SEMVER_` operators."),
        )
        .attribute(
            "values",
            Attribute::list_of_strings()
                .optional()
                .description("List of values to use in the evaluation of the constraint. Applies to all operators, except `DATE_`, `NUM_` and `SEMVER_`."),
        )
        .attribute(
            "case_insensitive",
            Attribute::bool()
                .default_value(false)
                .description("If operator is case-insensitive."),
        )
        .attribute(
            "inverted",
            Attribute::bool()
                .default_value(false)
                .description("If constraint expressions will be negated, meaning that they get their opposite value."),
        )
}

fn strategy_block() -> Block {
    Block::new()
        .attribute(
            "name",
            Attribute::string()
                .required()
                .description("Strategy unique name"),
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
                .description("Feature strategy variant"),
        )
        .attribute(
            "constraint",
            Attribute::list_block(constraint_block())
                .optional()
                .description("Strategy constraint"),
        )
        .attribute("id", Attribute::string().computed().description("Strategy ID"))
}

fn environment_block() -> Block {
    Block::new()
        .attribute(
            "name",
            Attribute::string()
                .required()
                .description("Environment name"),
        )
        .attribute(
            "enabled",
            Attribute::bool()
                .default_value(true)
                .description("Whether the feature is on/off in the environment. Default is `true` (on)"),
        )
        .attribute(
            "strategy",
            Attribute::list_block(strategy_block())
                .optional()
                .description("Strategy to add in the environment"),
        )
}

/// What an environment list change means in API calls.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct EnvironmentChanges {
    pub to_add: Vec<Environment>,
    /// New environment paired with the strategies it had before.
    pub to_update: Vec<(Environment, Vec<FeatureStrategy>)>,
    pub to_remove: Vec<Environment>,
}

pub(crate) fn diff_environments(old: &[Environment], new: &[Environment]) -> EnvironmentChanges {
    let mut changes = EnvironmentChanges::default();

    for env in new {
        match old.iter().find(|o| o.name == env.name) {
            Some(previous) => changes
                .to_update
                .push((env.clone(), previous.strategies.clone())),
            None => changes.to_add.push(env.clone()),
        }
    }

    changes.to_remove = old
        .iter()
        .filter(|o| !new.iter().any(|n| n.name == o.name))
        .cloned()
        .collect();

    changes
}

#[derive(Debug, Default, PartialEq)]
pub(crate) struct StrategyChanges<'a> {
    pub to_update: Vec<&'a FeatureStrategy>,
    pub to_add: Vec<&'a FeatureStrategy>,
    pub to_delete: Vec<&'a FeatureStrategy>,
}

/// Strategies are matched by id; new ones have none until created.
pub(crate) fn diff_strategies<'a>(
    old: &'a [FeatureStrategy],
    new: &'a [FeatureStrategy],
) -> StrategyChanges<'a> {
    let known = |id: &str, list: &[FeatureStrategy]| !id.is_empty() && list.iter().any(|s| s.id == id);

    let mut changes = StrategyChanges::default();
    for strategy in new {
        if known(&strategy.id, old) {
            changes.to_update.push(strategy);
        } else {
            changes.to_add.push(strategy);
        }
    }
    changes.to_delete = old
        .iter()
        .filter(|s| !s.id.is_empty() && !known(&s.id, new))
        .collect();
    changes
}

/// Tags are identified by (type, value); returns (added, removed).
pub(crate) fn diff_tags(old: &[FeatureTag], new: &[FeatureTag]) -> (Vec<FeatureTag>, Vec<FeatureTag>) {
    let added = new.iter().filter(|t| !old.contains(t)).cloned().collect();
    let removed = old.iter().filter(|t| !new.contains(t)).cloned().collect();
    (added, removed)
}

fn environments_of(value: &Value) -> Vec<Environment> {
    value
        .as_array()
        .map(|items| items.iter().map(expand_environment).collect())
        .unwrap_or_default()
}

fn tags_of(value: &Value) -> Vec<FeatureTag> {
    value
        .as_array()
        .map(|items| items.iter().map(expand_tag).collect())
        .unwrap_or_default()
}

async fn add_environment(
    client: &UnleashClient,
    feature: &FeatureToggle,
    env: &Environment,
) -> Result<()> {
    for strategy in &env.strategies {
        client
            .add_strategy(&feature.project, &feature.name, &env.name, strategy)
            .await?;
    }
    client
        .set_environment_enabled(&feature.project, &feature.name, &env.name, env.enabled)
        .await
}

/// Archives and deletes a half-created feature, logging rather than
/// failing so the create error reaches the caller.
async fn rollback(client: &UnleashClient, feature: &FeatureToggle) {
    tracing::warn!("Rolling back creation of feature {}", feature.name);
    if let Err(e) = client.archive_feature(&feature.project, &feature.name).await {
        tracing::error!("Failed to archive feature {}: {}", feature.name, e);
        return;
    }
    if let Err(e) = client.delete_archived_feature(&feature.name).await {
        tracing::error!("Failed to delete archived feature {}: {}", feature.name, e);
    }
}

pub struct FeatureV2Resource;

impl FeatureV2Resource {
    async fn provision(
        &self,
        d: &ResourceData,
        client: &UnleashClient,
        feature: &FeatureToggle,
    ) -> Result<()> {
        for env in d.get_list("environment").iter().map(expand_environment) {
            add_environment(client, feature, &env).await?;
        }
        for tag in d.get_list("tag").iter().map(expand_tag) {
            client.add_feature_tag(&feature.name, &tag).await?;
        }
        Ok(())
    }

    async fn reconcile_environments(
        &self,
        client: &UnleashClient,
        feature: &FeatureToggle,
        changes: EnvironmentChanges,
    ) -> Result<()> {
        let (project, name) = (feature.project.as_str(), feature.name.as_str());

        for (env, previous) in &changes.to_update {
            let strategies = diff_strategies(previous, &env.strategies);
            tracing::debug!(
                "Environment {}: {} strategies to update, {} to add, {} to delete",
                env.name,
                strategies.to_update.len(),
                strategies.to_add.len(),
                strategies.to_delete.len()
            );
            for strategy in strategies.to_update {
                client.update_strategy(project, name, &env.name, strategy).await?;
            }
            for strategy in strategies.to_add {
                client.add_strategy(project, name, &env.name, strategy).await?;
            }
            for strategy in strategies.to_delete {
                client
                    .delete_strategy(project, name, &env.name, &strategy.id)
                    .await?;
            }
            client
                .set_environment_enabled(project, name, &env.name, env.enabled)
                .await?;
        }

        for env in &changes.to_remove {
            for strategy in env.strategies.iter().filter(|s| !s.id.is_empty()) {
                client
                    .delete_strategy(project, name, &env.name, &strategy.id)
                    .await?;
            }
            client
                .set_environment_enabled(project, name, &env.name, false)
                .await?;
        }

        for env in &changes.to_add {
            add_environment(client, feature, env).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl Resource for FeatureV2Resource {
    fn type_name(&self) -> &'static str {
        "unleash_feature_v2"
    }

    fn schema(&self) -> ResourceSchema {
        let block = feature_attributes()
            .attribute(
                "archive_on_destroy",
                Attribute::bool()
                    .default_value(true)
                    .description("Whether to archive the feature toggle on destroy. Default is `true`. When `false`, it will permanently delete the feature toggle."),
            )
            .attribute(
                "environment",
                Attribute::list_block(environment_block())
                    .optional()
                    .description("Use this to enable a feature in an environment and add strategies"),
            )
            .attribute(
                "tag",
                Attribute::list_block(
                    Block::new()
                        .attribute(
                            "type",
                            Attribute::string()
                                .default_value("simple")
                                .description("Tag type. Default is `simple`."),
                        )
                        .attribute(
                            "value",
                            Attribute::string().required().description("Tag value."),
                        ),
                )
                .optional()
                .description("Tag to add to the feature"),
            );

        ResourceSchema::new(
            "(Experimental) Provides a resource for managing unleash features with variants and environment strategies all in a single resource.",
            block,
        )
    }

    async fn create(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let feature = feature_from_data(d);
        let created = client.create_feature(&feature).await?;
        tracing::info!("Created feature {} in project {}", created.name, feature.project);

        if let Err(e) = self.provision(d, client, &feature).await {
            tracing::error!("Failed to configure feature {}: {}", feature.name, e);
            rollback(client, &feature).await;
            return Err(e);
        }

        d.set_id(created.name);
        self.read(d, client).await
    }

    async fn read(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let Some(feature) = read_feature(d, client).await? else {
            return Ok(());
        };

        // The API returns every environment; state keeps the configured ones.
        let configured = d.get_list("environment").to_vec();
        if !configured.is_empty() {
            let to_save: Vec<&Environment> = configured
                .iter()
                .filter_map(|cfg| cfg.get("name").and_then(Value::as_str))
                .filter_map(|name| feature.environments.iter().find(|env| env.name == name))
                .collect();
            d.set("environment", flatten_environments(&to_save));
        }

        let configured = d.get_list("tag").to_vec();
        if !configured.is_empty() {
            let tags = client.get_feature_tags(&feature.name).await?;
            let to_save: Vec<&FeatureTag> = configured
                .iter()
                .filter_map(|cfg| cfg.get("value").and_then(Value::as_str))
                .flat_map(|value| tags.iter().filter(move |tag| tag.value == value))
                .collect();
            d.set("tag", flatten_tags(&to_save));
        }

        Ok(())
    }

    async fn update(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let feature = feature_from_data(d);
        client.update_feature(&feature).await?;

        if d.has_change("tag") {
            let (old, new) = d.get_change("tag");
            let (added, removed) = diff_tags(&tags_of(&old), &tags_of(&new));
            if !added.is_empty() || !removed.is_empty() {
                tracing::debug!(
                    "Feature {}: adding {} tags, removing {}",
                    feature.name,
                    added.len(),
                    removed.len()
                );
                client
                    .update_feature_tags(&feature.name, added, removed)
                    .await?;
            }
        }

        if d.has_change("environment") {
            let (old, new) = d.get_change("environment");
            let changes = diff_environments(&environments_of(&old), &environments_of(&new));
            self.reconcile_environments(client, &feature, changes)
                .await?;
        }

        self.read(d, client).await
    }

    async fn delete(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let project = d.get_str("project_id").to_string();
        client.archive_feature(&project, d.id()).await?;

        let archive_only = d
            .get("archive_on_destroy")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        if !archive_only {
            client.delete_archived_feature(d.id()).await?;
        }
        d.clear_id();
        Ok(())
    }
}
