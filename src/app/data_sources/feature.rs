use crate::adapters::unleash_client::UnleashClient;
use crate::core::resource_data::ResourceData;
use crate::core::schema::{Attribute, Block, ResourceSchema};
use crate::domain::ports::DataSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct FeatureDataSource;

#[async_trait]
impl DataSource for FeatureDataSource {
    fn type_name(&self) -> &'static str {
        "unleash_feature"
    }

    fn schema(&self) -> ResourceSchema {
        let environment = Block::new()
            .attribute("name", Attribute::string().computed())
            .attribute("enabled", Attribute::bool().computed());

        let block = Block::new()
            .attribute("name", Attribute::string().required().description("Feature name"))
            .attribute(
                "project_id",
                Attribute::string()
                    .required()
                    .description("The project id of the feature toggle"),
            )
            .attribute(
                "archived",
                Attribute::bool()
                    .computed()
                    .description("Wether the feature toggle is archived or not"),
            )
            .attribute(
                "created_at",
                Attribute::string()
                    .computed()
                    .description("The date the feature toggle was created"),
            )
            .attribute(
                "description",
                Attribute::string()
                    .computed()
                    .description("The description of the feature toggle"),
            )
            .attribute(
                "stale",
                Attribute::bool()
                    .computed()
                    .description("Wether the feature toggle is stale or not"),
            )
            .attribute(
                "type",
                Attribute::string()
                    .computed()
                    .description("The type of the feature toggle"),
            )
            .attribute(
                "environments",
                Attribute::list_block(environment)
                    .computed()
                    .description("The environments of the feature toggle"),
            );

        ResourceSchema::new("Retrieve details of an existing feature", block)
    }

    async fn read(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let project = d.get_str("project_id").to_string();
        let feature = client.get_feature(&project, d.get_str("name")).await?;

        let environments: Vec<Value> = feature
            .environments
            .iter()
            .map(|env| json!({"name": env.name, "enabled": env.enabled}))
            .collect();

        d.set_id(feature.name.as_str());
        d.set("archived", feature.archived);
        d.set("created_at", feature.created_at.unwrap_or_default());
        d.set("description", feature.description);
        d.set("name", feature.name);
        if !feature.project.is_empty() {
            d.set("project_id", feature.project);
        }
        d.set("stale", feature.stale);
        d.set("type", feature.feature_type);
        d.set("environments", environments);
        Ok(())
    }
}
