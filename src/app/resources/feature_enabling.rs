use crate::adapters::unleash_client::UnleashClient;
use crate::core::resource_data::ResourceData;
use crate::core::schema::{Attribute, Block, ResourceSchema};
use crate::domain::ports::Resource;
use crate::utils::error::Result;
use async_trait::async_trait;

pub struct FeatureEnablingResource;

impl FeatureEnablingResource {
    async fn switch(&self, d: &ResourceData, client: &UnleashClient, enabled: bool) -> Result<()> {
        client
            .set_environment_enabled(
                d.get_str("project_id"),
                d.get_str("feature_name"),
                d.get_str("environment"),
                enabled,
            )
            .await
    }
}

#[async_trait]
impl Resource for FeatureEnablingResource {
    fn type_name(&self) -> &'static str {
        "unleash_feature_enabling"
    }

    fn schema(&self) -> ResourceSchema {
        let block = Block::new()
            .attribute(
                "feature_name",
                Attribute::string()
                    .required()
                    .force_new()
                    .description("Feature name to enabled"),
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
                    .description("The environment where the toggle will be enabled"),
            )
            .attribute(
                "enabled",
                Attribute::bool()
                    .default_value(true)
                    .description("Whether the feature is on/off in the provided environment"),
            );

        ResourceSchema::new(
            "Provides a resource for enabling a feature toggle in the given environment. This can be only done after the feature toggle has at least one strategy.",
            block,
        )
    }

    async fn create(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let enabled = d.get_bool("enabled");
        self.switch(d, client, enabled).await?;

        let id = format!("{}/{}", d.get_str("feature_name"), d.get_str("environment"));
        d.set_id(id);
        self.read(d, client).await
    }

    async fn read(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let project = d.get_str("project_id").to_string();
        let feature_name = d.get_str("feature_name").to_string();

        let feature = match client.get_feature(&project, &feature_name).await {
            Ok(feature) => feature,
            Err(e) if e.is_not_found() => {
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let environment = d.get_str("environment");
        if let Some(enabled) = feature
            .environments
            .iter()
            .find(|env| env.name == environment)
            .map(|env| env.enabled)
        {
            d.set("enabled", enabled);
        }
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let enabled = d.get_bool("enabled");
        self.switch(d, client, enabled).await
    }

    /// Turns the feature off in the environment.
    async fn delete(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        self.switch(d, client, false).await?;
        d.clear_id();
        Ok(())
    }
}
