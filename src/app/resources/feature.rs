use crate::adapters::unleash_client::UnleashClient;
use crate::core::resource_data::ResourceData;
use crate::core::schema::{Attribute, Block, ResourceSchema};
use crate::domain::model::FeatureToggle;
use crate::domain::ports::Resource;
use crate::utils::error::Result;
use async_trait::async_trait;

pub(crate) fn feature_attributes() -> Block {
    Block::new()
        .attribute(
            "name",
            Attribute::string()
                .required()
                .force_new()
                .description("Feature name"),
        )
        .attribute(
            "project_id",
            Attribute::string()
                .required()
                .force_new()
                .description("The feature will be created in the given project"),
        )
        .attribute(
            "type",
            Attribute::string().required().description("Feature type"),
        )
        .attribute(
            "description",
            Attribute::string()
                .optional()
                .description("Feature description"),
        )
}

pub(crate) fn feature_from_data(d: &ResourceData) -> FeatureToggle {
    FeatureToggle {
        name: d.get_str("name").to_string(),
        description: d.get_str("description").to_string(),
        feature_type: d.get_str("type").to_string(),
        project: d.get_str("project_id").to_string(),
        ..Default::default()
    }
}

/// Fetches the feature named by the id; None after clearing the id on 404.
pub(crate) async fn read_feature(
    d: &mut ResourceData,
    client: &UnleashClient,
) -> Result<Option<FeatureToggle>> {
    let project = d.get_str("project_id").to_string();
    let feature = match client.get_feature(&project, d.id()).await {
        Ok(feature) => feature,
        Err(e) if e.is_not_found() => {
            tracing::warn!("Feature {} is gone, removing it from state", d.id());
            d.clear_id();
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    d.set("name", feature.name.as_str());
    d.set("description", feature.description.as_str());
    d.set("type", feature.feature_type.as_str());
    // Older servers omit the project on single-feature reads.
    if !feature.project.is_empty() {
        d.set("project_id", feature.project.as_str());
    }
    Ok(Some(feature))
}

pub struct FeatureResource;

#[async_trait]
impl Resource for FeatureResource {
    fn type_name(&self) -> &'static str {
        "unleash_feature"
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(
            "Provides a resource for managing unleash features.",
            feature_attributes(),
        )
    }

    async fn create(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let feature = feature_from_data(d);
        let created = client.create_feature(&feature).await?;
        tracing::info!("Created feature {} in project {}", created.name, feature.project);

        d.set_id(created.name);
        self.read(d, client).await
    }

    async fn read(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        read_feature(d, client).await?;
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let feature = feature_from_data(d);
        client.update_feature(&feature).await?;
        Ok(())
    }

    /// Archives the feature.
    async fn delete(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        client
            .archive_feature(d.get_str("project_id"), d.id())
            .await?;
        d.clear_id();
        Ok(())
    }
}
