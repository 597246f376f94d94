use crate::adapters::unleash_client::UnleashClient;
use crate::core::resource_data::ResourceData;
use crate::core::schema::{Attribute, Block, ResourceSchema};
use crate::domain::ports::DataSource;
use crate::utils::error::{ProviderError, Result};
use async_trait::async_trait;

pub struct FeatureTypeDataSource;

#[async_trait]
impl DataSource for FeatureTypeDataSource {
    fn type_name(&self) -> &'static str {
        "unleash_feature_type"
    }

    fn schema(&self) -> ResourceSchema {
        let block = Block::new()
            .attribute(
                "type_id",
                Attribute::string()
                    .required()
                    .description("The id of the feature type"),
            )
            .attribute("name", Attribute::string().computed().description("Feature type name"))
            .attribute(
                "lifetime_days",
                Attribute::int()
                    .computed()
                    .description("The lifetime of the feature type in days"),
            )
            .attribute(
                "description",
                Attribute::string()
                    .computed()
                    .description("The description of the feature type"),
            );

        ResourceSchema::new("Retrieve details of an existing feature type", block)
    }

    async fn read(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let type_id = d.get_str("type_id").to_string();
        let found = client
            .list_feature_types()
            .await?
            .into_iter()
            .find(|t| t.id == type_id)
            .ok_or_else(|| ProviderError::not_found(format!("feature type '{}'", type_id)))?;

        d.set_id(found.id.as_str());
        d.set("type_id", found.id);
        d.set("name", found.name);
        d.set("description", found.description);
        // Permanent types have no lifetime.
        d.set("lifetime_days", found.lifetime_days.unwrap_or(0));
        Ok(())
    }
}
