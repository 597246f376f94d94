use crate::adapters::unleash_client::UnleashClient;
use crate::core::resource_data::ResourceData;
use crate::core::schema::{Attribute, Block, ResourceSchema};
use crate::domain::ports::DataSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct ProjectDataSource;

#[async_trait]
impl DataSource for ProjectDataSource {
    fn type_name(&self) -> &'static str {
        "unleash_project"
    }

    fn schema(&self) -> ResourceSchema {
        let block = Block::new()
            .attribute(
                "project_id",
                Attribute::string()
                    .required()
                    .description("The project id of the unleash project"),
            )
            .attribute("name", Attribute::string().computed().description("Project name"))
            .attribute(
                "updated_at",
                Attribute::string()
                    .computed()
                    .description("The date the unleash project was last updated"),
            )
            .attribute(
                "description",
                Attribute::string()
                    .computed()
                    .description("The description of the unleash project"),
            )
            .attribute(
                "environments",
                Attribute::list_block(Block::new().attribute(
                    "environment",
                    Attribute::string()
                        .computed()
                        .description("The environment name."),
                ))
                .computed()
                .description("The list of unleash environments in this project"),
            );

        ResourceSchema::new("Retrieve details of an existing unleash project", block)
    }

    async fn read(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let project = client.get_project(d.get_str("project_id")).await?;

        let environments: Vec<Value> = project
            .environments
            .iter()
            .map(|env| json!({"environment": env.environment}))
            .collect();

        d.set_id(project.id);
        d.set("name", project.name);
        d.set("description", project.description);
        d.set("updated_at", project.updated_at.unwrap_or_default());
        d.set("environments", environments);
        Ok(())
    }
}
