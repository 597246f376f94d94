use crate::adapters::unleash_client::UnleashClient;
use crate::core::resource_data::ResourceData;
use crate::core::schema::{Attribute, Block, ResourceSchema};
use crate::domain::model::Project;
use crate::domain::ports::Resource;
use crate::utils::error::Result;
use async_trait::async_trait;

fn project_from_data(d: &ResourceData) -> Project {
    Project {
        id: d.get_str("id").to_string(),
        name: d.get_str("name").to_string(),
        description: d.get_str("description").to_string(),
        ..Default::default()
    }
}

pub struct ProjectResource;

#[async_trait]
impl Resource for ProjectResource {
    fn type_name(&self) -> &'static str {
        "unleash_project"
    }

    fn schema(&self) -> ResourceSchema {
        let block = Block::new()
            .attribute(
                "id",
                Attribute::string()
                    .required()
                    .force_new()
                    .description("The project's id."),
            )
            .attribute(
                "name",
                Attribute::string().required().description("The project's name."),
            )
            .attribute(
                "description",
                Attribute::string()
                    .optional()
                    .description("The project's description."),
            );

        ResourceSchema::new("Provides a resource for managing unleash projects.", block)
    }

    async fn create(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let created = client.create_project(&project_from_data(d)).await?;
        tracing::info!("Created project {}", created.id);

        d.set_id(created.id);
        self.read(d, client).await
    }

    async fn read(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let project = match client.get_project(d.id()).await {
            Ok(project) => project,
            Err(e) if e.is_not_found() => {
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        d.set("id", project.id);
        d.set("name", project.name);
        d.set("description", project.description);
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let mut project = project_from_data(d);
        project.id = d.id().to_string();
        client.update_project(&project).await
    }

    async fn delete(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        client.delete_project(d.id()).await?;
        d.clear_id();
        Ok(())
    }
}
