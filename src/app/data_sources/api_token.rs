use crate::adapters::unleash_client::UnleashClient;
use crate::app::data_sources::api_tokens::{covers_projects, flatten_tokens, lookup_id, token_block};
use crate::core::resource_data::ResourceData;
use crate::core::schema::{Attribute, Block, ResourceSchema};
use crate::domain::model::ApiToken;
use crate::domain::ports::DataSource;
use crate::utils::error::{ProviderError, Result};
use async_trait::async_trait;

pub struct ApiTokenDataSource;

#[async_trait]
impl DataSource for ApiTokenDataSource {
    fn type_name(&self) -> &'static str {
        "unleash_api_token"
    }

    fn schema(&self) -> ResourceSchema {
        let block = Block::new()
            .attribute(
                "username",
                Attribute::string()
                    .required()
                    .description("It will return the token defined for this username."),
            )
            .attribute(
                "projects",
                Attribute::set_of_strings()
                    .optional()
                    .description("It will return the token that have access to the projects defined here."),
            )
            .attribute(
                "tokens",
                Attribute::list_block(token_block())
                    .computed()
                    .description("API token"),
            );

        ResourceSchema::new("Retrieves details of a single api token.", block)
    }

    async fn read(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let all = client.list_api_tokens().await?;

        let username = d.get_str("username").to_string();
        let projects = d.get_string_list("projects");
        let found: Vec<&ApiToken> = all
            .iter()
            .filter(|t| t.name() == username && covers_projects(&projects, &t.projects))
            .collect();

        if found.len() > 1 {
            return Err(ProviderError::MoreThanOneApiToken);
        }

        d.set_id(lookup_id(&username, &projects));
        d.set("tokens", flatten_tokens(&found));
        Ok(())
    }
}
