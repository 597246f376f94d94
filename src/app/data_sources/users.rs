use crate::adapters::unleash_client::UnleashClient;
use crate::app::data_sources::user::{flatten_user, user_attributes};
use crate::core::resource_data::ResourceData;
use crate::core::schema::{Attribute, Block, ResourceSchema, Validator};
use crate::domain::ports::DataSource;
use crate::utils::error::Result;
use async_trait::async_trait;

pub struct UsersDataSource;

#[async_trait]
impl DataSource for UsersDataSource {
    fn type_name(&self) -> &'static str {
        "unleash_users"
    }

    fn schema(&self) -> ResourceSchema {
        let user = user_attributes(Block::new())
            .attribute("id", Attribute::int().computed().description("The user's id."));

        let block = Block::new()
            .attribute(
                "query",
                Attribute::string()
                    .required()
                    .validate(Validator::StringLenBetween { min: 2, max: 255 })
                    .description("Query used to search the user. It searches by `email`, `username` and `name` fields of users."),
            )
            .attribute(
                "users",
                Attribute::list_block(user)
                    .computed()
                    .description("Collection of users that match the provided query."),
            );

        ResourceSchema::new(
            "Retrieve a collection of users that match the provided query.",
            block,
        )
    }

    /// Search results are partial, so each match is fetched in full.
    async fn read(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let query = d.get_str("query").to_string();
        let matches = client.search_users(&query).await?;
        tracing::debug!("User search '{}' matched {} users", query, matches.len());

        let mut users = Vec::with_capacity(matches.len());
        for found in matches {
            let user = client.get_user(&found.id.to_string()).await?;
            users.push(flatten_user(user));
        }

        d.set_id(query);
        d.set("users", users);
        Ok(())
    }
}
