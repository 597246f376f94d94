use crate::adapters::unleash_client::UnleashClient;
use crate::app::roles::role_name;
use crate::core::resource_data::ResourceData;
use crate::core::schema::{Attribute, Block, ResourceSchema};
use crate::domain::model::User;
use crate::domain::ports::DataSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Computed user fields shared with `unleash_users`.
pub(crate) fn user_attributes(block: Block) -> Block {
    block
        .attribute("name", Attribute::string().computed().description("The user's name."))
        .attribute(
            "email",
            Attribute::string()
                .computed()
                .description("The user's email address."),
        )
        .attribute(
            "username",
            Attribute::string()
                .computed()
                .description("The user's username."),
        )
        .attribute("root_role", Attribute::string().computed().description("The user's role."))
        .attribute(
            "created_at",
            Attribute::string()
                .computed()
                .description("The date of creation of the user."),
        )
        .attribute(
            "image_url",
            Attribute::string()
                .computed()
                .description("The user's image URL."),
        )
}

pub(crate) fn flatten_user(user: User) -> Value {
    json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "username": user.username,
        "root_role": role_name(user.root_role),
        "created_at": user.created_at.unwrap_or_default(),
        "image_url": user.image_url.unwrap_or_default(),
    })
}

pub struct UserDataSource;

#[async_trait]
impl DataSource for UserDataSource {
    fn type_name(&self) -> &'static str {
        "unleash_user"
    }

    fn schema(&self) -> ResourceSchema {
        let block = user_attributes(Block::new()).attribute(
            "id",
            Attribute::int()
                .required()
                .description("Id used to search the user."),
        );
        ResourceSchema::new("Retrieve details of an existing user", block)
    }

    async fn read(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let id = d.get_int("id").to_string();
        let user = client.get_user(&id).await?;

        d.set_id(id);
        if let Value::Object(fields) = flatten_user(user) {
            for (key, value) in fields {
                d.set(&key, value);
            }
        }
        Ok(())
    }
}
