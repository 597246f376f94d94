use crate::adapters::unleash_client::UnleashClient;
use crate::app::roles::{role_id, role_name, ROOT_ROLES};
use crate::core::resource_data::ResourceData;
use crate::core::schema::{Attribute, Block, ResourceSchema, Validator};
use crate::domain::model::UserRequest;
use crate::domain::ports::Resource;
use crate::utils::error::Result;
use async_trait::async_trait;

pub(crate) const EMAIL_PATTERN: &str = r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,4}$";

fn user_request(d: &ResourceData) -> UserRequest {
    UserRequest {
        name: d.get_str("name").to_string(),
        email: d.get_str("email").to_string(),
        username: d.get_str("username").to_string(),
        root_role: role_id(d.get_str("root_role")),
        send_email: d.get_bool("send_email"),
    }
}

pub struct UserResource;

#[async_trait]
impl Resource for UserResource {
    fn type_name(&self) -> &'static str {
        "unleash_user"
    }

    fn schema(&self) -> ResourceSchema {
        let block = Block::new()
            .attribute(
                "name",
                Attribute::string().required().description("The user's name."),
            )
            .attribute(
                "email",
                Attribute::string()
                    .required()
                    .validate(Validator::StringMatch {
                        pattern: EMAIL_PATTERN,
                        message: "must be a valid email with lowercase letters",
                    })
                    .description("The user's email address."),
            )
            .attribute(
                "username",
                Attribute::string()
                    .required()
                    .force_new()
                    .description("The user's username."),
            )
            .attribute(
                "root_role",
                Attribute::string()
                    .required()
                    .validate(Validator::StringInSlice { values: ROOT_ROLES })
                    .description("The role to assign to the user. Can be `Admin`, `Editor` or `Viewer`"),
            )
            .attribute(
                "send_email",
                Attribute::bool()
                    .default_value(true)
                    .description("Whether to send a welcome email with a login link to the user or not. Defaults to `true`."),
            )
            .attribute(
                "user_id",
                Attribute::int().computed().description("The user's id."),
            )
            .attribute(
                "invite_link",
                Attribute::string()
                    .computed()
                    .description("The link for the login link."),
            )
            .attribute(
                "email_sent",
                Attribute::bool()
                    .computed()
                    .description("Whether the welcome email was successfully sent to the user."),
            );

        ResourceSchema::new("Provides a resource for managing unleash users.", block)
    }

    async fn create(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let created = client.create_user(&user_request(d)).await?;
        tracing::info!("Created user {} ({})", created.username, created.id);

        d.set("invite_link", created.invite_link.unwrap_or_default());
        d.set("email_sent", created.email_sent);
        d.set_id(created.id.to_string());
        self.read(d, client).await
    }

    async fn read(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let user = match client.get_user(d.id()).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                tracing::warn!("User {} is gone, removing it from state", d.id());
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        d.set("user_id", user.id);
        d.set("name", user.name);
        d.set("username", user.username);
        d.set("email", user.email);
        d.set("root_role", role_name(user.root_role));
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        client.update_user(d.id(), &user_request(d)).await
    }

    async fn delete(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        client.delete_user(d.id()).await?;
        d.clear_id();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_request_maps_role() {
        let d = ResourceData::new(
            json!({
                "name": "Jo",
                "email": "jo@example.com",
                "username": "jo",
                "root_role": "Editor",
                "send_email": false
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        let request = user_request(&d);
        assert_eq!(request.root_role, 2);
        assert!(!request.send_email);
    }

    #[test]
    fn test_email_must_be_lowercase() {
        let schema = UserResource.schema();
        let config = json!({
            "name": "Jo",
            "email": "Jo@Example.com",
            "username": "jo",
            "root_role": "Viewer"
        });
        let diags = schema.block.validate(config.as_object().unwrap(), "");
        assert!(diags.has_errors());
        assert_eq!(diags.iter().next().unwrap().attribute.as_deref(), Some("email"));
    }
}
