use crate::adapters::unleash_client::UnleashClient;
use crate::core::resource_data::ResourceData;
use crate::core::schema::{Attribute, Block, ResourceSchema, Validator};
use crate::domain::model::CreateApiToken;
use crate::domain::ports::Resource;
use crate::utils::error::Result;
use crate::utils::validation::normalize_rfc3339;
use async_trait::async_trait;

pub(crate) const TOKEN_TYPES: &[&str] = &["client", "admin", "frontend"];

/// Hex md5 digest, used for ids that must not reveal a secret.
pub(crate) fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

fn format_timestamp(raw: Option<&str>) -> String {
    raw.and_then(|ts| normalize_rfc3339("created_at", ts).ok())
        .unwrap_or_default()
}

pub struct ApiTokenResource;

#[async_trait]
impl Resource for ApiTokenResource {
    fn type_name(&self) -> &'static str {
        "unleash_api_token"
    }

    fn schema(&self) -> ResourceSchema {
        let block = Block::new()
            .attribute(
                "username",
                Attribute::string()
                    .required()
                    .force_new()
                    .description("The name of the token. Used as `tokenName` in the API (username is deprecated)."),
            )
            .attribute(
                "type",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate(Validator::StringInSlice { values: TOKEN_TYPES })
                    .description("The type of the API token. Can be `client`, `admin` or `frontend`"),
            )
            .attribute(
                "environment",
                Attribute::string()
                    .default_value("development")
                    .force_new()
                    .description("The environment the token will have access to. By default, it has access to the `development` environment."),
            )
            .attribute(
                "projects",
                Attribute::set_of_strings()
                    .optional()
                    .force_new()
                    .description("The project(s) the token will have access to. Use `[\"*\"]` for all projects. By default, it will have access to all projects."),
            )
            .attribute(
                "expires_at",
                Attribute::string()
                    .optional()
                    .description("The API token expiration date."),
            )
            .attribute(
                "created_at",
                Attribute::string()
                    .optional()
                    .computed()
                    .description("The API token creation date."),
            )
            .attribute(
                "secret",
                Attribute::string()
                    .optional()
                    .computed()
                    .sensitive()
                    .description("The API token secret."),
            );

        ResourceSchema::new("Provides a resource for managing unleash api tokens.", block)
    }

    async fn create(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let expires_at = match d.get_str("expires_at") {
            "" => None,
            raw => Some(normalize_rfc3339("expires_at", raw)?),
        };
        let mut projects = d.get_string_list("projects");
        if projects.is_empty() {
            projects.push("*".to_string());
        }

        let request = CreateApiToken {
            token_name: d.get_str("username").to_string(),
            token_type: d.get_str("type").to_string(),
            environment: d.get_str("environment").to_string(),
            projects,
            expires_at,
        };
        let created = client.create_api_token(&request).await?;
        tracing::info!("Created {} api token {}", created.token_type, created.name());

        d.set("created_at", format_timestamp(created.created_at.as_deref()));
        d.set_id(md5_hex(&created.secret));
        d.set("secret", created.secret);
        self.read(d, client).await
    }

    async fn read(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let secret = d.get_str("secret").to_string();
        let tokens = client.list_api_tokens().await?;

        let Some(token) = tokens.into_iter().find(|t| t.secret == secret) else {
            tracing::warn!("Api token {} is gone, removing it from state", d.id());
            d.clear_id();
            return Ok(());
        };

        d.set("username", token.name());
        d.set("type", token.token_type.as_str());
        d.set("environment", token.environment.as_str());
        d.set("created_at", format_timestamp(token.created_at.as_deref()));
        d.set("secret", token.secret);
        Ok(())
    }

    /// Only the expiry can change in place.
    async fn update(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let expires_at = normalize_rfc3339("expires_at", d.get_str("expires_at"))?;
        client
            .update_api_token(d.get_str("secret"), &expires_at)
            .await
    }

    async fn delete(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        client.delete_api_token(d.get_str("secret")).await?;
        d.clear_id();
        Ok(())
    }
}
