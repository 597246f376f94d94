use crate::adapters::unleash_client::UnleashClient;
use crate::app::resources::api_token::md5_hex;
use crate::core::resource_data::ResourceData;
use crate::core::schema::{Attribute, Block, ResourceSchema};
use crate::domain::model::ApiToken;
use crate::domain::ports::DataSource;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Id of a token lookup: md5 of the name filter and the joined projects.
pub(crate) fn lookup_id(username: &str, projects: &[String]) -> String {
    md5_hex(&format!("{}{}", username, projects.join(",")))
}

/// True when every wanted project is among the token's projects.
pub(crate) fn covers_projects(wanted: &[String], token_projects: &[String]) -> bool {
    wanted.len() <= token_projects.len() && wanted.iter().all(|p| token_projects.contains(p))
}

pub(crate) fn token_block() -> Block {
    Block::new()
        .attribute("username", Attribute::string().computed())
        .attribute(
            "type",
            Attribute::string()
                .computed()
                .description("The type of the API token. Can be `client`, `admin` or `frontend`"),
        )
        .attribute(
            "environment",
            Attribute::string()
                .computed()
                .description("The environment the token has access to. `\"*\"` means all environments."),
        )
        .attribute(
            "projects",
            Attribute::set_of_strings()
                .computed()
                .description("The project(s) the token will have access to. `[\"*\"]` means all projects."),
        )
        .attribute(
            "expires_at",
            Attribute::string()
                .computed()
                .description("The API token expiration date."),
        )
        .attribute(
            "created_at",
            Attribute::string()
                .computed()
                .description("The API token creation date."),
        )
        .attribute(
            "secret",
            Attribute::string()
                .computed()
                .sensitive()
                .description("The API token secret."),
        )
}

pub(crate) fn flatten_tokens(tokens: &[&ApiToken]) -> Vec<Value> {
    tokens
        .iter()
        .map(|token| {
            json!({
                "username": token.name(),
                "type": token.token_type,
                "environment": token.environment,
                "projects": token.projects,
                "expires_at": token.expires_at.clone().unwrap_or_default(),
                "created_at": token.created_at.clone().unwrap_or_default(),
                "secret": token.secret,
            })
        })
        .collect()
}

pub struct ApiTokensDataSource;

#[async_trait]
impl DataSource for ApiTokensDataSource {
    fn type_name(&self) -> &'static str {
        "unleash_api_tokens"
    }

    fn schema(&self) -> ResourceSchema {
        let block = Block::new()
            .attribute(
                "username",
                Attribute::string()
                    .optional()
                    .description("Filter tokens by username."),
            )
            .attribute(
                "projects",
                Attribute::set_of_strings()
                    .optional()
                    .description("Filter tokens by project(s)."),
            )
            .attribute(
                "tokens",
                Attribute::list_block(token_block())
                    .computed()
                    .description("List of api tokens."),
            );

        ResourceSchema::new(
            "Retrieves existing api tokens. Filters are optional.",
            block,
        )
    }

    async fn read(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()> {
        let all = client.list_api_tokens().await?;

        let username = d.get_str("username").to_string();
        let projects = d.get_string_list("projects");

        let (found, id): (Vec<&ApiToken>, String) = if username.is_empty() && projects.is_empty() {
            (all.iter().collect(), lookup_id("*", &["*".to_string()]))
        } else {
            let found = all
                .iter()
                .filter(|t| username.is_empty() || t.name() == username)
                .filter(|t| covers_projects(&projects, &t.projects))
                .collect();
            (found, lookup_id(&username, &projects))
        };
        tracing::debug!("{} of {} api tokens match", found.len(), all.len());

        d.set("tokens", flatten_tokens(&found));
        d.set_id(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_covers_projects() {
        assert!(covers_projects(&[], &strings(&["*"])));
        assert!(covers_projects(&strings(&["web"]), &strings(&["web", "api"])));
        assert!(!covers_projects(&strings(&["web", "api"]), &strings(&["web"])));
        assert!(!covers_projects(&strings(&["mobile"]), &strings(&["web", "api"])));
    }

    #[test]
    fn test_lookup_id_without_filters() {
        assert_eq!(lookup_id("*", &strings(&["*"])), md5_hex("**"));
        assert_eq!(lookup_id("ci", &strings(&["a", "b"])), md5_hex("cia,b"));
    }
}
