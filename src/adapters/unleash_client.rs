use crate::config::ProviderConfig;
use crate::domain::model::{
    ApiToken, ApiTokens, CreateApiToken, FeatureStrategy, FeatureTag, FeatureTags,
    FeatureToggle, FeatureType, FeatureTypes, Project, StrategyDefinition, UpdateApiToken,
    UpdateFeatureTags, User, UserRequest,
};
use crate::utils::error::{ProviderError, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

/// Client for the Unleash admin API (`<server>/api/admin/...`).
#[derive(Debug, Clone)]
pub struct UnleashClient {
    client: Client,
    base_url: Url,
}

/// Server root for an `api_url` such as `https://unleash.example.com/api`.
pub fn server_root(api_url: &str) -> &str {
    let trimmed = api_url.trim_end_matches('/');
    trimmed.strip_suffix("/api").unwrap_or(trimmed)
}

impl UnleashClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let root = server_root(&config.api_url);
        let base_url = Url::parse(root).map_err(|e| ProviderError::InvalidConfigValueError {
            field: "api_url".to_string(),
            value: config.api_url.clone(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        let mut auth = HeaderValue::from_str(&config.auth_token).map_err(|_| {
            ProviderError::InvalidConfigValueError {
                field: "auth_token".to_string(),
                value: "(sensitive)".to_string(),
                reason: "Token contains characters not allowed in an HTTP header".to_string(),
            }
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "admin"]).extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client.request(method, self.endpoint(segments))
    }

    async fn send(&self, request: RequestBuilder, resource: &str) -> Result<reqwest::Response> {
        let request = request.build()?;
        let method = request.method().to_string();
        let url = request.url().to_string();
        tracing::debug!("Making API request: {} {}", method, url);

        let response = self.client.execute(request).await?;
        let status = response.status();
        tracing::debug!("API response status: {} ({} {})", status, method, url);

        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::not_found(resource));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiStatusError {
                method,
                url,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<T> {
        let response = self.send(request, resource).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    // Feature toggles

    pub async fn create_feature(&self, feature: &FeatureToggle) -> Result<FeatureToggle> {
        let request = self
            .request(Method::POST, &["projects", &feature.project, "features"])
            .json(feature);
        self.send_json(request, &format!("project '{}'", feature.project))
            .await
    }

    pub async fn get_feature(&self, project: &str, name: &str) -> Result<FeatureToggle> {
        let request = self.request(Method::GET, &["projects", project, "features", name]);
        self.send_json(request, &feature_label(project, name)).await
    }

    pub async fn update_feature(&self, feature: &FeatureToggle) -> Result<FeatureToggle> {
        let request = self
            .request(
                Method::PUT,
                &["projects", &feature.project, "features", &feature.name],
            )
            .json(feature);
        self.send_json(request, &feature_label(&feature.project, &feature.name))
            .await
    }

    pub async fn archive_feature(&self, project: &str, name: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &["projects", project, "features", name]);
        self.send(request, &feature_label(project, name)).await?;
        Ok(())
    }

    pub async fn delete_archived_feature(&self, name: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &["archive", name]);
        self.send(request, &format!("archived feature '{}'", name))
            .await?;
        Ok(())
    }

    pub async fn add_strategy(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        strategy: &FeatureStrategy,
    ) -> Result<FeatureStrategy> {
        let request = self
            .request(
                Method::POST,
                &[
                    "projects",
                    project,
                    "features",
                    feature,
                    "environments",
                    environment,
                    "strategies",
                ],
            )
            .json(strategy);
        self.send_json(request, &feature_label(project, feature))
            .await
    }

    pub async fn update_strategy(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        strategy: &FeatureStrategy,
    ) -> Result<FeatureStrategy> {
        let request = self
            .request(
                Method::PUT,
                &[
                    "projects",
                    project,
                    "features",
                    feature,
                    "environments",
                    environment,
                    "strategies",
                    &strategy.id,
                ],
            )
            .json(strategy);
        self.send_json(request, &format!("strategy '{}'", strategy.id))
            .await
    }

    pub async fn delete_strategy(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        strategy_id: &str,
    ) -> Result<()> {
        let request = self.request(
            Method::DELETE,
            &[
                "projects",
                project,
                "features",
                feature,
                "environments",
                environment,
                "strategies",
                strategy_id,
            ],
        );
        self.send(request, &format!("strategy '{}'", strategy_id))
            .await?;
        Ok(())
    }

    pub async fn set_environment_enabled(
        &self,
        project: &str,
        feature: &str,
        environment: &str,
        enabled: bool,
    ) -> Result<()> {
        let switch = if enabled { "on" } else { "off" };
        let request = self.request(
            Method::POST,
            &[
                "projects",
                project,
                "features",
                feature,
                "environments",
                environment,
                switch,
            ],
        );
        self.send(
            request,
            &format!("environment '{}' of {}", environment, feature_label(project, feature)),
        )
        .await?;
        Ok(())
    }

    pub async fn get_strategy_definition(&self, name: &str) -> Result<StrategyDefinition> {
        let request = self.request(Method::GET, &["strategies", name]);
        self.send_json(request, &format!("strategy definition '{}'", name))
            .await
    }

    // Tags

    pub async fn get_feature_tags(&self, feature: &str) -> Result<Vec<FeatureTag>> {
        let request = self.request(Method::GET, &["features", feature, "tags"]);
        let tags: FeatureTags = self
            .send_json(request, &format!("feature '{}'", feature))
            .await?;
        Ok(tags.tags)
    }

    pub async fn add_feature_tag(&self, feature: &str, tag: &FeatureTag) -> Result<()> {
        let request = self
            .request(Method::POST, &["features", feature, "tags"])
            .json(tag);
        self.send(request, &format!("feature '{}'", feature)).await?;
        Ok(())
    }

    pub async fn update_feature_tags(
        &self,
        feature: &str,
        added: Vec<FeatureTag>,
        removed: Vec<FeatureTag>,
    ) -> Result<()> {
        let body = UpdateFeatureTags {
            added_tags: added,
            removed_tags: removed,
        };
        let request = self
            .request(Method::PUT, &["features", feature, "tags"])
            .json(&body);
        self.send(request, &format!("feature '{}'", feature)).await?;
        Ok(())
    }

    pub async fn list_feature_types(&self) -> Result<Vec<FeatureType>> {
        let request = self.request(Method::GET, &["feature-types"]);
        let types: FeatureTypes = self.send_json(request, "feature types").await?;
        Ok(types.types)
    }

    // Projects

    pub async fn create_project(&self, project: &Project) -> Result<Project> {
        let request = self.request(Method::POST, &["projects"]).json(project);
        self.send_json(request, "projects").await
    }

    pub async fn get_project(&self, id: &str) -> Result<Project> {
        let request = self.request(Method::GET, &["projects", id]);
        self.send_json(request, &format!("project '{}'", id)).await
    }

    pub async fn update_project(&self, project: &Project) -> Result<()> {
        let request = self
            .request(Method::PUT, &["projects", &project.id])
            .json(project);
        self.send(request, &format!("project '{}'", project.id))
            .await?;
        Ok(())
    }

    pub async fn delete_project(&self, id: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &["projects", id]);
        self.send(request, &format!("project '{}'", id)).await?;
        Ok(())
    }

    // Users

    pub async fn create_user(&self, user: &UserRequest) -> Result<User> {
        let request = self.request(Method::POST, &["user-admin"]).json(user);
        self.send_json(request, "users").await
    }

    pub async fn get_user(&self, id: &str) -> Result<User> {
        let request = self.request(Method::GET, &["user-admin", id]);
        self.send_json(request, &format!("user '{}'", id)).await
    }

    pub async fn update_user(&self, id: &str, user: &UserRequest) -> Result<()> {
        let request = self.request(Method::PUT, &["user-admin", id]).json(user);
        self.send(request, &format!("user '{}'", id)).await?;
        Ok(())
    }

    pub async fn delete_user(&self, id: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &["user-admin", id]);
        self.send(request, &format!("user '{}'", id)).await?;
        Ok(())
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        let mut url = self.endpoint(&["user-admin", "search"]);
        url.query_pairs_mut().append_pair("q", query);
        let request = self.client.get(url);
        self.send_json(request, "users").await
    }

    // API tokens

    pub async fn list_api_tokens(&self) -> Result<Vec<ApiToken>> {
        let request = self.request(Method::GET, &["api-tokens"]);
        let tokens: ApiTokens = self.send_json(request, "api tokens").await?;
        Ok(tokens.tokens)
    }

    pub async fn create_api_token(&self, token: &CreateApiToken) -> Result<ApiToken> {
        let request = self.request(Method::POST, &["api-tokens"]).json(token);
        self.send_json(request, "api tokens").await
    }

    pub async fn update_api_token(&self, secret: &str, expires_at: &str) -> Result<()> {
        let body = UpdateApiToken {
            expires_at: expires_at.to_string(),
        };
        let request = self
            .request(Method::PUT, &["api-tokens", secret])
            .json(&body);
        self.send(request, "api token").await?;
        Ok(())
    }

    pub async fn delete_api_token(&self, secret: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &["api-tokens", secret]);
        self.send(request, "api token").await?;
        Ok(())
    }
}

fn feature_label(project: &str, name: &str) -> String {
    format!("feature '{}' in project '{}'", name, project)
}
