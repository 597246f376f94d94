use crate::adapters::unleash_client::UnleashClient;
use crate::app::{data_sources, resources};
use crate::config::{ProviderConfig, DEFAULT_TIMEOUT_SECONDS};
use crate::core::diagnostics::Diagnostics;
use crate::core::resource_data::ResourceData;
use crate::core::schema::{Attribute, Block, ProviderSchema};
use crate::domain::ports::{DataSource, Resource};
use crate::utils::error::{ProviderError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

pub type State = Map<String, Value>;

/// Outcome of planning a resource change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlannedChange {
    /// None when the resource is being destroyed.
    pub planned_state: Option<State>,
    pub requires_replace: Vec<String>,
}

/// Resource and data source registry plus the configured API client.
pub struct Provider {
    version: String,
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSource>>,
    client: Option<UnleashClient>,
    timeout: Duration,
}

pub fn provider_block() -> Block {
    Block::new()
        .attribute(
            "api_url",
            Attribute::string()
                .required()
                .env_default("UNLEASH_API_URL")
                .description("URL of the unleash API"),
        )
        .attribute(
            "auth_token",
            Attribute::string()
                .required()
                .sensitive()
                .env_default("UNLEASH_AUTH_TOKEN")
                .description("Authentication token to authenticate to the Unleash API"),
        )
}

fn object(value: Option<Value>) -> State {
    match value {
        Some(Value::Object(obj)) => obj,
        _ => Map::new(),
    }
}

impl Provider {
    pub fn new(version: impl Into<String>) -> Self {
        let resources = resources::all()
            .into_iter()
            .map(|r| (r.type_name(), r))
            .collect();
        let data_sources = data_sources::all()
            .into_iter()
            .map(|ds| (ds.type_name(), ds))
            .collect();

        Self {
            version: version.into(),
            resources,
            data_sources,
            client: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    pub fn schema(&self) -> ProviderSchema {
        ProviderSchema {
            provider: provider_block(),
            resources: self
                .resources
                .iter()
                .map(|(name, r)| (name.to_string(), r.schema()))
                .collect(),
            data_sources: self
                .data_sources
                .iter()
                .map(|(name, ds)| (name.to_string(), ds.schema()))
                .collect(),
        }
    }

    /// Configures from a provider block; environment defaults fill gaps.
    pub fn configure(&mut self, config: Value) -> Diagnostics {
        let block = provider_block();
        let mut attrs = object(Some(config));
        block.apply_defaults(&mut attrs);

        let diags = block.validate(&attrs, "");
        if diags.has_errors() {
            return diags;
        }

        let result = ProviderConfig::from_attributes(&attrs, self.timeout)
            .and_then(|config| self.configure_with(&config).map(|()| config));
        match result {
            Ok(config) => {
                let mut diags = diags;
                if !config.api_url.trim_end_matches('/').ends_with("/api") {
                    diags.warning(
                        "api_url does not end with /api",
                        format!(
                            "Admin requests will be sent to {}/api/admin",
                            config.api_url.trim_end_matches('/')
                        ),
                    );
                }
                diags
            }
            Err(e) => Diagnostics::from_error(&e),
        }
    }

    pub fn configure_with(&mut self, config: &ProviderConfig) -> Result<()> {
        let client = UnleashClient::new(config)?;
        tracing::info!("Configured Unleash provider {} for {}", self.version(), config.api_url);
        self.client = Some(client);
        Ok(())
    }

    fn client(&self) -> Result<&UnleashClient> {
        self.client.as_ref().ok_or(ProviderError::NotConfigured)
    }

    fn resource(&self, type_name: &str) -> Result<&dyn Resource> {
        self.resources
            .get(type_name)
            .map(|r| &**r)
            .ok_or_else(|| ProviderError::UnknownTypeError {
                kind: "resource".to_string(),
                name: type_name.to_string(),
            })
    }

    fn data_source(&self, type_name: &str) -> Result<&dyn DataSource> {
        self.data_sources
            .get(type_name)
            .map(|r| &**r)
            .ok_or_else(|| ProviderError::UnknownTypeError {
                kind: "data source".to_string(),
                name: type_name.to_string(),
            })
    }

    pub fn validate_resource_config(&self, type_name: &str, config: Value) -> Diagnostics {
        match self.resource(type_name) {
            Ok(resource) => {
                let block = resource.schema().block;
                let mut attrs = object(Some(config));
                block.apply_defaults(&mut attrs);
                block.validate(&attrs, "")
            }
            Err(e) => Diagnostics::from_error(&e),
        }
    }

    pub fn validate_data_source_config(&self, type_name: &str, config: Value) -> Diagnostics {
        match self.data_source(type_name) {
            Ok(data_source) => {
                let block = data_source.schema().block;
                let mut attrs = object(Some(config));
                block.apply_defaults(&mut attrs);
                block.validate(&attrs, "")
            }
            Err(e) => Diagnostics::from_error(&e),
        }
    }

    /// Plans a change: defaults, validation, carried-over computed values
    /// and the attributes forcing a replacement.
    pub fn plan_resource_change(
        &self,
        type_name: &str,
        prior: Option<State>,
        proposed: Option<State>,
    ) -> Result<PlannedChange> {
        let block = self.resource(type_name)?.schema().block;

        let Some(mut planned) = proposed else {
            return Ok(PlannedChange::default());
        };
        block.strip_computed(&mut planned);
        block.apply_defaults(&mut planned);
        block.validate(&planned, "").into_result()?;

        let mut requires_replace = Vec::new();
        if let Some(prior) = prior {
            requires_replace = block.requires_replace(&prior, &planned);
            if requires_replace.is_empty() {
                block.keep_zero_values(&prior, &mut planned);
                block.merge_computed(&prior, &mut planned);
                if let Some(id) = prior.get("id").filter(|_| block.get("id").is_none()) {
                    planned.insert("id".to_string(), id.clone());
                }
            }
        }

        Ok(PlannedChange {
            planned_state: Some(planned),
            requires_replace,
        })
    }

    /// Applies a planned change and returns the new state, None once destroyed.
    pub async fn apply_resource_change(
        &self,
        type_name: &str,
        prior: Option<State>,
        planned: Option<State>,
    ) -> Result<Option<State>> {
        let resource = self.resource(type_name)?;
        let client = self.client()?;
        let block = resource.schema().block;

        match (prior, planned) {
            (None, None) => Ok(None),
            (Some(prior), None) => {
                tracing::info!("Destroying {}", type_name);
                let mut d = ResourceData::new(prior);
                resource.delete(&mut d, client).await?;
                Ok(None)
            }
            (None, Some(mut planned)) => {
                tracing::info!("Creating {}", type_name);
                block.apply_defaults(&mut planned);
                let mut d = ResourceData::new(planned);
                resource.create(&mut d, client).await?;
                Ok(d.into_state(&block))
            }
            (Some(prior), Some(mut planned)) => {
                block.apply_defaults(&mut planned);
                let replace = block.requires_replace(&prior, &planned);
                if !replace.is_empty() {
                    tracing::info!("Replacing {} because {:?} changed", type_name, replace);
                    let mut old = ResourceData::new(prior);
                    resource.delete(&mut old, client).await?;

                    // A replacement must not inherit the old object's id.
                    if block.get("id").is_none() {
                        planned.remove("id");
                    }
                    let mut d = ResourceData::new(planned);
                    resource.create(&mut d, client).await?;
                    return Ok(d.into_state(&block));
                }

                if planned == prior {
                    tracing::debug!("{} is unchanged, skipping update", type_name);
                    return Ok(Some(prior));
                }

                tracing::info!("Updating {}", type_name);
                let mut d = ResourceData::with_prior(prior, planned);
                resource.update(&mut d, client).await?;
                Ok(d.into_state(&block))
            }
        }
    }

    /// Refreshes state from Unleash; None when the object is gone.
    pub async fn read_resource(&self, type_name: &str, state: State) -> Result<Option<State>> {
        let resource = self.resource(type_name)?;
        let client = self.client()?;
        let block = resource.schema().block;

        let mut d = ResourceData::new(state);
        resource.read(&mut d, client).await?;
        Ok(d.into_state(&block))
    }

    pub async fn read_data_source(&self, type_name: &str, config: State) -> Result<State> {
        let data_source = self.data_source(type_name)?;
        let client = self.client()?;
        let block = data_source.schema().block;

        let mut attrs = config;
        block.apply_defaults(&mut attrs);
        block.validate(&attrs, "").into_result()?;

        let mut d = ResourceData::new(attrs);
        data_source.read(&mut d, client).await?;
        d.into_state(&block)
            .ok_or_else(|| ProviderError::not_found(format!("data source {}", type_name)))
    }
}
