use crate::adapters::unleash_client::UnleashClient;
use crate::core::resource_data::ResourceData;
use crate::core::schema::ResourceSchema;
use crate::utils::error::Result;
use async_trait::async_trait;

/// A managed Terraform resource backed by the Unleash admin API.
///
/// Implementations translate between the attribute bag and API calls.
/// `read` clears the id when the remote object no longer exists.
#[async_trait]
pub trait Resource: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn schema(&self) -> ResourceSchema;
    async fn create(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()>;
    async fn read(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()>;
    async fn update(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()>;
    async fn delete(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()>;
}

#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn schema(&self) -> ResourceSchema;
    async fn read(&self, d: &mut ResourceData, client: &UnleashClient) -> Result<()>;
}
