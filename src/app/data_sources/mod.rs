pub mod api_token;
pub mod api_tokens;
pub mod feature;
pub mod feature_type;
pub mod project;
pub mod user;
pub mod users;

use crate::domain::ports::DataSource;

pub use api_token::ApiTokenDataSource;
pub use api_tokens::ApiTokensDataSource;
pub use feature::FeatureDataSource;
pub use feature_type::FeatureTypeDataSource;
pub use project::ProjectDataSource;
pub use user::UserDataSource;
pub use users::UsersDataSource;

/// Every data source the provider registers.
pub fn all() -> Vec<Box<dyn DataSource>> {
    vec![
        Box::new(FeatureDataSource),
        Box::new(ProjectDataSource),
        Box::new(FeatureTypeDataSource),
        Box::new(UsersDataSource),
        Box::new(UserDataSource),
        Box::new(ApiTokensDataSource),
        Box::new(ApiTokenDataSource),
    ]
}
