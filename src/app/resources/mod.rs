pub mod api_token;
pub mod feature;
pub mod feature_enabling;
pub mod feature_v2;
pub mod project;
pub mod strategy_assignment;
pub mod user;

use crate::domain::ports::Resource;

pub use api_token::ApiTokenResource;
pub use feature::FeatureResource;
pub use feature_enabling::FeatureEnablingResource;
pub use feature_v2::FeatureV2Resource;
pub use project::ProjectResource;
pub use strategy_assignment::StrategyAssignmentResource;
pub use user::UserResource;

/// Every resource the provider registers.
pub fn all() -> Vec<Box<dyn Resource>> {
    vec![
        Box::new(FeatureResource),
        Box::new(FeatureV2Resource),
        Box::new(StrategyAssignmentResource),
        Box::new(FeatureEnablingResource),
        Box::new(UserResource),
        Box::new(ApiTokenResource),
        Box::new(ProjectResource),
    ]
}
