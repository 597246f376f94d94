//! Terraform resources and data sources for Unleash.

pub mod data_sources;
pub mod expand;
pub mod resources;
pub mod roles;
pub mod strategy_params;
