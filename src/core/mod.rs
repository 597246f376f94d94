pub mod diagnostics;
pub mod engine;
pub mod provider;
pub mod resource_data;
pub mod schema;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use engine::{ProviderEngine, Request, Response};
pub use provider::{PlannedChange, Provider, State};
pub use resource_data::ResourceData;
pub use schema::{Attribute, Block, ProviderSchema, ResourceSchema, ValueType};
