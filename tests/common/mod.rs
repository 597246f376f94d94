#![allow(dead_code)]

use httpmock::MockServer;
use serde_json::{Map, Value};
use unleash_provider::{Provider, ProviderConfig};

pub const TOKEN: &str = "*:*.test-admin-token";

/// A provider already configured against the mock server.
pub fn provider_for(server: &MockServer) -> Provider {
    let mut provider = Provider::new("test");
    provider
        .configure_with(&ProviderConfig::new(server.url("/api"), TOKEN))
        .expect("provider configures");
    provider
}

pub fn state(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object literal")
}

pub fn admin(path: &str) -> String {
    format!("/api/admin{}", path)
}
