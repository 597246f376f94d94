// Adapters layer: clients for the external systems the provider talks to.

pub mod unleash_client;

pub use unleash_client::UnleashClient;
