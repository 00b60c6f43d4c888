pub mod concierge;
pub mod config;
pub mod error;
pub mod events;
pub mod integrations;
pub mod marketplace;
pub mod membership;
pub mod properties;
pub mod session;
pub mod store;
pub mod telemetry;
