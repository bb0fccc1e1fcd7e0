//! Configuration management for the inventory agent.

mod agent_config;

pub use agent_config::{load_or_create_config, AgentConfig};
