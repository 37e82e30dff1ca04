pub mod config;
pub mod domain;

pub use config::{
    AgentConfig, AppConfig, ConfigError, ConfigOverrides, LlmConfig, LoadOptions, LogFormat,
    LoggingConfig, StoreConfig,
};
pub use domain::lead::{Lead, LeadDraft, LeadId, LeadPatch, Note};
