//! Canonical entity model and configuration shared by every `ampdash` crate.

pub mod app_config;
pub mod campaign;
pub mod config;
pub mod error;
pub mod reporting;

pub use app_config::{AppConfig, Environment, SourceShape};
pub use campaign::{Budget, Campaign, CampaignStatus, Content, Marketer, Platform};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, CoreError};
pub use reporting::{DateRange, ReportingSnapshot};

/// Currency assumed when an upstream marketer record omits one.
pub const DEFAULT_CURRENCY: &str = "GBP";
