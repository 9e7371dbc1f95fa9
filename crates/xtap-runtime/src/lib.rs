// Runtime module - host port for observed traffic
// Receives exchanges from the interception host and routes them to the
// harvester, the timeline decoder and the capture store. Owns no event loop.

pub mod analysis;
pub mod config;
pub mod error;
pub mod harvester;
pub mod interceptor;
pub mod ports;
pub mod replay;

pub use analysis::{analyze_flows, latest_explore_content, load_api_calls};
pub use config::{
    CONFIG_FILE, Config, DATA_DIR_ENV, DATABASE_FILE, FlowConfig, HarvestConfig, TimelineConfig,
    resolve_workspace_path,
};
pub use error::{Error, Result};
pub use harvester::{HarvestReport, Harvester};
pub use interceptor::{ExchangeHandler, ExchangeReport, Interceptor};
pub use ports::{CallLog, CredentialStore, EngagementStore};
pub use replay::{ReplayReport, replay, replay_file};
