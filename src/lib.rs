pub mod agent;
pub mod browser_pool;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod domain_utils;
pub mod enrichment;
pub mod extract;
pub mod html;
pub mod logger;
pub mod probe;
pub mod retriever;
pub mod session_log;
pub mod target;

pub use agent::Agent;
pub use config::AppConfig;
pub use target::Target;
