pub mod config;
pub mod events;
pub mod orchestrator;
pub mod pipeline_logger;
