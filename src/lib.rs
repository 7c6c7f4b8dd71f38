pub mod classifier;
pub mod config;
pub mod conversation;
pub mod error;
pub mod inference;
pub mod responses;
pub mod session;
pub mod web;

pub use classifier::{MoodClassifier, MoodPipeline};
pub use config::AppConfig;
pub use error::MoodError;
