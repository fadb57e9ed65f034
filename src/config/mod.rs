pub mod app;

pub use app::{AppConfig, ModelPaths};
