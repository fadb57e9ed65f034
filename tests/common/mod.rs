// tests/common/mod.rs
//
// Shared helpers: config pointing at the shipped model descriptors.

#![allow(dead_code)]

use std::path::Path;

use fraud_risk_pipeline::config::{AppConfig, ModelPaths};

pub fn models_dir() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("models")
}

pub fn test_config() -> AppConfig {
    AppConfig {
        models: ModelPaths::in_dir(models_dir()),
        metrics_enabled: false,
        ..AppConfig::default()
    }
}

pub const HIGH_RISK_FORM: &str = "order_velocity=9.0&device_changes=3&ip_changes=2&unpaid_ratio=0.6\
&risky_flag=1&threshold=0.5&annotation=order+vel%3B+dev+chg";

pub const LOW_RISK_FORM: &str = "order_velocity=2.0&device_changes=0&ip_changes=0&unpaid_ratio=0.0\
&risky_flag=0&threshold=0.5&annotation=moderate+activity+increase+but+no+strong+cluster+linkage.";
