//! Core domain types and screening logic.

pub mod error;
pub mod ohlcv;
pub mod instrument;
pub mod indicator;
pub mod indicator_frame;
pub mod series_prep;
pub mod volume_profile;
pub mod strategy;
pub mod strategy_eval;
pub mod pricing;
pub mod synergy;
pub mod ranker;
pub mod recommendation;
pub mod display;
pub mod universe;
pub mod scan;
pub mod config;
pub mod config_validation;
