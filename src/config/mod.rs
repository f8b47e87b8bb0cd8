// src/config/mod.rs
pub mod credibility;

pub use credibility::{CredibilityConfig, ScoringSection, TwitterSection};
