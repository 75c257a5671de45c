//! Alert triage: join alert, customer and transaction tables into
//! numeric features, fit a logistic regression on historical priority
//! flags, and score every alert with a probability of being high priority.

pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod records;
pub mod rng;
pub mod scoring;
pub mod synth;
pub mod tables;
pub mod types;
