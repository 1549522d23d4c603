pub mod algorithm;
pub mod comparison;
pub mod config;
pub mod detector;
pub mod error;
pub mod input;
pub mod language;
pub mod result;
pub mod strategy;
pub mod submission;
pub mod token;
pub mod validate;
