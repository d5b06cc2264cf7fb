pub mod agent;
pub mod config;
pub mod errors;
pub mod git;
pub mod logger;
pub mod models;
pub mod prompt_template;
pub mod providers;
pub mod sandbox;
pub mod tools;
