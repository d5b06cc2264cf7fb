pub mod anthropic;
pub mod base;
pub mod configs;
pub mod errors;

#[cfg(test)]
pub mod mock;
