pub mod adapters;
pub mod config;
pub mod credentials;
pub mod error;
pub mod web;

#[cfg(test)]
pub mod test_support;
