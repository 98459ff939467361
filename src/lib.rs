pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod finder;
pub mod matcher;
pub mod refresh;
pub mod state;
pub mod types;

#[cfg(test)]
mod testutil;

pub use finder::TradeFinder;
