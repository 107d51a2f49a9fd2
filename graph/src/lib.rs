pub mod auth;
pub mod client;
pub mod config;
pub mod permissions;
pub mod token;

pub use auth::AuthFlow;
pub use client::GraphClient;
pub use config::GraphConfig;
pub use token::TokenProvider;
