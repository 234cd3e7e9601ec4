pub mod config;
pub mod dedup;
pub mod demo_feed;
pub mod export;
pub mod flatten;
pub mod http_client;
pub mod model;
pub mod odds_fetch;
pub mod pipeline;
pub mod provider;
pub mod scoring;
pub mod selection;
pub mod sports;
pub mod state;
pub mod window;
