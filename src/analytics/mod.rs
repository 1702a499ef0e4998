pub mod api_types;
pub mod client;
mod resources;

pub use client::AnalyticsClient;
pub use resources::Resource;
