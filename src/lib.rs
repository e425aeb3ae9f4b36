pub mod api_router;
pub mod billing;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod shared;
pub mod subscriptions;
pub mod tickets;
