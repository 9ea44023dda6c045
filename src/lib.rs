pub mod config;
pub mod eligibility;
pub mod extract;
mod lenient;
pub mod output;
pub mod predicate;
pub mod profile;
pub mod ranking;
pub mod region;
pub mod rules;
pub mod scheme;
pub mod server;
pub mod source;
pub mod store;
