//! Async services that connect the InvestoMart client core to the marketplace
//! backend: catalog search, authentication and session persistence, checkout,
//! and the farming assistant chatbot.

pub mod api;
pub mod auth;
pub mod catalog;
pub mod chatbot;
pub mod checkout;
pub mod config;
pub mod context;
pub mod observability;
pub mod search;
pub mod session;

#[cfg(test)]
mod test;
