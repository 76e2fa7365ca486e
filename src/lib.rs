//! InvestoMart
//!
//! Client-side core of the InvestoMart livestock marketplace: catalog items, the
//! shopping cart, the signed-in session, checkout totals, and chatbot conversations.
//!
//! Everything in this crate is synchronous and free of I/O. The `investomart-app`
//! crate wires these stores to the REST backend.

pub mod cart;
pub mod catalog;
pub mod chat;
pub mod checkout;
pub mod search;
pub mod session;
