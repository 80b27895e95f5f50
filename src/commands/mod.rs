//! Command implementations for blabber

pub mod aggregate;
pub mod dispatch;
pub mod output;
pub mod post;
pub mod query;
pub mod session;
