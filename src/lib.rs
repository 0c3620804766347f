//! Lead funnel: checkout capture, onboarding wizard and qualification chat
//! over one session-scoped record.

pub mod api;
pub mod chat;
pub mod checkout;
pub mod config;
pub mod error;
pub mod funnel;
pub mod login;
pub mod model;
pub mod reconcile;
pub mod store;
pub mod view;
pub mod wizard;
