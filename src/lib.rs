//! Calamari service provider - adapts the Calamari OCR microservice to a
//! host processing framework.
//!
//! The host drives each [`CalamariProvider`] through `initialize` / `start` /
//! `restart`, asks it for a configuration [`Model`] built from the remote
//! capability description, and checks its [`Premise`] before scheduling jobs.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod execution;
pub mod locale;
pub mod model;
pub mod premise;
pub mod provider;

pub use api::ProcessorType;
pub use error::{ProviderError, ProviderResult};
pub use locale::{Locale, LocalizedText};
pub use model::{build_model, Entry, Field, Model};
pub use premise::{Premise, PremiseState, Target};
pub use provider::{CalamariProvider, LifecycleState, ServiceProvider};
