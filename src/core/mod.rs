//! Core Module - Componenti infrastrutturali della libreria
//!
//! Questo modulo contiene tutti i componenti "core":
//! - Configurazione
//! - Gestione errori
//! - Persistence context e salvataggio delle modifiche
//! - Logging

pub mod config;
pub mod context;
pub mod error;
pub mod telemetry;

// Re-exports per facilitare l'import
pub use config::Config;
pub use context::{ChangeSet, DbContext};
pub use error::{Error, Result};
pub use telemetry::init_tracing;
