// --- File: crates/consulta_common/src/lib.rs ---

pub mod error; // Error handling
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod models; // Shared domain records
pub mod services; // Collaborator abstractions

// Re-export error types and utilities for easier access
pub use error::{
    config_error, external_service_error, internal_error, not_found, validation_error,
    ConsultaError, HttpStatusCode,
};

// Re-export HTTP utilities for easier access
pub use http::{client::HTTP_CLIENT, IntoHttpResponse};

// Re-export logging utilities for easier access
pub use logging::{init, init_from_config, init_with_level};
