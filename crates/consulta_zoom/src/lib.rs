//! Zoom integration for Consulta
//!
//! Creates and deletes scheduled meetings through the Zoom REST API using a
//! server-to-server OAuth app (account credentials grant).

pub mod error;
pub mod logic;
pub mod service;


pub use error::ZoomError;
pub use logic::ZoomClient;
pub use service::ZoomMeetingProvider;
