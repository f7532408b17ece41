//! Reminder email delivery through the SendGrid v3 API.

pub mod error;
pub mod service;
pub mod templates;


pub use error::MailerError;
pub use service::SendGridEmailProvider;
pub use templates::{render_reminder, RenderedEmail};
