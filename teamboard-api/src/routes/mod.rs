/// API route handlers, one module per resource
///
/// Handlers stay thin: extract, call the matching service in
/// `teamboard_shared::services`, wrap the result in the response envelope.

pub mod auth;
pub mod boards;
pub mod health;
pub mod invitations;
pub mod members;
pub mod notifications;
pub mod profile;
pub mod tasks;
pub mod teams;
