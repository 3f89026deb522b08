//! Port contracts for the board core.
//!
//! Ports define infrastructure-agnostic interfaces used by board services:
//! durable storage, the authorization collaborator, and the outbound mail
//! gateway.

pub mod authorizer;
pub mod mail;
pub mod repository;

pub use authorizer::{Authorizer, AuthorizerError, BoardAction};
pub use mail::{MailGateway, MailGatewayError, MailPayload, MailTemplate};
pub use repository::{BoardRepository, BoardRepositoryError, BoardRepositoryResult};
