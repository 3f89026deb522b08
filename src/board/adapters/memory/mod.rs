//! In-memory adapters for tests and embedding hosts.

mod authorizer;
mod board;
mod mail;

pub use authorizer::StaticAuthorizer;
pub use board::InMemoryBoardRepository;
pub use mail::{RecordingMailGateway, SentMail};
