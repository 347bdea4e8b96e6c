pub mod domain;
pub mod ports;
pub mod prompt;

pub use domain::{ChatMessage, ChatRole, CollegeInfo, Identity, SessionRecord};
pub use ports::{CompletionService, IdentityVerifier, PortError, PortResult, SessionStore};
pub use prompt::{build_messages, build_system_prompt};
