pub mod completion_llm;
pub mod firebase;
pub mod session_store;

pub use completion_llm::OpenAiCompletionAdapter;
pub use firebase::FirebaseVerifier;
pub use session_store::MemorySessionStore;
