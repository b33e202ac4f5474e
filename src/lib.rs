// Library surface for the binary, headless tests and reuse.
// Rendering lives in the binary; everything here is terminal-agnostic
// apart from the event plumbing in `runtime`.
pub mod app_dirs;
pub mod celebration;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod history;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod store;
pub mod typing_policy;

pub use engine::{SessionEvent, TypingEngine};
pub use session::{Session, SessionConfig, SessionStatus, TimerMode};
