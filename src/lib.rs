//! Classroom Studio — AI-assisted teaching content over an LLM API.
//!
//! The binary entry point is `src/main.rs`; this library exposes the
//! pieces for integration tests.
//!
//! - **core** — configuration and the application error type.
//! - **bootstrap** — logger setup.
//! - **llm** — provider abstraction (dummy, OpenAI-compatible).
//! - **prompt** — template library and placeholder substitution.
//! - **tools** — story, worksheet, explainer, planner, game and analyzer.
//! - **media** — illustrations and narration.
//! - **sources** — upload ingestion (text, PDF, image OCR).
//! - **notebook** — in-memory notebooks and source-grounded chat.
//! - **server** — axum HTTP API.

pub mod bootstrap;
pub mod core;
pub mod llm;
pub mod media;
pub mod notebook;
pub mod prompt;
pub mod server;
pub mod sources;
pub mod tools;

pub use self::core::{config, error};
