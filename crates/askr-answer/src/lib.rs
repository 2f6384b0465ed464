//! askr Answer
//!
//! Entry point of the pipeline. [`AnswerOrchestrator`] tries the structured
//! tier, then the retrieval-augmented tier, and renders the outcome as a
//! user-facing string. Every request ends in one of four outcomes:
//!
//! | Outcome     | Returned text                         |
//! |-------------|---------------------------------------|
//! | Structured  | entry content                         |
//! | Generated   | grounded completion                   |
//! | No answer   | [`NO_ANSWER_MESSAGE`]                 |
//! | Fault       | [`SYSTEM_ERROR_MESSAGE`]              |
//!
//! # Example
//!
//! ```rust,ignore
//! use askr_answer::AnswerOrchestrator;
//! use askr_core::{AskrConfig, Role};
//!
//! # async fn example(orchestrator: AnswerOrchestrator) {
//! let reply = orchestrator.answer("Leave Policy", Role::It, "u1").await;
//! println!("{reply}");
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod orchestrator;

pub use orchestrator::{
    render, AnswerOrchestrator, Resolution, NO_ANSWER_MESSAGE, SYSTEM_ERROR_MESSAGE,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
