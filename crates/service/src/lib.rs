//! Service layer for dqbot
//!
//! Runs stored assertions, folds their verdicts into the history table,
//! answers reporting queries, and drives the chat save flow.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::min_ident_chars, reason = "Short error vars are idiomatic")]

mod aggregator;
mod blocking;
mod error;
pub mod gateway;
mod pipeline;
mod reporting_service;
mod runner;

pub use aggregator::{Aggregator, tally};
pub use error::{AggregationError, GatewayError, ServiceError};
pub use gateway::{ConversationGateway, GatewayState, Session, TurnReply};
pub use pipeline::{RunPipeline, RunReport};
pub use reporting_service::ReportingService;
pub use runner::{RunOutcome, TestRunner, classify};
