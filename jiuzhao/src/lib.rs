//! Interactive Lean 4 formalization agent.
//!
//! A language model proposes actions by embedding `<TOOL name="...">` envelopes
//! in its replies; the host executes them against a workspace and a Lean
//! verifier and feeds the results back until the model yields, reports a
//! verified result, or runs out of turns. The crate keeps a strict split:
//!
//! - **[`core`]**: Pure, deterministic logic (envelope parsing, argument
//!   decoding, history, budgets). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config files, subprocesses, the
//!   model endpoint). Isolated behind traits to enable fakes in tests.
//!
//! [`tools`] implements the capabilities the model may call and [`agent`]
//! drives the conversation.

pub mod agent;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod render;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tools;
