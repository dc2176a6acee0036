//! forksync - keep forks in step with their upstream
//!
//! forksync brings a local branch up to date with the same branch on an
//! upstream remote and publishes the result to the fork's own remote. A
//! repository that is behind is fast-forwarded; one that has diverged gets a
//! merge commit; one with conflicts is reported and left untouched.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Resolve → Analyze → Integrate → Publish pipeline per repository
//! - [`core`] - Domain types and configuration
//! - [`git`] - Single interface for all Git operations
//! - [`credentials`] - Push credential lookup
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. The local branch only ever moves forward or gains a merge commit
//! 2. Nothing is published unless integration completed cleanly
//! 3. Pushes are never forced
//! 4. One repository's failure never affects another's

pub mod cli;
pub mod core;
pub mod credentials;
pub mod engine;
pub mod git;
pub mod ui;
