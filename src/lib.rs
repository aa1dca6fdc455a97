//! MBASIC host - an embeddable MBASIC interpreter core
//!
//! Runs classic MBASIC programs against a virtual file store and an abstract
//! terminal, so a host (CLI, web page, test harness) decides where bytes and
//! keystrokes actually go.
//!
//! # Architecture
//!
//! ```text
//! mbasic-config  - plain configuration data
//! mbasic-vfs     - host store contract + program-facing file bridge
//! mbasic-core    - lexer, parser, terminal bridge, resumable statement machine
//! mbasic-api     - ExecutionSession state machine, errors, program editor
//! mbasic-cli     - `mbasic run` / `mbasic repl`
//! ```
//!
//! # Quick Start
//!
//! ```
//! use mbasic::{memory_session, SessionConfig, SessionState};
//!
//! let (mut session, console, _store) = memory_session(SessionConfig::default());
//! assert!(session.load("10 PRINT \"HELLO\"\n"));
//! session.run();
//! assert_eq!(session.state(), SessionState::Stopped);
//! assert_eq!(console.output(), "HELLO\n");
//! ```

pub use mbasic_api::*;
