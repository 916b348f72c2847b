#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]

//! Torrent selection: a small filter language and the engine that drives it.
//!
//! Layout:
//! - `lexer.rs` / `parser.rs` / `ast.rs`: tokens, precedence parser, expression tree
//! - `eval.rs`: typed values, null-tolerant evaluation, the boolean check
//! - `engine.rs`: flag guard, field planning, per-identifier matching
//! - `error.rs`: `ExprError` and `SelectError`

pub mod ast;
pub mod engine;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::{Expr, IDENTIFIER};
pub use engine::{DEFAULT_MATCH, Plan, Selector};
pub use error::{ExprError, SelectError};
pub use eval::{Env, Value, evaluate, matches};
pub use parser::parse;
