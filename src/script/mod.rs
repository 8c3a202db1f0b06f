//! The embedded scripting language participants type at the prompt.
//!
//! Text goes through [`lexer::split_into_tokens`], then either
//! [`parser::construct_expression`] or [`parser::construct_program`], and the
//! result is run by an [`eval::Evaluator`] against a namespace owned by the caller.

pub mod builtin;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod value;

pub use eval::Evaluator;
pub use value::Value;
