//! A tree-walking interpreter for the Flux scripting language.
//!
//! Flux is a small dynamically-typed language with first-class functions,
//! lexical closures and a handful of native functions.  Source text flows
//! through a lexer and a recursive-descent parser into an AST that the
//! evaluator walks directly.
//!
//! # Examples
//!
//! See [`crate::interpreter::Interpreter`].

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

pub mod interpreter;

mod ast;
mod env;
mod eval;
mod lexer;
mod parser;
mod token;
mod value;
