//! Template mini-language
//!
//! Lexing is kept apart from evaluation so the grammar can be exercised
//! without touching variables or spawning processes.

pub mod evaluator;
pub mod lexer;

pub use evaluator::{resolve_identifier, TemplateError, TemplateEvaluator};
pub use lexer::{tokenize, Lexer, Token, TokenKind};
