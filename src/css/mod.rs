//! CSS engine: tokenizer, token stream, selector model and parser, `:has()`
//! scoping, matching.

pub mod tokenizer;
pub mod token_stream;
pub mod model;
pub mod parser;
pub mod has;
pub mod matching;
