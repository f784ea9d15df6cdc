// Shorthand parsers for command-line input

pub mod config;
pub mod lexer;

pub use config::parse_config;
