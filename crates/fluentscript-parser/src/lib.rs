//! Lexer and parser for the FluentScript scripting language.
//!
//! FluentScript's defining feature is that its lexical and grammatical rules
//! are pluggable: extensions register interest in tokens, are probed in a
//! deterministic order, and produce tokens or AST nodes. Even the standard
//! statement forms are grammar plugins, and the `plugin` construct lets a
//! script register new grammar that is active for the rest of the same parse.
//!
//! # Example
//!
//! ```ignore
//! use fluentscript_parser::Parser;
//!
//! let source = r#"
//!     func refill inventory(product, amount) {
//!         return amount
//!     }
//!     refill inventory 'KL-131', 200
//! "#;
//!
//! let script = Parser::new(source).parse()?;
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod stream;
pub mod token;

pub use lexer::{LexError, Lexer};
pub use parser::registry::{GrammarMeta, GrammarPlugin, GrammarRegistry, StartToken};
pub use parser::{ParseContext, Parser, SyntaxError};
pub use stream::TokenStream;
pub use token::{Span, Sym, Token, TokenKind, TokenValue};
