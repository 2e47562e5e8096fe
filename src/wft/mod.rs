//! The formula language: lexer, parser, and lowering into the node store.
//!
//! ```text
//! wft   := term | "string" | int | wftN | ?q
//!        | And(wft*) | Or(wft*) | Not(wft*) | Nor(wft*) | Thnot(wft*) | Thnor(wft*)
//!        | Nand(wft*) | Xor(wft*) | DoubImpl(wft*)
//!        | AndOr{i, j}(wft*) | Thresh{n}(wft*) | Thresh{i, j}(wft*)
//!        | Impl(arg, arg) | OrImpl(arg, arg) | AndImpl(arg, arg)
//!        | Every{x}(wft*) | every(x, wft*)
//!        | Some{x(dep*)}(wft*) | some(x(dep*), wft*)
//!        | Close(x, wft) | Close((x, y), wft)
//!        | ?q(wft*) | f(arg*) | head(arg*)
//! head  := term | wftN | f(arg*) | head(arg*) | Thresh{n}(wft*)
//! arg   := wft | setof(wft*) | none
//! ```
//!
//! Integers are terms and keep their spelling (`007` is not `7`); only the
//! bounds of `AndOr` and `Thresh` are read as numbers. A formula in function
//! position (`Isa(a, b)(c)`) lowers through the `apply` caseframe.
//!
//! Keywords are matched in CamelCase and lower case (`DoubImpl` is also `iff`,
//! `Impl` also `if`) and always take precedence over user names.

pub mod ast;
pub mod error;
pub mod lexer;
pub(crate) mod lower;
pub mod parser;

pub use ast::{Arg, Wft, WftKind};
pub use error::ParseError;
pub use lexer::{Keyword, Span};
pub use parser::parse;
