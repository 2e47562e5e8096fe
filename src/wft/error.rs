//! Diagnostics for the formula language.
//!
//! Every variant carries the formula text and the byte span of the offending
//! token, so miette can point at the exact position.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("unexpected {found}, expected {expected}")]
    #[diagnostic(
        code(semnet::wft::unexpected_token),
        help(
            "Formulas look like `And(Isa(Fido, Dog), Isa(Rex, Dog))`. Quote a term \
             with double quotes if it is spelled like a keyword: `\"and\"`."
        )
    )]
    UnexpectedToken {
        found: String,
        expected: String,
        #[source_code]
        src: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("formula ended early, expected {expected}")]
    #[diagnostic(
        code(semnet::wft::unexpected_end),
        help("Check for a missing closing parenthesis or argument.")
    )]
    UnexpectedEnd {
        expected: String,
        #[source_code]
        src: String,
        #[label("formula ends here")]
        span: SourceSpan,
    },

    #[error("unterminated string literal")]
    #[diagnostic(
        code(semnet::wft::unterminated_string),
        help("Close the string with a double quote. Use `\\\"` for a quote inside it.")
    )]
    UnterminatedString {
        #[source_code]
        src: String,
        #[label("string starts here")]
        span: SourceSpan,
    },

    #[error("invalid character {ch:?}")]
    #[diagnostic(
        code(semnet::wft::invalid_character),
        help("Terms are identifiers, integers or double-quoted strings.")
    )]
    InvalidCharacter {
        ch: char,
        #[source_code]
        src: String,
        #[label("not allowed here")]
        span: SourceSpan,
    },

    #[error("parameter {text} is too large")]
    #[diagnostic(
        code(semnet::wft::integer_overflow),
        help("`AndOr` and `Thresh` bounds count arguments, so they must be small integers.")
    )]
    IntegerOverflow {
        text: String,
        #[source_code]
        src: String,
        #[label("too large")]
        span: SourceSpan,
    },

    #[error("invalid parameters for {keyword}: {message}")]
    #[diagnostic(
        code(semnet::wft::invalid_parameters),
        help(
            "`AndOr{{i, j}}` and `Thresh{{i, j}}` need i <= j <= number of arguments. \
             `Thresh{{n}}` means `Thresh{{n, arguments - 1}}`."
        )
    )]
    InvalidParameters {
        keyword: String,
        message: String,
        #[source_code]
        src: String,
        #[label("these parameters")]
        span: SourceSpan,
    },

    #[error("variable \"{name}\" is not bound")]
    #[diagnostic(
        code(semnet::wft::unbound_variable),
        help(
            "A `some` variable can only depend on variables introduced earlier in the \
             same formula by `every` or `some`."
        )
    )]
    UnboundVariable {
        name: String,
        #[source_code]
        src: String,
        #[label("not bound at this point")]
        span: SourceSpan,
    },
}

impl ParseError {
    /// Byte offset of the error within the formula.
    pub fn offset(&self) -> usize {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::UnexpectedEnd { span, .. }
            | Self::UnterminatedString { span, .. }
            | Self::InvalidCharacter { span, .. }
            | Self::IntegerOverflow { span, .. }
            | Self::InvalidParameters { span, .. }
            | Self::UnboundVariable { span, .. } => span.offset(),
        }
    }
}
