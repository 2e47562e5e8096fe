//! Syntax tree of a parsed formula.

use super::lexer::Span;

/// A parsed well-formed formula with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wft {
    pub kind: WftKind,
    pub span: Span,
}

/// Variadic connectives whose arguments are plain formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    And,
    Or,
    Not,
    Nor,
    Thnot,
    Thnor,
    Nand,
    Xor,
    DoubImpl,
}

impl Connective {
    /// The built-in caseframe a connective lowers to.
    pub fn caseframe(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not | Self::Nor => "nor",
            Self::Thnot | Self::Thnor => "thnor",
            Self::Nand => "nand",
            Self::Xor => "xor",
            Self::DoubImpl => "iff",
        }
    }

    /// Whether a single argument is lowered in negated position.
    pub fn negates(self) -> bool {
        matches!(self, Self::Not | Self::Nor)
    }
}

/// Connectives with explicit min/max parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bounded {
    AndOr,
    Thresh,
}

impl Bounded {
    pub fn caseframe(self) -> &'static str {
        match self {
            Self::AndOr => "andor",
            Self::Thresh => "thresh",
        }
    }
}

/// Binary rule connectives with antecedent and consequent arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Impl,
    OrImpl,
    AndImpl,
}

impl Rule {
    pub fn caseframe(self) -> &'static str {
        match self {
            Self::Impl => "if",
            Self::OrImpl => "orimpl",
            Self::AndImpl => "andimpl",
        }
    }
}

/// A name together with where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub text: String,
    pub span: Span,
}

/// An argument of a rule or caseframe application: one filler set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Wft(Box<Wft>),
    /// `setof(a, b, ...)`
    SetOf(Vec<Wft>),
    /// `none`: the empty filler set.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WftKind {
    /// An identifier or integer; identifiers may name a bound variable.
    Term(String),
    /// A double-quoted term, never resolved against bound variables.
    Quoted(String),
    /// `wftN`, `arbN`, `indN`: an existing node.
    NodeRef(String),
    /// `?x` on its own.
    QueryVar(String),
    Connective {
        op: Connective,
        args: Vec<Wft>,
    },
    /// `AndOr{i, j}(...)`, `Thresh{n}(...)`, `Thresh{i, j}(...)`.
    Bounded {
        op: Bounded,
        min: usize,
        /// `None` for `Thresh{n}`: one less than the number of arguments.
        max: Option<usize>,
        params: Span,
        args: Vec<Wft>,
    },
    Rule {
        op: Rule,
        ant: Arg,
        cq: Arg,
    },
    /// `every(x, R...)` / `Every{x}(R...)`.
    Every {
        var: Name,
        restrictions: Vec<Wft>,
    },
    /// `some(x(d...), R...)` / `Some{x(d...)}(R...)`.
    Some {
        var: Name,
        depends_on: Vec<Name>,
        restrictions: Vec<Wft>,
    },
    /// `Close(x, wft)` / `Close((x, y), wft)`.
    Close {
        names: Vec<Name>,
        body: Box<Wft>,
    },
    /// `f(arg, ...)`: application of a user or built-in caseframe.
    Apply {
        caseframe: Name,
        args: Vec<Arg>,
    },
    /// `w(arg, ...)` where `w` is itself a formula (`wft1(a)`, `Isa(a, b)(c)`).
    /// Lowered through the `apply` caseframe with `w` as the operator.
    Application {
        head: Box<Wft>,
        args: Vec<Arg>,
    },
    /// `?q(a, ...)`.
    QueryApply {
        var: Name,
        args: Vec<Wft>,
    },
}
