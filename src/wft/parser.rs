//! Recursive descent parser: formula text → [`Wft`] syntax trees.
//!
//! Single pass over the token stream with no error recovery: the first
//! syntax error aborts the parse with a [`ParseError`] pointing at the
//! offending token.

use super::ast::{Arg, Bounded, Connective, Name, Rule, Wft, WftKind};
use super::error::ParseError;
use super::lexer::{self, Keyword, Span, Token, TokenKind};

/// Parse a complete formula.
pub fn parse(src: &str) -> Result<Wft, ParseError> {
    let tokens = lexer::tokenize(src)?;
    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
    };
    let wft = parser.wft()?;
    parser.expect(&TokenKind::Eof, "end of input")?;
    Ok(wft)
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> &Token {
        // The token stream always ends with Eof, and `bump` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<Span, ParseError> {
        if self.at(kind) {
            Ok(self.bump().span)
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            ParseError::UnexpectedEnd {
                expected: expected.to_string(),
                src: self.src.to_string(),
                span: token.span.into(),
            }
        } else {
            ParseError::UnexpectedToken {
                found: token.kind.to_string(),
                expected: expected.to_string(),
                src: self.src.to_string(),
                span: token.span.into(),
            }
        }
    }

    /// A formula, followed by any number of applications of it:
    /// `wft1(a)`, `Isa(a, b)(c)(d)`.
    fn wft(&mut self) -> Result<Wft, ParseError> {
        let mut wft = self.primary()?;
        while self.at(&TokenKind::LParen) && applicable(&wft) {
            let (args, end) = self.args()?;
            let span = wft.span.to(end);
            wft = Wft {
                kind: WftKind::Application {
                    head: Box::new(wft),
                    args,
                },
                span,
            };
        }
        Ok(wft)
    }

    fn primary(&mut self) -> Result<Wft, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Ident(text) => {
                self.bump();
                if self.at(&TokenKind::LParen) {
                    self.apply(Name {
                        text,
                        span: token.span,
                    })
                } else {
                    Ok(Wft {
                        kind: WftKind::Term(text),
                        span: token.span,
                    })
                }
            }
            TokenKind::Str(text) => {
                self.bump();
                if self.at(&TokenKind::LParen) {
                    self.apply(Name {
                        text,
                        span: token.span,
                    })
                } else {
                    Ok(Wft {
                        kind: WftKind::Quoted(text),
                        span: token.span,
                    })
                }
            }
            TokenKind::Int(text) => {
                self.bump();
                Ok(Wft {
                    kind: WftKind::Term(text),
                    span: token.span,
                })
            }
            TokenKind::NodeRef(text) => {
                self.bump();
                Ok(Wft {
                    kind: WftKind::NodeRef(text),
                    span: token.span,
                })
            }
            TokenKind::QueryVar(text) => {
                self.bump();
                if self.eat(&TokenKind::LParen) {
                    let args = self.wft_list()?;
                    let end = self.expect(&TokenKind::RParen, "`,` or `)`")?;
                    Ok(Wft {
                        kind: WftKind::QueryApply {
                            var: Name {
                                text,
                                span: token.span,
                            },
                            args,
                        },
                        span: token.span.to(end),
                    })
                } else {
                    Ok(Wft {
                        kind: WftKind::QueryVar(text),
                        span: token.span,
                    })
                }
            }
            TokenKind::Keyword(keyword) => {
                self.bump();
                self.keyword(keyword, token.span)
            }
            _ => Err(self.unexpected("a formula")),
        }
    }

    fn keyword(&mut self, keyword: Keyword, start: Span) -> Result<Wft, ParseError> {
        let connective = match keyword {
            Keyword::And => Some(Connective::And),
            Keyword::Or => Some(Connective::Or),
            Keyword::Not => Some(Connective::Not),
            Keyword::Nor => Some(Connective::Nor),
            Keyword::Thnot => Some(Connective::Thnot),
            Keyword::Thnor => Some(Connective::Thnor),
            Keyword::Nand => Some(Connective::Nand),
            Keyword::Xor => Some(Connective::Xor),
            Keyword::DoubImpl => Some(Connective::DoubImpl),
            _ => None,
        };
        if let Some(op) = connective {
            let (args, end) = self.paren_wfts()?;
            return Ok(Wft {
                kind: WftKind::Connective { op, args },
                span: start.to(end),
            });
        }

        match keyword {
            Keyword::AndOr | Keyword::Thresh => {
                let op = if keyword == Keyword::AndOr {
                    Bounded::AndOr
                } else {
                    Bounded::Thresh
                };
                let open = self.expect(&TokenKind::LBrace, "`{`")?;
                let min = self.integer()?;
                let max = if self.eat(&TokenKind::Comma) {
                    Some(self.integer()?)
                } else if op == Bounded::AndOr {
                    return Err(self.unexpected("`,` and a maximum"));
                } else {
                    None
                };
                let close = self.expect(&TokenKind::RBrace, "`}`")?;
                let (args, end) = self.paren_wfts()?;
                Ok(Wft {
                    kind: WftKind::Bounded {
                        op,
                        min,
                        max,
                        params: open.to(close),
                        args,
                    },
                    span: start.to(end),
                })
            }
            Keyword::Impl | Keyword::OrImpl | Keyword::AndImpl => {
                let op = match keyword {
                    Keyword::Impl => Rule::Impl,
                    Keyword::OrImpl => Rule::OrImpl,
                    _ => Rule::AndImpl,
                };
                self.expect(&TokenKind::LParen, "`(`")?;
                let ant = self.arg()?;
                self.expect(&TokenKind::Comma, "`,`")?;
                let cq = self.arg()?;
                let end = self.expect(&TokenKind::RParen, "`)`")?;
                Ok(Wft {
                    kind: WftKind::Rule { op, ant, cq },
                    span: start.to(end),
                })
            }
            Keyword::Every => {
                let (var, restrictions, end) = if self.eat(&TokenKind::LBrace) {
                    let var = self.name()?;
                    self.expect(&TokenKind::RBrace, "`}`")?;
                    let (restrictions, end) = self.paren_wfts()?;
                    (var, restrictions, end)
                } else {
                    self.expect(&TokenKind::LParen, "`(` or `{`")?;
                    let var = self.name()?;
                    let restrictions = self.trailing_wfts()?;
                    let end = self.expect(&TokenKind::RParen, "`,` or `)`")?;
                    (var, restrictions, end)
                };
                Ok(Wft {
                    kind: WftKind::Every { var, restrictions },
                    span: start.to(end),
                })
            }
            Keyword::Some => {
                let (var, depends_on, restrictions, end) = if self.eat(&TokenKind::LBrace) {
                    let var = self.name()?;
                    let depends_on = self.dependencies()?;
                    self.expect(&TokenKind::RBrace, "`}`")?;
                    let (restrictions, end) = self.paren_wfts()?;
                    (var, depends_on, restrictions, end)
                } else {
                    self.expect(&TokenKind::LParen, "`(` or `{`")?;
                    let var = self.name()?;
                    let depends_on = self.dependencies()?;
                    let restrictions = self.trailing_wfts()?;
                    let end = self.expect(&TokenKind::RParen, "`,` or `)`")?;
                    (var, depends_on, restrictions, end)
                };
                Ok(Wft {
                    kind: WftKind::Some {
                        var,
                        depends_on,
                        restrictions,
                    },
                    span: start.to(end),
                })
            }
            Keyword::Close => {
                self.expect(&TokenKind::LParen, "`(`")?;
                let names = if self.eat(&TokenKind::LParen) {
                    let names = self.name_list()?;
                    self.expect(&TokenKind::RParen, "`,` or `)`")?;
                    names
                } else {
                    vec![self.name()?]
                };
                self.expect(&TokenKind::Comma, "`,`")?;
                let body = self.wft()?;
                let end = self.expect(&TokenKind::RParen, "`)`")?;
                Ok(Wft {
                    kind: WftKind::Close {
                        names,
                        body: Box::new(body),
                    },
                    span: start.to(end),
                })
            }
            // `setof` and `none` are only arguments, never formulas.
            _ => Err(ParseError::UnexpectedToken {
                found: TokenKind::Keyword(keyword).to_string(),
                expected: "a formula".to_string(),
                src: self.src.to_string(),
                span: start.into(),
            }),
        }
    }

    /// `f(arg, ...)` after the function name.
    fn apply(&mut self, caseframe: Name) -> Result<Wft, ParseError> {
        let (args, end) = self.args()?;
        let span = caseframe.span.to(end);
        Ok(Wft {
            kind: WftKind::Apply { caseframe, args },
            span,
        })
    }

    /// `( arg, ... )`, returning the closing span.
    fn args(&mut self) -> Result<(Vec<Arg>, Span), ParseError> {
        self.expect(&TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                args.push(self.arg()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let end = self.expect(&TokenKind::RParen, "`,` or `)`")?;
        Ok((args, end))
    }

    fn arg(&mut self) -> Result<Arg, ParseError> {
        match self.peek().kind {
            TokenKind::Keyword(Keyword::SetOf) => {
                self.bump();
                let (wfts, _) = self.paren_wfts()?;
                Ok(Arg::SetOf(wfts))
            }
            TokenKind::Keyword(Keyword::None) => {
                self.bump();
                Ok(Arg::None)
            }
            _ => Ok(Arg::Wft(Box::new(self.wft()?))),
        }
    }

    /// `( wft, ... )`, returning the closing span.
    fn paren_wfts(&mut self) -> Result<(Vec<Wft>, Span), ParseError> {
        self.expect(&TokenKind::LParen, "`(`")?;
        let wfts = self.wft_list()?;
        let end = self.expect(&TokenKind::RParen, "`,` or `)`")?;
        Ok((wfts, end))
    }

    /// Zero or more comma-separated formulas, stopping before `)`.
    fn wft_list(&mut self) -> Result<Vec<Wft>, ParseError> {
        let mut wfts = Vec::new();
        if self.at(&TokenKind::RParen) {
            return Ok(wfts);
        }
        loop {
            wfts.push(self.wft()?);
            if !self.eat(&TokenKind::Comma) {
                return Ok(wfts);
            }
        }
    }

    /// `, wft, ...` after a variable in the paren quantifier forms.
    fn trailing_wfts(&mut self) -> Result<Vec<Wft>, ParseError> {
        let mut wfts = Vec::new();
        while self.eat(&TokenKind::Comma) {
            wfts.push(self.wft()?);
        }
        Ok(wfts)
    }

    /// Optional `(dep, ...)` after an indefinite's name.
    fn dependencies(&mut self) -> Result<Vec<Name>, ParseError> {
        if !self.eat(&TokenKind::LParen) {
            return Ok(Vec::new());
        }
        let names = if self.at(&TokenKind::RParen) {
            Vec::new()
        } else {
            self.name_list()?
        };
        self.expect(&TokenKind::RParen, "`,` or `)`")?;
        Ok(names)
    }

    fn name_list(&mut self) -> Result<Vec<Name>, ParseError> {
        let mut names = vec![self.name()?];
        while self.eat(&TokenKind::Comma) {
            names.push(self.name()?);
        }
        Ok(names)
    }

    fn name(&mut self) -> Result<Name, ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(text) => {
                let name = Name {
                    text: text.clone(),
                    span: self.peek().span,
                };
                self.bump();
                Ok(name)
            }
            _ => Err(self.unexpected("a variable name")),
        }
    }

    fn integer(&mut self) -> Result<usize, ParseError> {
        let token = self.peek().clone();
        let TokenKind::Int(text) = token.kind else {
            return Err(self.unexpected("an integer"));
        };
        let value = text.parse::<usize>().map_err(|_| ParseError::IntegerOverflow {
            text,
            src: self.src.to_string(),
            span: token.span.into(),
        })?;
        self.bump();
        Ok(value)
    }
}

/// Formulas that may stand in function position: terms, node references,
/// applications and `Thresh{n}`.
fn applicable(wft: &Wft) -> bool {
    matches!(
        wft.kind,
        WftKind::Term(_)
            | WftKind::Quoted(_)
            | WftKind::NodeRef(_)
            | WftKind::Apply { .. }
            | WftKind::Application { .. }
            | WftKind::QueryApply { .. }
            | WftKind::Bounded {
                op: Bounded::Thresh,
                max: None,
                ..
            }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(src: &str) -> WftKind {
        parse(src).unwrap().kind
    }

    fn term(wft: &Wft) -> &str {
        match &wft.kind {
            WftKind::Term(t) => t,
            other => panic!("expected term, got {other:?}"),
        }
    }

    #[test]
    fn atoms() {
        assert_eq!(kind("Fido"), WftKind::Term("Fido".into()));
        assert_eq!(kind("42"), WftKind::Term("42".into()));
        assert_eq!(kind("\"and\""), WftKind::Quoted("and".into()));
        assert_eq!(kind("wft3"), WftKind::NodeRef("wft3".into()));
        assert_eq!(kind("?x"), WftKind::QueryVar("?x".into()));
    }

    #[test]
    fn connectives_take_any_number_of_arguments() {
        let WftKind::Connective { op, args } = kind("And(a, b, c)") else {
            panic!("expected connective");
        };
        assert_eq!(op, Connective::And);
        assert_eq!(args.len(), 3);
        let WftKind::Connective { args, .. } = kind("nor()") else {
            panic!("expected connective");
        };
        assert!(args.is_empty());
    }

    #[test]
    fn bounded_parameters() {
        let WftKind::Bounded { op, min, max, args, .. } = kind("AndOr{1, 2}(a, b)") else {
            panic!("expected bounded");
        };
        assert_eq!((op, min, max, args.len()), (Bounded::AndOr, 1, Some(2), 2));
        let WftKind::Bounded { max, .. } = kind("Thresh{1}(a, b)") else {
            panic!("expected bounded");
        };
        assert_eq!(max, None);
        assert!(parse("AndOr{1}(a, b)").is_err());
    }

    #[test]
    fn rules_take_filler_sets() {
        let WftKind::Rule { op, ant, cq } = kind("Impl(setof(a, b), none)") else {
            panic!("expected rule");
        };
        assert_eq!(op, Rule::Impl);
        assert!(matches!(ant, Arg::SetOf(ref v) if v.len() == 2));
        assert_eq!(cq, Arg::None);
        let WftKind::Rule { op, ant, .. } = kind("if(a, b)") else {
            panic!("expected rule");
        };
        assert_eq!(op, Rule::Impl);
        assert!(matches!(ant, Arg::Wft(ref w) if w.kind == WftKind::Term("a".into())));
    }

    #[test]
    fn quantifier_forms_are_equivalent() {
        let brace = kind("Every{x}(Isa(x, Dog))");
        let paren = kind("every(x, Isa(x, Dog))");
        let (WftKind::Every { var: a, restrictions: ra }, WftKind::Every { var: b, restrictions: rb }) =
            (brace, paren)
        else {
            panic!("expected every");
        };
        assert_eq!(a.text, b.text);
        assert_eq!(ra.len(), rb.len());

        let WftKind::Some { var, depends_on, restrictions } =
            kind("Some{y(x)}(Isa(y, Dog))")
        else {
            panic!("expected some");
        };
        assert_eq!(var.text, "y");
        assert_eq!(depends_on.len(), 1);
        assert_eq!(restrictions.len(), 1);
        let WftKind::Some { depends_on, .. } = kind("some(y(x, z), Isa(y, Dog))") else {
            panic!("expected some");
        };
        assert_eq!(depends_on.iter().map(|n| n.text.as_str()).collect::<Vec<_>>(), ["x", "z"]);
    }

    #[test]
    fn close_and_query_application() {
        let WftKind::Close { names, .. } = kind("Close((x, y), Likes(x, y))") else {
            panic!("expected close");
        };
        assert_eq!(names.len(), 2);
        let WftKind::QueryApply { var, args } = kind("?r(Fido, Rex)") else {
            panic!("expected query application");
        };
        assert_eq!(var.text, "?r");
        assert_eq!(term(&args[1]), "Rex");
    }

    #[test]
    fn keywords_win_over_user_names() {
        assert!(matches!(kind("and(a, b)"), WftKind::Connective { op: Connective::And, .. }));
        let WftKind::Apply { caseframe, args } = kind("\"and\"(a, b)") else {
            panic!("expected application");
        };
        assert_eq!(caseframe.text, "and");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn errors_point_at_the_problem() {
        let err = parse("And(").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEnd { .. }));
        assert_eq!(err.offset(), 4);

        let err = parse("Isa(Fido Dog)").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
        assert_eq!(err.offset(), 9);

        assert!(parse("").is_err());
        assert!(parse("Fido Dog").is_err());
        assert!(parse("setof(a)").is_err());
    }

    #[test]
    fn formulas_in_function_position() {
        let WftKind::Application { head, args } = kind("Isa(Fido, Dog)(Rex)") else {
            panic!("expected application");
        };
        assert!(matches!(head.kind, WftKind::Apply { .. }));
        assert_eq!(args.len(), 1);

        let WftKind::Application { head, .. } = kind("wft1(Rex, setof(a, b))") else {
            panic!("expected application");
        };
        assert_eq!(head.kind, WftKind::NodeRef("wft1".into()));

        let WftKind::Application { head, .. } = kind("Thresh{1}(a, b)(c)") else {
            panic!("expected application");
        };
        assert!(matches!(head.kind, WftKind::Bounded { op: Bounded::Thresh, .. }));

        let WftKind::Application { head, .. } = kind("f(a)(b)(c)") else {
            panic!("expected application");
        };
        assert!(matches!(head.kind, WftKind::Application { .. }));

        // Connectives and two-parameter bounds are not functions.
        assert!(parse("And(a, b)(c)").is_err());
        assert!(parse("Thresh{1, 2}(a, b, c)(d)").is_err());
    }

    #[test]
    fn integers_keep_their_spelling() {
        assert_eq!(kind("007"), WftKind::Term("007".into()));
        assert_eq!(
            kind("123456789012345678901234567890"),
            WftKind::Term("123456789012345678901234567890".into())
        );
        let err = parse("Thresh{123456789012345678901234567890}(a, b)").unwrap_err();
        assert!(matches!(err, ParseError::IntegerOverflow { .. }));
        assert_eq!(err.offset(), 7);
    }

    #[test]
    fn spans_cover_the_formula() {
        let wft = parse("Not(Fido)").unwrap();
        assert_eq!(wft.span, Span::new(0, 9));
    }
}
