//! Lowering: [`Wft`] syntax trees → canonical nodes.
//!
//! Each operator maps onto one built-in caseframe. Names bound by `every` and
//! `some` stay visible for the rest of the formula. Negation is pushed into
//! the node store, which absorbs it where the adjustment rules allow and
//! otherwise leaves it to be wrapped in a one-filler `nor`.

use std::collections::{BTreeSet, HashMap};

use crate::error::{NetResult, SchemaError};
use crate::node::{Adjusted, NodeId, NodeStore, Polarity, Quantifier};
use crate::schema::{Schema, ROOT_TYPE};

use super::ast::{Arg, Bounded, Name, Wft, WftKind};
use super::error::ParseError;

/// Lower a parsed formula into the store, returning its canonical node.
///
/// Nodes created before a failure are left in place; callers that need
/// atomicity wrap this in a store [`Mark`](crate::node::Mark).
pub(crate) fn lower(
    schema: &Schema<'_>,
    store: &mut NodeStore,
    src: &str,
    wft: &Wft,
) -> NetResult<NodeId> {
    let mut lowerer = Lowerer {
        schema,
        store,
        src,
        scope: HashMap::new(),
    };
    Ok(lowerer.lower(wft, Polarity::Positive)?.node)
}

struct Lowerer<'s, 'a> {
    schema: &'s Schema<'a>,
    store: &'s mut NodeStore,
    src: &'s str,
    /// Variable names bound so far in this formula.
    scope: HashMap<String, NodeId>,
}

impl Lowerer<'_, '_> {
    fn lower(&mut self, wft: &Wft, polarity: Polarity) -> NetResult<Adjusted> {
        match &wft.kind {
            WftKind::Term(name) => {
                if let Some(&bound) = self.scope.get(name) {
                    return Ok(Adjusted::plain(bound));
                }
                Ok(Adjusted::plain(self.atom(name)?))
            }
            WftKind::Quoted(name) => Ok(Adjusted::plain(self.atom(name)?)),
            WftKind::NodeRef(name) => {
                let node = self
                    .store
                    .find(name)
                    .ok_or_else(|| SchemaError::UnknownNode { name: name.clone() })?;
                match polarity {
                    Polarity::Positive => Ok(Adjusted::plain(node)),
                    Polarity::Negated => self.store.negated(self.schema, node),
                }
            }
            WftKind::QueryVar(name) => Ok(Adjusted::plain(self.store.query_variable(name)?)),

            WftKind::Connective { op, args } if op.negates() && args.len() == 1 => {
                let inner = self.lower(&args[0], Polarity::Negated)?;
                if inner.negation_absorbed {
                    return match polarity {
                        Polarity::Positive => Ok(Adjusted::plain(inner.node)),
                        Polarity::Negated => self.store.negated(self.schema, inner.node),
                    };
                }
                self.store.get_or_create_molecular(
                    self.schema,
                    op.caseframe(),
                    vec![BTreeSet::from([inner.node])],
                    polarity,
                )
            }
            WftKind::Connective { op, args } => {
                let fillers = self.filler_set(args)?;
                self.store
                    .get_or_create_molecular(self.schema, op.caseframe(), vec![fillers], polarity)
            }
            WftKind::Bounded {
                op,
                min,
                max,
                params,
                args,
            } => {
                let fillers = self.filler_set(args)?;
                let count = fillers.len();
                let max = match max {
                    Some(max) => *max,
                    None => count.saturating_sub(1),
                };
                if *min > max || max > count {
                    let keyword = match op {
                        Bounded::AndOr => "AndOr",
                        Bounded::Thresh => "Thresh",
                    };
                    return Err(ParseError::InvalidParameters {
                        keyword: keyword.to_string(),
                        message: format!(
                            "bounds ({min}, {max}) do not fit {count} distinct argument(s)"
                        ),
                        src: self.src.to_string(),
                        span: (*params).into(),
                    }
                    .into());
                }
                let node =
                    self.store
                        .get_or_create_minmax(self.schema, op.caseframe(), vec![fillers], *min, max)?;
                Ok(Adjusted::plain(node))
            }
            WftKind::Rule { op, ant, cq } => {
                let fillers = vec![self.arg(ant)?, self.arg(cq)?];
                self.store
                    .get_or_create_molecular(self.schema, op.caseframe(), fillers, polarity)
            }
            WftKind::Every { var, restrictions } => {
                let node = self.quantified(Quantifier::Arbitrary, var, &[], restrictions)?;
                Ok(Adjusted::plain(node))
            }
            WftKind::Some {
                var,
                depends_on,
                restrictions,
            } => {
                let node = self.quantified(Quantifier::Indefinite, var, depends_on, restrictions)?;
                Ok(Adjusted::plain(node))
            }
            WftKind::Close { names, body } => {
                let body = self.lower(body, Polarity::Positive)?.node;
                let mut closed = BTreeSet::new();
                for name in names {
                    let node = match self.scope.get(&name.text) {
                        Some(&bound) => bound,
                        None => self.atom(&name.text)?,
                    };
                    closed.insert(node);
                }
                self.store.get_or_create_molecular(
                    self.schema,
                    "close",
                    vec![BTreeSet::from([body]), closed],
                    polarity,
                )
            }
            WftKind::Apply { caseframe, args } => {
                let frame = self
                    .schema
                    .caseframes
                    .lookup(&caseframe.text)
                    .ok_or_else(|| SchemaError::UnknownCaseframe {
                        name: caseframe.text.clone(),
                    })?;
                if frame.slots.len() != args.len() {
                    return Err(SchemaError::ArityMismatch {
                        caseframe: caseframe.text.clone(),
                        expected: frame.slots.len(),
                        actual: args.len(),
                    }
                    .into());
                }
                let mut fillers = Vec::with_capacity(args.len());
                for arg in args {
                    fillers.push(self.arg(arg)?);
                }
                self.store
                    .get_or_create_molecular(self.schema, &caseframe.text, fillers, polarity)
            }
            WftKind::Application { head, args } => {
                let operator = self.lower(head, Polarity::Positive)?.node;
                let mut operands = BTreeSet::new();
                for arg in args {
                    operands.extend(self.arg(arg)?);
                }
                self.store.get_or_create_molecular(
                    self.schema,
                    "apply",
                    vec![BTreeSet::from([operator]), operands],
                    polarity,
                )
            }
            WftKind::QueryApply { var, args } => {
                let operator = self.store.query_variable(&var.text)?;
                let operands = self.filler_set(args)?;
                self.store.get_or_create_molecular(
                    self.schema,
                    "apply",
                    vec![BTreeSet::from([operator]), operands],
                    polarity,
                )
            }
        }
    }

    fn atom(&mut self, name: &str) -> NetResult<NodeId> {
        Ok(self.store.get_or_create_atomic(self.schema, name, ROOT_TYPE)?)
    }

    fn filler_set(&mut self, wfts: &[Wft]) -> NetResult<BTreeSet<NodeId>> {
        let mut set = BTreeSet::new();
        for wft in wfts {
            set.insert(self.lower(wft, Polarity::Positive)?.node);
        }
        Ok(set)
    }

    fn arg(&mut self, arg: &Arg) -> NetResult<BTreeSet<NodeId>> {
        match arg {
            Arg::Wft(wft) => Ok(BTreeSet::from([self.lower(wft, Polarity::Positive)?.node])),
            Arg::SetOf(wfts) => self.filler_set(wfts),
            Arg::None => Ok(BTreeSet::new()),
        }
    }

    /// Bind a variable, lower its restrictions, and intern it.
    fn quantified(
        &mut self,
        quantifier: Quantifier,
        var: &Name,
        depends_on: &[Name],
        restrictions: &[Wft],
    ) -> NetResult<NodeId> {
        let mut dependencies = BTreeSet::new();
        for dep in depends_on {
            let bound = self
                .scope
                .get(&dep.text)
                .copied()
                .filter(|id| self.store.get(*id).is_some_and(|n| n.variable().is_some()));
            let Some(bound) = bound else {
                return Err(ParseError::UnboundVariable {
                    name: dep.text.clone(),
                    src: self.src.to_string(),
                    span: dep.span.into(),
                }
                .into());
            };
            dependencies.insert(bound);
        }

        let (mark, provisional) = self.store.begin_variable(quantifier);
        self.scope.insert(var.text.clone(), provisional);
        let mut restriction_nodes = BTreeSet::new();
        for wft in restrictions {
            restriction_nodes.insert(self.lower(wft, Polarity::Positive)?.node);
        }

        let node = self
            .store
            .finish_variable(mark, provisional, restriction_nodes, dependencies);
        if node != provisional {
            // The provisional variable and everything built for it were rolled back.
            let store = &*self.store;
            self.scope.retain(|_, id| store.contains(*id));
            self.scope.insert(var.text.clone(), node);
        }
        Ok(node)
    }
}
