//! Adjustment-rule algebra for logical connectives.
//!
//! A connective caseframe has a single slot of propositions. Its slot's
//! `pos_adj` rule normalizes every construction request (phase 1); its
//! `neg_adj` rule decides whether a request built in negated position can
//! absorb the negation (phase 2). When it cannot, the caller wraps the result
//! in the one-filler `nor`.
//!
//! | rule        | phase 1 (positive)                 | phase 2 (negated)                  |
//! |-------------|------------------------------------|------------------------------------|
//! | none        | unchanged                          | not absorbed                       |
//! | reduce      | one filler collapses to itself     | one filler: negation cancels       |
//! | expand      | `c{c{F}}` becomes `c{F}`           | not absorbed                       |
//! | inf_expand  | nested `c` fillers spliced         | not absorbed                       |
//! | inf_reduce  | splice, then collapse              | rewrite into the dual caseframe    |

use std::collections::BTreeSet;

use crate::schema::{AdjRule, CaseframeId, Schema};

use super::{NodeId, NodeStore};

/// Whether a term is being constructed as the sole argument of a negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Polarity {
    #[default]
    Positive,
    Negated,
}

/// A molecular construction request after caseframe resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Request {
    pub caseframe: CaseframeId,
    pub fillers: Vec<BTreeSet<NodeId>>,
    /// Explicit `andor`/`thresh` bounds. Derived bounds are computed at intern time.
    pub bounds: Option<(usize, usize)>,
}

/// What a normalized request resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Intern this request.
    Build { request: Request, absorbed: bool },
    /// The request denotes an existing node.
    Existing { node: NodeId, absorbed: bool },
}

enum Positive {
    Request(Request),
    Collapsed(NodeId),
}

/// Bounds a built-in connective derives from its filler count.
///
/// `None` for caseframes whose bounds are explicit (`andor`, `thresh`) or
/// that carry no bounds at all.
pub fn derived_bounds(caseframe: &str, count: usize) -> Option<(usize, usize)> {
    match caseframe {
        "and" => Some((count, count)),
        "or" => Some((1, count)),
        "nor" => Some((0, 0)),
        "nand" => Some((0, count.saturating_sub(1))),
        "xor" => Some((1, 1)),
        "iff" => Some((1, count.saturating_sub(1))),
        _ => None,
    }
}

/// Normalize a request under the given polarity.
pub(crate) fn normalize(
    schema: &Schema<'_>,
    store: &NodeStore,
    request: Request,
    polarity: Polarity,
) -> Outcome {
    match (positive(schema, store, request), polarity) {
        (Positive::Request(request), Polarity::Positive) => Outcome::Build {
            request,
            absorbed: false,
        },
        (Positive::Collapsed(node), Polarity::Positive) => Outcome::Existing {
            node,
            absorbed: false,
        },
        (Positive::Request(request), Polarity::Negated) => negate_request(schema, store, request),
        (Positive::Collapsed(node), Polarity::Negated) => negate_existing(schema, store, node),
    }
}

/// Apply phase 2 to an already-built node.
pub(crate) fn negate_existing(schema: &Schema<'_>, store: &NodeStore, node: NodeId) -> Outcome {
    let unchanged = Outcome::Existing {
        node,
        absorbed: false,
    };
    let Some(existing) = store.get(node) else {
        return unchanged;
    };
    let Some(frame) = existing.frame() else {
        return unchanged;
    };
    let name = &schema.caseframes.get(frame.caseframe).name;
    let explicit = existing
        .bounds()
        .filter(|_| derived_bounds(name, frame.fillers.first().map_or(0, BTreeSet::len)).is_none());
    let request = Request {
        caseframe: frame.caseframe,
        fillers: frame.fillers.clone(),
        bounds: explicit,
    };
    match negate_request(schema, store, request) {
        Outcome::Build {
            absorbed: false, ..
        } => unchanged,
        other => other,
    }
}

fn positive(schema: &Schema<'_>, store: &NodeStore, mut request: Request) -> Positive {
    if request.bounds.is_some() {
        return Positive::Request(request);
    }
    let Some(slot) = schema.connective_slot(request.caseframe) else {
        return Positive::Request(request);
    };

    match slot.pos_adj {
        AdjRule::None | AdjRule::Reduce => {}
        AdjRule::Expand => {
            if let Some(&only) = single(&request.fillers[0]) {
                if let Some(inner) = nested(store, only, request.caseframe) {
                    request.fillers[0] = inner;
                }
            }
        }
        AdjRule::InfExpand | AdjRule::InfReduce => {
            let mut spliced = BTreeSet::new();
            for &filler in &request.fillers[0] {
                match nested(store, filler, request.caseframe) {
                    Some(inner) => spliced.extend(inner),
                    None => {
                        spliced.insert(filler);
                    }
                }
            }
            request.fillers[0] = spliced;
        }
    }

    if matches!(slot.pos_adj, AdjRule::Reduce | AdjRule::InfReduce) {
        if let Some(&only) = single(&request.fillers[0]) {
            return Positive::Collapsed(only);
        }
    }
    Positive::Request(request)
}

fn negate_request(schema: &Schema<'_>, store: &NodeStore, request: Request) -> Outcome {
    let not_absorbed = |request| Outcome::Build {
        request,
        absorbed: false,
    };
    if request.bounds.is_some() {
        return not_absorbed(request);
    }
    let Some(slot) = schema.connective_slot(request.caseframe) else {
        return not_absorbed(request);
    };

    match slot.neg_adj {
        AdjRule::Reduce => match single(&request.fillers[0]) {
            Some(&only) => Outcome::Existing {
                node: only,
                absorbed: true,
            },
            None => not_absorbed(request),
        },
        AdjRule::InfReduce => match schema.caseframes.get(request.caseframe).dual {
            Some(dual) => {
                let swapped = Request {
                    caseframe: dual,
                    fillers: request.fillers,
                    bounds: None,
                };
                match positive(schema, store, swapped) {
                    Positive::Request(request) => Outcome::Build {
                        request,
                        absorbed: true,
                    },
                    Positive::Collapsed(node) => Outcome::Existing {
                        node,
                        absorbed: true,
                    },
                }
            }
            // Without a dual only the single-filler case can cancel.
            None => match single(&request.fillers[0]) {
                Some(&only) => Outcome::Existing {
                    node: only,
                    absorbed: true,
                },
                None => not_absorbed(request),
            },
        },
        AdjRule::None | AdjRule::Expand | AdjRule::InfExpand => not_absorbed(request),
    }
}

fn single(set: &BTreeSet<NodeId>) -> Option<&NodeId> {
    if set.len() == 1 { set.first() } else { None }
}

/// Fillers of `node` if it is an instance of `caseframe`.
fn nested(store: &NodeStore, node: NodeId, caseframe: CaseframeId) -> Option<BTreeSet<NodeId>> {
    let frame = store.get(node)?.frame()?;
    (frame.caseframe == caseframe)
        .then(|| frame.fillers.first().cloned())
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_follow_filler_count() {
        assert_eq!(derived_bounds("and", 3), Some((3, 3)));
        assert_eq!(derived_bounds("or", 3), Some((1, 3)));
        assert_eq!(derived_bounds("nor", 3), Some((0, 0)));
        assert_eq!(derived_bounds("nand", 3), Some((0, 2)));
        assert_eq!(derived_bounds("xor", 4), Some((1, 1)));
        assert_eq!(derived_bounds("iff", 2), Some((1, 1)));
        assert_eq!(derived_bounds("andor", 2), None);
        assert_eq!(derived_bounds("Isa", 2), None);
    }

    #[test]
    fn polarity_defaults_positive() {
        assert_eq!(Polarity::default(), Polarity::Positive);
    }
}
