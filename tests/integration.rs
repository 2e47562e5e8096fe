//! End-to-end integration tests for the semnet knowledge base.
//!
//! These tests drive the network through its public API: schema definition,
//! formula assertion, context management and export, checking that nodes stay
//! canonical and that failed calls leave no trace.

use std::collections::BTreeSet;
use std::path::Path;

use semnet::error::{ContextError, NetError, SchemaError};
use semnet::export::NetworkExport;
use semnet::node::{NodeId, Quantifier};
use semnet::schema::SlotSpec;
use semnet::seeds::{SchemaPack, SeedRegistry, SeedSource};
use semnet::{Network, NetworkConfig};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn test_network() -> Network {
    init_tracing();
    Network::new(NetworkConfig::default()).unwrap()
}

/// A network with a `Has(haver, thing)` caseframe.
fn network_with_has() -> Network {
    let mut net = test_network();
    net.define_slot(SlotSpec::new("haver", "Entity")).unwrap();
    net.define_slot(SlotSpec::new("thing", "Entity")).unwrap();
    net.define_caseframe("Has", "Proposition", &["haver", "thing"], "[haver] has [thing]")
        .unwrap();
    net
}

#[test]
fn canonical_nodes_ignore_filler_order() {
    let mut net = test_network();
    let a = net.assert_wft("Isa(Fido, Dog)", true).unwrap();
    let b = net.assert_wft("Isa(Rex, Dog)", true).unwrap();

    let ab = net.assert_wft("And(Isa(Fido, Dog), Isa(Rex, Dog))", true).unwrap();
    let ba = net.assert_wft("And(Isa(Rex, Dog), Isa(Fido, Dog))", true).unwrap();
    assert_eq!(ab, ba);

    let fillers = net.node(ab).unwrap().frame().unwrap().fillers.clone();
    assert_eq!(fillers, vec![BTreeSet::from([a, b])]);

    // Repeated fillers collapse into the same set.
    let twice = net
        .assert_wft("Or(Isa(Fido, Dog), Isa(Rex, Dog), Isa(Fido, Dog))", false)
        .unwrap();
    let once = net.assert_wft("Or(Isa(Fido, Dog), Isa(Rex, Dog))", false).unwrap();
    assert_eq!(twice, once);
}

#[test]
fn subsumption_follows_definitions() {
    let mut net = test_network();
    net.define_type("Animal", &["Thing"]).unwrap();
    net.define_type("Dog", &["Animal"]).unwrap();

    assert!(net.is_subtype("Dog", "Dog"));
    assert!(net.is_subtype("Dog", "Animal"));
    assert!(net.is_subtype("Dog", "Thing"));
    assert!(net.is_subtype("Dog", "Entity"));
    assert!(!net.is_subtype("Animal", "Dog"));
    assert!(!net.is_subtype("Dog", "Proposition"));

    let err = net.define_type("Cat", &["Mammal"]).unwrap_err();
    assert!(matches!(err, NetError::Schema(SchemaError::UnknownType { .. })));
    assert!(!net.types().contains("Cat"));
}

#[test]
fn cardinality_and_type_violations_are_rejected() {
    let mut net = test_network();
    let before = net.node_count();

    let err = net.assert_wft("Equiv(Clark)", true).unwrap_err();
    match err {
        NetError::Cardinality(e) => {
            assert_eq!(e.caseframe, "Equiv");
            assert_eq!(e.slot, "equiv");
            assert_eq!(e.actual, 1);
        }
        other => panic!("expected a cardinality error, got {other:?}"),
    }

    let err = net.assert_wft("Isa(Fido, Isa(Rex, Dog))", true).unwrap_err();
    match err {
        NetError::TypeConstraint(e) => {
            assert_eq!(e.slot, "class");
            assert_eq!(e.expected, "Category");
        }
        other => panic!("expected a type error, got {other:?}"),
    }

    assert_eq!(net.node_count(), before);
    assert!(net.current_context().hyps().is_empty());
}

#[test]
fn overfilled_slots_are_rejected() {
    let mut net = test_network();
    let before = net.node_count();

    let err = net
        .assert_wft("rule(Fetch, Isa(Fido, Dog), setof(Run, Bark), none)", true)
        .unwrap_err();
    match err {
        NetError::Cardinality(e) => {
            assert_eq!(e.caseframe, "rule");
            assert_eq!(e.slot, "action");
            assert_eq!(e.bounds.max, Some(1));
            assert_eq!(e.actual, 2);
        }
        other => panic!("expected a cardinality error, got {other:?}"),
    }
    assert_eq!(net.node_count(), before);
    assert!(net.current_context().hyps().is_empty());

    let err = net
        .assert_wft("rule(setof(Fetch, Chase), Isa(Fido, Dog), Run, none)", true)
        .unwrap_err();
    assert!(matches!(err, NetError::Cardinality(ref e) if e.slot == "rulename"));
    assert_eq!(net.node_count(), before);

    let rule = net
        .assert_wft("rule(Fetch, Isa(Fido, Dog), Run, none)", true)
        .unwrap();
    assert_eq!(net.node(rule).unwrap().sem_type, "Policy");
    let run = net.find_atomic("Run").unwrap();
    assert_eq!(net.node(run).unwrap().sem_type, "Action");
}

#[test]
fn context_integrity() {
    let mut net = test_network();
    net.define_context("Stories", "fiction", None).unwrap();
    net.define_context("Fairytales", "", Some("Stories")).unwrap();

    assert!(matches!(
        net.define_context("Stories", "", None),
        Err(NetError::Context(ContextError::Duplicate { .. }))
    ));
    assert!(matches!(
        net.define_context("Myths", "", Some("Legends")),
        Err(NetError::Context(ContextError::UnknownParent { .. }))
    ));
    assert!(matches!(
        net.set_current_context("Legends"),
        Err(NetError::Context(ContextError::Unknown { .. }))
    ));
    assert_eq!(net.current_context().name, "default");

    let wolf = net
        .assert_wft_in("Stories", "Isa(Wolf, Villain)", true)
        .unwrap();
    let dragon = net.assert_wft("Isa(Smaug, Dragon)", false).unwrap();
    net.add_derived("Fairytales", dragon).unwrap();

    let fairytales = net.context("Fairytales").unwrap();
    let asserted: BTreeSet<NodeId> = fairytales.hyps().union(fairytales.ders()).copied().collect();
    assert_eq!(fairytales.all_asserted(), asserted);
    assert!(net.is_asserted("Fairytales", dragon).unwrap());
    assert!(!net.is_asserted("Fairytales", wolf).unwrap());
    assert!(net.is_believed("Fairytales", wolf).unwrap());
    assert!(!net.is_believed("default", wolf).unwrap());

    // A hypothesis moves the node out of the derived set.
    net.add_hypothesis("Fairytales", dragon).unwrap();
    let fairytales = net.context("Fairytales").unwrap();
    assert!(fairytales.is_hypothesis(dragon));
    assert!(fairytales.ders().is_empty());
}

#[test]
fn alias_resolves_to_one_caseframe() {
    let mut net = test_network();
    let not = net.caseframe("not").unwrap().id;
    let nor = net.caseframe("nor").unwrap().id;
    assert_eq!(not, nor);

    let a = net
        .assert_wft("Not(Isa(Fido, Cat), Isa(Tom, Dog))", true)
        .unwrap();
    let b = net
        .assert_wft("Nor(Isa(Tom, Dog), Isa(Fido, Cat))", true)
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(net.current_context().hyps().len(), 1);
}

#[test]
fn quantified_assertion_is_canonical() {
    let mut net = network_with_has();

    let has = net
        .assert_wft("Has(every(x, Isa(x, Dog)), Food)", true)
        .unwrap();
    let hyps = net.current_context().hyps().len();

    let node = net.node(has).unwrap();
    assert_eq!(net.caseframes().get(node.caseframe().unwrap()).name, "Has");
    let first = &node.frame().unwrap().fillers[0];
    assert_eq!(first.len(), 1);
    let var = *first.iter().next().unwrap();

    let variable = net.node(var).unwrap().variable().unwrap();
    assert_eq!(variable.quantifier, Quantifier::Arbitrary);
    let dog = net.find_atomic("Dog").unwrap();
    let restriction = net
        .find_molecular("Isa", &[("member", &[var]), ("class", &[dog])])
        .unwrap();
    assert_eq!(variable.restrictions, BTreeSet::from([restriction]));

    let again = net
        .assert_wft("Has(every(x, Isa(x, Dog)), Food)", true)
        .unwrap();
    assert_eq!(again, has);
    assert_eq!(net.current_context().hyps().len(), hyps);

    // The same variable under another name is still the same node.
    let renamed = net
        .assert_wft("Has(every(y, Isa(y, Dog)), Food)", true)
        .unwrap();
    assert_eq!(renamed, has);
}

#[test]
fn parse_errors_change_nothing() {
    let mut net = test_network();
    net.assert_wft("Isa(Fido, Dog)", true).unwrap();
    let info = net.info();

    let err = net.assert_wft("And(", true).unwrap_err();
    assert!(matches!(err, NetError::Parse(_)));

    assert_eq!(net.info(), info);
    assert_eq!(net.find_atomic("And"), None);
}

#[test]
fn negation_normal_forms() {
    let mut net = test_network();
    let fido = net.assert_wft("Isa(Fido, Dog)", false).unwrap();
    let rex = net.assert_wft("Isa(Rex, Dog)", false).unwrap();

    let double = net.assert_wft("Not(Not(Isa(Fido, Dog)))", false).unwrap();
    assert_eq!(double, fido);

    let not_and = net
        .assert_wft("Not(And(Isa(Fido, Dog), Isa(Rex, Dog)))", false)
        .unwrap();
    let nand = net
        .assert_wft("Nand(Isa(Fido, Dog), Isa(Rex, Dog))", false)
        .unwrap();
    assert_eq!(not_and, nand);

    let not_or = net
        .assert_wft("Not(Or(Isa(Fido, Dog), Isa(Rex, Dog)))", false)
        .unwrap();
    let nor = net
        .assert_wft("Nor(Isa(Fido, Dog), Isa(Rex, Dog))", false)
        .unwrap();
    assert_eq!(not_or, nor);

    // A plain negation stays a one-filler nor.
    let not_fido = net.assert_wft("Not(Isa(Fido, Dog))", false).unwrap();
    let node = net.node(not_fido).unwrap();
    assert_eq!(net.caseframes().get(node.caseframe().unwrap()).name, "nor");
    assert_eq!(node.frame().unwrap().fillers, vec![BTreeSet::from([fido])]);

    // Nested conjunctions flatten; a single conjunct collapses.
    let flat = net
        .assert_wft("And(Isa(Fido, Dog), And(Isa(Rex, Dog), Isa(Tom, Cat)))", false)
        .unwrap();
    let wide = net
        .assert_wft("And(Isa(Fido, Dog), Isa(Rex, Dog), Isa(Tom, Cat))", false)
        .unwrap();
    assert_eq!(flat, wide);
    assert_eq!(net.assert_wft("And(Isa(Rex, Dog))", false).unwrap(), rex);
}

#[test]
fn negating_a_reference_matches_negating_the_formula() {
    let mut net = test_network();
    let fido = net.assert_wft("Isa(Fido, Dog)", false).unwrap();
    let both = net
        .assert_wft("And(Isa(Fido, Dog), Isa(Rex, Dog))", false)
        .unwrap();
    let both_name = net.node(both).unwrap().name.clone();

    let by_ref = net.assert_wft(&format!("Not({both_name})"), false).unwrap();
    let by_formula = net
        .assert_wft("Not(And(Isa(Fido, Dog), Isa(Rex, Dog)))", false)
        .unwrap();
    assert_eq!(by_ref, by_formula);
    assert_eq!(net.caseframes().get(net.node(by_ref).unwrap().caseframe().unwrap()).name, "nand");

    let not_fido = net.assert_wft("Not(Isa(Fido, Dog))", false).unwrap();
    let not_fido_name = net.node(not_fido).unwrap().name.clone();
    let count = net.node_count();
    assert_eq!(net.assert_wft(&format!("Not({not_fido_name})"), false).unwrap(), fido);
    assert_eq!(
        net.assert_wft("Not(Not(Isa(Fido, Dog)))", false).unwrap(),
        fido
    );
    assert_eq!(net.node_count(), count);
}

#[test]
fn formulas_apply_as_functions() {
    let mut net = test_network();
    let fido = net.assert_wft("Isa(Fido, Dog)", false).unwrap();
    let applied = net.assert_wft("Isa(Fido, Dog)(Rex)", true).unwrap();
    let rex = net.find_atomic("Rex").unwrap();
    let found = net
        .find_molecular("apply", &[("operator", &[fido]), ("operands", &[rex])])
        .unwrap();
    assert_eq!(applied, found);

    let name = net.node(fido).unwrap().name.clone();
    assert_eq!(net.assert_wft(&format!("{name}(Rex)"), true).unwrap(), applied);

    let thresh = net
        .assert_wft("Thresh{1}(Isa(Fido, Dog), Isa(Rex, Dog))(Tom)", true)
        .unwrap();
    let node = net.node(thresh).unwrap();
    assert_eq!(net.caseframes().get(node.caseframe().unwrap()).name, "apply");
    let operator = *node.frame().unwrap().fillers[0].iter().next().unwrap();
    assert_eq!(net.node(operator).unwrap().bounds(), Some((1, 1)));

    // Numerals are terms spelled as written.
    let seven = net.assert_wft("Isa(7, Number)", false).unwrap();
    let padded = net.assert_wft("Isa(007, Number)", false).unwrap();
    assert_ne!(seven, padded);
}

#[test]
fn failed_lowering_rolls_back() {
    let mut net = test_network();
    let before = net.node_count();

    let err = net
        .assert_wft("And(Isa(Newcomer, Dog), Missing(Newcomer))", true)
        .unwrap_err();
    assert!(matches!(
        err,
        NetError::Schema(SchemaError::UnknownCaseframe { .. })
    ));
    assert_eq!(net.node_count(), before);
    assert_eq!(net.find_atomic("Newcomer"), None);

    // Generated names continue from where they were.
    let first = net.assert_wft("Isa(Fido, Dog)", true).unwrap();
    assert_eq!(net.node(first).unwrap().name, "wft1");
}

#[test]
fn keywords_win_over_names() {
    let mut net = test_network();

    assert!(matches!(
        net.assert_wft("Isa(And, Dog)", true),
        Err(NetError::Parse(_))
    ));

    let quoted = net.assert_wft("Isa(\"And\", Dog)", true).unwrap();
    let and = net.find_atomic("And").unwrap();
    let fillers = &net.node(quoted).unwrap().frame().unwrap().fillers;
    assert!(fillers[0].contains(&and));
}

#[test]
fn user_schema_pack_and_node_references() {
    let mut net = test_network();
    let pack = SchemaPack::from_toml_str(
        r#"
        [seed]
        id = "family"
        name = "Family"
        version = "0.1.0"

        [[types]]
        name = "Person"
        parents = ["Thing"]

        [[slots]]
        name = "parent"
        type = "Person"

        [[slots]]
        name = "child"
        type = "Person"

        [[caseframes]]
        name = "ParentOf"
        type = "Proposition"
        slots = ["parent", "child"]
        aliases = ["Parent"]
        "#,
    )
    .unwrap();
    let report = net.apply_schema_pack(&pack).unwrap();
    assert_eq!(report.aliases, 1);

    let p = net.assert_wft("ParentOf(Ann, Bob)", true).unwrap();
    assert_eq!(net.assert_wft("Parent(Ann, Bob)", true).unwrap(), p);
    let ann = net.find_atomic("Ann").unwrap();
    assert_eq!(net.node(ann).unwrap().sem_type, "Person");

    let name = net.node(p).unwrap().name.clone();
    let conj = net
        .assert_wft(&format!("And({name}, ParentOf(Bob, Cy))"), true)
        .unwrap();
    assert!(net.node(conj).unwrap().frame().unwrap().fillers[0].contains(&p));

    assert!(matches!(
        net.assert_wft("And(wft99, ParentOf(Bob, Cy))", true),
        Err(NetError::Schema(SchemaError::UnknownNode { .. }))
    ));
}

#[test]
fn bundled_pack_is_discoverable_on_disk() {
    init_tracing();
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/seeds");
    let registry = SeedRegistry::discover(&dir);
    let core = registry.get("core").unwrap();
    assert!(matches!(core.source, SeedSource::External(_)));
    assert_eq!(
        core.caseframes.len(),
        SchemaPack::core().unwrap().caseframes.len()
    );
}

#[test]
fn export_round_trips_through_json() {
    let mut net = network_with_has();
    net.assert_wft("Has(every(x, Isa(x, Dog)), Food)", true).unwrap();
    net.assert_wft("AndOr{1, 2}(Isa(Fido, Dog), Isa(Rex, Dog))", true)
        .unwrap();

    let export = NetworkExport::from_network(&net);
    let arb = export.nodes.iter().find(|n| n.kind == "variable").unwrap();
    assert_eq!(arb.name, "arb1");
    assert_eq!(arb.restrictions.len(), 1);
    let andor = export
        .nodes
        .iter()
        .find(|n| n.caseframe.as_deref() == Some("andor"))
        .unwrap();
    assert_eq!((andor.min, andor.max), (Some(1), Some(2)));

    let json = serde_json::to_string_pretty(&export).unwrap();
    let back: NetworkExport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, export);
}
