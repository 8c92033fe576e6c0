//! End-to-end validation scenarios through the public API.

use archgate::{
    Error, Event, Finding, FindingKind, PackageDependencies, PackagePattern, ReadKind,
    ReportingPolicy, Severity, ValidationSession, classify,
};
use proptest::prelude::*;

/// `a` reads `b`, `b` reads nothing, `com.vendor.*` is whitelisted.
fn basic_model() -> PackageDependencies {
    PackageDependencies::builder()
        .package("a", ["b"])
        .package("b", Vec::<String>::new())
        .whitelist(PackagePattern::parse("com.vendor.*").expect("valid pattern"))
        .build()
        .expect("model should build")
}

/// Dependency graph:
/// ```text
/// a -> b -> c -> a   (declared cycle)
/// c -> d
/// ```
fn cyclic_model() -> PackageDependencies {
    PackageDependencies::builder()
        .package("a", ["b"])
        .package("b", ["c"])
        .package("c", ["a", "d"])
        .package("d", Vec::<String>::new())
        .build()
        .expect("model should build")
}

#[test]
fn round_trip_scenario() {
    let model = basic_model();
    let mut session = ValidationSession::new(&model, ReportingPolicy::default());

    session
        .run([
            Event::enter("a"),
            Event::reference(10, "b"),
            Event::reference(11, "c"),
            Event::enter("c"),
        ])
        .expect("stream is well formed");

    assert_eq!(
        session.findings(),
        &[
            Finding {
                severity: Severity::Error,
                kind: FindingKind::IllegalDependency {
                    from: "a".into(),
                    to: "c".into(),
                    location: 11,
                },
            },
            Finding {
                severity: Severity::Warning,
                kind: FindingKind::UnconfiguredPackage { name: "c".into() },
            },
        ]
    );
}

#[test]
fn unconfigured_package_reported_once_per_session() {
    let model = basic_model();
    let events = || {
        [
            Event::enter("x"),
            Event::reference((), "a"),
            Event::enter("a"),
            Event::enter("x"),
            Event::enter("y"),
            Event::enter("x"),
        ]
    };

    let mut first = ValidationSession::new(&model, ReportingPolicy::default());
    first.run(events()).expect("stream is well formed");
    let mut second = ValidationSession::new(&model, ReportingPolicy::default());
    second.run(events()).expect("stream is well formed");

    // Sessions keep independent dedup state.
    for session in [&first, &second] {
        let names: Vec<_> = session
            .findings()
            .iter()
            .map(|finding| match &finding.kind {
                FindingKind::UnconfiguredPackage { name } => name.as_str(),
                other => panic!("unexpected finding {other:?}"),
            })
            .collect();
        assert_eq!(names, vec!["x", "y"]);
    }
}

#[test]
fn unconfigured_source_references_are_not_judged() {
    let model = basic_model();
    let mut session = ValidationSession::new(&model, ReportingPolicy::default());
    let x = session.enter_package("x").expect("session has a model");

    assert_eq!(session.observe_reference(&x, (), "a"), None);
    assert_eq!(session.findings().len(), 1);
}

#[test]
fn whitelist_is_absolute() {
    let model = PackageDependencies::builder()
        .package("a", Vec::<String>::new())
        .package("com.vendor.api", ["a"])
        .whitelist(PackagePattern::parse("com.vendor.*").expect("valid pattern"))
        .build()
        .expect("model should build");
    let a = model.get_package("a");

    assert_eq!(classify(&model, &a, "com.vendor.api"), None);
    assert_eq!(classify(&model, &a, "com.vendor.unconfigured.sub"), None);
}

#[test]
fn cycle_membership_comes_from_configured_graph() {
    let model = cyclic_model();
    let a = model.get_package("a");
    let b = model.get_package("b");
    let c = model.get_package("c");

    assert_eq!(classify(&model, &a, "c"), Some(ReadKind::Cycle));
    assert_eq!(classify(&model, &b, "a"), Some(ReadKind::Cycle));
    assert_eq!(classify(&model, &c, "a"), Some(ReadKind::Allowed));
    assert_eq!(classify(&model, &a, "d"), Some(ReadKind::Disallowed));
}

#[test]
fn disallowed_edges_do_not_create_cycles() {
    // d -> a is observed but not declared; it must not pull d into the cycle.
    let model = cyclic_model();
    let mut session = ValidationSession::new(&model, ReportingPolicy::default());
    session
        .run([
            Event::enter("d"),
            Event::reference((), "a"),
            Event::reference((), "a"),
        ])
        .expect("stream is well formed");

    let d = model.get_package("d");
    assert_eq!(classify(&model, &d, "a"), Some(ReadKind::Disallowed));
    assert_eq!(session.findings().len(), 2);
}

#[test]
fn cycle_references_produce_no_findings() {
    let model = cyclic_model();
    let mut session = ValidationSession::new(&model, ReportingPolicy::default());
    session
        .run([Event::enter("a"), Event::reference((), "c")])
        .expect("stream is well formed");

    assert!(session.findings().is_empty());
}

#[test]
fn stream_starting_with_reference_fails_loudly() {
    let model = basic_model();
    let mut session = ValidationSession::new(&model, ReportingPolicy::default());

    let result = session.run([Event::reference((), "b"), Event::enter("a")]);

    assert!(matches!(result, Err(Error::NoCurrentPackage)));
}

#[test]
fn sessions_share_a_model_across_threads() {
    let model = cyclic_model();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let mut session = ValidationSession::new(&model, ReportingPolicy::default());
                    session
                        .run([
                            Event::enter("a"),
                            Event::reference((), "d"),
                            Event::enter("zz"),
                        ])
                        .expect("stream is well formed");
                    session.findings().len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().expect("thread should not panic"), 2);
        }
    });
}

const NAMES: [&str; 5] = ["p0", "p1", "p2", "p3", "p4"];

fn arb_model() -> impl Strategy<Value = PackageDependencies> {
    prop::collection::vec(prop::collection::btree_set(0..NAMES.len(), 0..NAMES.len()), NAMES.len())
        .prop_map(|reads| {
            reads
                .into_iter()
                .enumerate()
                .fold(PackageDependencies::builder(), |builder, (index, targets)| {
                    builder.package(NAMES[index], targets.into_iter().map(|t| NAMES[t]))
                })
                .build()
                .expect("names are unique")
        })
}

proptest! {
    #[test]
    fn classification_follows_configuration(model in arb_model()) {
        for from_name in NAMES {
            let from = model.get_package(from_name);
            for to in NAMES {
                let expected = if to == from_name {
                    None
                } else if from.reads(to) {
                    Some(ReadKind::Allowed)
                } else if model.in_same_cycle(from_name, to) {
                    Some(ReadKind::Cycle)
                } else {
                    Some(ReadKind::Disallowed)
                };
                prop_assert_eq!(classify(&model, &from, to), expected);
            }
        }
    }

    #[test]
    fn illegal_findings_match_disallowed_references(
        model in arb_model(),
        pairs in prop::collection::vec((0..NAMES.len(), 0..NAMES.len()), 0..30),
    ) {
        let mut session = ValidationSession::new(&model, ReportingPolicy::default());
        let mut disallowed = 0;
        for (from, to) in pairs {
            let current = session.enter_package(NAMES[from]).expect("session has a model");
            if session.observe_reference(&current, (), NAMES[to]) == Some(ReadKind::Disallowed) {
                disallowed += 1;
            }
        }

        let illegal = session
            .findings()
            .iter()
            .filter(|f| matches!(f.kind, FindingKind::IllegalDependency { .. }))
            .count();
        prop_assert_eq!(illegal, disallowed);
    }
}
