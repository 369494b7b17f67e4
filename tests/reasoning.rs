//! End-to-end inference tests through the statement interface.
//!
//! These exercise the full pipeline: parsing, interning, the theory
//! stack, the strategy waterfall, and proof rendering, using only the
//! public session API.

use noema::infer::TruthValue;
use noema::session::{Environment, Outcome, Session, SessionConfig};

fn test_session() -> Session {
    Session::new(SessionConfig::for_testing()).unwrap()
}

fn answer(env: &Environment, name: &str) -> (TruthValue, f32, String, Vec<String>) {
    match env.get(name) {
        Some(Outcome::Answer {
            truth,
            confidence,
            method,
            proof,
        }) => (*truth, *confidence, method.clone(), proof.clone()),
        other => panic!("expected an answer for {name}, got {other:?}"),
    }
}

#[test]
fn direct_facts_and_negations() {
    let mut session = test_session();
    let env = session.run(&[
        "@f1 ASSERT Dog IS_A animal",
        "@f2 ASSERT Penguin NOT CAN Fly",
        "@q1 QUERY Dog IS_A animal",
        "@q2 QUERY Penguin CAN Fly",
    ]);
    let (truth, confidence, method, _) = answer(&env, "q1");
    assert_eq!(truth, TruthValue::TrueCertain);
    assert_eq!(confidence, 1.0);
    assert_eq!(method, "direct");

    let (truth, _, method, _) = answer(&env, "q2");
    assert_eq!(truth, TruthValue::FalseCertain);
    assert_eq!(method, "direct");
}

#[test]
fn transitive_chains_are_one_directional() {
    let mut session = test_session();
    let env = session.run(&[
        "@f1 ASSERT Berlin LOCATED_IN Germany",
        "@f2 ASSERT Germany LOCATED_IN Europe",
        "@f3 ASSERT Europe LOCATED_IN Earth",
        "@q1 QUERY Berlin LOCATED_IN Earth",
        "@q2 QUERY Earth LOCATED_IN Berlin",
    ]);
    let (truth, _, method, proof) = answer(&env, "q1");
    assert_eq!(truth, TruthValue::TrueCertain);
    assert_eq!(method, "transitive");
    // Three hops plus the conclusion line.
    assert_eq!(proof.len(), 4);

    let (reverse, ..) = answer(&env, "q2");
    assert_ne!(reverse, TruthValue::TrueCertain);
}

#[test]
fn properties_inherit_down_the_type_hierarchy() {
    let mut session = test_session();
    let env = session.run(&[
        "@f1 ASSERT Sparky IS_A sparrow",
        "@f2 ASSERT sparrow IS_A bird",
        "@f3 ASSERT bird CAN Fly",
        "@q QUERY Sparky CAN Fly",
    ]);
    let (truth, _, method, proof) = answer(&env, "q");
    assert_eq!(truth, TruthValue::TrueCertain);
    assert_eq!(method, "property_inheritance");
    // The proof shows the type path and the inherited property.
    assert!(proof.iter().any(|line| line.contains("Sparky IS_A sparrow")));
    assert!(proof.iter().any(|line| line.contains("bird CAN Fly")));
}

#[test]
fn rules_chain_recursively() {
    let mut session = test_session();
    let env = session.run(&[
        "@r1 RULE flight IF ?x IS_A bird THEN ?x CAN Fly",
        "@r2 RULE travel IF ?x CAN Fly THEN ?x CAN Travel",
        "@f ASSERT Sparky IS_A bird",
        "@q QUERY Sparky CAN Travel",
    ]);
    let (truth, _, method, _) = answer(&env, "q");
    assert_eq!(truth, TruthValue::True);
    assert_eq!(method, "rule_application");
}

#[test]
fn disjointness_proves_certain_false() {
    let mut session = test_session();
    let env = session.run(&[
        "@d ASSERT bird DISJOINT_WITH mammal",
        "@f ASSERT Sparky IS_A bird",
        "@q QUERY Sparky IS_A mammal",
    ]);
    let (truth, confidence, method, proof) = answer(&env, "q");
    assert_eq!(truth, TruthValue::FalseCertain);
    assert_eq!(confidence, 1.0);
    assert_eq!(method, "disjoint_negation");
    // The proof cites the disjointness declaration.
    assert!(proof.iter().any(|line| line.contains("DISJOINT_WITH")));
}

#[test]
fn closed_world_applies_only_to_known_subjects() {
    let mut session = test_session();
    let env = session.run(&[
        "@f ASSERT Alice IS_A human",
        "@known QUERY Alice IS_A reptile",
        "@unknown QUERY Bob IS_A reptile",
    ]);
    let (truth, confidence, method, _) = answer(&env, "known");
    assert_eq!(truth, TruthValue::False);
    assert_eq!(method, "closed_world");
    assert!(confidence < 1.0);

    let (truth, ..) = answer(&env, "unknown");
    assert_eq!(truth, TruthValue::Unknown);
}

#[test]
fn peer_support_makes_a_claim_plausible() {
    let mut session = test_session();
    let env = session.run(&[
        "@f1 ASSERT Rex IS_A dog",
        "@f2 ASSERT Fido IS_A dog",
        "@f3 ASSERT Buddy IS_A dog",
        "@f4 ASSERT Fido LIKES Bones",
        "@f5 ASSERT Buddy LIKES Bones",
        "@q QUERY Rex LIKES Bones",
    ]);
    let (truth, confidence, method, _) = answer(&env, "q");
    assert_eq!(truth, TruthValue::Plausible);
    assert_eq!(method, "approximate_similarity");
    assert!(confidence > 0.0 && confidence <= 1.0);
}

#[test]
fn abduction_ranks_causes_by_distance() {
    let mut session = test_session();
    let env = session.run(&[
        "@f1 ASSERT Lightning CAUSES Fire",
        "@f2 ASSERT Fire CAUSES Smoke",
        "@a ABDUCE Smoke",
    ]);
    match env.get("a") {
        Some(Outcome::Abduced { hypotheses }) => {
            assert_eq!(hypotheses.len(), 2);
            assert_eq!(hypotheses[0].cause, "Fire");
            assert_eq!(hypotheses[1].cause, "Lightning");
            assert!(hypotheses[1].confidence < hypotheses[0].confidence);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn induction_finds_shared_structure() {
    let mut session = test_session();
    let env = session.run(&[
        "@f1 ASSERT Dog HAS_PROPERTY Furry",
        "@f2 ASSERT Dog HAS_PROPERTY Alive",
        "@f3 ASSERT Cat HAS_PROPERTY Furry",
        "@f4 ASSERT Cat HAS_PROPERTY Alive",
        "@f5 ASSERT Cat HAS_PROPERTY Aloof",
        "@i INDUCE Dog Cat",
    ]);
    match env.get("i") {
        Some(Outcome::Induced { shared }) => {
            assert_eq!(
                shared,
                &vec![
                    "HAS_PROPERTY Alive".to_string(),
                    "HAS_PROPERTY Furry".to_string()
                ]
            );
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn analogy_completes_the_proportion() {
    let mut session = test_session();
    let env = session.run(&[
        "@f1 ASSERT Paris CAPITAL_OF France",
        "@f2 ASSERT Tokyo CAPITAL_OF Japan",
        "@a ANALOGY Paris France Tokyo",
    ]);
    match env.get("a") {
        Some(Outcome::Analogy {
            relation, answer, ..
        }) => {
            assert_eq!(relation.as_deref(), Some("CAPITAL_OF"));
            assert_eq!(answer.as_deref(), Some("Japan"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn similar_entities_are_deterministic() {
    let lines = [
        "@f1 ASSERT Dog IS_A animal",
        "@f2 ASSERT Cat IS_A animal",
        "@f3 ASSERT Fish IS_A animal",
        "@s SIMILAR Dog 3",
    ];
    let mut a = test_session();
    let mut b = test_session();
    let first = a.run(&lines);
    let second = b.run(&lines);
    match (first.get("s"), second.get("s")) {
        (Some(Outcome::Similar { hits: x }), Some(Outcome::Similar { hits: y })) => {
            assert_eq!(x, y);
            assert!(x.iter().all(|(label, _)| label != "Dog"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn proofs_end_with_a_conclusion_line() {
    let mut session = test_session();
    let env = session.run(&["@f ASSERT Dog IS_A animal", "@q QUERY Dog IS_A animal"]);
    let (.., proof) = answer(&env, "q");
    let last = proof.last().unwrap();
    assert!(last.starts_with("=> "));
    assert!(last.contains("TRUE_CERTAIN"));
    assert!(last.contains("direct"));
}
