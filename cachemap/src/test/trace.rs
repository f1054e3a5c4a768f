use crate::simulator::Simulator;
use crate::trace::{StepKind, Trace};
use super::{direct4, full4, set2};

fn titles(trace: &Trace) -> Vec<&str> {
    trace.steps().iter().map(|step| step.title.as_str()).collect()
}

fn kinds(trace: &Trace) -> Vec<StepKind> {
    trace.steps().iter().map(|step| step.kind).collect()
}

#[test]
fn direct_mapped_miss_on_an_empty_line() {
    let mut simulator = Simulator::new(&direct4()).unwrap();
    let trace = simulator.simulate("10110110").unwrap().trace;
    assert_eq!(titles(&trace), vec![
        "1. Memory address received",
        "2. Address decoded",
        "3. Line selection",
        "4. Valid bit check",
        "5. Cache miss",
        "6. Main memory access",
        "7. Victim selection",
        "8. Cache update",
        "9. Word delivered",
    ]);
    use StepKind::*;
    assert_eq!(kinds(&trace), vec![Info, Info, Warning, Error, Error, Warning, Warning, Info, Success]);
    assert_eq!(
        trace.steps()[1].description,
        "Tag: 1011 (4 bits = 11), Index: 01 (2 bits = L1), Word: 10 (2 bits = position 2)"
    );
    assert!(trace.steps()[4].description.starts_with("Reason: the line is invalid."));
    assert!(trace.steps()[6].description.contains("line L1, which is empty"));
    assert!(trace.steps()[8].description.contains(": 182."));
}

#[test]
fn direct_mapped_hit_and_conflict() {
    let mut simulator = Simulator::new(&direct4()).unwrap();
    simulator.simulate("10110110").unwrap();
    let hit = simulator.simulate("10110100").unwrap().trace;
    assert_eq!(titles(&hit)[3..], ["4. Valid bit check", "5. Tag comparison", "6. Cache hit", "7. Word delivered"]);
    assert_eq!(hit.steps()[4].kind, StepKind::Success);
    assert_eq!(hit.steps()[4].description, "Tag match: address tag 1011 = stored tag 1011");

    let conflict = simulator.simulate("00000100").unwrap().trace;
    assert_eq!(conflict.len(), 10);
    assert_eq!(conflict.steps()[3].kind, StepKind::Success);
    assert_eq!(conflict.steps()[4].kind, StepKind::Error);
    assert_eq!(conflict.steps()[4].description, "Tag mismatch: address tag 0000 != stored tag 1011");
    assert!(conflict.steps()[5].description.starts_with("Reason: the tag doesn't match."));
    assert!(conflict.steps()[7].description.contains("(tag 1011) is discarded"));
}

#[test]
fn fully_associative_lists_every_comparison() {
    let mut simulator = Simulator::new(&full4()).unwrap();
    simulator.simulate_all(["10110100", "00000100"]).unwrap();
    let trace = simulator.simulate("00000111").unwrap().trace;
    assert_eq!(trace.len(), 6);
    assert_eq!(trace.steps()[2].title, "3. Search across every line");
    assert_eq!(
        trace.steps()[3].description,
        "Comparisons performed:\nL0: tag 101101 no match\nL1: tag 000001 MATCH\nL2: invalid (V=0), not compared\nL3: invalid (V=0), not compared"
    );
    assert_eq!(trace.steps()[4].title, "5. Cache hit");
    assert!(trace.steps()[4].description.starts_with("Tag found in L1."));
}

#[test]
fn set_associative_miss_names_the_set() {
    let mut simulator = Simulator::new(&set2()).unwrap();
    simulator.simulate_all(["00000100", "00010100"]).unwrap();
    let trace = simulator.simulate("00100110").unwrap().trace;
    assert_eq!(trace.len(), 10);
    assert_eq!(trace.steps()[2].title, "3. Set selection");
    assert_eq!(trace.steps()[3].title, "4. Parallel search in the 2 ways of set 1");
    assert_eq!(trace.steps()[3].kind, StepKind::Info);
    assert!(trace.steps()[3].description.contains("Only 2 comparators are needed"));
    assert!(trace.steps()[4].description.starts_with("Comparisons in set 1:\nWay 0: tag 00000 no match"));
    assert_eq!(trace.steps()[5].description, "The tag 00100 is not in any way of set 1. The block has to be loaded from main memory.");
    assert!(trace.steps()[7].description.starts_with("Selected set 1, way 0. Every candidate way in set 1 holds a block"));
    assert_eq!(trace.steps()[8].description, "The block is stored in set 1, way 0. The tag is set to 00100 and Valid = 1.");
}

#[test]
fn set_associative_hit_searches_the_set_first() {
    let mut simulator = Simulator::new(&set2()).unwrap();
    simulator.simulate("00000100").unwrap();
    let trace = simulator.simulate("00000111").unwrap().trace;
    assert_eq!(titles(&trace), vec![
        "1. Memory address received",
        "2. Address decoded",
        "3. Set selection",
        "4. Parallel search in the 2 ways of set 1",
        "5. Comparison results",
        "6. Cache hit",
        "7. Word delivered",
    ]);
}

#[test]
fn every_trace_follows_the_same_order() {
    for config in [direct4(), full4(), set2()] {
        let mut simulator = Simulator::new(&config).unwrap();
        for address in ["10110110", "10110110", "01010101", "10110111"] {
            let simulation = simulator.simulate(address).unwrap();
            let trace = simulation.trace;
            for (number, step) in trace.steps().iter().enumerate() {
                assert!(step.title.starts_with(&format!("{}. ", number + 1)), "{}", step.title);
            }
            let verdict = if simulation.access.hit() { "Cache hit" } else { "Cache miss" };
            assert!(trace.steps().iter().any(|step| step.title.ends_with(verdict)));
            assert_eq!(trace.steps().last().unwrap().kind, StepKind::Success);
            assert!(trace.get(trace.len()).is_none());
        }
    }
}

#[test]
fn traces_serialise_for_presentation() {
    let mut simulator = Simulator::new(&direct4()).unwrap();
    let simulation = simulator.simulate("10110110").unwrap();
    let json = serde_json::to_value(&simulation).unwrap();
    assert_eq!(json["trace"][0]["kind"], "info");
    assert_eq!(json["trace"][3]["kind"], "error");
    assert_eq!(json["access"]["address"]["tag"], "1011");
    assert_eq!(json["access"]["replacement"]["victim"]["Line"], 1);
}
