use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use refminer_diff::{inconsistency_ratio, ClassDiffInput, Refactoring};
use refminer_model::{CandidateMerge, CandidateRename, Mapping, OperationId, Reference};
use refminer_test_utils::{rename_candidate, ClassBuilder, FragmentBuilder as F, MapperBuilder, OperationBuilder};

use super::fixtures::{counter_rename, detect, extraction, inlining, nested_extraction};

#[test]
fn repeated_detection_yields_identical_facts() {
    let fixtures = [extraction(), inlining(), nested_extraction()];
    for (input, aligner) in &fixtures {
        let first = detect(input, aligner);
        let second = detect(input, aligner);
        assert_eq!(first.refactorings, second.refactorings);
        let first: Vec<String> = first.refactorings.iter().map(ToString::to_string).collect();
        let second: Vec<String> = second.refactorings.iter().map(ToString::to_string).collect();
        assert_eq!(first, second);
    }

    let input = counter_rename(3, &[]);
    let first = detect(&input, &Default::default());
    let second = detect(&input, &Default::default());
    assert_eq!(first.refactorings, second.refactorings);
}

#[test]
fn no_fact_repeats_the_mappings_of_another() {
    for (input, aligner) in [extraction(), inlining(), nested_extraction()] {
        let report = detect(&input, &aligner);
        let bodies: Vec<_> = report.refactorings.iter().filter_map(Refactoring::body_mapper).collect();
        for (i, a) in bodies.iter().enumerate() {
            for b in &bodies[i + 1..] {
                assert!(!a.mappings.is_empty() && !b.mappings.is_empty());
                assert!(!a.contains_all_mappings_of(b), "{a:?} repeats {b:?}");
                assert!(!b.contains_all_mappings_of(a), "{b:?} repeats {a:?}");
            }
        }
    }
}

/// Class `P` with field `a` renamed to `b`, observed in one method each way
/// as listed in `patterns`.
fn rename_patterns(patterns: &[(&str, &str, usize)]) -> ClassDiffInput {
    let mut original = ClassBuilder::new("P").attribute("a", "int");
    let mut next = ClassBuilder::new("P").attribute("b", "int");
    let mut mappers = Vec::new();
    for (i, &(before_name, after_name, occurrences)) in patterns.iter().enumerate() {
        let i = i as u32;
        let (before, after) = (1 + i, 101 + i);
        let f1 = F::leaf(10 + i, "x();");
        let f2 = F::leaf(200 + i, "y();");
        original = original.operation(OperationBuilder::new(before, &format!("m{i}")).statement(f1.clone()));
        next = next.operation(OperationBuilder::new(after, &format!("m{i}")).statement(f2.clone()));
        let mapping = Mapping::new(f1.clone().build(), f2.clone().build());
        let candidate = CandidateRename {
            occurrences,
            ..rename_candidate(before_name, after_name, before, after, &mapping)
        };
        mappers.push(MapperBuilder::new(before, after).map(f1, f2).rename(candidate).build());
    }
    let mut input = ClassDiffInput::new(original.build(), next.build());
    input.mappers = mappers;
    input
}

#[test]
fn cyclic_rename_patterns_are_never_emitted() {
    let input = rename_patterns(&[("a", "b", 2), ("b", "a", 2)]);

    let report = detect(&input, &Default::default());

    assert!(report.refactorings.is_empty(), "{:?}", report.refactorings);
}

#[test]
fn rename_without_any_reference_counts_as_consistent() {
    assert_eq!(inconsistency_ratio(0, 0), 0.0);
    let input = rename_patterns(&[("a", "b", 1)]);

    let report = detect(&input, &Default::default());

    let facts: Vec<String> = report.refactorings.iter().map(ToString::to_string).collect();
    assert_eq!(facts, vec!["Rename Attribute a : int to b : int in class P"]);
}

#[test]
fn merged_names_are_exactly_those_of_the_folded_candidates() {
    let mut original = ClassBuilder::new("P")
        .attribute("a", "int")
        .attribute("b", "int")
        .attribute("d", "int");
    let mut next = ClassBuilder::new("P").attribute("c", "int").attribute("d", "int");
    let mut input_mappers = Vec::new();
    let observations: [&[&str]; 3] = [&["a"], &["this.b"], &["a", "b"]];
    for (i, names) in observations.iter().enumerate() {
        let i = i as u32;
        let (before, after) = (1 + i, 101 + i);
        let f1 = F::leaf(10 + i, "x();");
        let f2 = F::leaf(200 + i, "y();");
        original = original.operation(OperationBuilder::new(before, &format!("m{i}")).statement(f1.clone()));
        next = next.operation(OperationBuilder::new(after, &format!("m{i}")).statement(f2.clone()));
        let mapping = Mapping::new(f1.clone().build(), f2.clone().build());
        input_mappers.push(
            MapperBuilder::new(before, after)
                .map(f1, f2)
                .merge(CandidateMerge {
                    merged_names: names.iter().map(|n| n.to_string()).collect(),
                    new_name: "c".to_string(),
                    operation_before: OperationId(before),
                    operation_after: OperationId(after),
                    references: vec![Reference::from(&mapping)],
                })
                .build(),
        );
    }
    let mut input = ClassDiffInput::new(original.build(), next.build());
    input.mappers = input_mappers;

    let report = detect(&input, &Default::default());

    let [Refactoring::MergeAttribute { merged, candidates, .. }] = report.refactorings.as_slice() else {
        panic!("expected one merge, got {:?}", report.refactorings);
    };
    let key: BTreeSet<String> = merged.iter().map(|a| a.name.clone()).collect();
    let folded: BTreeSet<String> = candidates
        .iter()
        .flat_map(|c| c.merged_names.iter())
        .map(|n| n.trim_start_matches("this.").to_string())
        .collect();
    assert_eq!(key, folded);
    assert_eq!(candidates.len(), 3);
}
