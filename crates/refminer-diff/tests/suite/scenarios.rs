use pretty_assertions::assert_eq;
use refminer_config::DetectionConfig;
use refminer_diff::{DetectionContext, Refactoring, RefactoringKind};
use refminer_model::{AlignmentKind, OperationId};

use super::fixtures::{
    counter_rename, detect, detect_with, extraction, extraction_called_elsewhere, extraction_with_anonymous_class,
    inlining, inlining_into_extraction, name_merge, nested_extraction, overload_extraction,
};

fn descriptions(refactorings: &[Refactoring]) -> Vec<String> {
    refactorings.iter().map(ToString::to_string).collect()
}

#[test]
fn moved_statements_become_an_extracted_operation() {
    let (input, aligner) = extraction();

    let report = detect(&input, &aligner);

    assert_eq!(
        descriptions(&report.refactorings),
        vec!["Extract Method helper() extracted from before() in class A"]
    );
    let body = report.refactorings[0].body_mapper().expect("body mapper");
    assert_eq!(body.mappings.len(), 2);
    assert_eq!(body.non_mapped_elements_t1(), 0);
    assert_eq!(body.non_mapped_elements_t2(), 0);
    assert!(report.added_operations.is_empty());
    assert_eq!(report.mappers[0].child_mappers.len(), 1);
    assert_eq!(report.mappers[0].child_mappers[0].container2, OperationId(4));
}

#[test]
fn deleted_operation_inlined_into_its_caller_is_claimed() {
    let (input, aligner) = inlining();

    let report = detect(&input, &aligner);

    assert_eq!(
        descriptions(&report.refactorings),
        vec!["Inline Method helper() inlined to caller() in class A"]
    );
    assert!(report.removed_operations.is_empty());
    assert_eq!(report.mappers[0].child_mappers.len(), 1);
}

#[test]
fn rename_followed_by_nine_of_ten_methods_is_accepted() {
    let input = counter_rename(9, &[("count++;", "count")]);

    let report = detect(&input, &Default::default());

    assert_eq!(
        descriptions(&report.refactorings),
        vec!["Rename Attribute count : int to total : int in class Counter"]
    );
    let Refactoring::RenameAttribute { candidates, .. } = &report.refactorings[0] else {
        unreachable!()
    };
    assert_eq!(candidates.len(), 9);
}

#[test]
fn rename_missing_from_most_methods_is_rejected() {
    // Six methods keep reading `count` and gain an unrelated local `total`.
    let others = [("int total = 0;", "total"); 6];
    let input = counter_rename(4, &others);

    let report = detect(&input, &Default::default());

    assert!(
        report.refactorings.is_empty(),
        "unexpected facts: {:?}",
        descriptions(&report.refactorings)
    );
    let pending: Vec<(&str, &str)> = report
        .unresolved
        .renames
        .iter()
        .map(|c| (c.original_name.as_str(), c.renamed_name.as_str()))
        .collect();
    assert_eq!(pending, vec![("count", "total"); 4]);
}

#[test]
fn rename_missing_from_exactly_half_the_methods_is_accepted() {
    let others = [("int total = 0;", "total"); 5];
    let input = counter_rename(5, &others);

    let report = detect(&input, &Default::default());

    assert_eq!(
        descriptions(&report.refactorings),
        vec!["Rename Attribute count : int to total : int in class Counter"]
    );
    assert!(report.unresolved.is_empty());
}

#[test]
fn two_fields_replaced_by_one_are_merged() {
    let input = name_merge();

    let report = detect(&input, &Default::default());

    assert_eq!(
        descriptions(&report.refactorings),
        vec!["Merge Attribute [firstName : String, lastName : String] to fullName : String in class Person"]
    );
    assert!(report.unresolved.is_empty());
}

#[test]
fn nested_extraction_is_reported_before_its_caller() {
    let (input, aligner) = nested_extraction();

    let report = detect(&input, &aligner);

    let kinds: Vec<RefactoringKind> = report.refactorings.iter().map(Refactoring::kind).collect();
    assert_eq!(kinds, vec![RefactoringKind::ExtractOperation; 2]);
    assert_eq!(
        descriptions(&report.refactorings),
        vec![
            "Extract Method inner() extracted from run() in class A",
            "Extract Method helper() extracted from run() in class A",
        ]
    );
    // Only the operation the host calls directly is claimed.
    let added: Vec<OperationId> = report.added_operations.iter().map(|op| op.id).collect();
    assert_eq!(added, vec![OperationId(5)]);
}

#[test]
fn disabled_passes_leave_everything_unmatched() {
    let (input, aligner) = extraction();
    let config = DetectionConfig {
        extract_operations: false,
        extract_with_calls_in_other_mappers: false,
        ..DetectionConfig::default()
    };

    let report = detect_with(&input, &aligner, &config, &DetectionContext::default()).expect("detection");

    assert!(report.refactorings.is_empty());
    assert_eq!(report.added_operations.len(), 1);
    assert!(aligner.requests().is_empty());
}

#[test]
fn merge_resolution_can_be_switched_off() {
    let input = name_merge();
    let config = DetectionConfig {
        attribute_merges_and_splits: false,
        ..DetectionConfig::default()
    };

    let report = detect_with(&input, &Default::default(), &config, &DetectionContext::default()).expect("detection");

    assert!(report.refactorings.is_empty());
}

#[test]
fn extraction_called_from_another_method_is_found() {
    let (input, aligner) = extraction_called_elsewhere("save(y);");

    let report = detect(&input, &aligner);

    assert_eq!(
        descriptions(&report.refactorings),
        vec!["Extract Method helper() extracted from load() in class A"]
    );
    assert!(report.added_operations.is_empty());
    assert_eq!(report.mappers[0].child_mappers.len(), 1);
    assert!(report.mappers[1].child_mappers.is_empty());
}

#[test]
fn extraction_called_from_another_method_needs_two_exact_matches() {
    let (input, aligner) = extraction_called_elsewhere("store(y);");

    let report = detect(&input, &aligner);

    assert!(
        report.refactorings.is_empty(),
        "unexpected facts: {:?}",
        descriptions(&report.refactorings)
    );
    let added: Vec<OperationId> = report.added_operations.iter().map(|op| op.id).collect();
    assert_eq!(added, vec![OperationId(5)]);
    // The alignment was tried and turned down.
    assert!(aligner
        .requests()
        .iter()
        .any(|r| r.kind == AlignmentKind::Extract && r.container1 == OperationId(1) && r.container2 == OperationId(5)));
}

#[test]
fn deleted_operation_inlined_into_an_extracted_one() {
    let (input, aligner) = inlining_into_extraction();

    let report = detect(&input, &aligner);

    assert_eq!(
        descriptions(&report.refactorings),
        vec![
            "Extract Method helper() extracted from run() in class A",
            "Inline Method util() inlined to helper() in class A",
        ]
    );
    assert!(report.removed_operations.is_empty());
    assert!(report.added_operations.is_empty());
    let extracted = report.refactorings[0].body_mapper().expect("body mapper");
    let inlined: Vec<OperationId> = extracted.child_mappers.iter().map(|m| m.container1).collect();
    assert_eq!(inlined, vec![OperationId(3)]);
    assert_eq!(report.mappers[0].child_mappers[0].child_mappers.len(), 1);
}

#[test]
fn lone_changed_call_to_the_extracted_operation_is_dropped() {
    // The second call site maps `log(msg, LEVEL);` onto itself.
    let (input, aligner) = overload_extraction("msg");

    let report = detect(&input, &aligner);

    assert_eq!(
        descriptions(&report.refactorings),
        vec!["Extract Method log(String) extracted from run(String) in class A"]
    );
    let body = report.refactorings[0].body_mapper().expect("body mapper");
    assert_eq!(body.exact_matches().len(), 1);
    assert_eq!(report.mappers[0].child_mappers.len(), 1);
    assert!(report.added_operations.is_empty());
}

#[test]
fn changed_calls_are_kept_when_every_extraction_is_one() {
    let (input, aligner) = overload_extraction("\"stop\"");

    let report = detect(&input, &aligner);

    assert_eq!(
        descriptions(&report.refactorings),
        vec!["Extract Method log(String) extracted from run(String) in class A"; 2]
    );
    assert_eq!(report.mappers[0].child_mappers.len(), 2);
}

#[test]
fn anonymous_classes_inside_extracted_code_are_matched() {
    let (input, aligner) = extraction_with_anonymous_class();

    let report = detect(&input, &aligner);

    assert_eq!(report.refactorings.len(), 1);
    assert!(report.removed_anonymous_classes.is_empty());
    assert!(report.added_anonymous_classes.is_empty());

    let config = DetectionConfig {
        extract_operations: false,
        ..DetectionConfig::default()
    };
    let report = detect_with(&input, &aligner, &config, &DetectionContext::default()).expect("detection");
    assert_eq!(report.removed_anonymous_classes, vec!["A$1".to_string()]);
    assert_eq!(report.added_anonymous_classes, vec!["A$2".to_string()]);
}
