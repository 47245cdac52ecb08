use refminer_config::DetectionConfig;
use refminer_diff::{ClassDiff, ClassDiffInput, ClassDiffReport, DetectionContext, Result};
use refminer_model::{
    AnonymousClass, CandidateMerge, CodeRange, Mapping, OperationId, Reference, Replacement, ReplacementKind,
};
use refminer_test_utils::{
    rename_candidate, ClassBuilder, FragmentBuilder as F, MapperBuilder, OperationBuilder, ScriptedAligner,
    FIXTURE_FILE,
};

pub fn detect(input: &ClassDiffInput, aligner: &ScriptedAligner) -> ClassDiffReport {
    detect_with(input, aligner, &DetectionConfig::default(), &DetectionContext::default())
        .expect("detection should succeed")
}

pub fn detect_with(
    input: &ClassDiffInput,
    aligner: &ScriptedAligner,
    config: &DetectionConfig,
    ctx: &DetectionContext,
) -> Result<ClassDiffReport> {
    ClassDiff::new(input)?.with_aligner(aligner).detect(config, ctx)
}

/// `before()` keeps `a();` and moves `log(y); save(y);` into a new `helper()`
/// that it calls once.
pub fn extraction() -> (ClassDiffInput, ScriptedAligner) {
    let original = ClassBuilder::new("A")
        .operation(
            OperationBuilder::new(1, "before")
                .statement(F::leaf(1, "a();"))
                .statement(F::leaf(2, "log(y);"))
                .statement(F::leaf(3, "save(y);")),
        )
        .build();
    let next = ClassBuilder::new("A")
        .operation(
            OperationBuilder::new(2, "before")
                .statement(F::leaf(11, "a();"))
                .statement(F::leaf(12, "helper();").call("helper", &[])),
        )
        .operation(
            OperationBuilder::new(4, "helper")
                .statement(F::leaf(41, "log(y);"))
                .statement(F::leaf(42, "save(y);")),
        )
        .build();
    let mut input = ClassDiffInput::new(original, next);
    input.mappers.push(
        MapperBuilder::new(1, 2)
            .map(F::leaf(1, "a();"), F::leaf(11, "a();"))
            .unmapped1(F::leaf(2, "log(y);"))
            .unmapped1(F::leaf(3, "save(y);"))
            .unmapped2(F::leaf(12, "helper();").call("helper", &[]))
            .build(),
    );
    let aligner = ScriptedAligner::new().extract(
        1,
        4,
        MapperBuilder::new(1, 4)
            .map(F::leaf(2, "log(y);"), F::leaf(41, "log(y);"))
            .map(F::leaf(3, "save(y);"), F::leaf(42, "save(y);")),
    );
    (input, aligner)
}

/// `helper()` is deleted and its one statement now sits in `caller()`.
pub fn inlining() -> (ClassDiffInput, ScriptedAligner) {
    let original = ClassBuilder::new("A")
        .operation(
            OperationBuilder::new(1, "caller")
                .statement(F::leaf(1, "helper();").call("helper", &[]))
                .statement(F::leaf(2, "b();")),
        )
        .operation(OperationBuilder::new(3, "helper").statement(F::leaf(31, "a();")))
        .build();
    let next = ClassBuilder::new("A")
        .operation(
            OperationBuilder::new(2, "caller")
                .statement(F::leaf(21, "a();"))
                .statement(F::leaf(22, "b();")),
        )
        .build();
    let mut input = ClassDiffInput::new(original, next);
    input.mappers.push(
        MapperBuilder::new(1, 2)
            .map(F::leaf(2, "b();"), F::leaf(22, "b();"))
            .unmapped1(F::leaf(1, "helper();").call("helper", &[]))
            .unmapped2(F::leaf(21, "a();"))
            .build(),
    );
    let aligner =
        ScriptedAligner::new().inline(3, 2, MapperBuilder::new(3, 2).map(F::leaf(31, "a();"), F::leaf(21, "a();")));
    (input, aligner)
}

/// `run()` moves two statements into `helper()` and two more into `inner()`,
/// which `helper()` calls.
pub fn nested_extraction() -> (ClassDiffInput, ScriptedAligner) {
    let original = ClassBuilder::new("A")
        .operation(
            OperationBuilder::new(1, "run")
                .statement(F::leaf(1, "log(y);"))
                .statement(F::leaf(2, "save(y);"))
                .statement(F::leaf(3, "a();"))
                .statement(F::leaf(4, "b();")),
        )
        .build();
    let next = ClassBuilder::new("A")
        .operation(OperationBuilder::new(2, "run").statement(F::leaf(11, "helper();").call("helper", &[])))
        .operation(
            OperationBuilder::new(4, "helper")
                .statement(F::leaf(41, "log(y);"))
                .statement(F::leaf(42, "save(y);"))
                .statement(F::leaf(43, "inner();").call("inner", &[])),
        )
        .operation(
            OperationBuilder::new(5, "inner")
                .statement(F::leaf(51, "a();"))
                .statement(F::leaf(52, "b();")),
        )
        .build();
    let mut input = ClassDiffInput::new(original, next);
    input.mappers.push(
        MapperBuilder::new(1, 2)
            .unmapped1(F::leaf(1, "log(y);"))
            .unmapped1(F::leaf(2, "save(y);"))
            .unmapped1(F::leaf(3, "a();"))
            .unmapped1(F::leaf(4, "b();"))
            .unmapped2(F::leaf(11, "helper();").call("helper", &[]))
            .build(),
    );
    let aligner = ScriptedAligner::new()
        .extract(
            1,
            4,
            MapperBuilder::new(1, 4)
                .map(F::leaf(1, "log(y);"), F::leaf(41, "log(y);"))
                .map(F::leaf(2, "save(y);"), F::leaf(42, "save(y);"))
                .unmapped2(F::leaf(43, "inner();").call("inner", &[])),
        )
        .extract(
            1,
            5,
            MapperBuilder::new(1, 5)
                .map(F::leaf(3, "a();"), F::leaf(51, "a();"))
                .map(F::leaf(4, "b();"), F::leaf(52, "b();")),
        );
    (input, aligner)
}

/// `load()` loses `log(y); save(y);` to a new `helper()`, but only `store()`
/// calls `helper()` afterwards. `moved` is what the second statement reads
/// like inside `helper()`.
pub fn extraction_called_elsewhere(moved: &str) -> (ClassDiffInput, ScriptedAligner) {
    let original = ClassBuilder::new("A")
        .operation(
            OperationBuilder::new(1, "load")
                .statement(F::leaf(1, "a();"))
                .statement(F::leaf(2, "log(y);"))
                .statement(F::leaf(3, "save(y);")),
        )
        .operation(OperationBuilder::new(3, "store").statement(F::leaf(4, "b();")))
        .build();
    let next = ClassBuilder::new("A")
        .operation(OperationBuilder::new(2, "load").statement(F::leaf(11, "a();")))
        .operation(
            OperationBuilder::new(4, "store")
                .statement(F::leaf(21, "b();"))
                .statement(F::leaf(22, "helper();").call("helper", &[])),
        )
        .operation(
            OperationBuilder::new(5, "helper")
                .statement(F::leaf(51, "log(y);"))
                .statement(F::leaf(52, moved)),
        )
        .build();
    let mut input = ClassDiffInput::new(original, next);
    input.mappers.push(
        MapperBuilder::new(1, 2)
            .map(F::leaf(1, "a();"), F::leaf(11, "a();"))
            .unmapped1(F::leaf(2, "log(y);"))
            .unmapped1(F::leaf(3, "save(y);"))
            .build(),
    );
    input.mappers.push(
        MapperBuilder::new(3, 4)
            .map(F::leaf(4, "b();"), F::leaf(21, "b();"))
            .unmapped2(F::leaf(22, "helper();").call("helper", &[]))
            .build(),
    );
    let aligner = ScriptedAligner::new().extract(
        1,
        5,
        MapperBuilder::new(1, 5)
            .map(F::leaf(2, "log(y);"), F::leaf(51, "log(y);"))
            .map(F::leaf(3, "save(y);"), F::leaf(52, moved)),
    );
    (input, aligner)
}

/// `run()` moves `b();` into a new `helper()`, and the body of the deleted
/// `util()`, which `run()` used to call, ends up in `helper()` too.
pub fn inlining_into_extraction() -> (ClassDiffInput, ScriptedAligner) {
    let original = ClassBuilder::new("A")
        .operation(
            OperationBuilder::new(1, "run")
                .statement(F::leaf(1, "a();"))
                .statement(F::leaf(2, "util();").call("util", &[]))
                .statement(F::leaf(3, "b();")),
        )
        .operation(OperationBuilder::new(3, "util").statement(F::leaf(31, "c();")))
        .build();
    let next = ClassBuilder::new("A")
        .operation(
            OperationBuilder::new(2, "run")
                .statement(F::leaf(11, "a();"))
                .statement(F::leaf(12, "helper();").call("helper", &[])),
        )
        .operation(
            OperationBuilder::new(4, "helper")
                .statement(F::leaf(41, "c();"))
                .statement(F::leaf(42, "b();")),
        )
        .build();
    let mut input = ClassDiffInput::new(original, next);
    input.mappers.push(
        MapperBuilder::new(1, 2)
            .map(F::leaf(1, "a();"), F::leaf(11, "a();"))
            .unmapped1(F::leaf(2, "util();").call("util", &[]))
            .unmapped1(F::leaf(3, "b();"))
            .unmapped2(F::leaf(12, "helper();").call("helper", &[]))
            .build(),
    );
    let aligner = ScriptedAligner::new()
        .extract(
            1,
            4,
            MapperBuilder::new(1, 4)
                .map(F::leaf(3, "b();"), F::leaf(42, "b();"))
                .unmapped1(F::leaf(2, "util();").call("util", &[]))
                .unmapped2(F::leaf(41, "c();")),
        )
        .inline(3, 4, MapperBuilder::new(3, 4).map(F::leaf(31, "c();"), F::leaf(41, "c();")));
    (input, aligner)
}

/// `run(msg)` now calls a new overload `log(msg)` that forwards to the old
/// two-argument `log` with `LEVEL`: `log("start", LEVEL);` became
/// `log("start");`, and `log(second, LEVEL);` became `log(second);`.
pub fn overload_extraction(second: &str) -> (ClassDiffInput, ScriptedAligner) {
    let start1 = log_statement(1, &["\"start\"", "LEVEL"]);
    let second1 = log_statement(2, &[second, "LEVEL"]);
    let start2 = log_statement(11, &["\"start\""]);
    let second2 = log_statement(12, &[second]);
    let body = log_statement(51, &["msg", "LEVEL"]);

    let original = ClassBuilder::new("A")
        .operation(
            OperationBuilder::new(1, "run")
                .param("msg", "String")
                .statement(start1.clone())
                .statement(second1.clone()),
        )
        .build();
    let next = ClassBuilder::new("A")
        .operation(
            OperationBuilder::new(2, "run")
                .param("msg", "String")
                .statement(start2.clone())
                .statement(second2.clone()),
        )
        .operation(OperationBuilder::new(5, "log").param("msg", "String").statement(body.clone()))
        .build();
    let mut input = ClassDiffInput::new(original, next);
    input.mappers.push(
        MapperBuilder::new(1, 2)
            .unmapped1(start1.clone())
            .unmapped1(second1.clone())
            .unmapped2(start2)
            .unmapped2(second2)
            .build(),
    );
    let aligner = ScriptedAligner::new()
        .extract_at(1, 5, "log(\"start\")", MapperBuilder::new(1, 5).map(start1, body.clone()))
        .extract_at(1, 5, &format!("log({second})"), MapperBuilder::new(1, 5).map(second1, body));
    (input, aligner)
}

fn log_statement(id: u32, arguments: &[&str]) -> F {
    F::leaf(id, &format!("log({});", arguments.join(", "))).call("log", arguments)
}

/// [`extraction`] with an anonymous class declared inside `log(y);`, before
/// and after the move.
pub fn extraction_with_anonymous_class() -> (ClassDiffInput, ScriptedAligner) {
    let (mut input, aligner) = extraction();
    let anonymous = |name: &str, start, end| AnonymousClass {
        name: name.to_string(),
        location: CodeRange::new(FIXTURE_FILE, start, end),
        operations: Vec::new(),
    };
    // Fragment 2 spans 200..290 and fragment 41 spans 4100..4190.
    input.original.anonymous_classes.push(anonymous("A$1", 210, 280));
    input.next.anonymous_classes.push(anonymous("A$2", 4110, 4180));
    (input, aligner)
}

/// Field `count` of `Counter` becomes `total`. The first `renamed` methods
/// follow the rename. Each entry of `others` is one more method that read
/// `count` before and afterwards runs the given statement, which declares
/// and uses the given local instead. A local named `total` shadows the field
/// rather than reading it.
pub fn counter_rename(renamed: u32, others: &[(&str, &str)]) -> ClassDiffInput {
    let mut original = ClassBuilder::new("Counter").attribute("count", "int");
    let mut next = ClassBuilder::new("Counter").attribute("total", "int");
    let mut mappers = Vec::new();

    for i in 0..renamed {
        let (before, after) = (1 + i, 101 + i);
        let f1 = F::leaf(10 + i, "count++;").uses(&["count"]);
        let f2 = F::leaf(200 + i, "total++;").uses(&["total"]);
        original = original.operation(OperationBuilder::new(before, &format!("m{i}")).statement(f1.clone()));
        next = next.operation(OperationBuilder::new(after, &format!("m{i}")).statement(f2.clone()));
        let mapping = Mapping::new(f1.clone().build(), f2.clone().build());
        mappers.push(
            MapperBuilder::new(before, after)
                .map_with(f1, f2, vec![Replacement::new("count", "total", ReplacementKind::VariableName)])
                .rename(rename_candidate("count", "total", before, after, &mapping))
                .build(),
        );
    }
    for (offset, &(statement, local)) in others.iter().enumerate() {
        let i = renamed + offset as u32;
        let (before, after) = (1 + i, 101 + i);
        let f1 = F::leaf(10 + i, "count++;").uses(&["count"]);
        let f2 = F::leaf(200 + i, statement).declares(local, "int").uses(&[local]);
        original = original.operation(OperationBuilder::new(before, &format!("m{i}")).statement(f1.clone()));
        next = next.operation(OperationBuilder::new(after, &format!("m{i}")).statement(f2.clone()));
        mappers.push(MapperBuilder::new(before, after).map(f1, f2).build());
    }

    let mut input = ClassDiffInput::new(original.build(), next.build());
    input.mappers = mappers;
    input
}

/// `firstName` and `lastName` of `Person` are replaced by `fullName`.
pub fn name_merge() -> ClassDiffInput {
    let f1 = F::leaf(1, "return firstName + \" \" + lastName;").uses(&["firstName", "lastName"]);
    let f2 = F::leaf(2, "return fullName;").uses(&["fullName"]);
    let original = ClassBuilder::new("Person")
        .attribute("firstName", "String")
        .attribute("lastName", "String")
        .operation(OperationBuilder::new(1, "describe").statement(f1.clone()))
        .build();
    let next = ClassBuilder::new("Person")
        .attribute("fullName", "String")
        .operation(OperationBuilder::new(101, "describe").statement(f2.clone()))
        .build();
    let mapping = Mapping::new(f1.clone().build(), f2.clone().build());
    let mut input = ClassDiffInput::new(original, next);
    input.mappers.push(
        MapperBuilder::new(1, 101)
            .map(f1, f2)
            .merge(CandidateMerge {
                merged_names: vec!["firstName".to_string(), "lastName".to_string()],
                new_name: "fullName".to_string(),
                operation_before: OperationId(1),
                operation_after: OperationId(101),
                references: vec![Reference::from(&mapping)],
            })
            .build(),
    );
    input
}
