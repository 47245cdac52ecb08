use std::collections::HashSet;

use proptest::prelude::*;
use refminer_diff::{CallTree, DetectionContext, InvocationMatcher, NodeId};
use refminer_model::{Operation, TypeHierarchy};
use refminer_test_utils::{FragmentBuilder as F, OperationBuilder};

const OPERATIONS: usize = 6;

/// Operation `i` is `op{i}` and calls every operation listed in `calls[i]`.
fn call_graph(calls: &[Vec<usize>]) -> Vec<Operation> {
    calls
        .iter()
        .enumerate()
        .map(|(i, callees)| {
            let mut builder = OperationBuilder::new(i as u32 + 1, &format!("op{i}"));
            for (k, callee) in callees.iter().enumerate() {
                let name = format!("op{callee}");
                let id = (i * 10 + k) as u32 + 100;
                builder = builder.statement(F::leaf(id, &format!("{name}();")).call(&name, &[]));
            }
            builder.build()
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn no_path_revisits_an_operation(
        calls in prop::collection::vec(prop::collection::vec(0..OPERATIONS, 0..4), OPERATIONS)
    ) {
        let operations = call_graph(&calls);
        let caller = OperationBuilder::new(99, "root")
            .statement(F::leaf(1, "op0();").call("op0", &[]))
            .build();
        let invocation = caller.body[0].invocations[0].clone();
        let pool: Vec<&Operation> = operations.iter().collect();
        let hierarchy = TypeHierarchy::new();
        let matcher = InvocationMatcher::new(&hierarchy);

        let tree = CallTree::build(&caller, &operations[0], &invocation, &pool, &matcher, &DetectionContext::default())
            .expect("unbounded context never trips");

        prop_assert_eq!(tree.root().invoked, operations[0].id);
        for index in 0..tree.node_count() {
            let node = NodeId(index);
            let path = tree.path_from_root(node);
            let distinct: HashSet<_> = path.iter().collect();
            prop_assert_eq!(distinct.len(), path.len(), "path {:?} revisits an operation", path);

            let siblings: Vec<_> = tree.node(node).children.iter().map(|c| tree.node(*c).invoked).collect();
            let distinct: HashSet<_> = siblings.iter().collect();
            prop_assert_eq!(distinct.len(), siblings.len(), "siblings {:?} repeat an operation", siblings);
        }
    }
}
