//! Call trees among added (or removed) operations.
//!
//! A tree is rooted at one call site of a candidate operation. Every node
//! records which operation made the call, which candidate operation it
//! reaches, and the call site itself. Nodes live in an arena and refer to
//! each other by [`NodeId`].

use std::collections::VecDeque;

use refminer_core::{CodeRange, OperationId};
use refminer_model::{Invocation, Operation};

use crate::context::DetectionContext;
use crate::error::Result;
use crate::invocation::InvocationMatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Identity of a call tree: the caller, callee and location of its root call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallKey {
    pub caller: OperationId,
    pub invoked: OperationId,
    pub invocation: CodeRange,
}

#[derive(Debug, Clone)]
pub struct CallGraphNode {
    pub parent: Option<NodeId>,
    pub caller: OperationId,
    pub invoked: OperationId,
    pub invocation: Invocation,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct CallTree {
    nodes: Vec<CallGraphNode>,
}

impl CallTree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new(caller: OperationId, invoked: OperationId, invocation: Invocation) -> Self {
        Self {
            nodes: vec![CallGraphNode {
                parent: None,
                caller,
                invoked,
                invocation,
                children: Vec::new(),
            }],
        }
    }

    /// Builds the tree rooted at `invocation`, made from `caller` to
    /// `invoked`, following calls into operations of `pool`.
    pub fn build(
        caller: &Operation,
        invoked: &Operation,
        invocation: &Invocation,
        pool: &[&Operation],
        matcher: &InvocationMatcher<'_>,
        ctx: &DetectionContext,
    ) -> Result<Self> {
        let mut tree = Self::new(caller.id, invoked.id, invocation.clone());
        tree.expand(Self::ROOT, invoked, pool, matcher, ctx)?;
        tracing::debug!(
            target: "refminer.diff",
            caller = %caller.signature(),
            invoked = %invoked.signature(),
            nodes = tree.node_count(),
            "built call tree"
        );
        Ok(tree)
    }

    fn expand(
        &mut self,
        parent: NodeId,
        operation: &Operation,
        pool: &[&Operation],
        matcher: &InvocationMatcher<'_>,
        ctx: &DetectionContext,
    ) -> Result<()> {
        for candidate in pool {
            for invocation in operation.all_invocations() {
                if !matcher.matches(invocation, candidate, operation) {
                    continue;
                }
                if self.contains_in_path_to_root_or_sibling(parent, candidate.id) {
                    continue;
                }
                ctx.check("call tree")?;
                let child = self.add_child(parent, operation.id, candidate.id, invocation.clone());
                self.expand(child, candidate, pool, matcher, ctx)?;
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &CallGraphNode {
        &self.nodes[Self::ROOT.index()]
    }

    pub fn node(&self, id: NodeId) -> &CallGraphNode {
        &self.nodes[id.index()]
    }

    /// Never zero: the root is always there.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn add_child(
        &mut self,
        parent: NodeId,
        caller: OperationId,
        invoked: OperationId,
        invocation: Invocation,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(CallGraphNode {
            parent: Some(parent),
            caller,
            invoked,
            invocation,
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Whether `invoked` is already reached by `node`, one of its ancestors,
    /// or a child of any of them.
    pub fn contains_in_path_to_root_or_sibling(&self, node: NodeId, invoked: OperationId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            let entry = self.node(id);
            if entry.invoked == invoked {
                return true;
            }
            if entry.children.iter().any(|child| self.node(*child).invoked == invoked) {
                return true;
            }
            current = entry.parent;
        }
        false
    }

    pub fn nodes_in_breadth_first_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([Self::ROOT]);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            queue.extend(self.node(id).children.iter().copied());
        }
        order
    }

    /// Operations reached on the way from the root down to `node`, root first.
    pub fn path_from_root(&self, node: NodeId) -> Vec<OperationId> {
        let mut path = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let entry = self.node(id);
            path.push(entry.invoked);
            current = entry.parent;
        }
        path.reverse();
        path
    }
}
