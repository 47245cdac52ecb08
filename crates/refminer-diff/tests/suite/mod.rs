mod call_tree;
mod cancellation;
mod fixtures;
mod properties;
mod scenarios;
