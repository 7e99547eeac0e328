//! Derivation model: problems, solutions, tasks and the tree that records them

pub mod alternative;
pub mod and_group;
pub mod problem;
pub mod solution;
pub mod task;
pub mod tree;

pub use alternative::{Alternative, AlternativeOutcome, SolutionBuilder};
pub use and_group::{AndGroup, Contribution, GroupState};
pub use problem::Problem;
pub use solution::{Solution, expr_cost};
pub use task::{AlternativeId, ParentLink, Priority, SolvedVia, Task, TaskId, TaskStatus};
pub use tree::{AlternativeRecord, AlternativeState, DerivationTree, Walk, WalkEntry};
