//! Best-first AND/OR search over derivation tasks
//!
//! The engine owns a worklist of tasks ordered by an immutable priority
//! computed at creation. Each popped task is expanded exactly once: the
//! catalog reports every applicable alternative, the first immediate one
//! solves the task, and otherwise every alternative's subtasks are queued
//! as competing AND-groups. Solutions flow back up through the groups'
//! builders until the root is solved or the worklist runs dry.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::derivation::{
    AlternativeId, AlternativeOutcome, AlternativeState, AndGroup, Contribution, DerivationTree,
    ParentLink, Problem, Solution, SolvedVia, TaskId, TaskStatus,
};
use crate::error::SynthResult;
use crate::oracle::Oracle;
use crate::rules::{RuleCatalog, RuleContext};
use crate::search::config::SearchConfig;
use crate::search::cost::{CostMetric, priority};
use crate::search::events::{Budget, SearchEvent, SearchObserver, TracingObserver};
use crate::search::result::{SearchOutcome, SearchStatistics, SynthesisResult};
use crate::search::worklist::Worklist;

/// Synthesis driver bound to a rule catalog and an oracle
pub struct SearchEngine<'a> {
    catalog: &'a RuleCatalog,
    oracle: &'a Oracle,
    config: SearchConfig,
}

impl<'a> SearchEngine<'a> {
    pub fn new(catalog: &'a RuleCatalog, oracle: &'a Oracle) -> Self {
        Self {
            catalog,
            oracle,
            config: SearchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn catalog(&self) -> &RuleCatalog {
        self.catalog
    }

    pub fn oracle(&self) -> &Oracle {
        self.oracle
    }

    /// Run a synthesis, reporting events through `tracing`
    pub fn synthesize(&self, problem: &Problem) -> SynthResult<SynthesisResult> {
        self.synthesize_with(problem, &mut TracingObserver)
    }

    /// Run a synthesis, reporting every state change to `observer`
    ///
    /// Errors only when a rule breaks the alternative contract. Running out
    /// of alternatives or budget yields the placeholder for `problem`.
    pub fn synthesize_with(
        &self,
        problem: &Problem,
        observer: &mut dyn SearchObserver,
    ) -> SynthResult<SynthesisResult> {
        let start = Instant::now();
        let oracle_before = self.oracle.statistics();
        let ctx = RuleContext::new(self.oracle);

        let mut run = Run::new(problem.clone(), self.config.cost_metric, observer);
        let outcome = loop {
            if run.tree.root_task().is_solved() {
                break SearchOutcome::Solved;
            }
            let Some(task) = run.worklist.pop() else {
                break SearchOutcome::Exhausted;
            };
            if run.is_stale(task) {
                run.stats.stale_skipped += 1;
                run.emit(SearchEvent::TaskSkipped { task });
                continue;
            }
            if let Some(budget) = self.exceeded_budget(start, run.stats.expansions) {
                run.emit(SearchEvent::BudgetExceeded { budget });
                break SearchOutcome::BudgetExceeded;
            }
            run.expand(task, self.catalog, &ctx)?;
        };
        run.worklist.clear();

        let solution = match outcome {
            SearchOutcome::Solved => run.tree.root_solution().cloned(),
            SearchOutcome::Exhausted | SearchOutcome::BudgetExceeded => None,
        }
        .unwrap_or_else(|| Solution::choose(problem));

        run.stats.elapsed_time = start.elapsed();
        run.stats.oracle = self.oracle.statistics().since(&oracle_before);
        let expansions = run.stats.expansions;
        run.emit(SearchEvent::RunFinished {
            outcome,
            expansions,
        });

        Ok(SynthesisResult {
            problem: problem.clone(),
            solution,
            tree: run.tree,
            outcome,
            statistics: run.stats,
        })
    }

    fn exceeded_budget(&self, start: Instant, expansions: u64) -> Option<Budget> {
        if let Some(limit) = self.config.max_expansions {
            if expansions >= limit {
                return Some(Budget::Expansions(limit));
            }
        }
        if let Some(limit) = self.config.timeout {
            if start.elapsed() >= limit {
                return Some(Budget::Timeout(limit));
            }
        }
        None
    }
}

/// Synthesize with the default configuration, which has no time or
/// expansion budget
pub fn synthesize(
    problem: &Problem,
    catalog: &RuleCatalog,
    oracle: &Oracle,
) -> SynthResult<(Solution, DerivationTree)> {
    SearchEngine::new(catalog, oracle)
        .synthesize(problem)
        .map(SynthesisResult::into_parts)
}

/// State owned by a single run
struct Run<'o> {
    tree: DerivationTree,
    worklist: Worklist,
    groups: BTreeMap<AlternativeId, AndGroup>,
    stats: SearchStatistics,
    metric: CostMetric,
    observer: &'o mut dyn SearchObserver,
}

impl<'o> Run<'o> {
    fn new(problem: Problem, metric: CostMetric, observer: &'o mut dyn SearchObserver) -> Self {
        let root_priority = priority(&problem, 0, metric);
        let tree = DerivationTree::new(problem, root_priority);
        let root = tree.root();
        let mut worklist = Worklist::new();
        worklist.push(root, root_priority);

        let mut run = Self {
            tree,
            worklist,
            groups: BTreeMap::new(),
            stats: SearchStatistics {
                tasks_created: 1,
                ..SearchStatistics::default()
            },
            metric,
            observer,
        };
        run.emit(SearchEvent::TaskCreated {
            task: root,
            parent: None,
            priority: root_priority,
            dormant: false,
        });
        run
    }

    fn emit(&mut self, event: SearchEvent) {
        self.observer.on_event(&event, &self.tree);
    }

    /// Solved, solved through an ancestor, or otherwise not awaiting expansion
    fn is_stale(&self, task: TaskId) -> bool {
        self.tree.is_settled(task)
            || self
                .tree
                .task(task)
                .map_or(true, |t| t.status() != TaskStatus::Pending)
    }

    fn expand(&mut self, id: TaskId, catalog: &RuleCatalog, ctx: &RuleContext<'_>) -> SynthResult<()> {
        let Some(problem) = self.tree.task(id).map(|t| t.problem.clone()) else {
            return Ok(());
        };
        let alternatives = catalog.alternatives(&problem, ctx);
        for alternative in &alternatives {
            alternative.check_contract()?;
        }

        self.stats.expansions += 1;
        self.stats.alternatives += alternatives.len() as u64;
        self.tree.mark_expanded(id);
        let count = alternatives.len();

        if alternatives.is_empty() {
            self.emit(SearchEvent::TaskExpanded {
                task: id,
                alternatives: 0,
            });
            self.stats.placeholders += 1;
            self.solve(id, Solution::choose(&problem), SolvedVia::Placeholder);
            return Ok(());
        }

        // Once an immediate alternative exists the remaining ones are only
        // recorded: their subtasks stay dormant and no group is formed.
        let decided = alternatives.iter().any(|a| a.is_immediate());
        let mut winner: Option<(AlternativeId, Solution)> = None;

        for alternative in alternatives {
            let immediate = alternative.is_immediate();
            let aid = self.tree.add_alternative(
                id,
                &alternative.rule,
                &alternative.description,
                immediate,
            );
            match alternative.outcome {
                AlternativeOutcome::Solved(solution) => {
                    if winner.is_none() {
                        winner = Some((aid, solution));
                    }
                }
                AlternativeOutcome::Decompose {
                    subproblems,
                    builder,
                } => {
                    let subtasks: Vec<TaskId> = subproblems
                        .into_iter()
                        .enumerate()
                        .map(|(index, sub)| self.add_subtask(id, aid, index, sub, decided))
                        .collect();
                    if !decided {
                        self.groups
                            .insert(aid, AndGroup::new(aid, id, subtasks, builder));
                    }
                }
            }
        }

        self.emit(SearchEvent::TaskExpanded {
            task: id,
            alternatives: count,
        });

        if let Some((aid, solution)) = winner {
            self.stats.immediate_solutions += 1;
            self.solve(id, solution, SolvedVia::Immediate(aid));
        }
        Ok(())
    }

    fn add_subtask(
        &mut self,
        parent: TaskId,
        alternative: AlternativeId,
        index: usize,
        problem: Problem,
        dormant: bool,
    ) -> TaskId {
        let depth = self.tree.task(parent).map_or(0, |t| t.depth) + 1;
        let task_priority = priority(&problem, depth, self.metric);
        let status = if dormant {
            TaskStatus::Dormant
        } else {
            TaskStatus::Pending
        };
        let link = ParentLink {
            task: parent,
            alternative,
            index,
        };
        let id = self.tree.add_task(problem, link, task_priority, status);

        self.stats.tasks_created += 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);
        if dormant {
            self.stats.dormant_tasks += 1;
        } else {
            self.worklist.push(id, task_priority);
        }
        self.emit(SearchEvent::TaskCreated {
            task: id,
            parent: Some(parent),
            priority: task_priority,
            dormant,
        });
        id
    }

    /// Mark `id` solved and propagate through parent groups
    fn solve(&mut self, id: TaskId, solution: Solution, via: SolvedVia) {
        let mut next = Some((id, solution, via));
        while let Some((task, solution, via)) = next.take() {
            if !self.tree.mark_solved(task, solution.clone(), via) {
                return;
            }
            self.emit(SearchEvent::TaskSolved { task, via });

            let Some(link) = self.tree.task(task).and_then(|t| t.parent) else {
                return;
            };
            if self.tree.task(link.task).map_or(true, |t| t.is_solved()) {
                return;
            }
            let Some(group) = self.groups.get_mut(&link.alternative) else {
                return;
            };
            match group.contribute(link.index, solution) {
                Contribution::Complete(parent_solution) => {
                    self.stats.groups_completed += 1;
                    next = Some((
                        link.task,
                        parent_solution,
                        SolvedVia::Group(link.alternative),
                    ));
                }
                Contribution::Rejected => {
                    self.stats.groups_rejected += 1;
                    self.tree
                        .set_alternative_state(link.alternative, AlternativeState::Rejected);
                    self.emit(SearchEvent::GroupRejected {
                        task: link.task,
                        alternative: link.alternative,
                    });
                }
                Contribution::Incomplete | Contribution::Ignored => {}
            }
        }
    }
}
