//! Execution plan: the ordered subset of canonical steps selected for a run.

use std::collections::HashSet;
use std::fmt;

use tracing::warn;

use crate::config::StepsSpec;

use super::step::{PipelineArtifact, Step};

/// The ordered subset of the canonical step list selected for one run.
///
/// Computed once from `execute_steps`, immutable thereafter. Iteration is
/// always in canonical dependency order, regardless of the order steps were
/// requested in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    steps: Vec<Step>,
}

impl ExecutionPlan {
    /// Resolves a step-selection spec against the canonical step list.
    ///
    /// Unrecognized names are skipped with a warning, never an error: a typo
    /// or a step from a future pipeline version must not crash the whole
    /// run. An empty result is a valid no-op plan.
    pub fn resolve(spec: &StepsSpec) -> ExecutionPlan {
        let requested = spec.names();

        for name in &requested {
            if Step::from_name(name).is_none() {
                warn!(step = %name, "ignoring unrecognized step in execute_steps");
            }
        }

        let steps = Step::CANONICAL_ORDER
            .into_iter()
            .filter(|step| requested.iter().any(|name| name == step.id()))
            .collect();

        ExecutionPlan { steps }
    }

    /// The selected steps, in canonical order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Iterates the selected steps in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Step> + '_ {
        self.steps.iter().copied()
    }

    /// Number of selected steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when no steps were selected; the run is then a no-op.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Declared inputs of selected steps that no earlier selected step
    /// produces.
    ///
    /// Such inputs are not an error: they are assumed to exist in the
    /// tracking backend from a previous run. Surfacing them lets the
    /// orchestrator log what the plan implicitly relies on.
    pub fn unsatisfied_inputs(&self) -> Vec<(Step, PipelineArtifact)> {
        let mut produced: HashSet<PipelineArtifact> = HashSet::new();
        let mut missing = Vec::new();

        for step in &self.steps {
            for input in step.inputs() {
                if !produced.contains(input) {
                    missing.push((*step, *input));
                }
            }
            produced.extend(step.outputs());
        }

        missing
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.steps.iter().map(|step| step.id()).collect();
        write!(f, "{}", ids.join(", "))
    }
}
