use crate::error::{MaterializeError, Result};
use dnpath_core::{
    parse, plan, ActionKind, ActionRecord, BuildPlan, DirectoryClient, DirectoryError, PathSegment,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Materialization flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializeOptions {
    /// Report what would be created without calling `create_container`
    pub dry_run: bool,
    /// Only the terminal failure is logged above debug level
    pub quiet: bool,
}

/// Result of one materialization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializeOutcome {
    pub run_id: Uuid,
    pub root: String,
    /// Deepest prefix known to exist (or, in dry-run, that would exist)
    pub final_path: String,
    pub actions: Vec<ActionRecord>,
    pub dry_run: bool,
    pub duration_ms: u64,
}

impl MaterializeOutcome {
    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind == kind).count()
    }

    pub fn kinds(&self) -> Vec<ActionKind> {
        self.actions.iter().map(|a| a.kind).collect()
    }

    /// Every segment was placed (no skip below the final path)
    pub fn is_complete(&self) -> bool {
        self.actions
            .iter()
            .all(|a| matches!(a.kind, ActionKind::Exists | ActionKind::Created))
    }
}

/// Mutable accumulator owned by one run
struct TraversalState {
    current_path: String,
    actions: Vec<ActionRecord>,
    /// Raw token of a skipped non-container; nothing below it is visited
    halted_at: Option<String>,
}

impl TraversalState {
    fn new(root: &str) -> Self {
        Self {
            current_path: root.to_string(),
            actions: Vec::new(),
            halted_at: None,
        }
    }

    fn advance(&mut self, record: ActionRecord) {
        self.current_path = record.dn.clone();
        self.actions.push(record);
    }
}

/// Creates the missing containers of a DN, parents first
///
/// Segments are processed strictly in plan order; each directory call is
/// awaited before the next segment is considered.
pub struct Materializer {
    client: Arc<dyn DirectoryClient>,
    options: MaterializeOptions,
}

impl Materializer {
    pub fn new(client: Arc<dyn DirectoryClient>, options: MaterializeOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> MaterializeOptions {
        self.options
    }

    /// Parse, plan and materialize `path`
    pub async fn ensure_path(&self, path: &str) -> Result<MaterializeOutcome> {
        let parsed = parse(path)?;
        let plan = plan(&parsed);
        self.materialize(&plan).await
    }

    /// Walk `plan`, creating missing containers
    pub async fn materialize(&self, plan: &BuildPlan) -> Result<MaterializeOutcome> {
        let run_id = Uuid::new_v4();
        let span = info_span!("materialize", %run_id, root = plan.root());

        self.run(run_id, plan).instrument(span).await
    }

    async fn run(&self, run_id: Uuid, plan: &BuildPlan) -> Result<MaterializeOutcome> {
        let start_time = Instant::now();
        let mut state = TraversalState::new(plan.root());

        if plan.is_empty() {
            debug!("Root-only path {}, nothing to materialize", plan.root());
        }

        for (index, segment) in plan.iter().enumerate() {
            if let Some(skipped) = &state.halted_at {
                let dn = plan.dn_of(index).unwrap_or_else(|| segment.raw.clone());
                let record = ActionRecord::new(segment.clone(), ActionKind::ParentMissing, dn)
                    .with_detail(format!("ancestor {} does not exist", skipped));
                self.log_action(&record);
                state.actions.push(record);
                continue;
            }

            let candidate = segment.dn_under(&state.current_path);

            let exists = match self.client.exists(&candidate).await {
                Ok(exists) => exists,
                Err(e) => return Err(self.abort(state, segment, e)),
            };

            if exists {
                let record = ActionRecord::new(segment.clone(), ActionKind::Exists, candidate);
                self.log_action(&record);
                state.advance(record);
                continue;
            }

            if !segment.is_container() {
                let record =
                    ActionRecord::new(segment.clone(), ActionKind::UnsupportedSkip, candidate)
                        .with_detail("creation of non-container objects is not supported");
                self.log_action(&record);
                state.halted_at = Some(segment.raw.clone());
                state.actions.push(record);
                continue;
            }

            if self.options.dry_run {
                let record =
                    ActionRecord::new(segment.clone(), ActionKind::Created, candidate).simulated();
                self.log_action(&record);
                state.advance(record);
                continue;
            }

            match self
                .client
                .create_container(&segment.name, &state.current_path)
                .await
            {
                Ok(()) => {
                    let record = ActionRecord::new(segment.clone(), ActionKind::Created, candidate);
                    self.log_action(&record);
                    state.advance(record);
                }
                Err(e) => return Err(self.abort(state, segment, e)),
            }
        }

        let outcome = MaterializeOutcome {
            run_id,
            root: plan.root().to_string(),
            final_path: state.current_path,
            actions: state.actions,
            dry_run: self.options.dry_run,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        if !self.options.quiet {
            let skipped = outcome.count(ActionKind::UnsupportedSkip)
                + outcome.count(ActionKind::ParentMissing);
            info!(
                "Materialized {} ({} created, {} existing, {} skipped) in {}ms",
                outcome.final_path,
                outcome.count(ActionKind::Created),
                outcome.count(ActionKind::Exists),
                skipped,
                outcome.duration_ms
            );
        }

        Ok(outcome)
    }

    /// Record the failure and build the error surfaced to the caller
    fn abort(
        &self,
        mut state: TraversalState,
        segment: &PathSegment,
        source: DirectoryError,
    ) -> MaterializeError {
        let candidate = segment.dn_under(&state.current_path);
        error!(
            "Failed to materialize {} under {}: {}",
            segment, state.current_path, source
        );

        state.actions.push(
            ActionRecord::new(segment.clone(), ActionKind::Failed, candidate)
                .with_detail(source.to_string()),
        );

        MaterializeError::SegmentFailed {
            segment: segment.clone(),
            prefix: state.current_path,
            source,
            actions: state.actions,
        }
    }

    fn log_action(&self, record: &ActionRecord) {
        let suffix = if record.simulated { " (dry-run)" } else { "" };
        if self.options.quiet {
            debug!("{}: {}{}", record.kind, record.dn, suffix);
            return;
        }
        match record.kind {
            ActionKind::UnsupportedSkip | ActionKind::ParentMissing => {
                warn!("{}: {}{}", record.kind, record.dn, suffix)
            }
            _ => info!("{}: {}{}", record.kind, record.dn, suffix),
        }
    }
}
