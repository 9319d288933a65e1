use crate::config::EngineConfig;
use crate::data::{RunResult, SessionId};
use crate::error::{RunError, StoreError};
use crate::solver::{self, AssignmentPlan, SessionInputs};
use crate::store::SchedulingStore;
use log::{debug, error, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Steps of a single run. Every run starts from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    FetchingInputs,
    Assigning,
    /// Non-pre-assigned rows are swapped in one store call.
    Persisting,
    Done,
    Failed,
}

struct PhaseLog {
    session_id: SessionId,
    phase: RunPhase,
}

impl PhaseLog {
    fn start(session_id: SessionId) -> Self {
        Self {
            session_id,
            phase: RunPhase::Idle,
        }
    }

    fn enter(&mut self, next: RunPhase) {
        debug!(
            "Session {} run: {:?} -> {:?}",
            self.session_id, self.phase, next
        );
        self.phase = next;
    }
}

/// Runs the assignment engine against a store, one run at a time per session.
pub struct Runner<S> {
    store: Arc<S>,
    config: EngineConfig,
    session_locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl<S> Runner<S>
where
    S: SchedulingStore,
{
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs for the store's active session.
    pub fn run_active(&self) -> RunResult {
        let session_id = match self.store.active_session() {
            Ok(Some(session_id)) => session_id,
            Ok(None) => return failed(RunError::MissingSession),
            Err(source) => {
                return failed(RunError::Fetch {
                    dataset: "active session",
                    source,
                });
            }
        };
        self.run(session_id)
    }

    /// Runs for `session_id`; fatal errors become an unsuccessful result.
    pub fn run(&self, session_id: SessionId) -> RunResult {
        match self.run_checked(session_id) {
            Ok(plan) => plan.into_result(),
            Err(err) => failed(err),
        }
    }

    /// Same as [`Runner::run`] but hands back the plan or the typed error.
    pub fn run_checked(&self, session_id: SessionId) -> Result<AssignmentPlan, RunError> {
        let session_lock = self.session_lock(session_id)?;
        let _guard = session_lock
            .lock()
            .map_err(|_| RunError::LockPoisoned(session_id))?;

        let mut phase = PhaseLog::start(session_id);
        let outcome = self.execute(session_id, &mut phase);
        match &outcome {
            Ok(_) => phase.enter(RunPhase::Done),
            Err(_) => phase.enter(RunPhase::Failed),
        }
        outcome
    }

    fn execute(
        &self,
        session_id: SessionId,
        phase: &mut PhaseLog,
    ) -> Result<AssignmentPlan, RunError> {
        phase.enter(RunPhase::FetchingInputs);
        let inputs = self.fetch_inputs(session_id)?;

        phase.enter(RunPhase::Assigning);
        let plan = solver::solve(&inputs, &self.config);

        phase.enter(RunPhase::Persisting);
        let rows = plan.new_attributions().cloned().collect();
        self.store
            .replace_auto_assignments(session_id, rows)
            .map_err(RunError::Persist)?;

        Ok(plan)
    }

    fn fetch_inputs(&self, session_id: SessionId) -> Result<SessionInputs, RunError> {
        fn fetch<T>(
            dataset: &'static str,
            result: Result<T, StoreError>,
        ) -> Result<T, RunError> {
            result.map_err(|source| RunError::Fetch { dataset, source })
        }

        let inputs = SessionInputs {
            session_id,
            exams: fetch("exams", self.store.exams(session_id))?,
            proctors: fetch("proctors", self.store.proctors(session_id))?,
            availabilities: fetch("availabilities", self.store.availabilities(session_id))?,
            room_constraints: Some(fetch("room constraints", self.store.room_constraints())?),
            pre_assignments: fetch("pre-assignments", self.store.pre_assignments(session_id))?,
        };
        info!(
            "Loaded session {}: {} exams, {} proctors",
            session_id,
            inputs.exams.len(),
            inputs.proctors.len()
        );
        Ok(inputs)
    }

    fn session_lock(&self, session_id: SessionId) -> Result<Arc<Mutex<()>>, RunError> {
        let mut locks = self
            .session_locks
            .lock()
            .map_err(|_| RunError::LockPoisoned(session_id))?;
        Ok(Arc::clone(locks.entry(session_id).or_default()))
    }
}

fn failed(err: RunError) -> RunResult {
    error!("Assignment run failed: {}", err);
    RunResult::failed(err.to_string())
}
