use crate::data::{
    Attribution, Availability, Dataset, Exam, Proctor, RoomConstraint, SessionId,
};
use crate::error::StoreError;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

/// Data access the engine depends on, so runs can be exercised without a database.
pub trait SchedulingStore: Send + Sync {
    fn active_session(&self) -> Result<Option<SessionId>, StoreError>;
    fn exams(&self, session_id: SessionId) -> Result<Vec<Exam>, StoreError>;
    /// Proctors with their record for `session_id`.
    fn proctors(&self, session_id: SessionId) -> Result<Vec<Proctor>, StoreError>;
    fn availabilities(&self, session_id: SessionId) -> Result<Vec<Availability>, StoreError>;
    fn room_constraints(&self) -> Result<Vec<RoomConstraint>, StoreError>;
    fn pre_assignments(&self, session_id: SessionId) -> Result<Vec<Attribution>, StoreError>;
    fn attributions(&self, session_id: SessionId) -> Result<Vec<Attribution>, StoreError>;
    /// Swaps every non-pre-assigned row of the session for `rows` in one step.
    /// Either all rows are replaced or nothing changes.
    fn replace_auto_assignments(
        &self,
        session_id: SessionId,
        rows: Vec<Attribution>,
    ) -> Result<(), StoreError>;
}

/// Process-local store backed by a [`Dataset`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<Dataset>,
}

impl InMemoryStore {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            state: Mutex::new(dataset),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Dataset>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn known_session(dataset: &Dataset, session_id: SessionId) -> Result<(), StoreError> {
        let sessions: BTreeSet<SessionId> = dataset
            .exams
            .iter()
            .map(|e| e.session_id)
            .chain(dataset.active_session)
            .collect();
        if sessions.contains(&session_id) {
            Ok(())
        } else {
            Err(StoreError::UnknownSession(session_id))
        }
    }

    pub fn snapshot(&self) -> Result<Dataset, StoreError> {
        Ok(self.lock()?.clone())
    }
}

impl SchedulingStore for InMemoryStore {
    fn active_session(&self) -> Result<Option<SessionId>, StoreError> {
        Ok(self.lock()?.active_session)
    }

    fn exams(&self, session_id: SessionId) -> Result<Vec<Exam>, StoreError> {
        let state = self.lock()?;
        Self::known_session(&state, session_id)?;
        Ok(state
            .exams
            .iter()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect())
    }

    fn proctors(&self, session_id: SessionId) -> Result<Vec<Proctor>, StoreError> {
        let state = self.lock()?;
        Self::known_session(&state, session_id)?;
        Ok(state
            .proctors
            .iter()
            .map(|p| p.for_session(session_id))
            .collect())
    }

    fn availabilities(&self, session_id: SessionId) -> Result<Vec<Availability>, StoreError> {
        let state = self.lock()?;
        Self::known_session(&state, session_id)?;
        Ok(state
            .availabilities
            .iter()
            .filter(|a| a.session_id.is_none_or(|id| id == session_id))
            .cloned()
            .collect())
    }

    fn room_constraints(&self) -> Result<Vec<RoomConstraint>, StoreError> {
        Ok(self.lock()?.room_constraints.clone())
    }

    fn pre_assignments(&self, session_id: SessionId) -> Result<Vec<Attribution>, StoreError> {
        Ok(self
            .attributions(session_id)?
            .into_iter()
            .filter(|a| a.is_pre_assigned)
            .collect())
    }

    fn attributions(&self, session_id: SessionId) -> Result<Vec<Attribution>, StoreError> {
        let state = self.lock()?;
        Self::known_session(&state, session_id)?;
        Ok(state
            .attributions
            .iter()
            .filter(|a| a.session_id == session_id)
            .cloned()
            .collect())
    }

    fn replace_auto_assignments(
        &self,
        session_id: SessionId,
        rows: Vec<Attribution>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        Self::known_session(&state, session_id)?;
        if let Some(row) = rows
            .iter()
            .find(|r| r.session_id != session_id || r.is_pre_assigned)
        {
            return Err(StoreError::Write(format!(
                "row for exam {} / proctor {} is not an automatic row of session {}",
                row.exam_id, row.proctor_id, session_id
            )));
        }

        state
            .attributions
            .retain(|a| a.session_id != session_id || a.is_pre_assigned);
        state.attributions.extend(rows);
        Ok(())
    }
}
