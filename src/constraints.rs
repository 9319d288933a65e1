use crate::config::EngineConfig;
use crate::data::{Exam, Proctor};

/// Faculty conflict: the exam names a required faculty and the proctor is barred from it.
pub fn has_faculty_conflict(proctor: &Proctor, exam: &Exam) -> bool {
    match (&exam.required_faculty, &proctor.prohibited_faculty) {
        (Some(required), Some(prohibited)) => !required.is_empty() && required == prohibited,
        _ => false,
    }
}

/// Tracks the minimum-non-casual rule while one exam's slots are being filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonCasualRule {
    minimum: u32,
    non_casual_so_far: u32,
}

impl NonCasualRule {
    /// `baseline` counts non-casual proctors already on the exam (pre-assignments).
    pub fn new(minimum: u32, baseline: u32) -> Self {
        Self {
            minimum,
            non_casual_so_far: baseline,
        }
    }

    pub fn satisfied(&self) -> bool {
        self.non_casual_so_far >= self.minimum
    }

    /// Casual proctors wait until the minimum is reached.
    pub fn admits(&self, casual: bool) -> bool {
        !casual || self.satisfied()
    }

    pub fn record(&mut self, casual: bool) {
        if !casual {
            self.non_casual_so_far += 1;
        }
    }

    pub fn non_casual_so_far(&self) -> u32 {
        self.non_casual_so_far
    }
}

/// Both eligibility predicates, bound to one engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintEvaluator<'a> {
    config: &'a EngineConfig,
}

impl<'a> ConstraintEvaluator<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    pub fn is_casual(&self, proctor: &Proctor) -> bool {
        self.config.is_casual(&proctor.proctor_type)
    }

    pub fn has_conflict(&self, proctor: &Proctor, exam: &Exam) -> bool {
        has_faculty_conflict(proctor, exam)
    }

    /// Non-casual proctors among `proctors`, used to seed a [`NonCasualRule`].
    pub fn non_casual_count<'p>(&self, proctors: impl IntoIterator<Item = &'p Proctor>) -> u32 {
        proctors
            .into_iter()
            .filter(|proctor| !self.is_casual(proctor))
            .count() as u32
    }
}
