use crate::data::{Exam, RoomConstraint};
use std::collections::HashMap;

/// Canonical room key: trimmed, lower-cased, inner whitespace collapsed to one space.
pub fn normalize_room(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn compact_room(name: &str) -> String {
    name.split_whitespace().collect::<String>().to_lowercase()
}

/// Splits an exam's room field into its physical rooms.
pub fn split_rooms(room: &str) -> impl Iterator<Item = &str> {
    room.split([',', ';'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Staffing requirement of one room once defaults are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomRequirement {
    pub proctors: u32,
    pub min_non_casual: u32,
}

impl Default for RoomRequirement {
    fn default() -> Self {
        Self {
            proctors: 1,
            min_non_casual: 1,
        }
    }
}

/// Room constraints keyed by normalized name. A later constraint for the same
/// room replaces an earlier one under both keys.
#[derive(Debug, Clone, Default)]
pub struct RoomConstraintIndex {
    by_name: HashMap<String, RoomRequirement>,
    // "51 A" and "51A" are the same room for admins typing constraints by hand
    by_compact: HashMap<String, RoomRequirement>,
}

impl RoomConstraintIndex {
    pub fn new(constraints: &[RoomConstraint]) -> Self {
        let mut index = Self::default();
        for constraint in constraints {
            let requirement = RoomRequirement {
                proctors: constraint.required_proctors,
                min_non_casual: constraint.min_non_casual.unwrap_or(1),
            };
            index
                .by_name
                .insert(normalize_room(&constraint.room), requirement);
            index
                .by_compact
                .insert(compact_room(&constraint.room), requirement);
        }
        index
    }

    pub fn lookup(&self, room: &str) -> Option<RoomRequirement> {
        self.by_name
            .get(&normalize_room(room))
            .or_else(|| self.by_compact.get(&compact_room(room)))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Computes how many proctors an exam needs.
#[derive(Debug, Clone, Default)]
pub struct RequirementCalculator {
    rooms: Option<RoomConstraintIndex>,
}

impl RequirementCalculator {
    pub fn new(constraints: &[RoomConstraint]) -> Self {
        Self {
            rooms: Some(RoomConstraintIndex::new(constraints)),
        }
    }

    /// A calculator for when room constraints have not been loaded; every exam
    /// falls back to its stored proctor count.
    pub fn unloaded() -> Self {
        Self { rooms: None }
    }

    fn room_requirements<'a>(
        &'a self,
        exam: &'a Exam,
    ) -> Option<impl Iterator<Item = RoomRequirement> + 'a> {
        let index = self.rooms.as_ref()?;
        Some(
            split_rooms(&exam.room)
                .map(move |room| index.lookup(room).unwrap_or_default()),
        )
    }

    /// Sum of each listed room's requirement, 1 for rooms without a constraint.
    pub fn theoretical_proctors(&self, exam: &Exam) -> u32 {
        match self.room_requirements(exam) {
            Some(rooms) => {
                let rooms: Vec<RoomRequirement> = rooms.collect();
                if rooms.is_empty() {
                    exam.required_proctors
                } else {
                    rooms
                        .iter()
                        .map(|requirement| requirement.proctors)
                        .fold(0, u32::saturating_add)
                }
            }
            None => exam.required_proctors,
        }
    }

    /// Minimum non-casual proctors across all of the exam's rooms.
    pub fn min_non_casual(&self, exam: &Exam) -> u32 {
        let listed = split_rooms(&exam.room).count() as u32;
        match self.room_requirements(exam) {
            Some(rooms) if listed > 0 => rooms
                .map(|requirement| requirement.min_non_casual)
                .fold(0, u32::saturating_add),
            _ => listed.max(1),
        }
    }

    /// Proctors still needed once teaching staff, helpers and pre-assignments are netted out.
    pub fn residual_need(&self, exam: &Exam) -> u32 {
        self.residual_need_given(exam, exam.pre_assigned_count)
    }

    /// Same as [`Self::residual_need`] with an explicit pre-assigned count.
    pub fn residual_need_given(&self, exam: &Exam, pre_assigned: u32) -> u32 {
        net_need(
            self.theoretical_proctors(exam),
            exam.teaching_staff_present,
            exam.brought_helpers,
            pre_assigned,
        )
    }
}

/// The one residual-need formula: `max(0, theoretical - staff - helpers - pre-assigned)`.
pub fn net_need(theoretical: u32, teaching_staff: u32, helpers: u32, pre_assigned: u32) -> u32 {
    theoretical
        .saturating_sub(teaching_staff)
        .saturating_sub(helpers)
        .saturating_sub(pre_assigned)
}
