use crate::data::{Availability, ProctorId};
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashSet;

type SlotKey = (ProctorId, NaiveDate, NaiveTime, NaiveTime);

/// Constant-time lookup of "proctor declared themselves available for this exact slot".
///
/// Slots match on the exact (date, start, end) tuple; overlapping but different
/// slots do not count.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityIndex {
    slots: HashSet<SlotKey>,
}

impl AvailabilityIndex {
    pub fn new(availabilities: &[Availability]) -> Self {
        let slots = availabilities
            .iter()
            .filter(|a| a.available)
            .map(|a| (a.proctor_id, a.date, a.start, a.end))
            .collect();
        Self { slots }
    }

    pub fn is_available(
        &self,
        proctor_id: ProctorId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> bool {
        self.slots.contains(&(proctor_id, date, start, end))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).expect("valid date")
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    fn availability(proctor_id: ProctorId, available: bool) -> Availability {
        Availability {
            proctor_id,
            session_id: None,
            date: date(),
            start: time(8, 30),
            end: time(11, 30),
            available,
            mandatory: false,
            exam_name: None,
            comment: None,
        }
    }

    #[test]
    fn only_available_rows_are_indexed() {
        let index = AvailabilityIndex::new(&[availability(1, true), availability(2, false)]);
        assert_eq!(index.len(), 1);
        assert!(index.is_available(1, date(), time(8, 30), time(11, 30)));
        assert!(!index.is_available(2, date(), time(8, 30), time(11, 30)));
    }

    #[test]
    fn requires_exact_slot() {
        let index = AvailabilityIndex::new(&[availability(1, true)]);
        assert!(!index.is_available(1, date(), time(8, 0), time(11, 30)));
        assert!(!index.is_available(1, date(), time(8, 30), time(12, 0)));
        assert!(!index.is_available(1, date().succ_opt().expect("next day"), time(8, 30), time(11, 30)));
    }
}
