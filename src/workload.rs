use crate::constraints::NonCasualRule;
use crate::data::{Proctor, ProctorId};
use log::trace;
use std::collections::{BTreeMap, HashSet};

/// New assignments per proctor within one run.
pub type LoadMap = BTreeMap<ProctorId, u32>;

/// An eligible proctor for one exam, with the facts the balancer ranks on.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub proctor: &'a Proctor,
    pub quota: u32,
    pub casual: bool,
}

/// Greedy least-loaded selection under per-proctor quotas.
///
/// The load map is owned by the balancer for the duration of a run and handed
/// back with [`WorkloadBalancer::into_loads`].
#[derive(Debug, Clone, Default)]
pub struct WorkloadBalancer {
    loads: LoadMap,
}

impl WorkloadBalancer {
    pub fn new(loads: LoadMap) -> Self {
        Self { loads }
    }

    /// Every proctor starts the run at zero.
    pub fn seeded(proctor_ids: impl IntoIterator<Item = ProctorId>) -> Self {
        Self::new(proctor_ids.into_iter().map(|id| (id, 0)).collect())
    }

    pub fn load(&self, proctor_id: ProctorId) -> u32 {
        self.loads.get(&proctor_id).copied().unwrap_or(0)
    }

    pub fn loads(&self) -> &LoadMap {
        &self.loads
    }

    pub fn into_loads(self) -> LoadMap {
        self.loads
    }

    /// Drops already-selected and saturated candidates, then orders the rest by
    /// load, preferred type first on equal load, then proctor id.
    pub fn rank<'a>(
        &self,
        candidates: impl IntoIterator<Item = Candidate<'a>>,
        already_selected: &HashSet<ProctorId>,
        preferred_type: Option<&str>,
    ) -> Vec<Candidate<'a>> {
        let preferred = preferred_type.map(str::trim).filter(|kind| !kind.is_empty());
        let mut ranked: Vec<Candidate<'a>> = candidates
            .into_iter()
            .filter(|c| !already_selected.contains(&c.proctor.id))
            .filter(|c| self.load(c.proctor.id) < c.quota)
            .collect();
        ranked.sort_by_key(|c| {
            let type_match = preferred
                .is_some_and(|kind| c.proctor.proctor_type.trim().eq_ignore_ascii_case(kind));
            (self.load(c.proctor.id), !type_match, c.proctor.id)
        });
        ranked
    }

    /// Picks up to `need` proctors, honoring the non-casual rule, and charges
    /// each pick to its load.
    pub fn select<'a>(
        &mut self,
        candidates: impl IntoIterator<Item = Candidate<'a>>,
        already_selected: &HashSet<ProctorId>,
        preferred_type: Option<&str>,
        need: u32,
        rule: &mut NonCasualRule,
    ) -> Vec<&'a Proctor> {
        let mut ranked = self.rank(candidates, already_selected, preferred_type);
        let mut picked = Vec::new();

        while (picked.len() as u32) < need {
            let Some(position) = ranked.iter().position(|c| rule.admits(c.casual)) else {
                trace!(
                    "No admissible candidate left ({} ranked, non-casual so far {})",
                    ranked.len(),
                    rule.non_casual_so_far()
                );
                break;
            };
            let chosen = ranked.remove(position);
            rule.record(chosen.casual);
            *self.loads.entry(chosen.proctor.id).or_insert(0) += 1;
            picked.push(chosen.proctor);
        }

        picked
    }
}
