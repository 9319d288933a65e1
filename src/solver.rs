use crate::availability::AvailabilityIndex;
use crate::config::EngineConfig;
use crate::constraints::{ConstraintEvaluator, NonCasualRule};
use crate::data::{
    Attribution, Availability, Exam, ExamId, Proctor, ProctorId, RoomConstraint, RunResult,
    SessionId, UnderstaffedExam,
};
use crate::requirement::RequirementCalculator;
use crate::workload::{Candidate, LoadMap, WorkloadBalancer};
use itertools::Itertools;
use log::{info, trace, warn};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Everything one run reads for a session.
#[derive(Debug, Clone, Default)]
pub struct SessionInputs {
    pub session_id: SessionId,
    pub exams: Vec<Exam>,
    pub proctors: Vec<Proctor>,
    pub availabilities: Vec<Availability>,
    /// `None` when room constraints are not loaded; exams then use their stored count.
    pub room_constraints: Option<Vec<RoomConstraint>>,
    /// Existing pre-assigned rows; other rows are ignored.
    pub pre_assignments: Vec<Attribution>,
}

/// Outcome of one pass over a session's exams, before anything is persisted.
#[derive(Debug, Clone, Default)]
pub struct AssignmentPlan {
    pub session_id: SessionId,
    /// Pre-assigned rows carried over, followed by the engine's new rows.
    pub attributions: Vec<Attribution>,
    pub total_exams: usize,
    pub assigned_exams: usize,
    pub understaffed: Vec<UnderstaffedExam>,
    pub warnings: Vec<String>,
    pub loads: LoadMap,
}

impl AssignmentPlan {
    pub fn new_attributions(&self) -> impl Iterator<Item = &Attribution> {
        self.attributions.iter().filter(|a| !a.is_pre_assigned)
    }

    pub fn proctors_for(&self, exam_id: ExamId) -> Vec<ProctorId> {
        self.attributions
            .iter()
            .filter(|a| a.exam_id == exam_id)
            .map(|a| a.proctor_id)
            .collect()
    }

    pub fn into_result(self) -> RunResult {
        let created_assignments = self.new_attributions().count();
        RunResult {
            success: true,
            total_exams: self.total_exams,
            assigned_exams: self.assigned_exams,
            unassigned_exams: self.understaffed.iter().map(ToString::to_string).collect(),
            warnings: self.warnings,
            created_assignments,
            proctor_loads: self.loads,
        }
    }
}

/// Assigns proctors to every active exam of the session in (date, start) order.
pub fn solve(input: &SessionInputs, config: &EngineConfig) -> AssignmentPlan {
    let start_time = Instant::now();
    info!(
        "Assigning session {}: {} exams, {} proctors, {} availabilities, {} pre-assignments",
        input.session_id,
        input.exams.len(),
        input.proctors.len(),
        input.availabilities.len(),
        input.pre_assignments.len()
    );

    // lookups
    let calculator = match &input.room_constraints {
        Some(constraints) => RequirementCalculator::new(constraints),
        None => RequirementCalculator::unloaded(),
    };
    let availability = AvailabilityIndex::new(&input.availabilities);
    let evaluator = ConstraintEvaluator::new(config);
    let proctor_map: HashMap<ProctorId, &Proctor> =
        input.proctors.iter().map(|p| (p.id, p)).collect();
    let exam_ids: HashSet<ExamId> = input.exams.iter().map(|e| e.id).collect();

    let mut warnings = Vec::new();

    let (known, unknown): (Vec<&Attribution>, Vec<&Attribution>) = input
        .pre_assignments
        .iter()
        .filter(|a| a.is_pre_assigned)
        .partition(|a| exam_ids.contains(&a.exam_id) && proctor_map.contains_key(&a.proctor_id));
    for row in &unknown {
        warnings.push(format!(
            "Ignored pre-assignment of proctor {} to exam {}: unknown exam or proctor",
            row.proctor_id, row.exam_id
        ));
    }
    let pre_by_exam: HashMap<ExamId, Vec<&Attribution>> = known
        .into_iter()
        .map(|a| (a.exam_id, a))
        .into_group_map();

    warnings.extend(roster_warnings(&input.proctors));

    let candidates: Vec<Candidate> = input
        .proctors
        .iter()
        .filter(|p| p.session.active)
        .sorted_by_key(|p| p.id)
        .map(|proctor| Candidate {
            proctor,
            quota: config.quota_for(proctor),
            casual: evaluator.is_casual(proctor),
        })
        .collect();
    trace!(
        "{} of {} proctors are active candidates",
        candidates.len(),
        input.proctors.len()
    );

    let exams: Vec<&Exam> = input
        .exams
        .iter()
        .filter(|e| e.active)
        .sorted_by_key(|e| (e.date, e.start, e.id))
        .collect();

    let mut balancer = WorkloadBalancer::seeded(input.proctors.iter().map(|p| p.id));
    let mut plan = AssignmentPlan {
        session_id: input.session_id,
        total_exams: exams.len(),
        ..AssignmentPlan::default()
    };

    for exam in exams {
        let pre_rows = pre_by_exam.get(&exam.id).map(Vec::as_slice).unwrap_or(&[]);
        let pre_ids: HashSet<ProctorId> = pre_rows.iter().map(|a| a.proctor_id).collect();
        plan.attributions
            .extend(pre_rows.iter().map(|row| (*row).clone()));

        let pre_assigned = exam.pre_assigned_count.max(pre_ids.len() as u32);
        let need = calculator.residual_need_given(exam, pre_assigned);
        trace!(
            "Exam {} ({} {} {}): theoretical {}, residual need {}",
            exam.id,
            exam.subject,
            exam.date,
            exam.time_range(),
            calculator.theoretical_proctors(exam),
            need
        );
        if need == 0 {
            plan.assigned_exams += 1;
            continue;
        }

        let baseline =
            evaluator.non_casual_count(pre_ids.iter().filter_map(|id| proctor_map.get(id).copied()));
        let mut rule = NonCasualRule::new(calculator.min_non_casual(exam), baseline);

        let pool = candidates.iter().copied().filter(|c| {
            if !availability.is_available(c.proctor.id, exam.date, exam.start, exam.end) {
                return false;
            }
            if evaluator.has_conflict(c.proctor, exam) {
                trace!(
                    "Skipping proctor {} for exam {}: prohibited faculty {:?}",
                    c.proctor.id, exam.id, exam.required_faculty
                );
                return false;
            }
            true
        });
        let picked = balancer.select(
            pool,
            &pre_ids,
            exam.required_type.as_deref(),
            need,
            &mut rule,
        );
        trace!(
            "Exam {} picked {:?}",
            exam.id,
            picked.iter().map(|p| p.id).collect::<Vec<_>>()
        );

        plan.attributions.extend(
            picked
                .iter()
                .map(|p| Attribution::automatic(input.session_id, exam.id, p.id)),
        );

        let shortfall = need - picked.len() as u32;
        if shortfall == 0 {
            plan.assigned_exams += 1;
            continue;
        }

        let entry = UnderstaffedExam {
            exam_id: exam.id,
            subject: exam.subject.clone(),
            date: exam.date,
            time_range: exam.time_range(),
            room: exam.room.clone(),
            shortfall,
        };
        warn!("Under-staffed: {}", entry);
        if picked.is_empty() {
            warnings.push(format!(
                "No eligible proctor found for {} on {} {} ({})",
                exam.subject,
                exam.date.format("%d/%m/%Y"),
                exam.time_range(),
                exam.room
            ));
        }
        plan.understaffed.push(entry);
    }

    plan.warnings = warnings;
    plan.loads = balancer.into_loads();

    info!(
        "Session {} assigned {}/{} exams with {} new assignments in {:.2?}",
        plan.session_id,
        plan.assigned_exams,
        plan.total_exams,
        plan.new_attributions().count(),
        start_time.elapsed()
    );
    plan
}

/// Run-level notices about proctors the engine treats specially.
fn roster_warnings(proctors: &[Proctor]) -> Vec<String> {
    let mut warnings = Vec::new();

    let inactive: Vec<String> = proctors
        .iter()
        .filter(|p| !p.session.active)
        .sorted_by_key(|p| p.id)
        .map(Proctor::display_name)
        .collect();
    if !inactive.is_empty() {
        warnings.push(format!(
            "{} inactive proctor(s) excluded from automatic assignment: {}",
            inactive.len(),
            inactive.join(", ")
        ));
    }

    let restricted: Vec<String> = proctors
        .iter()
        .filter_map(|p| {
            let faculty = p.prohibited_faculty.as_deref()?.trim();
            (!faculty.is_empty()).then(|| format!("{} ({})", p.display_name(), faculty))
        })
        .collect();
    if !restricted.is_empty() {
        warnings.push(format!(
            "{} proctor(s) with a faculty restriction kept off that faculty's exams: {}",
            restricted.len(),
            restricted.join(", ")
        ));
    }

    warnings
}
