//! A small course-timetabling fixture.
//!
//! Events are placed into (period, room) slots. Hard constraints:
//!
//! - a slot holds at most one event;
//! - events of the same curriculum never share a period.
//!
//! Soft penalties are the per-placement preference penalty plus one point
//! for every pair of same-curriculum events in consecutive periods.
//!
//! # Example
//!
//! ```
//! use seqforge_core::Model;
//! use seqforge_test::timetable::TimetableModel;
//!
//! let model = TimetableModel::generate(6, 4, 2, 3, 7);
//! assert_eq!(model.variable_count(), 6);
//! assert_eq!(model.unassigned_count(), 6);
//! assert_eq!(model.values(0).len(), 8);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seqforge_core::{Info, Model};

/// Where an event is held, with the preference penalty of holding it there.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub period: usize,
    pub room: usize,
    pub penalty: f64,
}

impl Placement {
    fn same_slot(&self, other: &Placement) -> bool {
        self.period == other.period && self.room == other.room
    }
}

#[derive(Clone, Debug)]
pub struct Event {
    pub name: String,
    pub curriculum: usize,
    pub domain: Vec<Placement>,
}

/// Timetabling model over [`Event`]s.
#[derive(Clone, Debug)]
pub struct TimetableModel {
    events: Vec<Event>,
    assigned: Vec<Option<Placement>>,
    best: Option<Vec<Option<Placement>>>,
}

impl TimetableModel {
    pub fn new(events: Vec<Event>) -> Self {
        let n = events.len();
        Self {
            events,
            assigned: vec![None; n],
            best: None,
        }
    }

    /// Generates `events` events over `periods × rooms` slots, split into
    /// `curricula` curricula, with seeded random preference penalties.
    pub fn generate(
        events: usize,
        periods: usize,
        rooms: usize,
        curricula: usize,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let events = (0..events)
            .map(|e| {
                let domain = (0..periods)
                    .flat_map(|period| (0..rooms).map(move |room| (period, room)))
                    .map(|(period, room)| Placement {
                        period,
                        room,
                        penalty: rng.random_range(0..5) as f64,
                    })
                    .collect();
                Event {
                    name: format!("E{}", e),
                    curriculum: e % curricula.max(1),
                    domain,
                }
            })
            .collect();
        Self::new(events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Assigns every event to the first placement free of conflicts.
    pub fn assign_first_fit(&mut self) {
        for variable in 0..self.events.len() {
            let free = self.events[variable]
                .domain
                .iter()
                .find(|p| self.conflicts_in(&self.assigned, variable, p).is_empty())
                .cloned();
            if let Some(placement) = free {
                self.assigned[variable] = Some(placement);
            }
        }
    }

    /// Whether the current assignment violates a hard constraint.
    pub fn has_hard_conflicts(&self) -> bool {
        self.assigned.iter().enumerate().any(|(v, p)| {
            p.as_ref()
                .is_some_and(|p| !self.conflicts_in(&self.assigned, v, p).is_empty())
        })
    }

    fn conflicts_in(
        &self,
        assigned: &[Option<Placement>],
        variable: usize,
        placement: &Placement,
    ) -> Vec<usize> {
        let curriculum = self.events[variable].curriculum;
        assigned
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != variable)
            .filter_map(|(other, p)| p.as_ref().map(|p| (other, p)))
            .filter(|(other, p)| {
                p.same_slot(placement)
                    || (self.events[*other].curriculum == curriculum
                        && p.period == placement.period)
            })
            .map(|(other, _)| other)
            .collect()
    }

    fn total_of(&self, assigned: &[Option<Placement>]) -> f64 {
        let preferences: f64 = assigned.iter().flatten().map(|p| p.penalty).sum();
        let mut adjacent = 0.0;
        for (a, pa) in assigned.iter().enumerate() {
            let Some(pa) = pa else { continue };
            for (b, pb) in assigned.iter().enumerate().skip(a + 1) {
                let Some(pb) = pb else { continue };
                if self.events[a].curriculum == self.events[b].curriculum
                    && pa.period.abs_diff(pb.period) == 1
                {
                    adjacent += 1.0;
                }
            }
        }
        preferences + adjacent
    }

    fn place(&self, assigned: &mut [Option<Placement>], variable: usize, placement: Placement) {
        for other in self.conflicts_in(assigned, variable, &placement) {
            assigned[other] = None;
        }
        assigned[variable] = Some(placement);
    }
}

impl Model for TimetableModel {
    type Value = Placement;

    fn variable_count(&self) -> usize {
        self.events.len()
    }

    fn values(&self, variable: usize) -> &[Placement] {
        &self.events[variable].domain
    }

    fn assignment(&self, variable: usize) -> Option<&Placement> {
        self.assigned[variable].as_ref()
    }

    fn assign(&mut self, variable: usize, value: Placement, _iteration: u64) {
        let mut assigned = std::mem::take(&mut self.assigned);
        self.place(&mut assigned, variable, value);
        self.assigned = assigned;
    }

    fn unassign(&mut self, variable: usize, _iteration: u64) {
        self.assigned[variable] = None;
    }

    fn delta(&self, variable: usize, value: &Placement) -> f64 {
        let mut after = self.assigned.clone();
        self.place(&mut after, variable, value.clone());
        self.total_of(&after) - self.total_of(&self.assigned)
    }

    fn conflict_values(&self, variable: usize, value: &Placement) -> Vec<usize> {
        self.conflicts_in(&self.assigned, variable, value)
    }

    fn swap_delta(&self, a: usize, b: usize) -> Option<f64> {
        let pa = self.assigned[a].as_ref()?;
        let pb = self.assigned[b].as_ref()?;
        let new_a = self.events[a]
            .domain
            .iter()
            .find(|p| p.same_slot(pb))?
            .clone();
        let new_b = self.events[b]
            .domain
            .iter()
            .find(|p| p.same_slot(pa))?
            .clone();

        let mut after = self.assigned.clone();
        after[a] = None;
        after[b] = None;
        if !self.conflicts_in(&after, a, &new_a).is_empty() {
            return None;
        }
        after[a] = Some(new_a);
        if !self.conflicts_in(&after, b, &new_b).is_empty() {
            return None;
        }
        after[b] = Some(new_b);
        Some(self.total_of(&after) - self.total_of(&self.assigned))
    }

    fn unassigned_count(&self) -> usize {
        self.assigned.iter().filter(|p| p.is_none()).count()
    }

    fn total_value(&self) -> f64 {
        self.total_of(&self.assigned)
    }

    fn save_best(&mut self) {
        self.best = Some(self.assigned.clone());
    }

    fn restore_best(&mut self) {
        self.assigned = match &self.best {
            Some(best) => best.clone(),
            None => vec![None; self.events.len()],
        };
    }

    fn clear_best(&mut self) {
        self.best = None;
    }

    fn best_unassigned_count(&self) -> usize {
        match &self.best {
            Some(best) => best.iter().filter(|p| p.is_none()).count(),
            None => self.events.len(),
        }
    }

    fn info(&self) -> Info {
        let mut info = Info::new();
        info.insert(
            "Assigned variables".to_string(),
            format!(
                "{}/{}",
                self.events.len() - self.unassigned_count(),
                self.events.len()
            ),
        );
        info.insert("Total value".to_string(), format!("{}", self.total_value()));
        info
    }

    fn extended_info(&self) -> Info {
        let mut info = self.info();
        let preferences: f64 = self.assigned.iter().flatten().map(|p| p.penalty).sum();
        info.insert("Preferences".to_string(), format!("{}", preferences));
        info
    }
}
