use std::collections::BTreeMap;

use crate::logger::ansi;

/// A step schedule over training iterations.
///
/// Each entry gives the value that takes effect at that iteration and stays in
/// force until the next entry. Used for iteration-indexed learning rate and
/// momentum overrides.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepSchedule {
    steps: BTreeMap<usize, f32>,
}

impl StepSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: impl IntoIterator<Item = (usize, f32)>) -> Self {
        Self { steps: steps.into_iter().collect() }
    }

    /// Adds a step, replacing any existing value at the same iteration.
    pub fn with(mut self, iteration: usize, value: f32) -> Self {
        self.steps.insert(iteration, value);
        self
    }

    pub fn insert(&mut self, iteration: usize, value: f32) {
        self.steps.insert(iteration, value);
    }

    /// The value in force at `iteration`, i.e. the value attached to the
    /// greatest step at or before it. `None` before the first step.
    pub fn value_at(&self, iteration: usize) -> Option<f32> {
        self.steps.range(..=iteration).next_back().map(|(_, v)| *v)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn colourful(&self) -> String {
        let steps = self
            .steps
            .iter()
            .map(|(i, v)| format!("{} -> {}", ansi(i, 31), ansi(v, 31)))
            .collect::<Vec<_>>()
            .join(", ");

        format!("step schedule [{steps}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_picks_most_recent_step() {
        let schedule = StepSchedule::from_steps([(0, 0.1), (100, 0.01), (200, 0.001)]);

        assert_eq!(schedule.value_at(0), Some(0.1));
        assert_eq!(schedule.value_at(99), Some(0.1));
        assert_eq!(schedule.value_at(100), Some(0.01));
        assert_eq!(schedule.value_at(150), Some(0.01));
        assert_eq!(schedule.value_at(1000), Some(0.001));
    }

    #[test]
    fn lookup_before_first_step() {
        let schedule = StepSchedule::new().with(10, 0.5);

        assert_eq!(schedule.value_at(9), None);
        assert_eq!(schedule.value_at(10), Some(0.5));
    }

    #[test]
    fn later_insert_replaces_step() {
        let mut schedule = StepSchedule::from_steps([(5, 1.0)]);
        schedule.insert(5, 2.0);

        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.value_at(5), Some(2.0));
    }
}
