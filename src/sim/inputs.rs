//! External input values and their per-tick history.
use std::collections::HashMap;

use crate::guard::{EdgeSnapshot, GuardEnv};

/// Input name to value; booleans are 0/1.
pub type InputValues = HashMap<String, f64>;

/// Pull accessor for the current external input values, called once when a
/// session starts and once per tick.
pub trait InputSource {
    fn read(&mut self) -> InputValues;
}

impl<F> InputSource for F
where
    F: FnMut() -> InputValues,
{
    fn read(&mut self) -> InputValues {
        self()
    }
}

/// Current and previous value of every declared input, in declaration order.
#[derive(Debug, Clone)]
pub struct InputHistory {
    names: Vec<String>,
    current: Vec<f64>,
    previous: Vec<f64>,
    missing_reported: Vec<bool>,
}

impl InputHistory {
    /// Seeds both the current and previous values from `initial`, so no edge
    /// is observed on the first tick.
    pub fn new<S: AsRef<str>>(names: &[S], initial: &InputValues) -> Self {
        let names: Vec<String> = names.iter().map(|n| n.as_ref().to_owned()).collect();
        let current: Vec<f64> = names
            .iter()
            .map(|name| initial.get(name).copied().unwrap_or(0.0))
            .collect();
        Self {
            missing_reported: vec![false; names.len()],
            previous: current.clone(),
            current,
            names,
        }
    }

    /// Shifts current values into the previous slot and stores `values`.
    ///
    /// A declared input absent from `values` keeps its last value.
    pub fn refresh(&mut self, values: &InputValues) {
        self.previous.copy_from_slice(&self.current);
        for (idx, name) in self.names.iter().enumerate() {
            match values.get(name) {
                Some(value) => {
                    self.current[idx] = *value;
                    self.missing_reported[idx] = false;
                }
                None if !self.missing_reported[idx] => {
                    log::warn!("input {name} missing from accessor, keeping {}", self.current[idx]);
                    self.missing_reported[idx] = true;
                }
                None => {}
            }
        }
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        let idx = self.names.iter().position(|n| n == name)?;
        Some(self.current[idx])
    }

    pub fn snapshot(&self) -> EdgeSnapshot<'_> {
        EdgeSnapshot {
            current: &self.current,
            previous: &self.previous,
        }
    }
}

impl GuardEnv for InputHistory {
    fn value(&self, input: usize) -> f64 {
        self.snapshot().value(input)
    }

    fn rising_edge(&self, input: usize) -> bool {
        self.snapshot().rising_edge(input)
    }

    fn falling_edge(&self, input: usize) -> bool {
        self.snapshot().falling_edge(input)
    }
}
