use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::net::data::ElementId;
use crate::net::structure::{Mark, TransitionState};
use crate::net::FiredTransition;

fn secs<S: Serializer>(time: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(time.as_secs_f64())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionReport {
    pub id: ElementId,
    pub state: TransitionState,
}

/// Notifications produced by one tick, in the order the graphics layer
/// consumes them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub tick: u64,
    #[serde(serialize_with = "secs")]
    pub sim_time: Duration,
    /// Places whose mark differs from the start of the tick.
    pub changed_marks: IndexMap<ElementId, Mark>,
    pub fired: Vec<FiredTransition>,
    pub transitions: Vec<TransitionReport>,
    /// Guard outcome per transition, filled only with `guardDebug`.
    pub guards: IndexMap<ElementId, bool>,
    /// Enabling state per arc, filled only with `arcDebug`.
    pub arcs: IndexMap<ElementId, bool>,
}

impl TickReport {
    /// Simulated time in seconds, two decimals.
    pub fn display_time(&self) -> String {
        format!("{:.2}", self.sim_time.as_secs_f64())
    }

    pub fn fired_ids(&self) -> impl Iterator<Item = &str> {
        self.fired.iter().map(|f| f.key.as_str())
    }

    pub fn enabled_ids(&self) -> impl Iterator<Item = &str> {
        self.transitions
            .iter()
            .filter(|t| t.state == TransitionState::Enabled)
            .map(|t| t.id.as_str())
    }
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}s] tick {}", self.display_time(), self.tick)?;
        let fired: Vec<&str> = self.fired_ids().collect();
        if !fired.is_empty() {
            write!(f, " fired {}", fired.join(", "))?;
        }
        if !self.changed_marks.is_empty() {
            let marks: Vec<String> = self
                .changed_marks
                .iter()
                .map(|(id, mark)| format!("{id}={mark}"))
                .collect();
            write!(f, " marks {}", marks.join(", "))?;
        }
        Ok(())
    }
}
