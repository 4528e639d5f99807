//! 逻辑网元素：库所、弧、迁移及其运行时状态（标识、延迟计时）。
use std::time::Duration;

use log::warn;
use serde::Serialize;

use crate::guard::{Guard, GuardEnv};
use crate::net::data::{ArcKind, ElementId, PlaceType};
use crate::net::ids::{ArcId, PlaceId, TransitionId};

pub type Mark = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Place {
    pub key: ElementId,
    pub name: String,
    pub place_type: PlaceType,
    pub initial_mark: Mark,
    mark: Mark,
}

impl Place {
    pub fn new(
        key: impl Into<ElementId>,
        name: impl Into<String>,
        place_type: PlaceType,
        initial_mark: Mark,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            place_type,
            initial_mark,
            mark: initial_mark,
        }
    }

    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// Largest mark the place may hold.
    pub fn capacity(&self) -> Mark {
        match self.place_type {
            PlaceType::Int => Mark::MAX,
            PlaceType::Bool => 1,
        }
    }

    /// Overwrites the mark; callers check [`Place::capacity`] first.
    pub(crate) fn set_mark(&mut self, mark: Mark) {
        self.mark = mark;
    }

    /// 输入弧发生：INT 库所减去权重，BOOL 库所直接清零。
    pub(crate) fn consume(&mut self, weight: Mark) {
        self.mark = match self.place_type {
            PlaceType::Int => {
                if self.mark < weight {
                    warn!(
                        "place {} holds {} but firing consumes {}, clamping to 0",
                        self.key, self.mark, weight
                    );
                }
                self.mark.saturating_sub(weight)
            }
            PlaceType::Bool => 0,
        };
    }

    /// 输出弧发生：INT 库所加上权重，BOOL 库所直接置一。
    pub(crate) fn produce(&mut self, weight: Mark) {
        self.mark = match self.place_type {
            PlaceType::Int => self.mark.saturating_add(weight),
            PlaceType::Bool => 1,
        };
    }

    pub fn restart(&mut self) {
        self.mark = self.initial_mark;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arc {
    pub key: ElementId,
    pub place: PlaceId,
    pub transition: TransitionId,
    pub kind: ArcKind,
    pub weight: Mark,
}

impl Arc {
    /// Whether this arc allows its transition to fire given `place`.
    pub fn is_enabled(&self, place: &Place) -> bool {
        match self.kind {
            ArcKind::Input | ArcKind::Test => self.weight <= place.mark(),
            ArcKind::Inhibitor => self.weight > place.mark(),
            ArcKind::Output => match place.place_type {
                PlaceType::Int => true,
                PlaceType::Bool => place.mark() == 0,
            },
        }
    }
}

/// Enabling state of a transition as observed by the graphics layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransitionState {
    Enabled,
    WaitingDelay,
    Disabled,
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub key: ElementId,
    pub name: String,
    pub guard: Guard,
    pub delay: Duration,
    pub priority: f64,
    pub inputs: Vec<ArcId>,
    pub outputs: Vec<ArcId>,
    pub tests: Vec<ArcId>,
    pub inhibitors: Vec<ArcId>,
    time_to_enable: Duration,
    enabled: bool,
    guard_enabled: bool,
}

impl Transition {
    pub fn new(
        key: impl Into<ElementId>,
        name: impl Into<String>,
        guard: Guard,
        delay: Duration,
        priority: f64,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            guard,
            delay,
            priority,
            inputs: Vec::new(),
            outputs: Vec::new(),
            tests: Vec::new(),
            inhibitors: Vec::new(),
            time_to_enable: delay,
            enabled: false,
            guard_enabled: false,
        }
    }

    pub(crate) fn attach(&mut self, arc: ArcId, kind: ArcKind) {
        match kind {
            ArcKind::Input => self.inputs.push(arc),
            ArcKind::Output => self.outputs.push(arc),
            ArcKind::Test => self.tests.push(arc),
            ArcKind::Inhibitor => self.inhibitors.push(arc),
        }
    }

    /// All arcs: inputs, outputs, tests, then inhibitors.
    pub fn arcs(&self) -> impl Iterator<Item = ArcId> + '_ {
        self.inputs
            .iter()
            .chain(&self.outputs)
            .chain(&self.tests)
            .chain(&self.inhibitors)
            .copied()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_guard_enabled(&self) -> bool {
        self.guard_enabled
    }

    pub fn time_to_enable(&self) -> Duration {
        self.time_to_enable
    }

    pub fn is_waiting_delay(&self) -> bool {
        !self.delay.is_zero() && self.time_to_enable < self.delay
    }

    pub fn state(&self) -> TransitionState {
        if self.enabled {
            TransitionState::Enabled
        } else if self.is_waiting_delay() {
            TransitionState::WaitingDelay
        } else {
            TransitionState::Disabled
        }
    }

    /// Recomputes the enabling state for one tick of length `dt`.
    ///
    /// The delay only counts down across consecutive ticks in which both the
    /// guard and the arcs hold; any interruption starts it over.
    pub fn update<E: GuardEnv + ?Sized>(&mut self, dt: Duration, arcs_enabled: bool, env: &E) {
        self.enabled = false;
        self.guard_enabled = self.guard.evaluate(env);
        if arcs_enabled && self.guard_enabled {
            if self.time_to_enable.is_zero() {
                self.enabled = true;
            } else {
                self.time_to_enable = self.time_to_enable.saturating_sub(dt);
            }
        } else {
            self.time_to_enable = self.delay;
        }
    }

    /// Restarts the delay after a firing.
    pub(crate) fn fired(&mut self) {
        self.time_to_enable = self.delay;
    }

    pub fn restart(&mut self) {
        self.time_to_enable = Duration::ZERO;
        self.enabled = false;
        self.guard_enabled = false;
    }
}
