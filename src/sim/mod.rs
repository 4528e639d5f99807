//! 仿真调度：三种发生策略共享同一个节拍循环。
//!
//! 每个节拍读取一次外部输入，按优先级顺序（或随机排列）更新迁移，
//! 并按当前模式决定哪些迁移发生：
//!
//! * `Classic`：每节拍至多发生一个迁移，上一节拍选出的候选在本节拍发生；
//! * `Automation`：顺序更新并立即发生，后续迁移观察到先前发生的结果；
//! * `VisObj`：上一节拍结束时的使能集合整体发生，动画并发等待后再重新计算。

pub mod automation;
pub mod classic;
pub mod graphics;
pub mod inputs;
pub mod report;
pub mod simulator;
pub mod visobj;

use std::time::Duration;

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;

use crate::config::Settings;
use crate::net::data::{PriorityMode, SimModeKind};
use crate::net::ids::TransitionId;
use crate::net::structure::Mark;
use crate::net::{FireError, FiredTransition, MarkError, Net};

pub use automation::AutomationMode;
pub use classic::ClassicMode;
pub use graphics::{LogGraphics, NoGraphics, SimulationGraphics};
pub use inputs::{InputHistory, InputSource, InputValues};
pub use report::{TickReport, TransitionReport};
pub use simulator::{SimState, Simulator, SimulatorHandle};
pub use visobj::VisObjMode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Fire(#[from] FireError),
    #[error(transparent)]
    Mark(#[from] MarkError),
}

/// State shared by every mode: the net, inputs, clock and collaborators.
pub struct SimCore<G> {
    pub(crate) net: Net,
    pub(crate) graphics: G,
    source: Box<dyn InputSource>,
    history: InputHistory,
    rng: StdRng,
    cycle_interval: Duration,
    tick_pause: Duration,
    sim_time: Duration,
    tick: u64,
}

impl<G: SimulationGraphics> SimCore<G> {
    fn new(mut net: Net, mut source: Box<dyn InputSource>, graphics: G, settings: &Settings) -> Self {
        let initial = source.read();
        let history = InputHistory::new(&net.input_names(), &initial);
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        net.restart_places();
        Self {
            net,
            graphics,
            source,
            history,
            rng,
            cycle_interval: settings.cycle_interval(),
            tick_pause: settings.tick_pause(),
            sim_time: Duration::ZERO,
            tick: 0,
        }
    }

    /// Transitions in the order this tick visits them.
    pub(crate) fn order(&mut self) -> Vec<TransitionId> {
        let mut order = self.net.trans_in_order().to_vec();
        if self.net.sim_config().priority_mode == PriorityMode::Random {
            order.shuffle(&mut self.rng);
        }
        order
    }

    pub(crate) fn refresh_inputs(&mut self) {
        let values = self.source.read();
        self.history.refresh(&values);
    }

    pub(crate) fn update_trans(&mut self, transition: TransitionId) {
        self.net
            .update_transition(transition, self.cycle_interval, &self.history);
    }

    pub(crate) fn is_enabled(&self, transition: TransitionId) -> bool {
        self.net.transition(transition).is_enabled()
    }

    /// Fires `transition` and waits for its animation.
    pub(crate) async fn fire(
        &mut self,
        transition: TransitionId,
    ) -> Result<FiredTransition, SimulationError> {
        let fired = self.net.fire(transition)?;
        self.graphics.fire_transition(&fired).await;
        Ok(fired)
    }

    fn report(&self, before: &[Mark], fired: Vec<FiredTransition>) -> TickReport {
        let config = self.net.sim_config();
        let places = self.net.places();
        let changed_marks: IndexMap<_, _> = places
            .iter()
            .zip(before)
            .filter(|(place, old)| place.mark() != **old)
            .map(|(place, _)| (place.key.clone(), place.mark()))
            .collect();
        let transitions = self
            .net
            .transitions()
            .iter()
            .map(|t| TransitionReport {
                id: t.key.clone(),
                state: t.state(),
            })
            .collect();
        let guards = if config.guard_debug {
            self.net
                .transitions()
                .iter()
                .map(|t| (t.key.clone(), t.is_guard_enabled()))
                .collect()
        } else {
            IndexMap::new()
        };
        let arcs = if config.arc_debug {
            self.net
                .arcs()
                .iter_enumerated()
                .map(|(id, arc)| (arc.key.clone(), self.net.is_arc_enabled(id)))
                .collect()
        } else {
            IndexMap::new()
        };
        TickReport {
            tick: self.tick,
            sim_time: self.sim_time,
            changed_marks,
            fired,
            transitions,
            guards,
            arcs,
        }
    }
}

/// Firing policy, chosen once per session from the net's `simMode`.
#[derive(Debug, Clone)]
pub enum SimMode {
    Classic(ClassicMode),
    Automation(AutomationMode),
    VisObj(VisObjMode),
}

impl SimMode {
    pub fn new(kind: SimModeKind) -> Self {
        match kind {
            SimModeKind::Classic => SimMode::Classic(ClassicMode::default()),
            SimModeKind::Automation => SimMode::Automation(AutomationMode),
            SimModeKind::VisObj => SimMode::VisObj(VisObjMode::default()),
        }
    }

    pub fn kind(&self) -> SimModeKind {
        match self {
            SimMode::Classic(_) => SimModeKind::Classic,
            SimMode::Automation(_) => SimModeKind::Automation,
            SimMode::VisObj(_) => SimModeKind::VisObj,
        }
    }

    fn reset(&mut self) {
        *self = SimMode::new(self.kind());
    }
}

/// One simulation session over an assembled net.
pub struct Simulation<G> {
    core: SimCore<G>,
    mode: SimMode,
}

impl<G: SimulationGraphics> Simulation<G> {
    /// Starts a session in the mode configured by the net.
    pub fn new<S>(net: Net, source: S, graphics: G, settings: &Settings) -> Self
    where
        S: InputSource + 'static,
    {
        let kind = net.sim_config().sim_mode;
        Self::with_mode(net, source, graphics, settings, kind)
    }

    pub fn with_mode<S>(
        net: Net,
        source: S,
        graphics: G,
        settings: &Settings,
        kind: SimModeKind,
    ) -> Self
    where
        S: InputSource + 'static,
    {
        log::info!(
            "simulation started in {:?} mode, {:?} priority",
            kind,
            net.sim_config().priority_mode
        );
        Self {
            core: SimCore::new(net, Box::new(source), graphics, settings),
            mode: SimMode::new(kind),
        }
    }

    /// Runs one tick and reports what changed.
    pub async fn update(&mut self) -> Result<TickReport, SimulationError> {
        let before = self.core.net.marks();
        let fired = match &mut self.mode {
            SimMode::Classic(mode) => mode.update(&mut self.core).await?,
            SimMode::Automation(mode) => mode.update(&mut self.core).await?,
            SimMode::VisObj(mode) => mode.update(&mut self.core).await?,
        };
        self.core.tick += 1;
        self.core.sim_time += self.core.cycle_interval;
        let report = self.core.report(&before, fired);
        self.core.graphics.on_tick(&report);
        if !self.core.tick_pause.is_zero() {
            tokio::time::sleep(self.core.tick_pause).await;
        }
        Ok(report)
    }

    /// Restores every initial mark and resets every transition. Safe to call
    /// at any point and more than once.
    pub fn exit(&mut self) {
        self.core.net.restart_places();
        self.core.net.restart_transitions();
        self.mode.reset();
        self.core.graphics.on_exit();
    }

    pub fn get_place_mark(&self, place: &str) -> Option<Mark> {
        self.core.net.place_mark(place)
    }

    pub fn set_place_mark(&mut self, place: &str, mark: i64) -> Result<(), SimulationError> {
        self.core.net.set_place_mark(place, mark)?;
        log::debug!("mark of {place} set to {mark}");
        Ok(())
    }

    /// Adds one token to `place`.
    pub fn inc_token(&mut self, place: &str) -> Result<(), SimulationError> {
        let mark = self
            .get_place_mark(place)
            .ok_or_else(|| MarkError::UnknownPlace(place.to_owned()))?;
        let next = i64::try_from(mark.saturating_add(1)).unwrap_or(i64::MAX);
        self.set_place_mark(place, next)
    }

    pub fn sim_time(&self) -> Duration {
        self.core.sim_time
    }

    pub fn ticks(&self) -> u64 {
        self.core.tick
    }

    pub fn mode(&self) -> &SimMode {
        &self.mode
    }

    pub fn net(&self) -> &Net {
        &self.core.net
    }

    pub fn inputs(&self) -> &InputHistory {
        &self.core.history
    }

    pub fn graphics(&self) -> &G {
        &self.core.graphics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::data::NetData;
    use serde_json::json;

    fn net(mode: &str, priority: &str) -> Net {
        let data: NetData = serde_json::from_value(json!({
            "places": [
                {"id": "P1", "name": "p1", "placeType": "INT", "initialMark": "1"},
                {"id": "B", "name": "flag", "placeType": "BOOL", "initialMark": "0"}
            ],
            "transitions": [
                {"id": "T1", "name": "t1", "delay": "0", "priority": "2"},
                {"id": "T2", "name": "t2", "delay": "0", "priority": "1"}
            ],
            "arcs": [
                {"id": "A1", "placeId": "P1", "transId": "T1", "arcType": "Input", "weight": "1"},
                {"id": "A2", "placeId": "P1", "transId": "T2", "arcType": "Input", "weight": "1"}
            ],
            "inputs": [],
            "simConfig": {"simMode": mode, "priorityMode": priority, "arcDebug": true}
        }))
        .unwrap();
        Net::from_data(&data).unwrap()
    }

    fn settings() -> Settings {
        Settings {
            seed: Some(42),
            ..Settings::headless(Duration::from_millis(10))
        }
    }

    fn no_inputs() -> InputValues {
        InputValues::new()
    }

    #[tokio::test]
    async fn time_advances_one_cycle_per_tick() {
        let mut sim = Simulation::new(net("Automation", "fixed"), no_inputs, NoGraphics, &settings());
        for _ in 0..3 {
            sim.update().await.unwrap();
        }
        assert_eq!(sim.sim_time(), Duration::from_millis(30));
        assert_eq!(sim.ticks(), 3);
    }

    #[tokio::test]
    async fn priority_decides_a_conflict() {
        let mut sim = Simulation::new(net("Automation", "fixed"), no_inputs, NoGraphics, &settings());
        let report = sim.update().await.unwrap();
        assert_eq!(report.fired_ids().collect::<Vec<_>>(), vec!["T1"]);
        assert_eq!(report.changed_marks.get("P1"), Some(&0));
        assert_eq!(report.arcs.get("A2"), Some(&false));
        assert!(report.guards.is_empty());
    }

    #[tokio::test]
    async fn random_priority_still_fires_exactly_one() {
        let mut sim = Simulation::new(net("Automation", "random"), no_inputs, NoGraphics, &settings());
        let report = sim.update().await.unwrap();
        assert_eq!(report.fired.len(), 1);
        assert_eq!(sim.get_place_mark("P1"), Some(0));
    }

    #[tokio::test]
    async fn exit_restores_initial_marks() {
        let mut sim = Simulation::new(net("Automation", "fixed"), no_inputs, NoGraphics, &settings());
        sim.update().await.unwrap();
        sim.inc_token("B").unwrap();
        assert_eq!(sim.get_place_mark("B"), Some(1));
        sim.exit();
        sim.exit();
        assert_eq!(sim.get_place_mark("P1"), Some(1));
        assert_eq!(sim.get_place_mark("B"), Some(0));
    }

    #[tokio::test]
    async fn inc_token_respects_bool_ceiling() {
        let mut sim = Simulation::new(net("Classic", "fixed"), no_inputs, NoGraphics, &settings());
        sim.inc_token("B").unwrap();
        let err = sim.inc_token("B").unwrap_err();
        assert_eq!(
            err,
            SimulationError::Mark(MarkError::BoolOverflow { id: "B".into(), mark: 2 })
        );
        assert!(sim.inc_token("missing").is_err());
        sim.inc_token("P1").unwrap();
        assert_eq!(sim.get_place_mark("P1"), Some(2));
    }

    #[test]
    fn mode_follows_net_config() {
        let sim = Simulation::new(net("VisObj", "fixed"), no_inputs, NoGraphics, &settings());
        assert_eq!(sim.mode().kind(), SimModeKind::VisObj);
    }
}
