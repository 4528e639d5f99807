//! Session controller: start, pause, step and stop a running simulation.
//!
//! The loop owns the [`Simulation`]; controls go through a cloneable
//! [`SimulatorHandle`] and only take effect between ticks.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::sim::{Simulation, SimulationError, SimulationGraphics, TickReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    Running,
    Pausing,
    Paused,
    Stepping,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct SimulatorHandle {
    state: Arc<Mutex<SimState>>,
    wake: Arc<Notify>,
}

impl SimulatorHandle {
    fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::Paused)),
            wake: Arc::new(Notify::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SimState {
        *self.lock()
    }

    fn set(&self, state: SimState) {
        *self.lock() = state;
    }

    /// Resumes a paused session.
    pub fn start(&self) {
        let mut state = self.lock();
        if *state == SimState::Paused {
            *state = SimState::Running;
            self.wake.notify_one();
        }
    }

    /// Pauses after the tick in flight.
    pub fn pause(&self) {
        let mut state = self.lock();
        if *state == SimState::Running {
            *state = SimState::Pausing;
        }
    }

    /// Runs exactly one tick from the paused state.
    pub fn step(&self) {
        let mut state = self.lock();
        if *state == SimState::Paused {
            *state = SimState::Stepping;
            self.wake.notify_one();
        }
    }

    /// Ends the session after the tick in flight.
    pub fn stop(&self) {
        let mut state = self.lock();
        if *state != SimState::Stopped {
            *state = SimState::Stopping;
            self.wake.notify_one();
        }
    }
}

pub struct Simulator<G> {
    simulation: Simulation<G>,
    handle: SimulatorHandle,
}

impl<G: SimulationGraphics> Simulator<G> {
    /// Wraps `simulation`; the session starts paused.
    pub fn new(simulation: Simulation<G>) -> Self {
        Self {
            simulation,
            handle: SimulatorHandle::new(),
        }
    }

    pub fn handle(&self) -> SimulatorHandle {
        self.handle.clone()
    }

    pub fn simulation(&self) -> &Simulation<G> {
        &self.simulation
    }

    /// Drives ticks until the session is stopped, handing every report to
    /// `on_tick`. Returns the number of ticks run.
    ///
    /// The net is restored to its initial marks when the loop ends, also when
    /// a tick fails.
    pub async fn run<F>(&mut self, mut on_tick: F) -> Result<u64, SimulationError>
    where
        F: FnMut(&TickReport, &SimulatorHandle),
    {
        let mut ticks = 0;
        loop {
            match self.handle.state() {
                SimState::Stopping | SimState::Stopped => {
                    self.simulation.exit();
                    self.handle.set(SimState::Stopped);
                    log::info!("simulation stopped after {ticks} ticks");
                    return Ok(ticks);
                }
                SimState::Pausing => self.handle.set(SimState::Paused),
                SimState::Paused => self.handle.wake.notified().await,
                state @ (SimState::Running | SimState::Stepping) => {
                    let report = match self.simulation.update().await {
                        Ok(report) => report,
                        Err(err) => {
                            log::error!("simulation failed: {err}");
                            self.simulation.exit();
                            self.handle.set(SimState::Stopped);
                            return Err(err);
                        }
                    };
                    ticks += 1;
                    if state == SimState::Stepping {
                        let mut current = self.handle.lock();
                        if *current == SimState::Stepping {
                            *current = SimState::Paused;
                        }
                    }
                    on_tick(&report, &self.handle);
                }
            }
        }
    }

    pub fn into_simulation(self) -> Simulation<G> {
        self.simulation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::Settings;
    use crate::net::data::{
        ArcData, ArcKind, NetData, PlaceData, PlaceType, SimConfig, SimModeKind, TransData,
    };
    use crate::net::Net;
    use crate::sim::{InputValues, NoGraphics};

    fn counter() -> Simulator<NoGraphics> {
        let data = NetData {
            places: vec![PlaceData::new("P", "count", PlaceType::Int, 0)],
            transitions: vec![TransData::new("T", "tick")],
            arcs: vec![ArcData::new("A", "P", "T", ArcKind::Output, 1)],
            sim_config: SimConfig {
                sim_mode: SimModeKind::Automation,
                ..SimConfig::default()
            },
            ..NetData::default()
        };
        let net = Net::from_data(&data).unwrap();
        let settings = Settings::headless(Duration::from_millis(10));
        Simulator::new(Simulation::new(net, InputValues::new, NoGraphics, &settings))
    }

    #[test]
    fn controls_follow_the_state_machine() {
        let sim = counter();
        let handle = sim.handle();
        assert_eq!(handle.state(), SimState::Paused);
        handle.pause();
        assert_eq!(handle.state(), SimState::Paused);
        handle.start();
        assert_eq!(handle.state(), SimState::Running);
        handle.step();
        assert_eq!(handle.state(), SimState::Running);
        handle.pause();
        assert_eq!(handle.state(), SimState::Pausing);
        handle.stop();
        assert_eq!(handle.state(), SimState::Stopping);
    }

    #[tokio::test]
    async fn runs_until_stopped_and_restores_marks() {
        let mut sim = counter();
        sim.handle().start();
        let mut marks = Vec::new();
        let ticks = sim
            .run(|report, handle| {
                marks.extend(report.changed_marks.values().copied());
                if report.tick == 5 {
                    handle.stop();
                }
            })
            .await
            .unwrap();
        assert_eq!(ticks, 5);
        assert_eq!(marks, vec![1, 2, 3, 4, 5]);
        assert_eq!(sim.handle().state(), SimState::Stopped);
        assert_eq!(sim.simulation().get_place_mark("P"), Some(0));
    }

    #[tokio::test]
    async fn step_runs_a_single_tick() {
        let mut sim = counter();
        let handle = sim.handle();
        handle.step();
        let ticks = sim
            .run(|_, handle| {
                assert_eq!(handle.state(), SimState::Paused);
                handle.stop();
            })
            .await
            .unwrap();
        assert_eq!(ticks, 1);
    }
}
