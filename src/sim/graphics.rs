//! Notification seam towards whatever renders a running simulation.
use std::future::Future;
use std::time::Duration;

use crate::net::FiredTransition;
use crate::sim::report::TickReport;

/// Receives the effects of a simulation as they happen.
///
/// `fire_transition` resolves once the firing animation has settled; VisObj
/// mode drives several of these futures concurrently.
pub trait SimulationGraphics {
    fn fire_transition(&self, fired: &FiredTransition) -> impl Future<Output = ()>;

    fn on_tick(&mut self, _report: &TickReport) {}

    fn on_exit(&mut self) {}
}

/// Headless sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGraphics;

impl SimulationGraphics for NoGraphics {
    async fn fire_transition(&self, _fired: &FiredTransition) {}
}

/// Writes every notification to the log and waits `animation` per firing.
#[derive(Debug, Clone, Default)]
pub struct LogGraphics {
    animation: Duration,
}

impl LogGraphics {
    pub fn new(animation: Duration) -> Self {
        Self { animation }
    }
}

impl SimulationGraphics for LogGraphics {
    async fn fire_transition(&self, fired: &FiredTransition) {
        log::debug!(
            "animate {}: {:?} -> {:?}",
            fired.key,
            fired.input_arcs,
            fired.output_arcs
        );
        if !self.animation.is_zero() {
            tokio::time::sleep(self.animation).await;
        }
    }

    fn on_tick(&mut self, report: &TickReport) {
        log::info!("{report}");
        for (id, guard) in &report.guards {
            log::debug!("guard {id}: {guard}");
        }
        for (id, enabled) in &report.arcs {
            log::debug!("arc {id}: {enabled}");
        }
    }

    fn on_exit(&mut self) {
        log::info!("simulation exited, marks restored");
    }
}
