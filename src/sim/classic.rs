use crate::net::ids::TransitionId;
use crate::net::FiredTransition;
use crate::sim::{SimCore, SimulationError, SimulationGraphics};

/// Single-winner arbitration: the first enabled transition in visiting
/// order is remembered and fires at the start of the next tick.
#[derive(Debug, Clone, Default)]
pub struct ClassicMode {
    candidate: Option<TransitionId>,
}

impl ClassicMode {
    pub fn candidate(&self) -> Option<TransitionId> {
        self.candidate
    }

    pub(crate) async fn update<G: SimulationGraphics>(
        &mut self,
        core: &mut SimCore<G>,
    ) -> Result<Vec<FiredTransition>, SimulationError> {
        let mut fired = Vec::with_capacity(1);
        if let Some(transition) = self.candidate.take() {
            // Marks may have been overridden between ticks.
            if core.net.check_arcs(transition) {
                fired.push(core.fire(transition).await?);
            } else {
                log::warn!(
                    "candidate {} no longer enabled, skipping",
                    core.net.transition(transition).key
                );
            }
        }

        core.refresh_inputs();
        for transition in core.order() {
            core.update_trans(transition);
            if self.candidate.is_none() && core.is_enabled(transition) {
                self.candidate = Some(transition);
            }
        }
        if let Some(transition) = self.candidate {
            log::debug!("next candidate {}", core.net.transition(transition).key);
        }
        Ok(fired)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use crate::config::Settings;
    use crate::net::data::NetData;
    use crate::net::Net;
    use crate::sim::{InputValues, NoGraphics, SimMode, Simulation};

    fn simulation() -> Simulation<NoGraphics> {
        let data: NetData = serde_json::from_value(json!({
            "places": [
                {"id": "P1", "name": "p1", "placeType": "INT", "initialMark": "3"},
                {"id": "P2", "name": "p2", "placeType": "INT", "initialMark": "0"}
            ],
            "transitions": [
                {"id": "T1", "name": "t1", "delay": "0"},
                {"id": "T2", "name": "t2", "delay": "0"}
            ],
            "arcs": [
                {"id": "A1", "placeId": "P1", "transId": "T1", "arcType": "Input", "weight": "1"},
                {"id": "A2", "placeId": "P2", "transId": "T1", "arcType": "Output", "weight": "1"},
                {"id": "A3", "placeId": "P1", "transId": "T2", "arcType": "Input", "weight": "1"}
            ],
            "simConfig": {"simMode": "Classic"}
        }))
        .unwrap();
        let net = Net::from_data(&data).unwrap();
        Simulation::new(
            net,
            InputValues::new,
            NoGraphics,
            &Settings::headless(Duration::from_millis(10)),
        )
    }

    fn candidate_key(sim: &Simulation<NoGraphics>) -> Option<String> {
        match sim.mode() {
            SimMode::Classic(mode) => mode
                .candidate()
                .map(|t| sim.net().transition(t).key.clone()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn first_enabled_fires_on_the_next_tick() {
        let mut sim = simulation();
        let first = sim.update().await.unwrap();
        assert!(first.fired.is_empty());
        assert_eq!(candidate_key(&sim).as_deref(), Some("T1"));

        let second = sim.update().await.unwrap();
        assert_eq!(second.fired_ids().collect::<Vec<_>>(), vec!["T1"]);
        assert_eq!(sim.get_place_mark("P1"), Some(2));
        assert_eq!(sim.get_place_mark("P2"), Some(1));
    }

    #[tokio::test]
    async fn overridden_marks_drop_the_candidate() {
        let mut sim = simulation();
        sim.update().await.unwrap();
        sim.set_place_mark("P1", 0).unwrap();
        let report = sim.update().await.unwrap();
        assert!(report.fired.is_empty());
        assert_eq!(candidate_key(&sim), None);
    }
}
