use std::mem;

use futures::future::join_all;

use crate::net::ids::TransitionId;
use crate::net::FiredTransition;
use crate::sim::{SimCore, SimulationError, SimulationGraphics};

/// Two-phase step: the set enabled at the end of the previous tick fires
/// together, then enabling is recomputed for the next tick.
#[derive(Debug, Clone, Default)]
pub struct VisObjMode {
    enabled: Vec<TransitionId>,
}

impl VisObjMode {
    /// Transitions that fire on the next tick.
    pub fn pending(&self) -> &[TransitionId] {
        &self.enabled
    }

    pub(crate) async fn update<G: SimulationGraphics>(
        &mut self,
        core: &mut SimCore<G>,
    ) -> Result<Vec<FiredTransition>, SimulationError> {
        let mut fired = Vec::with_capacity(self.enabled.len());
        for transition in mem::take(&mut self.enabled) {
            // An earlier firing in this tick may have consumed the tokens.
            if core.net.check_arcs(transition) {
                fired.push(core.net.fire(transition)?);
            } else {
                log::debug!(
                    "{} lost its tokens before firing",
                    core.net.transition(transition).key
                );
            }
        }
        let graphics = &core.graphics;
        join_all(fired.iter().map(|f| graphics.fire_transition(f))).await;

        core.refresh_inputs();
        for transition in core.order() {
            core.update_trans(transition);
            if core.is_enabled(transition) {
                self.enabled.push(transition);
            }
        }
        Ok(fired)
    }
}
