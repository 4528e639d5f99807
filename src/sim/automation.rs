use crate::net::FiredTransition;
use crate::sim::{SimCore, SimulationError, SimulationGraphics};

/// Sequential scan: every transition is updated and, when enabled, fired
/// immediately, so later transitions see the marks left by earlier ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutomationMode;

impl AutomationMode {
    pub(crate) async fn update<G: SimulationGraphics>(
        &mut self,
        core: &mut SimCore<G>,
    ) -> Result<Vec<FiredTransition>, SimulationError> {
        let mut fired = Vec::new();
        core.refresh_inputs();
        for transition in core.order() {
            core.update_trans(transition);
            if core.is_enabled(transition) {
                fired.push(core.fire(transition).await?);
            }
        }
        Ok(fired)
    }
}
