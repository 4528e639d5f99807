//! 结构化文本（IEC 61131-3 ST）代码生成。
//!
//! 生成的程序在固定扫描周期下等价于无限运行 Automation 模式：
//! 先更新所有边沿触发器，再按优先级顺序逐个执行迁移块。
//! 同一输入总是得到逐字节相同的输出。

pub mod st;

use std::fmt;

use indexmap::IndexSet;

use crate::guard::EdgeKind;
use crate::net::data::{NetData, PlaceType};
use crate::net::ids::TransitionId;
use crate::net::structure::Transition;
use crate::net::{Net, NetError};

/// Validates `data` and translates it to a structured-text program.
pub fn generate_code(data: &NetData) -> Result<String, NetError> {
    let net = Net::from_data(data)?;
    let program = StProgram::new(&net).to_string();
    log::debug!("generated {} bytes of structured text", program.len());
    Ok(program)
}

/// Structured-text rendering of an assembled net.
pub struct StProgram<'a> {
    net: &'a Net,
    triggers: IndexSet<(EdgeKind, &'a str)>,
}

impl<'a> StProgram<'a> {
    pub fn new(net: &'a Net) -> Self {
        let triggers = net
            .transitions()
            .iter()
            .flat_map(|t| t.guard.edge_triggers())
            .collect();
        Self { net, triggers }
    }

    fn timer_name(trans: &Transition) -> Option<String> {
        (!trans.delay.is_zero()).then(|| format!("ton_{}", trans.name))
    }

    /// `(arc conditions) AND (guard)`, or `TRUE` when nothing constrains it.
    fn enabling_condition(&self, trans: &Transition) -> String {
        let arcs: Vec<String> = trans
            .arcs()
            .filter_map(|id| {
                let arc = self.net.arc(id);
                st::arc_condition(arc, self.net.place(arc.place))
            })
            .collect();
        let mut parts = Vec::with_capacity(2);
        if !arcs.is_empty() {
            parts.push(format!("({})", arcs.join(" AND ")));
        }
        if let Some(expr) = trans.guard.expr() {
            parts.push(format!("({})", st::expression(expr)));
        }
        if parts.is_empty() {
            "TRUE".to_owned()
        } else {
            parts.join(" AND ")
        }
    }

    fn write_declarations(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "VAR")?;
        writeln!(f, "    // places")?;
        for place in self.net.places().iter() {
            let initial = match place.place_type {
                PlaceType::Int => place.initial_mark.to_string(),
                PlaceType::Bool if place.initial_mark > 0 => "TRUE".to_owned(),
                PlaceType::Bool => "FALSE".to_owned(),
            };
            writeln!(
                f,
                "    {}: {} := {};",
                place.name,
                place.place_type.as_st(),
                initial
            )?;
        }

        writeln!(f)?;
        writeln!(f, "    // inputs")?;
        for input in self.net.inputs() {
            writeln!(f, "    {}: {};", input.name, input.input_type.as_st())?;
        }

        writeln!(f)?;
        writeln!(f, "    // transitions delays")?;
        for timer in self.net.transitions().iter().filter_map(Self::timer_name) {
            writeln!(f, "    {timer}: TON;")?;
        }

        writeln!(f)?;
        writeln!(f, "    // edge triggers")?;
        for (kind, input) in &self.triggers {
            writeln!(
                f,
                "    {}: {};",
                st::trigger_name(*kind, input),
                st::trigger_type(*kind)
            )?;
        }
        writeln!(f, "END_VAR")
    }

    fn write_transition(&self, f: &mut fmt::Formatter<'_>, id: TransitionId) -> fmt::Result {
        let trans = self.net.transition(id);
        let condition = self.enabling_condition(trans);
        let indent = "    ";
        match Self::timer_name(trans) {
            Some(timer) => {
                writeln!(
                    f,
                    "{timer}(IN := {condition}, PT := {});",
                    st::time_literal(trans.delay)
                )?;
                writeln!(f, "IF {timer}.Q THEN")?;
                writeln!(f, "{indent}{timer}.IN := FALSE;")?;
            }
            None => writeln!(f, "IF {condition} THEN")?,
        }
        for arc_id in trans.inputs.iter().chain(&trans.outputs) {
            let arc = self.net.arc(*arc_id);
            writeln!(f, "{indent}{}", st::arc_effect(arc, self.net.place(arc.place)))?;
        }
        write!(f, "END_IF")
    }
}

impl fmt::Display for StProgram<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_declarations(f)?;
        writeln!(f)?;
        writeln!(f, "PROGRAM")?;
        for (kind, input) in &self.triggers {
            writeln!(f, "{}(CLK := {input});", st::trigger_name(*kind, input))?;
        }
        writeln!(f)?;
        for (i, id) in self.net.trans_in_order().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
                writeln!(f)?;
            }
            self.write_transition(f, *id)?;
        }
        writeln!(f)?;
        write!(f, "END_PROGRAM")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> NetData {
        serde_json::from_value(json!({
            "name": "press",
            "places": [
                {"id": "P1", "name": "parts", "placeType": "INT", "initialMark": "2"},
                {"id": "P2", "name": "busy", "placeType": "BOOL", "initialMark": "0"}
            ],
            "transitions": [
                {"id": "T1", "name": "load", "delay": "1.5", "guard": "rt('start') &amp;&amp; ready", "priority": "1"},
                {"id": "T2", "name": "unload", "delay": "0", "priority": "5"}
            ],
            "arcs": [
                {"id": "A1", "placeId": "P1", "transId": "T1", "arcType": "Input", "weight": "2"},
                {"id": "A2", "placeId": "P2", "transId": "T1", "arcType": "Output", "weight": "1"},
                {"id": "A3", "placeId": "P2", "transId": "T2", "arcType": "Input", "weight": "1"},
                {"id": "A4", "placeId": "P1", "transId": "T2", "arcType": "Output", "weight": "1"}
            ],
            "inputs": [
                {"name": "start", "type": "BOOL"},
                {"name": "ready", "type": "BOOL", "initialValue": "true"}
            ]
        }))
        .unwrap()
    }

    const EXPECTED: &str = "\
VAR
    // places
    parts: INT := 2;
    busy: BOOL := FALSE;

    // inputs
    start: BOOL;
    ready: BOOL;

    // transitions delays
    ton_load: TON;

    // edge triggers
    rt_start: R_TRIG;
END_VAR

PROGRAM
rt_start(CLK := start);

IF (busy) THEN
    busy := FALSE;
    parts := parts + 1;
END_IF

ton_load(IN := (parts >= 2 AND NOT busy) AND (rt_start.Q AND ready), PT := T#1S500MS);
IF ton_load.Q THEN
    ton_load.IN := FALSE;
    parts := parts - 2;
    busy := TRUE;
END_IF
END_PROGRAM";

    #[test]
    fn renders_the_whole_program() {
        assert_eq!(generate_code(&sample()).unwrap(), EXPECTED);
    }

    #[test]
    fn output_is_deterministic() {
        let data = sample();
        assert_eq!(generate_code(&data).unwrap(), generate_code(&data).unwrap());
    }

    #[test]
    fn unconstrained_transition_is_always_true() {
        let data: NetData = serde_json::from_value(json!({
            "transitions": [{"id": "T", "name": "idle", "delay": "0"}]
        }))
        .unwrap();
        let code = generate_code(&data).unwrap();
        assert!(code.contains("IF TRUE THEN\nEND_IF\nEND_PROGRAM"));
    }

    #[test]
    fn shared_triggers_are_declared_once() {
        let data: NetData = serde_json::from_value(json!({
            "transitions": [
                {"id": "T1", "name": "a", "delay": "0", "guard": "ft('stop')"},
                {"id": "T2", "name": "b", "delay": "0", "guard": "ft('stop') or rt('go')"}
            ],
            "inputs": [{"name": "stop", "type": "BOOL"}, {"name": "go", "type": "BOOL"}]
        }))
        .unwrap();
        let code = generate_code(&data).unwrap();
        assert_eq!(code.matches("ft_stop: F_TRIG;").count(), 1);
        assert!(code.contains("ft_stop(CLK := stop);\nrt_go(CLK := go);\n"));
    }

    #[test]
    fn invalid_net_is_rejected() {
        let mut data = sample();
        data.transitions[1].guard = Some("missing".into());
        assert_eq!(generate_code(&data).unwrap_err().element_id(), "T2");
    }
}
