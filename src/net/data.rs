//! 编辑器交换格式：逻辑网在组装之前的序列化描述。
//!
//! 数值字段（标识、权重、延迟、优先级）在边界上保持字符串形式，
//! 由 [`Net::from_data`](crate::net::Net::from_data) 解析与校验。
//! 编辑器私有的字段（坐标、文字位置、视口等）原样保存在 `extra` 中，
//! 以保证读写往返不丢失信息。
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Element identifier as assigned by the editor.
pub type ElementId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlaceType {
    #[default]
    #[serde(rename = "INT")]
    Int,
    #[serde(rename = "BOOL")]
    Bool,
}

/// Inputs share the INT/BOOL typing of places.
pub type InputType = PlaceType;

impl PlaceType {
    pub fn as_st(self) -> &'static str {
        match self {
            PlaceType::Int => "INT",
            PlaceType::Bool => "BOOL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArcKind {
    Input,
    Output,
    Test,
    Inhibitor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SimModeKind {
    #[default]
    Classic,
    Automation,
    VisObj,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityMode {
    #[default]
    Fixed,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimConfig {
    pub sim_mode: SimModeKind,
    pub arc_debug: bool,
    pub guard_debug: bool,
    pub priority_mode: PriorityMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceData {
    pub id: ElementId,
    pub name: String,
    pub place_type: PlaceType,
    pub initial_mark: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlaceData {
    pub fn new(
        id: impl Into<ElementId>,
        name: impl Into<String>,
        place_type: PlaceType,
        initial_mark: impl ToString,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            place_type,
            initial_mark: initial_mark.to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransData {
    pub id: ElementId,
    pub name: String,
    pub delay: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransData {
    pub fn new(id: impl Into<ElementId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            delay: "0".to_owned(),
            guard: None,
            priority: None,
            extra: Map::new(),
        }
    }

    pub fn with_delay(mut self, delay: impl ToString) -> Self {
        self.delay = delay.to_string();
        self
    }

    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }

    pub fn with_priority(mut self, priority: impl ToString) -> Self {
        self.priority = Some(priority.to_string());
        self
    }

    /// The guard text, treating an empty or blank string as absent.
    pub fn guard_text(&self) -> Option<&str> {
        self.guard.as_deref().filter(|g| !g.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcData {
    pub id: ElementId,
    pub place_id: ElementId,
    pub trans_id: ElementId,
    pub arc_type: ArcKind,
    pub weight: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ArcData {
    pub fn new(
        id: impl Into<ElementId>,
        place_id: impl Into<ElementId>,
        trans_id: impl Into<ElementId>,
        arc_type: ArcKind,
        weight: impl ToString,
    ) -> Self {
        Self {
            id: id.into(),
            place_id: place_id.into(),
            trans_id: trans_id.into(),
            arc_type,
            weight: weight.to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputData {
    pub name: String,
    #[serde(rename = "type")]
    pub input_type: InputType,
    #[serde(default)]
    pub initial_value: String,
    #[serde(default)]
    pub description: String,
}

impl InputData {
    pub fn new(name: impl Into<String>, input_type: InputType) -> Self {
        Self {
            name: name.into(),
            input_type,
            initial_value: String::new(),
            description: String::new(),
        }
    }

    /// Numeric value of `initialValue`; booleans map to 0/1 and blanks to 0.
    pub fn initial_number(&self) -> f64 {
        let raw = self.initial_value.trim();
        if raw.eq_ignore_ascii_case("true") {
            1.0
        } else if raw.eq_ignore_ascii_case("false") {
            0.0
        } else {
            raw.parse().unwrap_or(0.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pre_script: String,
    #[serde(default)]
    pub places: Vec<PlaceData>,
    #[serde(default)]
    pub transitions: Vec<TransData>,
    #[serde(default)]
    pub arcs: Vec<ArcData>,
    #[serde(default)]
    pub inputs: Vec<InputData>,
    #[serde(default)]
    pub sim_config: SimConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NetData {
    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|input| input.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_editor_description() {
        let value = json!({
            "name": "press",
            "preScript": "",
            "places": [{
                "id": "P1", "elementType": "place", "name": "p1",
                "placeType": "BOOL", "initialMark": "1",
                "position": {"x": 10, "y": 20}
            }],
            "transitions": [{
                "id": "T1", "elementType": "trans", "name": "t1",
                "delay": "0.5", "guard": "rt('start')", "priority": "2"
            }],
            "arcs": [{
                "id": "A1", "elementType": "arc", "placeId": "P1",
                "transId": "T1", "arcType": "Inhibitor", "weight": "1"
            }],
            "inputs": [{
                "name": "start", "type": "BOOL",
                "initialValue": "false", "description": "start button"
            }],
            "simConfig": {
                "simMode": "VisObj", "arcDebug": true,
                "guardDebug": false, "priorityMode": "random"
            },
            "grid": true
        });

        let data: NetData = serde_json::from_value(value).unwrap();
        assert_eq!(data.places[0].place_type, PlaceType::Bool);
        assert_eq!(data.places[0].extra["position"], json!({"x": 10, "y": 20}));
        assert_eq!(data.transitions[0].guard_text(), Some("rt('start')"));
        assert_eq!(data.arcs[0].arc_type, ArcKind::Inhibitor);
        assert_eq!(data.sim_config.sim_mode, SimModeKind::VisObj);
        assert_eq!(data.sim_config.priority_mode, PriorityMode::Random);
        assert_eq!(data.extra["grid"], json!(true));
        assert_eq!(data.input_names(), vec!["start"]);
    }

    #[test]
    fn sim_config_defaults_when_missing() {
        let data: NetData = serde_json::from_value(json!({})).unwrap();
        assert_eq!(data.sim_config, SimConfig::default());
        assert_eq!(data.sim_config.sim_mode, SimModeKind::Classic);
    }

    #[test]
    fn blank_guard_is_absent() {
        let trans = TransData::new("T1", "t1").with_guard("   ");
        assert_eq!(trans.guard_text(), None);
    }

    #[test]
    fn input_initial_number() {
        let mut input = InputData::new("x", PlaceType::Int);
        input.initial_value = "7".into();
        assert_eq!(input.initial_number(), 7.0);
        input.initial_value = "TRUE".into();
        assert_eq!(input.initial_number(), 1.0);
    }
}
