//! 网组装与发生语义：由序列化描述构建逻辑网，校验失败时整体拒绝。
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::guard::{Guard, GuardEnv, GuardError};
use crate::net::data::{ElementId, InputData, NetData, PlaceType, SimConfig};
use crate::net::ids::{ArcId, PlaceId, TransitionId};
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::structure::{Arc, Mark, Place, Transition};

/// Construction failures. Every variant names the offending element.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetError {
    #[error("invalid initial mark \"{value}\" of {id}: expected integer")]
    InvalidMark { id: ElementId, value: String },
    #[error("invalid initial mark of {id}: can't be negative")]
    NegativeMark { id: ElementId },
    #[error("invalid initial mark {mark} of BOOL place {id}: must be 0 or 1")]
    BoolMarkOutOfRange { id: ElementId, mark: Mark },
    #[error("invalid arc weight \"{value}\" of {id}: expected integer")]
    InvalidWeight { id: ElementId, value: String },
    #[error("invalid arc weight of {id}: must be greater than zero")]
    NonPositiveWeight { id: ElementId },
    #[error("invalid transition delay \"{value}\" of {id}: expected a number of seconds")]
    InvalidDelay { id: ElementId, value: String },
    #[error("invalid transition delay of {id}: can't be negative")]
    NegativeDelay { id: ElementId },
    #[error("invalid transition priority \"{value}\" of {id}: expected a number")]
    InvalidPriority { id: ElementId, value: String },
    #[error("invalid guard expression of {id}: {source}")]
    Guard { id: ElementId, source: GuardError },
    #[error("arc {arc} references unknown place {place}")]
    UnknownPlace { arc: ElementId, place: ElementId },
    #[error("arc {arc} references unknown transition {transition}")]
    UnknownTransition { arc: ElementId, transition: ElementId },
    #[error("element id {0} is used more than once")]
    DuplicateId(ElementId),
    #[error("input {0} is declared more than once")]
    DuplicateInput(String),
}

impl NetError {
    /// Id of the element to highlight in the editor.
    pub fn element_id(&self) -> &str {
        match self {
            NetError::InvalidMark { id, .. }
            | NetError::NegativeMark { id }
            | NetError::BoolMarkOutOfRange { id, .. }
            | NetError::InvalidWeight { id, .. }
            | NetError::NonPositiveWeight { id }
            | NetError::InvalidDelay { id, .. }
            | NetError::NegativeDelay { id }
            | NetError::InvalidPriority { id, .. }
            | NetError::Guard { id, .. } => id,
            NetError::UnknownPlace { arc, .. } | NetError::UnknownTransition { arc, .. } => arc,
            NetError::DuplicateId(id) => id,
            NetError::DuplicateInput(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FireError {
    #[error("can't fire a disabled transition {0}")]
    Disabled(ElementId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkError {
    #[error("place {0} does not exist")]
    UnknownPlace(ElementId),
    #[error("the number of tokens of {id} can't be negative (got {mark})")]
    Negative { id: ElementId, mark: i64 },
    #[error("can't insert more than one token in BOOL place {id} (got {mark})")]
    BoolOverflow { id: ElementId, mark: i64 },
}

/// Token movement performed by one firing, for animation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FiredTransition {
    #[serde(skip)]
    pub transition: TransitionId,
    #[serde(rename = "id")]
    pub key: ElementId,
    pub input_arcs: Vec<ElementId>,
    pub output_arcs: Vec<ElementId>,
}

fn parse_mark(id: &str, raw: &str) -> Result<Mark, NetError> {
    let value: i64 = raw.trim().parse().map_err(|_| NetError::InvalidMark {
        id: id.to_owned(),
        value: raw.to_owned(),
    })?;
    Mark::try_from(value).map_err(|_| NetError::NegativeMark { id: id.to_owned() })
}

fn parse_weight(id: &str, raw: &str) -> Result<Mark, NetError> {
    let value: i64 = raw.trim().parse().map_err(|_| NetError::InvalidWeight {
        id: id.to_owned(),
        value: raw.to_owned(),
    })?;
    if value <= 0 {
        return Err(NetError::NonPositiveWeight { id: id.to_owned() });
    }
    Ok(value as Mark)
}

fn parse_delay(id: &str, raw: &str) -> Result<Duration, NetError> {
    let raw_trimmed = raw.trim();
    if raw_trimmed.is_empty() {
        return Ok(Duration::ZERO);
    }
    let invalid = || NetError::InvalidDelay {
        id: id.to_owned(),
        value: raw.to_owned(),
    };
    let seconds: f64 = raw_trimmed.parse().map_err(|_| invalid())?;
    if !seconds.is_finite() {
        return Err(invalid());
    }
    if seconds < 0.0 {
        return Err(NetError::NegativeDelay { id: id.to_owned() });
    }
    Duration::try_from_secs_f64(seconds).map_err(|_| invalid())
}

fn parse_priority(id: &str, raw: Option<&str>) -> Result<f64, NetError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(0.0);
    };
    raw.parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| NetError::InvalidPriority {
            id: id.to_owned(),
            value: raw.to_owned(),
        })
}

fn register(keys: &mut HashSet<ElementId>, key: &str) -> Result<(), NetError> {
    if !keys.insert(key.to_owned()) {
        return Err(NetError::DuplicateId(key.to_owned()));
    }
    Ok(())
}

/// 逻辑网：一次仿真会话内独占的库所、弧与迁移。
#[derive(Debug, Clone)]
pub struct Net {
    places: IndexVec<PlaceId, Place>,
    arcs: IndexVec<ArcId, Arc>,
    transitions: IndexVec<TransitionId, Transition>,
    trans_in_order: Vec<TransitionId>,
    inputs: Vec<InputData>,
    sim_config: SimConfig,
    place_keys: HashMap<ElementId, PlaceId>,
    transition_keys: HashMap<ElementId, TransitionId>,
}

impl Net {
    /// Builds the logical net, validating every element. Nothing is returned
    /// unless the whole description is valid.
    pub fn from_data(data: &NetData) -> Result<Self, NetError> {
        let mut input_names: Vec<&str> = Vec::with_capacity(data.inputs.len());
        for input in &data.inputs {
            if input_names.contains(&input.name.as_str()) {
                return Err(NetError::DuplicateInput(input.name.clone()));
            }
            input_names.push(&input.name);
        }

        let mut element_keys = HashSet::new();

        let mut places: IndexVec<PlaceId, Place> = IndexVec::with_capacity(data.places.len());
        let mut place_keys: HashMap<ElementId, PlaceId> = HashMap::new();
        for place in &data.places {
            let mark = parse_mark(&place.id, &place.initial_mark)?;
            if place.place_type == PlaceType::Bool && mark > 1 {
                return Err(NetError::BoolMarkOutOfRange {
                    id: place.id.clone(),
                    mark,
                });
            }
            register(&mut element_keys, &place.id)?;
            let id = places.push(Place::new(&place.id, &place.name, place.place_type, mark));
            place_keys.insert(place.id.clone(), id);
        }

        let mut transitions: IndexVec<TransitionId, Transition> =
            IndexVec::with_capacity(data.transitions.len());
        let mut transition_keys: HashMap<ElementId, TransitionId> = HashMap::new();
        for trans in &data.transitions {
            let delay = parse_delay(&trans.id, &trans.delay)?;
            let priority = parse_priority(&trans.id, trans.priority.as_deref())?;
            let guard = Guard::compile(trans.guard_text(), &input_names).map_err(|source| {
                NetError::Guard {
                    id: trans.id.clone(),
                    source,
                }
            })?;
            register(&mut element_keys, &trans.id)?;
            let id = transitions.push(Transition::new(
                &trans.id,
                &trans.name,
                guard,
                delay,
                priority,
            ));
            transition_keys.insert(trans.id.clone(), id);
        }

        let mut arcs: IndexVec<ArcId, Arc> = IndexVec::with_capacity(data.arcs.len());
        for arc in &data.arcs {
            let weight = parse_weight(&arc.id, &arc.weight)?;
            let place = *place_keys
                .get(&arc.place_id)
                .ok_or_else(|| NetError::UnknownPlace {
                    arc: arc.id.clone(),
                    place: arc.place_id.clone(),
                })?;
            let transition = *transition_keys.get(&arc.trans_id).ok_or_else(|| {
                NetError::UnknownTransition {
                    arc: arc.id.clone(),
                    transition: arc.trans_id.clone(),
                }
            })?;
            register(&mut element_keys, &arc.id)?;
            let arc_id = arcs.push(Arc {
                key: arc.id.clone(),
                place,
                transition,
                kind: arc.arc_type,
                weight,
            });
            transitions[transition].attach(arc_id, arc.arc_type);
        }

        let mut trans_in_order: Vec<TransitionId> = transitions.indices().collect();
        trans_in_order.sort_by(|a, b| transitions[*b].priority.total_cmp(&transitions[*a].priority));

        let net = Self {
            places,
            arcs,
            transitions,
            trans_in_order,
            inputs: data.inputs.clone(),
            sim_config: data.sim_config,
            place_keys,
            transition_keys,
        };
        log::info!(
            "assembled net \"{}\": {} places, {} transitions, {} arcs, {} inputs",
            data.name,
            net.places.len(),
            net.transitions.len(),
            net.arcs.len(),
            net.inputs.len()
        );
        net.log_diagnostics();
        Ok(net)
    }

    fn log_diagnostics(&self) {
        let mut connected = vec![false; self.places.len()];
        for arc in self.arcs.iter() {
            connected[arc.place.index()] = true;
        }
        for (place, flag) in self.places.iter().zip(connected) {
            if !flag {
                log::warn!("place {} ({}) has no arcs", place.key, place.name);
            }
        }
    }

    pub fn places(&self) -> &IndexVec<PlaceId, Place> {
        &self.places
    }

    pub fn arcs(&self) -> &IndexVec<ArcId, Arc> {
        &self.arcs
    }

    pub fn transitions(&self) -> &IndexVec<TransitionId, Transition> {
        &self.transitions
    }

    pub fn place(&self, id: PlaceId) -> &Place {
        &self.places[id]
    }

    pub fn arc(&self, id: ArcId) -> &Arc {
        &self.arcs[id]
    }

    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id]
    }

    /// Transitions by descending priority; equal priorities keep declaration order.
    pub fn trans_in_order(&self) -> &[TransitionId] {
        &self.trans_in_order
    }

    pub fn inputs(&self) -> &[InputData] {
        &self.inputs
    }

    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|input| input.name.as_str()).collect()
    }

    pub fn sim_config(&self) -> &SimConfig {
        &self.sim_config
    }

    pub fn place_id(&self, key: &str) -> Option<PlaceId> {
        self.place_keys.get(key).copied()
    }

    pub fn transition_id(&self, key: &str) -> Option<TransitionId> {
        self.transition_keys.get(key).copied()
    }

    pub fn is_arc_enabled(&self, arc: ArcId) -> bool {
        let arc = &self.arcs[arc];
        arc.is_enabled(&self.places[arc.place])
    }

    /// True when every arc of `transition` is individually enabled.
    pub fn check_arcs(&self, transition: TransitionId) -> bool {
        self.transitions[transition]
            .arcs()
            .all(|arc| self.is_arc_enabled(arc))
    }

    pub fn update_transition<E: GuardEnv + ?Sized>(
        &mut self,
        transition: TransitionId,
        dt: Duration,
        env: &E,
    ) {
        let arcs_enabled = self.check_arcs(transition);
        let trans = &mut self.transitions[transition];
        trans.update(dt, arcs_enabled, env);
        log::trace!(
            "update {}: arcs={} guard={} enabled={} time_to_enable={:?}",
            trans.key,
            arcs_enabled,
            trans.is_guard_enabled(),
            trans.is_enabled(),
            trans.time_to_enable()
        );
    }

    /// Moves the tokens of an enabled transition and restarts its delay.
    pub fn fire(&mut self, transition: TransitionId) -> Result<FiredTransition, FireError> {
        let trans = &self.transitions[transition];
        if !trans.is_enabled() || !self.check_arcs(transition) {
            return Err(FireError::Disabled(trans.key.clone()));
        }

        let inputs = trans.inputs.clone();
        let outputs = trans.outputs.clone();
        for &arc in &inputs {
            let Arc { place, weight, .. } = self.arcs[arc];
            self.places[place].consume(weight);
        }
        for &arc in &outputs {
            let Arc { place, weight, .. } = self.arcs[arc];
            self.places[place].produce(weight);
        }

        let trans = &mut self.transitions[transition];
        trans.fired();
        log::debug!("fired {} ({})", trans.key, trans.name);

        Ok(FiredTransition {
            transition,
            key: trans.key.clone(),
            input_arcs: inputs.iter().map(|a| self.arcs[*a].key.clone()).collect(),
            output_arcs: outputs.iter().map(|a| self.arcs[*a].key.clone()).collect(),
        })
    }

    pub fn place_mark(&self, key: &str) -> Option<Mark> {
        self.place_id(key).map(|id| self.places[id].mark())
    }

    /// External override of a place's mark, bounded by the place type.
    pub fn set_place_mark(&mut self, key: &str, mark: i64) -> Result<(), MarkError> {
        let id = self
            .place_id(key)
            .ok_or_else(|| MarkError::UnknownPlace(key.to_owned()))?;
        let place = &mut self.places[id];
        let value = Mark::try_from(mark).map_err(|_| MarkError::Negative {
            id: key.to_owned(),
            mark,
        })?;
        if value > place.capacity() {
            return Err(MarkError::BoolOverflow {
                id: key.to_owned(),
                mark,
            });
        }
        place.set_mark(value);
        Ok(())
    }

    pub fn marks(&self) -> Vec<Mark> {
        self.places.iter().map(Place::mark).collect()
    }

    pub fn restart_places(&mut self) {
        self.places.iter_mut().for_each(Place::restart);
    }

    pub fn restart_transitions(&mut self) {
        self.transitions.iter_mut().for_each(Transition::restart);
    }
}
