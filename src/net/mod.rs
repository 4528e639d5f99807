//! # 自动化 Petri 网核心定义
//!
//! 库所分为 `INT`（非负整数标识）与 `BOOL`（标识取 0 或 1）两类，
//! 弧分为输入、输出、测试与抑制四类。对库所 `p` 的当前标识 `M(p)` 与弧权重 `w`：
//!
//! * 输入弧、测试弧使能当且仅当 `w ≤ M(p)`；
//! * 抑制弧使能当且仅当 `w > M(p)`；
//! * 输出弧指向 `INT` 库所时总是使能，指向 `BOOL` 库所时要求 `M(p) = 0`。
//!
//! 迁移在所有弧使能且守卫成立、并连续保持 `delay` 时长后才可发生。
//! 发生时输入弧消耗、输出弧产生标识；`BOOL` 库所被直接清零或置一。
//!
//! ## 示例
//!
//! ```rust
//! use std::time::Duration;
//! use rust_apn::guard::EdgeSnapshot;
//! use rust_apn::net::*;
//!
//! let data = NetData {
//!     places: vec![
//!         PlaceData::new("P1", "p1", PlaceType::Int, 2),
//!         PlaceData::new("P2", "p2", PlaceType::Int, 0),
//!     ],
//!     transitions: vec![TransData::new("T1", "t1")],
//!     arcs: vec![
//!         ArcData::new("A1", "P1", "T1", ArcKind::Input, 2),
//!         ArcData::new("A2", "P2", "T1", ArcKind::Output, 1),
//!     ],
//!     ..NetData::default()
//! };
//! let mut net = Net::from_data(&data).unwrap();
//! let t1 = net.transition_id("T1").unwrap();
//!
//! let env = EdgeSnapshot { current: &[], previous: &[] };
//! net.update_transition(t1, Duration::from_millis(10), &env);
//! net.fire(t1).unwrap();
//! assert_eq!(net.place_mark("P1"), Some(0));
//! assert_eq!(net.place_mark("P2"), Some(1));
//! ```

pub mod core;
pub mod data;
pub mod ids;
pub mod index_vec;
pub mod io;
pub mod structure;

pub use core::{FireError, FiredTransition, MarkError, Net, NetError};
pub use data::{
    ArcData, ArcKind, ElementId, InputData, NetData, PlaceData, PlaceType, PriorityMode,
    SimConfig, SimModeKind, TransData,
};
pub use ids::{ArcId, PlaceId, TransitionId};
pub use index_vec::{Idx, IndexVec};
pub use io::{read_net, write_net, IoError};
pub use structure::{Arc, Mark, Place, Transition, TransitionState};
