//! Execution core for automation Petri nets: INT/BOOL places, test and
//! inhibitor arcs, input-driven guards with edge triggers, delayed
//! transitions, three firing policies and a structured-text generator.
#![warn(non_snake_case)]

pub mod codegen;
pub mod config;
pub mod guard;
pub mod net;
pub mod options;
pub mod sim;
