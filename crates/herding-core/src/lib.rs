//! Game rules, configuration, and orchestration for the herding game.
//!
//! This crate owns the per-tick phase cycle that drives a game: input,
//! shepherd controller, herd steering, hazards, world step, goal volume,
//! and session clock.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `herding-config.yaml` into
//!   strongly-typed structs.
//! - [`hazard`] -- Trap lifecycle state machine with landmine and spike
//!   payloads.
//! - [`input`] -- [`InputSource`] trait and [`StubInputSource`].
//! - [`runner`] -- Async run loop with pacing and end conditions.
//! - [`session`] -- Goal-volume counter and countdown ([`SessionCounter`]).
//! - [`tick`] -- The phase cycle ([`run_tick`]) over a [`GameState`].
//!
//! [`InputSource`]: input::InputSource
//! [`StubInputSource`]: input::StubInputSource
//! [`SessionCounter`]: session::SessionCounter
//! [`run_tick`]: tick::run_tick
//! [`GameState`]: tick::GameState

pub mod config;
pub mod hazard;
pub mod input;
pub mod runner;
pub mod session;
pub mod tick;
