//! kemsim: a discrete-time 2-D particle simulator of the reversible reaction
//! A + B ⇌ C + D (plus an inert species X), combining hard-disc elastic
//! collision physics with an energy-gated stochastic reaction model.
//!
//! The engine lives in [`core`]: a [`core::Simulation`] owns the particle
//! population and the tunable reaction parameters, steps the system in a
//! background tick loop, and commits one immutable [`core::State`] snapshot
//! per tick to an append-only history. External consumers (renderers,
//! control panels) only ever see those snapshots.
//!
//! With the `python` feature enabled the crate also builds as a Python
//! extension module exposing the same surface through the `python` module's
//! `KemSim` class.

pub mod core;
pub mod error;

#[cfg(feature = "python")]
pub mod python;
