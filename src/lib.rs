#![deny(unused_must_use)]

//! A library for continuous proximity queries over moving, bounded objects.
//!
//! Objects ([`object::Object`]) and queries ([`query::Query`]) are
//! registered with a [`handler::QueryHandler`] — either [`handler::BruteForceHandler`]
//! or [`handler::RTreeHandler`] — which is ticked forward in simulation
//! time to recompute each query's result set and deliver `Added`/`Removed`
//! events through its event queue.

pub mod geometry;
pub mod handler;
pub mod listener;
pub mod motion;
pub mod object;
pub mod object_id;
pub mod query;
pub mod query_cache;
pub mod time;

pub use nalgebra;
