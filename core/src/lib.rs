//! mulan-core: post-processing of MuLAN MacArthur simulation output.
//!
//! Data flows one way:
//!   store  → Run / Frame (read-only)
//!          → extract / aggregate / graph / peaks / contour (pure)
//!          → export (files for an external renderer)

pub mod aggregate;
pub mod animation;
pub mod config;
pub mod contour;
pub mod error;
pub mod export;
pub mod extract;
pub mod frame;
pub mod graph;
pub mod peaks;
pub mod rng;
pub mod run;
pub mod store;
pub mod synthetic;
pub mod types;
