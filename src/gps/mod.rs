// src/gps/mod.rs
//! NMEA framing, decoding and fix sampling

pub mod data;
pub mod framer;
pub mod nmea;
pub mod sampler;

pub use data::{Fix, Position};
pub use sampler::{FixSampler, SamplerSettings};
