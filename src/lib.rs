#![allow(clippy::new_without_default)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

pub mod alignment;
pub mod config;
pub mod distance;
pub mod export_data;
pub mod feature_extractor;
pub mod gps_data;
pub mod import_data;
pub mod logs;
pub mod pipeline;
pub mod stats;
pub mod utils;

pub use pipeline::align_and_segment;
