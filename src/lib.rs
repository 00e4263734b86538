#![allow(clippy::new_without_default)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

pub mod error;
pub mod export;
pub mod geo;
pub mod geocoder;
pub mod location_provider;
pub mod logs;
pub mod marker;
pub mod route;
pub mod service;
pub mod share;
pub mod stats;
pub mod store;
