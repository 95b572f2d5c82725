#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub(crate) mod api;
pub mod app;
pub mod classify;
pub(crate) mod clients;
pub mod config;
pub mod keepalive;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod scheduler;
pub(crate) mod util;
