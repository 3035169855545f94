//! Ping-pong referee
//!
//! Watches a table from a fixed camera, tracks the ball in each half of the
//! frame and keeps score: a ball that rests in a half's scoring zone long
//! enough is a point for the other side.

pub mod capture;
pub mod clock;
pub mod config;
pub mod detection;
pub mod display;
pub mod error;
pub mod game;
pub mod messaging;
pub mod overlay;
pub mod runner;
pub mod trace;
pub mod utils;
