//! Lookout dashboard host library.
//!
//! Reads a plugin-list configuration, resolves and instantiates each widget
//! against the registry, places them on a grid and drives the render and
//! polling loops.

#![forbid(unsafe_code)]

pub mod app;
pub mod config;
pub mod demo;
pub mod error;
pub mod events;
pub mod grid;
pub mod ui;
