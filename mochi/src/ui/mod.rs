//! UI module root: exposes drawing functions for individual panels.

pub mod boot;
pub mod console;
pub mod detail;
pub mod explorer;
pub mod header;
pub mod processes;
pub mod stats;
pub mod theme;
pub mod util;
