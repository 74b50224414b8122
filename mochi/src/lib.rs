//! Library surface for the Mochi UI: wire types, the bridge client and the
//! screen state that the binary drives.

pub mod app;
pub mod boot;
pub mod console;
pub mod explorer;
pub mod history;
pub mod types;
pub mod ui;
pub mod ws;
