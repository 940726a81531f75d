//! Search and filter front end over a shared spreadsheet of maritime theses.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod state;
pub mod ui;
