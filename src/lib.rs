pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod history;
pub mod model;
pub mod normalize;
pub mod output;
pub mod render;
pub mod storage;
pub mod ui;

#[cfg(test)]
mod tests;
