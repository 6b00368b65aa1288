pub mod app;
pub mod audio;
pub mod config;
pub mod hand;
pub mod logging;
pub mod render;
pub mod scene;
pub mod signal;
pub mod terminal;
pub mod visual;
