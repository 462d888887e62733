pub mod runtime;
pub mod status_bar;
pub mod theme;
