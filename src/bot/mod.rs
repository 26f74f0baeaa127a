pub mod commands;
pub mod discord;
pub mod handlers;

pub use discord::run;
