pub mod config;
pub mod countdown;
pub mod gate;
pub mod simulate;
pub mod watch;
