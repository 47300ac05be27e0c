mod builder;
mod cli;

pub use builder::*;
pub use clap;
pub use cli::*;
