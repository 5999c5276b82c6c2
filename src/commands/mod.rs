pub mod cli;
pub mod run;

pub use run::execute as run;
