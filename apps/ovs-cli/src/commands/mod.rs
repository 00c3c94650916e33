pub mod plan;
pub mod risk;
pub mod run;
pub mod runs;
