pub mod check;
pub mod plan;
pub mod run;
pub mod schedule;
pub mod work;
