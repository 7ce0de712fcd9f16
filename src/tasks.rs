pub mod diag;
pub mod refresh;
