pub mod error;
pub mod formulas;
