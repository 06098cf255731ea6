pub mod billing;
pub mod expense;
pub mod segment;
pub mod site;
pub mod summary;
