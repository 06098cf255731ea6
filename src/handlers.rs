pub mod billing;
pub mod expenses;
pub mod segments;
pub mod sites;
pub mod summary;
