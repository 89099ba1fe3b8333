pub mod profile;
pub mod recommendation;
pub mod report;
pub mod signals;
