pub mod finding;
pub mod policy;

pub use finding::{Evidence, Finding, FindingCategory, Severity};
