//! Act - sample tester for online judge contests
//!
//! Compiles a task's solution when its source changed and checks it
//! against the sample files scraped from the problem statement.

pub mod checksum;
pub mod compiler;
pub mod config;
pub mod error;
pub mod layout;
pub mod runner;
pub mod tester;

pub use config::Config;
pub use error::{ActError, Result};
pub use tester::{TestReport, Tester};
