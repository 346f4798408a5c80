//! Live-cluster stories
//!
//! - `deployment_lifecycle`: the full create, wait, scale, wait, delete run
//!   against the real Seldon operator, plus the individual steps

mod deployment_lifecycle;
