//! Branch-and-cut solve: configuration, engine seam, and the driver.

mod backend;
mod config;
mod driver;
mod microlp;

pub use backend::{BackendError, MipBackend, MipOutcome, MipStatus, OptimizeRequest};
pub use config::{CancelToken, SolverConfig};
pub use driver::SolverDriver;
pub use microlp::MicroLpBackend;
