//! Where instances come from and where solutions go.
//!
//! A request names an instance; [`handle_request`] loads it from an
//! [`InstanceSource`], solves it, and hands the result to a [`ResultSink`].

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, instrument};

use crate::error::CvrpError;
use crate::models::{Instance, InstanceData, SolveStatus, Solution, UsedArc};
use crate::solver::{CancelToken, MipBackend, SolverDriver};

/// Provides instances by identifier.
pub trait InstanceSource {
    /// Loads and validates the instance stored under `id`.
    fn load_instance(&self, id: &str) -> Result<Instance, CvrpError>;
}

/// Receives finished solutions.
pub trait ResultSink {
    /// Publishes `solution`.
    fn deliver(&mut self, solution: &Solution) -> Result<(), CvrpError>;
}

/// In-memory instance store.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    instances: HashMap<String, InstanceData>,
}

impl MemorySource {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` under `id`, replacing any previous entry.
    pub fn insert(&mut self, id: impl Into<String>, data: InstanceData) {
        self.instances.insert(id.into(), data);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_instance(mut self, id: impl Into<String>, data: InstanceData) -> Self {
        self.insert(id, data);
        self
    }
}

impl InstanceSource for MemorySource {
    fn load_instance(&self, id: &str) -> Result<Instance, CvrpError> {
        let data = self
            .instances
            .get(id)
            .ok_or_else(|| CvrpError::NotFound { id: id.to_string() })?;
        Instance::from_data(id, data.clone())
    }
}

/// Reads `<root>/<id>.json` documents in the [`InstanceData`] layout.
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    root: PathBuf,
}

impl JsonDirectorySource {
    /// Creates a source over `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, id: &str) -> Option<PathBuf> {
        if id.is_empty() || id.contains(|c: char| c == '/' || c == '\\') || id == ".." {
            return None;
        }
        Some(self.root.join(format!("{id}.json")))
    }
}

impl InstanceSource for JsonDirectorySource {
    fn load_instance(&self, id: &str) -> Result<Instance, CvrpError> {
        let not_found = || CvrpError::NotFound { id: id.to_string() };
        let path = self.path_for(id).ok_or_else(not_found)?;
        let text = fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => not_found(),
            _ => CvrpError::Malformed {
                id: id.to_string(),
                message: e.to_string(),
            },
        })?;
        let data: InstanceData = serde_json::from_str(&text).map_err(|e| CvrpError::Malformed {
            id: id.to_string(),
            message: e.to_string(),
        })?;
        Instance::from_data(id, data)
    }
}

/// Wire form of a delivered solution.
#[derive(Serialize)]
struct SolutionPayload<'a> {
    instance: &'a str,
    routes: Vec<Vec<usize>>,
    arcs: &'a [UsedArc],
    objective: f64,
    status: SolveStatus,
}

/// Writes each solution as one line of JSON.
///
/// ```
/// use u_cvrp::models::{SolveStatus, Solution};
/// use u_cvrp::source::{JsonSink, ResultSink};
///
/// let mut sink = JsonSink::new(Vec::new());
/// sink.deliver(&Solution::new("empty", vec![], vec![], SolveStatus::Optimal)).unwrap();
/// let text = String::from_utf8(sink.into_inner()).unwrap();
/// assert!(text.contains("\"status\":\"optimal\""));
/// ```
#[derive(Debug)]
pub struct JsonSink<W> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for JsonSink<W> {
    fn deliver(&mut self, solution: &Solution) -> Result<(), CvrpError> {
        let payload = SolutionPayload {
            instance: solution.instance(),
            routes: solution.route_vertices(),
            arcs: solution.arcs(),
            objective: solution.objective(),
            status: solution.status(),
        };
        let delivery = |message: String| CvrpError::Delivery { message };
        serde_json::to_writer(&mut self.writer, &payload).map_err(|e| delivery(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .and_then(|()| self.writer.flush())
            .map_err(|e| delivery(e.to_string()))
    }
}

/// Loads instance `id`, solves it, and delivers the result.
///
/// `cancel` is handed to [`SolverDriver::solve`]; a cancelled solve still
/// delivers its incumbent. Errors from any stage are returned unchanged;
/// nothing is delivered when loading or solving fails.
#[instrument(skip(driver, source, sink, cancel))]
pub fn handle_request<B, S, R>(
    driver: &SolverDriver<B>,
    source: &S,
    sink: &mut R,
    id: &str,
    cancel: Option<&CancelToken>,
) -> Result<Solution, CvrpError>
where
    B: MipBackend,
    S: InstanceSource + ?Sized,
    R: ResultSink + ?Sized,
{
    let instance = source.load_instance(id)?;
    info!(customers = instance.num_customers(), "instance loaded");
    let solution = driver.solve(&instance, cancel)?;
    sink.deliver(&solution)?;
    Ok(solution)
}
