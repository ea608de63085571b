#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use driftline_core::client::ProjectApi;
use driftline_core::document::split_pointer;
use driftline_core::patch::{JsonPatchOp, PatchOp};
use driftline_core::poll::{Poller, Sleeper};
use driftline_core::reconcile::Reconciler;
use json_patch::Patch;
use serde_json::{Map, Value};

/// In-memory project API whose reads trail writes by a configurable number
/// of fetches.
#[derive(Debug, Default)]
pub struct FakeProjectApi {
    state: RefCell<State>,
}

#[derive(Debug, Default)]
struct State {
    projects: HashMap<String, Project>,
    read_lag: u32,
    fetches: u32,
    patches: Vec<Vec<Value>>,
    fail_patches: Option<String>,
}

#[derive(Debug)]
struct Project {
    current: Value,
    stale: Option<Value>,
    stale_reads: u32,
    hidden_reads: u32,
}

impl FakeProjectApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(self, project_id: &str, document: Value) -> Self {
        self.state.borrow_mut().projects.insert(
            project_id.to_string(),
            Project {
                current: document,
                stale: None,
                stale_reads: 0,
                hidden_reads: 0,
            },
        );
        self
    }

    /// The project is invisible for the first `reads` fetches.
    pub fn hidden_for(self, project_id: &str, reads: u32) -> Self {
        if let Some(project) = self.state.borrow_mut().projects.get_mut(project_id) {
            project.hidden_reads = reads;
        }
        self
    }

    /// After each patch, the next `reads` fetches return the pre-patch document.
    pub fn with_read_lag(self, reads: u32) -> Self {
        self.state.borrow_mut().read_lag = reads;
        self
    }

    pub fn failing_patches(self, message: &str) -> Self {
        self.state.borrow_mut().fail_patches = Some(message.to_string());
        self
    }

    pub fn document(&self, project_id: &str) -> Value {
        self.state
            .borrow()
            .projects
            .get(project_id)
            .map(|project| project.current.clone())
            .unwrap_or(Value::Null)
    }

    pub fn fetch_count(&self) -> u32 {
        self.state.borrow().fetches
    }

    pub fn patch_count(&self) -> usize {
        self.state.borrow().patches.len()
    }

    /// Every patch batch received, serialized as sent over the wire.
    pub fn patches(&self) -> Vec<Vec<Value>> {
        self.state.borrow().patches.clone()
    }
}

impl ProjectApi for FakeProjectApi {
    fn fetch_config(&self, project_id: &str) -> anyhow::Result<Option<Value>> {
        let mut state = self.state.borrow_mut();
        state.fetches += 1;
        let Some(project) = state.projects.get_mut(project_id) else {
            return Ok(None);
        };
        if project.hidden_reads > 0 {
            project.hidden_reads -= 1;
            return Ok(None);
        }
        if project.stale_reads > 0 {
            project.stale_reads -= 1;
            if let Some(stale) = &project.stale {
                return Ok(Some(stale.clone()));
            }
        }
        Ok(Some(project.current.clone()))
    }

    fn patch_config(&self, project_id: &str, ops: &[JsonPatchOp]) -> anyhow::Result<Value> {
        let mut state = self.state.borrow_mut();
        if let Some(message) = &state.fail_patches {
            anyhow::bail!("{}", message);
        }
        state
            .patches
            .push(ops.iter().map(|op| serde_json::to_value(op).unwrap()).collect());
        let read_lag = state.read_lag;
        let Some(project) = state.projects.get_mut(project_id) else {
            anyhow::bail!("HTTP 404 Not Found: project {}", project_id);
        };

        let mut document = project.current.clone();
        apply_lenient(&mut document, ops)?;
        let previous = std::mem::replace(&mut project.current, document);
        if read_lag > 0 {
            project.stale = Some(previous);
            project.stale_reads = read_lag;
        }
        Ok(project.current.clone())
    }
}

/// Apply `ops` the way the project API does: writes to a missing path create
/// the parents, and a `replace` there behaves like `add`.
pub fn apply_lenient(document: &mut Value, ops: &[JsonPatchOp]) -> anyhow::Result<()> {
    for op in ops {
        let mut wire = serde_json::to_value(op)?;
        if op.op() != PatchOp::Remove && document.pointer(op.path()).is_none() {
            create_parents(document, op.path())?;
            wire["op"] = Value::from("add");
        }
        let patch: Patch = serde_json::from_value(Value::Array(vec![wire]))?;
        json_patch::patch(document, &patch)?;
    }
    Ok(())
}

/// Write `value` at `pointer`, creating parents as needed.
pub fn set_path(document: &mut Value, pointer: &str, value: Value) -> anyhow::Result<()> {
    apply_lenient(document, &[JsonPatchOp::replace(pointer, value)])
}

fn create_parents(document: &mut Value, pointer: &str) -> anyhow::Result<()> {
    let mut segments = split_pointer(pointer)?;
    segments.pop();
    let mut current = document;
    for segment in segments {
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map
                .entry(segment)
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(items) => {
                let index: usize = segment.parse()?;
                items
                    .get_mut(index)
                    .ok_or_else(|| anyhow::anyhow!("index {} out of bounds in {}", index, pointer))?
            }
            _ => anyhow::bail!("{} is not a container in {}", segment, pointer),
        };
    }
    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    Ok(())
}

/// Sleeper that returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

pub fn reconciler(api: &FakeProjectApi) -> Reconciler<&FakeProjectApi> {
    Reconciler::new(api).with_poller(Poller::default().with_sleeper(NoSleep))
}
