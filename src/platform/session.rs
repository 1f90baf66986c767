//! Deployment and run session
//!
//! [`Session::create_app`] installs a process the first time, reuses the
//! latest revision while the content hash is unchanged, and creates a new
//! revision otherwise. The hash is stamped on the document as `sbg:hash`.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::config::PlatformConfig;
use crate::error::{CwlError, Result};
use crate::io::content_hash;
use crate::platform::SbgHint;
use crate::process::{Process, ProcessLike};

/// Document key holding the content hash of an installed revision.
pub const HASH_KEY: &str = "sbg:hash";

const TASK_TIME_FORMAT: &str = "%Y.%m.%dT%H:%M:%S";

/// A stored app revision.
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledApp {
    /// `<project>/<process id>`
    pub id: String,
    pub revision: u32,
    pub raw: Value,
}

impl InstalledApp {
    pub fn hash(&self) -> Option<&str> {
        self.raw.get(HASH_KEY).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Draft,
    Queued,
}

/// Task created for an app revision.
#[derive(Debug, Clone, PartialEq)]
pub struct RunHandle {
    pub id: String,
    pub name: String,
    pub project: String,
    pub app_id: String,
    pub revision: u32,
    pub inputs: Value,
    pub status: TaskStatus,
}

/// Remote app and task store.
pub trait AppRegistry: Send + Sync {
    /// Latest revision of `app_id`, if installed
    fn latest(&self, app_id: &str) -> Result<Option<InstalledApp>>;

    fn install(&self, app_id: &str, raw: Value) -> Result<InstalledApp>;

    fn create_revision(&self, app_id: &str, raw: Value, revision: u32) -> Result<InstalledApp>;

    /// Create a draft task
    fn create_task(&self, name: &str, project: &str, app: &InstalledApp, inputs: Value) -> Result<RunHandle>;

    /// Queue a draft task for execution
    fn run_task(&self, task: &RunHandle) -> Result<RunHandle>;
}

pub struct Session<R: AppRegistry> {
    registry: R,
    platform: PlatformConfig,
}

impl<R: AppRegistry> Session<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            platform: PlatformConfig::default(),
        }
    }

    pub fn with_platform(registry: R, platform: PlatformConfig) -> Self {
        Self { registry, platform }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Install `process` or create a new revision if its content changed.
    pub fn create_app(&self, process: &mut Process, project: &str) -> Result<InstalledApp> {
        let id = process.id().ok_or_else(|| CwlError::InvalidId {
            id: String::new(),
            reason: "a process needs an id to be installed".into(),
        })?;
        let app_id = format!("{project}/{id}");
        let hash = content_hash(process)?;

        match self.registry.latest(&app_id)? {
            None => {
                stamp(process, &hash);
                let app = self.registry.install(&app_id, process.to_value()?)?;
                tracing::info!(app = %app_id, "installed app");
                Ok(app)
            }
            Some(app) if app.hash() == Some(hash.as_str()) => {
                tracing::info!(app = %app_id, revision = app.revision, "app unchanged");
                Ok(app)
            }
            Some(app) => {
                stamp(process, &hash);
                let revision = app.revision + 1;
                let app = self.registry.create_revision(&app_id, process.to_value()?, revision)?;
                tracing::info!(app = %app_id, revision, "created app revision");
                Ok(app)
            }
        }
    }

    /// Create a draft task named `<label or id> - <timestamp>`.
    pub fn draft(&self, project: &str, process: &mut Process, inputs: Value, hints: Vec<SbgHint>) -> Result<RunHandle> {
        for hint in hints {
            process.add_hint(hint);
        }
        let title = process
            .label()
            .or_else(|| process.id())
            .unwrap_or("app")
            .to_string();
        let name = format!("{title} - {}", chrono::Local::now().format(TASK_TIME_FORMAT));

        let app = self.create_app(process, project)?;
        self.registry.create_task(&name, project, &app, inputs)
    }

    /// Draft a task and queue it.
    pub fn run(&self, project: &str, process: &mut Process, inputs: Value, hints: Vec<SbgHint>) -> Result<RunHandle> {
        let task = self.draft(project, process, inputs, hints)?;
        let task = self.registry.run_task(&task)?;
        tracing::info!(task = %task.id, name = %task.name, "task queued");
        Ok(task)
    }

    /// [`Session::run`] in the configured default project.
    pub fn run_default(&self, process: &mut Process, inputs: Value, hints: Vec<SbgHint>) -> Result<RunHandle> {
        let project = self.platform.project.clone().ok_or_else(|| CwlError::Config {
            reason: "no default project configured (set [platform].project or CWLFORGE_PROJECT)".into(),
        })?;
        self.run(&project, process, inputs, hints)
    }
}

fn stamp(process: &mut Process, hash: &str) {
    process
        .base_mut()
        .extensions
        .insert(HASH_KEY.to_string(), Value::String(hash.to_string()));
}

// ============================================================================
// IN-MEMORY REGISTRY
// ============================================================================

/// In-process [`AppRegistry`] keeping every revision and task.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    apps: Mutex<HashMap<String, Vec<InstalledApp>>>,
    tasks: Mutex<Vec<RunHandle>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All revisions of `app_id`, oldest first
    pub fn revisions(&self, app_id: &str) -> Vec<InstalledApp> {
        self.apps
            .lock()
            .map(|apps| apps.get(app_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn tasks(&self) -> Vec<RunHandle> {
        self.tasks.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn store(&self, app_id: &str, raw: Value, revision: u32) -> Result<InstalledApp> {
        let mut apps = self.apps.lock().map_err(|_| poisoned(app_id))?;
        let app = InstalledApp {
            id: app_id.to_string(),
            revision,
            raw,
        };
        apps.entry(app_id.to_string()).or_default().push(app.clone());
        Ok(app)
    }
}

fn poisoned(app_id: &str) -> CwlError {
    CwlError::Registry {
        app_id: app_id.to_string(),
        reason: "registry lock poisoned".into(),
    }
}

impl AppRegistry for MemoryRegistry {
    fn latest(&self, app_id: &str) -> Result<Option<InstalledApp>> {
        let apps = self.apps.lock().map_err(|_| poisoned(app_id))?;
        Ok(apps.get(app_id).and_then(|revisions| revisions.last().cloned()))
    }

    fn install(&self, app_id: &str, raw: Value) -> Result<InstalledApp> {
        if self.latest(app_id)?.is_some() {
            return Err(CwlError::Registry {
                app_id: app_id.to_string(),
                reason: "app already installed".into(),
            });
        }
        self.store(app_id, raw, 0)
    }

    fn create_revision(&self, app_id: &str, raw: Value, revision: u32) -> Result<InstalledApp> {
        let expected = self.latest(app_id)?.map(|app| app.revision + 1).unwrap_or(0);
        if revision != expected {
            return Err(CwlError::Registry {
                app_id: app_id.to_string(),
                reason: format!("expected revision {expected}, got {revision}"),
            });
        }
        self.store(app_id, raw, revision)
    }

    fn create_task(&self, name: &str, project: &str, app: &InstalledApp, inputs: Value) -> Result<RunHandle> {
        let mut tasks = self.tasks.lock().map_err(|_| poisoned(&app.id))?;
        let task = RunHandle {
            id: format!("task-{}", tasks.len() + 1),
            name: name.to_string(),
            project: project.to_string(),
            app_id: app.id.clone(),
            revision: app.revision,
            inputs,
            status: TaskStatus::Draft,
        };
        tasks.push(task.clone());
        Ok(task)
    }

    fn run_task(&self, task: &RunHandle) -> Result<RunHandle> {
        let mut tasks = self.tasks.lock().map_err(|_| poisoned(&task.app_id))?;
        let stored = tasks.iter_mut().find(|t| t.id == task.id).ok_or_else(|| CwlError::Registry {
            app_id: task.app_id.clone(),
            reason: format!("unknown task '{}'", task.id),
        })?;
        stored.status = TaskStatus::Queued;
        Ok(stored.clone())
    }
}
