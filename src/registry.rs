use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use serde_json::json;

use crate::errors::DeployError;
use crate::services::logger::Logger;

pub type RoutineResult = Result<(), DeployError>;

type Routine = Box<dyn Fn(PathBuf) -> BoxFuture<'static, RoutineResult> + Send + Sync>;

/// Explicit registry of named deployment routines compiled into the binary.
///
/// Routines run sequentially in registration order; the first non-success
/// outcome is fatal and aborts any further routines.
pub struct DeployRegistry {
    logger: Logger,
    routines: Vec<(String, Routine)>,
}

impl DeployRegistry {
    pub fn new() -> Self {
        Self {
            logger: Logger::new("deploykit").child("registry"),
            routines: Vec::new(),
        }
    }

    /// Register a routine under a unique name. The routine receives the
    /// workspace path when invoked.
    pub fn register<F>(&mut self, name: &str, routine: F) -> Result<(), DeployError>
    where
        F: Fn(PathBuf) -> BoxFuture<'static, RoutineResult> + Send + Sync + 'static,
    {
        if self.routines.iter().any(|(existing, _)| existing == name) {
            return Err(DeployError::config(format!(
                "deployment routine '{}' is already registered",
                name
            )));
        }
        self.routines.push((name.to_string(), Box::new(routine)));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    /// Invoke every registered routine against the workspace, in order,
    /// stopping at the first failure.
    pub async fn run_all(&self, workspace: &Path) -> Result<(), DeployError> {
        for (name, routine) in &self.routines {
            self.logger
                .info(&format!("[ DEPLOY ]: {}", name), None);
            if let Err(err) = routine(workspace.to_path_buf()).await {
                self.logger.error(
                    &format!("deployment routine '{}' failed", name),
                    Some(&json!({ "kind": err.kind(), "error": err.to_string() })),
                );
                return Err(err);
            }
        }
        Ok(())
    }
}

impl Default for DeployRegistry {
    fn default() -> Self {
        Self::new()
    }
}
