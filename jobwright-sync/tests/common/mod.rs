//! In-memory job registry that records every call.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;

use jobwright_core::JobName;
use jobwright_sync::{ClientError, JobHandle, JobRegistry, JobSnapshot};

/// Route `log` output through the test harness; `RUST_LOG=debug` shows it.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
pub struct FakeRegistry {
    jobs: RefCell<BTreeMap<String, String>>,
    calls: RefCell<Vec<String>>,
    failing: RefCell<Vec<&'static str>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        FakeRegistry::default()
    }

    /// Make every later call to `op` fail with HTTP 500.
    pub fn fail_on(&self, op: &'static str) {
        self.failing.borrow_mut().push(op);
    }

    pub fn recover(&self) {
        self.failing.borrow_mut().clear();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Calls that change registry state.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("exists ") && !c.starts_with("get "))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn document(&self, name: &str) -> Option<String> {
        self.jobs.borrow().get(name).cloned()
    }

    pub fn job_names(&self) -> Vec<String> {
        self.jobs.borrow().keys().cloned().collect()
    }

    /// Delete a job behind the reconciler's back.
    pub fn remove_out_of_band(&self, name: &str) {
        self.jobs.borrow_mut().remove(name);
    }

    fn record(&self, op: &'static str, name: &str) -> Result<(), ClientError> {
        self.calls.borrow_mut().push(format!("{op} {name}"));
        if self.failing.borrow().contains(&op) {
            return Err(ClientError::Status {
                status: 500,
                message: format!("{op} refused"),
            });
        }
        Ok(())
    }

    fn not_found(name: &str) -> ClientError {
        ClientError::Status {
            status: 404,
            message: format!("no job named {name}"),
        }
    }
}

impl JobRegistry for FakeRegistry {
    fn exists(&self, name: &JobName) -> Result<bool, ClientError> {
        self.record("exists", name.as_str())?;
        Ok(self.jobs.borrow().contains_key(name.as_str()))
    }

    fn get(&self, name: &JobName) -> Result<Option<JobSnapshot>, ClientError> {
        self.record("get", name.as_str())?;
        Ok(self.jobs.borrow().get(name.as_str()).map(|_| JobSnapshot {
            name: name.to_string(),
            ..JobSnapshot::default()
        }))
    }

    fn create(&self, name: &JobName, document: &str) -> Result<JobHandle, ClientError> {
        self.record("create", name.as_str())?;
        let mut jobs = self.jobs.borrow_mut();
        if jobs.contains_key(name.as_str()) {
            return Err(ClientError::Status {
                status: 400,
                message: format!("a job already exists with the name {name}"),
            });
        }
        jobs.insert(name.to_string(), document.to_string());
        Ok(JobHandle::new(name.clone()))
    }

    fn update(&self, handle: &JobHandle, document: &str) -> Result<(), ClientError> {
        self.record("update", handle.name().as_str())?;
        let mut jobs = self.jobs.borrow_mut();
        let slot = jobs
            .get_mut(handle.name().as_str())
            .ok_or_else(|| Self::not_found(handle.name().as_str()))?;
        *slot = document.to_string();
        Ok(())
    }

    fn rename(&self, handle: &JobHandle, new_name: &JobName) -> Result<JobHandle, ClientError> {
        self.record("rename", handle.name().as_str())?;
        let mut jobs = self.jobs.borrow_mut();
        let document = jobs
            .remove(handle.name().as_str())
            .ok_or_else(|| Self::not_found(handle.name().as_str()))?;
        jobs.insert(new_name.to_string(), document);
        Ok(JobHandle::new(new_name.clone()))
    }

    fn delete(&self, name: &JobName) -> Result<(), ClientError> {
        self.record("delete", name.as_str())?;
        self.jobs
            .borrow_mut()
            .remove(name.as_str())
            .map(|_| ())
            .ok_or_else(|| Self::not_found(name.as_str()))
    }
}
