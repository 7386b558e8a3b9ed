//! Scripted stand-ins for the OS collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tabcwd_core::{
    Backends, CwdError, CwdResolver, Dispatch, OpenFileTable, Platform, ProcessRecord,
    ProcessTable, ResolvedPath, ResolverConfig, Result, SessionRegistry, ToolRunner,
};
use tabcwd_protocol::HostEvent;

#[derive(Default)]
pub struct FakeOpenFiles {
    responses: Mutex<HashMap<u32, VecDeque<(Duration, Result<ResolvedPath>)>>>,
    pub calls: Mutex<Vec<u32>>,
}

impl FakeOpenFiles {
    pub fn respond(&self, pid: u32, delay: Duration, response: Result<ResolvedPath>) {
        self.responses
            .lock()
            .expect("lock responses")
            .entry(pid)
            .or_default()
            .push_back((delay, response));
    }

    pub fn respond_with(&self, pid: u32, cwd: &str) {
        self.respond(pid, Duration::ZERO, Ok(ResolvedPath::new(cwd)));
    }
}

#[async_trait]
impl OpenFileTable for FakeOpenFiles {
    async fn cwd_of(&self, pid: u32) -> Result<ResolvedPath> {
        self.calls.lock().expect("lock calls").push(pid);
        let next = self
            .responses
            .lock()
            .expect("lock responses")
            .get_mut(&pid)
            .and_then(VecDeque::pop_front);
        match next {
            Some((delay, response)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                response
            }
            None => Err(CwdError::ProcessGone { pid }),
        }
    }
}

#[derive(Default)]
pub struct FakeProcessTable {
    children: Mutex<HashMap<u32, Vec<ProcessRecord>>>,
    pub queried: Mutex<Vec<u32>>,
}

impl FakeProcessTable {
    /// Registers `wrapper_pid` as alive with the given children.
    pub fn with_children(self, wrapper_pid: u32, children: Vec<ProcessRecord>) -> Self {
        self.children
            .lock()
            .expect("lock children")
            .insert(wrapper_pid, children);
        self
    }
}

impl ProcessTable for FakeProcessTable {
    fn children_of(&self, parent_pid: u32) -> Result<Vec<ProcessRecord>> {
        self.queried.lock().expect("lock queried").push(parent_pid);
        self.children
            .lock()
            .expect("lock children")
            .get(&parent_pid)
            .cloned()
            .ok_or(CwdError::ProcessGone { pid: parent_pid })
    }
}

pub fn process(name: &str, pid: u32, parent_pid: u32, exe: Option<&str>) -> ProcessRecord {
    ProcessRecord {
        name: name.to_string(),
        executable_path: exe.map(PathBuf::from),
        pid,
        parent_pid: Some(parent_pid),
    }
}

/// Answers tool invocations in order and records them.
#[derive(Default)]
pub struct ScriptedRunner {
    responses: Mutex<VecDeque<Result<String>>>,
    pub calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
}

impl ScriptedRunner {
    pub fn then(self, response: Result<String>) -> Self {
        self.responses
            .lock()
            .expect("lock responses")
            .push_back(response);
        self
    }

    pub fn then_output(self, output: &str) -> Self {
        self.then(Ok(output.to_string()))
    }

    pub fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.calls.lock().expect("lock calls").clone()
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<String> {
        self.calls
            .lock()
            .expect("lock calls")
            .push((program.to_path_buf(), args.to_vec()));
        self.responses
            .lock()
            .expect("lock responses")
            .pop_front()
            .unwrap_or_else(|| {
                Err(CwdError::ToolUnavailable {
                    tool: program.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
            })
    }
}

#[derive(Default)]
pub struct RecordingDispatch {
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingDispatch {
    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().expect("lock events").clone()
    }

    pub fn cwds(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|event| match event {
                HostEvent::SessionSetCwd { cwd } => cwd,
            })
            .collect()
    }
}

impl Dispatch for RecordingDispatch {
    fn dispatch(&self, event: HostEvent) {
        self.events.lock().expect("lock events").push(event);
    }
}

pub struct Harness {
    pub resolver: Arc<CwdResolver>,
    pub registry: Arc<SessionRegistry>,
    pub dispatch: Arc<RecordingDispatch>,
    pub open_files: Arc<FakeOpenFiles>,
    pub processes: Arc<FakeProcessTable>,
    pub runner: Arc<ScriptedRunner>,
}

pub fn harness(
    platform: Platform,
    config: ResolverConfig,
    processes: FakeProcessTable,
    runner: ScriptedRunner,
) -> Harness {
    let open_files = Arc::new(FakeOpenFiles::default());
    let processes = Arc::new(processes);
    let runner = Arc::new(runner);
    let registry = Arc::new(SessionRegistry::new());
    let dispatch = Arc::new(RecordingDispatch::default());
    let resolver = CwdResolver::new(
        platform,
        &config,
        Backends {
            open_files: open_files.clone(),
            processes: processes.clone(),
            runner: runner.clone(),
        },
        registry.clone(),
        dispatch.clone(),
    );
    Harness {
        resolver: Arc::new(resolver),
        registry,
        dispatch,
        open_files,
        processes,
        runner,
    }
}

pub fn posix_harness() -> Harness {
    harness(
        Platform::Posix,
        ResolverConfig::default(),
        FakeProcessTable::default(),
        ScriptedRunner::default(),
    )
}
