//! Shared doubles for the integration tests: an in-memory engine and host.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use toolbx::create::{Console, PromptError};
use toolbx::engine::{Engine, EngineError};
use toolbx::host::Host;
use toolbx::identity::HostIdentity;

type Hook = Box<dyn FnMut() + Send>;

/// Engine that records calls instead of running Podman. Safe to share
/// between threads.
pub struct StubEngine {
    version: Mutex<String>,
    containers: Mutex<Vec<String>>,
    images: Mutex<Vec<String>>,
    image_size: Option<u64>,
    migrations: AtomicUsize,
    pulls: AtomicUsize,
    invocations: Mutex<Vec<Vec<String>>>,
    migrate_hook: Mutex<Option<Hook>>,
}

impl StubEngine {
    pub fn new(version: &str) -> Self {
        Self {
            version: Mutex::new(version.to_string()),
            containers: Mutex::new(Vec::new()),
            images: Mutex::new(Vec::new()),
            image_size: None,
            migrations: AtomicUsize::new(0),
            pulls: AtomicUsize::new(0),
            invocations: Mutex::new(Vec::new()),
            migrate_hook: Mutex::new(None),
        }
    }

    pub fn with_container(self, name: &str) -> Self {
        self.containers.lock().unwrap().push(name.to_string());
        self
    }

    pub fn with_image(self, image: &str) -> Self {
        self.images.lock().unwrap().push(image.to_string());
        self
    }

    pub fn with_image_size(mut self, bytes: u64) -> Self {
        self.image_size = Some(bytes);
        self
    }

    /// Run `hook` inside every `system_migrate` call.
    pub fn on_migrate(&self, hook: impl FnMut() + Send + 'static) {
        *self.migrate_hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn set_version(&self, version: &str) {
        *self.version.lock().unwrap() = version.to_string();
    }

    pub fn migrations(&self) -> usize {
        self.migrations.load(Ordering::SeqCst)
    }

    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }

    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations.lock().unwrap().clone()
    }
}

impl Engine for StubEngine {
    fn container_exists(&self, name: &str) -> Result<bool, EngineError> {
        Ok(self.containers.lock().unwrap().iter().any(|c| c == name))
    }

    fn image_exists(&self, image: &str) -> Result<bool, EngineError> {
        Ok(self.images.lock().unwrap().iter().any(|i| i == image))
    }

    fn is_toolbox_image(&self, _image: &str) -> Result<bool, EngineError> {
        Ok(true)
    }

    fn image_size(&self, image: &str) -> Result<u64, EngineError> {
        self.image_size.ok_or_else(|| EngineError::Parse {
            command: format!("skopeo inspect docker://{image}"),
            reason: "no layers".into(),
        })
    }

    fn pull(&self, image: &str, _auth_file: Option<&Path>) -> Result<(), EngineError> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        self.images.lock().unwrap().push(image.to_string());
        Ok(())
    }

    fn version(&self) -> Result<String, EngineError> {
        Ok(self.version.lock().unwrap().clone())
    }

    fn system_migrate(&self, _new_runtime: Option<&str>) -> Result<(), EngineError> {
        self.migrations.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = self.migrate_hook.lock().unwrap().as_mut() {
            hook();
        }
        Ok(())
    }

    fn invoke(&self, args: &[String]) -> Result<(), EngineError> {
        self.invocations.lock().unwrap().push(args.to_vec());
        Ok(())
    }
}

/// Host described in memory.
#[derive(Debug, Default, Clone)]
pub struct MemHost {
    paths: HashSet<PathBuf>,
    symlinks: HashSet<PathBuf>,
    vars: HashMap<String, String>,
}

impl MemHost {
    pub fn with_paths(paths: &[&str]) -> Self {
        Self {
            paths: paths.iter().map(PathBuf::from).collect(),
            ..Self::default()
        }
    }

    pub fn symlink(mut self, path: &str) -> Self {
        self.paths.insert(PathBuf::from(path));
        self.symlinks.insert(PathBuf::from(path));
        self
    }

    pub fn var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }
}

impl Host for MemHost {
    fn exists(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.symlinks.contains(path)
    }

    fn env(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Console with a fixed answer that remembers what it was asked.
pub struct CannedConsole {
    pub interactive: bool,
    pub answer: String,
    pub asked: Vec<String>,
}

impl CannedConsole {
    pub fn answering(answer: &str) -> Self {
        Self {
            interactive: true,
            answer: answer.to_string(),
            asked: Vec::new(),
        }
    }

    pub fn piped() -> Self {
        Self {
            interactive: false,
            answer: String::new(),
            asked: Vec::new(),
        }
    }
}

impl Console for &mut CannedConsole {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn ask(&mut self, prompt: &str) -> Result<String, PromptError> {
        self.asked.push(prompt.to_string());
        Ok(self.answer.clone())
    }
}

pub fn identity(user: &str, uid: u32) -> HostIdentity {
    HostIdentity {
        user: Some(user.to_string()),
        uid,
        gid: uid,
        home: Some(PathBuf::from(format!("/home/{user}"))),
        shell: PathBuf::from("/bin/bash"),
    }
}
