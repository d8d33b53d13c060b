//! Instrumentation installer
//!
//! Some hosts need method-level patches on top of event observation. The
//! manager installs them on activation and removes them on deactivation, but
//! treats the whole thing as optional: failures are logged and event logging
//! keeps working without it.

use chrono::Utc;
use eyre::{Result, bail};

/// Opaque install/remove service
pub trait Instrumentation: Send {
    /// Install under a per-activation identity
    fn install(&mut self, id: &str) -> Result<()>;

    fn remove(&mut self) -> Result<()>;
}

/// Does nothing; the default when no patches are configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInstrumentation;

impl Instrumentation for NoInstrumentation {
    fn install(&mut self, _id: &str) -> Result<()> {
        Ok(())
    }

    fn remove(&mut self) -> Result<()> {
        Ok(())
    }
}

type Hook = Box<dyn FnMut() -> Result<()> + Send>;

struct Patch {
    name: String,
    apply: Hook,
    revert: Hook,
}

/// Ordered set of named patches, applied in order and reverted in reverse
#[derive(Default)]
pub struct PatchSet {
    patches: Vec<Patch>,
    installed: Option<(String, usize)>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patch<A, R>(mut self, name: impl Into<String>, apply: A, revert: R) -> Self
    where
        A: FnMut() -> Result<()> + Send + 'static,
        R: FnMut() -> Result<()> + Send + 'static,
    {
        self.patches.push(Patch {
            name: name.into(),
            apply: Box::new(apply),
            revert: Box::new(revert),
        });
        self
    }

    /// Identity of the current installation, if any
    pub fn installed_as(&self) -> Option<&str> {
        self.installed.as_ref().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

impl Instrumentation for PatchSet {
    fn install(&mut self, id: &str) -> Result<()> {
        if let Some((current, _)) = &self.installed {
            bail!("already installed as {}", current);
        }

        for index in 0..self.patches.len() {
            let patch = &mut self.patches[index];
            if let Err(e) = (patch.apply)() {
                let failed = patch.name.clone();
                // Leave the host as it was
                self.installed = Some((id.to_string(), index));
                if let Err(rollback) = self.remove() {
                    log::error!("Unpatching failed : {}", rollback);
                    bail!("patch '{}' failed: {}; rollback: {}", failed, e, rollback);
                }
                bail!("patch '{}' failed: {}", failed, e);
            }
            log::debug!("Applied patch {}", patch.name);
        }

        self.installed = Some((id.to_string(), self.patches.len()));
        Ok(())
    }

    fn remove(&mut self) -> Result<()> {
        let Some((_, applied)) = self.installed.take() else {
            return Ok(());
        };

        let mut failures = Vec::new();
        for patch in self.patches[..applied].iter_mut().rev() {
            if let Err(e) = (patch.revert)() {
                failures.push(format!("{}: {}", patch.name, e));
            }
        }

        if !failures.is_empty() {
            bail!("failed to revert {}", failures.join(", "));
        }
        Ok(())
    }
}

/// Unique identity for one activation, `<owner><ticks>`
pub fn installation_id(owner: &str) -> String {
    format!("{}{}", owner, Utc::now().timestamp_micros())
}
