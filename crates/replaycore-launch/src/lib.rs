use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("no game executable configured; select one before launching")]
    Unconfigured,
    #[error("replay not readable at {}: {source}", path.display())]
    ReplayUnreadable { path: PathBuf, source: std::io::Error },
    #[error("could not start `{command}`: {source} ({hint})")]
    Spawn {
        command: String,
        hint: String,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
enum Runner {
    /// Run the game executable through a compatibility layer, `wine` unless
    /// overridden.
    CompatibilityLayer(String),
    /// Run the game executable itself (Windows hosts).
    Direct,
}

/// Single entry point for every launch trigger (row activation, direct
/// path drop, manual selection). Spawns the player detached and never waits
/// on it; only the spawn itself can fail.
#[derive(Debug, Clone)]
pub struct LaunchAdapter {
    runner: Runner,
}

impl Default for LaunchAdapter {
    fn default() -> Self {
        if cfg!(windows) {
            Self { runner: Runner::Direct }
        } else {
            Self {
                runner: Runner::CompatibilityLayer("wine".to_string()),
            }
        }
    }
}

impl LaunchAdapter {
    pub fn with_runner(command: impl Into<String>) -> Self {
        Self {
            runner: Runner::CompatibilityLayer(command.into()),
        }
    }

    pub fn direct() -> Self {
        Self { runner: Runner::Direct }
    }

    /// The replay must be readable at call time; it is re-checked here, not
    /// at discovery time, since the file can vanish between scan and click.
    pub fn launch(&self, executable: Option<&Path>, replay: &Path) -> Result<(), LaunchError> {
        let executable = executable.ok_or(LaunchError::Unconfigured)?;

        if let Err(source) = File::open(replay) {
            return Err(LaunchError::ReplayUnreadable {
                path: replay.to_path_buf(),
                source,
            });
        }

        let mut command = match &self.runner {
            Runner::CompatibilityLayer(runner) => {
                let mut command = Command::new(runner);
                command.arg(executable);
                command
            }
            Runner::Direct => Command::new(executable),
        };

        tracing::debug!(replay = %replay.display(), "spawning replay player");

        command
            .arg(replay)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
            .map_err(|source| LaunchError::Spawn {
                command: self.describe(executable),
                hint: self.spawn_hint(),
                source,
            })
    }

    fn describe(&self, executable: &Path) -> String {
        match &self.runner {
            Runner::CompatibilityLayer(runner) => {
                format!("{runner} {}", executable.display())
            }
            Runner::Direct => executable.display().to_string(),
        }
    }

    fn spawn_hint(&self) -> String {
        match &self.runner {
            Runner::CompatibilityLayer(runner) => {
                format!("verify the compatibility layer with `{runner} --version`")
            }
            Runner::Direct => "verify the executable path".to_string(),
        }
    }
}
