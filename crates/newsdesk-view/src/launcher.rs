use anyhow::{Context, Result};
use std::process::{Command, Stdio};

/// Default command used to bring the analytics backend up.
pub const DEFAULT_SERVER_CMD: &str = "uvicorn ai_service.main:app --port 8000";

/// Side effects the dashboard triggers outside the process.
pub trait Launcher: Send + Sync {
    /// Open a generated report in the system browser.
    fn open_report(&self, path: &str) -> Result<()>;

    /// Start the backend service in the background.
    fn start_backend(&self) -> Result<()>;
}

/// Launches through the operating system: `open`, `start` or `xdg-open` for reports, and a
/// shell for the backend command.
#[derive(Debug, Clone)]
pub struct SystemLauncher {
    server_cmd: String,
}

impl Default for SystemLauncher {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_CMD)
    }
}

impl SystemLauncher {
    pub fn new(server_cmd: impl Into<String>) -> Self {
        Self {
            server_cmd: server_cmd.into(),
        }
    }

    /// Reads `NEWSDESK_SERVER_CMD`, falling back to [`DEFAULT_SERVER_CMD`].
    pub fn from_env() -> Self {
        std::env::var("NEWSDESK_SERVER_CMD")
            .ok()
            .filter(|cmd| !cmd.trim().is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn server_cmd(&self) -> &str {
        &self.server_cmd
    }
}

impl Launcher for SystemLauncher {
    fn open_report(&self, path: &str) -> Result<()> {
        let mut command = match std::env::consts::OS {
            "macos" => {
                let mut c = Command::new("open");
                c.arg(path);
                c
            }
            "windows" => {
                let mut c = Command::new("cmd");
                c.args(["/C", "start", ""]).arg(path);
                c
            }
            _ => {
                let mut c = Command::new("xdg-open");
                c.arg(path);
                c
            }
        };
        command
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("could not open {path}"))?;
        Ok(())
    }

    fn start_backend(&self) -> Result<()> {
        let mut command = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.server_cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.server_cmd);
            c
        };
        let child = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("could not start `{}`", self.server_cmd))?;
        log::info!("backend started (pid {}): {}", child.id(), self.server_cmd);
        Ok(())
    }
}
