//! Starts the frame loop as its own process and shows the program banner.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

pub const TITLE: &str = "Gesture Detection Program";
pub const APP_LABEL: &str = "Detection Program";
pub const DESCRIPTION: &str = "Interpreting sign language into digital communication.";

/// Branding image shown next to the banner.
pub const DEFAULT_IMAGE: &str = "images/bg.png";

/// Frame loop executable name.
pub const LOOP_EXE: &str = "gestured";

pub fn banner() -> String {
    format!("{TITLE}\n\n  {APP_LABEL}\n  {DESCRIPTION}\n")
}

/// `gestured` next to the running executable, or on `PATH` if that fails.
pub fn default_exe() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(LOOP_EXE)))
        .unwrap_or_else(|| PathBuf::from(LOOP_EXE))
}

/// Dimensions of the branding image, or `None` (logged) if it can't be read.
pub fn load_branding(path: &Path) -> Option<(u32, u32)> {
    match image::image_dimensions(path) {
        Ok(dims) => {
            tracing::info!(path = %path.display(), width = dims.0, height = dims.1, "branding image loaded");
            Some(dims)
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "branding image unavailable");
            None
        }
    }
}

/// A started frame loop process. Dropping the handle leaves the process running.
pub struct Launched {
    child: Child,
    exe: PathBuf,
}

impl Launched {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }

    /// Block until the process exits.
    pub fn wait(mut self) -> Result<ExitStatus> {
        self.child
            .wait()
            .with_context(|| format!("failed to wait for {}", self.exe.display()))
    }
}

/// Start `exe` with no arguments and no channel back to the launcher.
pub fn spawn(exe: &Path) -> Result<Launched> {
    if !exe.is_file() {
        bail!("{} not found", exe.display());
    }

    let child = Command::new(exe)
        .stdin(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to start {}", exe.display()))?;

    tracing::info!(exe = %exe.display(), pid = child.id(), "frame loop started");
    Ok(Launched {
        child,
        exe: exe.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_contents() {
        let banner = banner();
        assert!(banner.starts_with(TITLE));
        assert!(banner.contains(APP_LABEL));
        assert!(banner.contains(DESCRIPTION));
    }

    #[test]
    fn test_default_exe_name() {
        assert_eq!(default_exe().file_name().unwrap(), LOOP_EXE);
    }

    #[test]
    fn test_spawn_missing_exe() {
        let err = spawn(Path::new("/nonexistent/gestured")).err().unwrap();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_spawn_and_wait() {
        let launched = spawn(Path::new("/bin/true")).unwrap();
        assert!(launched.id() > 0);
        assert_eq!(launched.exe(), Path::new("/bin/true"));
        assert!(launched.wait().unwrap().success());
    }

    #[test]
    fn test_load_branding_missing() {
        assert_eq!(load_branding(Path::new("/nonexistent/bg.png")), None);
    }

    #[test]
    fn test_load_branding_reports_dimensions() {
        let path = std::env::temp_dir().join(format!("gesture-branding-{}.png", std::process::id()));
        image::RgbImage::new(12, 7).save(&path).unwrap();
        assert_eq!(load_branding(&path), Some((12, 7)));
        std::fs::remove_file(&path).unwrap();
    }
}
