use std::sync::Arc;

/// Reports the operating system name used to pick a shell and executable.
///
/// The predicates are independent substring tests on the lowercased name;
/// a name matching several patterns satisfies each of them.
pub trait Platform: Send + Sync {
    /// Raw OS name, or `None` when it cannot be determined.
    fn os_name(&self) -> Option<String>;

    fn is_linux(&self) -> bool {
        matches_any(self.os_name(), &["linux", "unix"])
    }

    fn is_macos(&self) -> bool {
        matches_any(self.os_name(), &["mac", "darwin", "osx"])
    }

    fn is_windows(&self) -> bool {
        matches_any(self.os_name(), &["win"])
    }
}

fn matches_any(os_name: Option<String>, patterns: &[&str]) -> bool {
    match os_name {
        Some(name) => {
            let name = name.to_lowercase();
            patterns.iter().any(|p| name.contains(p))
        }
        None => false,
    }
}

/// The platform the process is running on.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPlatform;

impl Platform for SystemPlatform {
    fn os_name(&self) -> Option<String> {
        let os = std::env::consts::OS;
        if os.is_empty() {
            None
        } else {
            Some(os.to_string())
        }
    }
}

/// A fixed OS name, for simulating other platforms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsName(Option<String>);

impl OsName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Some(name.into()))
    }

    /// A platform whose name is unavailable.
    pub fn unknown() -> Self {
        Self(None)
    }
}

impl Platform for OsName {
    fn os_name(&self) -> Option<String> {
        self.0.clone()
    }
}

pub(crate) fn system() -> Arc<dyn Platform> {
    Arc::new(SystemPlatform)
}

pub fn is_linux() -> bool {
    SystemPlatform.is_linux()
}

pub fn is_macos() -> bool {
    SystemPlatform.is_macos()
}

pub fn is_windows() -> bool {
    SystemPlatform.is_windows()
}
