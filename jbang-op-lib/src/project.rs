use std::path::{Path, PathBuf};

/// Marker file for a project-local configuration.
pub const PROJECT_CONFIG_FILE: &str = ".jbang-op.toml";

/// A hosting project an operation can be bound to.
pub trait Project {
    /// Directory the project works in; read once when an operation binds.
    fn work_directory(&self) -> PathBuf;
}

/// A plain project rooted at a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseProject {
    work_directory: PathBuf,
}

impl BaseProject {
    pub fn new(work_directory: impl Into<PathBuf>) -> Self {
        Self {
            work_directory: work_directory.into(),
        }
    }

    /// Project rooted at the nearest ancestor of `start_dir` that looks
    /// like a project root.
    pub fn discover(start_dir: &Path) -> Self {
        Self::new(find_project_root(start_dir))
    }
}

impl Default for BaseProject {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

impl Project for BaseProject {
    fn work_directory(&self) -> PathBuf {
        self.work_directory.clone()
    }
}

/// Nearest ancestor of `start_dir` holding a project config file or a
/// `.git` entry, else `start_dir` itself.
pub fn find_project_root(start_dir: &Path) -> PathBuf {
    let mut current = start_dir;

    loop {
        if current.join(PROJECT_CONFIG_FILE).exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }

        if let Some(parent) = current.parent() {
            current = parent;
        } else {
            break;
        }
    }

    start_dir.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_root_by_config_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(PROJECT_CONFIG_FILE), "").unwrap();
        let nested = temp_dir.path().join("src").join("scripts");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_project_root(&nested), temp_dir.path());
    }

    #[test]
    fn test_find_root_by_git() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join(".git")).unwrap();
        let nested = temp_dir.path().join("scripts");
        fs::create_dir_all(&nested).unwrap();

        let project = BaseProject::discover(&nested);
        assert_eq!(project.work_directory(), temp_dir.path());
    }

    #[test]
    fn test_base_project_work_directory() {
        let project = BaseProject::new("/tmp/example");
        assert_eq!(project.work_directory(), PathBuf::from("/tmp/example"));
    }
}
