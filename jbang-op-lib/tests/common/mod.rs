//! A stand-in `jbang` for tests that must not depend on a real install.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Handles `version`, `init <file>` (fails when the file exists) and runs
/// any other script with `sh`.
pub const FAKE_JBANG: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    --quiet|--verbose|--fresh) shift ;;
    version) echo "0.0.0-fake"; exit 0 ;;
    init)
      if [ -e "$2" ]; then
        echo "[jbang] [ERROR] File $2 already exists" >&2
        exit 2
      fi
      echo "class $2 {}" > "$2"
      exit 0 ;;
    run) shift ;;
    *) break ;;
  esac
done
if [ $# -eq 0 ]; then
  echo "[jbang] [ERROR] Missing required parameter: scriptOrFile" >&2
  exit 2
fi
script="$1"
shift
if [ ! -f "$script" ]; then
  echo "[jbang] [ERROR] Script or alias could not be found: $script" >&2
  exit 2
fi
exec sh "$script" "$@"
"#;

/// A JBang home whose `bin/jbang` is [`FAKE_JBANG`].
pub fn fake_jbang_home() -> TempDir {
    let home = TempDir::new().unwrap();
    let bin = home.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    write_executable(&bin.join("jbang"), FAKE_JBANG);
    home
}

pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

#[cfg(unix)]
fn write_executable(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(not(unix))]
fn write_executable(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
}
