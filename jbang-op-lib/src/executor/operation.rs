use crate::executor::{ExitStatusError, EXIT_FAILURE};
use crate::log::{self, LogSink};
use crate::platform::{self, Platform};
use crate::project::Project;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::Level;

/// Environment variable naming the JBang installation directory.
pub const JBANG_HOME_ENV: &str = "JBANG_HOME";

/// Runs JBang with the configured arguments.
///
/// ```no_run
/// use jbang_op_lib::{BaseProject, JBangOperation};
///
/// JBangOperation::new()
///     .with_project(&BaseProject::default())
///     .jbang_args(["--quiet"])
///     .script("hello.java")
///     .execute()?;
/// # Ok::<(), jbang_op_lib::ExitStatusError>(())
/// ```
#[derive(Clone)]
pub struct JBangOperation {
    args: Vec<String>,
    jbang_args: Vec<String>,
    exit_on_failure: bool,
    silent: bool,
    jbang_home: Option<PathBuf>,
    project: Option<PathBuf>,
    script: Option<String>,
    work_dir: Option<PathBuf>,
    platform: Arc<dyn Platform>,
    sink: Arc<dyn LogSink>,
}

impl Default for JBangOperation {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            jbang_args: Vec::new(),
            exit_on_failure: true,
            silent: false,
            jbang_home: None,
            project: None,
            script: None,
            work_dir: None,
            platform: platform::system(),
            sink: log::tracing_sink(),
        }
    }
}

impl fmt::Debug for JBangOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JBangOperation")
            .field("args", &self.args)
            .field("jbang_args", &self.jbang_args)
            .field("exit_on_failure", &self.exit_on_failure)
            .field("silent", &self.silent)
            .field("jbang_home", &self.jbang_home)
            .field("project", &self.project)
            .field("script", &self.script)
            .field("work_dir", &self.work_dir)
            .field("os_name", &self.platform.os_name())
            .finish()
    }
}

impl JBangOperation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the operation to a project.
    ///
    /// The project's work directory becomes the working directory, and
    /// `JBANG_HOME`, when set, becomes the JBang home.
    pub fn with_project(self, project: &dyn Project) -> Self {
        self.bind_project(project, std::env::var_os(JBANG_HOME_ENV).map(PathBuf::from))
    }

    fn bind_project(mut self, project: &dyn Project, jbang_home: Option<PathBuf>) -> Self {
        let work_dir = absolute(&project.work_directory());
        self.project = Some(work_dir.clone());
        self.work_dir = Some(work_dir);
        if let Some(home) = jbang_home {
            self = self.jbang_home(home);
        }
        self
    }

    /// Appends script arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends JBang arguments, placed before the script.
    pub fn jbang_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.jbang_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn jbang_arg(mut self, arg: impl Into<String>) -> Self {
        self.jbang_args.push(arg.into());
        self
    }

    pub fn script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    /// Sets the JBang installation directory; `bin/jbang` is run from it
    /// instead of looking `jbang` up on the `PATH`.
    pub fn jbang_home(mut self, jbang_home: impl Into<PathBuf>) -> Self {
        self.jbang_home = Some(jbang_home.into());
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Whether a non-zero exit from JBang fails the operation. Defaults to
    /// `true`.
    pub fn exit_on_failure(mut self, exit_on_failure: bool) -> Self {
        self.exit_on_failure = exit_on_failure;
        self
    }

    /// Suppresses all logging, whatever the sink's level.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn platform(mut self, platform: impl Platform + 'static) -> Self {
        self.platform = Arc::new(platform);
        self
    }

    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Clears the arguments and script, and restores the failure policy.
    /// The JBang home, working directory and project are kept.
    pub fn reset(&mut self) {
        self.args.clear();
        self.jbang_args.clear();
        self.exit_on_failure = true;
        self.script = None;
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_jbang_args(&self) -> &[String] {
        &self.jbang_args
    }

    pub fn get_script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    pub fn get_jbang_home(&self) -> Option<&Path> {
        self.jbang_home.as_deref()
    }

    pub fn get_work_dir(&self) -> Option<&Path> {
        self.work_dir.as_deref()
    }

    pub fn is_exit_on_failure(&self) -> bool {
        self.exit_on_failure
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    fn jbang_exec(&self) -> String {
        let exec = if self.platform.is_windows() {
            "jbang.cmd"
        } else {
            "jbang"
        };
        match &self.jbang_home {
            Some(home) => absolute(home)
                .join("bin")
                .join(exec)
                .to_string_lossy()
                .into_owned(),
            None => exec.to_string(),
        }
    }

    /// The JBang command line handed to the shell.
    pub fn command_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.jbang_args.len() + self.args.len() + 2);
        parts.push(self.jbang_exec());
        parts.extend(self.jbang_args.iter().cloned());
        if let Some(script) = &self.script {
            parts.push(script.clone());
        }
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    fn shell(&self) -> [&'static str; 2] {
        if self.platform.is_windows() {
            ["cmd.exe", "/c"]
        } else {
            ["sh", "-c"]
        }
    }

    /// Full argument vector of the child process.
    pub fn shell_command(&self) -> Vec<String> {
        let mut command: Vec<String> = self.shell().iter().map(|s| s.to_string()).collect();
        command.push(self.command_line());
        command
    }

    fn log(&self, level: Level, message: &str) {
        if !self.silent && self.sink.enabled(level) {
            self.sink.log(level, message);
        }
    }

    /// Runs JBang and waits for it to finish.
    ///
    /// Fails with [`EXIT_FAILURE`] when no
    /// project is bound, the working directory is invalid, or the process
    /// cannot be run; with JBang's own exit status when it exits non-zero
    /// and [`exit_on_failure`](Self::exit_on_failure) is set.
    pub fn execute(&self) -> Result<(), ExitStatusError> {
        if self.project.is_none() {
            self.log(Level::ERROR, "A project must be specified.");
            return Err(ExitStatusError::failure());
        }

        let work_dir = match &self.work_dir {
            Some(dir) if dir.is_dir() => dir,
            other => {
                let shown = other
                    .as_deref()
                    .map(|dir| absolute(dir).display().to_string())
                    .unwrap_or_default();
                self.log(Level::ERROR, &format!("Invalid working directory: {shown}"));
                return Err(ExitStatusError::failure());
            }
        };

        let command_line = self.command_line();
        self.log(Level::INFO, &command_line);

        let [shell, flag] = self.shell();
        let status = Command::new(shell)
            .arg(flag)
            .arg(&command_line)
            .current_dir(work_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status();

        match status {
            Ok(status) => {
                if self.exit_on_failure {
                    // Killed by a signal: no code to report.
                    let code = status.code().unwrap_or(EXIT_FAILURE);
                    ExitStatusError::throw_on_failure(code)?;
                }
                Ok(())
            }
            Err(err) => {
                self.log(Level::ERROR, &err.to_string());
                Err(ExitStatusError::failure())
            }
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
