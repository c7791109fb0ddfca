use converge::{CommandExecutor, CommandOutput, ExecError, Invocation};
use std::io::Write;
use std::process::{Command, Stdio};

/// Runs commands on the host, optionally through a privilege-dropping wrapper
///
/// With a sandbox of `["noroot"]`, `wp core version` is spawned as
/// `noroot wp core version`. Database client calls bypass the wrapper via
/// [`SystemExecutor::unsandboxed`].
#[derive(Debug, Clone, Default)]
pub struct SystemExecutor {
    sandbox: Vec<String>,
}

impl SystemExecutor {
    /// Build an executor that prefixes every command with `sandbox`
    pub fn new(sandbox: &str) -> Self {
        Self {
            sandbox: sandbox.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Same host, no wrapper
    pub fn unsandboxed(&self) -> Self {
        Self::default()
    }

    fn argv<'a>(&'a self, invocation: &'a Invocation) -> Vec<&'a str> {
        self.sandbox
            .iter()
            .chain(invocation.argv.iter())
            .map(String::as_str)
            .collect()
    }
}

impl CommandExecutor for SystemExecutor {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecError> {
        let argv = self.argv(invocation);
        let Some((program, args)) = argv.split_first() else {
            return Err(ExecError::Spawn {
                command: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        };

        log::debug!(
            "Running: {}{}",
            argv.join(" "),
            invocation
                .working_dir()
                .map(|d| format!(" (in {})", d.display()))
                .unwrap_or_default()
        );

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        if let Some(dir) = invocation.working_dir() {
            cmd.current_dir(dir);
        }
        // Own process group: a terminal Ctrl-C reaches siteup only, which
        // lets the running step finish and refuses the next one
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let spawn_err = |source| ExecError::Spawn {
            command: invocation.display(),
            source,
        };

        let mut child = cmd.spawn().map_err(spawn_err)?;
        if let (Some(input), Some(mut stdin)) = (&invocation.stdin, child.stdin.take()) {
            stdin.write_all(input).map_err(spawn_err)?;
            // stdin closes here so the child sees EOF
        }
        let output = child.wait_with_output().map_err(spawn_err)?;

        let output = CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            code: output.status.code(),
        };
        if !output.success() {
            log::trace!(
                "{} exited with {:?}: {}",
                invocation.display(),
                output.code,
                output.stderr_str().trim()
            );
        }
        Ok(output)
    }
}

/// Check if a command exists on PATH
pub fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout_and_exit_code() {
        let exec = SystemExecutor::default();
        let out = exec.run(&Invocation::new(["sh", "-c", "echo hi; exit 3"])).unwrap();
        assert_eq!(out.stdout_str(), "hi\n");
        assert_eq!(out.code, Some(3));
    }

    #[test]
    fn test_feeds_stdin() {
        let exec = SystemExecutor::default();
        let out = exec
            .run(&Invocation::new(["cat"]).stdin("define( 'WP_DEBUG', true );\n"))
            .unwrap();
        assert_eq!(out.stdout_str(), "define( 'WP_DEBUG', true );\n");
    }

    #[test]
    fn test_runs_in_cwd() {
        let dir = tempfile::TempDir::new().unwrap();
        let exec = SystemExecutor::default();
        let out = exec.run_capture(&Invocation::new(["pwd"]).cwd(dir.path())).unwrap();
        assert_eq!(
            std::fs::canonicalize(out).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[test]
    fn test_sandbox_prefix() {
        let exec = SystemExecutor::new("env FOO=bar");
        let out = exec
            .run_capture(&Invocation::new(["sh", "-c", "echo $FOO"]))
            .unwrap();
        assert_eq!(out, "bar");
        assert!(exec.unsandboxed().sandbox.is_empty());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let exec = SystemExecutor::default();
        let err = exec
            .run(&Invocation::new(["siteup-definitely-not-a-command"]))
            .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
        assert_eq!(err.exit_code(), 127);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_child_leads_its_own_process_group() {
        let exec = SystemExecutor::default();
        let out = exec
            .run_capture(&Invocation::new([
                "sh",
                "-c",
                "echo $$; cut -d' ' -f5 /proc/$$/stat",
            ]))
            .unwrap();
        let mut lines = out.lines();
        let pid: i32 = lines.next().unwrap().parse().unwrap();
        let pgid: i32 = lines.next().unwrap().parse().unwrap();

        assert_eq!(pid, pgid);
        // SAFETY: getpgrp has no preconditions
        assert_ne!(pgid, unsafe { libc::getpgrp() });
    }

    #[test]
    fn test_group_signal_does_not_reach_parent() {
        // The child signals its whole group; siteup is outside it and
        // the child itself ignores the signal, so the step completes
        let exec = SystemExecutor::default();
        let out = exec
            .run(&Invocation::new([
                "sh",
                "-c",
                "trap '' INT; kill -INT 0; sleep 0.1; echo survived",
            ]))
            .unwrap();
        assert_eq!(out.code, Some(0));
        assert_eq!(out.stdout_str(), "survived\n");
    }

    #[test]
    fn test_command_exists() {
        assert!(command_exists("sh"));
        assert!(!command_exists("siteup-definitely-not-a-command"));
    }
}
