use std::{
    collections::HashMap,
    ffi::{OsStr, OsString},
    io,
    os::unix::process::ExitStatusExt,
    path::{Path, PathBuf},
    process::{ExitStatus, Output},
    sync::{Arc, RwLock},
};

use async_trait::async_trait;

use super::{Command, ProcessManager};

/// A command as seen by [`FakeProcessManager`].
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub envs: Vec<(OsString, OsString)>,
    pub current_dir: Option<PathBuf>,
    /// `true` when run through [`ProcessManager::output`].
    pub captured: bool,
}

impl Invocation {
    fn new(command: Command, captured: bool) -> Self {
        Self {
            program: command.get_program().to_os_string(),
            args: command.get_args().to_vec(),
            envs: command.get_envs().to_vec(),
            current_dir: command.get_current_dir().map(Path::to_path_buf),
            captured,
        }
    }

    /// File name of the program, `gaianet` for `/home/gaia-node-101/bin/gaianet`.
    pub fn program_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .to_string()
    }

    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect()
    }

    pub fn env(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.envs
            .iter()
            .rev()
            .find(|(k, _)| k == key.as_ref())
            .map(|(_, v)| v.as_os_str())
    }

    /// Program name followed by the args, joined by spaces.
    pub fn line(&self) -> String {
        std::iter::once(self.program_name())
            .chain(self.args_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Clone)]
pub struct DynamicStreamValue(Arc<dyn Fn(&Invocation) -> String + Send + Sync>);

impl DynamicStreamValue {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Invocation) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }
}

impl std::fmt::Debug for DynamicStreamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fn(&Invocation) -> String")
    }
}

#[derive(Debug, Clone)]
pub enum StreamValue {
    Stdout(String),
    Stderr(String),
    /// Raw stdout, for output that isn't valid UTF-8.
    StdoutBytes(Vec<u8>),
    DynamicStdout(DynamicStreamValue),
    DynamicStderr(DynamicStreamValue),
}

type Matcher = Arc<dyn Fn(&Invocation) -> bool + Send + Sync>;

struct FailureRule {
    matcher: Matcher,
    status: ExitStatus,
}

impl std::fmt::Debug for FailureRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureRule")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Process manager double: records every command, answers `output` with scripted streams and
/// fails the commands matched by [`FakeProcessManager::fail_when`].
#[derive(Clone, Debug, Default)]
pub struct FakeProcessManager {
    inner: Arc<RwLock<FakeProcessManagerInner>>,
}

#[derive(Debug, Default)]
struct FakeProcessManagerInner {
    invocations: Vec<Invocation>,
    // keyed by program file name
    streams: HashMap<String, Vec<StreamValue>>,
    failures: Vec<FailureRule>,
    spawn_should_error: Option<io::ErrorKind>,
}

/// Build an [`ExitStatus`] for a process that exited with `code`.
pub fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

impl FakeProcessManager {
    pub fn new(streams: HashMap<String, Vec<StreamValue>>) -> Self {
        FakeProcessManager {
            inner: Arc::new(RwLock::new(FakeProcessManagerInner {
                streams,
                ..Default::default()
            })),
        }
    }

    /// Every later command matching `matcher` exits with `code`.
    pub fn fail_when<F>(&self, code: i32, matcher: F)
    where
        F: Fn(&Invocation) -> bool + Send + Sync + 'static,
    {
        self.inner.write().unwrap().failures.push(FailureRule {
            matcher: Arc::new(matcher),
            status: exit_status(code),
        });
    }

    pub fn spawn_should_error(&self, err_kind: io::ErrorKind) {
        self.inner.write().unwrap().spawn_should_error = Some(err_kind);
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.inner.read().unwrap().invocations.clone()
    }

    pub fn count(&self) -> usize {
        self.inner.read().unwrap().invocations.len()
    }

    fn record(&self, invocation: &Invocation) -> io::Result<ExitStatus> {
        let mut inner = self.inner.write().unwrap();
        inner.invocations.push(invocation.clone());

        if let Some(err_kind) = inner.spawn_should_error {
            return Err(err_kind.into());
        }

        Ok(inner
            .failures
            .iter()
            .find(|rule| (rule.matcher)(invocation))
            .map(|rule| rule.status)
            .unwrap_or(ExitStatus::from_raw(0)))
    }
}

#[async_trait]
impl ProcessManager for FakeProcessManager {
    async fn output(&self, command: Command) -> io::Result<Output> {
        let invocation = Invocation::new(command, true);
        let status = self.record(&invocation)?;

        let stream_values = self
            .inner
            .read()
            .unwrap()
            .streams
            .get(&invocation.program_name())
            .cloned()
            .unwrap_or_default();

        let (stdout, stderr) = stream_values.into_iter().fold(
            (Vec::new(), Vec::new()),
            |(mut stdout, mut stderr), value| {
                match value {
                    StreamValue::Stdout(chunk) => stdout.extend(chunk.into_bytes()),
                    StreamValue::Stderr(chunk) => stderr.extend(chunk.into_bytes()),
                    StreamValue::StdoutBytes(chunk) => stdout.extend(chunk),
                    StreamValue::DynamicStdout(DynamicStreamValue(f)) => {
                        stdout.extend(f(&invocation).into_bytes())
                    },
                    StreamValue::DynamicStderr(DynamicStreamValue(f)) => {
                        stderr.extend(f(&invocation).into_bytes())
                    },
                }
                (stdout, stderr)
            },
        );

        Ok(Output {
            status,
            stdout,
            stderr,
        })
    }

    async fn status(&self, command: Command) -> io::Result<ExitStatus> {
        self.record(&Invocation::new(command, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn output_should_record_and_answer_with_streams() {
        let pm = FakeProcessManager::new(HashMap::from([(
            "gaianet".to_string(),
            vec![
                StreamValue::Stdout("Node ID: ".into()),
                StreamValue::DynamicStdout(DynamicStreamValue::new(|inv| {
                    inv.args_lossy()[2].clone()
                })),
                StreamValue::Stderr("warn".into()),
            ],
        )]));

        let output = pm
            .output(
                Command::new("/h/gaia-node-101/bin/gaianet").args(["info", "--base", "0xabc"]),
            )
            .await
            .unwrap();

        assert!(output.status.success());
        assert_eq!(output.stdout, b"Node ID: 0xabc");
        assert_eq!(output.stderr, b"warn");
        assert_eq!(pm.count(), 1);
        assert!(pm.invocations()[0].captured);
        assert_eq!(pm.invocations()[0].line(), "gaianet info --base 0xabc");
    }

    #[tokio::test]
    async fn status_should_fail_matching_commands_only() {
        let pm = FakeProcessManager::default();
        pm.fail_when(7, |inv| {
            inv.args_lossy().first().map(String::as_str) == Some("init")
        });

        let ok = pm
            .status(Command::new("gaianet").args(["start"]))
            .await
            .unwrap();
        let failed = pm
            .status(Command::new("gaianet").args(["init"]))
            .await
            .unwrap();

        assert!(ok.success());
        assert_eq!(failed.code(), Some(7));
        assert_eq!(pm.count(), 2);
    }

    #[tokio::test]
    async fn spawn_should_error_should_still_record_the_attempt() {
        let pm = FakeProcessManager::default();
        pm.spawn_should_error(io::ErrorKind::NotFound);

        let err = pm
            .status(Command::new("gaianet").env("PATH", "/x/bin"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(pm.invocations()[0].env("PATH"), Some(OsStr::new("/x/bin")));
    }
}
