use crate::error::ToolInvocationError;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// Token the tool understands as "attach this local file".
pub const ATTACHMENT_PREFIX: &str = "@file:";

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub model: Option<String>,
}

/// Anything that turns a prompt into raw text.
pub trait TextGenerator {
    fn generate(&self, prompt: &str, options: &GenerateOptions)
        -> Result<String, ToolInvocationError>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, ToolInvocationError> {
        (**self).generate(prompt, options)
    }
}

/// Runs an external command line tool once per prompt:
/// `<program> [args..] -p <prompt> [--model <model>]`.
#[derive(Clone, Debug)]
pub struct CliGenerator {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CliGenerator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn command(&self, prompt: &str, options: &GenerateOptions) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg("-p").arg(prompt);
        if let Some(model) = &options.model {
            cmd.arg("--model").arg(model);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn io_error(&self, source: std::io::Error) -> ToolInvocationError {
        ToolInvocationError::Io {
            program: self.program.clone(),
            source,
        }
    }

    fn timed_out(&self) -> ToolInvocationError {
        ToolInvocationError::TimedOut {
            program: self.program.clone(),
            timeout: self.timeout.unwrap_or_default(),
        }
    }

    fn wait(
        &self,
        child: &mut Child,
        deadline: Option<Instant>,
    ) -> Result<ExitStatus, ToolInvocationError> {
        let Some(deadline) = deadline else {
            return child.wait().map_err(|e| self.io_error(e));
        };
        loop {
            if let Some(status) = child.try_wait().map_err(|e| self.io_error(e))? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                // already exited or killed in between is fine
                let _ = child.kill();
                let _ = child.wait();
                return Err(self.timed_out());
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Next finished pipe. Pipes stay open while anything the tool spawned
    /// still holds them, so this shares the deadline with `wait`.
    fn receive(
        &self,
        rx: &Receiver<(Pipe, std::io::Result<Vec<u8>>)>,
        deadline: Option<Instant>,
    ) -> Result<(Pipe, String), ToolInvocationError> {
        let received = match deadline {
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
        };
        let (pipe, bytes) = match received {
            Ok(message) => message,
            Err(RecvTimeoutError::Timeout) => return Err(self.timed_out()),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(self.io_error(std::io::Error::other("pipe reader panicked")))
            }
        };
        let bytes = bytes.map_err(|e| self.io_error(e))?;
        Ok((pipe, String::from_utf8_lossy(&bytes).into_owned()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pipe {
    Stdout,
    Stderr,
}

fn drain<R: Read + Send + 'static>(
    pipe: Option<R>,
    which: Pipe,
    tx: Sender<(Pipe, std::io::Result<Vec<u8>>)>,
) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let read = match pipe {
            Some(mut pipe) => pipe.read_to_end(&mut buf).map(|_| buf),
            None => Ok(buf),
        };
        // receiver is gone once the call timed out
        let _ = tx.send((which, read));
    });
}

impl TextGenerator for CliGenerator {
    fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, ToolInvocationError> {
        log::debug!("running {} ({} byte prompt)", self.program, prompt.len());
        let mut child = self
            .command(prompt, options)
            .spawn()
            .map_err(|source| ToolInvocationError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        let (tx, rx) = mpsc::channel();
        drain(child.stdout.take(), Pipe::Stdout, tx.clone());
        drain(child.stderr.take(), Pipe::Stderr, tx);
        let status = self.wait(&mut child, deadline)?;
        let (mut stdout, mut stderr) = (String::new(), String::new());
        for _ in 0..2 {
            match self.receive(&rx, deadline)? {
                (Pipe::Stdout, text) => stdout = text,
                (Pipe::Stderr, text) => stderr = text,
            }
        }
        if !status.success() {
            return Err(ToolInvocationError::Failed {
                program: self.program.clone(),
                status,
                stderr: stderr.trim().to_string(),
            });
        }
        if !stderr.trim().is_empty() {
            log::debug!("{} stderr: {}", self.program, stderr.trim());
        }
        Ok(stdout.trim().to_string())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sh(script: &str) -> CliGenerator {
        CliGenerator::new("sh").with_args(vec!["-c".into(), script.into(), "sh".into()])
    }

    #[test]
    fn passes_prompt_and_model() -> anyhow::Result<()> {
        // $1 = -p, $2 = prompt, $3 = --model, $4 = model
        let gen = sh(r#"printf '%s|%s|%s|%s' "$1" "$2" "$3" "$4""#);
        let options = GenerateOptions {
            model: Some("m-1".into()),
        };
        assert_eq!(gen.generate("hello world", &options)?, "-p|hello world|--model|m-1");
        Ok(())
    }

    #[test]
    fn omits_model_flag() -> anyhow::Result<()> {
        let gen = sh(r#"echo "$#""#);
        assert_eq!(gen.generate("x", &GenerateOptions::default())?, "2");
        Ok(())
    }

    #[test]
    fn non_zero_exit_carries_stderr() {
        let gen = sh("echo partial; echo 'quota exceeded' >&2; exit 3");
        match gen.generate("x", &GenerateOptions::default()) {
            Err(ToolInvocationError::Failed { status, stderr, .. }) => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "quota exceeded");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let gen = CliGenerator::new("photopost-no-such-tool");
        assert!(matches!(
            gen.generate("x", &GenerateOptions::default()),
            Err(ToolInvocationError::Spawn { .. })
        ));
    }

    #[test]
    fn hung_tool_times_out() {
        let gen = sh("sleep 5").with_timeout(Some(Duration::from_millis(200)));
        let started = Instant::now();
        assert!(matches!(
            gen.generate("x", &GenerateOptions::default()),
            Err(ToolInvocationError::TimedOut { .. })
        ));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn background_process_holding_stdout_times_out() {
        let gen = sh("sleep 8 & echo '{}'").with_timeout(Some(Duration::from_secs(1)));
        let started = Instant::now();
        assert!(matches!(
            gen.generate("x", &GenerateOptions::default()),
            Err(ToolInvocationError::TimedOut { .. })
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn no_timeout_waits_for_output() -> anyhow::Result<()> {
        let gen = sh("sleep 1; echo done").with_timeout(None);
        assert_eq!(gen.generate("x", &GenerateOptions::default())?, "done");
        Ok(())
    }
}
