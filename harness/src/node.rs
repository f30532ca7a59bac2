use std::io::Write;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::Settings;

/// How long a node gets to write its timeline after an interrupt.
const SHUTDOWN: Duration = Duration::from_secs(10);

/// Running `bank-node` child process, killed when dropped.
pub struct Node {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl Node {
    pub fn spawn(settings: &Settings, id: &str) -> std::io::Result<Self> {
        let mut command = Command::new(&settings.node);
        if settings.verbose > 0 {
            command.arg(format!("-{}", "v".repeat(settings.verbose as usize)));
        }
        if let Some(grace_ms) = settings.grace_ms {
            command.arg("--grace-ms").arg(grace_ms.to_string());
        }
        let mut child = command.arg(id)
            .arg(&settings.config)
            .arg("--log-dir")
            .arg(&settings.log_dir)
            .stdin(Stdio::piped())
            .spawn()?;
        let stdin = child.stdin.take();
        Ok(Node { child, stdin })
    }

    /// Sends one transaction line.
    pub fn submit(&mut self, line: &str) -> std::io::Result<()> {
        match self.stdin.as_mut() {
        | Some(stdin) => {
            writeln!(stdin, "{}", line)?;
            stdin.flush()
        }
        | None => Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "standard input closed")),
        }
    }

    /// Interrupts the node so it writes its timeline, killing it if it
    /// does not exit in time.
    pub fn stop(&mut self) -> nix::Result<()> {
        signal::kill(Pid::from_raw(self.child.id() as i32), Signal::SIGINT)?;
        let deadline = Instant::now() + SHUTDOWN;
        while Instant::now() < deadline {
            match self.child.try_wait() {
            | Ok(Some(_)) | Err(_) => return Ok(()),
            | Ok(None) => std::thread::sleep(Duration::from_millis(50)),
            }
        }
        log::warn!("node {} ignored interrupt, killing it", self.child.id());
        self.kill();
        Ok(())
    }

    /// Crashes the node without giving it a chance to clean up.
    pub fn kill(&mut self) {
        self.stdin.take();
        self.child.kill().ok();
        self.child.wait().ok();
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.kill();
    }
}
