//! Child processes under a pseudo-terminal.
//!
//! A [`Pty`] pairs a spawned command with the master side of a PTY: a
//! reader thread pumps child output into a channel, writes go straight to
//! the master, and resizes are pushed to the kernel plus a SIGWINCH to
//! the child. The child runs with `TERM=linux` in the requested working
//! directory; every other inherited environment variable passes through.

use std::io::{Read, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use portable_pty::{native_pty_system, Child, ChildKiller, CommandBuilder, MasterPty, PtySize};
use thiserror::Error;

const INITIAL_ROWS: u16 = 24;
const INITIAL_COLS: u16 = 80;
/// Grace period between SIGTERM and the force kill in [`Pty::stop`].
const STOP_GRACE: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum PtyError {
    #[error("failed to open a pseudo-terminal: {0}")]
    Open(String),
    #[error("failed to launch `{command}`: {reason}")]
    Launch { command: String, reason: String },
}

pub struct Pty {
    master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    child: Box<dyn Child + Send + Sync>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    output_rx: Receiver<Vec<u8>>,
    // Bytes received from the channel but not yet handed out because the
    // caller asked for fewer than one chunk.
    leftover: Vec<u8>,
    exit_status: Option<portable_pty::ExitStatus>,
}

impl Pty {
    /// Fork the command under a new PTY. Launch problems (missing binary,
    /// bad working directory) surface here; the caller decides whether to
    /// retry with a different directory.
    pub fn spawn(argv: &[String], cwd: &Path) -> Result<Self, PtyError> {
        let command = argv.join(" ");
        let Some((program, args)) = argv.split_first() else {
            return Err(PtyError::Launch {
                command,
                reason: "empty command".to_string(),
            });
        };

        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: INITIAL_ROWS,
                cols: INITIAL_COLS,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|err| PtyError::Open(err.to_string()))?;

        let mut cmd = CommandBuilder::new(program);
        cmd.args(args);
        cmd.env("TERM", "linux");
        cmd.cwd(cwd);

        let child = pair.slave.spawn_command(cmd).map_err(|err| PtyError::Launch {
            command: command.clone(),
            reason: err.to_string(),
        })?;
        // The slave side lives on in the child; drop our handle.
        drop(pair.slave);

        let writer = pair.master.take_writer().map_err(|err| PtyError::Open(err.to_string()))?;
        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|err| PtyError::Open(err.to_string()))?;

        let (output_tx, output_rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut reader = reader;
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    // EOF: the child went away and the slave side closed.
                    Ok(0) => break,
                    Ok(n) => {
                        if output_tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        });

        let killer = child.clone_killer();

        Ok(Pty {
            master: pair.master,
            writer,
            child,
            killer,
            output_rx,
            leftover: Vec::new(),
            exit_status: None,
        })
    }

    /// Wait up to `timeout` for child output and hand back at most `max`
    /// bytes. `None` means no data within the timeout, EOF, or a dead
    /// child; surplus bytes stay buffered for the next call.
    pub fn receive_output(&mut self, max: usize, timeout: Duration) -> Option<Vec<u8>> {
        if self.leftover.is_empty() {
            let chunk = if timeout.is_zero() {
                self.output_rx.try_recv().ok()?
            } else {
                self.output_rx.recv_timeout(timeout).ok()?
            };
            self.leftover = chunk;
        }

        let take = max.min(self.leftover.len());
        Some(self.leftover.drain(..take).collect())
    }

    /// Write keystrokes or responses to the child; silently ignored once
    /// the child is gone.
    pub fn send_bytes(&mut self, bytes: &[u8]) {
        if !self.is_running() {
            return;
        }
        if let Err(err) = self.writer.write_all(bytes).and_then(|()| self.writer.flush()) {
            log::error!("failed to write to pty: {err}");
        }
    }

    /// Push a new window size to the kernel and nudge the child with
    /// SIGWINCH. Pixel dimensions are reported as zero.
    pub fn update_screen_size(&mut self, lines: u16, columns: u16) {
        let size = PtySize {
            rows: lines.max(1),
            cols: columns.max(1),
            pixel_width: 0,
            pixel_height: 0,
        };
        if let Err(err) = self.master.resize(size) {
            log::error!("failed to resize pty: {err}");
            return;
        }
        self.signal_child(SignalKind::Winch);
    }

    /// Non-blocking reap; `false` once the child has exited or died on a
    /// signal.
    pub fn is_running(&mut self) -> bool {
        if self.exit_status.is_some() {
            return false;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.exit_status = Some(status);
                false
            }
            Ok(None) => true,
            Err(err) => {
                log::error!("failed to poll child: {err}");
                false
            }
        }
    }

    /// Terminate the child: SIGTERM, a short grace period, then the hard
    /// kill.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }

        self.signal_child(SignalKind::Term);

        let deadline = Instant::now() + STOP_GRACE;
        while Instant::now() < deadline {
            if !self.is_running() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        if let Err(err) = self.killer.kill() {
            log::error!("failed to kill child: {err}");
        }

        // Collect the exit status of the killed child.
        let deadline = Instant::now() + STOP_GRACE;
        while self.is_running() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// `(code, signal name)` once the child has been reaped; exactly one
    /// side is populated.
    pub fn exit_status(&mut self) -> Option<(Option<u32>, Option<String>)> {
        self.is_running();
        self.exit_status.as_ref().map(|status| match status.signal() {
            Some(signal) => (None, Some(signal.to_string())),
            None => (Some(status.exit_code()), None),
        })
    }

    /// Check that the child still sees `TERM=linux`. Shell startup files
    /// sometimes override it, which breaks escape-sequence handling in
    /// subtle ways; the returned warning is meant for display in the
    /// terminal itself. Only implemented on Linux (`/proc`).
    #[cfg(target_os = "linux")]
    pub fn verify_environment(&mut self) -> Option<String> {
        let pid = self.child.process_id()?;
        let environ = std::fs::read(format!("/proc/{pid}/environ")).ok()?;

        for entry in environ.split(|&byte| byte == 0) {
            let mut parts = entry.splitn(2, |&byte| byte == b'=');
            let key = parts.next()?;
            let value = parts.next().unwrap_or(b"");
            if key == b"TERM".as_slice() && value != b"linux".as_slice() {
                return Some(format!(
                    "warning: TERM was changed to [{}] but should equal [linux]; \
                     escape handling may misbehave",
                    String::from_utf8_lossy(value)
                ));
            }
        }
        None
    }

    #[cfg(not(target_os = "linux"))]
    pub fn verify_environment(&mut self) -> Option<String> {
        None
    }

    #[cfg(unix)]
    fn signal_child(&mut self, kind: SignalKind) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let Some(pid) = self.child.process_id() else {
            return;
        };
        let signal = match kind {
            SignalKind::Term => Signal::SIGTERM,
            SignalKind::Winch => Signal::SIGWINCH,
        };
        if let Err(err) = kill(Pid::from_raw(pid as i32), signal) {
            log::debug!("failed to signal child with {signal}: {err}");
        }
    }

    #[cfg(not(unix))]
    fn signal_child(&mut self, _kind: SignalKind) {}
}

#[derive(Clone, Copy)]
enum SignalKind {
    Term,
    Winch,
}

impl Drop for Pty {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sh(script: &str) -> Vec<String> {
        vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()]
    }

    fn read_all(pty: &mut Pty, deadline: Duration) -> Vec<u8> {
        let mut collected = Vec::new();
        let start = Instant::now();
        while start.elapsed() < deadline {
            match pty.receive_output(4096, Duration::from_millis(50)) {
                Some(chunk) => collected.extend(chunk),
                None => {
                    if !pty.is_running() && pty.receive_output(4096, Duration::ZERO).is_none() {
                        break;
                    }
                }
            }
        }
        collected
    }

    #[test]
    fn child_output_is_received() {
        let mut pty = Pty::spawn(&sh("echo hello"), Path::new("/")).unwrap();
        let output = read_all(&mut pty, Duration::from_secs(5));
        assert!(String::from_utf8_lossy(&output).contains("hello"));
    }

    #[test]
    fn max_read_size_is_honored() {
        let mut pty = Pty::spawn(&sh("echo 0123456789"), Path::new("/")).unwrap();
        let start = Instant::now();
        let first = loop {
            if let Some(chunk) = pty.receive_output(4, Duration::from_millis(100)) {
                break chunk;
            }
            assert!(start.elapsed() < Duration::from_secs(5), "no output from child");
        };
        assert!(!first.is_empty() && first.len() <= 4);
    }

    #[test]
    fn clean_exit_reports_code() {
        let mut pty = Pty::spawn(&sh("exit 3"), Path::new("/")).unwrap();
        let start = Instant::now();
        while pty.is_running() && start.elapsed() < Duration::from_secs(5) {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(!pty.is_running());
        assert_eq!(pty.exit_status(), Some((Some(3), None)));
    }

    #[test]
    fn stop_terminates_a_stubborn_child() {
        let mut pty = Pty::spawn(&sh("sleep 30"), Path::new("/")).unwrap();
        assert!(pty.is_running());
        pty.stop();
        assert!(!pty.is_running());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn child_environment_carries_term_linux() {
        let mut pty = Pty::spawn(&sh("sleep 2"), Path::new("/")).unwrap();
        assert_eq!(pty.verify_environment(), None);
        pty.stop();
    }

    #[test]
    fn launch_failure_surfaces() {
        let result = Pty::spawn(&["/nonexistent/definitely-missing".to_string()], Path::new("/"));
        assert!(matches!(result, Err(PtyError::Launch { .. })));
    }

    #[test]
    fn writes_reach_the_child() {
        let mut pty = Pty::spawn(&sh("read line; echo got:$line"), Path::new("/")).unwrap();
        pty.send_bytes(b"ping\n");
        let output = read_all(&mut pty, Duration::from_secs(5));
        assert!(String::from_utf8_lossy(&output).contains("got:ping"));
    }

    #[test]
    fn resize_is_visible_to_the_child() {
        let mut pty = Pty::spawn(&sh("sleep 1; stty size"), Path::new("/")).unwrap();
        pty.update_screen_size(40, 120);
        let output = read_all(&mut pty, Duration::from_secs(5));
        assert!(String::from_utf8_lossy(&output).contains("40 120"));
    }
}
