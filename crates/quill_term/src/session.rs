//! The per-terminal session loop.
//!
//! One worker thread per session runs a current-thread tokio runtime and
//! selects over the command channel and a frame interval. Each tick pumps
//! child output into the emulator, flushes the view adapter, reconciles
//! the view size, and watches for termination. The emulator is only ever
//! touched from this worker.

use std::time::Duration;

use quill_engine::TerminalEmulator;
use tokio::sync::mpsc;

use crate::{
    encode_keypress, registry, KeyInput, Pty, SessionHandle, TerminalHostView, ViewAdapter, ViewId,
};

/// Frame budget: ~30 Hz.
const FRAME_INTERVAL: Duration = Duration::from_millis(33);
/// Upper bound on child output consumed per tick.
const MAX_READ_SIZE: usize = 4096;

/// Messages sent to the session worker.
#[derive(Debug)]
pub enum SessionCommand {
    /// Raw bytes for the child's stdin.
    SendBytes(Vec<u8>),
    /// A logical keypress to encode and forward.
    Keypress(KeyInput),
    /// Page (or line) through the scrollback history.
    Scroll { forward: bool, line: bool },
    /// Paste clipboard text, honoring bracketed-paste when active.
    Paste { text: String, bracketed: bool },
    /// Copy a row range (or the cursor row) back to the host clipboard.
    Copy { selection: Option<(usize, usize)> },
    /// Blank out a row range.
    Clear { start: Option<usize>, end: Option<usize> },
    /// Force terminal dimensions (normally the view size is polled).
    Resize { rows: usize, columns: usize },
    Stop,
}

/// Messages sent from the session worker to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started,
    /// Text produced by a copy command.
    Clipboard(String),
    /// A user-visible problem (bad keypress, launch trouble).
    Error(String),
    /// The child is gone.
    Exited {
        code: Option<u32>,
        signal: Option<String>,
    },
    /// The session is fully shut down and deregistered.
    Stopped,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub view_id: ViewId,
    /// Keep the view open after the child exits and print the exit
    /// banner into the terminal.
    pub keep_open: bool,
    /// Scrollback lines.
    pub history: usize,
    /// Fraction of a page moved per scroll step.
    pub ratio: f32,
    pub show_colors: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            view_id: 0,
            keep_open: false,
            history: 1000,
            ratio: 0.5,
            show_colors: false,
        }
    }
}

pub struct TerminalSession;

impl TerminalSession {
    /// Start the session worker. The returned sender is also registered
    /// in the session registry under `config.view_id`.
    pub fn spawn(
        config: SessionConfig,
        pty: Pty,
        view: Box<dyn TerminalHostView>,
    ) -> (mpsc::UnboundedSender<SessionCommand>, mpsc::UnboundedReceiver<SessionEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        registry::register(config.view_id, SessionHandle {
            commands: command_tx.clone(),
        });

        let adapter = ViewAdapter::new(config.show_colors);
        let (rows, columns) = match ViewAdapter::view_size(&*view) {
            (0, 0) => (24, 80),
            size => size,
        };

        let mut worker = SessionWorker {
            emulator: TerminalEmulator::new(columns, rows, config.history, config.ratio),
            pty,
            view,
            adapter,
            command_rx,
            event_tx: event_tx.clone(),
            config,
            rows,
            columns,
        };
        worker.pty.update_screen_size(rows as u16, columns as u16);

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to create tokio runtime");

            runtime.block_on(async move {
                worker.run().await;
            });
        });

        (command_tx, event_rx)
    }
}

struct SessionWorker {
    emulator: TerminalEmulator,
    pty: Pty,
    view: Box<dyn TerminalHostView>,
    adapter: ViewAdapter,
    command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    config: SessionConfig,
    rows: usize,
    columns: usize,
}

impl SessionWorker {
    async fn run(&mut self) {
        self.send_event(SessionEvent::Started);
        let mut interval = tokio::time::interval(FRAME_INTERVAL);

        loop {
            tokio::select! {
                Some(command) = self.command_rx.recv() => {
                    if self.handle_command(command) {
                        break;
                    }
                }
                _ = interval.tick() => {
                    if self.tick() {
                        break;
                    }
                }
            }
        }

        self.shutdown();
    }

    /// One frame. Returns `true` when the session should shut down.
    fn tick(&mut self) -> bool {
        if !self.view.is_open() {
            return true;
        }

        self.pump_output();
        self.adapter.flush(self.view.as_mut(), &mut self.emulator);
        self.reconcile_view_size();

        !self.pty.is_running()
    }

    fn pump_output(&mut self) {
        if let Some(data) = self.pty.receive_output(MAX_READ_SIZE, Duration::ZERO) {
            self.emulator.feed(&data);
            // Device reports the emulator queued while parsing go back
            // to the child right away.
            if let Some(response) = self.emulator.take_process_input() {
                self.pty.send_bytes(&response);
            }
        }
    }

    fn reconcile_view_size(&mut self) {
        let (rows, columns) = ViewAdapter::view_size(self.view.as_ref());
        if rows == 0 || columns == 0 {
            return;
        }
        if rows != self.rows || columns != self.columns {
            self.rows = rows;
            self.columns = columns;
            self.emulator.resize(rows, columns);
            self.pty.update_screen_size(rows as u16, columns as u16);
        }
    }

    /// Returns `true` when the session should shut down.
    fn handle_command(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::SendBytes(bytes) => self.pty.send_bytes(&bytes),
            SessionCommand::Keypress(input) => {
                match encode_keypress(&input, self.emulator.application_mode_enabled()) {
                    Ok(bytes) => self.pty.send_bytes(&bytes),
                    Err(err) => self.send_event(SessionEvent::Error(err.to_string())),
                }
            }
            SessionCommand::Scroll { forward, line } => match (forward, line) {
                (false, false) => self.emulator.prev_page(),
                (true, false) => self.emulator.next_page(),
                (false, true) => self.emulator.prev_line(),
                (true, true) => self.emulator.next_line(),
            },
            SessionCommand::Paste { text, bracketed } => {
                let bytes = paste_bytes(&text, bracketed && self.emulator.bracketed_paste_mode_enabled());
                self.pty.send_bytes(&bytes);
            }
            SessionCommand::Copy { selection } => {
                let text = self.adapter.copy_text(&self.emulator, selection);
                self.send_event(SessionEvent::Clipboard(text));
            }
            SessionCommand::Clear { start, end } => {
                let end = end.unwrap_or_else(|| self.emulator.lines());
                self.emulator.clear_rows(start.unwrap_or(0), end);
            }
            SessionCommand::Resize { rows, columns } => {
                if rows > 0 && columns > 0 {
                    self.rows = rows;
                    self.columns = columns;
                    self.emulator.resize(rows, columns);
                    self.pty.update_screen_size(rows as u16, columns as u16);
                }
            }
            SessionCommand::Stop => return true,
        }
        false
    }

    fn shutdown(&mut self) {
        // Drain whatever the child managed to write before the end.
        while let Some(data) = self.pty.receive_output(MAX_READ_SIZE, Duration::ZERO) {
            self.emulator.feed(&data);
        }

        let exited = !self.pty.is_running();
        if exited {
            if let Some((code, signal)) = self.pty.exit_status() {
                if self.config.keep_open && self.view.is_open() {
                    let banner = exit_banner(code, signal.as_deref());
                    self.emulator.feed(banner.as_bytes());
                }
                self.send_event(SessionEvent::Exited { code, signal });
            }
        }

        if self.view.is_open() {
            self.adapter.flush(self.view.as_mut(), &mut self.emulator);
        }

        self.pty.stop();
        registry::deregister(self.config.view_id);

        if self.view.is_open() && !(exited && self.config.keep_open) {
            self.view.close();
        }

        self.send_event(SessionEvent::Stopped);
    }

    fn send_event(&self, event: SessionEvent) {
        if let Err(err) = self.event_tx.send(event) {
            log::error!("failed to send session event: {err}");
        }
    }
}

/// Clipboard text as child input. Under bracketed paste the text is
/// wrapped in the paste guards so the application can tell it from typed
/// input; otherwise line breaks become carriage returns, as if typed.
fn paste_bytes(text: &str, bracketed: bool) -> Vec<u8> {
    let text = text.replace("\r\n", "\n");

    if bracketed {
        let mut bytes = encode_keypress(&KeyInput::plain("bracketed_paste_mode_start"), false).unwrap_or_default();
        bytes.extend_from_slice(text.as_bytes());
        bytes.extend(encode_keypress(&KeyInput::plain("bracketed_paste_mode_end"), false).unwrap_or_default());
        return bytes;
    }

    let mut bytes = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\n' | '\r' => bytes.extend_from_slice(b"\r"),
            '\t' => bytes.extend_from_slice(b"\t"),
            _ => {
                let mut utf8 = [0u8; 4];
                bytes.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
            }
        }
    }
    bytes
}

/// The line shown in the terminal when the child ends and the view stays
/// open.
fn exit_banner(code: Option<u32>, signal: Option<&str>) -> String {
    match (code, signal) {
        (_, Some(signal)) => {
            let number = signal_number(signal).unwrap_or(0);
            format!("\r\n\r\nterminated by signal {number} ({signal})\r\n")
        }
        (Some(code), None) => format!("\r\n\r\nfinished with code {code}\r\n"),
        (None, None) => "\r\n\r\nfinished\r\n".to_string(),
    }
}

fn signal_number(name: &str) -> Option<u32> {
    static SIGNAL_NUMBERS: &[(&str, u32)] = &[
        ("SIGHUP", 1),
        ("SIGINT", 2),
        ("SIGQUIT", 3),
        ("SIGILL", 4),
        ("SIGABRT", 6),
        ("SIGFPE", 8),
        ("SIGKILL", 9),
        ("SIGSEGV", 11),
        ("SIGPIPE", 13),
        ("SIGALRM", 14),
        ("SIGTERM", 15),
    ];
    SIGNAL_NUMBERS.iter().find(|(n, _)| *n == name).map(|(_, number)| *number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn paste_converts_line_endings() {
        assert_eq!(paste_bytes("ab\r\ncd\n", false), b"ab\rcd\r");
        assert_eq!(paste_bytes("a\tb", false), b"a\tb");
    }

    #[test]
    fn bracketed_paste_wraps_in_guards() {
        assert_eq!(paste_bytes("hi\n", true), b"\x1b[200~hi\n\x1b[201~");
    }

    #[test]
    fn exit_banner_formats() {
        assert_eq!(exit_banner(Some(0), None), "\r\n\r\nfinished with code 0\r\n");
        assert_eq!(
            exit_banner(None, Some("SIGTERM")),
            "\r\n\r\nterminated by signal 15 (SIGTERM)\r\n"
        );
    }

    #[test]
    fn signal_numbers() {
        assert_eq!(signal_number("SIGKILL"), Some(9));
        assert_eq!(signal_number("SIGWEIRD"), None);
    }

    #[cfg(unix)]
    mod end_to_end {
        use super::*;
        use pretty_assertions::assert_eq;
        use crate::TerminalHostView;
        use std::path::Path;
        use std::time::{Duration, Instant};

        /// Minimal host view for driving a session without an editor.
        struct HeadlessView;

        impl TerminalHostView for HeadlessView {
            fn viewport_extent(&self) -> (f32, f32) {
                (820.0, 240.0)
            }
            fn line_height(&self) -> f32 {
                10.0
            }
            fn em_width(&self) -> f32 {
                10.0
            }
            fn replace_region(&mut self, _start: usize, _end: usize, _text: &str) {}
            fn erase_region(&mut self, _start: usize, _end: usize) {}
            fn add_color_region(&mut self, _key: &str, _start: usize, _end: usize, _scope: &str) {}
            fn erase_color_region(&mut self, _key: &str) {}
            fn set_cursor(&mut self, _point: usize) {}
            fn clear_cursor(&mut self) {}
            fn set_read_only(&mut self, _read_only: bool) {}
            fn is_open(&self) -> bool {
                true
            }
            fn close(&mut self) {}
        }

        fn wait_for(rx: &mut mpsc::UnboundedReceiver<SessionEvent>, want: impl Fn(&SessionEvent) -> bool) -> SessionEvent {
            let deadline = Instant::now() + Duration::from_secs(10);
            loop {
                assert!(Instant::now() < deadline, "timed out waiting for session event");
                if let Ok(event) = rx.try_recv() {
                    if want(&event) {
                        return event;
                    }
                } else {
                    std::thread::sleep(Duration::from_millis(20));
                }
            }
        }

        #[test]
        fn session_runs_until_child_exits() {
            let argv = vec!["/bin/sh".to_string(), "-c".to_string(), "exit 7".to_string()];
            let pty = Pty::spawn(&argv, Path::new("/")).unwrap();

            let config = SessionConfig {
                view_id: 777_001,
                ..SessionConfig::default()
            };
            let (_commands, mut events) = TerminalSession::spawn(config, pty, Box::new(HeadlessView));

            let exited = wait_for(&mut events, |event| matches!(event, SessionEvent::Exited { .. }));
            assert_eq!(
                exited,
                SessionEvent::Exited {
                    code: Some(7),
                    signal: None
                }
            );
            wait_for(&mut events, |event| matches!(event, SessionEvent::Stopped));
            assert!(!crate::registry::send_to_view(777_001, SessionCommand::Stop));
        }

        #[test]
        fn stop_command_ends_the_session() {
            let argv = vec!["/bin/sh".to_string(), "-c".to_string(), "sleep 30".to_string()];
            let pty = Pty::spawn(&argv, Path::new("/")).unwrap();

            let config = SessionConfig {
                view_id: 777_002,
                ..SessionConfig::default()
            };
            let (commands, mut events) = TerminalSession::spawn(config, pty, Box::new(HeadlessView));

            commands.send(SessionCommand::Stop).unwrap();
            wait_for(&mut events, |event| matches!(event, SessionEvent::Stopped));
        }
    }
}
