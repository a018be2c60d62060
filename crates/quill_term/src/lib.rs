//! PTY session management for the quill terminal: child processes under a
//! pseudo-terminal, keypress encoding, the frame-paced session loop and
//! the adapter that paints emulator state into a host editor view.

mod keymap;
mod launch;
mod pty;
mod registry;
mod session;
mod settings;
mod view;

pub use keymap::{encode_keypress, KeyInput, KeymapError};
pub use launch::{
    cached_exec_args, exec_launch_config, expand_variables, open_terminal, parent_dir, LaunchConfig, LaunchError,
    DEFAULT_SHELL_CMD,
};
pub use pty::{Pty, PtyError};
pub use registry::{active_view, deregister, register, send_to_active, send_to_view, set_active, SessionHandle, ViewId};
pub use session::{SessionCommand, SessionConfig, SessionEvent, TerminalSession};
pub use settings::{color_scheme_resource, SettingsError, TerminalSettings};
pub use view::{TerminalHostView, ViewAdapter, BOTTOM_MARGIN_ROWS, RIGHT_MARGIN_COLUMNS};
