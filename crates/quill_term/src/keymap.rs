//! Keypress-to-wire encoding for the `TERM=linux` protocol.
//!
//! A logical key event (key name plus modifiers) maps to the byte
//! sequence the console driver expects. Lookups go through static
//! tables; anything not in a table encodes as the key text itself, so
//! single printable characters pass through unchanged.

use thiserror::Error;

/// A logical keypress reported by the host view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl KeyInput {
    pub fn plain(key: &str) -> Self {
        KeyInput {
            key: key.to_string(),
            ctrl: false,
            alt: false,
            shift: false,
            meta: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeymapError {
    #[error("meta key combinations are not supported")]
    MetaUnsupported,
}

static LINUX_KEY_MAP: &[(&str, &[u8])] = &[
    ("enter", b"\r"),
    ("backspace", b"\x7f"),
    ("tab", b"\t"),
    ("space", b" "),
    ("escape", b"\x1b"),
    ("down", b"\x1b[B"),
    ("up", b"\x1b[A"),
    ("right", b"\x1b[C"),
    ("left", b"\x1b[D"),
    ("home", b"\x1b[1~"),
    ("end", b"\x1b[4~"),
    ("pageup", b"\x1b[5~"),
    ("pagedown", b"\x1b[6~"),
    ("delete", b"\x1b[3~"),
    ("insert", b"\x1b[2~"),
    ("f1", b"\x1bOP"),
    ("f2", b"\x1bOQ"),
    ("f3", b"\x1bOR"),
    ("f4", b"\x1bOS"),
    ("f5", b"\x1b[15~"),
    ("f6", b"\x1b[17~"),
    ("f7", b"\x1b[18~"),
    ("f8", b"\x1b[19~"),
    ("f9", b"\x1b[20~"),
    ("f10", b"\x1b[21~"),
    ("f12", b"\x1b[24~"),
    ("bracketed_paste_mode_start", b"\x1b[200~"),
    ("bracketed_paste_mode_end", b"\x1b[201~"),
];

/// Arrow encoding requested by full-screen applications via DECCKM.
static APPLICATION_CURSOR_KEY_MAP: &[(&str, &[u8])] = &[
    ("up", b"\x1bOA"),
    ("down", b"\x1bOB"),
    ("right", b"\x1bOC"),
    ("left", b"\x1bOD"),
];

static LINUX_CTRL_KEY_MAP: &[(&str, &[u8])] = &[
    ("up", b"\x1b[1;5A"),
    ("down", b"\x1b[1;5B"),
    ("right", b"\x1b[1;5C"),
    ("left", b"\x1b[1;5D"),
    ("@", b"\x00"),
    ("`", b"\x00"),
    ("[", b"\x1b"),
    ("{", b"\x1b"),
    ("\\", b"\x1c"),
    ("|", b"\x1c"),
    ("]", b"\x1d"),
    ("}", b"\x1d"),
    ("^", b"\x1e"),
    ("~", b"\x1e"),
    ("_", b"\x1f"),
    ("?", b"\x7f"),
];

static LINUX_ALT_KEY_MAP: &[(&str, &[u8])] = &[
    ("up", b"\x1b[1;3A"),
    ("down", b"\x1b[1;3B"),
    ("right", b"\x1b[1;3C"),
    ("left", b"\x1b[1;3D"),
];

fn lookup(map: &[(&str, &[u8])], key: &str) -> Option<Vec<u8>> {
    map.iter().find(|(name, _)| *name == key).map(|(_, bytes)| bytes.to_vec())
}

fn plain_key_code(key: &str, app_cursor_mode: bool) -> Vec<u8> {
    if app_cursor_mode {
        if let Some(bytes) = lookup(APPLICATION_CURSOR_KEY_MAP, key) {
            return bytes;
        }
    }
    lookup(LINUX_KEY_MAP, key).unwrap_or_else(|| key.as_bytes().to_vec())
}

fn ctrl_combination_key_code(key: &str) -> Vec<u8> {
    let key = key.to_lowercase();
    if let Some(bytes) = lookup(LINUX_CTRL_KEY_MAP, &key) {
        return bytes;
    }

    let mut chars = key.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if ch.is_ascii_lowercase() {
            return vec![ch as u8 - b'a' + 1];
        }
    }

    plain_key_code(&key, false)
}

fn alt_combination_key_code(key: &str) -> Vec<u8> {
    let key = key.to_lowercase();
    if let Some(bytes) = lookup(LINUX_ALT_KEY_MAP, &key) {
        return bytes;
    }

    let mut code = vec![0x1b];
    code.extend(plain_key_code(&key, false));
    code
}

/// Encode a keypress. Pure and total for every recognized key; `meta`
/// combinations are rejected so the caller can tell the user.
pub fn encode_keypress(input: &KeyInput, app_cursor_mode: bool) -> Result<Vec<u8>, KeymapError> {
    if input.meta {
        return Err(KeymapError::MetaUnsupported);
    }

    if input.ctrl {
        Ok(ctrl_combination_key_code(&input.key))
    } else if input.alt {
        Ok(alt_combination_key_code(&input.key))
    } else {
        Ok(plain_key_code(&input.key, app_cursor_mode))
    }
}
