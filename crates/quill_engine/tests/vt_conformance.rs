//! End-to-end conformance tests: realistic byte streams from full-screen
//! applications and shell sessions, fed through the emulator facade.

use pretty_assertions::assert_eq;
use quill_engine::{ColorRun, TermColor, TerminalEmulator};
use quill_parser_core::NamedColor;

fn emulator(columns: usize, lines: usize) -> TerminalEmulator {
    TerminalEmulator::new(columns, lines, 100, 0.5)
}

fn trimmed(display: &[String]) -> Vec<String> {
    display.iter().map(|line| line.trim_end().to_string()).collect()
}

#[test]
fn shell_prompt_and_echo() {
    let mut term = emulator(40, 6);
    term.feed(b"$ ls -la\r\n");
    term.feed(b"total 0\r\n");
    term.feed(b"drwxr-xr-x  2 user user  40 .\r\n");
    term.feed(b"$ ");

    assert_eq!(
        trimmed(&term.display())[..4],
        ["$ ls -la", "total 0", "drwxr-xr-x  2 user user  40 .", "$ "]
    );
    assert_eq!(term.cursor(), (3, 2));
}

#[test]
fn full_screen_application_frame() {
    let mut term = emulator(20, 6);

    // Clear, draw a reverse-video status line at the top, a footer at
    // the bottom, then park the cursor in the body.
    term.feed(b"\x1b[2J\x1b[H");
    term.feed(b"\x1b[7m file.rs          \x1b[0m");
    term.feed(b"\x1b[6;1H\x1b[7m INS \x1b[0m");
    term.feed(b"\x1b[2;1Hfn main() {}");
    term.feed(b"\x1b[2;4H");

    let display = trimmed(&term.display());
    assert_eq!(display[0], " file.rs");
    assert_eq!(display[1], "fn main() {}");
    assert_eq!(display[5], " INS");
    assert_eq!(term.cursor(), (1, 3));

    // The status line renders as a white-on-black inverse run.
    let color_map = term.color_map([0]);
    let run = &color_map[&0][&0];
    assert_eq!(
        *run,
        ColorRun {
            color: (TermColor::Named(NamedColor::White), TermColor::Named(NamedColor::Black)),
            field_length: 18,
        }
    );
}

#[test]
fn scroll_region_pager() {
    let mut term = emulator(10, 6);

    // A pager keeps header and footer fixed and scrolls rows 2-5.
    term.feed(b"\x1b[1;1HHEADER");
    term.feed(b"\x1b[6;1HFOOTER");
    term.feed(b"\x1b[2;5r");
    term.feed(b"\x1b[5;1Hline1\r\nline2\r\nline3");

    let display = trimmed(&term.display());
    assert_eq!(display[0], "HEADER");
    assert_eq!(display[5], "FOOTER");
    // Two linefeeds at the bottom margin scrolled line1 up to row 3.
    assert_eq!(display[2], "line1");
    assert_eq!(display[3], "line2");
    assert_eq!(display[4], "line3");

    // Leaving the region restores full-screen addressing.
    term.feed(b"\x1b[r\x1b[1;1H");
    assert_eq!(term.cursor(), (0, 0));
}

#[test]
fn charset_box_drawing() {
    let mut term = emulator(6, 3);
    term.feed(b"\x1b(0lqqk\x1b(B");
    term.feed(b"\r\n\x1b(0x\x1b(Bok");

    let display = term.display();
    assert_eq!(display[0].trim_end(), "┌──┐");
    assert_eq!(display[1].trim_end(), "│ok");
}

#[test]
fn alignment_pattern_covers_the_screen() {
    let mut term = emulator(5, 3);
    term.feed(b"\x1b#8");
    assert_eq!(term.display(), vec!["EEEEE"; 3]);
}

#[test]
fn column_mode_switch_resizes_and_erases() {
    let mut term = emulator(80, 10);
    term.feed(b"before");
    term.feed(b"\x1b[?3h");

    assert_eq!(term.columns(), 132);
    assert_eq!(term.cursor(), (0, 0));
    assert!(term.display().iter().all(|line| line.trim_end().is_empty()));

    term.feed(b"\x1b[?3l");
    assert_eq!(term.columns(), 80);
}

#[test]
fn chunked_feeds_match_a_single_feed() {
    let stream: &[u8] =
        b"\x1b[2J\x1b[3;4H\x1b[1;32mgreen\x1b[0m plain \xe4\xb8\xad\r\n\x1b[4mnext\x1b[24m\x1b[6n";

    let mut whole = emulator(30, 8);
    whole.feed(stream);

    for chunk_size in [1, 2, 3, 7] {
        let mut chunked = emulator(30, 8);
        for chunk in stream.chunks(chunk_size) {
            chunked.feed(chunk);
        }
        assert_eq!(chunked.display(), whole.display(), "chunk size {chunk_size}");
        assert_eq!(chunked.cursor(), whole.cursor());
        assert_eq!(chunked.take_process_input(), whole.take_process_input());
    }
}

#[test]
fn save_restore_survives_arbitrary_motion() {
    let mut term = emulator(40, 12);
    term.feed(b"\x1b[5;10H\x1b7");
    term.feed(b"\x1b[H\x1b[2Jmoved all over\x1b[12;40H");
    term.feed(b"\x1b8");

    assert_eq!(term.cursor(), (4, 9));
}

#[test]
fn erased_line_keeps_erase_colors() {
    let mut term = emulator(10, 2);
    // A red-background erase paints the whole row, as editors with
    // colored status bars rely on.
    term.feed(b"\x1b[41m\x1b[2K");

    let color_map = term.color_map([0]);
    let run = &color_map[&0][&0];
    assert_eq!(run.field_length, 10);

    let display = term.display();
    assert_eq!(display[0], "          ");
}

#[test]
fn device_reports_answer_in_order() {
    let mut term = emulator(20, 5);
    term.feed(b"\x1b[c\x1b[5n\x1b[2;3H\x1b[6n");
    assert_eq!(
        term.take_process_input(),
        Some(b"\x1b[?6c\x1b[0n\x1b[2;3R".to_vec())
    );
}

#[test]
fn backspace_overwrite_cycle() {
    let mut term = emulator(20, 2);
    term.feed(b"$ cargo tets");
    term.feed(b"\x08\x08\x08");
    term.feed(b"est");

    assert_eq!(term.display()[0].trim_end(), "$ cargo test");
    assert_eq!(term.cursor(), (0, 12));
}

#[test]
fn long_output_lands_in_scrollback() {
    let mut term = emulator(20, 4);
    for i in 0..12 {
        term.feed(format!("entry {i}\r\n").as_bytes());
    }

    term.prev_page();
    let scrolled = trimmed(&term.display());
    term.next_page();
    let live = trimmed(&term.display());

    assert_ne!(scrolled, live);
    assert!(live[2].starts_with("entry 11"));
}

#[test]
fn unknown_sequences_never_corrupt_output() {
    let mut term = emulator(20, 3);
    // OSC-style noise, unsupported CSI finals and stray escapes around
    // ordinary text.
    term.feed(b"\x1b[99q\x1bZok\x1b[=5w fine");
    assert!(term.display()[0].contains("ok"));
}
