//! Per-connection line-oriented input: history recall, backspace handling,
//! and (telnet-aware) control-byte filtering. The IAC framing itself is
//! stripped upstream by [`crate::codec::IacFilter`]; this module only sees
//! application bytes.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

const HISTORY_CAPACITY: usize = 50;

/// Process-wide command history, keyed by player name, shared across
/// reconnects the way the session registry is.
#[derive(Default)]
pub struct HistoryStore {
    inner: Mutex<HashMap<String, VecDeque<String>>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, player: &str, line: &str) {
        if line.is_empty() {
            return;
        }
        let mut map = self.inner.lock().unwrap();
        let ring = map.entry(player.to_string()).or_default();
        if ring.back().map(|s| s.as_str()) != Some(line) {
            ring.push_back(line.to_string());
            while ring.len() > HISTORY_CAPACITY {
                ring.pop_front();
            }
        }
    }

    pub fn entries(&self, player: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .get(player)
            .map(|r| r.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Result of feeding one byte into a [`LineReader`].
#[derive(Debug, Default)]
pub struct ByteOutcome {
    /// Bytes the connection should echo back to the client, if any.
    pub echo: Vec<u8>,
    /// A completed line, if Enter was just pressed.
    pub line: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EscState {
    None,
    Esc,
    Csi,
}

/// Per-connection input buffer and editing state.
pub struct LineReader {
    buf: Vec<char>,
    esc: EscState,
    saw_cr: bool,
    history_cursor: Option<usize>,
    echo: bool,
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LineReader {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            esc: EscState::None,
            saw_cr: false,
            history_cursor: None,
            echo: true,
        }
    }

    /// Controls whether typed characters are echoed back; the connection
    /// driver flips this off around password prompts (after sending
    /// IAC WILL ECHO) and back on afterward (IAC WONT ECHO).
    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }

    fn replace_buffer_echo(&mut self, new_text: &str) -> Vec<u8> {
        let mut echo = Vec::new();
        for _ in 0..self.buf.len() {
            echo.extend_from_slice(b"\x08 \x08");
        }
        self.buf = new_text.chars().collect();
        if self.echo {
            echo.extend_from_slice(new_text.as_bytes());
        }
        echo
    }

    /// Feeds one raw input byte, returning any echo bytes and a completed
    /// line if Enter (CR, LF, or CRLF) was just seen.
    pub fn feed_byte(&mut self, b: u8, history: &HistoryStore, player: &str) -> ByteOutcome {
        match self.esc {
            EscState::None => {}
            EscState::Esc => {
                if b == b'[' {
                    self.esc = EscState::Csi;
                } else {
                    self.esc = EscState::None;
                }
                return ByteOutcome::default();
            }
            EscState::Csi => {
                self.esc = EscState::None;
                return match b {
                    b'A' => self.recall(history, player, true),
                    b'B' => self.recall(history, player, false),
                    // Left/right are explicitly not supported.
                    _ => ByteOutcome::default(),
                };
            }
        }

        match b {
            0x1B => {
                self.esc = EscState::Esc;
                ByteOutcome::default()
            }
            0x08 | 0x7F => {
                if self.buf.pop().is_some() && self.echo {
                    ByteOutcome {
                        echo: b"\x08 \x08".to_vec(),
                        line: None,
                    }
                } else {
                    ByteOutcome::default()
                }
            }
            b'\r' => {
                self.saw_cr = true;
                self.complete_line(history, player)
            }
            b'\n' => {
                if self.saw_cr {
                    self.saw_cr = false;
                    ByteOutcome::default()
                } else {
                    self.complete_line(history, player)
                }
            }
            0x00..=0x1F => ByteOutcome::default(),
            _ => {
                self.saw_cr = false;
                if let Ok(ch) = std::str::from_utf8(&[b]) {
                    self.buf.push(ch.chars().next().unwrap());
                }
                let echo = if self.echo { vec![b] } else { Vec::new() };
                ByteOutcome { echo, line: None }
            }
        }
    }

    fn complete_line(&mut self, history: &HistoryStore, player: &str) -> ByteOutcome {
        let line: String = self.buf.drain(..).collect();
        self.history_cursor = None;
        history.push(player, &line);
        ByteOutcome {
            echo: b"\r\n".to_vec(),
            line: Some(line),
        }
    }

    fn recall(&mut self, history: &HistoryStore, player: &str, up: bool) -> ByteOutcome {
        let entries = history.entries(player);
        if entries.is_empty() {
            return ByteOutcome::default();
        }

        let next_cursor = match (self.history_cursor, up) {
            (None, true) => entries.len() - 1,
            (Some(c), true) => c.saturating_sub(1),
            (None, false) => return ByteOutcome::default(),
            (Some(c), false) => {
                if c + 1 >= entries.len() {
                    self.history_cursor = None;
                    return ByteOutcome {
                        echo: self.replace_buffer_echo(""),
                        line: None,
                    };
                }
                c + 1
            }
        };

        self.history_cursor = Some(next_cursor);
        let text = entries[next_cursor].clone();
        ByteOutcome {
            echo: self.replace_buffer_echo(&text),
            line: None,
        }
    }

    pub fn current(&self) -> String {
        self.buf.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_line_completion() {
        let history = HistoryStore::new();
        let mut reader = LineReader::new();
        for b in b"look\n" {
            let out = reader.feed_byte(*b, &history, "neo");
            if *b == b'\n' {
                assert_eq!(out.line, Some("look".to_string()));
            }
        }
    }

    #[test]
    fn crlf_counts_as_one_line() {
        let history = HistoryStore::new();
        let mut reader = LineReader::new();
        let mut lines = Vec::new();
        for b in b"hi\r\n" {
            if let Some(l) = reader.feed_byte(*b, &history, "neo").line {
                lines.push(l);
            }
        }
        assert_eq!(lines, vec!["hi".to_string()]);
    }

    #[test]
    fn backspace_removes_last_char() {
        let history = HistoryStore::new();
        let mut reader = LineReader::new();
        reader.feed_byte(b'h', &history, "neo");
        reader.feed_byte(b'i', &history, "neo");
        let out = reader.feed_byte(0x08, &history, "neo");
        assert_eq!(out.echo, b"\x08 \x08");
        assert_eq!(reader.current(), "h");
    }

    #[test]
    fn history_recall_cycles() {
        let history = HistoryStore::new();
        history.push("neo", "look");
        history.push("neo", "north");
        let mut reader = LineReader::new();
        // ESC [ A = up arrow
        reader.feed_byte(0x1B, &history, "neo");
        let out = reader.feed_byte(b'[', &history, "neo");
        assert!(out.echo.is_empty());
        let out = reader.feed_byte(b'A', &history, "neo");
        assert_eq!(reader.current(), "north");
        let _ = out;
    }

    #[test]
    fn non_printable_control_bytes_are_dropped() {
        let history = HistoryStore::new();
        let mut reader = LineReader::new();
        reader.feed_byte(0x07, &history, "neo"); // BEL
        assert_eq!(reader.current(), "");
    }

    #[test]
    fn password_mode_suppresses_echo() {
        let history = HistoryStore::new();
        let mut reader = LineReader::new();
        reader.set_echo(false);
        let out = reader.feed_byte(b'x', &history, "neo");
        assert!(out.echo.is_empty());
        assert_eq!(reader.current(), "x");
    }
}
