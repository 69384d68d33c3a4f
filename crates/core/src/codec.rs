//! ANSI color helpers, theming, and telnet IAC framing constants/filter.

/// Telnet "Interpret As Command" byte.
pub const IAC: u8 = 255;
pub const WILL: u8 = 251;
pub const WONT: u8 = 252;
pub const DO: u8 = 253;
pub const DONT: u8 = 254;
pub const SB: u8 = 250;
pub const SE: u8 = 240;
pub const ECHO: u8 = 1;

const ESC_GREEN: &str = "\x1b[32m";
const ESC_YELLOW: &str = "\x1b[33m";
const ESC_BRIGHT_WHITE: &str = "\x1b[97m";
const ESC_RESET: &str = "\x1b[0m";

const ESC_RED: &str = "\x1b[31m";
const ESC_CYAN: &str = "\x1b[36m";
const ESC_MAGENTA: &str = "\x1b[35m";
const ESC_WHITE: &str = "\x1b[37m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Green,
    Amber,
    White,
    None,
}

impl Theme {
    pub fn parse(s: &str) -> Option<Theme> {
        match s.to_ascii_lowercase().as_str() {
            "green" => Some(Theme::Green),
            "amber" => Some(Theme::Amber),
            "white" => Some(Theme::White),
            "none" => Some(Theme::None),
            _ => None,
        }
    }
}

/// All color/reset escapes this module ever emits, used by `Theme::None` to
/// strip color entirely.
const ALL_ESCAPES: &[&str] = &[
    ESC_GREEN,
    ESC_YELLOW,
    ESC_BRIGHT_WHITE,
    ESC_RED,
    ESC_CYAN,
    ESC_MAGENTA,
    ESC_WHITE,
    ESC_RESET,
];

/// Applies the player's color theme to already-colorized text.
///
/// `green` text (the implicit default emitted by the rest of the core) is
/// left unchanged for the `Green` theme, remapped to yellow for `Amber`, to
/// bright white for `White`, and stripped of every known escape for `None`.
pub fn apply_theme(text: &str, theme: Theme) -> String {
    match theme {
        Theme::Green => text.to_string(),
        Theme::Amber => text.replace(ESC_GREEN, ESC_YELLOW),
        Theme::White => text.replace(ESC_GREEN, ESC_BRIGHT_WHITE),
        Theme::None => {
            let mut out = text.to_string();
            for esc in ALL_ESCAPES {
                out = out.replace(esc, "");
            }
            out
        }
    }
}

/// Rarity tiers used by item coloring (§4.9.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rarity {
    Common = 0,
    Uncommon = 1,
    Rare = 2,
    Legendary = 3,
}

impl Rarity {
    pub fn from_u8(v: u8) -> Rarity {
        match v {
            1 => Rarity::Uncommon,
            2 => Rarity::Rare,
            3 => Rarity::Legendary,
            _ => Rarity::Common,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Rarity::Common => ESC_WHITE,
            Rarity::Uncommon => ESC_CYAN,
            Rarity::Rare => ESC_MAGENTA,
            Rarity::Legendary => ESC_YELLOW,
        }
    }

    pub fn colorize(self, text: &str) -> String {
        format!("{}{}{}", self.color(), text, ESC_RESET)
    }
}

pub fn green(text: &str) -> String {
    format!("{ESC_GREEN}{text}{ESC_RESET}")
}

pub fn red(text: &str) -> String {
    format!("{ESC_RED}{text}{ESC_RESET}")
}

/// IAC WILL ECHO, sent before a password prompt to suppress client-side echo.
pub fn iac_will_echo() -> [u8; 3] {
    [IAC, WILL, ECHO]
}

/// IAC WONT ECHO, sent after a password prompt.
pub fn iac_wont_echo() -> [u8; 3] {
    [IAC, WONT, ECHO]
}

/// Filters inbound or outbound telnet IAC sequences out of a byte stream.
///
/// - `IAC IAC` collapses to a single `0xFF` data byte.
/// - `IAC (WILL|WONT|DO|DONT) <opt>` is dropped entirely.
/// - `IAC SB ... IAC SE` (subnegotiation) is dropped entirely.
/// - `IAC <anything else>` drops the two bytes.
/// - A trailing lone `IAC` is held back (returned via `pending`) until more
///   bytes arrive, per spec.
pub struct IacFilter {
    pending_iac: bool,
    in_subneg: bool,
    awaiting_option: Option<u8>,
}

impl Default for IacFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl IacFilter {
    pub fn new() -> Self {
        Self {
            pending_iac: false,
            in_subneg: false,
            awaiting_option: None,
        }
    }

    /// Feeds a chunk of bytes through the filter, returning the bytes that
    /// should pass through unchanged (IAC sequences removed or collapsed).
    pub fn filter(&mut self, input: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(input.len());

        for &b in input {
            if let Some(cmd) = self.awaiting_option {
                // WILL/WONT/DO/DONT <opt> — drop this byte, the option byte.
                let _ = cmd;
                self.awaiting_option = None;
                continue;
            }

            if self.in_subneg {
                if self.pending_iac {
                    self.pending_iac = false;
                    if b == SE {
                        self.in_subneg = false;
                    }
                    // Any other byte following IAC inside a subneg is dropped
                    // along with the subneg itself; we stay in subneg mode.
                    continue;
                }
                if b == IAC {
                    self.pending_iac = true;
                }
                continue;
            }

            if self.pending_iac {
                self.pending_iac = false;
                match b {
                    IAC => out.push(0xFFu8),
                    WILL | WONT | DO | DONT => {
                        self.awaiting_option = Some(b);
                    }
                    SB => {
                        self.in_subneg = true;
                    }
                    _ => {
                        // IAC <other> — drop both bytes.
                    }
                }
                continue;
            }

            if b == IAC {
                self.pending_iac = true;
                continue;
            }

            out.push(b);
        }

        out
    }

    /// True if a lone trailing IAC byte is being held for the next call.
    pub fn has_pending(&self) -> bool {
        self.pending_iac || self.in_subneg || self.awaiting_option.is_some()
    }
}

/// One-shot convenience wrapper around [`IacFilter`] for inputs known to be
/// complete (used by the WS bridge, which filters whole frames).
pub fn filter_telnet_iac(input: &[u8]) -> Vec<u8> {
    let mut f = IacFilter::new();
    f.filter(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_green_unchanged() {
        let text = green("hi");
        assert_eq!(apply_theme(&text, Theme::Green), text);
    }

    #[test]
    fn theme_amber_remaps() {
        let text = green("hi");
        let out = apply_theme(&text, Theme::Amber);
        assert!(out.contains(ESC_YELLOW));
        assert!(!out.contains(ESC_GREEN));
    }

    #[test]
    fn theme_none_strips_all_color() {
        let text = format!("{}hi{}", ESC_GREEN, ESC_RESET);
        let out = apply_theme(&text, Theme::None);
        assert_eq!(out, "hi");
    }

    #[test]
    fn iac_filter_identity_without_iac() {
        let input = b"hello world";
        assert_eq!(filter_telnet_iac(input), input);
    }

    #[test]
    fn iac_filter_doubled_iac_collapses() {
        let input = [IAC, IAC];
        assert_eq!(filter_telnet_iac(&input), vec![0xFF]);
    }

    #[test]
    fn iac_filter_strips_option_negotiation() {
        let input = [b'h', b'i', IAC, WILL, 1, b'!'];
        assert_eq!(filter_telnet_iac(&input), b"hi!");
    }

    #[test]
    fn iac_filter_strips_subnegotiation() {
        let input = [b'a', IAC, SB, 1, 2, 3, IAC, SE, b'b'];
        assert_eq!(filter_telnet_iac(&input), b"ab");
    }

    #[test]
    fn iac_filter_matches_spec_example() {
        // "hi\xff\xfb\x01!\xff\xff" -> "hi!\xff"
        let input = [b'h', b'i', IAC, WILL, 1, b'!', IAC, IAC];
        assert_eq!(filter_telnet_iac(&input), [b'h', b'i', b'!', 0xFF]);
    }

    #[test]
    fn iac_filter_holds_trailing_lone_iac() {
        let mut f = IacFilter::new();
        let out = f.filter(&[b'x', IAC]);
        assert_eq!(out, b"x");
        assert!(f.has_pending());
        let out2 = f.filter(&[IAC]);
        assert_eq!(out2, vec![0xFFu8]);
        assert!(!f.has_pending());
    }
}
