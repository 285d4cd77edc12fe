//! ANSI/VT escape sequence removal for captured PTY output.

use once_cell::sync::Lazy;
use regex::Regex;

/// ESC followed by a single C1 byte, or a CSI sequence (parameters, intermediates, final byte)
static ANSI_ESCAPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").expect("Invalid ANSI_ESCAPE_RE regex")
});

/// Remove escape sequences and carriage returns from captured output.
///
/// Removal runs until nothing changes, so an escape split around another
/// sequence (`"\x1b\x1b[0m[0m"`) is gone too and `strip_ansi` is idempotent.
pub fn strip_ansi(input: &str) -> String {
    let mut current = input.replace('\r', "");
    loop {
        let next = ANSI_ESCAPE_RE.replace_all(&current, "").replace('\r', "");
        if next.len() == current.len() {
            return next;
        }
        current = next;
    }
}
