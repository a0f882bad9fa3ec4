use std::fmt::Write;

use super::naming::timestamp;
use super::sink::SinkHandle;

/// Human-readable record writer on top of a sink.
///
/// Every record becomes `[<timestamp>] <message>\n`. Cloning is cheap and
/// all clones feed the same file.
#[derive(Debug, Clone)]
pub struct TraceLog {
    sink: SinkHandle,
}

impl TraceLog {
    pub fn new(sink: SinkHandle) -> Self {
        Self { sink }
    }

    pub fn log(&self, message: impl AsRef<str>) {
        self.sink
            .submit(format!("[{}] {}\n", timestamp(), message.as_ref()));
    }

    /// Logs `bytes` as a single hex dump record.
    pub fn log_hex(&self, bytes: &[u8]) {
        self.log(hex_dump(bytes));
    }
}

/// Canonical 16-bytes-per-line hex dump.
///
/// ```text
/// 00000000  68 65 6c 6c 6f 2c 20 77  6f 72 6c 64 21 0a        |hello, world!.|
/// ```
///
/// Non-printable bytes show as `.` in the right column. An empty input gives
/// an empty string.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(16) * 79);

    for (line, chunk) in bytes.chunks(16).enumerate() {
        let _ = write!(out, "{:08x}  ", line * 16);
        for column in 0..16 {
            match chunk.get(column) {
                Some(byte) => {
                    let _ = write!(out, "{:02x} ", byte);
                }
                None => out.push_str("   "),
            }
            if column == 7 {
                out.push(' ');
            }
        }
        out.push_str(" |");
        out.extend(chunk.iter().map(|&b| {
            if (0x20..=0x7e).contains(&b) {
                b as char
            } else {
                '.'
            }
        }));
        out.push_str("|\n");
    }

    out
}
