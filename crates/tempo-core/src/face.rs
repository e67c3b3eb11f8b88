//! Clock faces - `HH:MM:SS` composition without per-frame allocation
//!
//! A [`DigitTable`] holds the sixty zero-padded two-digit strings `00`..`59`.
//! Owners build it once at startup and compose every face from it into a
//! fixed stack buffer.

use std::fmt;

/// Longest face: sign plus `HH:MM:SS`
pub const MAX_FACE_LEN: usize = 9;

/// Lookup table of the two-digit fields `00`..`59`
#[derive(Clone, Debug)]
pub struct DigitTable {
    pairs: [[u8; 2]; 60],
}

impl DigitTable {
    pub fn new() -> Self {
        let mut pairs = [[b'0'; 2]; 60];
        for (n, pair) in pairs.iter_mut().enumerate() {
            *pair = [b'0' + (n / 10) as u8, b'0' + (n % 10) as u8];
        }
        DigitTable { pairs }
    }

    /// Two-digit field for `n`, which must be below 60
    #[inline]
    pub fn pair(&self, n: u64) -> [u8; 2] {
        self.pairs[(n % 60) as usize]
    }

    /// Compose the face for a signed whole-second value.
    ///
    /// Hours are `floor(|s| / 3600) mod 60`, so 60 hours reads as `00`.
    pub fn compose(&self, seconds: i64) -> ClockFace {
        let abs = seconds.unsigned_abs();
        let hours = (abs / 3600) % 60;
        let minutes = (abs / 60) % 60;
        let secs = abs % 60;

        let mut face = ClockFace::blank();
        if seconds < 0 {
            face.push(b'-');
        }
        face.push_pair(self.pair(hours));
        face.push(b':');
        face.push_pair(self.pair(minutes));
        face.push(b':');
        face.push_pair(self.pair(secs));
        face
    }
}

impl Default for DigitTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A composed face, held inline
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ClockFace {
    buf: [u8; MAX_FACE_LEN],
    len: usize,
}

impl ClockFace {
    fn blank() -> Self {
        ClockFace {
            buf: [0; MAX_FACE_LEN],
            len: 0,
        }
    }

    #[inline]
    fn push(&mut self, byte: u8) {
        self.buf[self.len] = byte;
        self.len += 1;
    }

    #[inline]
    fn push_pair(&mut self, pair: [u8; 2]) {
        self.push(pair[0]);
        self.push(pair[1]);
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII digits, ':' and '-' are ever pushed
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    pub fn is_negative(&self) -> bool {
        self.len > 0 && self.buf[0] == b'-'
    }
}

impl fmt::Display for ClockFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for ClockFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockFace({})", self.as_str())
    }
}

impl PartialEq<&str> for ClockFace {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
