//! Masking for secrets that show up in logs and CLI output.

use std::fmt;

const VISIBLE_PREFIX: usize = 4;
const MIN_LEN_FOR_PREFIX: usize = 8;

/// Display wrapper that reveals at most a short prefix and the length.
#[derive(Clone, Copy)]
pub struct Masked<'a>(&'a str);

pub fn mask(secret: &str) -> Masked<'_> {
    Masked(secret)
}

impl fmt::Display for Masked<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.0.chars().count();
        if len <= MIN_LEN_FOR_PREFIX {
            return write!(f, "***(len={len})");
        }
        let prefix: String = self.0.chars().take(VISIBLE_PREFIX).collect();
        write!(f, "{prefix}…(len={len})")
    }
}

impl fmt::Debug for Masked<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Owned secret whose `Debug` and `Display` output is masked.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> Masked<'_> {
        mask(&self.0)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", self.masked())
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.masked(), f)
    }
}
