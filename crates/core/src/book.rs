//! Library book vocabulary: where a book came from, how far the reader got,
//! and what they thought of it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog a library book was added from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookSource {
    #[default]
    Unspecified,
    OpenLibrary,
    GoogleBooks,
    Manual,
}

impl BookSource {
    /// Parse from the wire representation.
    pub fn parse(s: &str) -> crate::Result<Self> {
        match s {
            "unspecified" => Ok(Self::Unspecified),
            "open_library" => Ok(Self::OpenLibrary),
            "google_books" => Ok(Self::GoogleBooks),
            "manual" => Ok(Self::Manual),
            _ => Err(crate::Error::InvalidBookSource(s.to_string())),
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::OpenLibrary => "open_library",
            Self::GoogleBooks => "google_books",
            Self::Manual => "manual",
        }
    }

    /// Stored integer code.
    pub fn code(&self) -> i32 {
        match self {
            Self::Unspecified => 0,
            Self::OpenLibrary => 1,
            Self::GoogleBooks => 2,
            Self::Manual => 3,
        }
    }

    /// Decode a stored integer code.
    pub fn from_code(code: i32) -> crate::Result<Self> {
        match code {
            0 => Ok(Self::Unspecified),
            1 => Ok(Self::OpenLibrary),
            2 => Ok(Self::GoogleBooks),
            3 => Ok(Self::Manual),
            _ => Err(crate::Error::InvalidBookSource(code.to_string())),
        }
    }
}

impl fmt::Display for BookSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reader's progress through a book.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    #[default]
    Unspecified,
    WantToRead,
    Reading,
    Read,
    /// Did not finish.
    Dnf,
}

impl ReadingStatus {
    /// Parse from the wire representation.
    pub fn parse(s: &str) -> crate::Result<Self> {
        match s {
            "unspecified" => Ok(Self::Unspecified),
            "want_to_read" => Ok(Self::WantToRead),
            "reading" => Ok(Self::Reading),
            "read" => Ok(Self::Read),
            "dnf" => Ok(Self::Dnf),
            _ => Err(crate::Error::InvalidReadingStatus(s.to_string())),
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::WantToRead => "want_to_read",
            Self::Reading => "reading",
            Self::Read => "read",
            Self::Dnf => "dnf",
        }
    }

    /// Stored integer code.
    pub fn code(&self) -> i32 {
        match self {
            Self::Unspecified => 0,
            Self::WantToRead => 1,
            Self::Reading => 2,
            Self::Read => 3,
            Self::Dnf => 4,
        }
    }

    /// Decode a stored integer code.
    pub fn from_code(code: i32) -> crate::Result<Self> {
        match code {
            0 => Ok(Self::Unspecified),
            1 => Ok(Self::WantToRead),
            2 => Ok(Self::Reading),
            3 => Ok(Self::Read),
            4 => Ok(Self::Dnf),
            _ => Err(crate::Error::InvalidReadingStatus(code.to_string())),
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Star rating. Zero means the reader has not rated the book.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct BookRating(u8);

impl BookRating {
    pub const UNSPECIFIED: Self = Self(0);
    pub const MAX: u8 = 5;

    /// Validate a raw rating.
    pub fn new(value: i64) -> crate::Result<Self> {
        if (0..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(crate::Error::InvalidRating(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_unspecified(&self) -> bool {
        self.0 == 0
    }
}

impl<'de> Deserialize<'de> for BookRating {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}
