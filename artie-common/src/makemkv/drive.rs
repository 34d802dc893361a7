//! Drive state and inserted-media flags reported by `DRV` lines
//!
//! Values come from `apdefs.h` in the MakeMKV v1.17.7 sources.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mechanical state of an optical drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveState {
    EmptyClosed,
    EmptyOpen,
    Inserted,
    Loading,
    NoDrive,
    Unmounting,
    Unknown(i32),
}

impl DriveState {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => DriveState::EmptyClosed,
            1 => DriveState::EmptyOpen,
            2 => DriveState::Inserted,
            3 => DriveState::Loading,
            256 => DriveState::NoDrive,
            257 => DriveState::Unmounting,
            other => DriveState::Unknown(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            DriveState::EmptyClosed => 0,
            DriveState::EmptyOpen => 1,
            DriveState::Inserted => 2,
            DriveState::Loading => 3,
            DriveState::NoDrive => 256,
            DriveState::Unmounting => 257,
            DriveState::Unknown(code) => *code,
        }
    }

    /// True when a disc is present in the drive
    pub fn has_disc(&self) -> bool {
        matches!(self, DriveState::Inserted)
    }
}

impl fmt::Display for DriveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriveState::EmptyClosed => write!(f, "empty (closed)"),
            DriveState::EmptyOpen => write!(f, "empty (open)"),
            DriveState::Inserted => write!(f, "inserted"),
            DriveState::Loading => write!(f, "loading"),
            DriveState::NoDrive => write!(f, "no drive"),
            DriveState::Unmounting => write!(f, "unmounting"),
            DriveState::Unknown(code) => write!(f, "unknown ({})", code),
        }
    }
}

bitflags! {
    /// Bitmask describing what kind of media is in the drive
    ///
    /// A disc can carry several flags at once; a Blu-ray with AACS reports `12`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MediaFlags: i32 {
        const DVD_FILES_PRESENT = 1;
        const HDVD_FILES_PRESENT = 2;
        const BLURAY_FILES_PRESENT = 4;
        const AACS_FILES_PRESENT = 8;
        const BDSVM_FILES_PRESENT = 16;
    }
}

impl Default for MediaFlags {
    fn default() -> Self {
        MediaFlags::empty()
    }
}

impl fmt::Display for MediaFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .iter_names()
            .map(|(name, _)| match name {
                "DVD_FILES_PRESENT" => "DVD",
                "HDVD_FILES_PRESENT" => "HD-DVD",
                "BLURAY_FILES_PRESENT" => "Blu-ray",
                "AACS_FILES_PRESENT" => "AACS",
                "BDSVM_FILES_PRESENT" => "BDSVM",
                other => other,
            })
            .collect();

        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join(" + "))
        }
    }
}
