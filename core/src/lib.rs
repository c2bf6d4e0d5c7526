//! Aroma Installer Core Library
//!
//! USB partitioning, FAT32 formatting and the raw FSA request codec used to
//! format and (un)mount volumes. Designed to be no_std compatible.

#![cfg_attr(not(test), no_std)]
#![allow(clippy::new_without_default)]

extern crate alloc;

pub mod aligned;
pub mod config;
pub mod disk;
pub mod error;
pub mod fs;
pub mod fsa;
pub mod logger;
pub mod mount;

pub use error::{InstallerError, InstallerResult};
