//! # propimport
//!
//! Vendors the libpropeller sources into a PropWare project tree.
//!
//! A run does three things, in order:
//!
//! - **Clean**: prune the destination folder, keeping build-system files and
//!   an emptied source dropbox
//! - **Fetch**: clone the upstream repository, or pull an existing clone
//!   (a missing or failing `git` is reported, never fatal)
//! - **Copy**: deep-copy the upstream library folder over the destination
//!
//! All steps read one immutable [`ImportConfig`] built at startup.

pub mod cleaner;
pub mod cli;
pub mod common;
pub mod importer;
pub mod upstream;
pub mod vendor;

pub use common::{ImportConfig, ImportError, Settings};
pub use importer::{ImportReport, Importer, RunOptions, StatusReport};
