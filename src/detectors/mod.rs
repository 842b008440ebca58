//! Component detectors
//!
//! Syntax-level analysis of JavaScript-family files.
//!
//! # Architecture
//!
//! - `common`: tree helpers shared by every detector
//! - `javascript`: component identity, props and local dependencies
//! - `jsx`: the element tree a component renders

pub mod common;
pub mod javascript;
pub mod jsx;
