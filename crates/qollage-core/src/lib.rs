//! Qollage Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Qollage circuit
//! diagram engine. It includes:
//!
//! - **Circuit**: The read-only circuit input model ([`circuit::Circuit`], [`circuit::Operation`])
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Draw**: Drawing commands, render layers, strokes and text ([`draw`] module)

pub mod circuit;
pub mod color;
pub mod draw;
pub mod geometry;
