//! # Locomotive BASIC
//!
//! A compiler and cooperative virtual machine for a line-numbered
//! BASIC dialect in the Locomotive family.
//!
//! Begin by opening a terminal and running the executable. If you get
//! the following, you have achieved success.
//! ```text
//! Locomotive BASIC
//! Ready
//! █
//! ```
//!
//! Programs can be loaded with `LOAD "filename.bas"` then run with
//! `RUN`. While a program runs, everything it asks of the outside
//! world (printing, input, frame sync, sound, files) is surfaced to
//! the host driver as a suspend event; the driver services the event
//! and re-enters the machine where it left off.

pub mod lang;
pub mod mach;
pub mod term;
