//! Turns a directory of descriptor files plus their images into metadata records.

mod assembler;

pub use assembler::{gateway_url, Assembler, ImageUri};
