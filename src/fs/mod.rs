//! Filesystem utilities: atomic writes and content hashing.

pub mod atomic;
mod hash;

pub use atomic::{atomic_write, atomic_write_file};
pub use hash::{sha256_file, sha256_hex};
