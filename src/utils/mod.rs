//! 補助ユーティリティ群

pub mod network;

pub use network::{checksum, hexdump};
