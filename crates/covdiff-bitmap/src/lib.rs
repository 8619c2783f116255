#![warn(clippy::pedantic)]

pub mod block_bitmap;
pub mod edge_map;
pub mod error;
pub mod shape;

pub use block_bitmap::{BlockId, BlockSet, count_blocks, decode_blocks};
pub use edge_map::{EdgeId, EdgeSet, NEVER_EXECUTED, count_edges, decode_edges};
pub use error::BitmapError;
pub use shape::BitmapShape;
