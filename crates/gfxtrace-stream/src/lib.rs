// SPDX-License-Identifier: CEPL-1.0
//! Trace file format: header, event catalog and the binary encoding shared by the
//! recorder and the replayer.
pub mod error;
pub mod event;
pub mod stream;
pub mod texture;
pub mod wire;

pub use error::StreamError;
pub use event::{Event, EventTag, MappedTexels, SubresourcePayload};
pub use stream::{TraceReader, TraceWriter, MAGIC};
pub use texture::calc_texture_size;
