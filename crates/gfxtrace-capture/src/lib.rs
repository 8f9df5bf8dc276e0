// SPDX-License-Identifier: CEPL-1.0
//! Capture side: per-device trace files, recorder hooks and the pass-through layer that
//! feeds them.
pub mod error;
pub mod layer;
pub mod mapping;
pub mod recorder;
pub mod session;

pub use error::CaptureError;
pub use layer::CaptureLayer;
pub use mapping::MappingTable;
pub use recorder::{resolve_whole_size, Recorder};
pub use session::CaptureSession;
