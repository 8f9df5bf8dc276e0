// SPDX-License-Identifier: CEPL-1.0
//! Playback side: origin to live handle registry and the per-frame event pump.
mod command_calls;
pub mod context;
mod device_calls;
pub mod error;
pub mod registry;
pub mod replayer;

pub use context::{ReplayContext, ReplayStats};
pub use error::ReplayError;
pub use registry::{HandleMap, HandleRegistry};
pub use replayer::{FrameEnd, Replayer};
