// SPDX-License-Identifier: CEPL-1.0
use gfxtrace_render::DeviceError;
use gfxtrace_stream::StreamError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("cannot open trace {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: StreamError,
    },
    #[error("trace stream: {0}")]
    Stream(#[from] StreamError),
    #[error("present failed: {0}")]
    Present(#[source] DeviceError),
}
