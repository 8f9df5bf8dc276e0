// SPDX-License-Identifier: CEPL-1.0
use crate::error::CaptureError;
use crate::recorder::Recorder;
use gfxtrace_core::CaptureCfg;
use gfxtrace_render::DeviceApi;
use gfxtrace_stream::TraceWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{error, info};

/// Hands out one trace file per device initialised in the process.
pub struct CaptureSession {
    directory: PathBuf,
    stem: String,
    devices: AtomicU32,
}

impl CaptureSession {
    pub fn new(directory: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        CaptureSession {
            directory: directory.into(),
            stem: stem.into(),
            devices: AtomicU32::new(0),
        }
    }

    pub fn from_cfg(cfg: &CaptureCfg) -> Self {
        Self::new(&cfg.directory, &cfg.log_stem)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the trace for the `index`-th device (1-based).
    pub fn trace_path(&self, index: u32) -> PathBuf {
        let name = if index <= 1 {
            format!("{}.bin", self.stem)
        } else {
            format!("{}_{index}.bin", self.stem)
        };
        self.directory.join(name)
    }

    /// Number of devices attached so far.
    pub fn devices(&self) -> u32 {
        self.devices.load(Ordering::Relaxed)
    }

    /// Opens the trace file of the next device and writes its header.
    pub fn attach(&self, api: DeviceApi) -> Result<Arc<Recorder>, CaptureError> {
        let index = self.devices.fetch_add(1, Ordering::Relaxed) + 1;
        let path = self.trace_path(index);
        let writer = TraceWriter::create(&path, api).map_err(|source| {
            error!(path = %path.display(), %source, "cannot open trace file");
            CaptureError::Open {
                path: path.clone(),
                source,
            }
        })?;
        info!(path = %path.display(), %api, device = index, "capturing");
        Ok(Arc::new(Recorder::from_writer(api, writer)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_and_later_devices_get_a_suffix() {
        let session = CaptureSession::new("/tmp/traces", "api_trace_log");
        assert_eq!(
            session.trace_path(1),
            Path::new("/tmp/traces/api_trace_log.bin")
        );
        assert_eq!(
            session.trace_path(2),
            Path::new("/tmp/traces/api_trace_log_2.bin")
        );
        assert_eq!(
            session.trace_path(7),
            Path::new("/tmp/traces/api_trace_log_7.bin")
        );
    }

    #[test]
    fn attach_creates_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let session = CaptureSession::new(dir.path(), "trace");
        let first = session.attach(DeviceApi::D3D11).unwrap();
        let second = session.attach(DeviceApi::Vulkan).unwrap();
        drop((first, second));

        assert_eq!(session.devices(), 2);
        assert!(dir.path().join("trace.bin").exists());
        assert!(dir.path().join("trace_2.bin").exists());
    }

    #[test]
    fn unwritable_directory_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let session = CaptureSession::new(dir.path().join("missing"), "trace");
        assert!(matches!(
            session.attach(DeviceApi::D3D12),
            Err(CaptureError::Open { .. })
        ));
    }
}
