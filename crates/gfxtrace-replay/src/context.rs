// SPDX-License-Identifier: CEPL-1.0
use crate::registry::HandleRegistry;
use gfxtrace_render::*;
use gfxtrace_stream::Event;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Counters of one replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Frame boundaries reached.
    pub frames: u64,
    /// Events decoded and dispatched, frame boundaries included.
    pub events: u64,
    /// Events consumed without a live effect, including commands the backend dropped.
    pub skipped: u64,
    /// Native calls that reported failure.
    pub failures: u64,
}

/// State that lives across events: the handle registry plus what the replayer remembers about
/// origin resources.
pub struct ReplayContext {
    pub(crate) registry: HandleRegistry,
    pub(crate) origin_descs: HashMap<Resource, ResourceDesc>,
    pub(crate) api: DeviceApi,
    pub(crate) strict: bool,
    pub(crate) stats: ReplayStats,
}

impl ReplayContext {
    pub fn new(api: DeviceApi) -> Self {
        ReplayContext {
            registry: HandleRegistry::default(),
            origin_descs: HashMap::new(),
            api,
            strict: false,
            stats: ReplayStats::default(),
        }
    }

    pub fn api(&self) -> DeviceApi {
        self.api
    }

    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    /// Panic on native failures instead of skipping the call.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Applies one event against the live application.
    pub fn apply(&mut self, app: &mut dyn Application, event: Event) {
        self.stats.events += 1;
        trace!(event = event.tag().name(), "apply");
        match event {
            Event::InitSwapchain { back_buffers } => self.init_swapchain(app, &back_buffers),
            Event::DestroySwapchain { back_buffers } => self.destroy_swapchain(&back_buffers),
            Event::Present => {}
            Event::Unrecorded(tag) => {
                debug!(event = tag.name(), "ignored");
                self.stats.skipped += 1;
            }
            event if event.tag().is_command() => {
                let list = app.command_list();
                self.apply_command(&mut *list, event);
                self.stats.skipped += list.take_unsupported();
            }
            event => self.apply_device(app.device(), event),
        }
    }

    /// Destroys every object the replay created. Host objects are left alone.
    pub fn release_all(&mut self, device: &mut dyn Device) {
        let r = &mut self.registry;
        for h in r.pipelines.drain_owned() {
            device.destroy_pipeline(h);
        }
        let tables = r.tables.drain_owned();
        if !tables.is_empty() {
            device.free_descriptor_tables(&tables);
        }
        for h in r.layouts.drain_owned() {
            device.destroy_pipeline_layout(h);
        }
        for h in r.views.drain_owned() {
            device.destroy_resource_view(h);
        }
        for h in r.resources.drain_owned() {
            device.destroy_resource(h);
        }
        for h in r.samplers.drain_owned() {
            device.destroy_sampler(h);
        }
        self.origin_descs.clear();
    }

    fn init_swapchain(&mut self, app: &mut dyn Application, back_buffers: &[Resource]) {
        let count = app.back_buffer_count();
        let aliases_views = matches!(self.api, DeviceApi::D3D9 | DeviceApi::OpenGL);
        for (i, &origin) in back_buffers.iter().enumerate() {
            let index = if (i as u32) < count { i as u32 } else { 0 };
            let live = app.back_buffer(index);
            if let Some(stale) = self.registry.resources.insert_borrowed(origin, live) {
                app.device().destroy_resource(stale);
            }
            // these APIs hand out back buffers that double as their render target views
            if aliases_views {
                let view = ResourceView(origin.0);
                if let Some(stale) = self.registry.views.insert_borrowed(view, ResourceView(live.0)) {
                    app.device().destroy_resource_view(stale);
                }
            }
        }
        debug!(count = back_buffers.len(), live = count, "swapchain mapped");
    }

    fn destroy_swapchain(&mut self, back_buffers: &[Resource]) {
        for &origin in back_buffers {
            self.registry.resources.forget(origin);
            self.registry.views.forget(ResourceView(origin.0));
        }
    }

    /// OpenGL names the window-system framebuffer with a reserved target in the high bits;
    /// such handles are valid as-is in every process.
    pub(crate) fn is_default_framebuffer(&self, raw: u64) -> bool {
        self.api == DeviceApi::OpenGL && is_gl_default_framebuffer(raw)
    }

    pub(crate) fn native_failure(&mut self, what: &str, origin: u64, err: DeviceError) {
        self.stats.failures += 1;
        if self.strict {
            panic!("{what} failed for origin {origin:#x}: {err}");
        }
        warn!(what, origin, %err, "native call failed, dropping it");
    }

    pub(crate) fn skip(&mut self, what: &str, origin: u64) {
        self.stats.skipped += 1;
        debug!(what, origin, "no live object, skipped");
    }
}
