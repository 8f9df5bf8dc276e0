// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use anyhow::{anyhow, Context, Result};
use gfxtrace_render::{Application, CommandList, Device, DeviceError, Resource};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawWindowHandle};
use tracing::{debug, info};

use glutin::{
    config::ConfigTemplateBuilder,
    context::{
        ContextApi, ContextAttributesBuilder, NotCurrentContext, PossiblyCurrentContext, Version,
    },
    display::{Display, DisplayApiPreference},
    prelude::*,
    surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface},
};

use std::ffi::CString;
use std::num::NonZeroU32;

mod command;
mod convert;
mod device;

pub use device::GlDevice;

/// A window surface with a current OpenGL context, exposed as a replay target.
pub struct GlApplication {
    context: PossiblyCurrentContext,
    surface: Surface<WindowSurface>,
    device: GlDevice,
    vsync: bool,
}

fn non_zero(v: u32) -> NonZeroU32 {
    NonZeroU32::new(v).unwrap_or(NonZeroU32::MIN)
}

impl GlApplication {
    fn make_current(
        display: &Display,
        window_handle: RawWindowHandle,
        width: u32,
        height: u32,
    ) -> Result<(
        PossiblyCurrentContext,
        Surface<WindowSurface>,
        glow::Context,
    )> {
        let template = ConfigTemplateBuilder::new().build();
        let mut configs = unsafe { display.find_configs(template) }.context("find_configs")?;
        let config = configs.next().ok_or_else(|| anyhow!("no GL configs"))?;

        let sattrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            window_handle,
            non_zero(width),
            non_zero(height),
        );
        let surface = unsafe { display.create_window_surface(&config, &sattrs) }
            .context("create_window_surface")?;
        let ctx_attrs = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(4, 3))))
            .build(Some(window_handle));
        let fallback_attrs = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(window_handle));
        let not_current: NotCurrentContext = unsafe {
            display
                .create_context(&config, &ctx_attrs)
                .or_else(|_| display.create_context(&config, &fallback_attrs))
        }
        .context("create_context")?;

        let context = not_current.make_current(&surface).context("make_current")?;

        let gl = unsafe {
            glow::Context::from_loader_function(|s| match CString::new(s) {
                Ok(name) => display.get_proc_address(&name),
                Err(_) => std::ptr::null(),
            })
        };

        Ok((context, surface, gl))
    }

    pub fn new(
        window: &dyn HasWindowHandle,
        display_handle: &dyn HasDisplayHandle,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<Self> {
        let wh = window
            .window_handle()
            .map_err(|e| anyhow!("{e}"))?
            .as_raw();
        let dh = display_handle
            .display_handle()
            .map_err(|e| anyhow!("{e}"))?
            .as_raw();

        let display =
            unsafe { Display::new(dh, DisplayApiPreference::Egl) }.context("Display::new")?;

        let (context, surface, gl) = Self::make_current(&display, wh, width, height)?;
        let device = GlDevice::new(gl, width.max(1), height.max(1)).context("GL device")?;

        let mut app = GlApplication {
            context,
            surface,
            device,
            vsync,
        };
        app.set_vsync(vsync);
        info!(width, height, vsync, "GL context ready");
        Ok(app)
    }

    pub fn set_vsync(&mut self, on: bool) {
        self.vsync = on;
        let interval = if on {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(e) = self.surface.set_swap_interval(&self.context, interval) {
            debug!("set_swap_interval: {e}");
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface
            .resize(&self.context, non_zero(width), non_zero(height));
        self.device.resize(width, height);
        self.set_vsync(self.vsync);
    }
}

impl Application for GlApplication {
    fn device(&mut self) -> &mut dyn Device {
        &mut self.device
    }

    fn command_list(&mut self) -> &mut dyn CommandList {
        &mut self.device
    }

    fn back_buffer_count(&self) -> u32 {
        1
    }

    fn back_buffer(&self, _index: u32) -> Resource {
        device::default_back_buffer()
    }

    fn current_back_buffer(&self) -> Resource {
        device::default_back_buffer()
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        self.surface
            .swap_buffers(&self.context)
            .map_err(|e| DeviceError::Native(format!("swap_buffers: {e}")))
    }
}
