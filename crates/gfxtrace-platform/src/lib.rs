// SPDX-License-Identifier: CEPL-1.0
//! Windowing for the player. Only winit is exposed; raw window handles come through its
//! `rwh_06` feature.
pub use winit;
