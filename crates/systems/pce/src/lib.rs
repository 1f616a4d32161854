//! PC Engine / SuperGrafx system wrapper
//!
//! This crate is a thin layer over a native PC Engine core. The core itself
//! (CPU, VDC, CD unit) runs behind [`emu_core::NativeCore`]; this crate decides
//! which of its settings the user may touch and keeps the native side in sync
//! with the user's overrides.
//!
//! # Variants
//!
//! - **PCE**: one VDC, 2 render layers (BG0, SPR0)
//! - **SGX**: two VDCs, 4 render layers (BG0, SPR0, BG1, SPR1)
//!
//! The native core reports its layers, so the variant is read off the catalog.

mod system;

pub use system::{host_overrides, GameInfo, PceError, PceSystem, BRAM_SETTING};
