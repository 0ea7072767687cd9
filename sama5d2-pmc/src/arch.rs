//! Portable in-line assembly
//!
//! The spin helpers the clock sequencer needs, as real instructions on the
//! Cortex-A5 and as placeholders everywhere else so that host tests link.

#[cfg(all(target_arch = "arm", target_os = "none"))]
mod inner {
    /// Emit a single `nop` instruction
    #[inline(always)]
    pub fn nop() {
        unsafe { core::arch::asm!("nop", options(nomem, nostack, preserves_flags)) };
    }

    /// Spin for at least `spins` iterations of a `nop` loop
    #[inline(never)]
    pub fn delay(spins: u32) {
        for _ in 0..spins {
            nop();
        }
    }

    /// Data Synchronization Barrier
    #[inline(always)]
    pub fn dsb() {
        unsafe { core::arch::asm!("dsb", options(nostack, preserves_flags)) };
    }
}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
mod inner {
    /// Placeholder function to do nothing
    pub fn nop() {
        core::hint::spin_loop();
    }

    /// Placeholder function to wait for some spins
    pub fn delay(spins: u32) {
        for _ in 0..spins {
            core::hint::spin_loop();
        }
    }

    /// Placeholder function to emit a data synchronisation barrier
    pub fn dsb() {
        core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
    }
}

pub use inner::*;
