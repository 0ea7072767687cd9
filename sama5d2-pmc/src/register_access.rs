//! Access to the PMC and SCKC registers
//!
//! The clock code never dereferences addresses itself. It goes through a
//! [`RegisterSurface`], which the memory mapped [`Mmio`] implements on target
//! and [`crate::sim::SimulatedPmc`] implements on the host.
//!
//! Reads are side-effecting from the point of view of this crate: status bits
//! change between two reads and `PMC_PCR` returns the control word of whatever
//! peripheral was last selected.

use vcell::VolatileCell;

/// Base address of the PMC register block on the SAMA5D2.
pub const PMC_BASE: usize = 0xF001_4000;

/// Address of the SCKC control register on the SAMA5D2.
pub const SCKC_BASE: usize = 0xF804_8050;

/// The registers the clock tree code touches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// PMC_SCER, system clock enable (write-only)
    Scer,
    /// PMC_SCDR, system clock disable (write-only)
    Scdr,
    /// PMC_SCSR, system clock status
    Scsr,
    /// CKGR_MOR, main oscillator
    CkgrMor,
    /// CKGR_PLLAR, PLL-A
    CkgrPllar,
    /// PMC_MCKR, master clock
    Mckr,
    /// PMC_PCK0, programmable clock 0
    Pck0,
    /// PMC_PCK1, programmable clock 1
    Pck1,
    /// PMC_PCK2, programmable clock 2
    Pck2,
    /// PMC_SR, status
    Sr,
    /// PMC_PLLICPR, PLL charge pump current
    Pllicpr,
    /// PMC_PCR, peripheral control
    Pcr,
    /// SCKC_CR, slow clock controller configuration
    SckcCr,
}

impl Register {
    /// Byte offset of the register from the base of its block.
    pub const fn offset(self) -> usize {
        match self {
            Register::Scer => 0x00,
            Register::Scdr => 0x04,
            Register::Scsr => 0x08,
            Register::CkgrMor => 0x20,
            Register::CkgrPllar => 0x28,
            Register::Mckr => 0x30,
            Register::Pck0 => 0x40,
            Register::Pck1 => 0x44,
            Register::Pck2 => 0x48,
            Register::Sr => 0x68,
            Register::Pllicpr => 0x80,
            Register::Pcr => 0x10C,
            Register::SckcCr => 0x00,
        }
    }

    /// Whether the register lives in the SCKC rather than the PMC.
    pub const fn in_sckc(self) -> bool {
        matches!(self, Register::SckcCr)
    }
}

/// A volatile, side-effecting view of the PMC and SCKC registers.
pub trait RegisterSurface {
    /// Read the current value of `reg`.
    fn read(&self, reg: Register) -> u32;

    /// Write `value` to `reg`.
    fn write(&self, reg: Register, value: u32);

    /// Read `reg`, pass the value through `f` and write the result back.
    ///
    /// This is not atomic with respect to other writers; callers that share
    /// the register hold a critical section around it.
    fn modify<F: FnOnce(u32) -> u32>(&self, reg: Register, f: F) {
        let value = self.read(reg);
        self.write(reg, f(value));
    }
}

impl<T: RegisterSurface + ?Sized> RegisterSurface for &T {
    fn read(&self, reg: Register) -> u32 {
        (**self).read(reg)
    }

    fn write(&self, reg: Register, value: u32) {
        (**self).write(reg, value)
    }
}

/// Memory mapped PMC and SCKC registers.
#[derive(Debug)]
pub struct Mmio {
    pmc_base: usize,
    sckc_base: usize,
}

impl Mmio {
    /// Registers at the SAMA5D2 reset addresses.
    ///
    /// # Safety
    ///
    /// Only one `Mmio` may exist at a time, and nothing else in the program may
    /// write to the PMC or the SCKC while it does.
    pub unsafe fn sama5d2() -> Self {
        Mmio {
            pmc_base: PMC_BASE,
            sckc_base: SCKC_BASE,
        }
    }

    /// Registers at an alternative location, for parts that share the PMC
    /// layout but map it elsewhere.
    ///
    /// # Safety
    ///
    /// In addition to the requirements of [`Mmio::sama5d2`], both addresses
    /// must point to valid, word aligned register blocks of the right layout.
    pub unsafe fn with_base_addresses(pmc_base: usize, sckc_base: usize) -> Self {
        Mmio {
            pmc_base,
            sckc_base,
        }
    }

    #[inline]
    fn cell(&self, reg: Register) -> &VolatileCell<u32> {
        let base = if reg.in_sckc() {
            self.sckc_base
        } else {
            self.pmc_base
        };
        // Safety: the constructors guarantee the address points at a live
        // register that nothing else aliases mutably.
        unsafe { &*((base + reg.offset()) as *const VolatileCell<u32>) }
    }
}

impl RegisterSurface for Mmio {
    #[inline]
    fn read(&self, reg: Register) -> u32 {
        self.cell(reg).get()
    }

    #[inline]
    fn write(&self, reg: Register, value: u32) {
        self.cell(reg).set(value)
    }
}
