//! Register-level simulator of the PMC and SCKC
//!
//! [`SimulatedPmc`] implements [`RegisterSurface`] with the side effects the
//! clock code relies on: the CKGR_MOR password, the PMC_PCR select-then-read
//! protocol, the write-one PMC_SCER / PMC_SCDR pair and a PMC_SR computed from
//! the other registers. Status bits can be held low to exercise timeouts.
//!
//! ```
//! use sama5d2_pmc::{clocks::Prescaler, config::SAMA5D2_XPLAINED, sim::SimulatedPmc, Pmc};
//!
//! let sim = SimulatedPmc::new();
//! let pmc = Pmc::new(&sim, SAMA5D2_XPLAINED);
//! pmc.set_master_prescaler(Prescaler::Div4).unwrap();
//! assert_eq!(pmc.master_clock().to_Hz(), 3_000_000);
//! ```
//!
//! Timing is not modelled: every status shows up on the first read unless it
//! is held low.

use core::cell::Cell;

use crate::{
    register_access::{Register, RegisterSurface},
    registers::{Mckr, Mor, Pcr, Pllar, Sr, MOR_KEY_PASSWD},
};

const SR_MOSCXTS: u32 = 1 << 0;
const SR_LOCKA: u32 = 1 << 1;
const SR_MCKRDY: u32 = 1 << 3;
const SR_OSCSELS: u32 = 1 << 7;
const SR_MOSCSELS: u32 = 1 << 16;
const SR_MOSCRCS: u32 = 1 << 17;
const SR_GCKRDY: u32 = 1 << 24;

const PROGRAMMABLE_CLOCKS: u32 = 3;
const PCK0_SCSR_BIT: u32 = 8;

/// In-memory PMC and SCKC.
#[derive(Debug)]
pub struct SimulatedPmc {
    mckr: Cell<u32>,
    mor: Cell<u32>,
    pllar: Cell<u32>,
    pllicpr: Cell<u32>,
    pck: [Cell<u32>; 3],
    scsr: Cell<u32>,
    sckc_cr: Cell<u32>,
    pcr_selected: Cell<u8>,
    pcr: [Cell<u32>; 128],
    pcr_commands: Cell<u32>,
    held_low: Cell<u32>,
    stuck_system_clocks: Cell<u32>,
}

impl Default for SimulatedPmc {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPmc {
    /// A PMC in its reset state: MCK from the main RC oscillator, PLL-A off,
    /// slow clock from the slow RC oscillator, every gate closed.
    pub fn new() -> Self {
        let mut mckr = Mckr::default();
        mckr.set_css(1);
        let mut mor = Mor::default();
        mor.set_moscrcen(true);
        let mut pllar = Pllar::default();
        pllar.set_one(true);

        SimulatedPmc {
            mckr: Cell::new(mckr.into()),
            mor: Cell::new(mor.into()),
            pllar: Cell::new(pllar.into()),
            pllicpr: Cell::new(0),
            pck: core::array::from_fn(|_| Cell::new(0)),
            scsr: Cell::new(0),
            sckc_cr: Cell::new(0),
            pcr_selected: Cell::new(0),
            pcr: core::array::from_fn(|_| Cell::new(0)),
            pcr_commands: Cell::new(0),
            held_low: Cell::new(0),
            stuck_system_clocks: Cell::new(0),
        }
    }

    /// Store `value` in `reg` directly, without the side effects of a write.
    ///
    /// For PMC_PCR the value goes to the peripheral named by its PID field.
    /// PMC_SR, PMC_SCER and PMC_SCDR have no storage and ignore this.
    pub fn set_register(&self, reg: Register, value: u32) {
        match reg {
            Register::Pcr => {
                let pcr = Pcr::from(value);
                self.pcr[usize::from(pcr.pid())].set(Self::pcr_fields(pcr));
            }
            Register::Sr | Register::Scer | Register::Scdr => {}
            _ => {
                if let Some(cell) = self.storage(reg) {
                    cell.set(value);
                }
            }
        }
    }

    /// Current value of `reg`, as a read would return it.
    pub fn register(&self, reg: Register) -> u32 {
        self.read(reg)
    }

    /// Keep the PMC_SR bits in `mask` low until [`Self::release`].
    pub fn hold_low(&self, mask: u32) {
        self.held_low.set(self.held_low.get() | mask);
    }

    /// Let the PMC_SR bits in `mask` report their real state again.
    pub fn release(&self, mask: u32) {
        self.held_low.set(self.held_low.get() & !mask);
    }

    /// Ignore PMC_SCER and PMC_SCDR writes to the clocks in `mask`.
    pub fn stick_system_clocks(&self, mask: u32) {
        self.stuck_system_clocks
            .set(self.stuck_system_clocks.get() | mask);
    }

    /// Number of PMC_PCR writes with CMD set so far.
    pub fn pcr_commands(&self) -> u32 {
        self.pcr_commands.get()
    }

    fn storage(&self, reg: Register) -> Option<&Cell<u32>> {
        match reg {
            Register::Scsr => Some(&self.scsr),
            Register::CkgrMor => Some(&self.mor),
            Register::CkgrPllar => Some(&self.pllar),
            Register::Mckr => Some(&self.mckr),
            Register::Pck0 => Some(&self.pck[0]),
            Register::Pck1 => Some(&self.pck[1]),
            Register::Pck2 => Some(&self.pck[2]),
            Register::Pllicpr => Some(&self.pllicpr),
            Register::SckcCr => Some(&self.sckc_cr),
            Register::Scer | Register::Scdr | Register::Sr | Register::Pcr => None,
        }
    }

    /// The part of a PMC_PCR word that is kept per peripheral.
    fn pcr_fields(written: Pcr) -> u32 {
        let mut kept = Pcr::default();
        kept.set_gckcss(written.gckcss());
        kept.set_gckdiv(written.gckdiv());
        kept.set_en(written.en());
        kept.set_gcken(written.gcken());
        kept.into()
    }

    fn status(&self) -> u32 {
        let mor = Mor::from(self.mor.get());
        let pllar = Pllar::from(self.pllar.get());
        let scsr = self.scsr.get();

        let mut sr = SR_MCKRDY | SR_OSCSELS | SR_MOSCSELS | SR_GCKRDY;
        if mor.moscxten() {
            sr |= SR_MOSCXTS;
        }
        if mor.moscrcen() {
            sr |= SR_MOSCRCS;
        }
        if pllar.diva() != 0 && pllar.mula() != 0 {
            sr |= SR_LOCKA;
        }
        for index in 0..PROGRAMMABLE_CLOCKS {
            if scsr & (1 << (PCK0_SCSR_BIT + index)) != 0 {
                sr |= 1 << (Sr::PCKRDY0 + index);
            }
        }
        sr & !self.held_low.get()
    }
}

impl RegisterSurface for SimulatedPmc {
    fn read(&self, reg: Register) -> u32 {
        match reg {
            Register::Sr => self.status(),
            Register::Pcr => {
                let pid = self.pcr_selected.get();
                self.pcr[usize::from(pid)].get() | u32::from(pid)
            }
            // Write-only
            Register::Scer | Register::Scdr => 0,
            _ => self.storage(reg).map_or(0, Cell::get),
        }
    }

    fn write(&self, reg: Register, value: u32) {
        let free = !self.stuck_system_clocks.get();
        match reg {
            Register::Scer => self.scsr.set(self.scsr.get() | (value & free)),
            Register::Scdr => self.scsr.set(self.scsr.get() & !(value & free)),
            Register::Scsr | Register::Sr => {}
            Register::CkgrMor => {
                let mut mor = Mor::from(value);
                if mor.key() == MOR_KEY_PASSWD {
                    mor.set_key(0);
                    self.mor.set(mor.into());
                }
            }
            Register::Pcr => {
                let pcr = Pcr::from(value);
                self.pcr_selected.set(pcr.pid());
                if pcr.cmd() {
                    self.pcr[usize::from(pcr.pid())].set(Self::pcr_fields(pcr));
                    self.pcr_commands.set(self.pcr_commands.get() + 1);
                }
            }
            _ => {
                if let Some(cell) = self.storage(reg) {
                    cell.set(value);
                }
            }
        }
    }
}
