//! Peripheral clock gating
//!
//! Each peripheral's clock is switched through PMC_PCR: a write selects the
//! peripheral, a read returns its control word, and a second write with CMD
//! set applies a new one. The three steps are only meaningful back to back,
//! so they always run inside one critical section.

use fugit::HertzU32;

use crate::{
    clocks::{Error, InvalidArgument, Pmc},
    config::ClockConfig,
    register_access::{Register, RegisterSurface},
    registers::{Mckr, Pcr},
};

/// A peripheral id known to have a clock gate.
///
/// Ids 0 and 1 are reserved and ids stop at the part's peripheral count.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheralId(u8);

impl PeripheralId {
    /// Largest id the 7 bit PMC_PCR.PID field can select.
    const MAX: u32 = 0x7f;

    /// Validate `id` against the peripheral table in `config`.
    pub fn new(id: u32, config: &ClockConfig) -> Result<Self, InvalidArgument> {
        if id < 2 || id >= config.peripheral_count || id > Self::MAX {
            return Err(InvalidArgument::PeripheralId(id));
        }
        Ok(PeripheralId(id as u8))
    }

    /// The raw id.
    pub fn id(self) -> u32 {
        u32::from(self.0)
    }
}

impl From<PeripheralId> for u32 {
    fn from(id: PeripheralId) -> u32 {
        id.id()
    }
}

impl<R: RegisterSurface> Pmc<R> {
    /// Validate a raw peripheral id against the board configuration.
    pub fn peripheral_id(&self, id: u32) -> Result<PeripheralId, Error> {
        Ok(PeripheralId::new(id, &self.config)?)
    }

    /// Ungate the clock of peripheral `id`.
    pub fn enable_peripheral(&self, id: u32) -> Result<(), Error> {
        let id = self.peripheral_id(id)?;
        self.update_pcr(id, |pcr| pcr.set_en(true));
        Ok(())
    }

    /// Gate the clock of peripheral `id`.
    pub fn disable_peripheral(&self, id: u32) -> Result<(), Error> {
        let id = self.peripheral_id(id)?;
        self.update_pcr(id, |pcr| pcr.set_en(false));
        Ok(())
    }

    /// Whether the clock of peripheral `id` is running.
    pub fn is_peripheral_enabled(&self, id: u32) -> Result<bool, Error> {
        let id = self.peripheral_id(id)?;
        Ok(self.read_pcr(id).en())
    }

    /// Gate every peripheral clock, lowest id first.
    pub fn disable_all_peripherals(&self) {
        let last = self.config.peripheral_count.min(PeripheralId::MAX + 1);
        for id in 2..last {
            let id = PeripheralId(id as u8);
            self.update_pcr(id, |pcr| pcr.set_en(false));
        }
    }

    /// Frequency the clock of peripheral `id` runs at when enabled.
    ///
    /// Peripherals behind the H32MX matrix run at MCK / 2 while
    /// PMC_MCKR.H32MXDIV is set, everything else at MCK.
    pub fn peripheral_clock(&self, id: u32) -> Result<HertzU32, Error> {
        let id = self.peripheral_id(id)?;
        let mck = self.master_clock();
        let h32mxdiv = Mckr::from(self.regs.read(Register::Mckr)).h32mxdiv();
        if h32mxdiv && self.config.is_h32mx(id.id()) {
            Ok(mck / 2)
        } else {
            Ok(mck)
        }
    }

    /// Select peripheral `id` and return its control word.
    pub(crate) fn read_pcr(&self, id: PeripheralId) -> Pcr {
        critical_section::with(|_| self.select_and_read_pcr(id))
    }

    /// Run the select, read, write-with-CMD sequence for peripheral `id`,
    /// letting `f` edit the control word in between.
    pub(crate) fn update_pcr<F>(&self, id: PeripheralId, f: F)
    where
        F: FnOnce(&mut Pcr),
    {
        critical_section::with(|_| self.update_pcr_locked(id, f));
    }

    /// [`Self::update_pcr`] for callers already inside a critical section.
    pub(crate) fn update_pcr_locked<F>(&self, id: PeripheralId, f: F)
    where
        F: FnOnce(&mut Pcr),
    {
        let mut pcr = self.select_and_read_pcr(id);
        f(&mut pcr);
        pcr.set_pid(id.0);
        pcr.set_cmd(true);
        self.regs.write(Register::Pcr, pcr.into());
    }

    fn select_and_read_pcr(&self, id: PeripheralId) -> Pcr {
        self.regs.write(Register::Pcr, Pcr::select(id.0).into());
        Pcr::from(self.regs.read(Register::Pcr))
    }
}
