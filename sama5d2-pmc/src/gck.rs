//! Generated clocks (GCK)
//!
//! Some peripherals take a second, independently divided clock next to their
//! peripheral clock. It is configured through the same PMC_PCR word as the
//! peripheral gate. The hardware has a single GCKRDY bit for all of them, so
//! every operation here holds a critical section for its whole duration,
//! including the ready wait; two changes in flight could not tell whose
//! readiness the bit reports.

use fugit::HertzU32;

use crate::{
    clocks::{sources::divide_rounding, Error, Pmc},
    pck::OutputSource,
    peripheral::PeripheralId,
    register_access::{Register, RegisterSurface},
    registers::Sr,
    wait::WaitCondition,
};

impl<R: RegisterSurface> Pmc<R> {
    /// Stop the generated clock of peripheral `id`, then select `source`
    /// divided by `divider + 1`.
    ///
    /// The previous source and divider are replaced, not combined. The clock
    /// stays stopped until [`Self::enable_generated_clock`].
    pub fn configure_generated_clock(
        &self,
        id: u32,
        source: OutputSource,
        divider: u8,
    ) -> Result<(), Error> {
        let id = self.peripheral_id(id)?;
        critical_section::with(|_| -> Result<(), Error> {
            self.set_generated_clock_locked(id, false)?;
            self.update_pcr_locked(id, |pcr| {
                pcr.set_gckcss(source as u8);
                pcr.set_gckdiv(divider);
            });
            Ok(())
        })
    }

    /// Start the generated clock of peripheral `id` and wait for GCKRDY.
    pub fn enable_generated_clock(&self, id: u32) -> Result<(), Error> {
        let id = self.peripheral_id(id)?;
        critical_section::with(|_| self.set_generated_clock_locked(id, true))
    }

    /// Stop the generated clock of peripheral `id` and wait for GCKRDY.
    pub fn disable_generated_clock(&self, id: u32) -> Result<(), Error> {
        let id = self.peripheral_id(id)?;
        critical_section::with(|_| self.set_generated_clock_locked(id, false))
    }

    /// Whether the generated clock of peripheral `id` is running.
    pub fn is_generated_clock_enabled(&self, id: u32) -> Result<bool, Error> {
        let id = self.peripheral_id(id)?;
        Ok(self.read_pcr(id).gcken())
    }

    /// Frequency of the generated clock of peripheral `id`, the selected
    /// source divided by `divider + 1` and rounded to the nearest hertz.
    pub fn generated_clock_frequency(&self, id: PeripheralId) -> HertzU32 {
        let pcr = self.read_pcr(id);
        divide_rounding(self.output_source_clock(pcr.gckcss()), pcr.gckdiv())
    }

    fn set_generated_clock_locked(&self, id: PeripheralId, enable: bool) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        defmt::trace!("GCK of peripheral {}: {}", id, enable);
        self.update_pcr_locked(id, |pcr| pcr.set_gcken(enable));
        self.wait_for(WaitCondition::GeneratedClockReady, |regs| {
            Sr::from(regs.read(Register::Sr)).gckrdy()
        })
    }
}
