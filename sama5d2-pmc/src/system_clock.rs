//! System clock gates (PMC_SCER / PMC_SCDR / PMC_SCSR)
//!
//! The enable and disable registers are write-one: writing a mask only
//! touches the clocks it names. PMC_SCSR reports the result.

use crate::{
    clocks::{Error, Pmc},
    register_access::{Register, RegisterSurface},
    wait::WaitCondition,
};

/// A clock gated through the system clock registers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemClock {
    /// DDR clock
    Ddr,
    /// LCD controller clock
    Lcd,
    /// Software modem clock
    Smd,
    /// USB host OHCI clocks
    Uhp,
    /// USB device clock
    Udp,
    /// Programmable clock 0 output
    Pck0,
    /// Programmable clock 1 output
    Pck1,
    /// Programmable clock 2 output
    Pck2,
    /// Image sensor controller clock
    Isc,
}

impl SystemClock {
    /// Bit of this clock in PMC_SCER, PMC_SCDR and PMC_SCSR.
    pub const fn mask(self) -> u32 {
        1 << match self {
            SystemClock::Ddr => 2,
            SystemClock::Lcd => 3,
            SystemClock::Smd => 4,
            SystemClock::Uhp => 6,
            SystemClock::Udp => 7,
            SystemClock::Pck0 => 8,
            SystemClock::Pck1 => 9,
            SystemClock::Pck2 => 10,
            SystemClock::Isc => 18,
        }
    }
}

impl<R: RegisterSurface> Pmc<R> {
    /// Start `clock` and wait until PMC_SCSR shows it running.
    pub fn enable_system_clock(&self, clock: SystemClock) -> Result<(), Error> {
        let mask = clock.mask();
        self.regs.write(Register::Scer, mask);
        self.wait_for(WaitCondition::SystemClockEnabled(clock), |regs| {
            regs.read(Register::Scsr) & mask != 0
        })
    }

    /// Stop `clock` and wait until PMC_SCSR shows it stopped.
    pub fn disable_system_clock(&self, clock: SystemClock) -> Result<(), Error> {
        let mask = clock.mask();
        self.regs.write(Register::Scdr, mask);
        self.wait_for(WaitCondition::SystemClockDisabled(clock), |regs| {
            regs.read(Register::Scsr) & mask == 0
        })
    }

    /// Whether `clock` is running.
    pub fn is_system_clock_enabled(&self, clock: SystemClock) -> bool {
        self.regs.read(Register::Scsr) & clock.mask() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SAMA5D2_XPLAINED, sim::SimulatedPmc, WaitPolicy};

    #[test]
    fn masks_match_the_scer_layout() {
        assert_eq!(SystemClock::Ddr.mask(), 0x4);
        assert_eq!(SystemClock::Pck0.mask(), 0x100);
        assert_eq!(SystemClock::Isc.mask(), 0x4_0000);
    }

    #[test]
    fn gate_round_trip_only_touches_its_bit() {
        let sim = SimulatedPmc::new();
        let pmc = Pmc::new(&sim, SAMA5D2_XPLAINED);

        pmc.enable_system_clock(SystemClock::Ddr).unwrap();
        pmc.enable_system_clock(SystemClock::Lcd).unwrap();
        assert!(pmc.is_system_clock_enabled(SystemClock::Ddr));

        pmc.disable_system_clock(SystemClock::Ddr).unwrap();
        assert!(!pmc.is_system_clock_enabled(SystemClock::Ddr));
        assert!(pmc.is_system_clock_enabled(SystemClock::Lcd));
        assert_eq!(sim.register(Register::Scsr), SystemClock::Lcd.mask());
    }

    #[test]
    fn clock_that_never_starts_is_reported() {
        let sim = SimulatedPmc::new();
        sim.stick_system_clocks(SystemClock::Uhp.mask());
        let pmc =
            Pmc::new(&sim, SAMA5D2_XPLAINED).with_wait_policy(WaitPolicy::Bounded { polls: 3 });

        assert_eq!(
            pmc.enable_system_clock(SystemClock::Uhp),
            Err(Error::HardwareNotResponding(WaitCondition::SystemClockEnabled(
                SystemClock::Uhp
            )))
        );
    }
}
