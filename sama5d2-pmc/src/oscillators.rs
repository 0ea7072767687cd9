//! Slow and main oscillator selection
//!
//! Each of the two clock pairs has an on-chip RC oscillator, running from
//! reset, and an external crystal. Switching between them only changes which
//! one feeds the slow clock or the main clock; the board constants in
//! [`crate::config::ClockConfig`] give their frequencies.

use crate::{
    arch,
    clocks::{Error, MasterClockSource, Pmc},
    register_access::{Register, RegisterSurface},
    registers::{Mckr, Mor, SckcCr, Sr, MOR_KEY_PASSWD, MOR_MOSCXTST_DEFAULT},
    wait::WaitCondition,
};

/// Busy-wait after a slow clock switch, covering the 5 slow clock cycles the
/// SCKC needs to resynchronise.
pub const SLOW_CLOCK_SETTLE_SPINS: u32 = 0x1000;

impl<R: RegisterSurface> Pmc<R> {
    /// Feed the slow clock from the external 32.768kHz crystal.
    pub fn select_slow_crystal(&self) -> Result<(), Error> {
        self.select_slow_oscillator(true)
    }

    /// Feed the slow clock from the on-chip RC oscillator.
    pub fn select_slow_rc(&self) -> Result<(), Error> {
        self.select_slow_oscillator(false)
    }

    fn select_slow_oscillator(&self, crystal: bool) -> Result<(), Error> {
        // MCK must not run from the slow clock while it glitches
        let on_slow_clock = Mckr::from(self.regs.read(Register::Mckr)).css()
            == MasterClockSource::SlowClock as u8;
        if on_slow_clock {
            self.switch_master_clock(MasterClockSource::MainClock)?;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("slow clock from {}", if crystal { "crystal" } else { "RC" });
        self.regs.modify(Register::SckcCr, |bits| {
            let mut cr = SckcCr::from(bits);
            cr.set_oscsel(crystal);
            cr.into()
        });
        arch::dsb();
        arch::delay(SLOW_CLOCK_SETTLE_SPINS);

        if on_slow_clock {
            self.switch_master_clock(MasterClockSource::SlowClock)?;
        }
        self.invalidate_master_clock();
        Ok(())
    }

    /// Start the main crystal and feed the main clock from it.
    ///
    /// Does nothing if the crystal is already selected.
    pub fn select_main_crystal(&self) -> Result<(), Error> {
        if Mor::from(self.regs.read(Register::CkgrMor)).moscsel() {
            return Ok(());
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("starting main crystal");
        self.modify_mor(|mor| {
            mor.set_moscxtst(MOR_MOSCXTST_DEFAULT);
            mor.set_moscxten(true);
        });
        self.wait_for(WaitCondition::MainCrystalStable, |regs| {
            Sr::from(regs.read(Register::Sr)).moscxts()
        })?;

        self.modify_mor(|mor| mor.set_moscsel(true));
        let switched = self
            .wait_for(WaitCondition::MainOscillatorSelectAccepted, |regs| {
                Mor::from(regs.read(Register::CkgrMor)).moscsel()
            })
            .and_then(|()| {
                self.wait_for(WaitCondition::MainOscillatorSelected, |regs| {
                    Sr::from(regs.read(Register::Sr)).moscsels()
                })
            });
        self.invalidate_master_clock();
        switched
    }

    /// Feed the main clock from the on-chip RC oscillator and stop the
    /// crystal.
    pub fn select_main_rc(&self) -> Result<(), Error> {
        self.wait_for(WaitCondition::MainRcStable, |regs| {
            Sr::from(regs.read(Register::Sr)).moscrcs()
        })?;

        #[cfg(feature = "defmt")]
        defmt::debug!("main clock from RC, stopping crystal");
        self.modify_mor(|mor| mor.set_moscsel(false));
        let switched = self.wait_master_clock_ready().and_then(|()| {
            self.modify_mor(|mor| mor.set_moscxten(false));
            self.wait_master_clock_ready()
        });
        self.invalidate_master_clock();
        switched
    }

    /// Read-modify-write CKGR_MOR with the write password.
    fn modify_mor<F>(&self, f: F)
    where
        F: FnOnce(&mut Mor),
    {
        critical_section::with(|_| {
            self.regs.modify(Register::CkgrMor, |bits| {
                let mut mor = Mor::from(bits);
                f(&mut mor);
                mor.set_key(MOR_KEY_PASSWD);
                mor.into()
            })
        });
    }
}

#[cfg(test)]
mod tests {
    use fugit::RateExtU32;

    use super::*;
    use crate::{
        clocks::ClockSource,
        config::{ClockConfig, SAMA5D2_XPLAINED},
        sim::SimulatedPmc,
        WaitPolicy,
    };

    const DISTINCT: ClockConfig = ClockConfig {
        main_rc: fugit::HertzU32::MHz(12),
        main_crystal: fugit::HertzU32::MHz(24),
        ..SAMA5D2_XPLAINED
    };

    #[test]
    fn main_crystal_switch_enables_then_selects() {
        let sim = SimulatedPmc::new();
        let pmc = Pmc::new(&sim, DISTINCT);
        assert_eq!(pmc.master_clock(), 12.MHz::<1, 1>());

        pmc.select_main_crystal().unwrap();

        let mor = Mor::from(sim.register(Register::CkgrMor));
        assert!(mor.moscxten());
        assert!(mor.moscsel());
        assert_eq!(mor.moscxtst(), MOR_MOSCXTST_DEFAULT);
        assert_eq!(pmc.resolve(ClockSource::MainClock), 24.MHz::<1, 1>());
        assert_eq!(pmc.master_clock(), 24.MHz::<1, 1>());
    }

    #[test]
    fn main_crystal_switch_is_skipped_when_already_selected() {
        let sim = SimulatedPmc::new();
        sim.set_register(Register::CkgrMor, 1 << 24);
        let pmc = Pmc::new(&sim, DISTINCT);

        pmc.select_main_crystal().unwrap();

        assert_eq!(sim.register(Register::CkgrMor), 1 << 24);
    }

    #[test]
    fn mor_writes_without_the_key_are_ignored() {
        let sim = SimulatedPmc::new();
        let before = sim.register(Register::CkgrMor);
        sim.write(Register::CkgrMor, before | 1 << 24);
        assert_eq!(sim.register(Register::CkgrMor), before);
    }

    #[test]
    fn crystal_that_never_starts_is_reported() {
        let sim = SimulatedPmc::new();
        sim.hold_low(1 << 0);
        let pmc =
            Pmc::new(&sim, DISTINCT).with_wait_policy(WaitPolicy::Bounded { polls: 4 });

        assert_eq!(
            pmc.select_main_crystal(),
            Err(Error::HardwareNotResponding(WaitCondition::MainCrystalStable))
        );
        assert!(!Mor::from(sim.register(Register::CkgrMor)).moscsel());
    }

    #[test]
    fn main_rc_switch_stops_the_crystal() {
        let sim = SimulatedPmc::new();
        let pmc = Pmc::new(&sim, DISTINCT);
        pmc.select_main_crystal().unwrap();
        assert_eq!(pmc.master_clock(), 24.MHz::<1, 1>());

        pmc.select_main_rc().unwrap();

        let mor = Mor::from(sim.register(Register::CkgrMor));
        assert!(!mor.moscsel());
        assert!(!mor.moscxten());
        assert!(mor.moscrcen());
        assert_eq!(pmc.master_clock(), 12.MHz::<1, 1>());
    }

    #[test]
    fn slow_switch_from_main_does_not_touch_mckr() {
        let sim = SimulatedPmc::new();
        let pmc = Pmc::new(&sim, SAMA5D2_XPLAINED);
        let mckr = sim.register(Register::Mckr);

        pmc.select_slow_crystal().unwrap();

        assert_eq!(sim.register(Register::Mckr), mckr);
        assert!(SckcCr::from(sim.register(Register::SckcCr)).oscsel());
        assert_eq!(pmc.slow_clock(), 32_768.Hz::<1, 1>());
    }

    #[test]
    fn slow_switch_returns_to_the_slow_clock() {
        let sim = SimulatedPmc::new();
        let pmc = Pmc::new(&sim, SAMA5D2_XPLAINED);
        pmc.set_master_prescaler(crate::clocks::Prescaler::Div2).unwrap();
        pmc.switch_master_clock(MasterClockSource::SlowClock).unwrap();
        assert_eq!(pmc.master_clock(), 32.kHz::<1, 1>());
        let mckr = sim.register(Register::Mckr);

        pmc.select_slow_crystal().unwrap();

        assert_eq!(sim.register(Register::Mckr), mckr);
        assert_eq!(pmc.master_clock(), 16_384.Hz::<1, 1>());

        pmc.select_slow_rc().unwrap();
        assert_eq!(sim.register(Register::Mckr), mckr);
        assert_eq!(pmc.master_clock(), 32.kHz::<1, 1>());
    }
}
