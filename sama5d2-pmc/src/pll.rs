//! Phase-Locked Loop A (PLL-A)
//!
//! PLL-A multiplies the main clock: `main * (multiplier + 1) / divider`. A
//! divider of 0 stops the output and a multiplier of 0 disables the PLL.
//! [`crate::clocks::Pmc::set_plla_div2`] halves the result on its way to the
//! master clock mux.

use crate::{
    clocks::{Error, InvalidArgument, Pmc},
    register_access::{Register, RegisterSurface},
    registers::{Pllar, Sr},
    wait::WaitCondition,
};

/// Parameters for PLL-A.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllaConfig {
    /// MULA, at most 127. The output is multiplied by `multiplier + 1`.
    pub multiplier: u8,
    /// DIVA. 0 stops the output.
    pub divider: u8,
    /// PLLACOUNT, slow clock cycles before LOCKA is set, at most 63.
    pub count: u8,
    /// PLLICPR.ICP_PLLA charge pump current, at most 3.
    pub charge_pump: u8,
}

impl PllaConfig {
    const MAX_MULTIPLIER: u8 = 0x7f;
    const MAX_COUNT: u8 = 0x3f;
    const MAX_CHARGE_PUMP: u8 = 0x3;

    fn validate(&self) -> Result<(), InvalidArgument> {
        if self.multiplier > Self::MAX_MULTIPLIER {
            return Err(InvalidArgument::PllMultiplier(self.multiplier));
        }
        if self.count > Self::MAX_COUNT {
            return Err(InvalidArgument::PllCount(self.count));
        }
        if self.charge_pump > Self::MAX_CHARGE_PUMP {
            return Err(InvalidArgument::PllChargePump(self.charge_pump));
        }
        Ok(())
    }
}

/// Common configs for PLL-A. All assume a 12MHz main clock!
pub mod common_configs {
    use super::PllaConfig;

    /// 996MHz, halved by PLLADIV2 to a 498MHz processor clock.
    pub const PLLA_996MHZ: PllaConfig = PllaConfig {
        multiplier: 82,
        divider: 1,
        count: 0x3f,
        charge_pump: 0,
    };

    /// 792MHz, halved by PLLADIV2 to a 396MHz processor clock.
    pub const PLLA_792MHZ: PllaConfig = PllaConfig {
        multiplier: 65,
        divider: 1,
        count: 0x3f,
        charge_pump: 0,
    };
}

impl<R: RegisterSurface> Pmc<R> {
    /// Program PLL-A and wait for it to lock.
    ///
    /// The lock wait is skipped when `config.divider` is 0, as the PLL never
    /// locks with its output stopped. Nothing is written if a field is out of
    /// range.
    pub fn configure_plla(&self, config: PllaConfig) -> Result<(), Error> {
        config.validate()?;

        let mut pllar = Pllar::default();
        pllar.set_one(true);
        pllar.set_mula(config.multiplier);
        pllar.set_pllacount(config.count);
        pllar.set_diva(config.divider);

        #[cfg(feature = "defmt")]
        defmt::debug!("PLL-A: {}", config);
        self.regs.write(Register::CkgrPllar, pllar.into());
        self.regs.write(Register::Pllicpr, u32::from(config.charge_pump));

        let locked = if config.divider != 0 {
            self.wait_for(WaitCondition::PllaLocked, |regs| {
                Sr::from(regs.read(Register::Sr)).locka()
            })
        } else {
            Ok(())
        };
        self.invalidate_master_clock();
        locked
    }

    /// Stop PLL-A by clearing its multiplier. The other fields are kept.
    pub fn disable_plla(&self) {
        self.regs.modify(Register::CkgrPllar, |bits| {
            let mut pllar = Pllar::from(bits);
            pllar.set_mula(0);
            pllar.into()
        });
        self.invalidate_master_clock();
    }
}

#[cfg(test)]
mod tests {
    use fugit::RateExtU32;

    use super::{common_configs::PLLA_996MHZ, *};
    use crate::{
        clocks::{MasterClockSource, MasterDivider},
        config::SAMA5D2_XPLAINED,
        sim::SimulatedPmc,
        WaitPolicy,
    };

    #[test]
    fn out_of_range_fields_write_nothing() {
        let sim = SimulatedPmc::new();
        let pmc = Pmc::new(&sim, SAMA5D2_XPLAINED);
        let before = sim.register(Register::CkgrPllar);

        let config = PllaConfig {
            multiplier: 128,
            ..PLLA_996MHZ
        };
        assert_eq!(
            pmc.configure_plla(config),
            Err(Error::InvalidArgument(InvalidArgument::PllMultiplier(128)))
        );
        let config = PllaConfig {
            count: 64,
            ..PLLA_996MHZ
        };
        assert_eq!(
            pmc.configure_plla(config),
            Err(Error::InvalidArgument(InvalidArgument::PllCount(64)))
        );
        let config = PllaConfig {
            charge_pump: 4,
            ..PLLA_996MHZ
        };
        assert_eq!(
            pmc.configure_plla(config),
            Err(Error::InvalidArgument(InvalidArgument::PllChargePump(4)))
        );

        assert_eq!(sim.register(Register::CkgrPllar), before);
    }

    #[test]
    fn pllar_carries_the_one_bit_and_every_field() {
        let sim = SimulatedPmc::new();
        let pmc = Pmc::new(&sim, SAMA5D2_XPLAINED);

        pmc.configure_plla(PllaConfig {
            multiplier: 9,
            divider: 1,
            count: 0x3f,
            charge_pump: 2,
        })
        .unwrap();

        let pllar = Pllar::from(sim.register(Register::CkgrPllar));
        assert!(pllar.one());
        assert_eq!(pllar.mula(), 9);
        assert_eq!(pllar.diva(), 1);
        assert_eq!(pllar.pllacount(), 0x3f);
        assert_eq!(sim.register(Register::Pllicpr), 2);
        assert_eq!(pmc.plla_clock(), 120.MHz::<1, 1>());
    }

    #[test]
    fn stopped_output_does_not_wait_for_lock() {
        let sim = SimulatedPmc::new();
        sim.hold_low(1 << 1);
        let pmc =
            Pmc::new(&sim, SAMA5D2_XPLAINED).with_wait_policy(WaitPolicy::Bounded { polls: 1 });

        let config = PllaConfig {
            divider: 0,
            ..PLLA_996MHZ
        };
        assert_eq!(pmc.configure_plla(config), Ok(()));
        assert_eq!(pmc.plla_clock(), 0.Hz::<1, 1>());
    }

    #[test]
    fn lock_timeout_is_reported() {
        let sim = SimulatedPmc::new();
        sim.hold_low(1 << 1);
        let pmc =
            Pmc::new(&sim, SAMA5D2_XPLAINED).with_wait_policy(WaitPolicy::Bounded { polls: 8 });

        assert_eq!(
            pmc.configure_plla(PLLA_996MHZ),
            Err(Error::HardwareNotResponding(WaitCondition::PllaLocked))
        );
    }

    #[test]
    fn plla_drives_the_master_clock() {
        let sim = SimulatedPmc::new();
        let pmc = Pmc::new(&sim, SAMA5D2_XPLAINED);

        pmc.configure_plla(PLLA_996MHZ).unwrap();
        pmc.set_plla_div2(true).unwrap();
        pmc.set_master_divider(MasterDivider::Div3).unwrap();
        pmc.switch_master_clock(MasterClockSource::PllA).unwrap();

        assert_eq!(pmc.plla_clock(), 498.MHz::<1, 1>());
        assert_eq!(pmc.master_clock(), 166.MHz::<1, 1>());
        assert_eq!(pmc.processor_clock(), 498.MHz::<1, 1>());
    }

    #[test]
    fn disable_only_clears_the_multiplier() {
        let sim = SimulatedPmc::new();
        let pmc = Pmc::new(&sim, SAMA5D2_XPLAINED);
        pmc.configure_plla(PLLA_996MHZ).unwrap();

        pmc.disable_plla();

        let pllar = Pllar::from(sim.register(Register::CkgrPllar));
        assert_eq!(pllar.mula(), 0);
        assert_eq!(pllar.diva(), 1);
        assert!(pllar.one());
        assert_eq!(pllar.pllacount(), 0x3f);
    }
}
