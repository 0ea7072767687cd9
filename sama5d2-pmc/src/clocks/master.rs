//! Master clock (MCK) selection and division
//!
//! Every change to PMC_MCKR is a read-modify-write of one field followed by a
//! wait for MCKRDY. The write runs in a critical section so that two callers
//! changing different fields cannot lose each other's update; the wait does
//! not, and the cached frequency is dropped once the hardware has switched.

use core::convert::TryFrom;

use super::{Error, Pmc};
use crate::{
    register_access::{Register, RegisterSurface},
    registers::{Mckr, Sr},
    wait::WaitCondition,
};

/// Master clock source, the PMC_MCKR.CSS field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MasterClockSource {
    /// Slow clock
    SlowClock = 0,
    /// Main clock
    MainClock = 1,
    /// PLL-A output
    PllA = 2,
    /// UTMI PLL
    Upll = 3,
}

impl TryFrom<u8> for MasterClockSource {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(MasterClockSource::SlowClock),
            1 => Ok(MasterClockSource::MainClock),
            2 => Ok(MasterClockSource::PllA),
            3 => Ok(MasterClockSource::Upll),
            _ => Err(code),
        }
    }
}

/// Master clock prescaler, the PMC_MCKR.PRES field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Prescaler {
    /// Selected clock
    Div1 = 0,
    /// Selected clock divided by 2
    Div2 = 1,
    /// Selected clock divided by 4
    Div4 = 2,
    /// Selected clock divided by 8
    Div8 = 3,
    /// Selected clock divided by 16
    Div16 = 4,
    /// Selected clock divided by 32
    Div32 = 5,
    /// Selected clock divided by 64
    Div64 = 6,
}

impl Prescaler {
    /// Number of bits the selected clock is shifted right by.
    pub const fn shift(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u8> for Prescaler {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Prescaler::Div1),
            1 => Ok(Prescaler::Div2),
            2 => Ok(Prescaler::Div4),
            3 => Ok(Prescaler::Div8),
            4 => Ok(Prescaler::Div16),
            5 => Ok(Prescaler::Div32),
            6 => Ok(Prescaler::Div64),
            _ => Err(code),
        }
    }
}

/// Master clock division, the PMC_MCKR.MDIV field.
///
/// The processor clock is taken before this stage, MCK after it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MasterDivider {
    /// MCK is the processor clock
    Div1 = 0,
    /// MCK is the processor clock divided by 2
    Div2 = 1,
    /// MCK is the processor clock divided by 4
    Div4 = 2,
    /// MCK is the processor clock divided by 3
    Div3 = 3,
}

impl MasterDivider {
    /// Ratio between the processor clock and MCK.
    pub const fn factor(self) -> u32 {
        match self {
            MasterDivider::Div1 => 1,
            MasterDivider::Div2 => 2,
            MasterDivider::Div4 => 4,
            MasterDivider::Div3 => 3,
        }
    }
}

impl TryFrom<u8> for MasterDivider {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(MasterDivider::Div1),
            1 => Ok(MasterDivider::Div2),
            2 => Ok(MasterDivider::Div4),
            3 => Ok(MasterDivider::Div3),
            _ => Err(code),
        }
    }
}

/// PMC_MCKR as the hardware currently has it.
///
/// This is a snapshot for inspection; the controller always re-reads the
/// register rather than trusting a previously decoded value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MasterClockConfig {
    /// Selected source.
    pub source: MasterClockSource,
    /// Prescaler stage.
    pub prescaler: Prescaler,
    /// MDIV stage.
    pub divider: MasterDivider,
    /// PLL-A output halved before the mux.
    pub plla_div2: bool,
    /// H32MX matrix runs at MCK / 2.
    pub h32mx_div2: bool,
}

impl<R: RegisterSurface> Pmc<R> {
    /// Decode PMC_MCKR.
    ///
    /// Returns `None` if the prescaler field holds the reserved code 7.
    pub fn master_clock_config(&self) -> Option<MasterClockConfig> {
        let mckr = Mckr::from(self.regs.read(Register::Mckr));
        Some(MasterClockConfig {
            // CSS is two bits wide, every code is a source
            source: MasterClockSource::try_from(mckr.css()).ok()?,
            prescaler: Prescaler::try_from(mckr.pres()).ok()?,
            divider: MasterDivider::try_from(mckr.mdiv()).ok()?,
            plla_div2: mckr.plladiv2(),
            h32mx_div2: mckr.h32mxdiv(),
        })
    }

    /// Select the master clock source.
    pub fn switch_master_clock(&self, source: MasterClockSource) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        defmt::debug!("switching MCK to {}", source);
        self.update_mckr(|mckr| mckr.set_css(source as u8))
    }

    /// Set the master clock prescaler.
    pub fn set_master_prescaler(&self, prescaler: Prescaler) -> Result<(), Error> {
        self.update_mckr(|mckr| mckr.set_pres(prescaler as u8))
    }

    /// Set the MDIV stage between the processor clock and MCK.
    pub fn set_master_divider(&self, divider: MasterDivider) -> Result<(), Error> {
        self.update_mckr(|mckr| mckr.set_mdiv(divider as u8))
    }

    /// Halve the PLL-A output before it reaches the master clock mux.
    ///
    /// Nothing is written when the bit already has the requested value.
    pub fn set_plla_div2(&self, enable: bool) -> Result<(), Error> {
        if Mckr::from(self.regs.read(Register::Mckr)).plladiv2() == enable {
            return Ok(());
        }
        self.update_mckr(|mckr| mckr.set_plladiv2(enable))
    }

    /// Run the H32MX matrix, and the peripherals on it, at MCK / 2.
    ///
    /// Nothing is written when the bit already has the requested value.
    pub fn set_h32mx_div2(&self, enable: bool) -> Result<(), Error> {
        if Mckr::from(self.regs.read(Register::Mckr)).h32mxdiv() == enable {
            return Ok(());
        }
        self.update_mckr(|mckr| mckr.set_h32mxdiv(enable))
    }

    /// Read-modify-write PMC_MCKR, wait for MCKRDY and drop the cached MCK.
    pub(crate) fn update_mckr<F>(&self, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Mckr),
    {
        critical_section::with(|_| {
            self.regs.modify(Register::Mckr, |bits| {
                let mut mckr = Mckr::from(bits);
                f(&mut mckr);
                mckr.into()
            })
        });
        let waited = self.wait_master_clock_ready();
        // The mux may have moved even if the ready bit never showed up
        self.invalidate_master_clock();
        waited
    }

    pub(crate) fn wait_master_clock_ready(&self) -> Result<(), Error> {
        self.wait_for(WaitCondition::MasterClockReady, |regs| {
            Sr::from(regs.read(Register::Sr)).mckrdy()
        })
    }
}

#[cfg(test)]
mod tests {
    use fugit::RateExtU32;

    use super::*;
    use crate::{config::SAMA5D2_XPLAINED, sim::SimulatedPmc, WaitPolicy};

    #[test]
    fn codes_round_trip_through_the_enums() {
        for code in 0..=6 {
            assert_eq!(Prescaler::try_from(code).map(|p| p as u8), Ok(code));
        }
        assert_eq!(Prescaler::try_from(7), Err(7));
        assert_eq!(MasterDivider::try_from(3), Ok(MasterDivider::Div3));
        assert_eq!(MasterClockSource::try_from(4), Err(4));
    }

    #[test]
    fn switch_writes_only_the_css_field() {
        let sim = SimulatedPmc::new();
        sim.set_register(Register::Mckr, 0x0100_1231);
        let pmc = Pmc::new(&sim, SAMA5D2_XPLAINED);

        pmc.switch_master_clock(MasterClockSource::PllA).unwrap();

        assert_eq!(sim.register(Register::Mckr), 0x0100_1232);
    }

    #[test]
    fn prescaler_and_divider_land_in_mckr() {
        let sim = SimulatedPmc::new();
        let pmc = Pmc::new(&sim, SAMA5D2_XPLAINED);

        pmc.set_master_prescaler(Prescaler::Div8).unwrap();
        pmc.set_master_divider(MasterDivider::Div4).unwrap();

        let config = pmc.master_clock_config().unwrap();
        assert_eq!(config.prescaler, Prescaler::Div8);
        assert_eq!(config.divider, MasterDivider::Div4);
        assert_eq!(config.source, MasterClockSource::MainClock);
        // 12MHz / 8 / 4
        assert_eq!(pmc.master_clock(), 375.kHz::<1, 1>());
    }

    #[test]
    fn every_mckr_change_drops_the_cached_frequency() {
        let sim = SimulatedPmc::new();
        let pmc = Pmc::new(&sim, SAMA5D2_XPLAINED);

        assert_eq!(pmc.master_clock(), 12.MHz::<1, 1>());
        assert!(pmc.master_clock_is_cached());
        pmc.set_master_prescaler(Prescaler::Div2).unwrap();
        assert!(!pmc.master_clock_is_cached());
        assert_eq!(pmc.master_clock(), 6.MHz::<1, 1>());

        pmc.set_master_divider(MasterDivider::Div3).unwrap();
        assert!(!pmc.master_clock_is_cached());
        assert_eq!(pmc.master_clock(), 2.MHz::<1, 1>());

        pmc.switch_master_clock(MasterClockSource::SlowClock).unwrap();
        assert!(!pmc.master_clock_is_cached());
        // 64kHz RC / 2 / 3
        assert_eq!(pmc.master_clock(), 10_666.Hz::<1, 1>());
    }

    #[test]
    fn plla_div2_is_left_alone_when_already_set() {
        let sim = SimulatedPmc::new();
        let pmc = Pmc::new(&sim, SAMA5D2_XPLAINED);

        pmc.set_plla_div2(true).unwrap();
        assert!(pmc.master_clock_config().unwrap().plla_div2);

        let _ = pmc.master_clock();
        pmc.set_plla_div2(true).unwrap();
        assert!(pmc.master_clock_is_cached());

        pmc.set_plla_div2(false).unwrap();
        assert!(!pmc.master_clock_config().unwrap().plla_div2);
    }

    #[test]
    fn h32mx_div2_toggles_its_bit() {
        let sim = SimulatedPmc::new();
        let pmc = Pmc::new(&sim, SAMA5D2_XPLAINED);

        pmc.set_h32mx_div2(true).unwrap();
        assert_eq!(sim.register(Register::Mckr) & (1 << 24), 1 << 24);
        pmc.set_h32mx_div2(false).unwrap();
        assert_eq!(sim.register(Register::Mckr) & (1 << 24), 0);
    }

    #[test]
    fn switch_reports_a_master_clock_that_never_settles() {
        let sim = SimulatedPmc::new();
        sim.hold_low(1 << 3);
        let pmc =
            Pmc::new(&sim, SAMA5D2_XPLAINED).with_wait_policy(WaitPolicy::Bounded { polls: 10 });

        assert_eq!(
            pmc.switch_master_clock(MasterClockSource::PllA),
            Err(Error::HardwareNotResponding(WaitCondition::MasterClockReady))
        );
        // The write happened and the cache was dropped regardless
        assert_eq!(Mckr::from(sim.register(Register::Mckr)).css(), 2);
        assert!(!pmc.master_clock_is_cached());
    }

    #[test]
    fn reserved_prescaler_code_does_not_decode() {
        let sim = SimulatedPmc::new();
        sim.set_register(Register::Mckr, 0x71);
        let pmc = Pmc::new(&sim, SAMA5D2_XPLAINED);

        assert_eq!(pmc.master_clock_config(), None);
    }
}
