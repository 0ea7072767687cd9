//! Frequencies of the clock tree nodes
//!
//! Everything here only reads registers and reproduces the hardware
//! arithmetic: shifts for the power-of-two stages, truncating division for
//! MDIV /3 and the programmable clocks, rounding division for the generated
//! clocks.

use fugit::HertzU32;

use super::{
    master::{MasterClockSource, MasterDivider, Prescaler},
    Pmc,
};
#[cfg(feature = "generated-clocks")]
use crate::peripheral::PeripheralId;
use crate::{
    pck::{OutputSource, Pck},
    register_access::{Register, RegisterSurface},
    registers::{Mckr, Mor, Pllar, SckcCr},
};

/// A node of the clock tree whose frequency can be resolved.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// On-chip slow RC oscillator
    SlowRc,
    /// External 32.768kHz crystal
    SlowCrystal,
    /// On-chip main RC oscillator
    MainRc,
    /// External main crystal
    MainCrystal,
    /// Slow clock: whichever slow oscillator SCKC_CR selects
    SlowClock,
    /// Main clock: whichever main oscillator CKGR_MOR selects
    MainClock,
    /// PLL-A output, after the optional PLLADIV2 stage
    PllA,
    /// UTMI PLL, not modelled
    Upll,
    /// Audio PLL, not modelled
    Audio,
    /// Master clock (MCK)
    MasterClock,
    /// Processor clock, MCK before the MDIV stage
    ProcessorClock,
    /// Programmable clock output
    Programmable(Pck),
    /// Generated clock of a peripheral
    #[cfg(feature = "generated-clocks")]
    Generated(PeripheralId),
}

impl From<MasterClockSource> for ClockSource {
    fn from(source: MasterClockSource) -> Self {
        match source {
            MasterClockSource::SlowClock => ClockSource::SlowClock,
            MasterClockSource::MainClock => ClockSource::MainClock,
            MasterClockSource::PllA => ClockSource::PllA,
            MasterClockSource::Upll => ClockSource::Upll,
        }
    }
}

impl From<OutputSource> for ClockSource {
    fn from(source: OutputSource) -> Self {
        match source {
            OutputSource::SlowClock => ClockSource::SlowClock,
            OutputSource::MainClock => ClockSource::MainClock,
            OutputSource::PllA => ClockSource::PllA,
            OutputSource::Upll => ClockSource::Upll,
            OutputSource::MasterClock => ClockSource::MasterClock,
            OutputSource::Audio => ClockSource::Audio,
        }
    }
}

/// Apply the PLL-A law: `input * (mul + 1) / div`, or 0 when `div` is 0.
pub(crate) fn plla_output(input: HertzU32, mul: u8, div: u8, div2: bool) -> HertzU32 {
    if div == 0 {
        return HertzU32::from_raw(0);
    }
    let out = u64::from(input.raw()) * (u64::from(mul) + 1) / u64::from(div);
    let out = if div2 { out >> 1 } else { out };
    HertzU32::from_raw(out as u32)
}

/// Apply the prescaler and MDIV stages to the selected source frequency.
///
/// Field codes with no hardware meaning leave the frequency untouched.
pub(crate) fn master_output(source: HertzU32, pres: u8, mdiv: u8) -> HertzU32 {
    let mut clk = source.raw();
    if let Ok(prescaler) = Prescaler::try_from(pres) {
        clk >>= prescaler.shift();
    }
    match MasterDivider::try_from(mdiv) {
        Ok(MasterDivider::Div1) | Err(_) => {}
        Ok(MasterDivider::Div2) => clk >>= 1,
        Ok(MasterDivider::Div4) => clk >>= 2,
        // The one stage that is not a shift
        Ok(MasterDivider::Div3) => clk /= 3,
    }
    HertzU32::from_raw(clk)
}

/// Undo the MDIV stage to get the processor clock back from MCK.
pub(crate) fn processor_output(mck: HertzU32, mdiv: u8) -> HertzU32 {
    let factor = match MasterDivider::try_from(mdiv) {
        Ok(divider) => divider.factor(),
        Err(_) => 1,
    };
    HertzU32::from_raw(mck.raw().wrapping_mul(factor))
}

/// Truncating `source / (div + 1)`, as the programmable clocks divide.
pub(crate) fn divide_truncating(source: HertzU32, div: u8) -> HertzU32 {
    HertzU32::from_raw(source.raw() / (u32::from(div) + 1))
}

/// Rounding `source / (div + 1)`, halves rounded up, as the generated clocks
/// are reported.
pub(crate) fn divide_rounding(source: HertzU32, div: u8) -> HertzU32 {
    let divisor = u64::from(div) + 1;
    let rounded = (u64::from(source.raw()) + divisor / 2) / divisor;
    HertzU32::from_raw(rounded as u32)
}

impl<R: RegisterSurface> Pmc<R> {
    /// Frequency of any node of the clock tree.
    ///
    /// UPLL and the audio PLL are not modelled and resolve to 0Hz.
    pub fn resolve(&self, source: ClockSource) -> HertzU32 {
        match source {
            ClockSource::SlowRc => self.config.slow_rc,
            ClockSource::SlowCrystal => self.config.slow_crystal,
            ClockSource::MainRc => self.config.main_rc,
            ClockSource::MainCrystal => self.config.main_crystal,
            ClockSource::SlowClock => self.slow_clock(),
            ClockSource::MainClock => self.main_clock(),
            ClockSource::PllA => self.plla_clock(),
            ClockSource::Upll | ClockSource::Audio => HertzU32::from_raw(0),
            ClockSource::MasterClock => self.master_clock(),
            ClockSource::ProcessorClock => self.processor_clock(),
            ClockSource::Programmable(pck) => self.programmable_clock(pck).frequency(),
            #[cfg(feature = "generated-clocks")]
            ClockSource::Generated(id) => self.generated_clock_frequency(id),
        }
    }

    /// Slow clock frequency.
    pub fn slow_clock(&self) -> HertzU32 {
        if SckcCr::from(self.regs.read(Register::SckcCr)).oscsel() {
            self.config.slow_crystal
        } else {
            self.config.slow_rc
        }
    }

    /// Main clock frequency.
    pub fn main_clock(&self) -> HertzU32 {
        if Mor::from(self.regs.read(Register::CkgrMor)).moscsel() {
            self.config.main_crystal
        } else {
            self.config.main_rc
        }
    }

    /// PLL-A output frequency, including the PLLADIV2 stage.
    pub fn plla_clock(&self) -> HertzU32 {
        let input = self.main_clock();
        let pllar = Pllar::from(self.regs.read(Register::CkgrPllar));
        let mckr = Mckr::from(self.regs.read(Register::Mckr));
        plla_output(input, pllar.mula(), pllar.diva(), mckr.plladiv2())
    }

    /// Master clock frequency.
    ///
    /// Cached after the first query until a switch invalidates it.
    pub fn master_clock(&self) -> HertzU32 {
        self.cached_master_clock(|| self.compute_master_clock())
    }

    /// Processor clock frequency: MCK multiplied back by the MDIV factor.
    pub fn processor_clock(&self) -> HertzU32 {
        let mck = self.master_clock();
        let mckr = Mckr::from(self.regs.read(Register::Mckr));
        processor_output(mck, mckr.mdiv())
    }

    fn compute_master_clock(&self) -> HertzU32 {
        let mckr = Mckr::from(self.regs.read(Register::Mckr));
        let source = match MasterClockSource::try_from(mckr.css()) {
            Ok(MasterClockSource::SlowClock) => self.slow_clock(),
            Ok(MasterClockSource::MainClock) => self.main_clock(),
            Ok(MasterClockSource::PllA) => self.plla_clock(),
            // UPLL is not modelled; the board crystal stands in for it
            Ok(MasterClockSource::Upll) => self.config.main_crystal,
            Err(_) => HertzU32::from_raw(0),
        };
        master_output(source, mckr.pres(), mckr.mdiv())
    }

    /// Frequency of the source an output mux code selects, for the
    /// programmable and generated clocks.
    pub(crate) fn output_source_clock(&self, css: u8) -> HertzU32 {
        match OutputSource::try_from(css) {
            Ok(source) => self.resolve(source.into()),
            Err(_) => HertzU32::from_raw(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use fugit::RateExtU32;

    use super::*;

    #[test]
    fn prescaler_codes_shift_by_their_index() {
        let f: HertzU32 = 96_000_000.Hz();
        for (code, shift) in (0u8..=6).zip(0u32..=6) {
            assert_eq!(master_output(f, code, 0), HertzU32::from_raw(96_000_000 >> shift));
        }
    }

    #[test]
    fn mdiv_three_truncates() {
        assert_eq!(master_output(100.Hz(), 0, 3), 33.Hz::<1, 1>());
        assert_eq!(master_output(498_000_000.Hz(), 0, 3), 166_000_000.Hz::<1, 1>());
    }

    #[test]
    fn mdiv_two_and_four_are_shifts() {
        assert_eq!(master_output(101.Hz(), 0, 1), 50.Hz::<1, 1>());
        assert_eq!(master_output(103.Hz(), 0, 2), 25.Hz::<1, 1>());
    }

    #[test]
    fn prescaler_applies_before_mdiv() {
        // 100 >> 1 = 50, 50 / 3 = 16
        assert_eq!(master_output(100.Hz(), 1, 3), 16.Hz::<1, 1>());
    }

    #[test]
    fn unknown_prescaler_code_passes_through() {
        assert_eq!(master_output(12.MHz(), 7, 0), 12.MHz::<1, 1>());
    }

    #[test]
    fn processor_clock_undoes_mdiv() {
        assert_eq!(processor_output(50.MHz(), 2), 200.MHz::<1, 1>());
        assert_eq!(processor_output(166.MHz(), 3), 498.MHz::<1, 1>());
        assert_eq!(processor_output(166.MHz(), 0), 166.MHz::<1, 1>());
    }

    #[test]
    fn plla_with_zero_divider_is_off() {
        assert_eq!(plla_output(12.MHz(), 99, 0, false), 0.Hz::<1, 1>());
        assert_eq!(plla_output(12.MHz(), 0, 0, true), 0.Hz::<1, 1>());
    }

    #[test]
    fn plla_multiplies_by_mul_plus_one() {
        assert_eq!(plla_output(12.MHz(), 9, 1, false), 120.MHz::<1, 1>());
        assert_eq!(plla_output(12.MHz(), 9, 1, true), 60.MHz::<1, 1>());
    }

    #[test]
    fn plla_product_does_not_overflow_u32_early() {
        // 12MHz * 128 overflows nothing in u64 and fits back into u32
        assert_eq!(plla_output(12.MHz(), 127, 2, false), 768.MHz::<1, 1>());
    }

    #[test]
    fn programmable_division_truncates_and_generated_rounds() {
        // 1000 / 3 = 333.33, 1000 / 6 = 166.67
        assert_eq!(divide_truncating(1000.Hz(), 2), 333.Hz::<1, 1>());
        assert_eq!(divide_rounding(1000.Hz(), 2), 333.Hz::<1, 1>());
        assert_eq!(divide_truncating(1000.Hz(), 5), 166.Hz::<1, 1>());
        assert_eq!(divide_rounding(1000.Hz(), 5), 167.Hz::<1, 1>());
    }

    #[test]
    fn generated_rounding_takes_ties_up() {
        // 10 / 4 = 2.5
        assert_eq!(divide_rounding(10.Hz(), 3), 3.Hz::<1, 1>());
        assert_eq!(divide_truncating(10.Hz(), 3), 2.Hz::<1, 1>());
    }

    #[test]
    fn division_by_one_is_identity() {
        assert_eq!(divide_truncating(32_768.Hz(), 0), 32_768.Hz::<1, 1>());
        assert_eq!(divide_rounding(32_768.Hz(), 0), 32_768.Hz::<1, 1>());
    }
}
