//! Programmable clock outputs (PCK0-PCK2)
//!
//! Each output divides one of the tree's clocks by `prescaler + 1` and drives
//! a pin. Usage:
//!
//! ```no_run
//! use sama5d2_pmc::{
//!     config::SAMA5D2_XPLAINED,
//!     pck::{OutputSource, Pck},
//!     register_access::Mmio,
//!     Pmc,
//! };
//!
//! # fn func() -> Result<(), sama5d2_pmc::Error> {
//! let pmc = Pmc::new(unsafe { Mmio::sama5d2() }, SAMA5D2_XPLAINED);
//! let pck1 = pmc.programmable_clock(Pck::Pck1);
//! pck1.configure(OutputSource::MainClock, 11)?;
//! pck1.enable()?;
//! // 1MHz from the 12MHz main clock
//! let _freq = pck1.frequency();
//! # Ok(())
//! # }
//! ```

use core::convert::TryFrom;

use fugit::HertzU32;

use crate::{
    clocks::{sources::divide_truncating, Error, Pmc},
    register_access::{Register, RegisterSurface},
    registers::{self, Sr},
    system_clock::SystemClock,
    wait::WaitCondition,
};

/// One of the three programmable clock outputs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pck {
    /// PCK0
    Pck0,
    /// PCK1
    Pck1,
    /// PCK2
    Pck2,
}

impl Pck {
    /// Channel number, 0 to 2.
    pub const fn index(self) -> u8 {
        match self {
            Pck::Pck0 => 0,
            Pck::Pck1 => 1,
            Pck::Pck2 => 2,
        }
    }

    fn register(self) -> Register {
        match self {
            Pck::Pck0 => Register::Pck0,
            Pck::Pck1 => Register::Pck1,
            Pck::Pck2 => Register::Pck2,
        }
    }

    fn system_clock(self) -> SystemClock {
        match self {
            Pck::Pck0 => SystemClock::Pck0,
            Pck::Pck1 => SystemClock::Pck1,
            Pck::Pck2 => SystemClock::Pck2,
        }
    }
}

/// Clock selectable on a programmable or generated clock output, the
/// PMC_PCKx.CSS and PMC_PCR.GCKCSS field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OutputSource {
    /// Slow clock
    SlowClock = 0,
    /// Main clock
    MainClock = 1,
    /// PLL-A output, after PLLADIV2
    PllA = 2,
    /// UTMI PLL, reported as 0Hz
    Upll = 3,
    /// Master clock
    MasterClock = 4,
    /// Audio PLL, reported as 0Hz
    Audio = 5,
}

impl TryFrom<u8> for OutputSource {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(OutputSource::SlowClock),
            1 => Ok(OutputSource::MainClock),
            2 => Ok(OutputSource::PllA),
            3 => Ok(OutputSource::Upll),
            4 => Ok(OutputSource::MasterClock),
            5 => Ok(OutputSource::Audio),
            _ => Err(code),
        }
    }
}

/// Handle on one programmable clock output.
pub struct ProgrammableClock<'a, R: RegisterSurface> {
    pmc: &'a Pmc<R>,
    pck: Pck,
}

impl<R: RegisterSurface> Pmc<R> {
    /// Handle on the programmable clock `pck`.
    pub fn programmable_clock(&self, pck: Pck) -> ProgrammableClock<'_, R> {
        ProgrammableClock { pmc: self, pck }
    }
}

impl<R: RegisterSurface> ProgrammableClock<'_, R> {
    /// The output this handle drives.
    pub fn pck(&self) -> Pck {
        self.pck
    }

    /// Stop the output, then select `source` divided by `prescaler + 1`.
    ///
    /// The output stays stopped until [`Self::enable`].
    pub fn configure(&self, source: OutputSource, prescaler: u8) -> Result<(), Error> {
        self.disable()?;
        let mut pck = registers::Pck::default();
        pck.set_css(source as u8);
        pck.set_pres(prescaler);
        self.pmc.regs.write(self.pck.register(), pck.into());
        Ok(())
    }

    /// Start the output and wait for PCKRDY.
    pub fn enable(&self) -> Result<(), Error> {
        let mask = self.pck.system_clock().mask();
        self.pmc.regs.write(Register::Scer, mask);
        let index = self.pck.index();
        self.pmc
            .wait_for(WaitCondition::ProgrammableClockReady(self.pck), |regs| {
                Sr::from(regs.read(Register::Sr)).pckrdy(index)
            })
    }

    /// Stop the output and wait until PMC_SCSR shows it stopped.
    pub fn disable(&self) -> Result<(), Error> {
        let mask = self.pck.system_clock().mask();
        self.pmc.regs.write(Register::Scdr, mask);
        self.pmc
            .wait_for(WaitCondition::ProgrammableClockStopped(self.pck), |regs| {
                regs.read(Register::Scsr) & mask == 0
            })
    }

    /// Whether the output is running.
    pub fn is_enabled(&self) -> bool {
        self.pmc.regs.read(Register::Scsr) & self.pck.system_clock().mask() != 0
    }

    /// Frequency of the output, the selected source divided by
    /// `prescaler + 1` and truncated.
    pub fn frequency(&self) -> HertzU32 {
        let pck = registers::Pck::from(self.pmc.regs.read(self.pck.register()));
        divide_truncating(self.pmc.output_source_clock(pck.css()), pck.pres())
    }
}
