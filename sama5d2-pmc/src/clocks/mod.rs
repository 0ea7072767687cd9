//! Clocks (PMC)
//!
//! [`Pmc`] owns the register surface and is the single entry point to the
//! clock tree. Frequency queries live in [`sources`], master clock switching
//! in [`master`]; the oscillators, PLL-A, peripheral gates, programmable
//! clocks, generated clocks and system clocks each extend [`Pmc`] from their
//! own module.
//!
//! ## Usage
//! ```no_run
//! use sama5d2_pmc::{
//!     clocks::{ClockSource, MasterClockSource},
//!     config::SAMA5D2_XPLAINED,
//!     pck::{OutputSource, Pck},
//!     register_access::Mmio,
//!     Pmc,
//! };
//!
//! # fn func() -> Result<(), sama5d2_pmc::Error> {
//! let pmc = Pmc::new(unsafe { Mmio::sama5d2() }, SAMA5D2_XPLAINED);
//!
//! pmc.switch_master_clock(MasterClockSource::MainClock)?;
//!
//! // Route MCK / 4 to the PCK0 pin
//! let pck0 = pmc.programmable_clock(Pck::Pck0);
//! pck0.configure(OutputSource::MasterClock, 3)?;
//! pck0.enable()?;
//!
//! assert_eq!(pck0.frequency(), pmc.resolve(ClockSource::MasterClock) / 4);
//! # Ok(())
//! # }
//! ```
//!
//! See the "Power Management Controller" chapter of the SAMA5D2 datasheet for
//! more details.

use core::cell::Cell;

use critical_section::Mutex;
use fugit::HertzU32;

use crate::{
    config::ClockConfig,
    register_access::RegisterSurface,
    wait::{WaitCondition, WaitPolicy},
};

pub mod master;
pub mod sources;

pub use master::{MasterClockConfig, MasterClockSource, MasterDivider, Prescaler};
pub use sources::ClockSource;

/// Something went wrong configuring the clock tree
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// An argument is outside what the hardware accepts. Nothing was written.
    InvalidArgument(InvalidArgument),
    /// A bounded wait ran out before the hardware reported the change.
    HardwareNotResponding(WaitCondition),
}

/// The argument that was rejected
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InvalidArgument {
    /// Peripheral ids 0 and 1 are reserved and ids stop at the peripheral count.
    PeripheralId(u32),
    /// The PLL-A multiplier field is 7 bits wide.
    PllMultiplier(u8),
    /// The PLL-A lock counter field is 6 bits wide.
    PllCount(u8),
    /// The PLL-A charge pump current field is 2 bits wide.
    PllChargePump(u8),
}

impl From<InvalidArgument> for Error {
    fn from(arg: InvalidArgument) -> Self {
        Error::InvalidArgument(arg)
    }
}

/// Abstraction layer providing Clock Management.
pub struct Pmc<R: RegisterSurface> {
    pub(crate) regs: R,
    pub(crate) config: ClockConfig,
    wait_policy: WaitPolicy,
    /// Last computed master clock frequency, `None` once a switch may have
    /// changed it.
    mck: Mutex<Cell<Option<HertzU32>>>,
}

impl<R: RegisterSurface> Pmc<R> {
    /// Exchanges the register surface against Self.
    ///
    /// The hardware is left exactly as it is: the controller re-derives the
    /// clock tree from the registers on every query.
    pub fn new(regs: R, config: ClockConfig) -> Self {
        Pmc {
            regs,
            config,
            wait_policy: WaitPolicy::Forever,
            mck: Mutex::new(Cell::new(None)),
        }
    }

    /// Use `policy` for every subsequent hardware wait.
    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.wait_policy = policy;
        self
    }

    /// The policy hardware waits follow.
    pub fn wait_policy(&self) -> WaitPolicy {
        self.wait_policy
    }

    /// The board constants the tree is computed from.
    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Releases the register surface.
    pub fn free(self) -> R {
        self.regs
    }

    /// Block on `status` reading true, following the wait policy.
    pub(crate) fn wait_for<F>(&self, condition: WaitCondition, mut status: F) -> Result<(), Error>
    where
        F: FnMut(&R) -> bool,
    {
        self.wait_policy
            .block(condition, || crate::wait::poll(status(&self.regs)))
            .map_err(Error::HardwareNotResponding)
    }

    /// Forget the cached master clock frequency.
    pub(crate) fn invalidate_master_clock(&self) {
        critical_section::with(|cs| self.mck.borrow(cs).set(None));
    }

    /// Return the cached master clock frequency, computing it with `compute`
    /// if there is none. Both happen under the same lock as
    /// [`Self::invalidate_master_clock`], so a value computed from a register
    /// state that a switch has since replaced is never stored after the
    /// switch invalidated the cache.
    pub(crate) fn cached_master_clock<F>(&self, compute: F) -> HertzU32
    where
        F: FnOnce() -> HertzU32,
    {
        critical_section::with(|cs| {
            let cell = self.mck.borrow(cs);
            match cell.get() {
                Some(freq) => freq,
                None => {
                    let freq = compute();
                    cell.set(Some(freq));
                    freq
                }
            }
        })
    }

    /// Whether a master clock frequency is currently cached.
    pub fn master_clock_is_cached(&self) -> bool {
        critical_section::with(|cs| self.mck.borrow(cs).get().is_some())
    }
}
