//! Waiting for the hardware to acknowledge a configuration change
//!
//! Every clock change is a register write followed by a poll of a status bit.
//! The polls are written as [`nb`] functions, and a [`WaitPolicy`] decides how
//! long they are retried. The default, [`WaitPolicy::Forever`], blocks until the
//! status shows up: the PMC guarantees bounded completion once a change is
//! correctly sequenced, so a hang means the configuration itself is wrong.
//! Deployments that would rather observe such a fault pick
//! [`WaitPolicy::Bounded`] and get [`crate::Error::HardwareNotResponding`].

use core::convert::Infallible;

use crate::{arch, pck::Pck, system_clock::SystemClock};

/// How long to retry a status poll.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitPolicy {
    /// Poll until the status shows up, however long that takes.
    #[default]
    Forever,
    /// Give up after `polls` unsuccessful reads.
    Bounded {
        /// Number of status reads before giving up.
        polls: u32,
    },
}

/// The status a wait was polling for.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitCondition {
    /// PMC_SR.MCKRDY
    MasterClockReady,
    /// PMC_SR.LOCKA
    PllaLocked,
    /// PMC_SR.MOSCXTS
    MainCrystalStable,
    /// PMC_SR.MOSCRCS
    MainRcStable,
    /// CKGR_MOR.MOSCSEL read back as written
    MainOscillatorSelectAccepted,
    /// PMC_SR.MOSCSELS
    MainOscillatorSelected,
    /// PMC_SR.PCKRDYx
    ProgrammableClockReady(Pck),
    /// PMC_SCSR.PCKx cleared
    ProgrammableClockStopped(Pck),
    /// PMC_SR.GCKRDY
    GeneratedClockReady,
    /// PMC_SCSR bit set
    SystemClockEnabled(SystemClock),
    /// PMC_SCSR bit cleared
    SystemClockDisabled(SystemClock),
}

/// Turn a plain status check into an `nb` poll.
#[inline]
pub(crate) fn poll(done: bool) -> nb::Result<(), Infallible> {
    if done {
        Ok(())
    } else {
        Err(nb::Error::WouldBlock)
    }
}

impl WaitPolicy {
    /// Drive `poll` until it completes or the policy runs out.
    pub fn block<F>(self, condition: WaitCondition, mut poll: F) -> Result<(), WaitCondition>
    where
        F: FnMut() -> nb::Result<(), Infallible>,
    {
        match self {
            WaitPolicy::Forever => match nb::block!(poll()) {
                Ok(()) => Ok(()),
                Err(never) => match never {},
            },
            WaitPolicy::Bounded { polls } => {
                for _ in 0..polls {
                    match poll() {
                        Ok(()) => return Ok(()),
                        Err(nb::Error::WouldBlock) => arch::nop(),
                        Err(nb::Error::Other(never)) => match never {},
                    }
                }
                #[cfg(feature = "defmt")]
                defmt::warn!("gave up waiting for {} after {} polls", condition, polls);
                Err(condition)
            }
        }
    }
}
