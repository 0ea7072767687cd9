//! Clock tree driver for the SAMA5D2 Power Management Controller (PMC)
//!
//! The PMC derives every clock in the chip from two oscillator pairs (slow and
//! main, each with an internal RC and an external crystal), PLL-A, and the
//! master clock prescaler / divider chain. This crate models that tree,
//! reports the resulting frequencies, and sequences changes to it with the
//! waits the hardware requires.
//!
//! NOTE This crate is still under active development. This API will remain volatile until 1.0.0
//!
//! # Crate features
//!
//! * **defmt** -
//!   Implement `defmt::Format` for several types and log clock transitions.
//! * **generated-clocks** -
//!   Per-peripheral generated clocks (GCK). Enabled by default.
//! * **sim** -
//!   Register-level simulator of the PMC, for host-side testing.
//!
//! # Usage
//! ```no_run
//! use sama5d2_pmc::{
//!     clocks::{MasterClockSource, MasterDivider, Prescaler},
//!     config::SAMA5D2_XPLAINED,
//!     pll::common_configs::PLLA_996MHZ,
//!     register_access::Mmio,
//!     Pmc,
//! };
//!
//! # fn func() -> Result<(), sama5d2_pmc::Error> {
//! // Safety: nothing else in the program touches the PMC or the SCKC.
//! let pmc = Pmc::new(unsafe { Mmio::sama5d2() }, SAMA5D2_XPLAINED);
//!
//! pmc.select_main_crystal()?;
//! pmc.configure_plla(PLLA_996MHZ)?;
//! pmc.set_plla_div2(true)?;
//! pmc.set_master_prescaler(Prescaler::Div1)?;
//! pmc.set_master_divider(MasterDivider::Div3)?;
//! pmc.switch_master_clock(MasterClockSource::PllA)?;
//!
//! // 12MHz * 83 / 1 / 2 = 498MHz processor clock, 166MHz master clock
//! let mck = pmc.master_clock();
//! # let _ = mck;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![no_std]

pub mod arch;
pub mod clocks;
pub mod config;
#[cfg(feature = "generated-clocks")]
pub mod gck;
pub mod oscillators;
pub mod pck;
pub mod peripheral;
pub mod pll;
pub mod register_access;
pub mod registers;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod system_clock;
pub mod wait;

// Provide access to common datastructures to avoid repeating ourselves
pub use clocks::{ClockSource, Error, InvalidArgument, Pmc};
pub use peripheral::PeripheralId;
pub use wait::{WaitCondition, WaitPolicy};

// Re-export crates used in sama5d2-pmc's public API
pub extern crate fugit;
