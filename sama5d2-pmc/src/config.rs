//! Board and chip constants the clock tree is computed from
//!
//! None of these can be discovered at runtime: the crystal frequencies depend
//! on what is soldered to the board and the RC frequencies and peripheral
//! table on the part. The board support layer hands a [`ClockConfig`] to
//! [`crate::Pmc::new`].

use fugit::HertzU32;

/// Board-level clock constants.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockConfig {
    /// Frequency of the on-chip slow RC oscillator.
    pub slow_rc: HertzU32,
    /// Frequency of the external slow crystal.
    pub slow_crystal: HertzU32,
    /// Frequency of the on-chip main RC oscillator.
    pub main_rc: HertzU32,
    /// Frequency of the external main crystal.
    pub main_crystal: HertzU32,
    /// One past the highest peripheral id.
    pub peripheral_count: u32,
    /// Bit `n` is set when peripheral `n` sits on the H32MX matrix and is
    /// clocked from MCK divided by 2 when `PMC_MCKR.H32MXDIV` is set.
    pub h32mx_peripherals: u128,
}

impl ClockConfig {
    /// Whether peripheral `id` is clocked through the H32MX matrix.
    pub const fn is_h32mx(&self, id: u32) -> bool {
        id < 128 && self.h32mx_peripherals & (1 << id) != 0
    }
}

/// Peripheral ids on the H64MX matrix of the SAMA5D2: the ARM core, XDMAC0/1,
/// ICM, AESB, MPDDRC, MATRIX0, SDMMC0/1, LCDC, ISC, QSPI0/1 and the L2 cache.
/// Everything else hangs off H32MX.
const SAMA5D2_H64MX_PERIPHERALS: u128 = (1 << 2)
    | (1 << 6)
    | (1 << 7)
    | (1 << 8)
    | (1 << 9)
    | (1 << 13)
    | (1 << 15)
    | (1 << 31)
    | (1 << 32)
    | (1 << 45)
    | (1 << 46)
    | (1 << 52)
    | (1 << 53)
    | (1 << 63);

/// Number of peripheral ids on the SAMA5D2.
pub const SAMA5D2_PERIPHERAL_COUNT: u32 = 78;

/// SAMA5D2 Xplained Ultra: 12MHz main crystal and 32.768kHz slow crystal.
pub const SAMA5D2_XPLAINED: ClockConfig = ClockConfig {
    slow_rc: HertzU32::Hz(64_000),
    slow_crystal: HertzU32::Hz(32_768),
    main_rc: HertzU32::MHz(12),
    main_crystal: HertzU32::MHz(12),
    peripheral_count: SAMA5D2_PERIPHERAL_COUNT,
    h32mx_peripherals: !SAMA5D2_H64MX_PERIPHERALS
        & ((1 << SAMA5D2_PERIPHERAL_COUNT) - 1)
        & !0b11,
};
