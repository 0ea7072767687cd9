//! Field layouts of the PMC and SCKC registers
//!
//! See the "Power Management Controller" and "Slow Clock Controller" chapters
//! of the SAMA5D2 datasheet for the meaning of each field.

/// Value of the CKGR_MOR.KEY field that makes a write take effect.
pub const MOR_KEY_PASSWD: u8 = 0x37;

/// Main crystal start-up time written when enabling the crystal, in units of
/// 8 slow clock cycles.
pub const MOR_MOSCXTST_DEFAULT: u8 = 18;

macro_rules! raw_register {
    ($($name:ident),* $(,)?) => {
        $(
            impl From<u32> for $name {
                fn from(bits: u32) -> Self {
                    $name(bits)
                }
            }

            impl From<$name> for u32 {
                fn from(reg: $name) -> u32 {
                    reg.0
                }
            }

            impl $name {
                /// Raw register value.
                pub fn bits(&self) -> u32 {
                    self.0
                }
            }
        )*
    };
}

bitfield::bitfield! {
    /// PMC_MCKR, master clock register.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct Mckr(u32);
    impl Debug;
    /// Master/processor clock source selection.
    pub u8, css, set_css: 1, 0;
    /// Master/processor clock prescaler.
    pub u8, pres, set_pres: 6, 4;
    /// Master clock division.
    pub u8, mdiv, set_mdiv: 9, 8;
    /// PLL-A output divided by 2.
    pub plladiv2, set_plladiv2: 12;
    /// H32MX clock is MCK divided by 2.
    pub h32mxdiv, set_h32mxdiv: 24;
}

bitfield::bitfield! {
    /// CKGR_MOR, main oscillator register.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct Mor(u32);
    impl Debug;
    /// Main crystal oscillator enable.
    pub moscxten, set_moscxten: 0;
    /// Main crystal oscillator bypass.
    pub moscxtby, set_moscxtby: 1;
    /// Main on-chip RC oscillator enable.
    pub moscrcen, set_moscrcen: 3;
    /// Main crystal oscillator start-up time.
    pub u8, moscxtst, set_moscxtst: 15, 8;
    /// Write access password.
    pub u8, key, set_key: 23, 16;
    /// Main clock oscillator selection, set for the crystal.
    pub moscsel, set_moscsel: 24;
    /// Clock failure detector enable.
    pub cfden, set_cfden: 25;
}

bitfield::bitfield! {
    /// CKGR_PLLAR, PLL-A register.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct Pllar(u32);
    impl Debug;
    /// Divider, 0 stops the PLL output.
    pub u8, diva, set_diva: 7, 0;
    /// PLL-A lock counter.
    pub u8, pllacount, set_pllacount: 13, 8;
    /// PLL-A clock frequency range.
    pub u8, outa, set_outa: 17, 14;
    /// Multiplier, 0 disables the PLL.
    pub u8, mula, set_mula: 24, 18;
    /// Must be written to 1.
    pub one, set_one: 29;
}

bitfield::bitfield! {
    /// PMC_SR, status register.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct Sr(u32);
    impl Debug;
    /// Main crystal oscillator status.
    pub moscxts, _: 0;
    /// PLL-A lock status.
    pub locka, _: 1;
    /// Master clock status.
    pub mckrdy, _: 3;
    /// Slow clock oscillator selection.
    pub oscsels, _: 7;
    /// Main clock source oscillator selection status.
    pub moscsels, _: 16;
    /// Main on-chip RC oscillator status.
    pub moscrcs, _: 17;
    /// Generated clock ready status, shared by every peripheral.
    pub gckrdy, _: 24;
}

impl Sr {
    /// Bit position of PCKRDY0; PCKRDY1 and PCKRDY2 follow.
    pub const PCKRDY0: u32 = 8;

    /// Programmable clock `index` ready status.
    pub fn pckrdy(&self, index: u8) -> bool {
        self.0 & (1 << (Self::PCKRDY0 + u32::from(index))) != 0
    }
}

bitfield::bitfield! {
    /// PMC_PCKx, programmable clock register.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct Pck(u32);
    impl Debug;
    /// Programmable clock source selection.
    pub u8, css, set_css: 2, 0;
    /// Programmable clock prescaler, the output is divided by `PRES + 1`.
    pub u8, pres, set_pres: 11, 4;
}

bitfield::bitfield! {
    /// PMC_PCR, peripheral control register.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct Pcr(u32);
    impl Debug;
    /// Peripheral id the read or write applies to.
    pub u8, pid, set_pid: 6, 0;
    /// Generated clock source selection.
    pub u8, gckcss, set_gckcss: 10, 8;
    /// Write mode, set to apply the other fields to the selected peripheral.
    pub cmd, set_cmd: 12;
    /// Generated clock division, the output is divided by `GCKDIV + 1`.
    pub u8, gckdiv, set_gckdiv: 27, 20;
    /// Peripheral clock enable.
    pub en, set_en: 28;
    /// Generated clock enable.
    pub gcken, set_gcken: 29;
}

impl Pcr {
    /// A write that only selects `pid` for the next read.
    pub fn select(pid: u8) -> Self {
        let mut pcr = Pcr(0);
        pcr.set_pid(pid);
        pcr
    }
}

bitfield::bitfield! {
    /// SCKC_CR, slow clock controller configuration register.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct SckcCr(u32);
    impl Debug;
    /// Slow clock oscillator selection, set for the 32.768kHz crystal.
    pub oscsel, set_oscsel: 24;
}

raw_register!(Mckr, Mor, Pllar, Sr, Pck, Pcr, SckcCr);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mckr_fields_land_on_their_bits() {
        let mut mckr = Mckr::default();
        mckr.set_css(2);
        mckr.set_pres(6);
        mckr.set_mdiv(3);
        mckr.set_plladiv2(true);
        assert_eq!(mckr.bits(), 0x0000_1362);
    }

    #[test]
    fn pcr_select_only_carries_the_pid() {
        let pcr = Pcr::select(0x45);
        assert_eq!(pcr.bits(), 0x45);
        assert!(!pcr.cmd());
    }

    #[test]
    fn pcr_generated_clock_fields() {
        let mut pcr = Pcr::select(30);
        pcr.set_gckcss(4);
        pcr.set_gckdiv(0xff);
        pcr.set_gcken(true);
        pcr.set_cmd(true);
        assert_eq!(pcr.bits(), 0x2ff0_141e);
    }

    #[test]
    fn pllar_multiplier_is_seven_bits_wide() {
        let mut pllar = Pllar::default();
        pllar.set_mula(0x7f);
        pllar.set_one(true);
        assert_eq!(pllar.bits(), 0x21fc_0000);
    }

    #[test]
    fn programmable_clock_ready_bits_follow_each_other() {
        let sr = Sr::from(1 << 9);
        assert!(!sr.pckrdy(0));
        assert!(sr.pckrdy(1));
        assert!(!sr.pckrdy(2));
    }
}
