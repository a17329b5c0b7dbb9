//! Amstrad CPC firmware jump-block entries.
//!
//! The CPC firmware exposes its ROM routines through a jump block of
//! fixed 16-bit addresses. Generated code calls these entries directly as
//! bare hex literals; the names here exist so emitted calls carry a
//! `;NAME` comment and the source stays greppable.
//!
//! Only the entries the code generator emits itself are listed. The
//! runtime-library bodies in [`super::runtime`] reference further
//! entries (TXT_OUTPUT, KM_WAIT_KEY, the cursor controls) inline.
//!
//! The `MATH_*` entries are the 6128 firmware maths pack (5-byte reals).

/// One firmware entry: address literal and canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareCall {
    /// The jump-block address, `&` hex spelling.
    pub address: &'static str,
    /// The firmware name, used as an assembly comment.
    pub name: &'static str,
}

impl FirmwareCall {
    const fn new(address: &'static str, name: &'static str) -> Self {
        Self { address, name }
    }
}

// Keyboard manager
pub const KM_READ_CHAR: FirmwareCall = FirmwareCall::new("&BB09", "KM_READ_CHAR");

// Text VDU
pub const TXT_CLEAR_WINDOW: FirmwareCall = FirmwareCall::new("&BB6C", "TXT_CLEAR_WINDOW");
pub const TXT_SET_CURSOR: FirmwareCall = FirmwareCall::new("&BB75", "TXT_SET_CURSOR");
pub const TXT_SET_PEN: FirmwareCall = FirmwareCall::new("&BB90", "TXT_SET_PEN");
pub const TXT_SET_PAPER: FirmwareCall = FirmwareCall::new("&BB96", "TXT_SET_PAPER");
pub const TXT_SET_MATRIX: FirmwareCall = FirmwareCall::new("&BBA8", "TXT_SET_MATRIX");
pub const TXT_SET_M_TABLE: FirmwareCall = FirmwareCall::new("&BBAB", "TXT_SET_M_TABLE");

// Screen pack
pub const SCR_SET_MODE: FirmwareCall = FirmwareCall::new("&BC0E", "SCR_SET_MODE");

// Graphics VDU
pub const GRA_SET_PEN: FirmwareCall = FirmwareCall::new("&BBDE", "GRA_SET_PEN");
pub const GRA_PLOT_ABSOLUTE: FirmwareCall = FirmwareCall::new("&BBEA", "GRA_PLOT_ABSOLUTE");
pub const GRA_LINE_ABSOLUTE: FirmwareCall = FirmwareCall::new("&BBF6", "GRA_LINE_ABSOLUTE");

// Maths pack (CPC 6128 addresses)
pub const MATH_MOVE_REAL: FirmwareCall = FirmwareCall::new("&BD3D", "MATH_MOVE_REAL");
pub const MATH_REAL_ADD: FirmwareCall = FirmwareCall::new("&BD58", "MATH_REAL_ADD");
pub const MATH_REAL_MULT: FirmwareCall = FirmwareCall::new("&BD61", "MATH_REAL_MULT");
pub const MATH_REAL_DIV: FirmwareCall = FirmwareCall::new("&BD64", "MATH_REAL_DIV");
pub const MATH_REAL_COMP: FirmwareCall = FirmwareCall::new("&BD6A", "MATH_REAL_COMP");
pub const MATH_REAL_UMINUS: FirmwareCall = FirmwareCall::new("&BD6D", "MATH_REAL_UMINUS");
pub const MATH_REAL_POWER: FirmwareCall = FirmwareCall::new("&BD7C", "MATH_REAL_POWER");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_shapes() {
        assert_eq!(SCR_SET_MODE.address, "&BC0E");
        assert_eq!(MATH_MOVE_REAL.address, "&BD3D");
        assert_eq!(TXT_SET_MATRIX.name, "TXT_SET_MATRIX");
    }
}
