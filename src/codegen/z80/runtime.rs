//! The runtime-library catalog.
//!
//! A fixed set of hand-coded Z80 routines covering the operations that
//! are not worth inlining at every call site: 16-bit multiply/divide,
//! number/string conversions, string handling, the INPUT line editor,
//! and the real-number helpers built on the firmware maths pack.
//!
//! Each entry records its name, the entries it depends on, the data-area
//! reservations it needs (conversion buffers and the like, emitted once),
//! and its body text. The code generator records which entries it used;
//! [`closure_in_order`] then computes the transitive closure and returns
//! it leaves-first, ties broken by name, so identical programs always get
//! identical LIBRARY AREAs.
//!
//! Register conventions follow the expression evaluator: integers travel
//! in `HL`, reals and strings by address in `HL`, the second operand of a
//! binary routine in `DE`.

use std::collections::BTreeSet;

/// One catalog entry.
#[derive(Debug)]
pub struct RuntimeEntry {
    /// Stable name; also the entry label unless the body says otherwise.
    pub name: &'static str,
    /// Names of entries this one calls into.
    pub deps: &'static [&'static str],
    /// Data-area lines this entry needs reserved once.
    pub data: &'static [&'static str],
    /// The routine text, one assembly line per element.
    pub body: &'static [&'static str],
}

/// Looks an entry up by name.
pub fn lookup(name: &str) -> Option<&'static RuntimeEntry> {
    CATALOG.iter().find(|e| e.name == name)
}

/// The transitive closure of the requested entries, in emission order:
/// an entry comes after everything it depends on, and entries that are
/// ready at the same time emit in name order.
pub fn closure_in_order(requested: &BTreeSet<&'static str>) -> Vec<&'static RuntimeEntry> {
    // Reachable set.
    let mut reachable: BTreeSet<&'static str> = BTreeSet::new();
    let mut work: Vec<&'static str> = requested.iter().copied().collect();
    while let Some(name) = work.pop() {
        let entry = lookup(name).unwrap_or_else(|| panic!("unknown runtime entry '{}'", name));
        if reachable.insert(entry.name) {
            work.extend(entry.deps.iter().copied());
        }
    }

    // Kahn's algorithm over the reachable set, name order among ready nodes.
    let mut emitted: BTreeSet<&'static str> = BTreeSet::new();
    let mut order = Vec::new();
    while emitted.len() < reachable.len() {
        let next = reachable
            .iter()
            .copied()
            .find(|name| {
                !emitted.contains(name)
                    && lookup(name)
                        .expect("reachable entries exist")
                        .deps
                        .iter()
                        .all(|d| emitted.contains(d))
            })
            .expect("runtime catalog has a dependency cycle");
        emitted.insert(next);
        order.push(lookup(next).expect("entry exists"));
    }
    order
}

/// The catalog itself.
///
/// The multiply/divide/compare cores are the classic restoring shift
/// algorithms (Zaks, "Programming the Z80", via Nils M. Holm's cc0
/// versions); the conversion routines trace back to the well-known
/// wikiti/cemetech Z80 snippets.
pub static CATALOG: &[RuntimeEntry] = &[
    // ==================== 16-bit integer maths ====================
    RuntimeEntry {
        name: "mul16_unsigned",
        deps: &[],
        data: &[],
        body: &[
            "; 16x16 unsigned multiplication, HL = HL*DE.",
            "mul16_unsigned:",
            "\tld      a,l",
            "\tld      c,h",
            "\tld      b,16",
            "\tld      hl,0",
            "__mul16u_bit:",
            "\tsrl     c",
            "\trra",
            "\tjr      nc,__mul16u_skip",
            "\tadd     hl,de",
            "__mul16u_skip:",
            "\tex      de,hl",
            "\tadd     hl,hl",
            "\tex      de,hl",
            "\tdjnz    __mul16u_bit",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "div16_unsigned",
        deps: &[],
        data: &[],
        body: &[
            "; 16/16 unsigned division, HL = HL div DE, DE = HL mod DE.",
            "div16_unsigned:",
            "\tld      a,h",
            "\tld      c,l",
            "\tld      hl,0",
            "\tld      b,16",
            "__div16u_bit:",
            "\trl      c",
            "\trla",
            "\tadc     hl,hl",
            "\tsbc     hl,de",
            "\tjr      nc,__div16u_keep",
            "\tadd     hl,de",
            "__div16u_keep:",
            "\tccf",
            "\tdjnz    __div16u_bit",
            "\trl      c",
            "\trla",
            "\tld      d,a",
            "\tld      e,c",
            "\tex      de,hl",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "sign_extract",
        deps: &[],
        data: &[],
        body: &[
            "; extract the common sign of HL and DE into carry:",
            "; CY=0 when signs agree, CY=1 otherwise",
            "sign_extract:",
            "\tld      a,h",
            "\txor     d",
            "\trla",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "sign_strip",
        deps: &[],
        data: &[],
        body: &[
            "; strip the signs from HL and DE",
            "sign_strip:",
            "\tbit     7,d",
            "\tjr      z,__sign_strip_hl",
            "\tld      a,d",
            "\tcpl",
            "\tld      d,a",
            "\tld      a,e",
            "\tcpl",
            "\tld      e,a",
            "\tinc     de",
            "__sign_strip_hl:",
            "\tbit     7,h",
            "\tret     z",
            "neghl:",
            "\tld      a,h",
            "\tcpl",
            "\tld      h,a",
            "\tld      a,l",
            "\tcpl",
            "\tld      l,a",
            "\tinc     hl",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "mul16_signed",
        deps: &["sign_extract", "sign_strip", "mul16_unsigned"],
        data: &[],
        body: &[
            "; 15x15 signed multiplication, HL = HL*DE",
            "mul16_signed:",
            "\tcall    sign_extract",
            "\tpush    af",
            "\tcall    sign_strip",
            "\tcall    mul16_unsigned",
            "\tpop     af",
            "\tret     nc",
            "\tjr      neghl",
        ],
    },
    RuntimeEntry {
        name: "div16_signed",
        deps: &["sign_extract", "sign_strip", "div16_unsigned"],
        data: &[],
        body: &[
            "; 15/15 signed division, HL = DE div HL (right operand in HL)",
            "div16_signed:",
            "\tex      de,hl",
            "\tcall    sign_extract",
            "\tpush    af",
            "\tcall    sign_strip",
            "\tcall    div16_unsigned",
            "\tpop     af",
            "\tret     nc",
            "\tjr      neghl",
        ],
    },
    RuntimeEntry {
        name: "mod16",
        deps: &["div16_unsigned"],
        data: &[],
        body: &[
            "; 16-bit remainder, HL = DE mod HL (right operand in HL)",
            "mod16:",
            "\tex      de,hl",
            "\tcall    div16_unsigned",
            "\tex      de,hl",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "comp16_signed",
        deps: &[],
        data: &[],
        body: &[
            "; signed comparison HL-DE, sets Z and CY,",
            "; where CY means HL < DE",
            "comp16_signed:",
            "\txor     a",
            "\tsbc     hl,de",
            "\tret     z",
            "\tjp      m,__comp16_lt",
            "\tor      a",
            "\tret",
            "__comp16_lt:",
            "\tscf",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "div16_hlby10",
        deps: &[],
        data: &[],
        body: &[
            "; HL = HL div 10, A = HL mod 10. DE preserved.",
            "div16_hlby10:",
            "\tld      bc,&100A",
            "\txor     a",
            "__div10_bit:",
            "\tadd     hl,hl",
            "\trla",
            "\tcp      c",
            "\tjr      c,__div10_next",
            "\tsub     c",
            "\tinc     l",
            "__div10_next:",
            "\tdjnz    __div10_bit",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "abs16",
        deps: &["sign_strip"],
        data: &[],
        body: &[
            "; HL = |HL|",
            "abs16:",
            "\tbit     7,h",
            "\tret     z",
            "\tjp      neghl",
        ],
    },
    RuntimeEntry {
        name: "calllib_jp_hl",
        deps: &[],
        data: &[],
        body: &[
            "; dispatch CALL to a computed address",
            "calllib_jp_hl:",
            "\tjp      (hl)",
        ],
    },
    // ==================== strings ====================
    RuntimeEntry {
        name: "strlib_print_nl",
        deps: &[],
        data: &[],
        body: &[
            "strlib_print_nl:",
            "\tld      a,13",
            "\tcall    &BB5A ;TXT_OUTPUT",
            "\tld      a,10",
            "\tcall    &BB5A ;TXT_OUTPUT",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "strlib_print_str",
        deps: &[],
        data: &[],
        body: &[
            "; HL = address of the string to print",
            "strlib_print_str:",
            "\tld      a,(hl)",
            "\tor      a",
            "\tret     z",
            "\tinc     hl",
            "\tcall    &BB5A ;TXT_OUTPUT",
            "\tjr      strlib_print_str",
        ],
    },
    RuntimeEntry {
        name: "strlib_print_zone",
        deps: &[],
        data: &[],
        body: &[
            "; advance the cursor to the next 13-column print zone",
            "strlib_print_zone:",
            "\tcall    &BB78 ;TXT_GET_CURSOR",
            "\tld      a,h",
            "\tdec     a",
            "__strlib_zone_mod:",
            "\tsub     13",
            "\tjr      nc,__strlib_zone_mod",
            "\tadd     a,13",
            "\tld      b,a",
            "\tld      a,13",
            "\tsub     b",
            "\tld      b,a",
            "\tld      a,32",
            "__strlib_zone_pad:",
            "\tcall    &BB5A ;TXT_OUTPUT",
            "\tdjnz    __strlib_zone_pad",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "strlib_int2str",
        deps: &["div16_hlby10"],
        data: &["__strlib_int2str_conv:\tdefs 7"],
        body: &[
            "; HL = number to convert; returns HL = conversion buffer",
            "strlib_int2str:",
            "\tld      de,__strlib_int2str_conv",
            "\tbit     7,h",
            "\tjr      z,__int2str_digits",
            "\tld      a,&2D",
            "\tld      (de),a",
            "\tinc     de",
            "\txor     a",
            "\tsub     l",
            "\tld      l,a",
            "\tld      a,0",
            "\tsbc     a,h",
            "\tld      h,a",
            "__int2str_digits:",
            "\tld      b,0",
            "__int2str_next:",
            "\tpush    bc",
            "\tcall    div16_hlby10",
            "\tpop     bc",
            "\tpush    af",
            "\tinc     b",
            "\tld      a,h",
            "\tor      l",
            "\tjr      nz,__int2str_next",
            "__int2str_store:",
            "\tpop     af",
            "\tor      &30",
            "\tld      (de),a",
            "\tinc     de",
            "\tdjnz    __int2str_store",
            "\txor     a",
            "\tld      (de),a",
            "\tld      hl,__strlib_int2str_conv",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "strlib_str2int",
        deps: &[],
        data: &[],
        body: &[
            "; DE = digit string (optional leading -); returns HL = value,",
            "; DE past the digits",
            "strlib_str2int:",
            "\tld      b,0",
            "\tld      a,(de)",
            "\tcp      &2D",
            "\tjr      nz,__str2int_go",
            "\tinc     de",
            "\tld      b,1",
            "__str2int_go:",
            "\tld      hl,0",
            "__str2int_digit:",
            "\tld      a,(de)",
            "\tsub     &30",
            "\tcp      10",
            "\tjr      nc,__str2int_done",
            "\tinc     de",
            "\tpush    de",
            "\tld      d,h",
            "\tld      e,l",
            "\tadd     hl,hl",
            "\tadd     hl,hl",
            "\tadd     hl,de",
            "\tadd     hl,hl",
            "\tld      e,a",
            "\tld      d,0",
            "\tadd     hl,de",
            "\tpop     de",
            "\tjr      __str2int_digit",
            "__str2int_done:",
            "\tld      a,b",
            "\tor      a",
            "\tret     z",
            "\tld      a,h",
            "\tcpl",
            "\tld      h,a",
            "\tld      a,l",
            "\tcpl",
            "\tld      l,a",
            "\tinc     hl",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "strlib_dropspaces",
        deps: &[],
        data: &[],
        body: &[
            "; DE ends pointing at the first character that is not ' '",
            "strlib_dropspaces:",
            "\tld      a,(de)",
            "\tcp      &20",
            "\tret     nz",
            "\tinc     de",
            "\tjr      strlib_dropspaces",
        ],
    },
    RuntimeEntry {
        name: "strlib_int2hex",
        deps: &[],
        data: &["__strlib_hexconv:\tdefs 5"],
        body: &[
            "; DE = number; returns HL = four-digit hex rendering",
            "strlib_int2hex:",
            "\tld      hl,__strlib_hexconv",
            "\tld      a,d",
            "\tcall    __int2hex_byte",
            "\tld      a,e",
            "\tcall    __int2hex_byte",
            "\tld      (hl),0",
            "\tld      hl,__strlib_hexconv",
            "\tret",
            "__int2hex_byte:",
            "\tld      c,a",
            "\trra",
            "\trra",
            "\trra",
            "\trra",
            "\tcall    __int2hex_nibble",
            "\tld      a,c",
            "__int2hex_nibble:",
            "\tand     &0F",
            "\tcp      &0A",
            "\tjr      nc,__int2hex_letter",
            "\tadd     a,&30",
            "\tjr      __int2hex_store",
            "__int2hex_letter:",
            "\tadd     a,&37",
            "__int2hex_store:",
            "\tld      (hl),a",
            "\tinc     hl",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "strlib_copy",
        deps: &[],
        data: &[],
        body: &[
            "; HL = destination, DE = origin; copies up to and including",
            "; the NUL, both pointers end past it",
            "strlib_strcopy:",
            "\tld      a,(de)",
            "\tld      (hl),a",
            "\tinc     hl",
            "\tinc     de",
            "\tor      a",
            "\tjr      nz,strlib_strcopy",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "strlib_comp",
        deps: &[],
        data: &[],
        body: &[
            "; lexicographic comparison of (DE) against (HL):",
            "; Z set when equal, CY set when (DE) sorts before (HL)",
            "strlib_strcomp:",
            "\tld      a,(de)",
            "\tcp      (hl)",
            "\tret     nz",
            "\tor      a",
            "\tret     z",
            "\tinc     de",
            "\tinc     hl",
            "\tjr      strlib_strcomp",
        ],
    },
    RuntimeEntry {
        name: "strlib_len",
        deps: &[],
        data: &[],
        body: &[
            "; HL = string; returns HL = length",
            "strlib_len:",
            "\tld      bc,0",
            "__strlib_len_count:",
            "\tld      a,(hl)",
            "\tor      a",
            "\tjr      z,__strlib_len_done",
            "\tinc     hl",
            "\tinc     bc",
            "\tjr      __strlib_len_count",
            "__strlib_len_done:",
            "\tld      h,b",
            "\tld      l,c",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "strlib_left",
        deps: &[],
        data: &[],
        body: &[
            "; HL = source, DE = destination, BC = count;",
            "; copies at most BC characters, stops at the source NUL",
            "strlib_left:",
            "\tld      a,b",
            "\tor      c",
            "\tjr      z,__strlib_left_done",
            "\tld      a,(hl)",
            "\tor      a",
            "\tjr      z,__strlib_left_done",
            "\tld      (de),a",
            "\tinc     hl",
            "\tinc     de",
            "\tdec     bc",
            "\tjr      strlib_left",
            "__strlib_left_done:",
            "\txor     a",
            "\tld      (de),a",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "strlib_skip",
        deps: &[],
        data: &[],
        body: &[
            "; HL = string, DE = characters to skip; stops early at the NUL",
            "strlib_skip:",
            "\tld      a,d",
            "\tor      e",
            "\tret     z",
            "\tld      a,(hl)",
            "\tor      a",
            "\tret     z",
            "\tinc     hl",
            "\tdec     de",
            "\tjr      strlib_skip",
        ],
    },
    RuntimeEntry {
        name: "strlib_right",
        deps: &["strlib_len", "strlib_copy"],
        data: &[],
        body: &[
            "; HL = source, DE = destination, BC = count",
            "strlib_right:",
            "\tpush    de",
            "\tpush    bc",
            "\tpush    hl",
            "\tcall    strlib_len",
            "\tpop     de",
            "\tpop     bc",
            "\txor     a",
            "\tsbc     hl,bc",
            "\tjr      nc,__strlib_right_ofs",
            "\tld      hl,0",
            "__strlib_right_ofs:",
            "\tadd     hl,de",
            "\tex      de,hl",
            "\tpop     hl",
            "\tjp      strlib_strcopy",
        ],
    },
    // ==================== reals (firmware maths pack) ====================
    RuntimeEntry {
        name: "reallib_scratch",
        deps: &[],
        data: &["__reallib_scratch:\tdefs 5"],
        body: &[],
    },
    RuntimeEntry {
        name: "reallib_int2real",
        deps: &[],
        data: &[],
        body: &[
            "; HL = integer value, DE = destination 5-byte buffer",
            "reallib_int2real:",
            "\tjp      &BD40 ;MATH_INT_TO_REAL",
        ],
    },
    RuntimeEntry {
        name: "reallib_real2int",
        deps: &[],
        data: &[],
        body: &[
            "; HL = address of a real; returns HL = rounded integer",
            "reallib_real2int:",
            "\tjp      &BD46 ;MATH_REAL_TO_INT",
        ],
    },
    RuntimeEntry {
        name: "reallib_floor",
        deps: &["reallib_scratch"],
        data: &[],
        body: &[
            "; HL = address of a real; returns HL = floor as integer",
            "reallib_floor:",
            "\tld      de,__reallib_scratch",
            "\tcall    &BD3D ;MATH_MOVE_REAL",
            "\tex      de,hl",
            "\tcall    &BD4F ;MATH_REAL_INT",
            "\tjp      &BD46 ;MATH_REAL_TO_INT",
        ],
    },
    RuntimeEntry {
        name: "reallib_sub",
        deps: &["reallib_scratch"],
        data: &[],
        body: &[
            "; (HL) = (HL) - (DE); the minuend buffer must be writable",
            "reallib_sub:",
            "\tpush    hl",
            "\tex      de,hl",
            "\tld      de,__reallib_scratch",
            "\tcall    &BD3D ;MATH_MOVE_REAL",
            "\tex      de,hl",
            "\tcall    &BD6D ;MATH_REAL_UMINUS",
            "\tex      de,hl",
            "\tpop     hl",
            "\tjp      &BD58 ;MATH_REAL_ADD",
        ],
    },
    RuntimeEntry {
        name: "reallib_abs",
        deps: &[],
        data: &[],
        body: &[
            "; (HL) = |(HL)|; the buffer must be writable",
            "reallib_abs:",
            "\tpush    hl",
            "\tinc     hl",
            "\tinc     hl",
            "\tinc     hl",
            "\tbit     7,(hl)",
            "\tpop     hl",
            "\tret     z",
            "\tjp      &BD6D ;MATH_REAL_UMINUS",
        ],
    },
    RuntimeEntry {
        name: "reallib_real2str",
        deps: &["reallib_scratch", "strlib_int2str", "strlib_copy", "div16_hlby10"],
        data: &[
            "__reallib_r2s_out:\tdefs 16",
            "__reallib_r2s_int:\tdefs 5",
            "__reallib_tenk:\tdb &00,&00,&40,&1C,&8E ; 10000.0",
        ],
        body: &[
            "; HL = address of a real; returns HL = its rendering with a",
            "; fixed four fractional digits",
            "reallib_real2str:",
            "\tld      de,__reallib_scratch",
            "\tcall    &BD3D ;MATH_MOVE_REAL",
            "\tld      de,__reallib_r2s_out",
            "\tld      hl,__reallib_scratch+3",
            "\tbit     7,(hl)",
            "\tld      hl,__reallib_scratch",
            "\tjr      z,__r2s_positive",
            "\tld      a,&2D",
            "\tld      (de),a",
            "\tinc     de",
            "\tcall    &BD6D ;MATH_REAL_UMINUS",
            "__r2s_positive:",
            "\tpush    de",
            "\tld      de,__reallib_r2s_int",
            "\tcall    &BD3D ;MATH_MOVE_REAL",
            "\tex      de,hl",
            "\tcall    &BD4F ;MATH_REAL_INT",
            "\tcall    &BD46 ;MATH_REAL_TO_INT",
            "\tcall    strlib_int2str",
            "\tex      de,hl",
            "\tpop     hl",
            "\tcall    strlib_strcopy",
            "\tdec     hl",
            "\tld      a,&2E",
            "\tld      (hl),a",
            "\tinc     hl",
            "\tpush    hl",
            "\tld      hl,__reallib_r2s_int",
            "\tcall    &BD6D ;MATH_REAL_UMINUS",
            "\tld      hl,__reallib_scratch",
            "\tld      de,__reallib_r2s_int",
            "\tcall    &BD58 ;MATH_REAL_ADD",
            "\tld      hl,__reallib_scratch",
            "\tld      de,__reallib_tenk",
            "\tcall    &BD61 ;MATH_REAL_MULT",
            "\tld      hl,__reallib_scratch",
            "\tcall    &BD46 ;MATH_REAL_TO_INT",
            "\tpop     de",
            "\tld      b,4",
            "__r2s_divide:",
            "\tpush    bc",
            "\tcall    div16_hlby10",
            "\tpop     bc",
            "\tpush    af",
            "\tdjnz    __r2s_divide",
            "\tld      b,4",
            "__r2s_store:",
            "\tpop     af",
            "\tor      &30",
            "\tld      (de),a",
            "\tinc     de",
            "\tdjnz    __r2s_store",
            "\txor     a",
            "\tld      (de),a",
            "\tld      hl,__reallib_r2s_out",
            "\tret",
        ],
    },
    // ==================== INPUT and DATA ====================
    RuntimeEntry {
        name: "inputlib_input",
        deps: &["strlib_print_nl"],
        data: &[
            "__inputlib_inbuf:\tdefs 256",
            "__inputlib_prompt:\tdb \"? \",&00",
        ],
        body: &[
            "; reads an edited line from the keyboard into __inputlib_inbuf;",
            "; returns HL = buffer",
            "inputlib_input:",
            "\tcall    &BB7B ;TXT_CUR_ENABLE",
            "\tcall    &BB81 ;TXT_CUR_ON",
            "\tld      hl,__inputlib_inbuf",
            "\tld      bc,0",
            "__inputlib_key:",
            "\tcall    &BB18 ;KM_WAIT_KEY",
            "\tcp      127",
            "\tjr      nz,__inputlib_check_enter",
            "\tld      a,b",
            "\tor      c",
            "\tjr      z,__inputlib_key",
            "\tld      a,8",
            "\tcall    &BB5A ;TXT_OUTPUT",
            "\tld      a,32",
            "\tcall    &BB5A ;TXT_OUTPUT",
            "\tld      a,8",
            "\tcall    &BB5A ;TXT_OUTPUT",
            "\tdec     hl",
            "\tdec     bc",
            "\tjr      __inputlib_key",
            "__inputlib_check_enter:",
            "\tcp      13",
            "\tjr      z,__inputlib_done",
            "\tcall    &BB5A ;TXT_OUTPUT",
            "\tld      (hl),a",
            "\tinc     hl",
            "\tinc     bc",
            "\tjr      __inputlib_key",
            "__inputlib_done:",
            "\txor     a",
            "\tld      (hl),a",
            "\tcall    strlib_print_nl",
            "\tcall    &BB7E ;TXT_CUR_DISABLE",
            "\tcall    &BB84 ;TXT_CUR_OFF",
            "\tld      hl,__inputlib_inbuf",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "inputlib_next",
        deps: &[],
        data: &[],
        body: &[
            "; advance DE past one ',' separator, if present",
            "inputlib_next:",
            "\tld      a,(de)",
            "\tcp      &2C",
            "\tret     nz",
            "\tinc     de",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "inputlib_read_str",
        deps: &[],
        data: &[],
        body: &[
            "; copy from (DE) into (HL) until ',' or NUL; DE ends on the",
            "; separator, the destination is NUL-terminated",
            "inputlib_read_str:",
            "\tld      a,(de)",
            "\tor      a",
            "\tjr      z,__inputlib_rs_done",
            "\tcp      &2C",
            "\tjr      z,__inputlib_rs_done",
            "\tld      (hl),a",
            "\tinc     hl",
            "\tinc     de",
            "\tjr      inputlib_read_str",
            "__inputlib_rs_done:",
            "\txor     a",
            "\tld      (hl),a",
            "\tret",
        ],
    },
    RuntimeEntry {
        name: "datalib_next",
        deps: &[],
        data: &[],
        body: &[
            "; advance DE past the next NUL terminator",
            "datalib_next:",
            "\tld      a,(de)",
            "\tinc     de",
            "\tor      a",
            "\tjr      nz,datalib_next",
            "\tret",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let mut seen = BTreeSet::new();
        for entry in CATALOG {
            assert!(seen.insert(entry.name), "duplicate entry {}", entry.name);
        }
    }

    #[test]
    fn test_all_deps_exist() {
        for entry in CATALOG {
            for dep in entry.deps {
                assert!(lookup(dep).is_some(), "{} depends on unknown {}", entry.name, dep);
            }
        }
    }

    #[test]
    fn test_closure_pulls_dependencies() {
        let mut requested = BTreeSet::new();
        requested.insert("strlib_int2str");
        let order = closure_in_order(&requested);
        let names: Vec<_> = order.iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["div16_hlby10", "strlib_int2str"]);
    }

    #[test]
    fn test_dependencies_come_first() {
        let mut requested = BTreeSet::new();
        requested.insert("mul16_signed");
        requested.insert("reallib_real2str");
        let order = closure_in_order(&requested);
        let position = |name: &str| {
            order
                .iter()
                .position(|e| e.name == name)
                .unwrap_or_else(|| panic!("{name} missing"))
        };
        assert!(position("mul16_unsigned") < position("mul16_signed"));
        assert!(position("sign_strip") < position("mul16_signed"));
        assert!(position("div16_hlby10") < position("strlib_int2str"));
        assert!(position("strlib_int2str") < position("reallib_real2str"));
    }

    #[test]
    fn test_order_is_deterministic() {
        let mut requested = BTreeSet::new();
        requested.insert("reallib_real2str");
        requested.insert("div16_signed");
        requested.insert("strlib_comp");
        let first: Vec<_> = closure_in_order(&requested).iter().map(|e| e.name).collect();
        let second: Vec<_> = closure_in_order(&requested).iter().map(|e| e.name).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_entry_bodies_define_their_label() {
        // Every non-data-only entry's body must define a label the
        // emitter can call; by convention it appears as "<label>:".
        for entry in CATALOG {
            if entry.body.is_empty() {
                continue;
            }
            assert!(
                entry.body.iter().any(|l| l.ends_with(':') && !l.starts_with('\t')),
                "{} has no label line",
                entry.name
            );
        }
    }
}
