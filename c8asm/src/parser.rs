use crate::ast::{Addr, Branch, Instr, Line};
use chip8_isa::{Opcode, Register};
use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_while, take_while_m_n};
use nom::character::complete::{digit1, hex_digit1, line_ending, not_line_ending, space0, space1};
use nom::combinator::{all_consuming, map, map_res, opt, peek, recognize, verify};
use nom::error::ErrorKind;
use nom::multi::{separated_list0, separated_list1};
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated};
use nom::{AsChar, IResult};
use nom::{Finish, InputTakeAtPosition};
use std::error::Error;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

fn bin_digit1(i: &str) -> IResult<&str, &str> {
    i.split_at_position1_complete(|c| c != '0' && c != '1', ErrorKind::Digit)
}

fn hex_u16(i: &str) -> IResult<&str, u16> {
    map_res(preceded(tag_no_case("0x"), hex_digit1), |s| {
        u16::from_str_radix(s, 16)
    })(i)
}

fn dec_u16(i: &str) -> IResult<&str, u16> {
    map_res(digit1, u16::from_str)(i)
}

fn bin_u16(i: &str) -> IResult<&str, u16> {
    map_res(preceded(tag_no_case("0b"), bin_digit1), |s| {
        u16::from_str_radix(s, 2)
    })(i)
}

fn u16(i: &str) -> IResult<&str, u16> {
    alt((hex_u16, bin_u16, dec_u16))(i)
}

fn u8(i: &str) -> IResult<&str, u8> {
    map_res(u16, u8::try_from)(i)
}

fn nibble(i: &str) -> IResult<&str, u8> {
    verify(u8, |&v| v < 16)(i)
}

fn label(i: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while_m_n(1, 1, |c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(i)
}

fn arg_sep(i: &str) -> IResult<&str, &str> {
    delimited(space0, tag(","), space0)(i)
}

fn comment(i: &str) -> IResult<&str, &str> {
    delimited(tag("#"), not_line_ending, opt(peek(line_ending)))(i)
}

fn data(i: &str) -> IResult<&str, Instr> {
    map(separated_list1(arg_sep, u8), Instr::Data)(i)
}

fn imm_addr(i: &str) -> IResult<&str, Addr> {
    map(u16, Addr::Imm)(i)
}

fn label_ref(i: &str) -> IResult<&str, Addr> {
    map(label, |l| Addr::LabelRef(l.to_owned()))(i)
}

fn addr(i: &str) -> IResult<&str, Addr> {
    alt((imm_addr, label_ref))(i)
}

/// `JP`/`CALL` target. The listing prints these in bare hex, so a number
/// here must carry its `0x` or `0b` prefix.
fn target(i: &str) -> IResult<&str, Addr> {
    let prefixed = map(alt((hex_u16, bin_u16)), Addr::Imm);
    alt((prefixed, label_ref))(i)
}

/// A general purpose register, `V0` to `VF`.
fn vreg(i: &str) -> IResult<&str, Register> {
    let p = recognize(pair(
        tag_no_case("v"),
        take_while_m_n(1, 1, |b: char| b.is_hex_digit()),
    ));
    map_res(p, Register::from_str)(i)
}

/// A mnemonic followed by the separating whitespace.
fn mnemonic<'a>(name: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag_no_case(name), space1)
}

/// A fixed first operand, e.g. `I` in `ADD I, Vx`.
fn fixed<'a>(name: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag_no_case(name), arg_sep)
}

fn oc_noarg(i: &str) -> IResult<&str, Instr> {
    let cls = map(tag_no_case("cls"), |_| Opcode::cls());
    let ret = map(tag_no_case("ret"), |_| Opcode::ret());

    map(alt((cls, ret)), Instr::Opcode)(i)
}

fn oc_addr(i: &str) -> IResult<&str, Instr> {
    let jpv0 = map(preceded(pair(mnemonic("jp"), fixed("v0")), addr), |a| {
        (Branch::JumpV0, a)
    });
    let jp = map(preceded(mnemonic("jp"), target), |a| (Branch::Jump, a));
    let call = map(preceded(mnemonic("call"), target), |a| (Branch::Call, a));
    let ldi = map(preceded(pair(mnemonic("ld"), fixed("i")), addr), |a| {
        (Branch::LoadI, a)
    });

    map(alt((jpv0, jp, call, ldi)), |(b, a)| Instr::Branch(b, a))(i)
}

fn reg_imm(i: &str) -> IResult<&str, (Register, u8)> {
    preceded(space1, separated_pair(vreg, arg_sep, u8))(i)
}

fn oc_reg_imm(i: &str) -> IResult<&str, Opcode> {
    let se = map(preceded(tag_no_case("se"), reg_imm), |(r, b)| {
        Opcode::se_imm(r, b)
    });
    let sne = map(preceded(tag_no_case("sne"), reg_imm), |(r, b)| {
        Opcode::sne_imm(r, b)
    });
    let ld = map(preceded(tag_no_case("ld"), reg_imm), |(r, b)| {
        Opcode::ld_imm(r, b)
    });
    let add = map(preceded(tag_no_case("add"), reg_imm), |(r, b)| {
        Opcode::add_imm(r, b)
    });
    let rnd = map(preceded(tag_no_case("rnd"), reg_imm), |(r, b)| {
        Opcode::rnd(r, b)
    });

    alt((se, sne, ld, add, rnd))(i)
}

fn reg_reg(i: &str) -> IResult<&str, (Register, Register)> {
    preceded(space1, separated_pair(vreg, arg_sep, vreg))(i)
}

fn oc_reg_reg(i: &str) -> IResult<&str, Opcode> {
    let forms: [(&str, fn(Register, Register) -> Opcode); 9] = [
        ("se", Opcode::se_reg),
        ("sne", Opcode::sne_reg),
        ("ld", Opcode::ld_reg),
        ("or", Opcode::or),
        ("and", Opcode::and),
        ("xor", Opcode::xor),
        ("add", Opcode::add_reg),
        ("subn", Opcode::subn),
        ("sub", Opcode::sub),
    ];

    for (name, build) in forms {
        if let Ok((rest, (r1, r2))) = preceded(tag_no_case(name), reg_reg)(i) {
            return Ok((rest, build(r1, r2)));
        }
    }
    Err(nom::Err::Error(nom::error::Error::new(i, ErrorKind::Alt)))
}

/// `Vx` with an optional source register.
fn shift_operands(i: &str) -> IResult<&str, (Register, Option<Register>)> {
    pair(vreg, opt(preceded(arg_sep, vreg)))(i)
}

fn oc_shift(i: &str) -> IResult<&str, Opcode> {
    let shr = map(preceded(mnemonic("shr"), shift_operands), |(x, y)| {
        Opcode::shr(x, y)
    });
    let shl = map(preceded(mnemonic("shl"), shift_operands), |(x, y)| {
        Opcode::shl(x, y)
    });

    alt((shr, shl))(i)
}

fn oc_reg(i: &str) -> IResult<&str, Opcode> {
    let skp = map(preceded(mnemonic("skp"), vreg), Opcode::skp);
    let sknp = map(preceded(mnemonic("sknp"), vreg), Opcode::sknp);
    let ld_reg_dt = map(
        delimited(mnemonic("ld"), vreg, pair(arg_sep, tag_no_case("dt"))),
        Opcode::load_delay_timer,
    );
    let ld_dt_reg = map(
        preceded(pair(mnemonic("ld"), fixed("dt")), vreg),
        Opcode::set_delay_timer,
    );
    let ld_st_reg = map(
        preceded(pair(mnemonic("ld"), fixed("st")), vreg),
        Opcode::set_sound_timer,
    );
    let addi = map(
        preceded(pair(mnemonic("add"), fixed("i")), vreg),
        Opcode::add_i,
    );
    let ldf = map(
        preceded(pair(mnemonic("ld"), fixed("f")), vreg),
        Opcode::ld_font,
    );
    let ldb = map(
        preceded(pair(mnemonic("ld"), fixed("b")), vreg),
        Opcode::ld_bcd,
    );
    let save_regs = map(
        preceded(pair(mnemonic("ld"), fixed("[i]")), vreg),
        Opcode::save_regs,
    );
    let ld_regs = map(
        delimited(mnemonic("ld"), vreg, pair(arg_sep, tag_no_case("[i]"))),
        Opcode::load_regs,
    );

    alt((
        skp, sknp, ld_reg_dt, ld_dt_reg, ld_st_reg, addi, ldf, ldb, save_regs, ld_regs,
    ))(i)
}

fn oc_special(i: &str) -> IResult<&str, Opcode> {
    let mut draw = map(
        preceded(tag_no_case("drw"), separated_pair(reg_reg, arg_sep, nibble)),
        |((r1, r2), n)| Opcode::drw(r1, r2, n),
    );

    draw(i)
}

fn opcode(i: &str) -> IResult<&str, Instr> {
    let single = map(
        alt((oc_reg_imm, oc_reg_reg, oc_shift, oc_reg, oc_special)),
        Instr::Opcode,
    );
    alt((oc_noarg, oc_addr, single))(i)
}

fn instr(i: &str) -> IResult<&str, Instr> {
    terminated(alt((data, opcode)), space0)(i)
}

fn maybe_label(i: &str) -> IResult<&str, Option<String>> {
    opt(map(terminated(label, tag(":")), String::from))(i)
}

fn maybe_instr(i: &str) -> IResult<&str, Option<Instr>> {
    opt(delimited(space1, instr, space0))(i)
}

fn maybe_comment(i: &str) -> IResult<&str, &str> {
    recognize(opt(comment))(i)
}

fn line(i: &str) -> IResult<&str, Line> {
    map(
        terminated(pair(maybe_label, maybe_instr), maybe_comment),
        |(label, instr)| Line { label, instr },
    )(i)
}

fn lines(i: &str) -> IResult<&str, Vec<Line>> {
    separated_list0(line_ending, line)(i)
}

fn parse_lines(i: &str) -> Result<Vec<Line>, String> {
    all_consuming(lines)(i)
        .finish()
        .map(|(_, l)| l)
        .map_err(|e| e.to_string())
}

pub fn parse_file<P: AsRef<Path>>(p: P) -> Result<Vec<Line>, Box<dyn Error>> {
    let f = File::open(p)?;
    let mut r = BufReader::new(f);
    let mut s = String::new();
    r.read_to_string(&mut s)?;

    parse_lines(&s).map_err(|e| e.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chip8_isa::Register::*;

    fn parse_instr(s: &str) -> Instr {
        all_consuming(instr)(s).finish().unwrap().1
    }

    #[test]
    fn test_comment() {
        let s = "# a comment";
        assert_eq!(comment(s), Ok(("", " a comment")));

        let s = "# a comment\n";
        assert_eq!(comment(s), Ok(("", " a comment")));
    }

    #[test]
    fn test_u16s() {
        let s = "0b0011";
        assert_eq!(bin_u16(s), Ok(("", 3)));

        let s = "0xABCD";
        assert_eq!(hex_u16(s), Ok(("", 0xabcd)));

        let s = "0xabcd";
        assert_eq!(hex_u16(s), Ok(("", 0xabcd)));
    }

    #[test]
    fn test_u8_range() {
        assert_eq!(u8("255"), Ok(("", 255)));
        assert!(u8("256").is_err());
        assert!(nibble("16").is_err());
        assert_eq!(nibble("0xF"), Ok(("", 15)));
    }

    #[test]
    fn test_vreg() {
        assert_eq!(vreg("v0"), Ok(("", V0)));
        assert_eq!(vreg("VF"), Ok(("", VF)));
        assert_eq!(vreg("va, 1"), Ok((", 1", VA)));
        assert!(vreg("i").is_err());
    }

    #[test]
    fn test_opcodes() {
        let test_cases = [
            ("CLS", Opcode::cls()),
            ("ret", Opcode::ret()),
            ("SE V1, 0x36", Opcode::se_imm(V1, 0x36)),
            ("SNE VA, 54", Opcode::sne_imm(VA, 54)),
            ("SE V5, V6", Opcode::se_reg(V5, V6)),
            ("SNE V4, V7", Opcode::sne_reg(V4, V7)),
            ("LD V2, 0x47", Opcode::ld_imm(V2, 0x47)),
            ("ADD VA, 0b1", Opcode::add_imm(VA, 1)),
            ("LD V5, VA", Opcode::ld_reg(V5, VA)),
            ("OR V5, VA", Opcode::or(V5, VA)),
            ("AND V5, VA", Opcode::and(V5, VA)),
            ("XOR V5, VA", Opcode::xor(V5, VA)),
            ("ADD V5, VA", Opcode::add_reg(V5, VA)),
            ("SUB V5, VA", Opcode::sub(V5, VA)),
            ("SUBN V5, VA", Opcode::subn(V5, VA)),
            ("SHR V5", Opcode::shr(V5, None)),
            ("SHR V5, VA", Opcode::shr(V5, Some(VA))),
            ("SHR V5, V0", Opcode::shr(V5, None)),
            ("SHL V5", Opcode::shl(V5, None)),
            ("RND VA, 0x48", Opcode::rnd(VA, 0x48)),
            ("DRW V7, V3, 7", Opcode::drw(V7, V3, 7)),
            ("SKP V5", Opcode::skp(V5)),
            ("SKNP V5", Opcode::sknp(V5)),
            ("LD V2, DT", Opcode::load_delay_timer(V2)),
            ("LD DT, V2", Opcode::set_delay_timer(V2)),
            ("LD ST, V2", Opcode::set_sound_timer(V2)),
            ("ADD I, V2", Opcode::add_i(V2)),
            ("LD F, V2", Opcode::ld_font(V2)),
            ("LD B, V2", Opcode::ld_bcd(V2)),
            ("LD [I], V2", Opcode::save_regs(V2)),
            ("LD V2, [I]", Opcode::load_regs(V2)),
        ];

        for (s, o) in test_cases {
            assert_eq!(parse_instr(s), Instr::Opcode(o), "parsing '{}'", s);
        }
    }

    #[test]
    fn test_branches() {
        let test_cases = [
            ("JP 0x200", Branch::Jump, Addr::Imm(0x200)),
            ("CALL 0b1000000010", Branch::Call, Addr::Imm(0x202)),
            ("jp loop", Branch::Jump, Addr::LabelRef("loop".into())),
            ("CALL sub_1", Branch::Call, Addr::LabelRef("sub_1".into())),
            ("LD I, sprite", Branch::LoadI, Addr::LabelRef("sprite".into())),
            ("LD I, 0x2F0", Branch::LoadI, Addr::Imm(0x2F0)),
            ("LD I, 752", Branch::LoadI, Addr::Imm(752)),
            ("JP V0, 512", Branch::JumpV0, Addr::Imm(512)),
            ("JP V0, table", Branch::JumpV0, Addr::LabelRef("table".into())),
        ];

        for (s, b, a) in test_cases {
            assert_eq!(parse_instr(s), Instr::Branch(b, a), "parsing '{}'", s);
        }
    }

    #[test]
    fn test_bare_jump_targets_are_rejected() {
        // as printed by the disassembler, e.g. `JP 234`
        assert!(all_consuming(instr)("JP 234").is_err());
        assert!(all_consuming(instr)("CALL 200").is_err());
        assert!(parse_lines("  JP 2a4").is_err());
    }

    #[test]
    fn test_parse_lines() {
        let src = "start:\n  CLS # clear\n  JP start\nsprite: 0xF0, 0x90\n";
        let lines = parse_lines(src).unwrap();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0].label.as_deref(), Some("start"));
        assert_eq!(lines[1].instr, Some(Instr::Opcode(Opcode::cls())));
        assert_eq!(
            lines[2].instr,
            Some(Instr::Branch(Branch::Jump, Addr::LabelRef("start".into())))
        );
        assert_eq!(lines[3].instr, Some(Instr::Data(vec![0xF0, 0x90])));
        assert_eq!(lines[4].instr, None);
    }

    #[test]
    fn test_parse_lines_rejects_garbage() {
        assert!(parse_lines("  LD V1, I").is_err());
        assert!(parse_lines("  DRW V1, V2, 16").is_err());
    }
}
