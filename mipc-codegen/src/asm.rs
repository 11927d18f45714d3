//! Target assembly instructions
//!
//! A word-oriented load/store ISA with separate integer and float register
//! files. `Display` gives the assembler spelling of every instruction.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reg {
    Zero,
    V0,
    V1,
    A0,
    A1,
    A2,
    A3,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    T8,
    T9,
    S0,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    Sp,
    Fp,
    Ra,
    /// Float register `$f0`..`$f31`
    F(u8),
}

impl Reg {
    pub fn is_float(self) -> bool {
        matches!(self, Reg::F(_))
    }

    /// Argument registers in order
    pub const ARGS: [Reg; 4] = [Reg::A0, Reg::A1, Reg::A2, Reg::A3];

    /// Integer registers handed out for temporaries
    pub const TEMPS: [Reg; 10] = [
        Reg::T0,
        Reg::T1,
        Reg::T2,
        Reg::T3,
        Reg::T4,
        Reg::T5,
        Reg::T6,
        Reg::T7,
        Reg::T8,
        Reg::T9,
    ];

    /// Integer registers that cache named variables
    pub const SAVED: [Reg; 8] = [
        Reg::S0,
        Reg::S1,
        Reg::S2,
        Reg::S3,
        Reg::S4,
        Reg::S5,
        Reg::S6,
        Reg::S7,
    ];

    /// Float return value
    pub const FLOAT_RET: Reg = Reg::F(0);

    /// Argument of the print-float service
    pub const FLOAT_PRINT_ARG: Reg = Reg::F(12);

    /// Float registers handed out for temporaries: all but the return and
    /// print-argument pairs
    pub fn float_temps() -> Vec<Reg> {
        (2..32u8).filter(|n| !matches!(n, 12 | 13)).map(Reg::F).collect()
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reg::Zero => "zero",
            Reg::V0 => "v0",
            Reg::V1 => "v1",
            Reg::A0 => "a0",
            Reg::A1 => "a1",
            Reg::A2 => "a2",
            Reg::A3 => "a3",
            Reg::T0 => "t0",
            Reg::T1 => "t1",
            Reg::T2 => "t2",
            Reg::T3 => "t3",
            Reg::T4 => "t4",
            Reg::T5 => "t5",
            Reg::T6 => "t6",
            Reg::T7 => "t7",
            Reg::T8 => "t8",
            Reg::T9 => "t9",
            Reg::S0 => "s0",
            Reg::S1 => "s1",
            Reg::S2 => "s2",
            Reg::S3 => "s3",
            Reg::S4 => "s4",
            Reg::S5 => "s5",
            Reg::S6 => "s6",
            Reg::S7 => "s7",
            Reg::Sp => "sp",
            Reg::Fp => "fp",
            Reg::Ra => "ra",
            Reg::F(n) => return write!(f, "$f{}", n),
        };
        write!(f, "${}", name)
    }
}

/// Memory operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addr {
    /// `offset(base)`
    Offset { base: Reg, offset: i32 },
    /// A data-section label
    Label(String),
}

impl Addr {
    pub fn stack(base: Reg, offset: i32) -> Self {
        Addr::Offset { base, offset }
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Addr::Offset { base, offset } => write!(f, "{}({})", offset, base),
            Addr::Label(label) => write!(f, "{}", label),
        }
    }
}

/// Service codes understood by `syscall` (selected through `$v0`)
pub mod syscall {
    pub const PRINT_INT: i32 = 1;
    pub const PRINT_FLOAT: i32 = 2;
    pub const EXIT: i32 = 10;
    pub const PRINT_CHAR: i32 = 11;
}

#[derive(Debug, Clone, PartialEq)]
pub enum AsmInst {
    // Integer arithmetic
    Add(Reg, Reg, Reg),
    Sub(Reg, Reg, Reg),
    AddI(Reg, Reg, i32),
    /// hi:lo = rs * rt
    Mult(Reg, Reg),
    /// lo = rs / rt, hi = rs % rt
    Div(Reg, Reg),
    Mflo(Reg),
    Sll(Reg, Reg, u8),
    Li(Reg, i32),
    Move(Reg, Reg),

    // Integer memory
    Lw(Reg, Addr),
    Sw(Reg, Addr),

    // Float arithmetic and memory
    AddS(Reg, Reg, Reg),
    SubS(Reg, Reg, Reg),
    MulS(Reg, Reg, Reg),
    DivS(Reg, Reg, Reg),
    MovS(Reg, Reg),
    Ls(Reg, Addr),
    Ss(Reg, Addr),

    // Conversions between the register files
    /// Copy raw bits of an integer register into a float register
    Mtc1(Reg, Reg),
    /// Copy raw bits of a float register into an integer register
    Mfc1(Reg, Reg),
    /// fd = (float) fs, reading fs as a word integer
    CvtSW(Reg, Reg),
    /// fd = (int) fs, truncating toward zero
    TruncWS(Reg, Reg),

    // Control
    Jal(String),
    Jr(Reg),
    Syscall,

    // Pseudo
    Label(String),
    Comment(String),
}

impl fmt::Display for AsmInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmInst::Add(rd, rs, rt) => write!(f, "add {}, {}, {}", rd, rs, rt),
            AsmInst::Sub(rd, rs, rt) => write!(f, "sub {}, {}, {}", rd, rs, rt),
            AsmInst::AddI(rd, rs, imm) => write!(f, "addi {}, {}, {}", rd, rs, imm),
            AsmInst::Mult(rs, rt) => write!(f, "mult {}, {}", rs, rt),
            AsmInst::Div(rs, rt) => write!(f, "div {}, {}", rs, rt),
            AsmInst::Mflo(rd) => write!(f, "mflo {}", rd),
            AsmInst::Sll(rd, rs, shamt) => write!(f, "sll {}, {}, {}", rd, rs, shamt),
            AsmInst::Li(rd, imm) => write!(f, "li {}, {}", rd, imm),
            AsmInst::Move(rd, rs) => write!(f, "move {}, {}", rd, rs),

            AsmInst::Lw(rt, addr) => write!(f, "lw {}, {}", rt, addr),
            AsmInst::Sw(rt, addr) => write!(f, "sw {}, {}", rt, addr),

            AsmInst::AddS(fd, fs, ft) => write!(f, "add.s {}, {}, {}", fd, fs, ft),
            AsmInst::SubS(fd, fs, ft) => write!(f, "sub.s {}, {}, {}", fd, fs, ft),
            AsmInst::MulS(fd, fs, ft) => write!(f, "mul.s {}, {}, {}", fd, fs, ft),
            AsmInst::DivS(fd, fs, ft) => write!(f, "div.s {}, {}, {}", fd, fs, ft),
            AsmInst::MovS(fd, fs) => write!(f, "mov.s {}, {}", fd, fs),
            AsmInst::Ls(ft, addr) => write!(f, "l.s {}, {}", ft, addr),
            AsmInst::Ss(ft, addr) => write!(f, "s.s {}, {}", ft, addr),

            AsmInst::Mtc1(rt, fs) => write!(f, "mtc1 {}, {}", rt, fs),
            AsmInst::Mfc1(rt, fs) => write!(f, "mfc1 {}, {}", rt, fs),
            AsmInst::CvtSW(fd, fs) => write!(f, "cvt.s.w {}, {}", fd, fs),
            AsmInst::TruncWS(fd, fs) => write!(f, "trunc.w.s {}, {}", fd, fs),

            AsmInst::Jal(label) => write!(f, "jal {}", label),
            AsmInst::Jr(rs) => write!(f, "jr {}", rs),
            AsmInst::Syscall => write!(f, "syscall"),

            AsmInst::Label(name) => write!(f, "{}:", name),
            AsmInst::Comment(text) => write!(f, "# {}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_names() {
        assert_eq!(Reg::T3.to_string(), "$t3");
        assert_eq!(Reg::Sp.to_string(), "$sp");
        assert_eq!(Reg::F(12).to_string(), "$f12");
        assert!(Reg::F(4).is_float());
        assert!(!Reg::S0.is_float());
    }

    #[test]
    fn test_float_temp_pool_excludes_reserved() {
        let pool = Reg::float_temps();
        assert_eq!(pool.len(), 28);
        assert!(!pool.contains(&Reg::FLOAT_RET));
        assert!(!pool.contains(&Reg::FLOAT_PRINT_ARG));
    }

    #[test]
    fn test_instruction_spelling() {
        assert_eq!(
            AsmInst::Lw(Reg::S0, Addr::stack(Reg::Sp, 8)).to_string(),
            "lw $s0, 8($sp)"
        );
        assert_eq!(
            AsmInst::Ls(Reg::F(2), Addr::Label("flt_0".to_string())).to_string(),
            "l.s $f2, flt_0"
        );
        assert_eq!(AsmInst::CvtSW(Reg::F(4), Reg::F(4)).to_string(), "cvt.s.w $f4, $f4");
        assert_eq!(AsmInst::AddI(Reg::Sp, Reg::Sp, -12).to_string(), "addi $sp, $sp, -12");
        assert_eq!(AsmInst::Mult(Reg::T0, Reg::T1).to_string(), "mult $t0, $t1");
        assert_eq!(AsmInst::Label("main".to_string()).to_string(), "main:");
    }
}
