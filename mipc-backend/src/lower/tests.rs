use super::*;
use mipc_codegen::Addr;
use mipc_common::{BinOp, Session};
use mipc_frontend::{generate, Expr, FunctionDef, Param, Program, Stmt};
use mipc_ir::optimize;
use pretty_assertions::assert_eq;

fn lower(program: &Program, run_optimizer: bool) -> Result<AsmProgram, CompilerError> {
    let mut session = Session::new();
    let mut ir = generate(program, &mut session)?;
    if run_optimizer {
        ir = optimize(&ir, &session.functions)?.0;
    }
    lower_program(&ir, &session.functions).map(|(asm, _)| asm)
}

/// Text section without comments
fn code(asm: &AsmProgram) -> Vec<AsmInst> {
    asm.text
        .iter()
        .filter(|inst| !matches!(inst, AsmInst::Comment(_)))
        .cloned()
        .collect()
}

fn int_var(name: &str) -> Expr {
    Expr::var(name, ValueType::Int)
}

fn print_tail(reg: Reg) -> Vec<AsmInst> {
    vec![
        AsmInst::Move(Reg::A0, reg),
        AsmInst::Li(Reg::V0, 1),
        AsmInst::Syscall,
        AsmInst::Li(Reg::A0, 10),
        AsmInst::Li(Reg::V0, 11),
        AsmInst::Syscall,
    ]
}

fn exit_tail(frame: i32) -> Vec<AsmInst> {
    vec![AsmInst::AddI(Reg::Sp, Reg::Sp, frame), AsmInst::Li(Reg::V0, 10), AsmInst::Syscall]
}

fn sum_program() -> Program {
    Program::from_statements(vec![
        Stmt::decl("x", ValueType::Int),
        Stmt::assign("x", Expr::binary(BinOp::Add, Expr::int(2), Expr::int(3))),
        Stmt::print(int_var("x")),
    ])
}

#[test]
fn test_folded_assignment_lives_in_saved_register() {
    let asm = lower(&sum_program(), true).unwrap();
    let mut expected = vec![
        AsmInst::Label("main".to_string()),
        AsmInst::AddI(Reg::Sp, Reg::Sp, -4),
        AsmInst::Li(Reg::S0, 5),
    ];
    expected.extend(print_tail(Reg::S0));
    expected.extend(exit_tail(4));
    assert_eq!(code(&asm), expected);
}

#[test]
fn test_unoptimized_sum_uses_temp_registers() {
    let asm = lower(&sum_program(), false).unwrap();
    let mut expected = vec![
        AsmInst::Label("main".to_string()),
        AsmInst::AddI(Reg::Sp, Reg::Sp, -4),
        AsmInst::Li(Reg::T0, 2),
        AsmInst::Li(Reg::T1, 3),
        AsmInst::Add(Reg::T2, Reg::T0, Reg::T1),
        AsmInst::Move(Reg::S0, Reg::T2),
    ];
    expected.extend(print_tail(Reg::S0));
    expected.extend(exit_tail(4));
    assert_eq!(code(&asm), expected);
}

#[test]
fn test_array_element_address() {
    let program = Program::from_statements(vec![
        Stmt::array_decl("a", ValueType::Int, 5),
        Stmt::array_assign("a", Expr::int(2), Expr::int(7)),
        Stmt::print(Expr::index("a", Expr::int(2))),
    ]);
    let asm = lower(&program, true).unwrap();
    let mut expected = vec![
        AsmInst::Label("main".to_string()),
        AsmInst::AddI(Reg::Sp, Reg::Sp, -20),
        AsmInst::Li(Reg::T0, 8),
        AsmInst::Add(Reg::T0, Reg::T0, Reg::Sp),
        AsmInst::Li(Reg::T1, 7),
        AsmInst::Sw(Reg::T1, Addr::stack(Reg::T0, 0)),
        AsmInst::Li(Reg::T0, 8),
        AsmInst::Add(Reg::T0, Reg::T0, Reg::Sp),
        AsmInst::Lw(Reg::T1, Addr::stack(Reg::T0, 0)),
    ];
    expected.extend(print_tail(Reg::T1));
    expected.extend(exit_tail(20));
    assert_eq!(code(&asm), expected);
}

#[test]
fn test_variable_index_is_scaled() {
    let program = Program::from_statements(vec![
        Stmt::decl("i", ValueType::Int),
        Stmt::array_decl("a", ValueType::Int, 4),
        Stmt::assign("i", Expr::int(3)),
        Stmt::array_assign("a", int_var("i"), Expr::int(1)),
    ]);
    let insts = code(&lower(&program, false).unwrap());
    // a sits after i, at offset 4
    let scaled = [
        AsmInst::Sll(Reg::T0, Reg::S0, 2),
        AsmInst::AddI(Reg::T0, Reg::T0, 4),
        AsmInst::Add(Reg::T0, Reg::T0, Reg::Sp),
    ];
    assert!(insts.windows(3).any(|w| w == scaled), "{:#?}", insts);
}

#[test]
fn test_int_to_float_assignment_widens() {
    let program = Program::from_statements(vec![
        Stmt::decl("x", ValueType::Int),
        Stmt::decl("y", ValueType::Float),
        Stmt::assign("y", int_var("x")),
    ]);
    let insts = code(&lower(&program, true).unwrap());
    let widen = [
        AsmInst::Lw(Reg::S0, Addr::stack(Reg::Sp, 0)),
        AsmInst::Mtc1(Reg::S0, Reg::F(2)),
        AsmInst::CvtSW(Reg::F(2), Reg::F(2)),
        AsmInst::Ss(Reg::F(2), Addr::stack(Reg::Sp, 4)),
    ];
    assert!(insts.windows(4).any(|w| w == widen), "{:#?}", insts);
}

#[test]
fn test_float_to_int_assignment_truncates() {
    let program = Program::from_statements(vec![
        Stmt::decl("f", ValueType::Float),
        Stmt::decl("n", ValueType::Int),
        Stmt::assign("f", Expr::float(2.75)),
        Stmt::assign("n", Expr::var("f", ValueType::Float)),
    ]);
    let asm = lower(&program, false).unwrap();
    assert_eq!(asm.data.float_value("flt_0"), Some(2.75));
    let insts = code(&asm);
    let truncate = [
        AsmInst::Ls(Reg::F(2), Addr::stack(Reg::Sp, 0)),
        AsmInst::TruncWS(Reg::F(3), Reg::F(2)),
        AsmInst::Mfc1(Reg::S0, Reg::F(3)),
    ];
    assert!(insts.windows(3).any(|w| w == truncate), "{:#?}", insts);
}

fn square_fn() -> FunctionDef {
    FunctionDef {
        name: "square".to_string(),
        return_type: ValueType::Int,
        params: vec![Param {
            name: "n".to_string(),
            ty: ValueType::Int,
            is_array: false,
        }],
        body: vec![Stmt::ret(Some(Expr::binary(BinOp::Mul, int_var("n"), int_var("n"))))],
        location: SourceLocation::dummy(),
    }
}

fn main_fn(body: Vec<Stmt>) -> FunctionDef {
    FunctionDef {
        name: "main".to_string(),
        return_type: ValueType::Int,
        params: Vec::new(),
        body,
        location: SourceLocation::dummy(),
    }
}

#[test]
fn test_entry_function_comes_first() {
    let program = Program::new(vec![
        square_fn(),
        main_fn(vec![Stmt::print(Expr::call("square", vec![Expr::int(3)]))]),
    ]);
    let insts = code(&lower(&program, true).unwrap());
    assert_eq!(insts[0], AsmInst::Label("main".to_string()));
    // main has no locals but calls, so it addresses through $fp
    assert_eq!(insts[1], AsmInst::Move(Reg::Fp, Reg::Sp));

    let square = insts
        .iter()
        .position(|inst| *inst == AsmInst::Label("square".to_string()))
        .unwrap();
    assert_eq!(
        insts[square..].to_vec(),
        vec![
            AsmInst::Label("square".to_string()),
            AsmInst::AddI(Reg::Sp, Reg::Sp, -4),
            AsmInst::Sw(Reg::A0, Addr::stack(Reg::Sp, 0)),
            AsmInst::Lw(Reg::S0, Addr::stack(Reg::Sp, 0)),
            AsmInst::Mult(Reg::S0, Reg::S0),
            AsmInst::Mflo(Reg::T0),
            AsmInst::Move(Reg::V0, Reg::T0),
            AsmInst::AddI(Reg::Sp, Reg::Sp, 4),
            AsmInst::Jr(Reg::Ra),
        ]
    );
}

#[test]
fn test_live_temporary_saved_around_call() {
    // print(a * b + square(3))
    let program = Program::new(vec![
        square_fn(),
        main_fn(vec![
            Stmt::decl("a", ValueType::Int),
            Stmt::decl("b", ValueType::Int),
            Stmt::assign("a", Expr::int(2)),
            Stmt::assign("b", Expr::int(5)),
            Stmt::print(Expr::binary(
                BinOp::Add,
                Expr::binary(BinOp::Mul, int_var("a"), int_var("b")),
                Expr::call("square", vec![Expr::int(3)]),
            )),
        ]),
    ]);
    let insts = code(&lower(&program, false).unwrap());
    let jal = insts
        .iter()
        .position(|inst| *inst == AsmInst::Jal("square".to_string()))
        .unwrap();
    assert_eq!(
        insts[jal - 2..jal + 3].to_vec(),
        vec![
            AsmInst::AddI(Reg::Sp, Reg::Sp, -4),
            AsmInst::Sw(Reg::T0, Addr::stack(Reg::Sp, 0)),
            AsmInst::Jal("square".to_string()),
            AsmInst::Lw(Reg::T0, Addr::stack(Reg::Sp, 0)),
            AsmInst::AddI(Reg::Sp, Reg::Sp, 4),
        ]
    );
    // dirty variables are written home before the call
    let before_call = &insts[..jal];
    assert!(before_call.contains(&AsmInst::Sw(Reg::S0, Addr::stack(Reg::Fp, 0))));
    assert!(before_call.contains(&AsmInst::Sw(Reg::S1, Addr::stack(Reg::Fp, 4))));
}

#[test]
fn test_calling_function_saves_return_address() {
    let twice = FunctionDef {
        name: "twice".to_string(),
        return_type: ValueType::Int,
        params: vec![Param {
            name: "k".to_string(),
            ty: ValueType::Int,
            is_array: false,
        }],
        body: vec![Stmt::ret(Some(Expr::call("square", vec![int_var("k")])))],
        location: SourceLocation::dummy(),
    };
    let program = Program::new(vec![
        main_fn(vec![Stmt::print(Expr::call("twice", vec![Expr::int(2)]))]),
        twice,
        square_fn(),
    ]);
    let insts = code(&lower(&program, true).unwrap());
    let start = insts
        .iter()
        .position(|inst| *inst == AsmInst::Label("twice".to_string()))
        .unwrap();
    assert_eq!(
        insts[start + 1..start + 6].to_vec(),
        vec![
            AsmInst::AddI(Reg::Sp, Reg::Sp, -8),
            AsmInst::Sw(Reg::Ra, Addr::stack(Reg::Sp, 4)),
            AsmInst::Sw(Reg::Fp, Addr::stack(Reg::Sp, 0)),
            AsmInst::AddI(Reg::Sp, Reg::Sp, -4),
            AsmInst::Move(Reg::Fp, Reg::Sp),
        ]
    );
    assert!(insts.contains(&AsmInst::Lw(Reg::Ra, Addr::stack(Reg::Sp, 4))));
}

#[test]
fn test_array_argument_passes_address() {
    let first = FunctionDef {
        name: "first".to_string(),
        return_type: ValueType::Int,
        params: vec![Param {
            name: "arr".to_string(),
            ty: ValueType::Int,
            is_array: true,
        }],
        body: vec![Stmt::ret(Some(Expr::index("arr", Expr::int(1))))],
        location: SourceLocation::dummy(),
    };
    let program = Program::new(vec![
        first,
        main_fn(vec![
            Stmt::decl("x", ValueType::Int),
            Stmt::array_decl("data", ValueType::Int, 3),
            Stmt::print(Expr::call("first", vec![int_var("data")])),
        ]),
    ]);
    let insts = code(&lower(&program, true).unwrap());
    assert!(insts.contains(&AsmInst::AddI(Reg::A0, Reg::Fp, 4)));
    // the callee loads the forwarded pointer then offsets it
    let by_ref = [
        AsmInst::Lw(Reg::T0, Addr::stack(Reg::Sp, 0)),
        AsmInst::AddI(Reg::T0, Reg::T0, 4),
    ];
    assert!(insts.windows(2).any(|w| w == by_ref), "{:#?}", insts);
}

#[test]
fn test_float_literals_are_interned_once() {
    let program = Program::from_statements(vec![
        Stmt::print(Expr::float(1.5)),
        Stmt::print(Expr::float(1.5)),
        Stmt::print(Expr::float(0.25)),
    ]);
    let asm = lower(&program, true).unwrap();
    assert_eq!(asm.data.items().len(), 2);
    assert!(code(&asm).contains(&AsmInst::MovS(Reg::F(12), Reg::F(2))));
}

#[test]
fn test_literal_index_out_of_bounds() {
    let program = Program::from_statements(vec![
        Stmt::array_decl("a", ValueType::Int, 3),
        Stmt::array_assign("a", Expr::int(3), Expr::int(1)),
    ]);
    let err = lower(&program, true).unwrap_err();
    assert!(matches!(err, CompilerError::Type { ref message, .. } if message.contains("out of bounds")));
}

#[test]
fn test_more_than_four_arguments_is_unsupported() {
    let params = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|name| Param {
            name: name.to_string(),
            ty: ValueType::Int,
            is_array: false,
        })
        .collect();
    let five = FunctionDef {
        name: "five".to_string(),
        return_type: ValueType::Int,
        params,
        body: vec![Stmt::ret(Some(Expr::int(0)))],
        location: SourceLocation::dummy(),
    };
    let args = (1..=5).map(Expr::int).collect();
    let program = Program::new(vec![main_fn(vec![Stmt::print(Expr::call("five", args))]), five]);
    assert!(matches!(lower(&program, true), Err(CompilerError::Unsupported { .. })));
}

#[test]
fn test_void_result_in_arithmetic_is_type_error() {
    let nothing = FunctionDef {
        name: "nothing".to_string(),
        return_type: ValueType::Void,
        params: Vec::new(),
        body: Vec::new(),
        location: SourceLocation::dummy(),
    };
    let program = Program::new(vec![
        nothing,
        main_fn(vec![Stmt::print(Expr::binary(
            BinOp::Add,
            Expr::int(1),
            Expr::call("nothing", Vec::new()),
        ))]),
    ]);
    assert!(matches!(lower(&program, false), Err(CompilerError::Type { .. })));
}
