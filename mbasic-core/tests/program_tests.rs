//! 程序执行测试
//!
//! 端到端测试：编译并逐语句执行完整的 MBASIC 程序

mod common;
use common::{fault_of, output_of, run_code, run_with_input, run_with_store, ExecError};
use mbasic_core::parser::Var;
use mbasic_core::{FaultKind, Halt, Value};
use mbasic_vfs::MemoryStore;

// ===== 表达式与输出格式 =====

#[test]
fn test_operator_precedence() {
    assert_eq!(output_of("10 PRINT 2 + 3 * 4; (2 + 3) * 4"), " 14  20 \n");
    assert_eq!(output_of("10 PRINT -2 ^ 2"), "-4 \n");
    assert_eq!(output_of("10 PRINT 10 - 4 - 3"), " 3 \n");
}

#[test]
fn test_number_formatting() {
    assert_eq!(output_of("10 PRINT 1 / 3"), " .3333333 \n");
    assert_eq!(output_of("10 PRINT 1234567"), " 1234567 \n");
    assert_eq!(output_of("10 PRINT 10000000"), " 1E+07 \n");
    assert_eq!(output_of("10 PRINT .001; .0001"), " .001  1E-04 \n");
    assert_eq!(output_of("10 PRINT -.5"), "-.5 \n");
}

#[test]
fn test_comparison_and_logic() {
    assert_eq!(output_of("10 PRINT 1 < 2; 2 < 1"), "-1  0 \n");
    assert_eq!(output_of("10 PRINT NOT 0; 6 AND 3; 4 OR 1"), "-1  2  5 \n");
    assert_eq!(output_of("10 PRINT 7 MOD 3"), " 1 \n");
}

// ===== 字符串函数 =====

#[test]
fn test_string_functions() {
    let source = "10 A$ = \"HELLO\"\n\
                  20 PRINT LEFT$(A$, 2); RIGHT$(A$, 3); MID$(A$, 2, 2); LEN(A$)";
    assert_eq!(output_of(source), "HELLOEL 5 \n");
}

#[test]
fn test_conversion_functions() {
    assert_eq!(output_of("10 PRINT STR$(5); \"|\"; VAL(\"12abc\")"), " 5| 12 \n");
    assert_eq!(output_of("10 PRINT CHR$(65); ASC(\"B\")"), "A 66 \n");
    assert_eq!(output_of("10 PRINT INT(-2.5); ABS(-3); SGN(-9)"), "-3  3 -1 \n");
}

// ===== 控制流 =====

#[test]
fn test_if_then_else() {
    let source = "10 X = 5\n\
                  20 IF X > 3 THEN PRINT \"BIG\" ELSE PRINT \"SMALL\"\n\
                  30 IF X > 9 THEN PRINT \"HUGE\"\n\
                  40 PRINT \"END\"";
    assert_eq!(output_of(source), "BIG\nEND\n");
}

#[test]
fn test_if_then_line_number() {
    let source = "10 IF 1 THEN 40\n20 PRINT \"SKIPPED\"\n40 PRINT \"HERE\"";
    assert_eq!(output_of(source), "HERE\n");
}

#[test]
fn test_gosub_return() {
    let result = run_code(
        "10 GOSUB 100\n\
         20 PRINT \"BACK\"\n\
         30 END\n\
         100 PRINT \"SUB\"\n\
         110 RETURN",
    )
    .unwrap();
    assert_eq!(result.output, "SUB\nBACK\n");
    assert_eq!(result.halt, Halt::End);
}

#[test]
fn test_for_with_step() {
    assert_eq!(
        output_of("10 FOR I = 10 TO 1 STEP -4: PRINT I;: NEXT: PRINT"),
        " 10  6  2 \n"
    );
}

#[test]
fn test_lines_run_in_number_order() {
    assert_eq!(output_of("30 PRINT 3\n10 PRINT 1\n20 PRINT 2"), " 1 \n 2 \n 3 \n");
}

#[test]
fn test_stop_reports_break() {
    let result = run_code("10 PRINT 1\n20 STOP\n30 PRINT 2").unwrap();
    assert_eq!(result.halt, Halt::Stop);
    assert_eq!(result.output, " 1 \nBreak in 20\n");
}

// ===== 运行时错误 =====

#[test]
fn test_runtime_error_carries_line() {
    let fault = fault_of("10 PRINT 1\n20 X = 1 / 0");
    assert_eq!(fault.line, 20);
    assert_eq!(fault.kind, FaultKind::DivisionByZero);
    assert_eq!(fault.to_string(), "Division by zero in 20");
}

#[test]
fn test_error_codes() {
    assert_eq!(fault_of("10 RETURN").code(), 3);
    assert_eq!(fault_of("10 GOTO 50").code(), 8);
    assert_eq!(fault_of("10 A$ = 5").code(), 13);
    assert_eq!(fault_of("10 PRINT SQR(-1)").code(), 5);
}

#[test]
fn test_output_before_error_is_kept() {
    match run_code("10 PRINT \"A\"\n20 NEXT") {
        Err(ExecError::Runtime { fault, output }) => {
            assert_eq!(fault.kind, FaultKind::NextWithoutFor);
            assert_eq!(output, "A\n");
        }
        other => panic!("unexpected {:?}", other),
    }
}

// ===== 输入 =====

#[test]
fn test_input_with_prompt() {
    let result = run_with_input("10 INPUT \"AGE\"; A\n20 PRINT A * 2", &["21"]).unwrap();
    assert_eq!(result.output, "AGE?  42 \n");
}

#[test]
fn test_input_without_data_suspends() {
    match run_code("10 PRINT \"X\"\n20 INPUT A") {
        Err(ExecError::Suspended { output }) => assert_eq!(output, "X\n? "),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_line_input_keeps_commas() {
    let result = run_with_input("10 LINE INPUT L$", &["a, b, c"]).unwrap();
    assert_eq!(
        result.machine.variable(&Var::new("L$")),
        Value::Str("a, b, c".into())
    );
}

// ===== 文件 =====

#[test]
fn test_read_prepared_file() {
    let store = MemoryStore::with_files([("IN.TXT", b"10,20\n30\n".to_vec())]);
    let source = "10 OPEN \"I\", #1, \"IN.TXT\"\n\
                  20 IF EOF(1) THEN 60\n\
                  30 INPUT #1, N\n\
                  40 S = S + N\n\
                  50 GOTO 20\n\
                  60 CLOSE #1\n\
                  70 PRINT S";
    let result = run_with_store(source, &[], &store).unwrap();
    assert_eq!(result.output, " 60 \n");
}

#[test]
fn test_written_file_lands_in_store() {
    let store = MemoryStore::new();
    let source = "10 OPEN \"OUT.TXT\" FOR OUTPUT AS #1\n\
                  20 FOR I = 1 TO 3: PRINT #1, I;: NEXT\n\
                  30 PRINT #1, \"\"\n\
                  40 END";
    run_with_store(source, &[], &store).unwrap();
    assert_eq!(store.get("OUT.TXT"), Some(b" 1  2  3 \n".to_vec()));
}

#[test]
fn test_missing_file_is_error_53() {
    let fault = fault_of("10 OPEN \"I\", #1, \"NOPE.TXT\"");
    assert_eq!(fault.code(), 53);
    assert_eq!(fault.line, 10);
}
