use super::*;

#[test]
fn test_precedence() {
    let mut r = Runtime::default();
    r.enter("print 2+3*4");
    assert_eq!(run(&mut r), " 14 \n");
}

#[test]
fn test_division_yields_real() {
    let mut r = Runtime::default();
    r.enter("print 7/2");
    assert_eq!(run(&mut r), " 3.5 \n");
}

#[test]
fn test_integer_division_and_modulo() {
    let mut r = Runtime::default();
    r.enter("print 7\\2;7 mod 2");
    assert_eq!(run(&mut r), " 3  1 \n");
}

#[test]
fn test_comparisons_are_integers() {
    let mut r = Runtime::default();
    r.enter("print (1<2);(2<1)");
    assert_eq!(run(&mut r), "-1  0 \n");
}

#[test]
fn test_not_binds_below_comparison() {
    let mut r = Runtime::default();
    r.enter("print not 1=2");
    assert_eq!(run(&mut r), "-1 \n");
}

#[test]
fn test_string_concat() {
    let mut r = Runtime::default();
    r.enter("print \"AB\"+\"CD\"");
    assert_eq!(run(&mut r), "ABCD\n");
}

#[test]
fn test_hex_and_binary_literals() {
    let mut r = Runtime::default();
    r.enter("print &HFF;&X101;&10");
    assert_eq!(run(&mut r), " 255  5  16 \n");
}

#[test]
fn test_builtins() {
    let mut r = Runtime::default();
    r.enter("print len(\"HELLO\");abs(-4);max(1,7,3)");
    assert_eq!(run(&mut r), " 5  4  7 \n");
}

#[test]
fn test_string_functions() {
    let mut r = Runtime::default();
    r.enter("print upper$(\"hi\")+left$(\"LOCOMOTIVE\",4)");
    assert_eq!(run(&mut r), "HILOCO\n");
}

#[test]
fn test_division_by_zero() {
    let mut r = Runtime::default();
    r.enter("print 1/0");
    assert_eq!(run(&mut r), "Division by zero\n");
}

#[test]
fn test_def_fn() {
    let mut r = Runtime::default();
    r.enter("10 def fndouble(x)=x*2");
    r.enter("20 print fndouble(21)");
    r.enter("run");
    assert_eq!(run(&mut r), " 42 \n");
}

#[test]
fn test_fn_before_def_is_error() {
    let mut r = Runtime::default();
    r.enter("10 print fnx(1)");
    r.enter("20 def fnx(x)=x");
    r.enter("run");
    assert_eq!(run(&mut r), "Unknown user function in 10\n");
}
