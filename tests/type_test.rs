mod common;
use basic::mach::Runtime;
use common::*;

#[test]
fn test_real_narrows_into_integer_target() {
    let mut r = Runtime::default();
    r.enter("10 a%=1.5");
    r.enter("20 print a%");
    r.enter("run");
    assert_eq!(exec(&mut r), " 2 \n");
}

#[test]
fn test_string_into_numeric_is_compile_error() {
    let mut r = Runtime::default();
    r.enter("10 a%=\"x\"");
    r.enter("run");
    assert_eq!(exec(&mut r), "Type mismatch in 10 (3..6)\n");
}

#[test]
fn test_numeric_into_string_is_compile_error() {
    let mut r = Runtime::default();
    r.enter("10 a$=1");
    r.enter("run");
    assert_eq!(exec(&mut r), "Type mismatch in 10 (3..4)\n");
}

#[test]
fn test_mixed_concat_is_compile_error() {
    let mut r = Runtime::default();
    r.enter("10 a=1+\"x\"");
    r.enter("run");
    let out = exec(&mut r);
    assert!(out.starts_with("Type mismatch in 10"), "{}", out);
}

#[test]
fn test_defint_ranges_type_bare_names() {
    let mut r = Runtime::default();
    r.enter("10 defint i-k");
    r.enter("20 i=1.9");
    r.enter("30 print i");
    r.enter("run");
    assert_eq!(exec(&mut r), " 2 \n");
}

#[test]
fn test_defstr_makes_bare_name_a_string() {
    let mut r = Runtime::default();
    r.enter("10 defstr s");
    r.enter("20 s=\"words\"");
    r.enter("30 print s");
    r.enter("run");
    assert_eq!(exec(&mut r), "words\n");
}

#[test]
fn test_sigil_overrides_def_range() {
    let mut r = Runtime::default();
    r.enter("10 defint x");
    r.enter("20 x!=1.5");
    r.enter("30 print x!");
    r.enter("run");
    assert_eq!(exec(&mut r), " 1.5 \n");
}

#[test]
fn test_int_ops_round_real_operands() {
    let mut r = Runtime::default();
    r.enter("10 print 7.6\\2;7.6 mod 2");
    r.enter("run");
    assert_eq!(exec(&mut r), " 4  0 \n");
}

#[test]
fn test_string_comparison_allowed() {
    let mut r = Runtime::default();
    r.enter("10 if \"A\"<\"B\" then print \"yes\"");
    r.enter("run");
    assert_eq!(exec(&mut r), "yes\n");
}

#[test]
fn test_for_with_string_var_is_compile_error() {
    let mut r = Runtime::default();
    r.enter("10 for a$=1 to 2:next");
    r.enter("run");
    let out = exec(&mut r);
    assert!(out.starts_with("Type mismatch in 10"), "{}", out);
}
