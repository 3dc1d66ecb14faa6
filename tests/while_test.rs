mod common;
use basic::mach::Runtime;
use common::*;

#[test]
fn test_while_wend() {
    let mut r = Runtime::default();
    r.enter("10 a=0");
    r.enter("20 while a<3");
    r.enter("30 a=a+1:print a");
    r.enter("40 wend");
    r.enter("run");
    assert_eq!(exec(&mut r), " 1 \n 2 \n 3 \n");
}

#[test]
fn test_while_false_skips_body() {
    let mut r = Runtime::default();
    r.enter("10 while 0:print \"never\":wend");
    r.enter("20 print \"past\"");
    r.enter("run");
    assert_eq!(exec(&mut r), "past\n");
}

#[test]
fn test_nested_while() {
    let mut r = Runtime::default();
    r.enter("10 a=0");
    r.enter("20 while a<2:a=a+1:b=0");
    r.enter("30 while b<2:b=b+1:print a;b");
    r.enter("40 wend");
    r.enter("50 wend");
    r.enter("run");
    assert_eq!(exec(&mut r), " 1  1 \n 1  2 \n 2  1 \n 2  2 \n");
}

#[test]
fn test_wend_without_while_is_compile_error() {
    let mut r = Runtime::default();
    r.enter("10 wend");
    r.enter("run");
    assert_eq!(exec(&mut r), "Unexpected WEND in 10 (0..4)\n");
}

#[test]
fn test_while_without_wend_is_compile_error() {
    let mut r = Runtime::default();
    r.enter("10 while 1");
    r.enter("run");
    assert_eq!(exec(&mut r), "WEND missing in 10 (0..5)\n");
}

#[test]
fn test_jump_to_wend_reports() {
    let mut r = Runtime::default();
    r.enter("10 goto 40");
    r.enter("20 while 1");
    r.enter("30 print \"body\"");
    r.enter("40 wend");
    r.enter("run");
    assert_eq!(exec(&mut r), "Unexpected WEND in 40\n");
}
