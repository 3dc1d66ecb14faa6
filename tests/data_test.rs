mod common;
use basic::mach::Runtime;
use common::*;

#[test]
fn test_read_in_pool_order() {
    let mut r = Runtime::default();
    r.enter("10 data 1,2");
    r.enter("20 read a,b:print a+b");
    r.enter("30 data 4");
    r.enter("40 read c:print c");
    r.enter("run");
    assert_eq!(exec(&mut r), " 3 \n 4 \n");
}

#[test]
fn test_data_is_not_executed_in_place() {
    let mut r = Runtime::default();
    r.enter("10 goto 30");
    r.enter("20 data 7");
    r.enter("30 read a:print a");
    r.enter("run");
    assert_eq!(exec(&mut r), " 7 \n");
}

#[test]
fn test_restore_to_line() {
    let mut r = Runtime::default();
    r.enter("10 data 1");
    r.enter("20 data 2");
    r.enter("30 read a:restore 20:read b");
    r.enter("40 print a;b");
    r.enter("run");
    assert_eq!(exec(&mut r), " 1  2 \n");
}

#[test]
fn test_restore_rewinds_to_start() {
    let mut r = Runtime::default();
    r.enter("10 data 9");
    r.enter("20 read a:restore:read b");
    r.enter("30 print a;b");
    r.enter("run");
    assert_eq!(exec(&mut r), " 9  9 \n");
}

#[test]
fn test_data_exhausted() {
    let mut r = Runtime::default();
    r.enter("10 data 1");
    r.enter("20 read a,b");
    r.enter("run");
    assert_eq!(exec(&mut r), "DATA exhausted in 20\n");
}

#[test]
fn test_string_and_numeric_targets() {
    let mut r = Runtime::default();
    r.enter("10 data hello there,42");
    r.enter("20 read a$,n");
    r.enter("30 print a$;n");
    r.enter("run");
    assert_eq!(exec(&mut r), "hello there 42 \n");
}

#[test]
fn test_numeric_target_rejects_text() {
    let mut r = Runtime::default();
    r.enter("10 data pickles");
    r.enter("20 read n");
    r.enter("run");
    assert_eq!(exec(&mut r), "Type mismatch in 20\n");
}

#[test]
fn test_restore_to_missing_line_is_compile_error() {
    let mut r = Runtime::default();
    r.enter("10 restore 99");
    r.enter("run");
    assert_eq!(exec(&mut r), "Line does not exist in 10 (8..10)\n");
}
