mod common;
use basic::mach::{Event, Runtime};
use common::*;

#[test]
fn test_if_then_else() {
    let mut r = Runtime::default();
    r.enter("if 0 then ? \"one\" else ? \"two\";:?2");
    assert_eq!(exec(&mut r), "two 2 \n");
    r.enter("if 1 then ? \"one\" else ? \"two\":?2");
    assert_eq!(exec(&mut r), "one\n");
}

#[test]
fn test_if_goto_shorthand() {
    let mut r = Runtime::default();
    r.enter("10 if 1 then 30");
    r.enter("20 print \"no\"");
    r.enter("30 print \"yes\"");
    r.enter("run");
    assert_eq!(exec(&mut r), "yes\n");
}

#[test]
fn test_print_zones() {
    let mut r = Runtime::default();
    r.enter("print 1,2");
    assert_eq!(exec(&mut r), " 1            2 \n");
}

#[test]
fn test_print_semicolon_suppresses_newline() {
    let mut r = Runtime::default();
    r.enter("10 print \"a\";");
    r.enter("20 print \"b\"");
    r.enter("run");
    assert_eq!(exec(&mut r), "ab\n");
}

#[test]
fn test_arrays() {
    let mut r = Runtime::default();
    r.enter("10 dim a(3,3)");
    r.enter("20 a(1,2)=7:a(2,1)=9");
    r.enter("30 print a(1,2);a(2,1);a(0,0)");
    r.enter("run");
    assert_eq!(exec(&mut r), " 7  9  0 \n");
}

#[test]
fn test_subscript_out_of_range() {
    let mut r = Runtime::default();
    r.enter("10 dim a(2)");
    r.enter("20 a(3)=1");
    r.enter("run");
    assert_eq!(exec(&mut r), "Subscript out of range in 20\n");
}

#[test]
fn test_string_array() {
    let mut r = Runtime::default();
    r.enter("10 dim w$(2)");
    r.enter("20 w$(1)=\"hi\"");
    r.enter("30 print w$(1);w$(2)");
    r.enter("run");
    assert_eq!(exec(&mut r), "hi\n");
}

#[test]
fn test_clear_resets_variables() {
    let mut r = Runtime::default();
    r.enter("10 a=5:clear:print a");
    r.enter("run");
    assert_eq!(exec(&mut r), " 0 \n");
}

#[test]
fn test_new_discards_program() {
    let mut r = Runtime::default();
    r.enter("10 print 1");
    r.enter("new");
    assert_eq!(exec(&mut r), "");
    r.enter("list");
    assert_eq!(exec(&mut r), "");
}

#[test]
fn test_list_is_canonical() {
    let mut r = Runtime::default();
    r.enter("10 print   1+2");
    r.enter("20 goto 10");
    r.enter("list");
    assert_eq!(exec(&mut r), "10 PRINT 1+2\n20 GOTO 10\n");
    r.enter("list 20");
    assert_eq!(exec(&mut r), "20 GOTO 10\n");
}

#[test]
fn test_cls_and_mode_reach_host() {
    let mut r = Runtime::default();
    r.enter("10 mode 1:cls");
    r.enter("run");
    assert_eq!(r.execute(100), Event::Mode(1));
    assert_eq!(r.execute(100), Event::Cls);
}

#[test]
fn test_tron_traces_lines() {
    let mut r = Runtime::default();
    r.enter("10 tron");
    r.enter("20 print 5");
    r.enter("30 troff");
    r.enter("run");
    assert_eq!(exec(&mut r), "[20] 5 \n[30]");
}

#[test]
fn test_deleting_a_line() {
    let mut r = Runtime::default();
    r.enter("10 print 1");
    r.enter("20 print 2");
    r.enter("20");
    r.enter("run");
    assert_eq!(exec(&mut r), " 1 \n");
}

#[test]
fn test_goto_direct_mode_enters_program() {
    let mut r = Runtime::default();
    r.enter("10 print \"skipped\"");
    r.enter("20 print \"target\":end");
    r.enter("30 goto 20");
    r.enter("goto 20");
    assert_eq!(exec(&mut r), "target\n");
}

#[test]
fn test_address_of_is_stable() {
    let mut r = Runtime::default();
    r.enter("10 a=1:b=2");
    r.enter("20 print (@a=@a);(@a=@b)");
    r.enter("run");
    assert_eq!(exec(&mut r), "-1  0 \n");
}
