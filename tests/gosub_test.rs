mod common;
use basic::mach::Runtime;
use common::*;

#[test]
fn test_gosub_return() {
    let mut r = Runtime::default();
    r.enter("10 gosub 100");
    r.enter("20 print \"after\"");
    r.enter("30 end");
    r.enter("100 print \"sub\"");
    r.enter("110 return");
    r.enter("run");
    assert_eq!(exec(&mut r), "sub\nafter\n");
}

#[test]
fn test_gosub_stack_empties() {
    let mut r = Runtime::default();
    r.enter("10 gosub 100");
    r.enter("20 end");
    r.enter("100 return");
    r.enter("run");
    assert_eq!(exec(&mut r), "");
    // A RETURN after the stack emptied is the unexpected one.
    r.enter("10 gosub 100:return");
    r.enter("run");
    assert_eq!(exec(&mut r), "Unexpected RETURN in 10\n");
}

#[test]
fn test_nested_gosub() {
    let mut r = Runtime::default();
    r.enter("10 gosub 100");
    r.enter("20 print \"top\"");
    r.enter("30 end");
    r.enter("100 gosub 200");
    r.enter("110 print \"one\"");
    r.enter("120 return");
    r.enter("200 print \"two\"");
    r.enter("210 return");
    r.enter("run");
    assert_eq!(exec(&mut r), "two\none\ntop\n");
}

#[test]
fn test_return_without_gosub() {
    let mut r = Runtime::default();
    r.enter("10 return");
    r.enter("run");
    assert_eq!(exec(&mut r), "Unexpected RETURN in 10\n");
}

#[test]
fn test_unmatched_return_leaves_stack_usable() {
    let mut r = Runtime::default();
    r.enter("10 on error goto 100");
    r.enter("20 return");
    r.enter("30 gosub 60");
    r.enter("40 print \"ok\"");
    r.enter("50 end");
    r.enter("60 return");
    r.enter("100 resume next");
    r.enter("run");
    assert_eq!(exec(&mut r), "ok\n");
}

#[test]
fn test_on_gosub_selects() {
    let mut r = Runtime::default();
    r.enter("10 for i=0 to 3");
    r.enter("20 on i gosub 100,200");
    r.enter("30 next");
    r.enter("40 end");
    r.enter("100 print \"one\":return");
    r.enter("200 print \"two\":return");
    r.enter("run");
    // 0 and 3 fall through without a branch.
    assert_eq!(exec(&mut r), "one\ntwo\n");
}

#[test]
fn test_on_goto_selects() {
    let mut r = Runtime::default();
    r.enter("10 x=2");
    r.enter("20 on x goto 100,200");
    r.enter("30 print \"fell\":end");
    r.enter("100 print \"one\":end");
    r.enter("200 print \"two\":end");
    r.enter("run");
    assert_eq!(exec(&mut r), "two\n");
}
