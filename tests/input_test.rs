mod common;
use basic::mach::Runtime;
use common::*;

#[test]
fn test_input_assigns_and_resumes() {
    let mut r = Runtime::default();
    r.enter("10 input a");
    r.enter("20 print a*2");
    r.enter("run");
    assert_eq!(exec(&mut r), "? ");
    r.enter("21");
    assert_eq!(exec(&mut r), " 42 \n");
}

#[test]
fn test_input_prompt_text() {
    let mut r = Runtime::default();
    r.enter("10 input \"how many\";n");
    r.enter("20 print n");
    r.enter("run");
    assert_eq!(exec(&mut r), "how many? ");
    r.enter("3");
    assert_eq!(exec(&mut r), " 3 \n");
}

#[test]
fn test_input_multiple_fields() {
    let mut r = Runtime::default();
    r.enter("10 input a,b$,c");
    r.enter("20 print a;b$;c");
    r.enter("run");
    assert_eq!(exec(&mut r), "? ");
    r.enter("1, two ,3");
    assert_eq!(exec(&mut r), " 1 two 3 \n");
}

#[test]
fn test_bad_reply_asks_again() {
    let mut r = Runtime::default();
    r.enter("10 input n");
    r.enter("20 print n");
    r.enter("run");
    assert_eq!(exec(&mut r), "? ");
    r.enter("pickles");
    assert_eq!(exec(&mut r), "?Redo from start\n? ");
    r.enter("5");
    assert_eq!(exec(&mut r), " 5 \n");
}

#[test]
fn test_short_reply_asks_again() {
    let mut r = Runtime::default();
    r.enter("10 input a,b");
    r.enter("20 print a+b");
    r.enter("run");
    assert_eq!(exec(&mut r), "? ");
    r.enter("1");
    assert_eq!(exec(&mut r), "?Redo from start\n? ");
    r.enter("1,2");
    assert_eq!(exec(&mut r), " 3 \n");
}

#[test]
fn test_quoted_reply_field_keeps_comma() {
    let mut r = Runtime::default();
    r.enter("10 input a$");
    r.enter("20 print a$");
    r.enter("run");
    assert_eq!(exec(&mut r), "? ");
    r.enter("\"a, b\"");
    assert_eq!(exec(&mut r), "a, b\n");
}

#[test]
fn test_inkey_returns_buffered_keys() {
    let mut r = Runtime::default();
    r.enter("10 a$=inkey$:b$=inkey$");
    r.enter("20 print a$;b$;len(inkey$)");
    r.put_key('x');
    r.enter("run");
    assert_eq!(exec(&mut r), "x 0 \n");
}
