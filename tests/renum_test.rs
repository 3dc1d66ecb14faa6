mod common;
use basic::mach::Runtime;
use common::*;

#[test]
fn test_renum_shifts_targets() {
    let mut r = Runtime::default();
    r.enter("10 goto 20");
    r.enter("20 print \"A\"");
    r.enter("renum 100,1,10");
    assert_eq!(exec(&mut r), "");
    r.enter("list");
    assert_eq!(exec(&mut r), "100 GOTO 110\n110 PRINT \"A\"\n");
}

#[test]
fn test_renum_defaults() {
    let mut r = Runtime::default();
    r.enter("5 gosub 7");
    r.enter("7 return");
    r.enter("renum");
    assert_eq!(exec(&mut r), "");
    r.enter("list");
    assert_eq!(exec(&mut r), "10 GOSUB 20\n20 RETURN\n");
}

#[test]
fn test_renum_keep_leaves_tail_alone() {
    let mut r = Runtime::default();
    r.enter("10 goto 500");
    r.enter("20 goto 10");
    r.enter("500 end");
    r.enter("renum 100,1,10,500");
    assert_eq!(exec(&mut r), "");
    r.enter("list");
    assert_eq!(exec(&mut r), "100 GOTO 500\n110 GOTO 100\n500 END\n");
}

#[test]
fn test_renum_missing_target_reports_and_preserves() {
    let mut r = Runtime::default();
    r.enter("10 goto 99");
    r.enter("20 end");
    r.enter("renum 100,1,10");
    assert_eq!(exec(&mut r), "Line does not exist in 10\n");
    r.enter("list");
    assert_eq!(exec(&mut r), "10 GOTO 99\n20 END\n");
}

#[test]
fn test_renum_collision_reports() {
    let mut r = Runtime::default();
    r.enter("10 end");
    r.enter("20 end");
    r.enter("500 end");
    r.enter("renum 490,1,10,500");
    let out = exec(&mut r);
    assert!(out.starts_with("Improper argument"), "{}", out);
}

#[test]
fn test_on_lists_and_restore_follow() {
    let mut r = Runtime::default();
    r.enter("10 on x gosub 30,40");
    r.enter("20 restore 50");
    r.enter("30 return");
    r.enter("40 return");
    r.enter("50 data 1");
    r.enter("renum 1000,1,5");
    assert_eq!(exec(&mut r), "");
    r.enter("list");
    assert_eq!(
        exec(&mut r),
        "1000 ON X GOSUB 1010,1015\n1005 RESTORE 1020\n1010 RETURN\n1015 RETURN\n1020 DATA 1\n"
    );
}
