mod common;
use basic::mach::Runtime;
use common::*;

#[test]
fn test_handler_catches_division_by_zero() {
    let mut r = Runtime::default();
    r.enter("10 on error goto 100");
    r.enter("20 print 1/0");
    r.enter("30 end");
    r.enter("100 print \"ERR\"");
    r.enter("110 end");
    r.enter("run");
    assert_eq!(exec(&mut r), "ERR\n");
}

#[test]
fn test_err_and_erl_report_the_failure() {
    let mut r = Runtime::default();
    r.enter("10 on error goto 100");
    r.enter("20 print 1/0");
    r.enter("30 end");
    r.enter("100 print err;erl");
    r.enter("110 end");
    r.enter("run");
    assert_eq!(exec(&mut r), " 11  20 \n");
}

#[test]
fn test_resume_retries_the_failing_line() {
    let mut r = Runtime::default();
    r.enter("10 on error goto 100");
    r.enter("20 x=x+1:if x<3 then y=1/0");
    r.enter("30 print x");
    r.enter("40 end");
    r.enter("100 resume");
    r.enter("run");
    assert_eq!(exec(&mut r), " 3 \n");
}

#[test]
fn test_resume_next_continues_after() {
    let mut r = Runtime::default();
    r.enter("10 on error goto 100");
    r.enter("20 print 1/0");
    r.enter("30 print \"next\"");
    r.enter("40 end");
    r.enter("100 resume next");
    r.enter("run");
    assert_eq!(exec(&mut r), "next\n");
}

#[test]
fn test_resume_line_number() {
    let mut r = Runtime::default();
    r.enter("10 on error goto 100");
    r.enter("20 print 1/0");
    r.enter("30 print \"skipped\"");
    r.enter("40 end");
    r.enter("100 resume 40");
    r.enter("run");
    assert_eq!(exec(&mut r), "");
}

#[test]
fn test_resume_without_error() {
    let mut r = Runtime::default();
    r.enter("10 resume");
    r.enter("run");
    assert_eq!(exec(&mut r), "Unexpected RESUME in 10\n");
}

#[test]
fn test_second_error_in_handler_is_terminal() {
    let mut r = Runtime::default();
    r.enter("10 on error goto 100");
    r.enter("20 print 1/0");
    r.enter("30 end");
    r.enter("100 print 1/0");
    r.enter("110 resume next");
    r.enter("run");
    assert_eq!(exec(&mut r), "Division by zero in 100\n");
}

#[test]
fn test_on_error_goto_zero_disables() {
    let mut r = Runtime::default();
    r.enter("10 on error goto 100");
    r.enter("20 on error goto 0");
    r.enter("30 print 1/0");
    r.enter("40 end");
    r.enter("100 print \"caught\":resume next");
    r.enter("run");
    assert_eq!(exec(&mut r), "Division by zero in 30\n");
}

#[test]
fn test_handler_not_entered_silently_reports_nothing_extra() {
    let mut r = Runtime::default();
    r.enter("10 on error goto 100");
    r.enter("20 out = 1");
    r.enter("30 print \"done\"");
    r.enter("40 end");
    r.enter("100 print \"handler\":resume next");
    r.enter("run");
    assert_eq!(exec(&mut r), "done\n");
}
