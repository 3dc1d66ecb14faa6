mod common;
use basic::mach::{Event, Runtime};
use common::*;

#[test]
fn test_stop_then_cont() {
    let mut r = Runtime::default();
    r.enter("10 print 1:stop:print 2");
    r.enter("run");
    assert_eq!(exec(&mut r), " 1 \nBreak in 10\n");
    r.enter("cont");
    assert_eq!(exec(&mut r), " 2 \n");
}

#[test]
fn test_cont_without_stop() {
    let mut r = Runtime::default();
    r.enter("cont");
    assert_eq!(exec(&mut r), "Cannot CONTinue\n");
}

#[test]
fn test_editing_forgets_continue_point() {
    let mut r = Runtime::default();
    r.enter("10 stop");
    r.enter("run");
    assert_eq!(exec(&mut r), "Break in 10\n");
    r.enter("20 print 2");
    r.enter("cont");
    assert_eq!(exec(&mut r), "Cannot CONTinue\n");
}

#[test]
fn test_break_key_stops_run() {
    let mut r = Runtime::default();
    r.enter("10 goto 10");
    r.enter("run");
    assert_eq!(r.execute(50), Event::Running);
    r.break_key();
    let event = r.execute(50);
    assert!(matches!(event, Event::Break(Some(10))), "{:?}", event);
    assert_eq!(r.execute(50), Event::Stopped);
    // And the loop picks up where it left off.
    r.enter("cont");
    assert_eq!(r.execute(50), Event::Running);
}

#[test]
fn test_on_break_cont_ignores_key() {
    let mut r = Runtime::default();
    r.enter("10 on break cont");
    r.enter("20 for i=1 to 3:print i:next");
    r.enter("run");
    assert_eq!(r.execute(10), Event::Running);
    r.break_key();
    assert_eq!(exec(&mut r), " 1 \n 2 \n 3 \n");
}

#[test]
fn test_on_break_gosub_runs_handler() {
    let mut r = Runtime::default();
    r.enter("10 on break gosub 100");
    r.enter("20 for i=1 to 50:frame:next");
    r.enter("30 print b");
    r.enter("40 end");
    r.enter("100 b=b+1:return");
    r.enter("run");
    let mut out = String::new();
    let mut pressed = false;
    loop {
        match r.execute(100) {
            Event::Stopped => break,
            Event::Print(_, s) => out.push_str(&s),
            Event::Frame => {
                if !pressed {
                    r.break_key();
                    pressed = true;
                }
                r.frame();
            }
            Event::Running => {}
            other => panic!("{:?}", other),
        }
    }
    assert_eq!(out, " 1 \n");
}

#[test]
fn test_escape_overrides_frame_wait() {
    let mut r = Runtime::default();
    r.enter("10 frame:goto 10");
    r.enter("run");
    assert_eq!(r.execute(50), Event::Frame);
    r.break_key();
    let event = r.execute(50);
    assert!(matches!(event, Event::Break(_)), "{:?}", event);
}
