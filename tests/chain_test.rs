mod common;
use basic::mach::{Event, Listing, Runtime};
use common::*;

#[test]
fn test_undefined_target_without_chain_is_compile_error() {
    let mut r = Runtime::default();
    r.enter("10 goto 999");
    r.enter("run");
    assert_eq!(exec(&mut r), "Line does not exist in 10 (5..8)\n");
}

#[test]
fn test_any_chain_disables_target_validation() {
    let mut r = Runtime::default();
    r.enter("10 goto 999");
    r.enter("20 chain \"part2\"");
    r.enter("run");
    // No compile error; the bad GOTO is only caught when taken.
    assert_eq!(exec(&mut r), "Line does not exist in 10\n");
}

#[test]
fn test_unreachable_chain_still_disables() {
    let mut r = Runtime::default();
    r.enter("10 print \"go\":end");
    r.enter("20 chain \"never\"");
    r.enter("30 goto 999");
    r.enter("run");
    assert_eq!(exec(&mut r), "go\n");
}

#[test]
fn test_chain_keeps_variables() {
    let mut r = Runtime::default();
    r.enter("10 a=7");
    r.enter("20 chain \"part2\"");
    r.enter("run");
    let event = loop {
        match r.execute(1000) {
            Event::Chain { name, merge, line } => break (name, merge, line),
            Event::Running | Event::Print(..) => {}
            other => panic!("{:?}", other),
        }
    };
    assert_eq!(event, ("part2".to_string(), false, None));
    let mut part2 = Listing::default();
    part2.load_source("10 print a").unwrap();
    r.chain(part2, false, None);
    assert_eq!(exec(&mut r), " 7 \n");
}

#[test]
fn test_chain_merge_overlays_lines() {
    let mut r = Runtime::default();
    r.enter("10 print \"old10\"");
    r.enter("20 print \"old20\"");
    r.enter("30 chain merge \"patch\",10");
    r.enter("run");
    let (merge, line) = loop {
        match r.execute(1000) {
            Event::Chain { merge, line, .. } => break (merge, line),
            Event::Running | Event::Print(..) => {}
            other => panic!("{:?}", other),
        }
    };
    assert!(merge);
    assert_eq!(line, Some(10));
    let mut patch = Listing::default();
    patch.load_source("20 print \"new20\"\n40 end").unwrap();
    r.chain(patch, true, Some(10));
    assert_eq!(exec(&mut r), "old10\nnew20\n");
}

#[test]
fn test_run_file_event() {
    let mut r = Runtime::default();
    r.enter("run \"game\"");
    let mut saw = None;
    loop {
        match r.execute(100) {
            Event::Run(name) => {
                saw = Some(name);
                break;
            }
            Event::Running => {}
            Event::Stopped => break,
            other => panic!("{:?}", other),
        }
    }
    assert_eq!(saw.as_deref(), Some("game"));
    let mut game = Listing::default();
    game.load_source("10 print \"loaded\"").unwrap();
    r.set_listing(game, true);
    assert_eq!(exec(&mut r), "loaded\n");
}
