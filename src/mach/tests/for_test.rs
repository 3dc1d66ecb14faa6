use super::*;

#[test]
fn test_simple_loop() {
    let mut r = Runtime::default();
    r.enter("10 for i=1 to 3");
    r.enter("20 print i");
    r.enter("30 next i");
    r.enter("run");
    assert_eq!(run(&mut r), " 1 \n 2 \n 3 \n");
}

#[test]
fn test_breaking_out_of_loop_with_goto() {
    let mut r = Runtime::default();
    r.enter("10 for y=1 to 2");
    r.enter("20 for x=8 to 9");
    r.enter("30 print y;x");
    r.enter("40 goto 60");
    r.enter("50 next x");
    r.enter("60 next y");
    r.enter("run");
    assert_eq!(run(&mut r), " 1  8 \n 2  8 \n");
}

#[test]
fn test_negative_step() {
    let mut r = Runtime::default();
    r.enter("10 for i=3 to 1 step -1:print i:next i");
    r.enter("run");
    assert_eq!(run(&mut r), " 3 \n 2 \n 1 \n");
}

#[test]
fn test_non_constant_bounds_cached() {
    let mut r = Runtime::default();
    r.enter("10 n=3");
    r.enter("20 for i=1 to n");
    r.enter("30 n=0");
    r.enter("40 print i");
    r.enter("50 next");
    r.enter("run");
    assert_eq!(run(&mut r), " 1 \n 2 \n 3 \n");
}

#[test]
fn test_zero_trip_loop() {
    let mut r = Runtime::default();
    r.enter("10 for i=5 to 1:print i:next");
    r.enter("20 print \"done\"");
    r.enter("run");
    assert_eq!(run(&mut r), "done\n");
}

#[test]
fn test_integer_loop_variable() {
    let mut r = Runtime::default();
    r.enter("10 for i%=1 to 2:print i%:next i%");
    r.enter("run");
    assert_eq!(run(&mut r), " 1 \n 2 \n");
}

#[test]
fn test_step_zero_loops_while_at_or_above_limit() {
    let mut r = Runtime::default();
    r.enter("10 for i=1 to 5 step 0");
    r.enter("20 print i");
    r.enter("30 next");
    r.enter("40 print \"out\"");
    r.enter("run");
    // Starting below the limit, a zero step exits immediately; it
    // only spins when the variable begins at or above the limit.
    assert_eq!(run(&mut r), "out\n");
}

#[test]
fn test_next_without_for_is_compile_error() {
    let mut r = Runtime::default();
    r.enter("10 next i");
    r.enter("run");
    assert_eq!(run(&mut r), "Unexpected NEXT in 10 (5..6)\n");
}

#[test]
fn test_for_without_next_is_compile_error() {
    let mut r = Runtime::default();
    r.enter("10 for i=1 to 3");
    r.enter("run");
    assert_eq!(run(&mut r), "NEXT missing in 10 (0..3)\n");
}
