use basic::lang::Line;

fn pretty(s: &str) -> String {
    Line::new(s).pretty()
}

#[test]
fn test_canonical_is_idempotent() {
    let samples = [
        "10 print 1+2*3",
        "20 if a=1 then print \"one\" else print \"two\"",
        "30 for i=1 to 10 step 2:print i:next i",
        "40 on x gosub 100,200,300",
        "50 data 1,two,\"three, four\"",
        "60 def fnsq(x)=x*x",
        "70 while a<10:a=a+1:wend",
        "80 print #2,\"hi\";a$,b",
        "90 after 50,1 gosub 1000",
        "100 rem  keep this text",
    ];
    for s in samples {
        let once = pretty(s);
        let twice = pretty(&once);
        assert_eq!(once, twice, "not canonical for {}", s);
    }
}

#[test]
fn test_keywords_uppercase() {
    assert_eq!(pretty("10 print a"), "10 PRINT A");
    assert_eq!(pretty("10 goto 20"), "10 GOTO 20");
}

#[test]
fn test_parentheses_preserved_by_precedence() {
    assert_eq!(pretty("10 a=(2+3)*4"), "10 A=(2+3)*4");
    assert_eq!(pretty("10 a=2+3*4"), "10 A=2+3*4");
    assert_eq!(pretty("10 a=-(2^2)"), "10 A=-2^2");
    assert_eq!(pretty("10 a=(1+2)-(3+4)"), "10 A=1+2-(3+4)");
}

#[test]
fn test_real_literals_stay_real() {
    assert_eq!(pretty("10 a=10.0"), "10 A=10.0");
    assert_eq!(pretty("10 A=10.0"), pretty(&pretty("10 a=10.0")));
}

#[test]
fn test_unquoted_data_stays_unquoted() {
    assert_eq!(pretty("10 data one, two,\"3\""), "10 DATA one,two,\"3\"");
}

#[test]
fn test_shorthand_goto_canonicalized() {
    assert_eq!(pretty("10 if a then 100"), "10 IF A THEN GOTO 100");
    assert_eq!(pretty("10 ?1"), "10 PRINT 1");
}

#[test]
fn test_reparse_equals_reserialize() {
    // lex -> parse -> serialize -> parse -> serialize is stable.
    let source = "10 if x>=2 and y<>0 then gosub 500 else print \"no\";:goto 30";
    let once = pretty(source);
    assert_eq!(once, pretty(&once));
}
