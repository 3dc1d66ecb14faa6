use basic::lang::{lex, token::*};

fn token(s: &str) -> Option<Token> {
    let s = format!("?{}", s);
    let (_, mut tokens, _) = lex(&s);
    let mut t = tokens.drain(1..2);
    t.next()
}

#[test]
fn test_relational_collapse() {
    let (ln, v, _) = lex("10 1=<>=<>2");
    assert_eq!(ln, Some(10));
    let mut x = v.iter();
    assert_eq!(
        x.next(),
        Some(&Token::Literal(Literal::Integer("1".to_string())))
    );
    assert_eq!(x.next(), Some(&Token::Operator(Operator::LessEqual)));
    assert_eq!(x.next(), Some(&Token::Operator(Operator::GreaterEqual)));
    assert_eq!(x.next(), Some(&Token::Operator(Operator::NotEqual)));
    assert_eq!(
        x.next(),
        Some(&Token::Literal(Literal::Integer("2".to_string())))
    );
    assert_eq!(x.next(), None);
}

#[test]
fn test_go_to_collapses() {
    let (ln, v, _) = lex("10 go to 100");
    assert_eq!(ln, Some(10));
    assert_eq!(v.first(), Some(&Token::Word(Word::Goto)));
}

#[test]
fn test_go_sub_collapses() {
    assert_eq!(token("GO SUB"), Some(Token::Word(Word::Gosub)));
}

#[test]
fn test_question_mark_is_print() {
    assert_eq!(
        lex("10 ?1").1.first(),
        Some(&Token::Word(Word::Print))
    );
}

#[test]
fn test_line_number_scan() {
    let (ln, _, _) = lex("  10 PRINT");
    assert_eq!(ln, Some(10));
    let (ln, _, _) = lex("65536 PRINT");
    assert_eq!(ln, None);
    let (ln, _, _) = lex("PRINT");
    assert_eq!(ln, None);
    let (ln, _, _) = lex("0 PRINT");
    assert_eq!(ln, None);
}

#[test]
fn test_exponent_disambiguation() {
    let (_, v, _) = lex("10 A=1E5");
    assert!(v
        .iter()
        .any(|t| *t == Token::Literal(Literal::Real("1E5".to_string()))));
    let (_, v, _) = lex("10 A=1EX");
    assert!(v
        .iter()
        .any(|t| *t == Token::Literal(Literal::Integer("1".to_string()))));
    assert!(v
        .iter()
        .any(|t| matches!(t, Token::Ident(Ident::Plain(s)) if s == "EX")));
    let (_, v, _) = lex("10 A=1E+2");
    assert!(v
        .iter()
        .any(|t| *t == Token::Literal(Literal::Real("1E+2".to_string()))));
}

#[test]
fn test_hex_and_binary() {
    assert_eq!(
        token("&H1F"),
        Some(Token::Literal(Literal::Hex("H1F".to_string())))
    );
    assert_eq!(
        token("&1F"),
        Some(Token::Literal(Literal::Hex("1F".to_string())))
    );
    assert_eq!(
        token("&X1010"),
        Some(Token::Literal(Literal::Binary("1010".to_string())))
    );
}

#[test]
fn test_unterminated_string_flagged() {
    let (_, v, unterminated) = lex("10 PRINT \"OOPS");
    assert!(unterminated);
    assert!(v
        .iter()
        .any(|t| *t == Token::Literal(Literal::String("OOPS".to_string()))));
    let (_, _, unterminated) = lex("10 PRINT \"FINE\"");
    assert!(!unterminated);
}

#[test]
fn test_rem_swallows_line() {
    let (_, v, _) = lex("10 REM anything: goes 1 2 3");
    assert_eq!(v.first(), Some(&Token::Word(Word::Rem1)));
    assert!(matches!(v.last(), Some(Token::Unknown(_))));
}

#[test]
fn test_data_mode_items() {
    let (_, v, _) = lex("10 DATA one, \"two, three\",4");
    let items: Vec<&Token> = v
        .iter()
        .filter(|t| matches!(t, Token::Literal(_)))
        .collect();
    assert_eq!(items.len(), 3);
    assert_eq!(
        items[1],
        &Token::Literal(Literal::String("two, three".to_string()))
    );
}

#[test]
fn test_sigil_idents() {
    assert_eq!(
        token("A$"),
        Some(Token::Ident(Ident::String("A$".to_string())))
    );
    assert_eq!(
        token("COUNT%"),
        Some(Token::Ident(Ident::Integer("COUNT%".to_string())))
    );
    assert_eq!(
        token("X!"),
        Some(Token::Ident(Ident::Real("X!".to_string())))
    );
}
