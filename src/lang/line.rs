use super::ast::Statement;
use super::lex::lex;
use super::parse::parse;
use super::token::{Literal, Token, Word};
use super::{Error, LineNumber};
use std::collections::HashMap;

/// One line of source, kept as its token stream so the original
/// spelling survives for listings and in-place renumbering.
#[derive(Debug, PartialEq, Clone)]
pub struct Line {
    number: LineNumber,
    tokens: Vec<Token>,
    unterminated: bool,
}

impl Line {
    pub fn new(s: &str) -> Line {
        let (number, tokens, unterminated) = lex(s);
        Line {
            number,
            tokens,
            unterminated,
        }
    }

    pub fn number(&self) -> LineNumber {
        self.number
    }

    pub fn is_direct(&self) -> bool {
        self.number.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// True when a string literal ran off the end of this line.
    pub fn unterminated(&self) -> bool {
        self.unterminated
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn ast(&self) -> Result<Vec<Statement>, Error> {
        parse(self.number, &self.tokens)
    }

    /// Canonical re-serialization by walking the parsed AST. Falls
    /// back to the stored spelling when the line does not parse.
    pub fn pretty(&self) -> String {
        match self.ast() {
            Ok(statements) => {
                let body = statements
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<String>>()
                    .join(":");
                match self.number {
                    Some(number) => format!("{} {}", number, body),
                    None => body,
                }
            }
            Err(_) => self.to_string(),
        }
    }

    /// Every line number this line jumps to, in token order. CHAIN
    /// targets are excluded; they name a line in some other program.
    pub fn line_refs(&self) -> Vec<u16> {
        let mut refs: Vec<u16> = vec![];
        self.scan_refs(|n| refs.push(n));
        refs
    }

    /// Rewrite this line under a renumbering map, both the line's own
    /// number and every in-range reference.
    pub fn renum(&self, changes: &HashMap<u16, u16>) -> Line {
        let number = match self.number {
            Some(n) => Some(*changes.get(&n).unwrap_or(&n)),
            None => None,
        };
        let mut tokens = self.tokens.clone();
        let mut edits: Vec<(usize, u16)> = vec![];
        self.scan_ref_positions(|index, n| {
            if let Some(new) = changes.get(&n) {
                edits.push((index, *new));
            }
        });
        for (index, new) in edits {
            tokens[index] = Token::Literal(Literal::Integer(new.to_string()));
        }
        Line {
            number,
            tokens,
            unterminated: self.unterminated,
        }
    }

    fn scan_refs<F: FnMut(u16)>(&self, mut f: F) {
        self.scan_ref_positions(|_, n| f(n));
    }

    // Token positions of line-number references: an integer literal
    // directly after GOTO/GOSUB/THEN/ELSE/RESTORE/RESUME/RUN, plus
    // comma-continued integers (ON x GOTO 10,20,30). A CHAIN keyword
    // poisons the rest of the statement.
    fn scan_ref_positions<F: FnMut(usize, u16)>(&self, mut f: F) {
        #[derive(PartialEq)]
        enum State {
            Idle,
            Reference,
            List,
            Chained,
        }
        let mut state = State::Idle;
        for (index, token) in self.tokens.iter().enumerate() {
            match token {
                Token::Whitespace(_) => continue,
                Token::Word(word) => {
                    state = match word {
                        Word::Chain => State::Chained,
                        _ if state == State::Chained => State::Chained,
                        Word::Goto | Word::Gosub | Word::Then | Word::Else | Word::Restore
                        | Word::Resume | Word::Run => State::Reference,
                        _ => State::Idle,
                    };
                }
                Token::Literal(Literal::Integer(s)) => {
                    if state == State::Reference || state == State::List {
                        if let Ok(n) = s.parse::<u16>() {
                            f(index, n);
                        }
                        state = State::List;
                    }
                }
                Token::Comma => {
                    if state != State::List && state != State::Chained {
                        state = State::Idle;
                    } else if state == State::List {
                        state = State::Reference;
                    }
                }
                Token::Colon => state = State::Idle,
                _ => {
                    if state != State::Chained {
                        state = State::Idle;
                    }
                }
            }
        }
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s: String = self.tokens.iter().map(|t| t.to_string()).collect();
        match self.number {
            Some(number) => write!(f, "{} {}", number, s),
            None => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_display() {
        let line = Line::new("10 PRINT \"HI\":GOTO 20");
        assert_eq!(line.to_string(), "10 PRINT \"HI\":GOTO 20");
    }

    #[test]
    fn test_line_refs() {
        let line = Line::new("10 ON X GOTO 100,200:GOSUB 300");
        assert_eq!(line.line_refs(), vec![100, 200, 300]);
    }

    #[test]
    fn test_chain_targets_not_references() {
        let line = Line::new("10 CHAIN \"PART2\",500");
        assert_eq!(line.line_refs(), vec![]);
    }

    #[test]
    fn test_renum_rewrites_refs() {
        let mut changes = HashMap::new();
        changes.insert(10u16, 100u16);
        changes.insert(20u16, 110u16);
        let line = Line::new("10 GOTO 20").renum(&changes);
        assert_eq!(line.to_string(), "100 GOTO 110");
    }
}
