use super::{token::*, LineNumber, MaxValue};

/// Lex one source line. Returns the leading line number (if any), the
/// token stream, and whether a string literal ran off the end of the
/// line (a recoverable condition; the string is closed at the line
/// break).
pub fn lex(s: &str) -> (LineNumber, Vec<Token>, bool) {
    BasicLexer::lex(s)
}

fn is_basic_whitespace(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_basic_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_basic_alphabetic(c: char) -> bool {
    c.is_ascii_alphabetic()
}

struct BasicLexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    remark: bool,
    data: bool,
    unterminated: bool,
}

impl<'a> Iterator for BasicLexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let pk = *self.chars.peek()?;
        if self.remark {
            return Some(Token::Unknown(self.chars.by_ref().collect::<String>()));
        }
        if is_basic_whitespace(pk) {
            return self.whitespace();
        }
        if self.data {
            return self.data_item();
        }
        if is_basic_digit(pk) || pk == '.' {
            return self.number();
        }
        if is_basic_alphabetic(pk) {
            let r = self.alphabetic();
            match r {
                Some(Token::Word(Word::Rem1)) => self.remark = true,
                Some(Token::Word(Word::Data)) => self.data = true,
                _ => {}
            }
            return r;
        }
        if pk == '"' {
            return self.string();
        }
        if pk == '&' {
            return self.radix();
        }
        let minutia = self.minutia();
        if let Some(Token::Word(Word::Rem2)) = minutia {
            self.remark = true;
        }
        minutia
    }
}

impl<'a> BasicLexer<'a> {
    fn lex(s: &str) -> (LineNumber, Vec<Token>, bool) {
        let mut line_number = None;
        let mut s = s.trim_end_matches(['\r', '\n']);
        let mut ln: usize = 0;
        let mut seen_digit = false;
        while let Some(n) = s.get(ln..) {
            if let Some(ch) = n.chars().next() {
                if seen_digit && is_basic_whitespace(ch) {
                    break;
                }
                if is_basic_digit(ch) {
                    seen_digit = true;
                } else if !is_basic_whitespace(ch) {
                    break;
                }
                ln += 1;
            } else {
                break;
            }
        }
        if let Ok(n) = s[0..ln].trim_start().parse::<u16>() {
            if n >= 1 && n <= LineNumber::max_value() {
                line_number = Some(n);
                if let Some(' ') = s[ln..].chars().next() {
                    ln += 1;
                }
                s = &s[ln..];
            }
        }
        let mut lexer = BasicLexer {
            chars: s.chars().peekable(),
            remark: false,
            data: false,
            unterminated: false,
        };
        let mut tokens: Vec<Token> = lexer.by_ref().collect();
        let unterminated = lexer.unterminated;
        BasicLexer::trim_end(&mut tokens);
        BasicLexer::collapse_go(&mut tokens);
        BasicLexer::collapse_relational(&mut tokens);
        if line_number.is_some() {
            BasicLexer::separate_words(&mut tokens);
        }
        (line_number, tokens, unterminated)
    }

    fn whitespace(&mut self) -> Option<Token> {
        let mut len = 0;
        loop {
            self.chars.next();
            len += 1;
            if let Some(pk) = self.chars.peek() {
                if is_basic_whitespace(*pk) {
                    continue;
                }
            }
            return Some(Token::Whitespace(len));
        }
    }

    fn number(&mut self) -> Option<Token> {
        let mut s = String::new();
        let mut decimal = false;
        let mut exp = false;
        loop {
            let ch = match self.chars.next() {
                Some(c) => c.to_ascii_uppercase(),
                None => {
                    debug_assert!(false, "Failed to tokenize number.");
                    return None;
                }
            };
            s.push(ch);
            if ch == '.' {
                decimal = true;
            }
            if ch == 'E' {
                exp = true;
                if let Some(pk) = self.chars.peek() {
                    if *pk == '+' || *pk == '-' {
                        continue;
                    }
                }
            }
            if let Some(pk) = self.chars.peek() {
                if is_basic_digit(*pk) {
                    continue;
                }
                if !decimal && !exp && *pk == '.' {
                    continue;
                }
                if !exp && (*pk == 'E' || *pk == 'e') && self.exponent_follows() {
                    continue;
                }
            }
            break;
        }
        if !exp && !decimal && s.parse::<i16>().is_ok() {
            return Some(Token::Literal(Literal::Integer(s)));
        }
        Some(Token::Literal(Literal::Real(s)))
    }

    // An exponent marker only counts when a digit, or a sign and then
    // a digit, follows. "10E5" is a number; "10EX" is 10 then an
    // identifier.
    fn exponent_follows(&mut self) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next();
        match ahead.next() {
            Some(c) if is_basic_digit(c) => true,
            Some('+') | Some('-') => matches!(ahead.next(), Some(c) if is_basic_digit(c)),
            _ => false,
        }
    }

    fn string(&mut self) -> Option<Token> {
        let mut s = String::new();
        self.chars.next();
        loop {
            match self.chars.next() {
                Some(ch) if ch != '"' => {
                    s.push(ch);
                }
                Some(_) => break,
                None => {
                    self.unterminated = true;
                    break;
                }
            }
        }
        Some(Token::Literal(Literal::String(s)))
    }

    fn alphabetic(&mut self) -> Option<Token> {
        let mut s = String::new();
        let mut digit = false;
        loop {
            let ch = match self.chars.next() {
                Some(ch) => ch.to_ascii_uppercase(),
                None => {
                    debug_assert!(false, "Failed to tokenize alphabetic.");
                    return None;
                }
            };
            s.push(ch);
            if is_basic_digit(ch) {
                digit = true;
            }
            if let Some(token) = Token::from_string(&s) {
                return Some(token);
            }
            if ch == '$' {
                return Some(Token::Ident(Ident::String(s)));
            }
            if ch == '!' {
                return Some(Token::Ident(Ident::Real(s)));
            }
            if ch == '%' {
                return Some(Token::Ident(Ident::Integer(s)));
            }
            if let Some(pk) = self.chars.peek() {
                if is_basic_alphabetic(*pk) {
                    if digit {
                        break;
                    }
                    continue;
                }
                if is_basic_digit(*pk) || *pk == '$' || *pk == '!' || *pk == '%' {
                    continue;
                }
            }
            break;
        }
        Some(Token::Ident(Ident::Plain(s)))
    }

    fn radix(&mut self) -> Option<Token> {
        self.chars.next();
        let binary = match self.chars.peek() {
            Some('X') | Some('x') => true,
            _ => false,
        };
        if binary {
            let mut s = String::new();
            self.chars.next();
            while let Some(pk) = self.chars.peek() {
                if *pk == '0' || *pk == '1' {
                    s.push(*pk);
                    self.chars.next();
                } else {
                    break;
                }
            }
            if s.is_empty() {
                return Some(Token::Unknown("&X".to_string()));
            }
            return Some(Token::Literal(Literal::Binary(s)));
        }
        let mut s = String::new();
        if let Some('H') | Some('h') = self.chars.peek() {
            s.push('H');
            self.chars.next();
        }
        let mut digits = 0;
        while let Some(pk) = self.chars.peek() {
            if pk.is_ascii_hexdigit() {
                s.push(pk.to_ascii_uppercase());
                digits += 1;
                self.chars.next();
            } else {
                break;
            }
        }
        if digits == 0 {
            let mut u = String::from("&");
            u.push_str(&s);
            return Some(Token::Unknown(u));
        }
        Some(Token::Literal(Literal::Hex(s)))
    }

    fn data_item(&mut self) -> Option<Token> {
        match self.chars.peek() {
            Some(',') => {
                self.chars.next();
                return Some(Token::Comma);
            }
            Some('"') => return self.string(),
            _ => {}
        }
        let mut s = String::new();
        while let Some(pk) = self.chars.peek() {
            if *pk == ',' {
                break;
            }
            s.push(*pk);
            self.chars.next();
        }
        Some(Token::Literal(Literal::Data(s)))
    }

    fn minutia(&mut self) -> Option<Token> {
        let mut s = String::new();
        loop {
            if let Some(ch) = self.chars.next() {
                s.push(ch);
                match s.as_str() {
                    "(" => return Some(Token::LParen),
                    ")" => return Some(Token::RParen),
                    "," => return Some(Token::Comma),
                    ":" => return Some(Token::Colon),
                    ";" => return Some(Token::Semicolon),
                    "'" => return Some(Token::Word(Word::Rem2)),
                    "?" => return Some(Token::Word(Word::Print)),
                    "^" => return Some(Token::Operator(Operator::Caret)),
                    "*" => return Some(Token::Operator(Operator::Multiply)),
                    "/" => return Some(Token::Operator(Operator::Divide)),
                    "\\" => return Some(Token::Operator(Operator::DivideInt)),
                    "+" => return Some(Token::Operator(Operator::Plus)),
                    "-" => return Some(Token::Operator(Operator::Minus)),
                    "=" => return Some(Token::Operator(Operator::Equal)),
                    "<" => return Some(Token::Operator(Operator::Less)),
                    ">" => return Some(Token::Operator(Operator::Greater)),
                    "@" => return Some(Token::Operator(Operator::AddressOf)),
                    "#" => return Some(Token::Operator(Operator::Stream)),
                    _ => {}
                }
                if let Some(pk) = self.chars.peek() {
                    if is_basic_alphabetic(*pk) || is_basic_digit(*pk) || is_basic_whitespace(*pk)
                    {
                        break;
                    }
                    continue;
                }
                break;
            }
        }
        Some(Token::Unknown(s))
    }

    fn collapse_relational(tokens: &mut Vec<Token>) {
        use Operator::*;
        let mut locs: Vec<(usize, Token)> = vec![];
        let mut tokens_iter = tokens.windows(2).enumerate();
        while let Some((index, tt)) = tokens_iter.next() {
            let pair = match (&tt[0], &tt[1]) {
                (Token::Operator(a), Token::Operator(b)) => (a, b),
                _ => continue,
            };
            let collapsed = match pair {
                (Less, Equal) | (Equal, Less) => Some(LessEqual),
                (Greater, Equal) | (Equal, Greater) => Some(GreaterEqual),
                (Less, Greater) => Some(NotEqual),
                _ => None,
            };
            if let Some(op) = collapsed {
                locs.push((index, Token::Operator(op)));
                tokens_iter.next();
            }
        }
        while let Some((index, token)) = locs.pop() {
            tokens.splice(index..index + 2, Some(token));
        }
    }

    fn collapse_go(tokens: &mut Vec<Token>) {
        let mut locs: Vec<(usize, Token)> = vec![];
        for (index, ttt) in tokens.windows(3).enumerate() {
            if let Token::Ident(Ident::Plain(go)) = &ttt[0] {
                if go == "GO" {
                    if let Token::Whitespace(_) = ttt[1] {
                        if let Token::Word(Word::To) = ttt[2] {
                            locs.push((index, Token::Word(Word::Goto)));
                        }
                        if let Token::Ident(Ident::Plain(sub)) = &ttt[2] {
                            if sub == "SUB" {
                                locs.push((index, Token::Word(Word::Gosub)));
                            }
                        }
                    }
                }
            }
        }
        while let Some((index, token)) = locs.pop() {
            tokens.splice(index..index + 3, Some(token));
        }
    }

    fn separate_words(tokens: &mut Vec<Token>) {
        let mut ins: Vec<usize> = vec![];
        for (index, tt) in tokens.windows(2).enumerate() {
            if tt.iter().all(|y| y.is_word()) {
                ins.push(index);
            }
        }
        while let Some(index) = ins.pop() {
            tokens.insert(index + 1, Token::Whitespace(1));
        }
    }

    fn trim_end(tokens: &mut Vec<Token>) {
        if let Some(Token::Whitespace(_)) = tokens.last() {
            tokens.pop();
        }
        if let Some(Token::Unknown(_)) = tokens.last() {
            if let Some(Token::Unknown(s)) = tokens.pop() {
                tokens.push(Token::Unknown(s.trim_end().to_string()));
            }
        }
    }
}
