use super::ast::*;
use super::token::{self, Literal, Operator, Token, Word};
use super::{Column, Error, LineNumber};
use crate::error;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Parse one tokenized line into its statement list. A `None` line
/// number selects direct mode, which permits unlabeled statements but
/// rejects the few statements that only make sense inside a program.
pub fn parse(line_number: LineNumber, tokens: &[Token]) -> Result<Vec<Statement>> {
    match Parser::parse(tokens, line_number.is_none()) {
        Err(e) => Err(e.in_line_number(line_number)),
        Ok(r) => Ok(r),
    }
}

struct Parser<'a> {
    token_stream: std::slice::Iter<'a, Token>,
    peeked: Option<&'a Token>,
    direct: bool,
    col: Column,
}

impl<'a> Parser<'a> {
    fn parse(tokens: &'a [Token], direct: bool) -> Result<Vec<Statement>> {
        let mut parse = Parser {
            token_stream: tokens.iter(),
            peeked: None,
            direct,
            col: 0..0,
        };
        let mut r: Vec<Statement> = vec![];
        loop {
            match parse.peek() {
                None => return Ok(r),
                Some(Token::Colon) => {
                    parse.next();
                    continue;
                }
                Some(Token::Word(Word::Else)) => {
                    return Err(error!(SyntaxError, ..&parse.col; "expected statement"))
                }
                _ => {}
            }
            match parse.statement() {
                Ok(s) => r.push(s),
                Err(e) => return Err(e.in_column(&parse.col)),
            }
        }
    }

    fn column(&self) -> Column {
        self.col.clone()
    }

    fn next(&mut self) -> Option<&'a Token> {
        if self.peeked.is_some() {
            return self.peeked.take();
        }
        loop {
            self.col.start = self.col.end;
            let t = self.token_stream.next()?;
            self.col.end += t.to_string().chars().count();
            match t {
                Token::Whitespace(_) => continue,
                _ => return Some(t),
            }
        }
    }

    fn peek(&mut self) -> Option<&&'a Token> {
        if self.peeked.is_none() {
            self.peeked = self.next();
        }
        self.peeked.as_ref()
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        if let Some(t) = self.next() {
            if *t == token {
                return Ok(());
            }
        }
        use Token::*;
        Err(error!(SyntaxError;
            match token {
                Unknown(_) | Whitespace(_) => "unexpected token",
                Literal(_) => "expected literal",
                Word(_) => "expected reserved word",
                Operator(_) => "expected operator",
                Ident(_) => "expected identifier",
                LParen => "expected left parenthesis",
                RParen => "expected right parenthesis",
                Comma => "expected comma",
                Colon => "expected colon",
                Semicolon => "expected semicolon",
            }
        ))
    }

    fn ident(&mut self) -> Result<Ident> {
        let ident = match self.next() {
            Some(Token::Ident(i)) => i.clone(),
            _ => return Err(error!(SyntaxError; "expected identifier")),
        };
        Ok(Ident::from_token(self.column(), &ident))
    }

    fn statement(&mut self) -> Result<Statement> {
        match self.peek() {
            Some(Token::Ident(_)) => Statement::for_word(self, &Word::Let),
            Some(Token::Word(word)) => {
                let word = (*word).clone();
                self.next();
                Statement::for_word(self, &word)
            }
            _ => Err(error!(SyntaxError; "expected statement")),
        }
    }

    // Statements of a THEN or ELSE arm: up to the matching ELSE or
    // the end of the line.
    fn statement_list(&mut self) -> Result<Vec<Statement>> {
        let mut r: Vec<Statement> = vec![];
        loop {
            match self.peek() {
                None | Some(Token::Word(Word::Else)) => return Ok(r),
                Some(Token::Colon) => {
                    self.next();
                    continue;
                }
                _ => {}
            }
            r.push(self.statement()?);
        }
    }

    fn expression(&mut self) -> Result<Expression> {
        self.binary(0)
    }

    fn binary(&mut self, precedence: usize) -> Result<Expression> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Operator(op)) => match Expression::binding(op) {
                    Some(binding) => binding,
                    None => break,
                },
                _ => break,
            };
            if op.0 < precedence {
                break;
            }
            let operator = match self.next() {
                Some(Token::Operator(operator)) => operator.clone(),
                _ => return Err(error!(InternalError)),
            };
            let column = self.column();
            let rhs = self.binary(if op.1 { op.0 } else { op.0 + 1 })?;
            lhs = Expression::for_binary_op(column, &operator, lhs, rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expression> {
        match self.peek() {
            Some(Token::LParen) => {
                self.next();
                let expr = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some(Token::Operator(Operator::Minus)) => {
                self.next();
                let column = self.column();
                let expr = self.binary(13)?;
                Ok(Expression::Negation(column, Box::new(expr)))
            }
            Some(Token::Operator(Operator::Plus)) => {
                self.next();
                self.binary(13)
            }
            Some(Token::Operator(Operator::Not)) => {
                self.next();
                let column = self.column();
                let expr = self.binary(7)?;
                Ok(Expression::Not(column, Box::new(expr)))
            }
            Some(Token::Operator(Operator::AddressOf)) => {
                self.next();
                let column = self.column();
                let var = self.variable()?;
                Ok(Expression::AddressOf(column, Box::new(var)))
            }
            Some(Token::Ident(_)) => {
                let var = self.variable()?;
                Ok(Expression::Variable(var.column(), Box::new(var)))
            }
            Some(Token::Literal(_)) => {
                let lit = match self.next() {
                    Some(Token::Literal(lit)) => lit.clone(),
                    _ => return Err(error!(InternalError)),
                };
                Expression::for_literal(self.column(), &lit)
            }
            _ => Err(error!(SyntaxError; "expected expression")),
        }
    }

    fn variable(&mut self) -> Result<Variable> {
        let ident = self.ident()?;
        let column = ident.column();
        match self.peek() {
            Some(Token::LParen) => {
                let args = self.expression_list()?;
                Ok(Variable::Array(column.start..self.column().end, ident, args))
            }
            _ => Ok(Variable::Unary(column, ident)),
        }
    }

    fn expression_list(&mut self) -> Result<Vec<Expression>> {
        self.expect(Token::LParen)?;
        let mut v: Vec<Expression> = vec![];
        loop {
            v.push(self.expression()?);
            match self.next() {
                Some(Token::RParen) => return Ok(v),
                Some(Token::Comma) => continue,
                _ => return Err(error!(SyntaxError; "expected end or separator")),
            }
        }
    }

    fn variable_list(&mut self) -> Result<Vec<Variable>> {
        let mut v: Vec<Variable> = vec![];
        loop {
            v.push(self.variable()?);
            match self.peek() {
                Some(Token::Comma) => {
                    self.next();
                    continue;
                }
                _ => return Ok(v),
            }
        }
    }

    // True when the next token is a run of digits that can serve as a
    // line number (which may have lexed as a real: 40000 is a valid
    // line but not a valid integer literal).
    fn at_line_number(&mut self) -> bool {
        matches!(self.peek(), Some(t) if LineNumber::try_from(*t).is_ok())
    }

    fn line_number(&mut self) -> Result<LineRef> {
        match self.next() {
            Some(t @ Token::Literal(_)) => {
                let number = LineNumber::try_from(t)?;
                match number {
                    Some(number) => Ok((self.column(), number)),
                    None => Err(error!(SyntaxError; "expected line number")),
                }
            }
            _ => Err(error!(SyntaxError; "expected line number")),
        }
    }

    fn printer_list(&mut self) -> Result<Vec<PrintItem>> {
        let mut v: Vec<PrintItem> = vec![];
        loop {
            match self.peek() {
                None | Some(Token::Colon) | Some(Token::Word(Word::Else)) => return Ok(v),
                Some(Token::Semicolon) => {
                    self.next();
                    v.push(PrintItem::Semicolon(self.column()));
                }
                Some(Token::Comma) => {
                    self.next();
                    v.push(PrintItem::Comma(self.column()));
                }
                _ => {
                    v.push(PrintItem::Expr(self.expression()?));
                }
            };
        }
    }

    // DEFINT A-C,X style letter ranges.
    fn letter_ranges(&mut self) -> Result<Vec<(char, char)>> {
        fn letter(parse: &mut Parser) -> Result<char> {
            match parse.next() {
                Some(Token::Ident(token::Ident::Plain(s))) if s.chars().count() == 1 => {
                    Ok(s.chars().next().unwrap())
                }
                _ => Err(error!(SyntaxError; "expected letter")),
            }
        }
        let mut v: Vec<(char, char)> = vec![];
        loop {
            let from = letter(self)?;
            let to = match self.peek() {
                Some(Token::Operator(Operator::Minus)) => {
                    self.next();
                    letter(self)?
                }
                _ => from,
            };
            if to < from {
                return Err(error!(SyntaxError, ..&self.column(); "range out of order"));
            }
            v.push((from, to));
            match self.peek() {
                Some(Token::Comma) => {
                    self.next();
                    continue;
                }
                _ => return Ok(v),
            }
        }
    }
}

impl Ident {
    fn from_token(col: Column, ident: &token::Ident) -> Ident {
        match ident {
            token::Ident::Plain(s) => Ident::Plain(col, s.as_str().into()),
            token::Ident::String(s) => Ident::String(col, s.as_str().into()),
            token::Ident::Integer(s) => Ident::Integer(col, s.as_str().into()),
            token::Ident::Real(s) => Ident::Real(col, s.as_str().into()),
        }
    }
}

impl Expression {
    // (binding power, right associative)
    fn binding(op: &Operator) -> Option<(usize, bool)> {
        use Operator::*;
        match op {
            Caret => Some((13, true)),
            Multiply | Divide => Some((11, false)),
            DivideInt => Some((10, false)),
            Modulo => Some((9, false)),
            Plus | Minus => Some((8, false)),
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual => Some((7, false)),
            And => Some((5, false)),
            Or => Some((4, false)),
            Xor => Some((3, false)),
            Not | AddressOf | Stream => None,
        }
    }

    fn for_binary_op(col: Column, op: &Operator, lhs: Expression, rhs: Expression) -> Expression {
        use Operator::*;
        let lhs = Box::new(lhs);
        let rhs = Box::new(rhs);
        match op {
            Caret => Expression::Power(col, lhs, rhs),
            Multiply => Expression::Multiply(col, lhs, rhs),
            Divide => Expression::Divide(col, lhs, rhs),
            DivideInt => Expression::DivideInt(col, lhs, rhs),
            Modulo => Expression::Modulo(col, lhs, rhs),
            Plus => Expression::Add(col, lhs, rhs),
            Minus => Expression::Subtract(col, lhs, rhs),
            Equal => Expression::Equal(col, lhs, rhs),
            NotEqual => Expression::NotEqual(col, lhs, rhs),
            Less => Expression::Less(col, lhs, rhs),
            LessEqual => Expression::LessEqual(col, lhs, rhs),
            Greater => Expression::Greater(col, lhs, rhs),
            GreaterEqual => Expression::GreaterEqual(col, lhs, rhs),
            Not | And | Or | Xor | AddressOf | Stream => unreachable!("not a binary operator"),
        }
    }

    fn for_literal(col: Column, lit: &Literal) -> Result<Expression> {
        match lit {
            Literal::Integer(s) => match s.parse::<i16>() {
                Ok(v) => Ok(Expression::Integer(col, v)),
                Err(_) => Err(error!(Overflow, ..&col)),
            },
            Literal::Real(s) => match s.parse::<f64>() {
                Ok(v) => Ok(Expression::Real(col, v)),
                Err(_) => Err(error!(SyntaxError, ..&col; "malformed number")),
            },
            Literal::Hex(s) => {
                let digits = s.strip_prefix('H').unwrap_or(s);
                match u16::from_str_radix(digits, 16) {
                    Ok(v) => Ok(Expression::Hex(col, v as i16)),
                    Err(_) => Err(error!(Overflow, ..&col)),
                }
            }
            Literal::Binary(s) => match u16::from_str_radix(s, 2) {
                Ok(v) => Ok(Expression::Binary(col, v as i16)),
                Err(_) => Err(error!(Overflow, ..&col)),
            },
            Literal::String(s) => Ok(Expression::String(col, s.as_str().into())),
            Literal::Data(_) => Err(error!(InternalError, ..&col; "data item outside DATA")),
        }
    }
}

impl Statement {
    fn for_word(parse: &mut Parser, word: &Word) -> Result<Statement> {
        let column = parse.column();
        use Word::*;
        match word {
            After => Self::r#after(parse, column, false),
            Chain => Self::r#chain(parse, column),
            Clear => Ok(Statement::Clear(column)),
            Cls => Ok(Statement::Cls(column)),
            Cont => Ok(Statement::Cont(column)),
            Data => Self::r#data(parse, column),
            Def => Self::r#def(parse, column),
            Defint => Ok(Statement::Defint(column, parse.letter_ranges()?)),
            Defreal => Ok(Statement::Defreal(column, parse.letter_ranges()?)),
            Defstr => Ok(Statement::Defstr(column, parse.letter_ranges()?)),
            Dim => Self::r#dim(parse, column),
            End => Ok(Statement::End(column)),
            Every => Self::r#after(parse, column, true),
            For => Self::r#for(parse, column),
            Frame => Ok(Statement::Frame(column)),
            Gosub => Ok(Statement::Gosub(column, parse.line_number()?)),
            Goto => Ok(Statement::Goto(column, parse.line_number()?)),
            If => Self::r#if(parse, column),
            Input => Self::r#input(parse, column),
            Let => Self::r#let(parse, column),
            List => Self::r#list(parse, column),
            Load => Ok(Statement::Load(column, parse.expression()?)),
            Mode => Ok(Statement::Mode(column, parse.expression()?)),
            New => Ok(Statement::New(column)),
            Next => Self::r#next(parse, column),
            On => Self::r#on(parse, column),
            Print => Self::r#print(parse, column),
            Read => Ok(Statement::Read(column, parse.variable_list()?)),
            Rem1 => Self::r#rem(parse, column, false),
            Rem2 => Self::r#rem(parse, column, true),
            Renum => Self::r#renum(parse, column),
            Restore => Self::r#restore(parse, column),
            Resume => Self::r#resume(parse, column),
            Return => Ok(Statement::Return(column)),
            Run => Self::r#run(parse, column),
            Save => Ok(Statement::Save(column, parse.expression()?)),
            Sound => Self::r#sound(parse, column),
            Stop => Ok(Statement::Stop(column)),
            Tron => Ok(Statement::Tron(column)),
            Troff => Ok(Statement::Troff(column)),
            Wend => Ok(Statement::Wend(column)),
            While => Ok(Statement::While(column, parse.expression()?)),
            Break | Else | Error | Merge | Sq | Step | Then | To => {
                Err(error!(SyntaxError; "expected statement"))
            }
        }
    }

    fn r#after(parse: &mut Parser, column: Column, every: bool) -> Result<Statement> {
        let delay = parse.expression()?;
        let slot = match parse.peek() {
            Some(Token::Comma) => {
                parse.next();
                Some(parse.expression()?)
            }
            _ => None,
        };
        parse.expect(Token::Word(Word::Gosub))?;
        let line = parse.line_number()?;
        if every {
            Ok(Statement::Every(column, delay, slot, line))
        } else {
            Ok(Statement::After(column, delay, slot, line))
        }
    }

    fn r#chain(parse: &mut Parser, column: Column) -> Result<Statement> {
        let merge = match parse.peek() {
            Some(Token::Word(Word::Merge)) => {
                parse.next();
                true
            }
            _ => false,
        };
        let file = parse.expression()?;
        let line = match parse.peek() {
            Some(Token::Comma) => {
                parse.next();
                Some(parse.line_number()?)
            }
            _ => None,
        };
        Ok(Statement::Chain(column, merge, file, line))
    }

    fn r#data(parse: &mut Parser, column: Column) -> Result<Statement> {
        let mut items: Vec<Datum> = vec![];
        let mut expecting = true;
        loop {
            match parse.peek() {
                None => break,
                Some(Token::Comma) => {
                    parse.next();
                    if expecting {
                        items.push(Datum {
                            column: parse.column(),
                            text: "".into(),
                            quoted: false,
                        });
                    }
                    expecting = true;
                }
                Some(Token::Literal(Literal::Data(s))) => {
                    let text: Rc<str> = s.trim().into();
                    parse.next();
                    items.push(Datum {
                        column: parse.column(),
                        text,
                        quoted: false,
                    });
                    expecting = false;
                }
                Some(Token::Literal(Literal::String(s))) => {
                    let text: Rc<str> = s.as_str().into();
                    parse.next();
                    items.push(Datum {
                        column: parse.column(),
                        text,
                        quoted: true,
                    });
                    expecting = false;
                }
                _ => return Err(error!(SyntaxError; "expected data item")),
            }
        }
        if expecting && !items.is_empty() {
            items.push(Datum {
                column: parse.column(),
                text: "".into(),
                quoted: false,
            });
        }
        Ok(Statement::Data(column, items))
    }

    fn r#def(parse: &mut Parser, column: Column) -> Result<Statement> {
        if parse.direct {
            return Err(error!(InvalidDirectCommand, ..&column));
        }
        let name = parse.ident()?;
        if !name.name().starts_with("FN") {
            return Err(error!(SyntaxError, ..&name.column(); "expected FN name"));
        }
        let mut params: Vec<Ident> = vec![];
        if let Some(Token::LParen) = parse.peek() {
            parse.next();
            loop {
                params.push(parse.ident()?);
                match parse.next() {
                    Some(Token::RParen) => break,
                    Some(Token::Comma) => continue,
                    _ => return Err(error!(SyntaxError; "expected end or separator")),
                }
            }
        }
        parse.expect(Token::Operator(Operator::Equal))?;
        let expr = parse.expression()?;
        Ok(Statement::DefFn(column, name, params, expr))
    }

    fn r#dim(parse: &mut Parser, column: Column) -> Result<Statement> {
        let vars = parse.variable_list()?;
        for var in &vars {
            if let Variable::Unary(col, _) = var {
                return Err(error!(SyntaxError, ..col; "expected array"));
            }
        }
        Ok(Statement::Dim(column, vars))
    }

    fn r#for(parse: &mut Parser, column: Column) -> Result<Statement> {
        let ident = parse.ident()?;
        parse.expect(Token::Operator(Operator::Equal))?;
        let from = parse.expression()?;
        parse.expect(Token::Word(Word::To))?;
        let to = parse.expression()?;
        let step = match parse.peek() {
            Some(Token::Word(Word::Step)) => {
                parse.next();
                Some(parse.expression()?)
            }
            _ => None,
        };
        Ok(Statement::For(column, ident, from, to, step))
    }

    fn r#if(parse: &mut Parser, column: Column) -> Result<Statement> {
        let predicate = parse.expression()?;
        let then_stmts = match parse.next() {
            Some(Token::Word(Word::Then)) => {
                if parse.at_line_number() {
                    let column = parse.column();
                    vec![Statement::Goto(column, parse.line_number()?)]
                } else {
                    parse.statement_list()?
                }
            }
            Some(Token::Word(Word::Goto)) => {
                let column = parse.column();
                vec![Statement::Goto(column, parse.line_number()?)]
            }
            _ => return Err(error!(SyntaxError; "expected THEN or GOTO")),
        };
        let else_stmts = match parse.peek() {
            Some(Token::Word(Word::Else)) => {
                parse.next();
                if parse.at_line_number() {
                    let column = parse.column();
                    vec![Statement::Goto(column, parse.line_number()?)]
                } else {
                    parse.statement_list()?
                }
            }
            _ => vec![],
        };
        Ok(Statement::If(column, predicate, then_stmts, else_stmts))
    }

    fn r#input(parse: &mut Parser, column: Column) -> Result<Statement> {
        if parse.direct {
            return Err(error!(InvalidDirectCommand, ..&column));
        }
        let stream = match parse.peek() {
            Some(Token::Operator(Operator::Stream)) => {
                parse.next();
                let stream = parse.expression()?;
                parse.expect(Token::Comma)?;
                Some(stream)
            }
            _ => None,
        };
        let prompt = match parse.peek() {
            Some(Token::Literal(token::Literal::String(s))) => {
                let prompt: Rc<str> = s.as_str().into();
                parse.next();
                parse.expect(Token::Semicolon)?;
                Some(prompt)
            }
            _ => None,
        };
        let vars = parse.variable_list()?;
        Ok(Statement::Input(column, stream, prompt, vars))
    }

    fn r#let(parse: &mut Parser, column: Column) -> Result<Statement> {
        let var = parse.variable()?;
        parse.expect(Token::Operator(Operator::Equal))?;
        let expr = parse.expression()?;
        Ok(Statement::Let(column, var, expr))
    }

    fn r#list(parse: &mut Parser, column: Column) -> Result<Statement> {
        let from = if parse.at_line_number() {
            Some(parse.line_number()?)
        } else {
            None
        };
        let to = match parse.peek() {
            Some(Token::Operator(Operator::Minus)) => {
                parse.next();
                if parse.at_line_number() {
                    Some(parse.line_number()?)
                } else {
                    None
                }
            }
            _ => from.clone(),
        };
        Ok(Statement::List(column, from, to))
    }

    fn r#next(parse: &mut Parser, column: Column) -> Result<Statement> {
        let mut idents: Vec<Ident> = vec![];
        if let Some(Token::Ident(_)) = parse.peek() {
            loop {
                idents.push(parse.ident()?);
                match parse.peek() {
                    Some(Token::Comma) => {
                        parse.next();
                        continue;
                    }
                    _ => break,
                }
            }
        }
        Ok(Statement::Next(column, idents))
    }

    fn r#on(parse: &mut Parser, column: Column) -> Result<Statement> {
        match parse.peek() {
            Some(Token::Word(Word::Break)) => {
                parse.next();
                match parse.next() {
                    Some(Token::Word(Word::Cont)) => Ok(Statement::OnBreakCont(column)),
                    Some(Token::Word(Word::Stop)) => Ok(Statement::OnBreakStop(column)),
                    Some(Token::Word(Word::Gosub)) => {
                        Ok(Statement::OnBreakGosub(column, parse.line_number()?))
                    }
                    _ => Err(error!(SyntaxError; "expected CONT, GOSUB or STOP")),
                }
            }
            Some(Token::Word(Word::Error)) => {
                parse.next();
                parse.expect(Token::Word(Word::Goto))?;
                match parse.peek() {
                    Some(Token::Literal(Literal::Integer(s))) if s == "0" => {
                        parse.next();
                        let column2 = parse.column();
                        Ok(Statement::OnErrorGoto(column, (column2, 0)))
                    }
                    _ => Ok(Statement::OnErrorGoto(column, parse.line_number()?)),
                }
            }
            Some(Token::Word(Word::Sq)) => {
                parse.next();
                parse.expect(Token::LParen)?;
                let channel = parse.expression()?;
                parse.expect(Token::RParen)?;
                parse.expect(Token::Word(Word::Gosub))?;
                Ok(Statement::OnSqGosub(column, channel, parse.line_number()?))
            }
            _ => {
                let selector = parse.expression()?;
                let is_gosub = match parse.next() {
                    Some(Token::Word(Word::Gosub)) => true,
                    Some(Token::Word(Word::Goto)) => false,
                    _ => return Err(error!(SyntaxError; "expected GOTO or GOSUB")),
                };
                let mut lines: Vec<LineRef> = vec![];
                loop {
                    lines.push(parse.line_number()?);
                    match parse.peek() {
                        Some(Token::Comma) => {
                            parse.next();
                            continue;
                        }
                        _ => break,
                    }
                }
                if is_gosub {
                    Ok(Statement::OnGosub(column, selector, lines))
                } else {
                    Ok(Statement::OnGoto(column, selector, lines))
                }
            }
        }
    }

    fn r#print(parse: &mut Parser, column: Column) -> Result<Statement> {
        let stream = match parse.peek() {
            Some(Token::Operator(Operator::Stream)) => {
                parse.next();
                let stream = parse.expression()?;
                parse.expect(Token::Comma)?;
                Some(stream)
            }
            _ => None,
        };
        Ok(Statement::Print(column, stream, parse.printer_list()?))
    }

    fn r#rem(parse: &mut Parser, column: Column, apostrophe: bool) -> Result<Statement> {
        let text: Rc<str> = match parse.next() {
            Some(Token::Unknown(s)) => s.as_str().into(),
            None => "".into(),
            _ => return Err(error!(InternalError; "remark not terminal")),
        };
        Ok(Statement::Rem(column, apostrophe, text))
    }

    fn r#renum(parse: &mut Parser, column: Column) -> Result<Statement> {
        let mut args: Vec<LineRef> = vec![];
        if parse.at_line_number() {
            loop {
                args.push(parse.line_number()?);
                match parse.peek() {
                    Some(Token::Comma) => {
                        parse.next();
                        continue;
                    }
                    _ => break,
                }
            }
        }
        if args.len() > 4 {
            return Err(error!(SyntaxError, ..&column; "too many arguments"));
        }
        Ok(Statement::Renum(column, args))
    }

    fn r#restore(parse: &mut Parser, column: Column) -> Result<Statement> {
        if parse.at_line_number() {
            Ok(Statement::Restore(column, Some(parse.line_number()?)))
        } else {
            Ok(Statement::Restore(column, None))
        }
    }

    fn r#resume(parse: &mut Parser, column: Column) -> Result<Statement> {
        if let Some(Token::Word(Word::Next)) = parse.peek() {
            parse.next();
            return Ok(Statement::ResumeNext(column));
        }
        if parse.at_line_number() {
            Ok(Statement::Resume(column, Some(parse.line_number()?)))
        } else {
            Ok(Statement::Resume(column, None))
        }
    }

    fn r#run(parse: &mut Parser, column: Column) -> Result<Statement> {
        if let Some(Token::Literal(Literal::String(_))) = parse.peek() {
            return Ok(Statement::RunFile(column, parse.expression()?));
        }
        if parse.at_line_number() {
            Ok(Statement::Run(column, Some(parse.line_number()?)))
        } else {
            Ok(Statement::Run(column, None))
        }
    }

    fn r#sound(parse: &mut Parser, column: Column) -> Result<Statement> {
        let channel = parse.expression()?;
        parse.expect(Token::Comma)?;
        let period = parse.expression()?;
        let duration = match parse.peek() {
            Some(Token::Comma) => {
                parse.next();
                Some(parse.expression()?)
            }
            _ => None,
        };
        Ok(Statement::Sound(column, channel, period, duration))
    }
}

#[cfg(test)]
mod tests {
    use super::super::lex::*;
    use super::*;

    fn parse_str(s: &str) -> Vec<Statement> {
        let (ln, tokens, _) = lex(s);
        match parse(ln, &tokens) {
            Ok(v) => v,
            Err(e) => panic!("{} : {:?}", e, e),
        }
    }

    #[test]
    fn test_implicit_let() {
        let v = parse_str("10 A=1");
        assert!(matches!(v[0], Statement::Let(..)));
    }

    #[test]
    fn test_precedence() {
        let v = parse_str("10 A=1+2*3");
        if let Statement::Let(_, _, Expression::Add(_, _, rhs)) = &v[0] {
            assert!(matches!(**rhs, Expression::Multiply(..)));
        } else {
            panic!("{:?}", v);
        }
    }

    #[test]
    fn test_power_binds_tighter_than_negation() {
        let v = parse_str("10 A=-2^2");
        if let Statement::Let(_, _, expr) = &v[0] {
            assert!(matches!(expr, Expression::Negation(..)));
        } else {
            panic!("{:?}", v);
        }
    }

    #[test]
    fn test_if_then_else_nested() {
        let v = parse_str("10 IF A THEN IF B THEN PRINT 1 ELSE PRINT 2");
        if let Statement::If(_, _, then_stmts, else_stmts) = &v[0] {
            assert!(else_stmts.is_empty());
            assert!(matches!(then_stmts[0], Statement::If(..)));
        } else {
            panic!("{:?}", v);
        }
    }

    #[test]
    fn test_then_line_number() {
        let v = parse_str("10 IF A THEN 100");
        if let Statement::If(_, _, then_stmts, _) = &v[0] {
            assert!(matches!(then_stmts[0], Statement::Goto(..)));
        } else {
            panic!("{:?}", v);
        }
    }

    #[test]
    fn test_direct_input_rejected() {
        let (ln, tokens, _) = lex("INPUT A");
        assert!(parse(ln, &tokens).is_err());
    }

    #[test]
    fn test_on_variants() {
        assert!(matches!(
            parse_str("10 ON X GOSUB 100,200")[0],
            Statement::OnGosub(..)
        ));
        assert!(matches!(
            parse_str("10 ON BREAK CONT")[0],
            Statement::OnBreakCont(..)
        ));
        assert!(matches!(
            parse_str("10 ON ERROR GOTO 100")[0],
            Statement::OnErrorGoto(..)
        ));
        assert!(matches!(
            parse_str("10 ON SQ(1) GOSUB 100")[0],
            Statement::OnSqGosub(..)
        ));
    }

    #[test]
    fn test_data_items() {
        let v = parse_str("10 DATA 1, two,\"three, four\"");
        if let Statement::Data(_, items) = &v[0] {
            assert_eq!(items.len(), 3);
            assert_eq!(&*items[0].text, "1");
            assert_eq!(&*items[1].text, "two");
            assert_eq!(&*items[2].text, "three, four");
            assert!(items[2].quoted);
        } else {
            panic!("{:?}", v);
        }
    }
}
