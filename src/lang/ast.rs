use super::Column;
use std::rc::Rc;

/// A static jump target: the column it was written at and the line
/// number itself. Targets are validated against the label table at
/// generation time, not evaluated.
pub type LineRef = (Column, u16);

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    After(Column, Expression, Option<Expression>, LineRef),
    Chain(Column, bool, Expression, Option<LineRef>),
    Clear(Column),
    Cls(Column),
    Cont(Column),
    Data(Column, Vec<Datum>),
    DefFn(Column, Ident, Vec<Ident>, Expression),
    Defint(Column, Vec<(char, char)>),
    Defreal(Column, Vec<(char, char)>),
    Defstr(Column, Vec<(char, char)>),
    Dim(Column, Vec<Variable>),
    End(Column),
    Every(Column, Expression, Option<Expression>, LineRef),
    For(Column, Ident, Expression, Expression, Option<Expression>),
    Frame(Column),
    Gosub(Column, LineRef),
    Goto(Column, LineRef),
    If(Column, Expression, Vec<Statement>, Vec<Statement>),
    Input(Column, Option<Expression>, Option<Rc<str>>, Vec<Variable>),
    Let(Column, Variable, Expression),
    List(Column, Option<LineRef>, Option<LineRef>),
    Load(Column, Expression),
    Mode(Column, Expression),
    New(Column),
    Next(Column, Vec<Ident>),
    OnBreakCont(Column),
    OnBreakGosub(Column, LineRef),
    OnBreakStop(Column),
    OnErrorGoto(Column, LineRef),
    OnGosub(Column, Expression, Vec<LineRef>),
    OnGoto(Column, Expression, Vec<LineRef>),
    OnSqGosub(Column, Expression, LineRef),
    Print(Column, Option<Expression>, Vec<PrintItem>),
    Read(Column, Vec<Variable>),
    Rem(Column, bool, Rc<str>),
    Renum(Column, Vec<LineRef>),
    Restore(Column, Option<LineRef>),
    Resume(Column, Option<LineRef>),
    ResumeNext(Column),
    Return(Column),
    Run(Column, Option<LineRef>),
    RunFile(Column, Expression),
    Save(Column, Expression),
    Sound(Column, Expression, Expression, Option<Expression>),
    Stop(Column),
    Troff(Column),
    Tron(Column),
    Wend(Column),
    While(Column, Expression),
}

/// One DATA item; unquoted items keep their spelling so listings
/// round-trip.
#[derive(Debug, PartialEq, Clone)]
pub struct Datum {
    pub column: Column,
    pub text: Rc<str>,
    pub quoted: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub enum PrintItem {
    Expr(Expression),
    Semicolon(Column),
    Comma(Column),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Ident {
    Plain(Column, Rc<str>),
    String(Column, Rc<str>),
    Integer(Column, Rc<str>),
    Real(Column, Rc<str>),
}

impl Ident {
    pub fn column(&self) -> Column {
        use Ident::*;
        match self {
            Plain(col, _) | String(col, _) | Integer(col, _) | Real(col, _) => col.clone(),
        }
    }

    pub fn name(&self) -> Rc<str> {
        use Ident::*;
        match self {
            Plain(_, s) | String(_, s) | Integer(_, s) | Real(_, s) => s.clone(),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Variable {
    Unary(Column, Ident),
    Array(Column, Ident, Vec<Expression>),
}

impl Variable {
    pub fn column(&self) -> Column {
        use Variable::*;
        match self {
            Unary(col, _) | Array(col, _, _) => col.clone(),
        }
    }

    pub fn ident(&self) -> &Ident {
        use Variable::*;
        match self {
            Unary(_, ident) | Array(_, ident, _) => ident,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Integer(Column, i16),
    Hex(Column, i16),
    Binary(Column, i16),
    Real(Column, f64),
    String(Column, Rc<str>),
    Variable(Column, Box<Variable>),
    AddressOf(Column, Box<Variable>),
    Negation(Column, Box<Expression>),
    Not(Column, Box<Expression>),
    Power(Column, Box<Expression>, Box<Expression>),
    Multiply(Column, Box<Expression>, Box<Expression>),
    Divide(Column, Box<Expression>, Box<Expression>),
    DivideInt(Column, Box<Expression>, Box<Expression>),
    Modulo(Column, Box<Expression>, Box<Expression>),
    Add(Column, Box<Expression>, Box<Expression>),
    Subtract(Column, Box<Expression>, Box<Expression>),
    Equal(Column, Box<Expression>, Box<Expression>),
    NotEqual(Column, Box<Expression>, Box<Expression>),
    Less(Column, Box<Expression>, Box<Expression>),
    LessEqual(Column, Box<Expression>, Box<Expression>),
    Greater(Column, Box<Expression>, Box<Expression>),
    GreaterEqual(Column, Box<Expression>, Box<Expression>),
    And(Column, Box<Expression>, Box<Expression>),
    Or(Column, Box<Expression>, Box<Expression>),
    Xor(Column, Box<Expression>, Box<Expression>),
}

impl Expression {
    pub fn column(&self) -> Column {
        use Expression::*;
        match self {
            Integer(col, _)
            | Hex(col, _)
            | Binary(col, _)
            | Real(col, _)
            | String(col, _)
            | Variable(col, _)
            | AddressOf(col, _)
            | Negation(col, _)
            | Not(col, _)
            | Power(col, _, _)
            | Multiply(col, _, _)
            | Divide(col, _, _)
            | DivideInt(col, _, _)
            | Modulo(col, _, _)
            | Add(col, _, _)
            | Subtract(col, _, _)
            | Equal(col, _, _)
            | NotEqual(col, _, _)
            | Less(col, _, _)
            | LessEqual(col, _, _)
            | Greater(col, _, _)
            | GreaterEqual(col, _, _)
            | And(col, _, _)
            | Or(col, _, _)
            | Xor(col, _, _) => col.clone(),
        }
    }
}

pub trait Visitor {
    fn visit_statement(&mut self, _: &Statement) {}
    fn visit_variable(&mut self, _: &Variable) {}
    fn visit_ident(&mut self, _: &Ident) {}
    fn visit_expression(&mut self, _: &Expression) {}
}

pub trait AcceptVisitor {
    fn accept<V: Visitor>(&self, visitor: &mut V);
}

impl AcceptVisitor for Ident {
    fn accept<V: Visitor>(&self, visitor: &mut V) {
        visitor.visit_ident(self)
    }
}

impl AcceptVisitor for Variable {
    fn accept<V: Visitor>(&self, visitor: &mut V) {
        use Variable::*;
        match self {
            Unary(_, ident) => {
                ident.accept(visitor);
            }
            Array(_, ident, vec_expr) => {
                ident.accept(visitor);
                for expr in vec_expr {
                    expr.accept(visitor);
                }
            }
        }
        visitor.visit_variable(self)
    }
}

impl AcceptVisitor for Statement {
    fn accept<V: Visitor>(&self, visitor: &mut V) {
        use Statement::*;
        match self {
            Clear(_) | Cls(_) | Cont(_) | End(_) | Frame(_) | New(_) | OnBreakCont(_)
            | OnBreakGosub(..) | OnBreakStop(_) | OnErrorGoto(..) | Rem(..) | Renum(..)
            | Restore(..) | Resume(..) | ResumeNext(_) | Return(_) | Run(..) | Stop(_)
            | Troff(_) | Tron(_) | Wend(_) | Data(..) | Defint(..) | Defreal(..)
            | Defstr(..) | Gosub(..) | Goto(..) | List(..) => {}
            After(_, delay, slot, _) | Every(_, delay, slot, _) => {
                delay.accept(visitor);
                if let Some(slot) = slot {
                    slot.accept(visitor);
                }
            }
            Chain(_, _, file, _) => {
                file.accept(visitor);
            }
            DefFn(_, ident, vec_ident, expr) => {
                ident.accept(visitor);
                for v in vec_ident {
                    v.accept(visitor);
                }
                expr.accept(visitor);
            }
            Dim(_, vec_var) | Read(_, vec_var) => {
                for var in vec_var {
                    var.accept(visitor);
                }
            }
            For(_, ident, from, to, step) => {
                ident.accept(visitor);
                from.accept(visitor);
                to.accept(visitor);
                if let Some(step) = step {
                    step.accept(visitor);
                }
            }
            Load(_, expr) | Mode(_, expr) | RunFile(_, expr) | Save(_, expr)
            | While(_, expr) => {
                expr.accept(visitor);
            }
            If(_, predicate, vec_stmt1, vec_stmt2) => {
                predicate.accept(visitor);
                for stmt in vec_stmt1 {
                    stmt.accept(visitor);
                }
                for stmt in vec_stmt2 {
                    stmt.accept(visitor);
                }
            }
            Input(_, stream, _, vec_var) => {
                if let Some(stream) = stream {
                    stream.accept(visitor);
                }
                for var in vec_var {
                    var.accept(visitor);
                }
            }
            Let(_, var, expr) => {
                var.accept(visitor);
                expr.accept(visitor);
            }
            Next(_, vec_ident) => {
                for ident in vec_ident {
                    ident.accept(visitor);
                }
            }
            OnGosub(_, expr, _) | OnGoto(_, expr, _) => {
                expr.accept(visitor);
            }
            OnSqGosub(_, channel, _) => {
                channel.accept(visitor);
            }
            Print(_, stream, items) => {
                if let Some(stream) = stream {
                    stream.accept(visitor);
                }
                for item in items {
                    if let PrintItem::Expr(expr) = item {
                        expr.accept(visitor);
                    }
                }
            }
            Sound(_, channel, period, duration) => {
                channel.accept(visitor);
                period.accept(visitor);
                if let Some(duration) = duration {
                    duration.accept(visitor);
                }
            }
        }
        visitor.visit_statement(self)
    }
}

impl AcceptVisitor for Expression {
    fn accept<V: Visitor>(&self, visitor: &mut V) {
        use Expression::*;
        match self {
            Integer(..) | Hex(..) | Binary(..) | Real(..) | String(..) => {}
            Variable(_, var) | AddressOf(_, var) => {
                var.accept(visitor);
            }
            Negation(_, expr) | Not(_, expr) => expr.accept(visitor),
            Power(_, expr1, expr2)
            | Multiply(_, expr1, expr2)
            | Divide(_, expr1, expr2)
            | DivideInt(_, expr1, expr2)
            | Modulo(_, expr1, expr2)
            | Add(_, expr1, expr2)
            | Subtract(_, expr1, expr2)
            | Equal(_, expr1, expr2)
            | NotEqual(_, expr1, expr2)
            | Less(_, expr1, expr2)
            | LessEqual(_, expr1, expr2)
            | Greater(_, expr1, expr2)
            | GreaterEqual(_, expr1, expr2)
            | And(_, expr1, expr2)
            | Or(_, expr1, expr2)
            | Xor(_, expr1, expr2) => {
                expr1.accept(visitor);
                expr2.accept(visitor);
            }
        }
        visitor.visit_expression(self)
    }
}

// Canonical re-serialization. `LIST` and the pretty-printer walk the
// AST through these impls; printing an already-canonical line is
// byte-stable.

fn fmt_real(v: f64) -> String {
    let mut s = format!("{}", v);
    if !s.contains('.') && !s.contains('e') && !s.contains('E') {
        s.push_str(".0");
    }
    s.replace('e', "E")
}

fn fmt_letter_ranges(f: &mut std::fmt::Formatter, ranges: &[(char, char)]) -> std::fmt::Result {
    for (i, (from, to)) in ranges.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        if from == to {
            write!(f, "{}", from)?;
        } else {
            write!(f, "{}-{}", from, to)?;
        }
    }
    Ok(())
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Variable::*;
        match self {
            Unary(_, ident) => write!(f, "{}", ident),
            Array(_, ident, vec_expr) => {
                write!(f, "{}(", ident)?;
                for (i, expr) in vec_expr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", expr)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Expression {
    // Binding strength for re-inserting parentheses when printing.
    fn precedence(&self) -> usize {
        use Expression::*;
        match self {
            Integer(..) | Hex(..) | Binary(..) | Real(..) | String(..) | Variable(..)
            | AddressOf(..) => 15,
            Power(..) => 13,
            Negation(..) => 12,
            Multiply(..) | Divide(..) => 11,
            DivideInt(..) => 10,
            Modulo(..) => 9,
            Add(..) | Subtract(..) => 8,
            Equal(..) | NotEqual(..) | Less(..) | LessEqual(..) | Greater(..)
            | GreaterEqual(..) => 7,
            Not(..) => 6,
            And(..) => 5,
            Or(..) => 4,
            Xor(..) => 3,
        }
    }

    fn fmt_operand(
        &self,
        f: &mut std::fmt::Formatter,
        parent: usize,
        loose: bool,
    ) -> std::fmt::Result {
        let prec = self.precedence();
        if prec < parent || (loose && prec == parent) {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Expression::*;
        let binary = |f: &mut std::fmt::Formatter,
                      op: &str,
                      spaced: bool,
                      prec: usize,
                      lhs: &Expression,
                      rhs: &Expression|
         -> std::fmt::Result {
            lhs.fmt_operand(f, prec, false)?;
            if spaced {
                write!(f, " {} ", op)?;
            } else {
                write!(f, "{}", op)?;
            }
            rhs.fmt_operand(f, prec, true)
        };
        match self {
            Integer(_, v) => write!(f, "{}", v),
            Hex(_, v) => write!(f, "&{:X}", *v as u16),
            Binary(_, v) => write!(f, "&X{:b}", *v as u16),
            Real(_, v) => write!(f, "{}", fmt_real(*v)),
            String(_, s) => write!(f, "\"{}\"", s),
            Variable(_, var) => write!(f, "{}", var),
            AddressOf(_, var) => write!(f, "@{}", var),
            Negation(_, expr) => {
                write!(f, "-")?;
                expr.fmt_operand(f, self.precedence(), true)
            }
            Not(_, expr) => {
                write!(f, "NOT ")?;
                expr.fmt_operand(f, self.precedence(), true)
            }
            Power(_, l, r) => binary(f, "^", false, self.precedence(), l, r),
            Multiply(_, l, r) => binary(f, "*", false, self.precedence(), l, r),
            Divide(_, l, r) => binary(f, "/", false, self.precedence(), l, r),
            DivideInt(_, l, r) => binary(f, "\\", false, self.precedence(), l, r),
            Modulo(_, l, r) => binary(f, "MOD", true, self.precedence(), l, r),
            Add(_, l, r) => binary(f, "+", false, self.precedence(), l, r),
            Subtract(_, l, r) => binary(f, "-", false, self.precedence(), l, r),
            Equal(_, l, r) => binary(f, "=", false, self.precedence(), l, r),
            NotEqual(_, l, r) => binary(f, "<>", false, self.precedence(), l, r),
            Less(_, l, r) => binary(f, "<", false, self.precedence(), l, r),
            LessEqual(_, l, r) => binary(f, "<=", false, self.precedence(), l, r),
            Greater(_, l, r) => binary(f, ">", false, self.precedence(), l, r),
            GreaterEqual(_, l, r) => binary(f, ">=", false, self.precedence(), l, r),
            And(_, l, r) => binary(f, "AND", true, self.precedence(), l, r),
            Or(_, l, r) => binary(f, "OR", true, self.precedence(), l, r),
            Xor(_, l, r) => binary(f, "XOR", true, self.precedence(), l, r),
        }
    }
}

fn fmt_statements(f: &mut std::fmt::Formatter, stmts: &[Statement]) -> std::fmt::Result {
    for (i, stmt) in stmts.iter().enumerate() {
        if i > 0 {
            write!(f, ":")?;
        }
        write!(f, "{}", stmt)?;
    }
    Ok(())
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Statement::*;
        match self {
            After(_, delay, slot, line) => {
                write!(f, "AFTER {}", delay)?;
                if let Some(slot) = slot {
                    write!(f, ",{}", slot)?;
                }
                write!(f, " GOSUB {}", line.1)
            }
            Chain(_, merge, file, line) => {
                if *merge {
                    write!(f, "CHAIN MERGE {}", file)?;
                } else {
                    write!(f, "CHAIN {}", file)?;
                }
                if let Some(line) = line {
                    write!(f, ",{}", line.1)?;
                }
                Ok(())
            }
            Clear(_) => write!(f, "CLEAR"),
            Cls(_) => write!(f, "CLS"),
            Cont(_) => write!(f, "CONT"),
            Data(_, items) => {
                write!(f, "DATA ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    if item.quoted {
                        write!(f, "\"{}\"", item.text)?;
                    } else {
                        write!(f, "{}", item.text)?;
                    }
                }
                Ok(())
            }
            DefFn(_, name, params, expr) => {
                write!(f, "DEF {}", name)?;
                if !params.is_empty() {
                    write!(f, "(")?;
                    for (i, p) in params.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{}", p)?;
                    }
                    write!(f, ")")?;
                }
                write!(f, "={}", expr)
            }
            Defint(_, ranges) => {
                write!(f, "DEFINT ")?;
                fmt_letter_ranges(f, ranges)
            }
            Defreal(_, ranges) => {
                write!(f, "DEFREAL ")?;
                fmt_letter_ranges(f, ranges)
            }
            Defstr(_, ranges) => {
                write!(f, "DEFSTR ")?;
                fmt_letter_ranges(f, ranges)
            }
            Dim(_, vars) => {
                write!(f, "DIM ")?;
                for (i, var) in vars.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", var)?;
                }
                Ok(())
            }
            End(_) => write!(f, "END"),
            Every(_, delay, slot, line) => {
                write!(f, "EVERY {}", delay)?;
                if let Some(slot) = slot {
                    write!(f, ",{}", slot)?;
                }
                write!(f, " GOSUB {}", line.1)
            }
            For(_, ident, from, to, step) => {
                write!(f, "FOR {}={} TO {}", ident, from, to)?;
                if let Some(step) = step {
                    write!(f, " STEP {}", step)?;
                }
                Ok(())
            }
            Frame(_) => write!(f, "FRAME"),
            Gosub(_, line) => write!(f, "GOSUB {}", line.1),
            Goto(_, line) => write!(f, "GOTO {}", line.1),
            If(_, predicate, then_stmts, else_stmts) => {
                write!(f, "IF {} THEN ", predicate)?;
                fmt_statements(f, then_stmts)?;
                if !else_stmts.is_empty() {
                    write!(f, " ELSE ")?;
                    fmt_statements(f, else_stmts)?;
                }
                Ok(())
            }
            Input(_, stream, prompt, vars) => {
                write!(f, "INPUT ")?;
                if let Some(stream) = stream {
                    write!(f, "#{},", stream)?;
                }
                if let Some(prompt) = prompt {
                    write!(f, "\"{}\";", prompt)?;
                }
                for (i, var) in vars.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", var)?;
                }
                Ok(())
            }
            Let(_, var, expr) => write!(f, "{}={}", var, expr),
            List(_, from, to) => {
                write!(f, "LIST")?;
                match (from, to) {
                    (Some(from), Some(to)) if from.1 == to.1 => write!(f, " {}", from.1),
                    (Some(from), Some(to)) => write!(f, " {}-{}", from.1, to.1),
                    (Some(from), None) => write!(f, " {}-", from.1),
                    (None, Some(to)) => write!(f, " -{}", to.1),
                    (None, None) => Ok(()),
                }
            }
            Load(_, file) => write!(f, "LOAD {}", file),
            Mode(_, mode) => write!(f, "MODE {}", mode),
            New(_) => write!(f, "NEW"),
            Next(_, idents) => {
                write!(f, "NEXT")?;
                for (i, ident) in idents.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",{}", ident)?;
                    } else {
                        write!(f, " {}", ident)?;
                    }
                }
                Ok(())
            }
            OnBreakCont(_) => write!(f, "ON BREAK CONT"),
            OnBreakGosub(_, line) => write!(f, "ON BREAK GOSUB {}", line.1),
            OnBreakStop(_) => write!(f, "ON BREAK STOP"),
            OnErrorGoto(_, line) => write!(f, "ON ERROR GOTO {}", line.1),
            OnGosub(_, selector, lines) => {
                write!(f, "ON {} GOSUB ", selector)?;
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", line.1)?;
                }
                Ok(())
            }
            OnGoto(_, selector, lines) => {
                write!(f, "ON {} GOTO ", selector)?;
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", line.1)?;
                }
                Ok(())
            }
            OnSqGosub(_, channel, line) => write!(f, "ON SQ({}) GOSUB {}", channel, line.1),
            Print(_, stream, items) => {
                write!(f, "PRINT")?;
                if let Some(stream) = stream {
                    write!(f, " #{},", stream)?;
                }
                let mut first = true;
                for item in items {
                    match item {
                        PrintItem::Expr(expr) => {
                            if first && stream.is_none() {
                                write!(f, " ")?;
                            }
                            write!(f, "{}", expr)?;
                        }
                        PrintItem::Semicolon(_) => write!(f, ";")?,
                        PrintItem::Comma(_) => write!(f, ",")?,
                    }
                    first = false;
                }
                Ok(())
            }
            Read(_, vars) => {
                write!(f, "READ ")?;
                for (i, var) in vars.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", var)?;
                }
                Ok(())
            }
            Rem(_, apostrophe, text) => {
                if *apostrophe {
                    write!(f, "'{}", text)
                } else if text.is_empty() {
                    write!(f, "REM")
                } else {
                    write!(f, "REM{}", text)
                }
            }
            Renum(_, args) => {
                write!(f, "RENUM")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",{}", arg.1)?;
                    } else {
                        write!(f, " {}", arg.1)?;
                    }
                }
                Ok(())
            }
            Restore(_, line) => match line {
                Some(line) => write!(f, "RESTORE {}", line.1),
                None => write!(f, "RESTORE"),
            },
            Resume(_, line) => match line {
                Some(line) => write!(f, "RESUME {}", line.1),
                None => write!(f, "RESUME"),
            },
            ResumeNext(_) => write!(f, "RESUME NEXT"),
            Return(_) => write!(f, "RETURN"),
            Run(_, line) => match line {
                Some(line) => write!(f, "RUN {}", line.1),
                None => write!(f, "RUN"),
            },
            RunFile(_, file) => write!(f, "RUN {}", file),
            Save(_, file) => write!(f, "SAVE {}", file),
            Sound(_, channel, period, duration) => {
                write!(f, "SOUND {},{}", channel, period)?;
                if let Some(duration) = duration {
                    write!(f, ",{}", duration)?;
                }
                Ok(())
            }
            Stop(_) => write!(f, "STOP"),
            Troff(_) => write!(f, "TROFF"),
            Tron(_) => write!(f, "TRON"),
            Wend(_) => write!(f, "WEND"),
            While(_, predicate) => write!(f, "WHILE {}", predicate),
        }
    }
}
