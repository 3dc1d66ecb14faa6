use super::link::Link;
use super::opcode::{Opcode, Ty};
use super::{Function, Program, Stack, Symbol, Val};
use crate::error;
use crate::lang::ast::{self, AcceptVisitor};
use crate::lang::{Column, Error, LineNumber};
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Lower one line's statement list into the program. Expression
/// fragments are built leaf-first by the AST visitor and combined on
/// small stacks; every fragment carries the static type the
/// expression was inferred to produce.
pub fn codegen(program: &mut Program, ast: &[ast::Statement]) {
    Visitor::accept(program, ast)
}

/// Generation state that crosses line boundaries: active DEF type
/// ranges and the statically matched FOR/WHILE loops.
pub struct GenState {
    def_types: [Ty; 26],
    fors: Vec<ForGen>,
    whiles: Vec<WhileGen>,
}

struct ForGen {
    key: Rc<str>,
    line: LineNumber,
    col: Column,
    inc: Symbol,
    exit: Symbol,
}

struct WhileGen {
    line: LineNumber,
    col: Column,
    test: Symbol,
    exit: Symbol,
}

impl GenState {
    pub fn new() -> GenState {
        GenState {
            def_types: [Ty::Real; 26],
            fors: vec![],
            whiles: vec![],
        }
    }

    fn set_ranges(&mut self, ranges: &[(char, char)], ty: Ty) {
        for (from, to) in ranges {
            for letter in *from..=*to {
                if letter.is_ascii_alphabetic() {
                    let index = (letter.to_ascii_uppercase() as u8 - b'A') as usize;
                    self.def_types[index] = ty;
                }
            }
        }
    }

    fn resolve(&self, ident: &ast::Ident) -> (Rc<str>, Rc<str>, Ty) {
        match ident {
            ast::Ident::String(_, s) => (s.clone(), s.clone(), Ty::String),
            ast::Ident::Integer(_, s) => (s.clone(), s.clone(), Ty::Integer),
            ast::Ident::Real(_, s) => (s.clone(), s.clone(), Ty::Real),
            ast::Ident::Plain(_, s) => {
                let first = s.chars().next().unwrap_or('A').to_ascii_uppercase();
                let ty = self.def_types[(first as u8 - b'A') as usize];
                let sigil = match ty {
                    Ty::Integer => '%',
                    Ty::Real => '!',
                    Ty::String => '$',
                };
                (s.clone(), format!("{}{}", s, sigil).into(), ty)
            }
        }
    }

    /// A FOR or WHILE left open at the end of a compile is fatal.
    pub fn take_unclosed_errors(&mut self) -> Vec<Error> {
        let mut errors: Vec<Error> = vec![];
        for f in self.fors.drain(..) {
            errors.push(error!(NextMissing, f.line, ..&f.col));
        }
        for w in self.whiles.drain(..) {
            errors.push(error!(WendMissing, w.line, ..&w.col));
        }
        errors
    }
}

struct Visitor<'a> {
    prog: &'a mut Program,
    gen: Generator,
}

impl<'a> Visitor<'a> {
    fn accept(program: &mut Program, ast: &[ast::Statement]) {
        let mut this = Visitor {
            prog: program,
            gen: Generator::new(),
        };
        for statement in ast {
            statement.accept(&mut this);
        }
        for (_col, frag) in this.gen.stmt.drain(..) {
            if let Some(error) = this.prog.append(frag).err() {
                this.prog.error(error);
                break;
            }
        }
        debug_assert_eq!(0, this.gen.var.len());
        debug_assert_eq!(0, this.gen.expr.len());
    }
}

impl<'a> ast::Visitor for Visitor<'a> {
    fn visit_statement(&mut self, statement: &ast::Statement) {
        let mut frag = Link::new();
        let col = match self.gen.statement(&mut frag, self.prog, statement) {
            Ok(col) => col,
            Err(e) => {
                self.prog.error(e);
                0..0
            }
        };
        if let Some(error) = self.gen.stmt.push((col.clone(), frag)).err() {
            self.prog.error(error.in_column(&col))
        }
    }

    fn visit_variable(&mut self, var: &ast::Variable) {
        match self.gen.variable(self.prog, var) {
            Ok(item) => {
                if let Some(error) = self.gen.var.push(item).err() {
                    self.prog.error(error)
                }
            }
            Err(e) => {
                self.prog.error(e);
                let degenerate = VarItem {
                    col: var.column(),
                    raw: "".into(),
                    key: "".into(),
                    ty: Ty::Real,
                    link: Link::new(),
                    args: None,
                    arg_tys: vec![],
                };
                let _ = self.gen.var.push(degenerate);
            }
        }
    }

    fn visit_expression(&mut self, expression: &ast::Expression) {
        let mut frag = Link::new();
        match self.gen.expression(&mut frag, expression) {
            Ok((col, ty)) => {
                if let Some(error) = self.gen.expr.push((col.clone(), frag, ty)).err() {
                    self.prog.error(error.in_column(&col))
                }
            }
            Err(e) => {
                self.prog.error(e);
                let _ = self.gen.expr.push((expression.column(), Link::new(), Ty::Real));
            }
        }
    }
}

#[derive(Debug)]
struct VarItem {
    col: Column,
    raw: Rc<str>,
    key: Rc<str>,
    ty: Ty,
    link: Link,
    args: Option<usize>,
    arg_tys: Vec<Ty>,
}

impl VarItem {
    fn test_for_assignable(&self) -> Result<()> {
        if Function::opcode_and_arity(&self.raw).is_some() {
            return Err(error!(SyntaxError, ..&self.col; "reserved for built-in"));
        }
        if self.raw.starts_with("FN") {
            return Err(error!(SyntaxError, ..&self.col; "not a variable"));
        }
        Ok(())
    }

    fn push_as_expression(self, frag: &mut Link) -> Result<(Column, Ty)> {
        if let Some((opcode, arity)) = Function::opcode_and_arity(&self.raw) {
            let len = self.args.unwrap_or(0);
            if !arity.contains(&len) {
                return Err(error!(SyntaxError, ..&self.col; "wrong number of arguments"));
            }
            if let Some(error) = Function::check_args(&opcode, &self.arg_tys).err() {
                return Err(error.in_column(&self.col));
            }
            let ty = Function::return_ty(&opcode);
            frag.append(self.link)?;
            if arity.start() != arity.end() {
                frag.push(Opcode::Literal(Val::try_from(len)?))?;
            }
            frag.push(opcode)?;
            return Ok((self.col, ty));
        }
        if self.raw.starts_with("FN") {
            let len = self.args.unwrap_or(0);
            frag.append(self.link)?;
            frag.push(Opcode::CallFn(self.key, len))?;
            return Ok((self.col, self.ty));
        }
        match self.args {
            None => {
                debug_assert!(self.link.is_empty());
                frag.push(Opcode::Push(self.key))?;
            }
            Some(len) => {
                self.check_subscripts()?;
                frag.append(self.link)?;
                frag.push(Opcode::PushArr(self.key, len))?;
            }
        }
        Ok((self.col, self.ty))
    }

    /// Append the store sequence. The value to store is already on
    /// the stack; subscripts go on top of it for PopArr.
    fn push_as_pop(self, frag: &mut Link) -> Result<Column> {
        self.test_for_assignable()?;
        match self.args {
            None => {
                debug_assert!(self.link.is_empty());
                frag.push(Opcode::Pop(self.key))?;
            }
            Some(len) => {
                if len == 0 {
                    return Err(error!(SyntaxError, ..&self.col; "missing subscript"));
                }
                self.check_subscripts()?;
                frag.append(self.link)?;
                frag.push(Opcode::PopArr(self.key, len))?;
            }
        }
        Ok(self.col)
    }

    fn push_as_dim(self, frag: &mut Link) -> Result<Column> {
        self.test_for_assignable()?;
        match self.args {
            Some(len) if len > 0 => {
                self.check_subscripts()?;
                frag.append(self.link)?;
                frag.push(Opcode::DimArr(self.key, len))?;
                Ok(self.col)
            }
            _ => Err(error!(SyntaxError, ..&self.col; "not an array")),
        }
    }

    fn check_subscripts(&self) -> Result<()> {
        if self.arg_tys.iter().any(|t| *t == Ty::String) {
            return Err(error!(TypeMismatch, ..&self.col; "subscript must be numeric"));
        }
        Ok(())
    }
}

struct Generator {
    var: Stack<VarItem>,
    expr: Stack<(Column, Link, Ty)>,
    stmt: Stack<(Column, Link)>,
}

fn numeric(ty: Ty, col: &Column) -> Result<()> {
    if ty == Ty::String {
        return Err(error!(TypeMismatch, ..col));
    }
    Ok(())
}

// Constant bounds for FOR specialization.
fn const_val(expr: &ast::Expression) -> Option<Val> {
    use ast::Expression;
    match expr {
        Expression::Integer(_, v) | Expression::Hex(_, v) | Expression::Binary(_, v) => {
            Some(Val::Integer(*v))
        }
        Expression::Real(_, v) => Some(Val::Real(*v)),
        Expression::Negation(_, e) => match const_val(e) {
            Some(Val::Integer(n)) => n.checked_neg().map(Val::Integer),
            Some(Val::Real(v)) => Some(Val::Real(-v)),
            _ => None,
        },
        _ => None,
    }
}

impl Generator {
    fn new() -> Generator {
        Generator {
            var: Stack::new("variable overflow"),
            expr: Stack::new("expression overflow"),
            stmt: Stack::new("statement overflow"),
        }
    }

    fn variable(&mut self, prog: &mut Program, var: &ast::Variable) -> Result<VarItem> {
        let (raw, key, ty) = prog.state_mut().resolve(var.ident());
        let (col, args, link, arg_tys) = match var {
            ast::Variable::Unary(col, _) => (col.clone(), None, Link::new(), vec![]),
            ast::Variable::Array(col, _, vec_expr) => {
                let len = vec_expr.len();
                let mut link = Link::new();
                let mut arg_tys: Vec<Ty> = vec![];
                for (_col, ops, ty) in self.expr.pop_n(len)? {
                    link.append(ops)?;
                    arg_tys.push(ty);
                }
                (col.clone(), Some(len), link, arg_tys)
            }
        };
        Ok(VarItem {
            col,
            raw,
            key,
            ty,
            link,
            args,
            arg_tys,
        })
    }

    fn expression(&mut self, frag: &mut Link, expr: &ast::Expression) -> Result<(Column, Ty)> {
        fn unary_numeric(
            this: &mut Generator,
            frag: &mut Link,
            op: Opcode,
            col: &Column,
            ty_out: Option<Ty>,
        ) -> Result<(Column, Ty)> {
            let (expr_col, ops, ty) = this.expr.pop()?;
            numeric(ty, &expr_col)?;
            frag.append(ops)?;
            frag.push(op)?;
            Ok((col.start..expr_col.end, ty_out.unwrap_or(ty)))
        }
        // Mixed integer/real promotes to real; strings never mix
        // with numbers.
        fn combine_arith(lhs: Ty, rhs: Ty, col: &Column) -> Result<Ty> {
            match (lhs, rhs) {
                (Ty::Integer, Ty::Integer) => Ok(Ty::Integer),
                (Ty::String, _) | (_, Ty::String) => Err(error!(TypeMismatch, ..col)),
                _ => Ok(Ty::Real),
            }
        }
        fn binary(
            this: &mut Generator,
            frag: &mut Link,
            op: Opcode,
            combine: impl Fn(Ty, Ty, &Column) -> Result<Ty>,
        ) -> Result<(Column, Ty)> {
            let (col_rhs, rhs, ty_rhs) = this.expr.pop()?;
            let (col_lhs, lhs, ty_lhs) = this.expr.pop()?;
            let col = col_lhs.start..col_rhs.end;
            let ty = combine(ty_lhs, ty_rhs, &col)?;
            frag.append(lhs)?;
            frag.append(rhs)?;
            frag.push(op)?;
            Ok((col, ty))
        }
        fn literal(frag: &mut Link, col: &Column, val: Val, ty: Ty) -> Result<(Column, Ty)> {
            frag.push(Opcode::Literal(val))?;
            Ok((col.clone(), ty))
        }
        let int_op = |l: Ty, r: Ty, col: &Column| -> Result<Ty> {
            numeric(l, col)?;
            numeric(r, col)?;
            Ok(Ty::Integer)
        };
        let real_op = |l: Ty, r: Ty, col: &Column| -> Result<Ty> {
            numeric(l, col)?;
            numeric(r, col)?;
            Ok(Ty::Real)
        };
        let compare_op = |l: Ty, r: Ty, col: &Column| -> Result<Ty> {
            match (l, r) {
                (Ty::String, Ty::String) => Ok(Ty::Integer),
                (Ty::String, _) | (_, Ty::String) => Err(error!(TypeMismatch, ..col)),
                _ => Ok(Ty::Integer),
            }
        };
        let concat_op = |l: Ty, r: Ty, col: &Column| -> Result<Ty> {
            match (l, r) {
                (Ty::String, Ty::String) => Ok(Ty::String),
                _ => combine_arith(l, r, col),
            }
        };
        use ast::Expression;
        match expr {
            Expression::Integer(col, val) => {
                literal(frag, col, Val::Integer(*val), Ty::Integer)
            }
            Expression::Hex(col, val) | Expression::Binary(col, val) => {
                literal(frag, col, Val::Integer(*val), Ty::Integer)
            }
            Expression::Real(col, val) => literal(frag, col, Val::Real(*val), Ty::Real),
            Expression::String(col, val) => {
                literal(frag, col, Val::String(val.clone()), Ty::String)
            }
            Expression::Variable(..) => self.var.pop()?.push_as_expression(frag),
            Expression::AddressOf(col, _) => {
                let item = self.var.pop()?;
                if item.args.is_some() {
                    return Err(error!(ImproperArgument, ..&item.col));
                }
                frag.push(Opcode::Addr(item.key))?;
                Ok((col.start..item.col.end, Ty::Integer))
            }
            Expression::Negation(col, ..) => unary_numeric(self, frag, Opcode::Neg, col, None),
            Expression::Not(col, ..) => {
                unary_numeric(self, frag, Opcode::Not, col, Some(Ty::Integer))
            }
            Expression::Power(..) => binary(self, frag, Opcode::Pow, real_op),
            Expression::Multiply(..) => binary(self, frag, Opcode::Mul, combine_arith),
            Expression::Divide(..) => binary(self, frag, Opcode::Div, real_op),
            Expression::DivideInt(..) => binary(self, frag, Opcode::DivInt, int_op),
            Expression::Modulo(..) => binary(self, frag, Opcode::Mod, int_op),
            Expression::Add(..) => binary(self, frag, Opcode::Add, concat_op),
            Expression::Subtract(..) => binary(self, frag, Opcode::Sub, combine_arith),
            Expression::Equal(..) => binary(self, frag, Opcode::Eq, compare_op),
            Expression::NotEqual(..) => binary(self, frag, Opcode::NotEq, compare_op),
            Expression::Less(..) => binary(self, frag, Opcode::Lt, compare_op),
            Expression::LessEqual(..) => binary(self, frag, Opcode::LtEq, compare_op),
            Expression::Greater(..) => binary(self, frag, Opcode::Gt, compare_op),
            Expression::GreaterEqual(..) => binary(self, frag, Opcode::GtEq, compare_op),
            Expression::And(..) => binary(self, frag, Opcode::And, int_op),
            Expression::Or(..) => binary(self, frag, Opcode::Or, int_op),
            Expression::Xor(..) => binary(self, frag, Opcode::Xor, int_op),
        }
    }

    /// Append the value on the stack into the variable, inserting
    /// the narrowing round when a real lands in an integer target.
    fn assign(
        &mut self,
        frag: &mut Link,
        item: VarItem,
        expr_col: &Column,
        expr_ty: Ty,
    ) -> Result<Column> {
        match (item.ty, expr_ty) {
            (Ty::String, Ty::String) => {}
            (Ty::String, _) | (_, Ty::String) => {
                return Err(error!(TypeMismatch, ..expr_col));
            }
            (Ty::Integer, Ty::Real) => frag.push(Opcode::ToInt)?,
            _ => {}
        }
        item.push_as_pop(frag)
    }

    fn statement(
        &mut self,
        frag: &mut Link,
        prog: &mut Program,
        statement: &ast::Statement,
    ) -> Result<Column> {
        use ast::Statement;
        match statement {
            Statement::After(col, _, slot, line) => {
                self.r#after(frag, prog, col, slot.is_some(), line, false)
            }
            Statement::Chain(col, merge, _, line) => self.r#chain(frag, prog, col, *merge, line),
            Statement::Clear(col) => self.push_one(frag, col, Opcode::Clear),
            Statement::Cls(col) => self.push_one(frag, col, Opcode::Cls),
            Statement::Cont(col) => self.push_one(frag, col, Opcode::Cont),
            Statement::Data(col, items) => self.r#data(prog, col, items),
            Statement::DefFn(col, name, params, _) => self.r#def(frag, prog, col, name, params),
            Statement::Defint(col, ranges) => {
                prog.state_mut().set_ranges(ranges, Ty::Integer);
                Ok(col.clone())
            }
            Statement::Defreal(col, ranges) => {
                prog.state_mut().set_ranges(ranges, Ty::Real);
                Ok(col.clone())
            }
            Statement::Defstr(col, ranges) => {
                prog.state_mut().set_ranges(ranges, Ty::String);
                Ok(col.clone())
            }
            Statement::Dim(col, vars) => self.r#dim(frag, col, vars.len()),
            Statement::End(col) => self.push_one(frag, col, Opcode::End),
            Statement::Every(col, _, slot, line) => {
                self.r#after(frag, prog, col, slot.is_some(), line, true)
            }
            Statement::For(col, ident, _, to, step) => {
                self.r#for(frag, prog, col, ident, to, step)
            }
            Statement::Frame(col) => self.push_one(frag, col, Opcode::Frame),
            Statement::Gosub(col, line) => {
                frag.push_gosub(line.0.clone(), line.1 as Symbol)?;
                Ok(col.start..line.0.end)
            }
            Statement::Goto(col, line) => {
                frag.push_jump(line.0.clone(), line.1 as Symbol)?;
                Ok(col.start..line.0.end)
            }
            Statement::If(col, _, th, el) => self.r#if(frag, prog, col, th.len(), el.len()),
            Statement::Input(col, stream, prompt, vars) => {
                self.r#input(frag, col, stream.is_some(), prompt, vars.len())
            }
            Statement::Let(col, _, _) => self.r#let(frag, col),
            Statement::List(col, from, to) => {
                let from = from.as_ref().map(|l| l.1).unwrap_or(1);
                let to = to.as_ref().map(|l| l.1).unwrap_or(65535);
                self.push_one(frag, col, Opcode::List(from, to))
            }
            Statement::Load(col, _) => self.file_op(frag, col, Opcode::Load),
            Statement::Mode(col, _) => {
                let (sub_col, ops, ty) = self.expr.pop()?;
                numeric(ty, &sub_col)?;
                frag.append(ops)?;
                frag.push(Opcode::Mode)?;
                Ok(col.start..sub_col.end)
            }
            Statement::New(col) => self.push_one(frag, col, Opcode::New),
            Statement::Next(col, idents) => self.r#next(frag, prog, col, idents),
            Statement::OnBreakCont(col) => self.push_one(frag, col, Opcode::OnBreakCont),
            Statement::OnBreakGosub(col, line) => {
                frag.check(&line.0, line.1 as Symbol);
                self.push_one(frag, col, Opcode::OnBreakGosub(line.1))
            }
            Statement::OnBreakStop(col) => self.push_one(frag, col, Opcode::OnBreakStop),
            Statement::OnErrorGoto(col, line) => {
                if line.1 != 0 {
                    frag.check(&line.0, line.1 as Symbol);
                }
                self.push_one(frag, col, Opcode::OnErrorGoto(line.1))
            }
            Statement::OnGosub(col, _, lines) => self.r#on(frag, col, lines, true),
            Statement::OnGoto(col, _, lines) => self.r#on(frag, col, lines, false),
            Statement::OnSqGosub(col, _, line) => {
                let (sub_col, ops, ty) = self.expr.pop()?;
                numeric(ty, &sub_col)?;
                frag.append(ops)?;
                frag.check(&line.0, line.1 as Symbol);
                frag.push(Opcode::OnSqGosub(line.1))?;
                Ok(col.start..line.0.end)
            }
            Statement::Print(col, stream, items) => {
                self.r#print(frag, col, stream.is_some(), items)
            }
            Statement::Read(col, vars) => self.r#read(frag, col, vars.len()),
            Statement::Rem(col, ..) => Ok(col.clone()),
            Statement::Renum(col, args) => {
                let get = |i: usize, def: u16| args.get(i).map(|l| l.1).unwrap_or(def);
                self.push_one(
                    frag,
                    col,
                    Opcode::Renum(get(0, 10), get(1, 1), get(2, 10), get(3, 65535)),
                )
            }
            Statement::Restore(col, line) => {
                let target = match line {
                    Some(line) => {
                        frag.check(&line.0, line.1 as Symbol);
                        line.1
                    }
                    None => 0,
                };
                self.push_one(frag, col, Opcode::Restore(target))
            }
            Statement::Resume(col, line) => {
                let target = match line {
                    Some(line) => {
                        frag.check(&line.0, line.1 as Symbol);
                        line.1
                    }
                    None => 0,
                };
                self.push_one(frag, col, Opcode::Resume(target))
            }
            Statement::ResumeNext(col) => self.push_one(frag, col, Opcode::ResumeNext),
            Statement::Return(col) => self.push_one(frag, col, Opcode::Return),
            Statement::Run(col, line) => match line {
                Some(line) => {
                    frag.push_run(line.0.clone(), line.1 as Symbol)?;
                    Ok(col.start..line.0.end)
                }
                None => self.push_one(frag, col, Opcode::Run(0)),
            },
            Statement::RunFile(col, _) => self.file_op(frag, col, Opcode::RunFile),
            Statement::Save(col, _) => self.file_op(frag, col, Opcode::Save),
            Statement::Sound(col, _, _, duration) => {
                self.r#sound(frag, col, duration.is_some())
            }
            Statement::Stop(col) => self.push_one(frag, col, Opcode::Stop),
            Statement::Troff(col) => self.push_one(frag, col, Opcode::Troff),
            Statement::Tron(col) => self.push_one(frag, col, Opcode::Tron),
            Statement::Wend(col) => self.r#wend(frag, prog, col),
            Statement::While(col, _) => self.r#while(frag, prog, col),
        }
    }

    fn push_one(&mut self, frag: &mut Link, col: &Column, op: Opcode) -> Result<Column> {
        frag.push(op)?;
        Ok(col.clone())
    }

    fn file_op(&mut self, frag: &mut Link, col: &Column, op: Opcode) -> Result<Column> {
        let (sub_col, ops, ty) = self.expr.pop()?;
        if ty != Ty::String {
            return Err(error!(TypeMismatch, ..&sub_col));
        }
        frag.append(ops)?;
        frag.push(op)?;
        Ok(col.start..sub_col.end)
    }

    fn r#after(
        &mut self,
        frag: &mut Link,
        _prog: &mut Program,
        col: &Column,
        has_slot: bool,
        line: &ast::LineRef,
        every: bool,
    ) -> Result<Column> {
        let slot = if has_slot { Some(self.expr.pop()?) } else { None };
        let (delay_col, delay_ops, delay_ty) = self.expr.pop()?;
        numeric(delay_ty, &delay_col)?;
        frag.append(delay_ops)?;
        match slot {
            Some((slot_col, slot_ops, slot_ty)) => {
                numeric(slot_ty, &slot_col)?;
                frag.append(slot_ops)?;
            }
            None => frag.push(Opcode::Literal(Val::Integer(0)))?,
        }
        frag.check(&line.0, line.1 as Symbol);
        frag.push(Opcode::Timer(every, line.1))?;
        Ok(col.start..line.0.end)
    }

    fn r#chain(
        &mut self,
        frag: &mut Link,
        prog: &mut Program,
        col: &Column,
        merge: bool,
        line: &Option<ast::LineRef>,
    ) -> Result<Column> {
        let (sub_col, ops, ty) = self.expr.pop()?;
        if ty != Ty::String {
            return Err(error!(TypeMismatch, ..&sub_col));
        }
        frag.append(ops)?;
        // The merge target's lines are unknowable ahead of time, so
        // static target validation goes dark for the whole program.
        prog.link_mut().disable_validation();
        frag.push(Opcode::Chain(merge, line.as_ref().map(|l| l.1)))?;
        Ok(col.start..sub_col.end)
    }

    fn r#data(
        &mut self,
        prog: &mut Program,
        col: &Column,
        items: &[ast::Datum],
    ) -> Result<Column> {
        for item in items {
            prog.push_data(item.text.clone(), item.quoted);
        }
        Ok(col.clone())
    }

    fn r#def(
        &mut self,
        frag: &mut Link,
        prog: &mut Program,
        col: &Column,
        name: &ast::Ident,
        params: &[ast::Ident],
    ) -> Result<Column> {
        let (expr_col, expr_ops, expr_ty) = self.expr.pop()?;
        let (_raw, fn_key, fn_ty) = prog.state_mut().resolve(name);
        let param_keys: Rc<[Rc<str>]> = params
            .iter()
            .map(|p| prog.state_mut().resolve(p).1)
            .collect::<Vec<Rc<str>>>()
            .into();
        let skip = prog.next_symbol();
        frag.push(Opcode::DefFn(fn_key, param_keys))?;
        frag.push_jump(col.clone(), skip)?;
        frag.append(expr_ops)?;
        match (fn_ty, expr_ty) {
            (Ty::String, Ty::String) => {}
            (Ty::String, _) | (_, Ty::String) => {
                return Err(error!(TypeMismatch, ..&expr_col));
            }
            (Ty::Integer, Ty::Real) => frag.push(Opcode::ToInt)?,
            _ => {}
        }
        frag.push(Opcode::FnEnd)?;
        frag.push_symbol(skip);
        Ok(col.clone())
    }

    fn r#dim(&mut self, frag: &mut Link, col: &Column, len: usize) -> Result<Column> {
        let mut col = col.clone();
        for var in self.var.pop_n(len)? {
            let sub_col = var.push_as_dim(frag)?;
            col.end = sub_col.end;
        }
        Ok(col)
    }

    fn r#for(
        &mut self,
        frag: &mut Link,
        prog: &mut Program,
        col: &Column,
        ident: &ast::Ident,
        to: &ast::Expression,
        step: &Option<ast::Expression>,
    ) -> Result<Column> {
        let step_frag = match step {
            Some(_) => Some(self.expr.pop()?),
            None => None,
        };
        let (to_col, to_ops, to_ty) = self.expr.pop()?;
        let (from_col, from_ops, from_ty) = self.expr.pop()?;
        let (_raw, key, ty) = prog.state_mut().resolve(ident);
        numeric(ty, &ident.column())?;
        numeric(from_ty, &from_col)?;
        numeric(to_ty, &to_col)?;
        let to_const = const_val(to);
        let step_const = match step {
            Some(step_expr) => const_val(step_expr),
            None => Some(Val::Integer(1)),
        };
        let narrow = |frag: &mut Link, value_ty: Ty| -> Result<()> {
            if ty == Ty::Integer && value_ty == Ty::Real {
                frag.push(Opcode::ToInt)?;
            }
            Ok(())
        };
        let to_key: Rc<str> = format!("{}.TO", key).into();
        let step_key: Rc<str> = format!("{}.STEP", key).into();

        frag.append(from_ops)?;
        narrow(frag, from_ty)?;
        frag.push(Opcode::Pop(key.clone()))?;
        if to_const.is_none() {
            frag.append(to_ops)?;
            narrow(frag, to_ty)?;
            frag.push(Opcode::Pop(to_key.clone()))?;
        }
        if step_const.is_none() {
            let (step_col, step_ops, step_ty) = step_frag.unwrap();
            numeric(step_ty, &step_col)?;
            frag.append(step_ops)?;
            narrow(frag, step_ty)?;
            frag.push(Opcode::Pop(step_key.clone()))?;
        }
        frag.push(Opcode::ForPush(key.clone()))?;

        let inc = prog.next_symbol();
        let test = prog.next_symbol();
        let exit = prog.next_symbol();
        frag.push_jump(col.clone(), test)?;
        frag.push_symbol(inc);
        frag.push(Opcode::Push(key.clone()))?;
        match &step_const {
            Some(v) => frag.push(Opcode::Literal(v.clone()))?,
            None => frag.push(Opcode::Push(step_key.clone()))?,
        }
        frag.push(Opcode::Add)?;
        frag.push(Opcode::Pop(key.clone()))?;
        frag.push_symbol(test);
        frag.push(Opcode::Push(key.clone()))?;
        match &to_const {
            Some(v) => frag.push(Opcode::Literal(v.clone()))?,
            None => frag.push(Opcode::Push(to_key))?,
        }
        match &step_const {
            // A zero step loops while the variable has not fallen
            // below the limit, like a negative step.
            Some(v) => {
                let positive = match v {
                    Val::Integer(n) => *n > 0,
                    Val::Real(r) => *r > 0.0,
                    Val::String(_) => false,
                };
                if positive {
                    frag.push(Opcode::LtEq)?;
                } else {
                    frag.push(Opcode::GtEq)?;
                }
            }
            None => {
                frag.push(Opcode::Push(step_key))?;
                frag.push(Opcode::ForTest)?;
            }
        }
        frag.push_ifnot(col.clone(), exit)?;
        let line = prog.line_number();
        prog.state_mut().fors.push(ForGen {
            key,
            line,
            col: col.clone(),
            inc,
            exit,
        });
        Ok(col.start..to_col.end)
    }

    fn r#next(
        &mut self,
        frag: &mut Link,
        prog: &mut Program,
        col: &Column,
        idents: &[ast::Ident],
    ) -> Result<Column> {
        let named: Vec<Option<(Rc<str>, Column)>> = if idents.is_empty() {
            vec![None]
        } else {
            idents
                .iter()
                .map(|ident| {
                    let (_raw, key, _ty) = prog.state_mut().resolve(ident);
                    Some((key, ident.column()))
                })
                .collect()
        };
        for name in named {
            let entry = match prog.state_mut().fors.pop() {
                Some(entry) => entry,
                None => {
                    let at = name.as_ref().map(|n| n.1.clone()).unwrap_or_else(|| col.clone());
                    return Err(error!(UnexpectedNext, ..&at));
                }
            };
            if let Some((key, ncol)) = &name {
                if *key != entry.key {
                    prog.state_mut().fors.push(entry);
                    return Err(error!(UnexpectedNext, ..ncol; "does not match FOR"));
                }
            }
            frag.push(Opcode::NextVar(entry.key.clone()))?;
            frag.push_jump(col.clone(), entry.inc)?;
            frag.push_symbol(entry.exit);
            frag.push(Opcode::ForPop)?;
        }
        Ok(col.clone())
    }

    fn r#if(
        &mut self,
        frag: &mut Link,
        prog: &mut Program,
        col: &Column,
        then_len: usize,
        else_len: usize,
    ) -> Result<Column> {
        let (pred_col, predicate, pred_ty) = self.expr.pop()?;
        numeric(pred_ty, &pred_col)?;
        frag.append(predicate)?;
        let else_sym = prog.next_symbol();
        frag.push_ifnot(col.clone(), else_sym)?;
        let elses = self.stmt.pop_n(else_len)?;
        for (_col, stmt_ops) in self.stmt.pop_n(then_len)? {
            frag.append(stmt_ops)?;
        }
        if else_len == 0 {
            frag.push_symbol(else_sym);
        } else {
            let finished_sym = prog.next_symbol();
            frag.push_jump(col.clone(), finished_sym)?;
            frag.push_symbol(else_sym);
            for (_col, stmt_ops) in elses {
                frag.append(stmt_ops)?;
            }
            frag.push_symbol(finished_sym);
        }
        Ok(col.clone())
    }

    fn r#input(
        &mut self,
        frag: &mut Link,
        col: &Column,
        has_stream: bool,
        prompt: &Option<Rc<str>>,
        len: usize,
    ) -> Result<Column> {
        let vars = self.var.pop_n(len)?;
        if has_stream {
            let (sub_col, ops, ty) = self.expr.pop()?;
            numeric(ty, &sub_col)?;
            frag.append(ops)?;
            frag.push(Opcode::Stream)?;
        }
        let prompt = match prompt {
            Some(p) => format!("{}? ", p),
            None => "? ".to_string(),
        };
        frag.push(Opcode::Literal(Val::String(prompt.into())))?;
        frag.push(Opcode::Input(len))?;
        for var in vars {
            frag.push(Opcode::ReadInput(var.ty))?;
            var.push_as_pop(frag)?;
        }
        Ok(col.clone())
    }

    fn r#let(&mut self, frag: &mut Link, col: &Column) -> Result<Column> {
        let (expr_col, expr_ops, expr_ty) = self.expr.pop()?;
        let item = self.var.pop()?;
        frag.append(expr_ops)?;
        let sub_col = self.assign(frag, item, &expr_col, expr_ty)?;
        Ok(col.start..expr_col.end.max(sub_col.end))
    }

    fn r#on(
        &mut self,
        frag: &mut Link,
        col: &Column,
        lines: &[ast::LineRef],
        is_gosub: bool,
    ) -> Result<Column> {
        let (sub_col, ops, ty) = self.expr.pop()?;
        numeric(ty, &sub_col)?;
        frag.append(ops)?;
        if is_gosub {
            frag.push(Opcode::OnGosub(lines.len()))?;
        } else {
            frag.push(Opcode::OnGoto(lines.len()))?;
        }
        let mut full_col = col.clone();
        for line in lines {
            full_col.end = line.0.end;
            frag.push_jump(line.0.clone(), line.1 as Symbol)?;
        }
        Ok(full_col)
    }

    fn r#print(
        &mut self,
        frag: &mut Link,
        col: &Column,
        has_stream: bool,
        items: &[ast::PrintItem],
    ) -> Result<Column> {
        let exprs = items
            .iter()
            .filter(|i| matches!(i, ast::PrintItem::Expr(_)))
            .count();
        let mut expr_frags = self.expr.pop_n(exprs)?;
        let mut expr_iter = expr_frags.drain(..);
        if has_stream {
            let (sub_col, ops, ty) = self.expr.pop()?;
            numeric(ty, &sub_col)?;
            frag.append(ops)?;
            frag.push(Opcode::Stream)?;
        }
        let mut newline = true;
        for item in items {
            match item {
                ast::PrintItem::Expr(_) => {
                    let (_col, ops, _ty) = match expr_iter.next() {
                        Some(e) => e,
                        None => return Err(error!(InternalError)),
                    };
                    frag.append(ops)?;
                    frag.push(Opcode::PrintVal)?;
                    newline = true;
                }
                ast::PrintItem::Semicolon(_) => {
                    newline = false;
                }
                ast::PrintItem::Comma(_) => {
                    frag.push(Opcode::PrintTab)?;
                    newline = false;
                }
            }
        }
        if newline {
            frag.push(Opcode::PrintNl)?;
        }
        frag.push(Opcode::PrintFlush)?;
        Ok(col.clone())
    }

    fn r#read(&mut self, frag: &mut Link, col: &Column, len: usize) -> Result<Column> {
        let mut full_col = col.clone();
        for var in self.var.pop_n(len)? {
            full_col.end = var.col.end;
            frag.push(Opcode::Read(var.ty))?;
            var.push_as_pop(frag)?;
        }
        Ok(full_col)
    }

    fn r#sound(&mut self, frag: &mut Link, col: &Column, has_duration: bool) -> Result<Column> {
        let duration = if has_duration {
            Some(self.expr.pop()?)
        } else {
            None
        };
        let (period_col, period_ops, period_ty) = self.expr.pop()?;
        let (channel_col, channel_ops, channel_ty) = self.expr.pop()?;
        numeric(channel_ty, &channel_col)?;
        numeric(period_ty, &period_col)?;
        frag.append(channel_ops)?;
        frag.append(period_ops)?;
        match duration {
            Some((dur_col, dur_ops, dur_ty)) => {
                numeric(dur_ty, &dur_col)?;
                frag.append(dur_ops)?;
            }
            None => frag.push(Opcode::Literal(Val::Integer(20)))?,
        }
        frag.push(Opcode::Sound)?;
        Ok(col.clone())
    }

    fn r#wend(&mut self, frag: &mut Link, prog: &mut Program, col: &Column) -> Result<Column> {
        let entry = match prog.state_mut().whiles.pop() {
            Some(entry) => entry,
            None => return Err(error!(UnexpectedWend, ..col)),
        };
        frag.push(Opcode::WendCheck)?;
        frag.push_jump(col.clone(), entry.test)?;
        frag.push_symbol(entry.exit);
        frag.push(Opcode::WhilePop)?;
        Ok(col.clone())
    }

    fn r#while(&mut self, frag: &mut Link, prog: &mut Program, col: &Column) -> Result<Column> {
        let (sub_col, ops, ty) = self.expr.pop()?;
        numeric(ty, &sub_col)?;
        let test = prog.next_symbol();
        let exit = prog.next_symbol();
        frag.push(Opcode::WhilePush)?;
        frag.push_symbol(test);
        frag.append(ops)?;
        frag.push_ifnot(col.clone(), exit)?;
        let line = prog.line_number();
        prog.state_mut().whiles.push(WhileGen {
            line,
            col: col.clone(),
            test,
            exit,
        });
        Ok(col.start..sub_col.end)
    }
}
