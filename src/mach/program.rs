use super::codegen::{self, GenState};
use super::{Address, Link, Opcode, Symbol};
use crate::error;
use crate::lang::{Error, Line, LineNumber};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

/// One DATA literal, pooled out-of-line at generation time.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    pub text: Rc<str>,
    pub quoted: bool,
}

/// ## A compiled program
///
/// Opcodes and the label table (in the master `Link`), the DATA pool
/// with its line index, and the compile error lists. Indirect errors
/// belong to numbered lines; direct errors to the statement just
/// entered. The watermark separates program code from the most
/// recent direct statement, which is unwound before the next one.

pub struct Program {
    link: Link,
    state: GenState,
    data: Vec<Datum>,
    data_index: BTreeMap<u16, usize>,
    data_watermark: usize,
    line_number: LineNumber,
    watermark: Address,
    indirect_errors: Arc<Vec<Error>>,
    direct_errors: Arc<Vec<Error>>,
    errors: Vec<Error>,
}

impl Default for Program {
    fn default() -> Program {
        Program::new()
    }
}

impl Program {
    pub fn new() -> Program {
        Program {
            link: Link::new(),
            state: GenState::new(),
            data: vec![],
            data_index: BTreeMap::new(),
            data_watermark: 0,
            line_number: None,
            watermark: 0,
            indirect_errors: Arc::default(),
            direct_errors: Arc::default(),
            errors: vec![],
        }
    }

    pub fn clear(&mut self) {
        self.link.clear();
        self.state = GenState::new();
        self.data.clear();
        self.data_index.clear();
        self.data_watermark = 0;
        self.line_number = None;
        self.watermark = 0;
        self.indirect_errors = Arc::default();
        self.direct_errors = Arc::default();
        self.errors.clear();
    }

    pub fn error(&mut self, error: Error) {
        self.errors.push(error.in_line_number(self.line_number));
    }

    pub fn line_number(&self) -> LineNumber {
        self.line_number
    }

    pub fn push(&mut self, op: Opcode) -> Result<(), Error> {
        self.link.push(op)
    }

    pub fn append(&mut self, frag: Link) -> Result<(), Error> {
        self.link.append(frag)
    }

    pub fn next_symbol(&mut self) -> Symbol {
        self.link.next_symbol()
    }

    pub fn link_mut(&mut self) -> &mut Link {
        &mut self.link
    }

    pub fn state_mut(&mut self) -> &mut GenState {
        &mut self.state
    }

    pub fn op(&self, addr: Address) -> Option<&Opcode> {
        self.link.get(addr)
    }

    pub fn push_data(&mut self, text: Rc<str>, quoted: bool) {
        if let Some(number) = self.line_number {
            self.data_index.entry(number).or_insert(self.data.len());
        }
        self.data.push(Datum { text, quoted });
    }

    pub fn data(&self, index: usize) -> Option<&Datum> {
        self.data.get(index)
    }

    /// First DATA offset at or after a line; the pool's end if there
    /// is none.
    pub fn data_offset(&self, line: u16) -> usize {
        match self.data_index.range(line..).next() {
            Some((_, offset)) => *offset,
            None => self.data.len(),
        }
    }

    pub fn indirect_errors(&self) -> &Arc<Vec<Error>> {
        &self.indirect_errors
    }

    pub fn direct_errors(&self) -> &Arc<Vec<Error>> {
        &self.direct_errors
    }

    /// Compile the numbered program. Every line is generated in
    /// order; loop bookkeeping and DEF ranges carry across lines.
    pub fn compile<'a, T: IntoIterator<Item = &'a Line>>(&mut self, lines: T) {
        debug_assert!(self.line_number.is_none() && self.link.is_empty());
        for line in lines {
            self.compile_line(line);
        }
        self.line_number = None;
        // Running off the last line ends the program rather than
        // falling into whatever direct statement comes next.
        if let Err(error) = self.link.push(Opcode::End) {
            self.error(error);
        }
        for error in self.state.take_unclosed_errors() {
            self.errors.push(error);
        }
        let mut errors = self.link.link();
        self.errors.append(&mut errors);
        self.link.prune();
        self.indirect_errors = Arc::new(std::mem::take(&mut self.errors));
        self.watermark = self.link.len();
        self.data_watermark = self.data.len();
    }

    /// Compile one direct line after the watermark, unwinding any
    /// previous direct code first. Returns the address to execute
    /// from.
    pub fn compile_direct(&mut self, line: &Line) -> Address {
        debug_assert!(line.is_direct());
        self.link.truncate(self.watermark);
        self.data.truncate(self.data_watermark);
        self.errors.clear();
        let symbol_watermark = self.link.start_symbol();
        self.compile_line(line);
        if let Err(error) = self.link.push(Opcode::End) {
            self.error(error);
        }
        for error in self.state.take_unclosed_errors() {
            self.errors.push(error);
        }
        let mut errors = self.link.link();
        self.errors.append(&mut errors);
        self.link.set_start_symbol(symbol_watermark);
        self.direct_errors = Arc::new(std::mem::take(&mut self.errors));
        self.watermark
    }

    fn compile_line(&mut self, line: &Line) {
        self.line_number = line.number();
        if let Some(number) = line.number() {
            self.link.push_symbol(number as Symbol);
            if let Err(error) = self.link.push(Opcode::Line(number)) {
                self.error(error);
            }
        }
        match line.ast() {
            Ok(ast) => codegen::codegen(self, &ast),
            Err(error) => self.errors.push(error),
        }
    }

    /// Start of the direct-statement region.
    pub fn watermark(&self) -> Address {
        self.watermark
    }

    /// Static line lookup for RUN, RESUME n and timer targets.
    pub fn line_address(&self, line: u16) -> Result<Address, Error> {
        match self.link.address_of(line as Symbol) {
            Some(addr) => Ok(addr),
            None => Err(error!(UndefinedLine)),
        }
    }

}
