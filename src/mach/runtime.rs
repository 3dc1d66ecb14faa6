use super::link::UNDEFINED;
use super::opcode::Ty;
use super::stop::{Stop, StopReason, StopRecord};
use super::{Address, Function, Listing, Opcode, Operation, Program, Stack, Val, Var};
use crate::error;
use crate::lang::{Error, Line, LineNumber};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, VecDeque};
use std::convert::TryFrom;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

/// What the machine asks of its host. Every yield is a cooperative
/// suspend: the driver services the event and calls `execute` again;
/// the program counter already points at the right resume position.
#[derive(Debug, PartialEq)]
pub enum Event {
    /// Cycle budget exhausted, nothing else to report.
    Running,
    /// Nothing to do; show the prompt.
    Stopped,
    Errors(Arc<Vec<Error>>),
    /// Text for a print stream.
    Print(u8, String),
    /// Wait for a console reply, delivered through `enter`.
    Input(String),
    Cls,
    Mode(u8),
    /// Wait for frame flyback; call `frame` then execute again.
    Frame,
    Sound {
        channel: u8,
        period: u16,
        duration: u16,
    },
    /// The break key or STOP; a continue point may be kept.
    Break(LineNumber),
    Load(String),
    Run(String),
    Chain {
        name: String,
        merge: bool,
        line: Option<u16>,
    },
    Save(String),
    List(Vec<String>),
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum State {
    Stopped,
    Running,
    InputWait,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BreakMode {
    Stop,
    Cont,
    Gosub(u16),
}

#[derive(Debug)]
enum FrameKind {
    Sub,
    Fn { saved: Vec<(Rc<str>, Val)> },
    Timer { prev: i8 },
    Break,
    Sq,
}

#[derive(Debug)]
struct GosubFrame {
    ret: Address,
    kind: FrameKind,
}

#[derive(Debug, Clone, Copy, Default)]
struct Timer {
    active: bool,
    line: u16,
    every: bool,
    interval: u64,
    next: u64,
}

const SOUND_QUEUE_LEN: usize = 4;

/// ## The cooperative runtime
///
/// A single-threaded state machine over the compiled program. It
/// runs opcodes until something needs the outside world, records the
/// request in the stop-record (priority-arbitrated against anything
/// already pending, like an escape), and yields an `Event`. The
/// GOSUB/FOR/WHILE stacks, timer table, DATA pointer and variables
/// all live here and persist across suspends, which is what lets a
/// BASIC-level statement span any number of host calls.

pub struct Runtime {
    listing: Listing,
    dirty: bool,
    program: Program,
    pc: Address,
    state: State,
    stack: Stack<Val>,
    gosub: Stack<GosubFrame>,
    fors: Stack<Rc<str>>,
    whiles: Stack<Address>,
    vars: Var,
    fns: HashMap<Rc<str>, (Address, Rc<[Rc<str>]>)>,
    data_ptr: usize,
    stop: Stop,
    cont: Option<Address>,
    pending: VecDeque<Event>,
    timers: [Timer; 4],
    ceiling: i8,
    sq_queues: [VecDeque<u16>; 3],
    sq_handlers: [Option<u16>; 3],
    on_break: BreakMode,
    break_pending: bool,
    break_active: bool,
    error_goto: Option<u16>,
    error_resume: Option<Address>,
    err: u16,
    erl: u16,
    trace: bool,
    current_line: u16,
    line_addr: Address,
    frames: u64,
    keys: VecDeque<char>,
    input_fields: Option<VecDeque<String>>,
    input_remaining: usize,
    input_addr: Address,
    input_prompt: Rc<str>,
    rng: StdRng,
    last_rnd: f64,
    print_buf: String,
    stream: u8,
}

impl Default for Runtime {
    fn default() -> Runtime {
        Runtime::new()
    }
}

type OpResult = Result<Option<Event>, Error>;

impl Runtime {
    pub fn new() -> Runtime {
        Runtime {
            listing: Listing::default(),
            // Compile the (empty) program before the first direct
            // statement so the direct region sits past a terminal End.
            dirty: true,
            program: Program::new(),
            pc: 0,
            state: State::Stopped,
            stack: Stack::new("stack overflow"),
            gosub: Stack::new("subroutine stack overflow"),
            fors: Stack::new("loop stack overflow"),
            whiles: Stack::new("loop stack overflow"),
            vars: Var::new(),
            fns: HashMap::new(),
            data_ptr: 0,
            stop: Stop::new(),
            cont: None,
            pending: VecDeque::new(),
            timers: [Timer::default(); 4],
            ceiling: -1,
            sq_queues: [VecDeque::new(), VecDeque::new(), VecDeque::new()],
            sq_handlers: [None; 3],
            on_break: BreakMode::Stop,
            break_pending: false,
            break_active: false,
            error_goto: None,
            error_resume: None,
            err: 0,
            erl: 0,
            trace: false,
            current_line: 0,
            line_addr: 0,
            frames: 0,
            keys: VecDeque::new(),
            input_fields: None,
            input_remaining: 0,
            input_addr: 0,
            input_prompt: "".into(),
            rng: StdRng::from_entropy(),
            last_rnd: 0.0,
            print_buf: String::new(),
            stream: 0,
        }
    }

    pub fn get_listing(&self) -> Listing {
        self.listing.clone()
    }

    /// Replace the program wholesale (LOAD). With `run`, start it.
    pub fn set_listing(&mut self, listing: Listing, run: bool) {
        self.listing = listing;
        self.dirty = true;
        self.cont = None;
        if run {
            self.recompile();
            if self.report_indirect_errors() {
                return;
            }
            self.start_run(0);
        } else {
            self.state = State::Stopped;
        }
    }

    /// CHAIN arrival: merge or replace the program, keep variables,
    /// and continue at the given line (or the start).
    pub fn chain(&mut self, listing: Listing, merge: bool, line: Option<u16>) {
        if merge {
            self.listing.merge(&listing);
        } else {
            self.listing = listing;
        }
        self.recompile();
        if self.report_indirect_errors() {
            return;
        }
        let addr = match line {
            Some(line) => match self.program.line_address(line) {
                Ok(addr) => addr,
                Err(e) => {
                    self.pending
                        .push_back(Event::Errors(Arc::new(vec![e.in_line_number(Some(line))])));
                    self.state = State::Stopped;
                    return;
                }
            },
            None => 0,
        };
        self.clear_run_state();
        self.fns.clear();
        self.pc = addr;
        self.state = State::Running;
    }

    /// Feed a key for INKEY$.
    pub fn put_key(&mut self, key: char) {
        self.keys.push_back(key);
    }

    /// The break/escape key. ON BREAK decides what it means.
    pub fn break_key(&mut self) {
        match self.on_break {
            BreakMode::Cont => {}
            BreakMode::Gosub(_) => {
                if self.state == State::Running {
                    self.break_pending = true;
                }
            }
            BreakMode::Stop => {
                if self.state != State::Stopped {
                    self.stop.submit(StopRecord {
                        reason: StopReason::Escape,
                        resume: None,
                    });
                }
            }
        }
    }

    /// Frame flyback: advance time, play queued sound, and fire any
    /// due timer above the priority ceiling as a synthetic GOSUB.
    pub fn frame(&mut self) {
        self.frames += 1;
        for channel in 0..3 {
            if let Some(remaining) = self.sq_queues[channel].front_mut() {
                if *remaining <= 1 {
                    self.sq_queues[channel].pop_front();
                } else {
                    *remaining -= 1;
                }
            }
        }
        if self.state != State::Running {
            return;
        }
        if self.break_pending && !self.break_active {
            if let BreakMode::Gosub(line) = self.on_break {
                self.break_pending = false;
                self.break_active = true;
                self.synthetic_gosub(line, FrameKind::Break);
            }
        }
        for channel in 0..3 {
            if self.sq_queues[channel].len() < SOUND_QUEUE_LEN {
                if let Some(line) = self.sq_handlers[channel].take() {
                    self.synthetic_gosub(line, FrameKind::Sq);
                }
            }
        }
        for slot in (0..4).rev() {
            let timer = self.timers[slot];
            if timer.active && self.frames >= timer.next && slot as i8 > self.ceiling {
                if timer.every {
                    self.timers[slot].next = self.frames + timer.interval;
                } else {
                    self.timers[slot].active = false;
                }
                debug!(slot, line = timer.line, "timer fired");
                let prev = self.ceiling;
                self.ceiling = slot as i8;
                self.synthetic_gosub(timer.line, FrameKind::Timer { prev });
                break;
            }
        }
    }

    fn synthetic_gosub(&mut self, line: u16, kind: FrameKind) {
        match self.program.line_address(line) {
            Ok(addr) => {
                let frame = GosubFrame { ret: self.pc, kind };
                if self.gosub.push(frame).is_ok() {
                    self.pc = addr;
                }
            }
            Err(e) => {
                self.pending
                    .push_back(Event::Errors(Arc::new(vec![e.in_line_number(Some(line))])));
                self.state = State::Stopped;
            }
        }
    }

    /// Accept one line of console input: a numbered line edits the
    /// program, a direct statement compiles and runs immediately,
    /// and during an input wait the text is the reply. Returns
    /// whether the text deserves a place in history.
    pub fn enter(&mut self, s: &str) -> bool {
        if self.state == State::InputWait {
            let fields: VecDeque<String> = split_reply(s);
            self.input_fields = Some(fields);
            self.state = State::Running;
            self.pc = self.input_addr;
            return true;
        }
        let line = Line::new(s);
        if line.is_direct() {
            if line.is_empty() {
                return false;
            }
            if self.dirty {
                self.recompile();
                self.report_indirect_errors();
            }
            self.pc = self.program.compile_direct(&line);
            let direct_errors = self.program.direct_errors().clone();
            if !direct_errors.is_empty() {
                self.pending.push_back(Event::Errors(direct_errors));
                self.state = State::Stopped;
            } else {
                self.state = State::Running;
            }
            true
        } else {
            if let Err(e) = self.listing.insert(line) {
                self.pending.push_back(Event::Errors(Arc::new(vec![e])));
                return false;
            }
            self.dirty = true;
            self.cont = None;
            true
        }
    }

    fn recompile(&mut self) {
        self.program.clear();
        self.program.compile(self.listing.lines());
        self.dirty = false;
        self.fns.clear();
        self.cont = None;
        self.clear_run_state();
    }

    fn report_indirect_errors(&mut self) -> bool {
        let errors = self.program.indirect_errors().clone();
        if errors.is_empty() {
            return false;
        }
        self.pending.push_back(Event::Errors(errors));
        self.state = State::Stopped;
        true
    }

    fn clear_run_state(&mut self) {
        self.stack.clear();
        self.gosub.clear();
        self.fors.clear();
        self.whiles.clear();
        self.data_ptr = 0;
        self.timers = [Timer::default(); 4];
        self.ceiling = -1;
        self.sq_queues = [VecDeque::new(), VecDeque::new(), VecDeque::new()];
        self.sq_handlers = [None; 3];
        self.on_break = BreakMode::Stop;
        self.break_pending = false;
        self.break_active = false;
        self.error_goto = None;
        self.error_resume = None;
        self.err = 0;
        self.erl = 0;
        self.input_fields = None;
        self.print_buf.clear();
        self.stream = 0;
    }

    fn start_run(&mut self, addr: Address) {
        self.clear_run_state();
        self.vars.clear();
        self.fns.clear();
        self.cont = None;
        self.pc = addr;
        self.state = State::Running;
    }

    /// Drive the machine for up to `cycles` opcodes or until it has
    /// something to say.
    pub fn execute(&mut self, cycles: usize) -> Event {
        for _ in 0..cycles {
            if let Some(event) = self.pending.pop_front() {
                return event;
            }
            if self.stop.is_set() {
                return self.yield_stop();
            }
            match self.state {
                State::Stopped => return Event::Stopped,
                State::InputWait => return Event::Input(self.input_prompt.to_string()),
                State::Running => {}
            }
            match self.step() {
                Ok(None) => {}
                Ok(Some(event)) => return event,
                Err(error) => {
                    if let Some(event) = self.handle_error(error) {
                        return event;
                    }
                }
            }
        }
        Event::Running
    }

    fn yield_stop(&mut self) -> Event {
        let record = match self.stop.take() {
            Some(record) => record,
            None => return Event::Running,
        };
        debug!(reason = ?record.reason, "suspend");
        match record.reason {
            StopReason::Frame => Event::Frame,
            // A full sound queue waits for playback; the program
            // counter was already rewound to retry the SOUND.
            StopReason::Sound => Event::Frame,
            StopReason::Input { prompt } => {
                self.input_prompt = prompt.clone();
                self.state = State::InputWait;
                Event::Input(prompt.to_string())
            }
            StopReason::Stop | StopReason::Escape => {
                let resume = record
                    .resume
                    .or_else(|| self.stop.take_saved().and_then(|r| r.resume));
                self.cont = Some(resume.unwrap_or(self.pc));
                self.input_fields = None;
                self.state = State::Stopped;
                self.pending.push_back(Event::Stopped);
                Event::Break(Some(self.current_line))
            }
            StopReason::Break => {
                self.cont = Some(record.resume.unwrap_or(self.pc));
                self.state = State::Stopped;
                self.pending.push_back(Event::Stopped);
                Event::Break(Some(self.current_line))
            }
            StopReason::End => {
                self.state = State::Stopped;
                self.cont = None;
                Event::Stopped
            }
            StopReason::Load { name, run } => {
                self.state = State::Stopped;
                if run {
                    Event::Run(name.to_string())
                } else {
                    Event::Load(name.to_string())
                }
            }
            StopReason::Chain { name, merge, line } => {
                self.state = State::Stopped;
                Event::Chain {
                    name: name.to_string(),
                    merge,
                    line,
                }
            }
            StopReason::Save { name } => Event::Save(name.to_string()),
            StopReason::New => {
                self.listing.clear();
                self.program.clear();
                self.vars.clear();
                self.fns.clear();
                self.dirty = true;
                self.cont = None;
                self.clear_run_state();
                self.state = State::Stopped;
                Event::Stopped
            }
        }
    }

    /// Runtime error: redirect to the ON ERROR handler (hidden from
    /// the user) unless one is already in flight, else surface it as
    /// a terminal suspend.
    fn handle_error(&mut self, error: Error) -> Option<Event> {
        self.err = error.code();
        self.erl = self.current_line;
        if let Some(handler) = self.error_goto {
            if self.error_resume.is_none() {
                if let Ok(addr) = self.program.line_address(handler) {
                    debug!(code = self.err, line = self.erl, "error redirected");
                    self.error_resume = Some(self.line_addr);
                    self.pc = addr;
                    return None;
                }
            }
        }
        let error = match error.line_number() {
            Some(_) => error,
            None => {
                if self.pc < self.program.watermark() {
                    error.in_line_number(Some(self.current_line))
                } else {
                    error
                }
            }
        };
        self.state = State::Stopped;
        self.cont = None;
        self.pending.push_back(Event::Stopped);
        Some(Event::Errors(Arc::new(vec![error])))
    }

    fn branch(&mut self, addr: Address) -> Result<(), Error> {
        if addr == UNDEFINED {
            return Err(error!(UndefinedLine));
        }
        self.pc = addr;
        Ok(())
    }

    fn step(&mut self) -> OpResult {
        let op = match self.program.op(self.pc) {
            Some(op) => op.clone(),
            None => {
                self.stop.submit(StopRecord {
                    reason: StopReason::End,
                    resume: None,
                });
                return Ok(None);
            }
        };
        self.pc += 1;
        use Opcode as O;
        match op {
            O::Literal(val) => self.stack.push(val)?,
            O::Push(name) => {
                let val = self.vars.fetch(&name);
                self.stack.push(val)?;
            }
            O::Pop(name) => {
                let val = self.stack.pop()?;
                self.vars.store(&name, val)?;
            }
            O::PushArr(name, len) => {
                let subscripts = self.stack.pop_n(len)?;
                let val = self.vars.fetch_array(&name, subscripts)?;
                self.stack.push(val)?;
            }
            O::PopArr(name, len) => {
                let subscripts = self.stack.pop_n(len)?;
                let val = self.stack.pop()?;
                self.vars.store_array(&name, subscripts, val)?;
            }
            O::DimArr(name, len) => {
                let bounds = self.stack.pop_n(len)?;
                self.vars.dimension_array(&name, bounds)?;
            }
            O::ToInt => {
                let val = self.stack.pop()?;
                self.stack.push(Val::Integer(i16::try_from(val)?))?;
            }
            O::Addr(name) => {
                let val = self.vars.address_of(&name)?;
                self.stack.push(val)?;
            }

            O::Line(number) => {
                self.current_line = number;
                self.line_addr = self.pc - 1;
                if self.trace {
                    return Ok(Some(Event::Print(0, format!("[{}]", number))));
                }
            }
            O::Jump(addr) => self.branch(addr)?,
            O::IfNot(addr) => {
                let val = self.stack.pop()?;
                if f64::try_from(val)? == 0.0 {
                    self.branch(addr)?;
                }
            }
            O::Gosub(addr) => {
                self.gosub.push(GosubFrame {
                    ret: self.pc,
                    kind: FrameKind::Sub,
                })?;
                self.branch(addr)?;
            }
            O::Return => return self.r#return(),
            O::OnGoto(len) => {
                let selector = i16::try_from(self.stack.pop()?)?;
                if selector >= 1 && (selector as usize) <= len {
                    self.pc += selector as usize - 1;
                } else {
                    self.pc += len;
                }
            }
            O::OnGosub(len) => {
                let selector = i16::try_from(self.stack.pop()?)?;
                if selector >= 1 && (selector as usize) <= len {
                    self.gosub.push(GosubFrame {
                        ret: self.pc + len,
                        kind: FrameKind::Sub,
                    })?;
                    self.pc += selector as usize - 1;
                } else {
                    self.pc += len;
                }
            }
            O::ForPush(name) => self.fors.push(name)?,
            O::ForTest => {
                let step = f64::try_from(self.stack.pop()?)?;
                let end = f64::try_from(self.stack.pop()?)?;
                let value = f64::try_from(self.stack.pop()?)?;
                let more = if step > 0.0 { value <= end } else { value >= end };
                self.stack
                    .push(Val::Integer(if more { -1 } else { 0 }))?;
            }
            O::ForPop => {
                if self.fors.is_empty() {
                    return Err(error!(UnexpectedNext));
                }
                self.fors.pop()?;
            }
            // A NEXT reached by jumping out of an inner loop unwinds
            // the stale inner entries; with no matching FOR at all
            // the stack is left untouched.
            O::NextVar(name) => match self.fors.iter().rposition(|k| *k == name) {
                None => return Err(error!(UnexpectedNext)),
                Some(pos) => self.fors.truncate(pos + 1),
            },
            O::WhilePush => self.whiles.push(self.pc - 1)?,
            O::WendCheck => {
                if self.whiles.is_empty() {
                    return Err(error!(UnexpectedWend));
                }
            }
            O::WhilePop => {
                if self.whiles.is_empty() {
                    return Err(error!(UnexpectedWend));
                }
                self.whiles.pop()?;
            }
            O::DefFn(name, params) => {
                self.fns.insert(name, (self.pc + 1, params));
            }
            O::CallFn(name, argc) => return self.call_fn(&name, argc),
            O::FnEnd => return self.fn_end(),

            O::Clear => {
                self.vars.clear();
                self.fns.clear();
                self.data_ptr = 0;
            }
            O::Cls => return Ok(Some(Event::Cls)),
            O::Cont => match self.cont.take() {
                Some(addr) => {
                    self.pc = addr;
                    self.state = State::Running;
                }
                None => return Err(error!(CannotContinue)),
            },
            O::End => {
                self.stop.submit(StopRecord {
                    reason: StopReason::End,
                    resume: None,
                });
            }
            O::New => {
                self.stop.submit(StopRecord {
                    reason: StopReason::New,
                    resume: None,
                });
            }
            O::Stop => {
                self.stop.submit(StopRecord {
                    reason: StopReason::Stop,
                    resume: Some(self.pc),
                });
            }
            O::Run(addr) => {
                if self.report_indirect_errors() {
                    return Ok(None);
                }
                if addr == UNDEFINED {
                    return Err(error!(UndefinedLine));
                }
                self.start_run(addr);
            }
            O::RunFile => {
                let name = Rc::<str>::try_from(self.stack.pop()?)?;
                self.stop.submit(StopRecord {
                    reason: StopReason::Load { name, run: true },
                    resume: None,
                });
            }
            O::Load => {
                let name = Rc::<str>::try_from(self.stack.pop()?)?;
                self.stop.submit(StopRecord {
                    reason: StopReason::Load { name, run: false },
                    resume: None,
                });
            }
            O::Save => {
                let name = Rc::<str>::try_from(self.stack.pop()?)?;
                self.stop.submit(StopRecord {
                    reason: StopReason::Save { name },
                    resume: Some(self.pc),
                });
            }
            O::Chain(merge, line) => {
                let name = Rc::<str>::try_from(self.stack.pop()?)?;
                self.stop.submit(StopRecord {
                    reason: StopReason::Chain { name, merge, line },
                    resume: None,
                });
            }
            O::Input(len) => {
                let prompt = Rc::<str>::try_from(self.stack.pop()?)?;
                match self.input_fields {
                    Some(_) => {
                        self.input_remaining = len;
                    }
                    None => {
                        self.input_addr = self.pc - 2;
                        self.pc = self.pc - 2;
                        self.stop.submit(StopRecord {
                            reason: StopReason::Input {
                                prompt: prompt.clone(),
                            },
                            resume: Some(self.input_addr),
                        });
                    }
                }
            }
            O::ReadInput(ty) => return self.read_input(ty),
            O::Stream => {
                let stream = i16::try_from(self.stack.pop()?)?;
                if !(0..=9).contains(&stream) {
                    return Err(error!(ImproperArgument));
                }
                self.stream = stream as u8;
            }
            O::PrintVal => {
                let val = self.stack.pop()?;
                self.print_buf.push_str(&val.print());
            }
            O::PrintTab => {
                let col = match self.print_buf.rfind('\n') {
                    Some(pos) => self.print_buf.len() - pos - 1,
                    None => self.print_buf.len(),
                };
                let pad = 13 - (col % 13);
                for _ in 0..pad {
                    self.print_buf.push(' ');
                }
            }
            O::PrintNl => self.print_buf.push('\n'),
            O::PrintFlush => {
                let text = std::mem::take(&mut self.print_buf);
                let stream = self.stream;
                self.stream = 0;
                return Ok(Some(Event::Print(stream, text)));
            }
            O::List(from, to) => {
                return Ok(Some(Event::List(self.listing.list(from, to))));
            }
            O::Renum(new_start, old_start, step, keep) => {
                self.listing.renum(new_start, old_start, step, keep)?;
                self.dirty = true;
                self.cont = None;
            }
            O::Read(ty) => {
                let datum = match self.program.data(self.data_ptr) {
                    Some(datum) => datum.clone(),
                    None => return Err(error!(DataExhausted)),
                };
                self.data_ptr += 1;
                let val = match ty {
                    Ty::String => Val::String(datum.text.clone()),
                    _ => parse_datum(&datum.text)?,
                };
                self.stack.push(val)?;
            }
            O::Restore(line) => {
                self.data_ptr = if line == 0 {
                    0
                } else {
                    self.program.data_offset(line)
                };
            }
            O::Mode => {
                let mode = i16::try_from(self.stack.pop()?)?;
                if !(0..=2).contains(&mode) {
                    return Err(error!(ImproperArgument));
                }
                return Ok(Some(Event::Mode(mode as u8)));
            }
            O::Frame => {
                self.stop.submit(StopRecord {
                    reason: StopReason::Frame,
                    resume: None,
                });
            }
            O::Sound => return self.sound(),
            O::Timer(every, line) => {
                let slot = i16::try_from(self.stack.pop()?)?;
                let delay = u16::try_from(self.stack.pop()?)?;
                if !(0..=3).contains(&slot) {
                    return Err(error!(ImproperArgument));
                }
                let interval = (delay as u64).max(1);
                self.timers[slot as usize] = Timer {
                    active: true,
                    line,
                    every,
                    interval,
                    next: self.frames + interval,
                };
            }
            O::Remain => {
                let slot = i16::try_from(self.stack.pop()?)?;
                if !(0..=3).contains(&slot) {
                    return Err(error!(ImproperArgument));
                }
                let timer = &mut self.timers[slot as usize];
                let remaining = if timer.active {
                    timer.next.saturating_sub(self.frames)
                } else {
                    0
                };
                timer.active = false;
                self.stack.push(Val::Real(remaining as f64))?;
            }
            O::OnErrorGoto(line) => {
                self.error_goto = if line == 0 { None } else { Some(line) };
            }
            O::OnSqGosub(line) => {
                let channel = channel_index(self.stack.pop()?)?;
                self.sq_handlers[channel] = Some(line);
            }
            O::OnBreakCont => self.on_break = BreakMode::Cont,
            O::OnBreakStop => self.on_break = BreakMode::Stop,
            O::OnBreakGosub(line) => self.on_break = BreakMode::Gosub(line),
            O::Resume(line) => return self.resume(line),
            O::ResumeNext => return self.resume_next(),
            O::Tron => self.trace = true,
            O::Troff => self.trace = false,

            O::Neg => self.unary_op(Operation::negate)?,
            O::Pow => self.binary_op(Operation::power)?,
            O::Mul => self.binary_op(Operation::multiply)?,
            O::Div => self.binary_op(Operation::divide)?,
            O::DivInt => self.binary_op(Operation::divide_int)?,
            O::Mod => self.binary_op(Operation::modulo)?,
            O::Add => self.binary_op(Operation::sum)?,
            O::Sub => self.binary_op(Operation::subtract)?,
            O::Eq => self.binary_op(Operation::equal)?,
            O::NotEq => self.binary_op(Operation::not_equal)?,
            O::Lt => self.binary_op(Operation::less)?,
            O::LtEq => self.binary_op(Operation::less_equal)?,
            O::Gt => self.binary_op(Operation::greater)?,
            O::GtEq => self.binary_op(Operation::greater_equal)?,
            O::Not => self.unary_op(Operation::not)?,
            O::And => self.binary_op(Operation::and)?,
            O::Or => self.binary_op(Operation::or)?,
            O::Xor => self.binary_op(Operation::xor)?,

            O::Abs => self.unary_op(Function::abs)?,
            O::Asc => self.unary_op(Function::asc)?,
            O::Atn => self.unary_op(Function::atn)?,
            O::BinStr => {
                let (val, digits) = self.variadic_1_2()?;
                self.stack.push(Function::bin_str(val, digits)?)?;
            }
            O::ChrStr => self.unary_op(Function::chr_str)?,
            O::Cos => self.unary_op(Function::cos)?,
            O::Erl => self.stack.push(Val::Real(self.erl as f64))?,
            O::Err => self.stack.push(Val::Integer(self.err as i16))?,
            O::Exp => self.unary_op(Function::exp)?,
            O::Fix => self.unary_op(Function::fix)?,
            O::HexStr => {
                let (val, digits) = self.variadic_1_2()?;
                self.stack.push(Function::hex_str(val, digits)?)?;
            }
            O::InkeyStr => {
                let s: String = self.keys.pop_front().map(String::from).unwrap_or_default();
                self.stack.push(Val::String(s.into()))?;
            }
            O::Instr => {
                let len = usize::try_from(self.stack.pop()?)?;
                let mut args = self.stack.pop_n(len)?;
                let needle = args.pop().ok_or_else(|| error!(OperandMissing))?;
                let haystack = args.pop().ok_or_else(|| error!(OperandMissing))?;
                let start = args.pop();
                self.stack
                    .push(Function::instr(start, haystack, needle)?)?;
            }
            O::Int => self.unary_op(Function::int)?,
            O::LeftStr => {
                let (s, n) = self.stack.pop_2()?;
                self.stack.push(Function::left_str(s, n)?)?;
            }
            O::Len => self.unary_op(Function::len)?,
            O::Log => self.unary_op(Function::log)?,
            O::Log10 => self.unary_op(Function::log10)?,
            O::LowerStr => self.unary_op(Function::lower_str)?,
            O::Max => {
                let len = usize::try_from(self.stack.pop()?)?;
                let args = self.stack.pop_n(len)?;
                self.stack.push(Function::max(args)?)?;
            }
            O::Min => {
                let len = usize::try_from(self.stack.pop()?)?;
                let args = self.stack.pop_n(len)?;
                self.stack.push(Function::min(args)?)?;
            }
            O::MidStr => {
                let len = usize::try_from(self.stack.pop()?)?;
                let mut args = self.stack.pop_n(len)?;
                let third = if len == 3 { args.pop() } else { None };
                let start = args.pop().ok_or_else(|| error!(OperandMissing))?;
                let s = args.pop().ok_or_else(|| error!(OperandMissing))?;
                self.stack.push(Function::mid_str(s, start, third)?)?;
            }
            O::Pi => self.stack.push(Val::Real(std::f64::consts::PI))?,
            O::RightStr => {
                let (s, n) = self.stack.pop_2()?;
                self.stack.push(Function::right_str(s, n)?)?;
            }
            O::Rnd => {
                let len = usize::try_from(self.stack.pop()?)?;
                let args = self.stack.pop_n(len)?;
                let val = self.rnd(args)?;
                self.stack.push(val)?;
            }
            O::Round => {
                let len = usize::try_from(self.stack.pop()?)?;
                let mut args = self.stack.pop_n(len)?;
                let decimals = if len == 2 { args.pop() } else { None };
                let val = args.pop().ok_or_else(|| error!(OperandMissing))?;
                self.stack.push(Function::round(val, decimals)?)?;
            }
            O::Sgn => self.unary_op(Function::sgn)?,
            O::Sin => self.unary_op(Function::sin)?,
            O::SpaceStr => self.unary_op(Function::space_str)?,
            O::Sq => {
                let channel = channel_index(self.stack.pop()?)?;
                let free = SOUND_QUEUE_LEN - self.sq_queues[channel].len();
                self.stack.push(Val::Integer(free as i16))?;
            }
            O::Sqr => self.unary_op(Function::sqr)?,
            O::StrStr => self.unary_op(Function::str_str)?,
            O::StringStr => {
                let (n, what) = self.stack.pop_2()?;
                self.stack.push(Function::string_str(n, what)?)?;
            }
            O::Tan => self.unary_op(Function::tan)?,
            O::Time => self.stack.push(Val::Real((self.frames * 6) as f64))?,
            O::UpperStr => self.unary_op(Function::upper_str)?,
            O::Val => self.unary_op(Function::val)?,
        }
        Ok(None)
    }

    fn unary_op(&mut self, f: impl Fn(Val) -> Result<Val, Error>) -> Result<(), Error> {
        let val = self.stack.pop()?;
        self.stack.push(f(val)?)
    }

    fn binary_op(&mut self, f: impl Fn(Val, Val) -> Result<Val, Error>) -> Result<(), Error> {
        let (lhs, rhs) = self.stack.pop_2()?;
        self.stack.push(f(lhs, rhs)?)
    }

    fn variadic_1_2(&mut self) -> Result<(Val, Option<Val>), Error> {
        let len = usize::try_from(self.stack.pop()?)?;
        let mut args = self.stack.pop_n(len)?;
        let second = if len == 2 { args.pop() } else { None };
        let first = args.pop().ok_or_else(|| error!(OperandMissing))?;
        Ok((first, second))
    }

    fn rnd(&mut self, mut args: Vec<Val>) -> Result<Val, Error> {
        let arg = match args.pop() {
            Some(v) => f64::try_from(v)?,
            None => 1.0,
        };
        if arg < 0.0 {
            self.rng = StdRng::seed_from_u64(arg.to_bits());
        }
        if arg == 0.0 {
            return Ok(Val::Real(self.last_rnd));
        }
        self.last_rnd = self.rng.gen::<f64>();
        Ok(Val::Real(self.last_rnd))
    }

    fn r#return(&mut self) -> OpResult {
        match self.gosub.last() {
            None => return Err(error!(UnexpectedReturn)),
            Some(frame) => {
                if let FrameKind::Fn { .. } = frame.kind {
                    return Err(error!(UnexpectedReturn));
                }
            }
        }
        let frame = self.gosub.pop()?;
        match frame.kind {
            FrameKind::Timer { prev } => self.ceiling = prev,
            FrameKind::Break => self.break_active = false,
            _ => {}
        }
        self.pc = frame.ret;
        Ok(None)
    }

    fn call_fn(&mut self, name: &Rc<str>, argc: usize) -> OpResult {
        let (body, params) = match self.fns.get(name) {
            Some((body, params)) => (*body, params.clone()),
            None => return Err(error!(UnknownUserFunction)),
        };
        if params.len() != argc {
            return Err(error!(ImproperArgument; "wrong number of arguments"));
        }
        let args = self.stack.pop_n(argc)?;
        let mut saved: Vec<(Rc<str>, Val)> = vec![];
        for (param, arg) in params.iter().zip(args) {
            saved.push((param.clone(), self.vars.fetch(param)));
            self.vars.store(param, arg)?;
        }
        self.gosub.push(GosubFrame {
            ret: self.pc,
            kind: FrameKind::Fn { saved },
        })?;
        self.pc = body;
        Ok(None)
    }

    fn fn_end(&mut self) -> OpResult {
        match self.gosub.last() {
            Some(frame) if matches!(frame.kind, FrameKind::Fn { .. }) => {}
            _ => return Err(error!(InternalError; "function return without call")),
        }
        let frame = self.gosub.pop()?;
        if let FrameKind::Fn { saved } = frame.kind {
            for (param, val) in saved {
                self.vars.store(&param, val)?;
            }
        }
        self.pc = frame.ret;
        Ok(None)
    }

    fn read_input(&mut self, ty: Ty) -> OpResult {
        let field = match self.input_fields.as_mut().and_then(|f| f.pop_front()) {
            Some(field) => field,
            None => return self.input_redo(),
        };
        let val = match ty {
            Ty::String => Val::String(field.as_str().into()),
            _ => match parse_datum(&field) {
                Ok(val) => val,
                Err(_) => return self.input_redo(),
            },
        };
        self.stack.push(val)?;
        self.input_remaining = self.input_remaining.saturating_sub(1);
        if self.input_remaining == 0 {
            self.input_fields = None;
        }
        Ok(None)
    }

    fn input_redo(&mut self) -> OpResult {
        self.input_fields = None;
        self.pc = self.input_addr;
        Ok(Some(Event::Print(0, "?Redo from start\n".to_string())))
    }

    fn sound(&mut self) -> OpResult {
        let len = self.stack.len();
        if len < 3 {
            return Err(error!(InternalError; "underflow"));
        }
        let channels = match self.stack.get(len - 3) {
            Some(val) => channel_mask(val)?,
            None => return Err(error!(InternalError; "underflow")),
        };
        for channel in 0..3 {
            if channels[channel] && self.sq_queues[channel].len() >= SOUND_QUEUE_LEN {
                // Queue full: leave the operands in place and retry
                // this op once playback frees a slot.
                self.pc -= 1;
                self.stop.submit(StopRecord {
                    reason: StopReason::Sound,
                    resume: Some(self.pc),
                });
                return Ok(None);
            }
        }
        let duration = u16::try_from(self.stack.pop()?)?;
        let period = u16::try_from(self.stack.pop()?)?;
        let mask = i16::try_from(self.stack.pop()?)?;
        let duration = duration.max(1);
        for channel in 0..3 {
            if channels[channel] {
                self.sq_queues[channel].push_back(duration);
            }
        }
        Ok(Some(Event::Sound {
            channel: mask as u8,
            period,
            duration,
        }))
    }

    fn resume(&mut self, line: u16) -> OpResult {
        let failure = match self.error_resume.take() {
            Some(addr) => addr,
            None => return Err(error!(UnexpectedResume)),
        };
        if line == 0 {
            self.pc = failure;
        } else {
            self.pc = self.program.line_address(line)?;
        }
        Ok(None)
    }

    fn resume_next(&mut self) -> OpResult {
        let failure = match self.error_resume.take() {
            Some(addr) => addr,
            None => return Err(error!(UnexpectedResume)),
        };
        let mut addr = failure + 1;
        loop {
            match self.program.op(addr) {
                Some(Opcode::Line(_)) => {
                    self.pc = addr;
                    return Ok(None);
                }
                Some(_) => addr += 1,
                None => {
                    self.stop.submit(StopRecord {
                        reason: StopReason::End,
                        resume: None,
                    });
                    return Ok(None);
                }
            }
        }
    }
}

/// SOUND channel selection is a bit mask: 1, 2 and 4 select the
/// three channels.
fn channel_mask(val: &Val) -> Result<[bool; 3], Error> {
    let mask = match val {
        Val::Integer(n) => *n,
        Val::Real(v) => Val::round_i16(*v)?,
        Val::String(_) => return Err(error!(TypeMismatch)),
    };
    if !(1..=7).contains(&mask) {
        return Err(error!(ImproperArgument));
    }
    Ok([mask & 1 != 0, mask & 2 != 0, mask & 4 != 0])
}

fn channel_index(val: Val) -> Result<usize, Error> {
    let n = i16::try_from(val)?;
    match n {
        1 => Ok(0),
        2 => Ok(1),
        4 => Ok(2),
        _ => Err(error!(ImproperArgument)),
    }
}

fn parse_datum(text: &str) -> Result<Val, Error> {
    let t = text.trim();
    if t.is_empty() {
        return Ok(Val::Integer(0));
    }
    if let Ok(n) = t.parse::<i16>() {
        return Ok(Val::Integer(n));
    }
    match t.parse::<f64>() {
        Ok(v) => Ok(Val::Real(v)),
        Err(_) => Err(error!(TypeMismatch)),
    }
}

/// Split an INPUT reply on commas, honoring quoted fields.
fn split_reply(s: &str) -> VecDeque<String> {
    let mut fields: VecDeque<String> = VecDeque::new();
    let mut field = String::new();
    let mut quoted = false;
    for ch in s.trim_end_matches(['\r', '\n']).chars() {
        match ch {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                fields.push_back(field.trim().to_string());
                field.clear();
            }
            _ => field.push(ch),
        }
    }
    fields.push_back(field.trim().to_string());
    fields
}
