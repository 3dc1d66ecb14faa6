/*!
## Terminal Module

The interactive host: a line-edited command loop, the driver that
services the machine's suspend events, frame pacing at 50Hz, and
the break key.

*/

use crate::error;
use crate::lang::Error;
use crate::mach::{Event, Listing, Runtime};
use ansi_term::Style;
use linefeed::{
    Command, Completer, Completion, Function, Interface, Prompter, ReadResult, Signal, Terminal,
};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

const FRAME: Duration = Duration::from_millis(20);

pub fn main() {
    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");
    if let Err(error) = main_loop(interrupted) {
        eprintln!("{}", error);
    }
}

fn main_loop(interrupted: Arc<AtomicBool>) -> std::io::Result<()> {
    let mut runtime = Runtime::default();
    let command = Interface::new("BASIC")?;
    command.set_report_signal(Signal::Interrupt, true);
    let input_caps = Interface::new("INPUT")?;
    input_caps.set_report_signal(Signal::Interrupt, true);
    CapsFunction::install(&input_caps);
    let keys = KeyPoller::new();

    command.write_fmt(format_args!("Locomotive BASIC\n"))?;
    if let Some(path) = std::env::args().nth(1) {
        match load(&path) {
            Ok(listing) => runtime.set_listing(listing, true),
            Err(error) => print_error(&command, &error)?,
        }
    }

    let mut next_frame = Instant::now() + FRAME;
    loop {
        if interrupted.load(Ordering::SeqCst) {
            runtime.break_key();
            interrupted.store(false, Ordering::SeqCst);
        };
        if Instant::now() >= next_frame {
            runtime.frame();
            next_frame = Instant::now() + FRAME;
        }
        match runtime.execute(5000) {
            Event::Stopped => {
                command.write_fmt(format_args!("Ready\n"))?;
                let saved_completer = command.completer();
                command.set_completer(Arc::new(LineCompleter::new(runtime.get_listing())));
                let string = match command.read_line()? {
                    ReadResult::Input(string) => string,
                    ReadResult::Signal(Signal::Interrupt) => {
                        command.set_buffer("")?;
                        continue;
                    }
                    ReadResult::Signal(_) | ReadResult::Eof => break,
                };
                command.set_completer(saved_completer);
                if runtime.enter(&string) {
                    command.add_history_unique(string);
                }
            }
            Event::Input(prompt) => {
                input_caps.set_prompt(&prompt)?;
                match input_caps.read_line()? {
                    ReadResult::Input(string) => {
                        runtime.enter(&string);
                    }
                    ReadResult::Signal(Signal::Interrupt) => {
                        input_caps.set_buffer("")?;
                        input_caps.lock_reader().cancel_read_line()?;
                        runtime.break_key();
                    }
                    ReadResult::Signal(_) | ReadResult::Eof => break,
                };
            }
            Event::Errors(errors) => {
                for error in errors.iter() {
                    print_error(&command, error)?;
                }
            }
            Event::Running => {
                keys.poll(&mut runtime);
            }
            Event::Print(_stream, s) => {
                command.write_fmt(format_args!("{}", s))?;
            }
            Event::Cls | Event::Mode(_) => {
                command.write_fmt(format_args!("\x1b[2J\x1b[H"))?;
            }
            Event::Frame => {
                let now = Instant::now();
                if next_frame > now {
                    std::thread::sleep(next_frame - now);
                }
                runtime.frame();
                next_frame = Instant::now() + FRAME;
            }
            Event::Sound {
                channel,
                period,
                duration,
            } => {
                // No synthesizer on a terminal; the queue still
                // drains at flyback so SQ and waits behave.
                debug!(channel, period, duration, "sound");
            }
            Event::Break(line) => match line {
                Some(line) => command.write_fmt(format_args!("Break in {}\n", line))?,
                None => command.write_fmt(format_args!("Break\n"))?,
            },
            Event::List(lines) => {
                for line in lines {
                    command.write_fmt(format_args!("{}\n", line))?;
                }
            }
            Event::Load(name) => match load(&name) {
                Ok(listing) => runtime.set_listing(listing, false),
                Err(error) => print_error(&command, &error)?,
            },
            Event::Run(name) => match load(&name) {
                Ok(listing) => runtime.set_listing(listing, true),
                Err(error) => print_error(&command, &error)?,
            },
            Event::Chain { name, merge, line } => match load(&name) {
                Ok(listing) => runtime.chain(listing, merge, line),
                Err(error) => print_error(&command, &error)?,
            },
            Event::Save(name) => {
                if let Err(error) = save(runtime.get_listing(), &name) {
                    print_error(&command, &error)?;
                }
            }
        }
    }
    Ok(())
}

fn print_error<T: Terminal>(command: &Interface<T>, error: &Error) -> std::io::Result<()> {
    command.write_fmt(format_args!(
        "{}\n",
        Style::new().bold().paint(error.to_string())
    ))
}

/// Raw keyboard polling for INKEY$ while a program runs.
struct KeyPoller {
    terminal: Option<mortal::Terminal>,
}

impl KeyPoller {
    fn new() -> KeyPoller {
        KeyPoller {
            terminal: mortal::Terminal::new().ok(),
        }
    }

    fn poll(&self, runtime: &mut Runtime) {
        let terminal = match &self.terminal {
            Some(terminal) => terminal,
            None => return,
        };
        while let Ok(Some(event)) = terminal.read_event(Some(Duration::from_millis(0))) {
            match event {
                mortal::Event::Key(mortal::Key::Char(ch)) => runtime.put_key(ch),
                mortal::Event::Key(mortal::Key::Enter) => runtime.put_key('\r'),
                _ => {}
            }
        }
    }
}

/// Lower-case typing arrives upper-case at the INPUT prompt, the
/// way the hardware did it.
struct CapsFunction;

impl CapsFunction {
    fn install<T: Terminal>(i: &Interface<T>) {
        i.define_function("caps-function", Arc::new(CapsFunction));
        for ch in 97..=122 {
            i.bind_sequence(
                char::from(ch).to_string(),
                Command::from_str("caps-function"),
            );
        }
    }
}

impl<Term: Terminal> Function<Term> for CapsFunction {
    fn execute(&self, prompter: &mut Prompter<Term>, count: i32, ch: char) -> std::io::Result<()> {
        prompter.insert(count as usize, ch.to_ascii_uppercase())
    }
}

/// Typing a line number and pressing tab recalls that line for
/// editing.
struct LineCompleter {
    listing: Listing,
}

impl LineCompleter {
    fn new(listing: Listing) -> LineCompleter {
        LineCompleter { listing }
    }
}

impl<Term: Terminal> Completer<Term> for LineCompleter {
    fn complete(
        &self,
        _word: &str,
        prompter: &Prompter<Term>,
        _start: usize,
        _end: usize,
    ) -> Option<Vec<Completion>> {
        if let Ok(num) = prompter.buffer().parse::<u16>() {
            if let Some(line) = self.listing.get(num) {
                let mut comp_list = Vec::new();
                let mut comp = Completion::simple(line.to_string());
                comp.suffix = linefeed::complete::Suffix::None;
                comp_list.push(comp);
                return Some(comp_list);
            }
        }
        None
    }
}

fn load(filename: &str) -> Result<Listing, Error> {
    let reader = match File::open(filename) {
        Ok(file) => BufReader::new(file),
        Err(error) => {
            let msg = error.to_string();
            match error.kind() {
                ErrorKind::NotFound => return Err(error!(FileNotOpen; msg.as_str())),
                _ => return Err(error!(InternalError; msg.as_str())),
            }
        }
    };
    let mut source = String::new();
    for line in reader.lines() {
        match line {
            Err(error) => return Err(error!(InternalError; error.to_string().as_str())),
            Ok(line) => {
                source.push_str(&line);
                source.push('\n');
            }
        }
    }
    let mut listing = Listing::default();
    let warnings = listing.load_source(&source)?;
    for warning in warnings {
        eprintln!("{}", warning);
    }
    Ok(listing)
}

fn save(listing: Listing, filename: &str) -> Result<(), Error> {
    if listing.is_empty() {
        return Err(error!(InternalError; "nothing to save"));
    }
    let mut file = match File::create(filename) {
        Ok(file) => file,
        Err(error) => return Err(error!(InternalError; error.to_string().as_str())),
    };
    for line in listing.lines() {
        if let Err(error) = writeln!(file, "{}", line) {
            return Err(error!(InternalError; error.to_string().as_str()));
        }
    }
    Ok(())
}
