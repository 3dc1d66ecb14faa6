use super::{Address, Val};
use std::rc::Rc;

/// ## Virtual machine instruction set
///
/// The BASIC virtual machine has no registers. Every operation is
/// performed on the value stack.
///
/// For example: `LET A=3*B` compiles to `[Literal(3), Push(B), Mul,
/// Pop(A)]`.
///
/// Control flow is flat: the code generator lowers structured and
/// unstructured statements alike into one opcode vector addressed by
/// the link's symbol table, and the runtime's program counter is the
/// resume point for every cooperative suspend.

/// Static type of an expression, assigned at generation time.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Ty {
    Integer,
    Real,
    String,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Opcode {
    // *** Stack manipulation
    /// Push literal value on to the stack.
    Literal(Val),
    /// Push stack value of named variable. Infallible.
    Push(Rc<str>),
    /// Pop stack value to named variable, coercing to its type.
    Pop(Rc<str>),
    /// Pop value then n subscripts; store the array element.
    PopArr(Rc<str>, usize),
    /// Pop n subscripts; push the array element.
    PushArr(Rc<str>, usize),
    /// Pop n bounds; dimension the array.
    DimArr(Rc<str>, usize),
    /// Round the real on top of the stack into an integer.
    ToInt,
    /// Push the storage index of a variable as an integer.
    Addr(Rc<str>),

    // *** Branch control
    /// Line boundary: tracking for errors, RESUME and TRON.
    Line(u16),
    /// Unconditional branch.
    Jump(Address),
    /// Pop; branch if zero.
    IfNot(Address),
    /// Push a return frame and branch.
    Gosub(Address),
    /// Pop a return frame and branch back. Restores any timer
    /// priority ceiling the frame carries.
    Return,
    /// Pop selector; skip into the following table of n Jumps, or
    /// over it when the selector is out of range.
    OnGoto(usize),
    /// As OnGoto, but a taken branch first pushes a return frame
    /// whose return address is past the table.
    OnGosub(usize),
    /// Push a FOR entry for the named loop variable.
    ForPush(Rc<str>),
    /// Pop step, limit, value; push the loop-continue flag.
    ForTest,
    /// Pop the FOR entry at loop exit.
    ForPop,
    /// The named NEXT must match the innermost FOR entry.
    NextVar(Rc<str>),
    /// Push a WHILE entry.
    WhilePush,
    /// A WEND with no WHILE entry is an error.
    WendCheck,
    /// Pop the WHILE entry at loop exit.
    WhilePop,
    /// Register the user function whose body follows the next Jump.
    DefFn(Rc<str>, Rc<[Rc<str>]>),
    /// Pop n arguments, bind parameters, call the function body.
    CallFn(Rc<str>, usize),
    /// Return from a user function body, unbinding parameters.
    FnEnd,

    // *** Statements
    Clear,
    Cls,
    Cont,
    End,
    New,
    Stop,
    Run(Address),
    /// Pop filename; load and run it.
    RunFile,
    /// Pop filename; replace the program with it.
    Load,
    /// Pop filename; write the program to it.
    Save,
    /// Pop filename; load keeping variables, optionally merging,
    /// starting at the given line.
    Chain(bool, Option<u16>),
    /// Pop prompt; suspend for a reply. The op's own address is the
    /// resume label a bad reply rewinds to.
    Input(usize),
    /// Take the next reply field, parsed to the target type.
    ReadInput(Ty),
    /// Pop stream number for the current PRINT/INPUT statement.
    Stream,
    /// Pop a value into the print buffer.
    PrintVal,
    /// Advance the print buffer to the next comma zone.
    PrintTab,
    PrintNl,
    /// Yield the buffered text to the host.
    PrintFlush,
    List(u16, u16),
    Renum(u16, u16, u16, u16),
    /// Read the next DATA item as the target type.
    Read(Ty),
    /// Move the DATA pointer to the first item at or after a line.
    Restore(u16),
    Mode,
    Frame,
    /// Pop duration, period, channel; queue a sound or suspend while
    /// the channel queue is full.
    Sound,
    /// Arm an AFTER/EVERY timer: pop slot and delay.
    Timer(bool, u16),
    /// Disarm a timer slot and push its remaining frames.
    Remain,
    OnErrorGoto(u16),
    OnSqGosub(u16),
    OnBreakCont,
    OnBreakStop,
    OnBreakGosub(u16),
    Resume(u16),
    ResumeNext,
    Tron,
    Troff,

    // *** Expression operations
    Neg,
    Pow,
    Mul,
    Div,
    DivInt,
    Mod,
    Add,
    Sub,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Not,
    And,
    Or,
    Xor,

    // *** Built-in functions
    Abs,
    Asc,
    Atn,
    BinStr,
    ChrStr,
    Cos,
    Erl,
    Err,
    Exp,
    Fix,
    HexStr,
    InkeyStr,
    Instr,
    Int,
    LeftStr,
    Len,
    Log,
    Log10,
    LowerStr,
    Max,
    Min,
    MidStr,
    Pi,
    RightStr,
    Rnd,
    Round,
    Sgn,
    Sin,
    SpaceStr,
    Sq,
    Sqr,
    StrStr,
    StringStr,
    Tan,
    Time,
    UpperStr,
    Val,
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Opcode::*;
        match self {
            Literal(v) => write!(f, "LITERAL({:?})", v),
            Push(s) => write!(f, "PUSH({})", s),
            Pop(s) => write!(f, "POP({})", s),
            PopArr(s, n) => write!(f, "POPARR({},{})", s, n),
            PushArr(s, n) => write!(f, "PUSHARR({},{})", s, n),
            DimArr(s, n) => write!(f, "DIMARR({},{})", s, n),
            ToInt => write!(f, "TOINT"),
            Addr(s) => write!(f, "ADDR({})", s),

            Line(n) => write!(f, "LINE({})", n),
            Jump(a) => write!(f, "JUMP({})", a),
            IfNot(a) => write!(f, "IFNOT({})", a),
            Gosub(a) => write!(f, "GOSUB({})", a),
            Return => write!(f, "RETURN"),
            OnGoto(n) => write!(f, "ONGOTO({})", n),
            OnGosub(n) => write!(f, "ONGOSUB({})", n),
            ForPush(s) => write!(f, "FORPUSH({})", s),
            ForTest => write!(f, "FORTEST"),
            ForPop => write!(f, "FORPOP"),
            NextVar(s) => write!(f, "NEXTVAR({})", s),
            WhilePush => write!(f, "WHILEPUSH"),
            WendCheck => write!(f, "WENDCHECK"),
            WhilePop => write!(f, "WHILEPOP"),
            DefFn(s, _) => write!(f, "DEFFN({})", s),
            CallFn(s, n) => write!(f, "CALLFN({},{})", s, n),
            FnEnd => write!(f, "FNEND"),

            Clear => write!(f, "CLEAR"),
            Cls => write!(f, "CLS"),
            Cont => write!(f, "CONT"),
            End => write!(f, "END"),
            New => write!(f, "NEW"),
            Stop => write!(f, "STOP"),
            Run(a) => write!(f, "RUN({})", a),
            RunFile => write!(f, "RUNFILE"),
            Load => write!(f, "LOAD"),
            Save => write!(f, "SAVE"),
            Chain(m, l) => write!(f, "CHAIN({},{:?})", m, l),
            Input(n) => write!(f, "INPUT({})", n),
            ReadInput(t) => write!(f, "READINPUT({:?})", t),
            Stream => write!(f, "STREAM"),
            PrintVal => write!(f, "PRINTVAL"),
            PrintTab => write!(f, "PRINTTAB"),
            PrintNl => write!(f, "PRINTNL"),
            PrintFlush => write!(f, "PRINTFLUSH"),
            List(a, b) => write!(f, "LIST({},{})", a, b),
            Renum(a, b, c, d) => write!(f, "RENUM({},{},{},{})", a, b, c, d),
            Read(t) => write!(f, "READ({:?})", t),
            Restore(n) => write!(f, "RESTORE({})", n),
            Mode => write!(f, "MODE"),
            Frame => write!(f, "FRAME"),
            Sound => write!(f, "SOUND"),
            Timer(r, n) => write!(f, "TIMER({},{})", r, n),
            Remain => write!(f, "REMAIN"),
            OnErrorGoto(n) => write!(f, "ONERRORGOTO({})", n),
            OnSqGosub(n) => write!(f, "ONSQGOSUB({})", n),
            OnBreakCont => write!(f, "ONBREAKCONT"),
            OnBreakStop => write!(f, "ONBREAKSTOP"),
            OnBreakGosub(n) => write!(f, "ONBREAKGOSUB({})", n),
            Resume(n) => write!(f, "RESUME({})", n),
            ResumeNext => write!(f, "RESUMENEXT"),
            Tron => write!(f, "TRON"),
            Troff => write!(f, "TROFF"),

            Neg => write!(f, "NEG"),
            Pow => write!(f, "POW"),
            Mul => write!(f, "MUL"),
            Div => write!(f, "DIV"),
            DivInt => write!(f, "DIVINT"),
            Mod => write!(f, "MOD"),
            Add => write!(f, "ADD"),
            Sub => write!(f, "SUB"),
            Eq => write!(f, "EQ"),
            NotEq => write!(f, "NOTEQ"),
            Lt => write!(f, "LT"),
            LtEq => write!(f, "LTEQ"),
            Gt => write!(f, "GT"),
            GtEq => write!(f, "GTEQ"),
            Not => write!(f, "NOT"),
            And => write!(f, "AND"),
            Or => write!(f, "OR"),
            Xor => write!(f, "XOR"),

            Abs => write!(f, "ABS"),
            Asc => write!(f, "ASC"),
            Atn => write!(f, "ATN"),
            BinStr => write!(f, "BIN$"),
            ChrStr => write!(f, "CHR$"),
            Cos => write!(f, "COS"),
            Erl => write!(f, "ERL"),
            Err => write!(f, "ERR"),
            Exp => write!(f, "EXP"),
            Fix => write!(f, "FIX"),
            HexStr => write!(f, "HEX$"),
            InkeyStr => write!(f, "INKEY$"),
            Instr => write!(f, "INSTR"),
            Int => write!(f, "INT"),
            LeftStr => write!(f, "LEFT$"),
            Len => write!(f, "LEN"),
            Log => write!(f, "LOG"),
            Log10 => write!(f, "LOG10"),
            LowerStr => write!(f, "LOWER$"),
            Max => write!(f, "MAX"),
            Min => write!(f, "MIN"),
            MidStr => write!(f, "MID$"),
            Pi => write!(f, "PI"),
            RightStr => write!(f, "RIGHT$"),
            Rnd => write!(f, "RND"),
            Round => write!(f, "ROUND"),
            Sgn => write!(f, "SGN"),
            Sin => write!(f, "SIN"),
            SpaceStr => write!(f, "SPACE$"),
            Sq => write!(f, "SQ"),
            Sqr => write!(f, "SQR"),
            StrStr => write!(f, "STR$"),
            StringStr => write!(f, "STRING$"),
            Tan => write!(f, "TAN"),
            Time => write!(f, "TIME"),
            UpperStr => write!(f, "UPPER$"),
            Val => write!(f, "VAL"),
        }
    }
}
