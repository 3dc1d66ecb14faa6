use super::{Column, LineNumber};

#[derive(PartialEq)]
pub struct Error {
    code: u16,
    line_number: LineNumber,
    column: Column,
    message: String,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident, ..$col:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_column($col)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line_number($line)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, ..$col:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_column($col)
            .message($msg)
    };
    ($err:ident, $line:expr, ..$col:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .in_column($col)
    };
    ($err:ident, $line:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .message($msg)
    };
    ($err:ident, $line:expr, ..$col:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .in_column($col)
            .message($msg)
    };
}

/// The Locomotive error code catalogue. Codes are part of the
/// language surface: `ERR` reports them and `ON ERROR GOTO` handlers
/// dispatch on them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorCode {
    UnexpectedNext = 1,
    SyntaxError = 2,
    UnexpectedReturn = 3,
    DataExhausted = 4,
    ImproperArgument = 5,
    Overflow = 6,
    MemoryFull = 7,
    UndefinedLine = 8,
    SubscriptOutOfRange = 9,
    ArrayAlreadyDimensioned = 10,
    DivisionByZero = 11,
    InvalidDirectCommand = 12,
    TypeMismatch = 13,
    StringTooLong = 15,
    CannotContinue = 17,
    UnknownUserFunction = 18,
    ResumeMissing = 19,
    UnexpectedResume = 20,
    OperandMissing = 22,
    LineTooLong = 23,
    NextMissing = 26,
    WendMissing = 29,
    UnexpectedWend = 30,
    FileNotOpen = 31,
    InternalError = 51,
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code: code as u16,
            line_number: None,
            column: 0..0,
            message: String::new(),
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn is_direct(&self) -> bool {
        self.line_number.is_none()
    }

    pub fn line_number(&self) -> LineNumber {
        self.line_number
    }

    pub fn column(&self) -> Column {
        self.column.clone()
    }

    pub fn in_line_number(&self, line: LineNumber) -> Error {
        Error {
            code: self.code,
            line_number: line,
            column: self.column.clone(),
            message: self.message.clone(),
        }
    }

    pub fn in_column(&self, column: &Column) -> Error {
        debug_assert_eq!(self.column, 0..0);
        Error {
            code: self.code,
            line_number: self.line_number,
            column: column.clone(),
            message: self.message.clone(),
        }
    }

    pub fn message(&self, message: &str) -> Error {
        debug_assert!(self.message.is_empty());
        Error {
            code: self.code,
            line_number: self.line_number,
            column: self.column.clone(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let code_str = match self.code {
            1 => "Unexpected NEXT",
            2 => "Syntax error",
            3 => "Unexpected RETURN",
            4 => "DATA exhausted",
            5 => "Improper argument",
            6 => "Overflow",
            7 => "Memory full",
            8 => "Line does not exist",
            9 => "Subscript out of range",
            10 => "Array already dimensioned",
            11 => "Division by zero",
            12 => "Invalid direct command",
            13 => "Type mismatch",
            15 => "String too long",
            17 => "Cannot CONTinue",
            18 => "Unknown user function",
            19 => "RESUME missing",
            20 => "Unexpected RESUME",
            22 => "Operand missing",
            23 => "Line too long",
            26 => "NEXT missing",
            29 => "WEND missing",
            30 => "Unexpected WEND",
            31 => "File not open",
            51 => "Internal error",
            _ => "",
        };
        let mut suffix = String::new();
        if let Some(line_number) = self.line_number {
            suffix.push_str(&format!(" in {}", line_number));
        }
        if (0..0) != self.column {
            suffix.push_str(&format!(" ({}..{})", self.column.start, self.column.end));
        }
        if !self.message.is_empty() {
            suffix.push_str(&format!("; {}", self.message));
        }
        if code_str.is_empty() {
            write!(f, "Program error {}{}", self.code, suffix)
        } else {
            write!(f, "{}{}", code_str, suffix)
        }
    }
}
