use super::opcode::Ty;
use super::{Opcode, Val};
use crate::error;
use crate::lang::Error;
use std::convert::TryFrom;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

pub struct Function {}

impl Function {
    /// The built-in function table: opcode and accepted argument
    /// count. Variadic entries get their argument count pushed as a
    /// literal ahead of the opcode.
    pub fn opcode_and_arity(func_name: &str) -> Option<(Opcode, std::ops::RangeInclusive<usize>)> {
        use Opcode as O;
        match func_name {
            "ABS" => Some((O::Abs, 1..=1)),
            "ASC" => Some((O::Asc, 1..=1)),
            "ATN" => Some((O::Atn, 1..=1)),
            "BIN$" => Some((O::BinStr, 1..=2)),
            "CHR$" => Some((O::ChrStr, 1..=1)),
            "COS" => Some((O::Cos, 1..=1)),
            "ERL" => Some((O::Erl, 0..=0)),
            "ERR" => Some((O::Err, 0..=0)),
            "EXP" => Some((O::Exp, 1..=1)),
            "FIX" => Some((O::Fix, 1..=1)),
            "HEX$" => Some((O::HexStr, 1..=2)),
            "INKEY$" => Some((O::InkeyStr, 0..=0)),
            "INSTR" => Some((O::Instr, 2..=3)),
            "INT" => Some((O::Int, 1..=1)),
            "LEFT$" => Some((O::LeftStr, 2..=2)),
            "LEN" => Some((O::Len, 1..=1)),
            "LOG" => Some((O::Log, 1..=1)),
            "LOG10" => Some((O::Log10, 1..=1)),
            "LOWER$" => Some((O::LowerStr, 1..=1)),
            "MAX" => Some((O::Max, 1..=255)),
            "MIN" => Some((O::Min, 1..=255)),
            "MID$" => Some((O::MidStr, 2..=3)),
            "PI" => Some((O::Pi, 0..=0)),
            "REMAIN" => Some((O::Remain, 1..=1)),
            "RIGHT$" => Some((O::RightStr, 2..=2)),
            "RND" => Some((O::Rnd, 0..=1)),
            "ROUND" => Some((O::Round, 1..=2)),
            "SGN" => Some((O::Sgn, 1..=1)),
            "SIN" => Some((O::Sin, 1..=1)),
            "SPACE$" => Some((O::SpaceStr, 1..=1)),
            "SQ" => Some((O::Sq, 1..=1)),
            "SQR" => Some((O::Sqr, 1..=1)),
            "STR$" => Some((O::StrStr, 1..=1)),
            "STRING$" => Some((O::StringStr, 2..=2)),
            "TAN" => Some((O::Tan, 1..=1)),
            "TIME" => Some((O::Time, 0..=0)),
            "UPPER$" => Some((O::UpperStr, 1..=1)),
            "VAL" => Some((O::Val, 1..=1)),
            _ => None,
        }
    }

    /// Static result type for expression inference.
    pub fn return_ty(opcode: &Opcode) -> Ty {
        use Opcode as O;
        match opcode {
            O::BinStr | O::ChrStr | O::HexStr | O::InkeyStr | O::LeftStr | O::LowerStr
            | O::MidStr | O::RightStr | O::SpaceStr | O::StrStr | O::StringStr | O::UpperStr => {
                Ty::String
            }
            O::Asc | O::Err | O::Instr | O::Len | O::Sgn | O::Sq => Ty::Integer,
            _ => Ty::Real,
        }
    }

    /// Static argument checking: the few string-taking functions are
    /// spelled out; everything else takes numbers.
    pub fn check_args(opcode: &Opcode, args: &[Ty]) -> Result<()> {
        use Opcode as O;
        let ok = match opcode {
            O::Asc | O::Len | O::LowerStr | O::UpperStr | O::Val => args == [Ty::String],
            O::LeftStr | O::RightStr => {
                args.len() == 2 && args[0] == Ty::String && args[1] != Ty::String
            }
            O::MidStr => args[0] == Ty::String && args[1..].iter().all(|t| *t != Ty::String),
            O::Instr => match args.len() {
                2 => args == [Ty::String, Ty::String],
                _ => args[0] != Ty::String && args[1] == Ty::String && args[2] == Ty::String,
            },
            O::StringStr => args.len() == 2 && args[0] != Ty::String,
            _ => args.iter().all(|t| *t != Ty::String),
        };
        if ok {
            Ok(())
        } else {
            Err(error!(TypeMismatch))
        }
    }

    pub fn abs(val: Val) -> Result<Val> {
        match val {
            Val::Integer(n) => match n.checked_abs() {
                Some(n) => Ok(Val::Integer(n)),
                None => Err(error!(Overflow)),
            },
            Val::Real(n) => Ok(Val::Real(n.abs())),
            Val::String(_) => Err(error!(TypeMismatch)),
        }
    }

    pub fn asc(val: Val) -> Result<Val> {
        let s = Rc::<str>::try_from(val)?;
        match s.chars().next() {
            Some(c) => Ok(Val::Integer(c as u32 as i16)),
            None => Err(error!(ImproperArgument)),
        }
    }

    pub fn atn(val: Val) -> Result<Val> {
        Ok(Val::Real(f64::try_from(val)?.atan()))
    }

    pub fn bin_str(val: Val, digits: Option<Val>) -> Result<Val> {
        let n = i16::try_from(val)? as u16;
        let width = match digits {
            Some(d) => usize::try_from(d)?.min(16),
            None => 0,
        };
        Ok(Val::String(format!("{:0width$b}", n, width = width).into()))
    }

    pub fn chr_str(val: Val) -> Result<Val> {
        let n = i16::try_from(val)?;
        if !(0..=255).contains(&n) {
            return Err(error!(ImproperArgument));
        }
        Ok(Val::String((n as u8 as char).to_string().into()))
    }

    pub fn cos(val: Val) -> Result<Val> {
        Ok(Val::Real(f64::try_from(val)?.cos()))
    }

    pub fn exp(val: Val) -> Result<Val> {
        let v = f64::try_from(val)?.exp();
        if !v.is_finite() {
            return Err(error!(Overflow));
        }
        Ok(Val::Real(v))
    }

    pub fn fix(val: Val) -> Result<Val> {
        Ok(Val::Real(f64::try_from(val)?.trunc()))
    }

    pub fn hex_str(val: Val, digits: Option<Val>) -> Result<Val> {
        let n = i16::try_from(val)? as u16;
        let width = match digits {
            Some(d) => usize::try_from(d)?.min(16),
            None => 0,
        };
        Ok(Val::String(format!("{:0width$X}", n, width = width).into()))
    }

    pub fn instr(start: Option<Val>, haystack: Val, needle: Val) -> Result<Val> {
        let start = match start {
            Some(v) => usize::try_from(v)?.max(1),
            None => 1,
        };
        let haystack = Rc::<str>::try_from(haystack)?;
        let needle = Rc::<str>::try_from(needle)?;
        if start > haystack.chars().count() {
            return Ok(Val::Integer(0));
        }
        let skipped: String = haystack.chars().skip(start - 1).collect();
        match skipped.find(&*needle) {
            Some(pos) => {
                let chars = skipped[..pos].chars().count();
                Ok(Val::Integer((start + chars) as i16))
            }
            None => Ok(Val::Integer(0)),
        }
    }

    pub fn int(val: Val) -> Result<Val> {
        Ok(Val::Real(f64::try_from(val)?.floor()))
    }

    pub fn left_str(val: Val, len: Val) -> Result<Val> {
        let s = Rc::<str>::try_from(val)?;
        let len = usize::try_from(len)?;
        Ok(Val::String(s.chars().take(len).collect::<String>().into()))
    }

    pub fn len(val: Val) -> Result<Val> {
        let s = Rc::<str>::try_from(val)?;
        Ok(Val::Integer(s.chars().count() as i16))
    }

    pub fn log(val: Val) -> Result<Val> {
        let v = f64::try_from(val)?;
        if v <= 0.0 {
            return Err(error!(ImproperArgument));
        }
        Ok(Val::Real(v.ln()))
    }

    pub fn log10(val: Val) -> Result<Val> {
        let v = f64::try_from(val)?;
        if v <= 0.0 {
            return Err(error!(ImproperArgument));
        }
        Ok(Val::Real(v.log10()))
    }

    pub fn lower_str(val: Val) -> Result<Val> {
        let s = Rc::<str>::try_from(val)?;
        Ok(Val::String(s.to_ascii_lowercase().into()))
    }

    pub fn max(mut vals: Vec<Val>) -> Result<Val> {
        let mut best = f64::try_from(vals.pop().ok_or_else(|| error!(OperandMissing))?)?;
        for v in vals {
            best = best.max(f64::try_from(v)?);
        }
        Ok(Val::Real(best))
    }

    pub fn min(mut vals: Vec<Val>) -> Result<Val> {
        let mut best = f64::try_from(vals.pop().ok_or_else(|| error!(OperandMissing))?)?;
        for v in vals {
            best = best.min(f64::try_from(v)?);
        }
        Ok(Val::Real(best))
    }

    pub fn mid_str(val: Val, start: Val, len: Option<Val>) -> Result<Val> {
        let s = Rc::<str>::try_from(val)?;
        let start = usize::try_from(start)?;
        if start == 0 {
            return Err(error!(ImproperArgument));
        }
        let rest = s.chars().skip(start - 1);
        let out: String = match len {
            Some(len) => rest.take(usize::try_from(len)?).collect(),
            None => rest.collect(),
        };
        Ok(Val::String(out.into()))
    }

    pub fn right_str(val: Val, len: Val) -> Result<Val> {
        let s = Rc::<str>::try_from(val)?;
        let len = usize::try_from(len)?;
        let count = s.chars().count();
        Ok(Val::String(
            s.chars().skip(count.saturating_sub(len)).collect::<String>().into(),
        ))
    }

    pub fn round(val: Val, decimals: Option<Val>) -> Result<Val> {
        let v = f64::try_from(val)?;
        let d = match decimals {
            Some(d) => i16::try_from(d)?,
            None => 0,
        };
        let scale = 10f64.powi(d as i32);
        Ok(Val::Real((v * scale).round() / scale))
    }

    pub fn sgn(val: Val) -> Result<Val> {
        let v = f64::try_from(val)?;
        Ok(Val::Integer(if v > 0.0 {
            1
        } else if v < 0.0 {
            -1
        } else {
            0
        }))
    }

    pub fn sin(val: Val) -> Result<Val> {
        Ok(Val::Real(f64::try_from(val)?.sin()))
    }

    pub fn space_str(val: Val) -> Result<Val> {
        let len = usize::try_from(val)?;
        if len > 255 {
            return Err(error!(StringTooLong));
        }
        Ok(Val::String(" ".repeat(len).into()))
    }

    pub fn sqr(val: Val) -> Result<Val> {
        let v = f64::try_from(val)?;
        if v < 0.0 {
            return Err(error!(ImproperArgument));
        }
        Ok(Val::Real(v.sqrt()))
    }

    pub fn str_str(val: Val) -> Result<Val> {
        match val {
            Val::String(_) => Err(error!(TypeMismatch)),
            v => Ok(Val::String(v.print().trim_end().to_string().into())),
        }
    }

    pub fn string_str(len: Val, what: Val) -> Result<Val> {
        let len = usize::try_from(len)?;
        if len > 255 {
            return Err(error!(StringTooLong));
        }
        let ch = match what {
            Val::String(s) => s.chars().next().ok_or_else(|| error!(ImproperArgument))?,
            v => {
                let n = i16::try_from(v)?;
                if !(0..=255).contains(&n) {
                    return Err(error!(ImproperArgument));
                }
                n as u8 as char
            }
        };
        Ok(Val::String(ch.to_string().repeat(len).into()))
    }

    pub fn tan(val: Val) -> Result<Val> {
        Ok(Val::Real(f64::try_from(val)?.tan()))
    }

    pub fn upper_str(val: Val) -> Result<Val> {
        let s = Rc::<str>::try_from(val)?;
        Ok(Val::String(s.to_ascii_uppercase().into()))
    }

    pub fn val(val: Val) -> Result<Val> {
        let s = Rc::<str>::try_from(val)?;
        let t = s.trim();
        let digits: String = t
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == '+')
            .collect();
        if digits.is_empty() {
            return Ok(Val::Integer(0));
        }
        if let Ok(n) = digits.parse::<i16>() {
            return Ok(Val::Integer(n));
        }
        match digits.parse::<f64>() {
            Ok(v) => Ok(Val::Real(v)),
            Err(_) => Ok(Val::Integer(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_table() {
        let (op, arity) = Function::opcode_and_arity("MID$").unwrap();
        assert_eq!(op, Opcode::MidStr);
        assert!(arity.contains(&2) && arity.contains(&3));
        assert!(Function::opcode_and_arity("NOPE").is_none());
    }

    #[test]
    fn test_string_functions() {
        let v = Function::mid_str(Val::String("BASIC".into()), Val::Integer(2), None).unwrap();
        assert_eq!(v, Val::String("ASIC".into()));
        let v = Function::instr(None, Val::String("ABCA".into()), Val::String("CA".into()))
            .unwrap();
        assert_eq!(v, Val::Integer(3));
        let v = Function::str_str(Val::Integer(5)).unwrap();
        assert_eq!(v, Val::String(" 5".into()));
    }

    #[test]
    fn test_check_args() {
        assert!(Function::check_args(&Opcode::Len, &[Ty::String]).is_ok());
        assert!(Function::check_args(&Opcode::Len, &[Ty::Integer]).is_err());
        assert!(Function::check_args(&Opcode::Cos, &[Ty::Real]).is_ok());
        assert!(Function::check_args(&Opcode::Cos, &[Ty::String]).is_err());
    }
}
