use crate::error;
use crate::lang::Error;
use std::convert::TryFrom;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// A runtime value. The type system is three-valued: 16-bit signed
/// integers, reals, and strings of at most 255 characters.
#[derive(Debug, PartialEq, Clone)]
pub enum Val {
    Integer(i16),
    Real(f64),
    String(Rc<str>),
}

impl Val {
    /// Rounding conversion used when narrowing a real into an
    /// integer context: halves round away from zero.
    pub fn round_i16(v: f64) -> Result<i16> {
        let r = v.round();
        if r < i16::MIN as f64 || r > i16::MAX as f64 {
            return Err(error!(Overflow));
        }
        Ok(r as i16)
    }

    /// PRINT formatting: positive numbers carry a leading space and
    /// every number a trailing space; strings print verbatim.
    pub fn print(&self) -> String {
        match self {
            Val::String(s) => s.to_string(),
            Val::Integer(n) => {
                if *n < 0 {
                    format!("{} ", n)
                } else {
                    format!(" {} ", n)
                }
            }
            Val::Real(v) => {
                let s = fmt_real(*v);
                if *v < 0.0 {
                    format!("{} ", s)
                } else {
                    format!(" {} ", s)
                }
            }
        }
    }
}

fn fmt_real(v: f64) -> String {
    // Nine significant digits, the way the hardware printed them.
    let mut s = format!("{:.9e}", v);
    if let Some(pos) = s.find('e') {
        let exp: i32 = s[pos + 1..].parse().unwrap_or(0);
        if (-5..9).contains(&exp) {
            s = format!("{}", (v * 1e9).round() / 1e9);
            return s;
        }
        let mantissa = s[..pos].trim_end_matches('0').trim_end_matches('.');
        return format!("{}E{}{:02}", mantissa, if exp < 0 { "-" } else { "+" }, exp.abs());
    }
    s
}

impl std::fmt::Display for Val {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Val::String(s) => write!(f, "{}", s),
            Val::Integer(n) => write!(f, "{}", n),
            Val::Real(v) => write!(f, "{}", fmt_real(*v)),
        }
    }
}

impl TryFrom<Val> for i16 {
    type Error = Error;
    fn try_from(val: Val) -> Result<Self> {
        match val {
            Val::Integer(n) => Ok(n),
            Val::Real(v) => Val::round_i16(v),
            Val::String(_) => Err(error!(TypeMismatch)),
        }
    }
}

impl TryFrom<Val> for f64 {
    type Error = Error;
    fn try_from(val: Val) -> Result<Self> {
        match val {
            Val::Integer(n) => Ok(n as f64),
            Val::Real(v) => Ok(v),
            Val::String(_) => Err(error!(TypeMismatch)),
        }
    }
}

impl TryFrom<Val> for u16 {
    type Error = Error;
    fn try_from(val: Val) -> Result<Self> {
        let v = f64::try_from(val)?.round();
        if v < 0.0 || v > u16::MAX as f64 {
            return Err(error!(ImproperArgument));
        }
        Ok(v as u16)
    }
}

impl TryFrom<Val> for usize {
    type Error = Error;
    fn try_from(val: Val) -> Result<Self> {
        let v = f64::try_from(val)?.round();
        if v < 0.0 || v > u32::MAX as f64 {
            return Err(error!(ImproperArgument));
        }
        Ok(v as usize)
    }
}

impl TryFrom<Val> for Rc<str> {
    type Error = Error;
    fn try_from(val: Val) -> Result<Self> {
        match val {
            Val::String(s) => Ok(s),
            _ => Err(error!(TypeMismatch)),
        }
    }
}

impl TryFrom<usize> for Val {
    type Error = Error;
    fn try_from(n: usize) -> Result<Self> {
        match i16::try_from(n) {
            Ok(i) => Ok(Val::Integer(i)),
            Err(_) => Err(error!(Overflow)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(Val::round_i16(1.5).unwrap(), 2);
        assert_eq!(Val::round_i16(-1.5).unwrap(), -2);
        assert_eq!(Val::round_i16(2.4).unwrap(), 2);
        assert!(Val::round_i16(40000.0).is_err());
    }

    #[test]
    fn test_print_format() {
        assert_eq!(Val::Integer(1).print(), " 1 ");
        assert_eq!(Val::Integer(-7).print(), "-7 ");
        assert_eq!(Val::String("HI".into()).print(), "HI");
    }
}
