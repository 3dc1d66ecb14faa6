use super::Val;
use crate::error;
use crate::lang::Error;
use std::convert::TryFrom;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Runtime operator semantics. Same-type operands stay in type,
/// mixed integer/real promotes to real, division and exponentiation
/// always produce a real, and the bitwise family rounds its operands
/// to integers first. The code generator has already rejected any
/// string/numeric mixture these functions would refuse.

pub struct Operation {}

impl Operation {
    fn truth(b: bool) -> Val {
        if b {
            Val::Integer(-1)
        } else {
            Val::Integer(0)
        }
    }

    pub fn negate(val: Val) -> Result<Val> {
        use Val::*;
        match val {
            Integer(n) => match n.checked_neg() {
                Some(n) => Ok(Integer(n)),
                None => Err(error!(Overflow)),
            },
            Real(n) => Ok(Real(-n)),
            String(_) => Err(error!(TypeMismatch)),
        }
    }

    pub fn sum(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (String(l), String(r)) => {
                let s = format!("{}{}", l, r);
                if s.chars().count() > 255 {
                    return Err(error!(StringTooLong));
                }
                Ok(String(s.into()))
            }
            (Integer(l), Integer(r)) => match l.checked_add(r) {
                Some(n) => Ok(Integer(n)),
                None => Err(error!(Overflow)),
            },
            (l, r) => Ok(Real(f64::try_from(l)? + f64::try_from(r)?)),
        }
    }

    pub fn subtract(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (Integer(l), Integer(r)) => match l.checked_sub(r) {
                Some(n) => Ok(Integer(n)),
                None => Err(error!(Overflow)),
            },
            (l, r) => Ok(Real(f64::try_from(l)? - f64::try_from(r)?)),
        }
    }

    pub fn multiply(lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (lhs, rhs) {
            (Integer(l), Integer(r)) => match l.checked_mul(r) {
                Some(n) => Ok(Integer(n)),
                None => Err(error!(Overflow)),
            },
            (l, r) => Ok(Real(f64::try_from(l)? * f64::try_from(r)?)),
        }
    }

    pub fn divide(lhs: Val, rhs: Val) -> Result<Val> {
        let l = f64::try_from(lhs)?;
        let r = f64::try_from(rhs)?;
        if r == 0.0 {
            return Err(error!(DivisionByZero));
        }
        Ok(Val::Real(l / r))
    }

    pub fn divide_int(lhs: Val, rhs: Val) -> Result<Val> {
        let l = i16::try_from(lhs)?;
        let r = i16::try_from(rhs)?;
        match l.checked_div(r) {
            Some(n) => Ok(Val::Integer(n)),
            None => {
                if r == 0 {
                    Err(error!(DivisionByZero))
                } else {
                    Err(error!(Overflow))
                }
            }
        }
    }

    pub fn modulo(lhs: Val, rhs: Val) -> Result<Val> {
        let l = i16::try_from(lhs)?;
        let r = i16::try_from(rhs)?;
        match l.checked_rem(r) {
            Some(n) => Ok(Val::Integer(n)),
            None => {
                if r == 0 {
                    Err(error!(DivisionByZero))
                } else {
                    Err(error!(Overflow))
                }
            }
        }
    }

    pub fn power(lhs: Val, rhs: Val) -> Result<Val> {
        let l = f64::try_from(lhs)?;
        let r = f64::try_from(rhs)?;
        let v = l.powf(r);
        if !v.is_finite() {
            return Err(error!(Overflow));
        }
        Ok(Val::Real(v))
    }

    pub fn equal(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Self::truth(Self::compare(lhs, rhs)? == std::cmp::Ordering::Equal))
    }

    pub fn not_equal(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Self::truth(Self::compare(lhs, rhs)? != std::cmp::Ordering::Equal))
    }

    pub fn less(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Self::truth(Self::compare(lhs, rhs)? == std::cmp::Ordering::Less))
    }

    pub fn less_equal(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Self::truth(Self::compare(lhs, rhs)? != std::cmp::Ordering::Greater))
    }

    pub fn greater(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Self::truth(Self::compare(lhs, rhs)? == std::cmp::Ordering::Greater))
    }

    pub fn greater_equal(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Self::truth(Self::compare(lhs, rhs)? != std::cmp::Ordering::Less))
    }

    fn compare(lhs: Val, rhs: Val) -> Result<std::cmp::Ordering> {
        use Val::*;
        match (lhs, rhs) {
            (String(l), String(r)) => Ok(Rc::as_ref(&l).cmp(Rc::as_ref(&r))),
            (Integer(l), Integer(r)) => Ok(l.cmp(&r)),
            (l, r) => {
                let l = f64::try_from(l)?;
                let r = f64::try_from(r)?;
                Ok(l.partial_cmp(&r).unwrap_or(std::cmp::Ordering::Equal))
            }
        }
    }

    pub fn not(val: Val) -> Result<Val> {
        let n = i16::try_from(val)?;
        Ok(Val::Integer(!n))
    }

    pub fn and(lhs: Val, rhs: Val) -> Result<Val> {
        let l = i16::try_from(lhs)?;
        let r = i16::try_from(rhs)?;
        Ok(Val::Integer(l & r))
    }

    pub fn or(lhs: Val, rhs: Val) -> Result<Val> {
        let l = i16::try_from(lhs)?;
        let r = i16::try_from(rhs)?;
        Ok(Val::Integer(l | r))
    }

    pub fn xor(lhs: Val, rhs: Val) -> Result<Val> {
        let l = i16::try_from(lhs)?;
        let r = i16::try_from(rhs)?;
        Ok(Val::Integer(l ^ r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_always_real() {
        let v = Operation::divide(Val::Integer(7), Val::Integer(2)).unwrap();
        assert_eq!(v, Val::Real(3.5));
    }

    #[test]
    fn test_integer_division_rounds_operands() {
        let v = Operation::divide_int(Val::Real(7.6), Val::Integer(2)).unwrap();
        assert_eq!(v, Val::Integer(4));
    }

    #[test]
    fn test_mixed_promotes_to_real() {
        let v = Operation::sum(Val::Integer(1), Val::Real(0.5)).unwrap();
        assert_eq!(v, Val::Real(1.5));
    }

    #[test]
    fn test_integer_overflow_reported() {
        assert!(Operation::sum(Val::Integer(32767), Val::Integer(1)).is_err());
    }

    #[test]
    fn test_string_compare() {
        let v = Operation::less(Val::String("A".into()), Val::String("B".into())).unwrap();
        assert_eq!(v, Val::Integer(-1));
    }

    #[test]
    fn test_logic_rounds() {
        let v = Operation::and(Val::Real(1.4), Val::Integer(3)).unwrap();
        assert_eq!(v, Val::Integer(1));
    }
}
