use super::Val;
use crate::error;
use crate::lang::Error;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Variable memory
///
/// Keys always end in their resolved sigil; the code generator has
/// already folded DEFINT/DEFREAL/DEFSTR ranges into the name. Array
/// elements are stored under `i,j,NAME` keys and the dimension table
/// remembers each array's bounds (and with them its subscript
/// count).

#[derive(Debug, Default)]
pub struct Var {
    vars: HashMap<Rc<str>, Val>,
    dims: HashMap<Rc<str>, Vec<i16>>,
    order: Vec<Rc<str>>,
}

impl Var {
    pub fn new() -> Var {
        Var::default()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
        self.dims.clear();
        self.order.clear();
    }

    pub fn fetch(&self, var_name: &Rc<str>) -> Val {
        match self.vars.get(var_name) {
            Some(val) => val.clone(),
            None => {
                if var_name.ends_with('$') {
                    Val::String("".into())
                } else if var_name.ends_with('%') {
                    Val::Integer(0)
                } else {
                    Val::Real(0.0)
                }
            }
        }
    }

    pub fn store(&mut self, var_name: &Rc<str>, value: Val) -> Result<()> {
        if self.vars.len() > u16::MAX as usize {
            return Err(error!(MemoryFull));
        }
        if var_name.ends_with('$') {
            self.insert_string(var_name, value)
        } else if var_name.ends_with('%') {
            self.insert_integer(var_name, value)
        } else {
            self.insert_real(var_name, value)
        }
    }

    /// A stable small integer standing in for the address of a
    /// variable, good enough to pass around and compare.
    pub fn address_of(&mut self, var_name: &Rc<str>) -> Result<Val> {
        let index = match self.order.iter().position(|n| n == var_name) {
            Some(index) => index,
            None => {
                self.order.push(var_name.clone());
                self.order.len() - 1
            }
        };
        match i16::try_from(index) {
            Ok(n) => Ok(Val::Integer(n)),
            Err(_) => Err(error!(MemoryFull)),
        }
    }

    pub fn store_array(&mut self, var_name: &Rc<str>, subscripts: Vec<Val>, value: Val) -> Result<()> {
        let key = self.build_array_key(var_name, subscripts)?;
        self.store_key_typed(var_name, &key, value)
    }

    pub fn fetch_array(&mut self, var_name: &Rc<str>, subscripts: Vec<Val>) -> Result<Val> {
        let key = self.build_array_key(var_name, subscripts)?;
        if var_name.ends_with('$') {
            Ok(self
                .vars
                .get(&key)
                .cloned()
                .unwrap_or_else(|| Val::String("".into())))
        } else if var_name.ends_with('%') {
            Ok(self.vars.get(&key).cloned().unwrap_or(Val::Integer(0)))
        } else {
            Ok(self.vars.get(&key).cloned().unwrap_or(Val::Real(0.0)))
        }
    }

    pub fn dimension_array(&mut self, var_name: &Rc<str>, bounds: Vec<Val>) -> Result<()> {
        if self.dims.contains_key(var_name) {
            return Err(error!(ArrayAlreadyDimensioned));
        }
        let vi = self.vec_val_to_vec_i16(bounds)?;
        self.dims.insert(var_name.clone(), vi);
        Ok(())
    }

    fn build_array_key(&mut self, var_name: &Rc<str>, subscripts: Vec<Val>) -> Result<Rc<str>> {
        let requested = self.vec_val_to_vec_i16(subscripts)?;
        let dimensioned = match self.dims.get(var_name) {
            Some(v) => v,
            // An undimensioned array defaults to 10 per subscript.
            None => self
                .dims
                .entry(var_name.clone())
                .or_insert_with(|| vec![10; requested.len()]),
        };
        if dimensioned.len() != requested.len() {
            return Err(error!(SubscriptOutOfRange));
        }
        for (r, d) in requested.iter().zip(dimensioned) {
            if r > d {
                return Err(error!(SubscriptOutOfRange));
            }
        }
        let mut s: String = requested.iter().map(|r| format!("{},", r)).collect();
        s.push_str(var_name);
        Ok(s.into())
    }

    fn vec_val_to_vec_i16(&self, mut subscripts: Vec<Val>) -> Result<Vec<i16>> {
        let mut vec_i16: Vec<i16> = vec![];
        for v in subscripts.drain(..) {
            let i = i16::try_from(v)?;
            if i < 0 {
                return Err(error!(SubscriptOutOfRange));
            }
            vec_i16.push(i);
        }
        Ok(vec_i16)
    }

    fn store_key_typed(&mut self, var_name: &Rc<str>, key: &Rc<str>, value: Val) -> Result<()> {
        if self.vars.len() > u16::MAX as usize {
            return Err(error!(MemoryFull));
        }
        if var_name.ends_with('$') {
            self.insert_string(key, value)
        } else if var_name.ends_with('%') {
            self.insert_integer(key, value)
        } else {
            self.insert_real(key, value)
        }
    }

    fn update_val(&mut self, var_name: &Rc<str>, value: Val) {
        if match &value {
            Val::String(s) => s.is_empty(),
            Val::Integer(n) => *n == 0,
            Val::Real(n) => *n == 0.0,
        } {
            self.vars.remove(var_name);
        } else {
            self.vars.insert(var_name.clone(), value);
        }
    }

    fn insert_string(&mut self, var_name: &Rc<str>, value: Val) -> Result<()> {
        match &value {
            Val::String(s) => {
                if s.chars().count() > 255 {
                    return Err(error!(StringTooLong; "maximum string length is 255"));
                }
                self.update_val(var_name, value);
                Ok(())
            }
            _ => Err(error!(TypeMismatch)),
        }
    }

    fn insert_integer(&mut self, var_name: &Rc<str>, value: Val) -> Result<()> {
        match value {
            Val::Integer(_) => self.update_val(var_name, value),
            _ => self.update_val(var_name, Val::Integer(i16::try_from(value)?)),
        }
        Ok(())
    }

    fn insert_real(&mut self, var_name: &Rc<str>, value: Val) -> Result<()> {
        match value {
            Val::Real(_) => self.update_val(var_name, value),
            _ => self.update_val(var_name, Val::Real(f64::try_from(value)?)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_defaults() {
        let vars = Var::new();
        assert_eq!(vars.fetch(&"A$".into()), Val::String("".into()));
        assert_eq!(vars.fetch(&"A%".into()), Val::Integer(0));
        assert_eq!(vars.fetch(&"A!".into()), Val::Real(0.0));
    }

    #[test]
    fn test_store_coerces_by_sigil() {
        let mut vars = Var::new();
        vars.store(&"A%".into(), Val::Real(1.5)).unwrap();
        assert_eq!(vars.fetch(&"A%".into()), Val::Integer(2));
        assert!(vars.store(&"A%".into(), Val::String("X".into())).is_err());
    }

    #[test]
    fn test_array_dim_and_subscripts() {
        let mut vars = Var::new();
        vars.dimension_array(&"A!".into(), vec![Val::Integer(2), Val::Integer(2)])
            .unwrap();
        vars.store_array(
            &"A!".into(),
            vec![Val::Integer(1), Val::Integer(2)],
            Val::Real(7.0),
        )
        .unwrap();
        assert_eq!(
            vars.fetch_array(&"A!".into(), vec![Val::Integer(1), Val::Integer(2)])
                .unwrap(),
            Val::Real(7.0)
        );
        assert!(vars
            .fetch_array(&"A!".into(), vec![Val::Integer(3), Val::Integer(0)])
            .is_err());
        assert!(vars
            .fetch_array(&"A!".into(), vec![Val::Integer(1)])
            .is_err());
        assert!(vars
            .dimension_array(&"A!".into(), vec![Val::Integer(5)])
            .is_err());
    }
}
