use super::{Address, Opcode, Symbol};
use crate::error;
use crate::lang::{Column, Error, LineNumber};
use std::collections::{BTreeMap, HashMap};

type Result<T> = std::result::Result<T, Error>;

/// The address from an unresolved reference when static validation
/// has been disabled by CHAIN. Branching here is a runtime error.
pub const UNDEFINED: Address = Address::MAX;

/// ## Opcodes plus the label table
///
/// A `Link` is a run of opcodes together with the symbols defined in
/// it and the references out of it. Statement fragments are built as
/// little Links and appended, rebasing their addresses, into the
/// program's master Link; `link()` then patches every recorded
/// reference to a real address and prunes unreferenced line symbols.

#[derive(Debug, Default)]
pub struct Link {
    ops: Vec<Opcode>,
    current_symbol: Symbol,
    symbols: BTreeMap<Symbol, Address>,
    unlinked: HashMap<Address, (Column, Symbol)>,
    checks: Vec<(Address, Column, Symbol)>,
    refs: HashMap<Symbol, usize>,
    validation_disabled: bool,
}

impl Link {
    pub fn new() -> Link {
        Link::default()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
        self.current_symbol = 0;
        self.symbols.clear();
        self.unlinked.clear();
        self.checks.clear();
        self.refs.clear();
        self.validation_disabled = false;
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn get(&self, addr: Address) -> Option<&Opcode> {
        self.ops.get(addr)
    }

    pub fn push(&mut self, op: Opcode) -> Result<()> {
        if self.ops.len() >= UNDEFINED - 1 {
            return Err(error!(MemoryFull; "program too large"));
        }
        self.ops.push(op);
        Ok(())
    }

    pub fn append(&mut self, mut other: Link) -> Result<()> {
        let base = self.ops.len();
        self.ops.append(&mut other.ops);
        for (symbol, addr) in other.symbols {
            self.symbols.insert(symbol, addr + base);
        }
        for (addr, dest) in other.unlinked {
            self.unlinked.insert(addr + base, dest);
        }
        for (addr, col, symbol) in other.checks {
            self.checks.push((addr + base, col, symbol));
        }
        for (symbol, count) in other.refs {
            *self.refs.entry(symbol).or_insert(0) += count;
        }
        self.validation_disabled |= other.validation_disabled;
        Ok(())
    }

    /// Generated labels count down so they can never collide with a
    /// line number. Only the master Link hands them out.
    pub fn next_symbol(&mut self) -> Symbol {
        self.current_symbol -= 1;
        self.current_symbol
    }

    pub fn set_start_symbol(&mut self, symbol: Symbol) {
        self.current_symbol = symbol;
    }

    pub fn start_symbol(&self) -> Symbol {
        self.current_symbol
    }

    pub fn push_symbol(&mut self, symbol: Symbol) {
        self.symbols.insert(symbol, self.ops.len());
    }

    pub fn reference(&mut self, symbol: Symbol) {
        *self.refs.entry(symbol).or_insert(0) += 1;
    }

    /// Validation-only reference: no op to patch, but the target must
    /// exist (RESTORE, ON ERROR GOTO, timer targets).
    pub fn check(&mut self, col: &Column, symbol: Symbol) {
        self.reference(symbol);
        self.checks.push((self.ops.len(), col.clone(), symbol));
    }

    pub fn push_jump(&mut self, col: Column, symbol: Symbol) -> Result<()> {
        self.reference(symbol);
        self.unlinked.insert(self.ops.len(), (col, symbol));
        self.push(Opcode::Jump(UNDEFINED))
    }

    pub fn push_ifnot(&mut self, col: Column, symbol: Symbol) -> Result<()> {
        self.reference(symbol);
        self.unlinked.insert(self.ops.len(), (col, symbol));
        self.push(Opcode::IfNot(UNDEFINED))
    }

    pub fn push_gosub(&mut self, col: Column, symbol: Symbol) -> Result<()> {
        self.reference(symbol);
        self.unlinked.insert(self.ops.len(), (col, symbol));
        self.push(Opcode::Gosub(UNDEFINED))
    }

    pub fn push_run(&mut self, col: Column, symbol: Symbol) -> Result<()> {
        self.reference(symbol);
        self.unlinked.insert(self.ops.len(), (col, symbol));
        self.push(Opcode::Run(UNDEFINED))
    }

    pub fn disable_validation(&mut self) {
        self.validation_disabled = true;
    }

    pub fn validation_disabled(&self) -> bool {
        self.validation_disabled
    }

    pub fn address_of(&self, symbol: Symbol) -> Option<Address> {
        self.symbols.get(&symbol).copied()
    }

    pub fn line_number_for(&self, op_addr: Address) -> LineNumber {
        for (line_number, symbol_addr) in self.symbols.range(0..).rev() {
            if op_addr >= *symbol_addr {
                return Some(*line_number as u16);
            }
        }
        None
    }

    /// Resolve every recorded reference. Unknown targets are errors
    /// unless validation is disabled, in which case they become
    /// branches to the runtime's undefined-line trap.
    pub fn link(&mut self) -> Vec<Error> {
        let mut errors: Vec<Error> = vec![];
        for (op_addr, (col, symbol)) in std::mem::take(&mut self.unlinked) {
            let dest = match self.symbols.get(&symbol) {
                Some(dest) => *dest,
                None => {
                    if symbol >= 0 && !self.validation_disabled {
                        errors.push(error!(
                            UndefinedLine,
                            self.line_number_for(op_addr),
                            ..&col
                        ));
                        continue;
                    }
                    if symbol < 0 {
                        errors.push(error!(
                            InternalError,
                            self.line_number_for(op_addr),
                            ..&col;
                            "link failure"
                        ));
                        continue;
                    }
                    UNDEFINED
                }
            };
            match self.ops.get_mut(op_addr) {
                Some(op) => {
                    let patched = match op {
                        Opcode::Jump(_) => Some(Opcode::Jump(dest)),
                        Opcode::IfNot(_) => Some(Opcode::IfNot(dest)),
                        Opcode::Gosub(_) => Some(Opcode::Gosub(dest)),
                        Opcode::Run(_) => Some(Opcode::Run(dest)),
                        _ => None,
                    };
                    match patched {
                        Some(new_op) => *op = new_op,
                        None => errors.push(
                            error!(InternalError, self.line_number_for(op_addr), ..&col; "link failure"),
                        ),
                    }
                }
                None => errors.push(
                    error!(InternalError, self.line_number_for(op_addr), ..&col; "link failure"),
                ),
            }
        }
        if !self.validation_disabled {
            for (addr, col, symbol) in std::mem::take(&mut self.checks) {
                if !self.symbols.contains_key(&symbol) {
                    errors.push(error!(UndefinedLine, self.line_number_for(addr), ..&col));
                }
            }
        } else {
            self.checks.clear();
        }
        errors
    }

    /// Dead-label pruning: drop line symbols nothing jumps to,
    /// restores to, or runs from. Disabled along with validation
    /// when a CHAIN might bring unknown lines in later.
    pub fn prune(&mut self) {
        if self.validation_disabled {
            return;
        }
        let refs = &self.refs;
        self.symbols
            .retain(|symbol, _| *symbol < 0 || refs.get(symbol).copied().unwrap_or(0) > 0);
    }

    /// Roll back everything at or past the watermark; used to unwind
    /// a compiled direct statement.
    pub fn truncate(&mut self, watermark: Address) {
        self.ops.truncate(watermark);
        self.symbols.retain(|_, addr| *addr < watermark);
        self.unlinked.retain(|addr, _| *addr < watermark);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_reference_patched() {
        let mut link = Link::new();
        link.push_jump(0..4, 100).unwrap();
        link.push(Opcode::End).unwrap();
        link.push_symbol(100);
        link.push(Opcode::End).unwrap();
        assert!(link.link().is_empty());
        assert_eq!(link.get(0), Some(&Opcode::Jump(2)));
    }

    #[test]
    fn test_undefined_target_is_error() {
        let mut link = Link::new();
        link.push_jump(0..4, 100).unwrap();
        let errors = link.link();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_chain_disables_validation() {
        let mut link = Link::new();
        link.disable_validation();
        link.push_jump(0..4, 100).unwrap();
        assert!(link.link().is_empty());
        assert_eq!(link.get(0), Some(&Opcode::Jump(UNDEFINED)));
    }

    #[test]
    fn test_prune_keeps_referenced_lines() {
        let mut link = Link::new();
        link.push_symbol(10);
        link.push_jump(0..4, 20).unwrap();
        link.push_symbol(20);
        link.push(Opcode::End).unwrap();
        assert!(link.link().is_empty());
        link.prune();
        assert_eq!(link.address_of(10), None);
        assert!(link.address_of(20).is_some());
    }
}
