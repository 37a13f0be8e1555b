use std::collections::HashMap;

use quad::ValueType;

use crate::error::ErrorKind;

/// A declared variable. `assigned` flips to true on the first assignment
/// or input read targeting the symbol and never reverts.
#[derive(Clone, PartialEq, Debug)]
pub struct Symbol {
    pub name: String,
    pub ty: ValueType,
    pub assigned: bool,
}

impl Symbol {
    pub fn new(name: &str, ty: ValueType) -> Symbol {
        Symbol {
            name: name.to_owned(),
            ty,
            assigned: false,
        }
    }
}

/// Lexically scoped name table: a stack of scope frames searched from the
/// innermost outward. The bottom frame holds the global declarations.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<HashMap<String, Symbol>>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable {
            scopes: vec![HashMap::new()],
        }
    }

    /// Enters a statement block.
    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Leaves a statement block, dropping its symbols.
    pub fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1);
        self.scopes.pop();
    }

    /// Inserts into the innermost scope; the name must not already be
    /// declared there.
    pub fn insert(&mut self, symbol: Symbol) -> Result<(), ErrorKind> {
        let scope = self.scopes.last_mut().unwrap();
        if scope.contains_key(&symbol.name) {
            return Err(ErrorKind::AlreadyDeclared(symbol.name));
        }
        scope.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Innermost-to-outermost search.
    pub fn lookup(&self, name: &str) -> Result<&Symbol, ErrorKind> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .ok_or_else(|| ErrorKind::NotFound(name.to_owned()))
    }

    /// Idempotent; a no-op if the name is not in scope.
    pub fn mark_assigned(&mut self, name: &str) {
        if let Some(symbol) = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
        {
            symbol.assigned = true;
        }
    }
}

impl Default for SymbolTable {
    fn default() -> SymbolTable {
        SymbolTable::new()
    }
}
