//! Symbol tables
//!
//! Each function owns a [`SymbolTable`] mapping its variables, arrays and
//! parameters to byte offsets in its stack frame. Names are hashed with DJB2
//! into a prime number of buckets; each bucket chains indices into the
//! declaration-ordered symbol vector. The [`FunctionTable`] is the global
//! scope holding one [`FunctionSymbol`] per definition.

use crate::error::CompilerError;
use crate::source_loc::SourceLocation;
use crate::types::ValueType;
use log::trace;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt::Write;

/// Bytes per scalar slot and per array element
pub const WORD_SIZE: u32 = 4;

/// Largest frame a function may reserve; keeps every offset, element
/// address and stack adjustment within `i32`
pub const MAX_FRAME_BYTES: u32 = 1 << 30;

const BUCKET_COUNT: usize = 211;

fn djb2(name: &str) -> usize {
    let mut hash: u32 = 5381;
    for byte in name.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(byte as u32);
    }
    hash as usize % BUCKET_COUNT
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: ValueType,
    pub is_array: bool,
    /// Element count; 0 for scalars and array parameters
    pub array_len: u32,
    /// Byte offset from the frame base
    pub offset: u32,
    /// Slot holds the address of a caller's array
    pub by_reference: bool,
}

impl Symbol {
    /// Bytes reserved in the frame for this symbol
    pub fn size_bytes(&self) -> u32 {
        if self.is_array && !self.by_reference {
            self.array_len.saturating_mul(WORD_SIZE)
        } else {
            WORD_SIZE
        }
    }
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    buckets: Vec<Vec<usize>>,
    next_offset: u32,
    collisions: usize,
    lookups: Cell<usize>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            symbols: Vec::new(),
            buckets: vec![Vec::new(); BUCKET_COUNT],
            next_offset: 0,
            collisions: 0,
            lookups: Cell::new(0),
        }
    }

    fn insert(&mut self, symbol: Symbol, location: SourceLocation) -> Result<u32, CompilerError> {
        if self.find(&symbol.name).is_some() {
            return Err(CompilerError::declaration(symbol.name, location));
        }
        let size = symbol.size_bytes();
        if size > MAX_FRAME_BYTES - self.next_offset {
            return Err(CompilerError::unsupported(
                format!(
                    "'{}' needs {} bytes but the frame already holds {} of at most {}",
                    symbol.name,
                    u64::from(symbol.array_len.max(1)) * u64::from(WORD_SIZE),
                    self.next_offset,
                    MAX_FRAME_BYTES
                ),
                location,
            ));
        }

        let bucket = djb2(&symbol.name);
        if !self.buckets[bucket].is_empty() {
            self.collisions += 1;
        }

        let offset = symbol.offset;
        self.next_offset += size;
        trace!(
            "declared '{}' ({}) at offset {} in bucket {}",
            symbol.name, symbol.ty, offset, bucket
        );
        self.buckets[bucket].push(self.symbols.len());
        self.symbols.push(symbol);
        Ok(offset)
    }

    /// Declare a scalar. Returns its frame offset.
    pub fn declare(
        &mut self,
        name: &str,
        ty: ValueType,
        location: SourceLocation,
    ) -> Result<u32, CompilerError> {
        let symbol = Symbol {
            name: name.to_string(),
            ty,
            is_array: false,
            array_len: 0,
            offset: self.next_offset,
            by_reference: false,
        };
        self.insert(symbol, location)
    }

    /// Declare an array of `size` elements. Returns the offset of element 0.
    pub fn declare_array(
        &mut self,
        name: &str,
        ty: ValueType,
        size: u32,
        location: SourceLocation,
    ) -> Result<u32, CompilerError> {
        if size == 0 {
            return Err(CompilerError::type_error(
                format!("array '{}' must have at least one element", name),
                location,
            ));
        }
        let symbol = Symbol {
            name: name.to_string(),
            ty,
            is_array: true,
            array_len: size,
            offset: self.next_offset,
            by_reference: false,
        };
        self.insert(symbol, location)
    }

    /// Declare a parameter. Array parameters occupy one word holding the
    /// base address of the argument array.
    pub fn declare_param(
        &mut self,
        name: &str,
        ty: ValueType,
        is_array: bool,
        location: SourceLocation,
    ) -> Result<u32, CompilerError> {
        let symbol = Symbol {
            name: name.to_string(),
            ty,
            is_array,
            array_len: 0,
            offset: self.next_offset,
            by_reference: is_array,
        };
        self.insert(symbol, location)
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.lookups.set(self.lookups.get() + 1);
        self.find(name)
    }

    fn find(&self, name: &str) -> Option<&Symbol> {
        self.buckets[djb2(name)]
            .iter()
            .map(|&idx| &self.symbols[idx])
            .find(|sym| sym.name == name)
    }

    pub fn lookup_offset(&self, name: &str, location: &SourceLocation) -> Result<u32, CompilerError> {
        self.lookup(name)
            .map(|sym| sym.offset)
            .ok_or_else(|| CompilerError::reference(name, location.clone()))
    }

    pub fn lookup_type(&self, name: &str) -> Option<ValueType> {
        self.lookup(name).map(|sym| sym.ty)
    }

    pub fn is_array(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|sym| sym.is_array)
    }

    /// Running offset counter: the frame size needed for every symbol so far
    pub fn frame_size(&self) -> u32 {
        self.next_offset
    }

    /// Symbols in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Insertions that landed in an already occupied bucket
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Calls to [`SymbolTable::lookup`] and the queries built on it
    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }

    /// Symbols per bucket
    pub fn load_factor(&self) -> f64 {
        self.symbols.len() as f64 / BUCKET_COUNT as f64
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:<16} {:<6} {:<6} {:>6} {:>6}", "name", "kind", "type", "offset", "size");
        for sym in &self.symbols {
            let kind = match (sym.is_array, sym.by_reference) {
                (true, true) => "array&",
                (true, false) => "array",
                _ => "scalar",
            };
            let _ = writeln!(
                out,
                "{:<16} {:<6} {:<6} {:>6} {:>6}",
                sym.name,
                kind,
                sym.ty.to_string(),
                sym.offset,
                sym.size_bytes()
            );
        }
        let used = self.buckets.iter().filter(|b| !b.is_empty()).count();
        let _ = writeln!(
            out,
            "frame {} bytes, {} symbols, {}/{} buckets used, {} collisions, {} lookups, load factor {:.3}",
            self.next_offset,
            self.symbols.len(),
            used,
            BUCKET_COUNT,
            self.collisions,
            self.lookups(),
            self.load_factor()
        );
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub name: String,
    pub ty: ValueType,
    pub is_array: bool,
}

#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    pub name: String,
    pub return_type: ValueType,
    pub params: Vec<ParamInfo>,
    pub symtab: SymbolTable,
    /// Index of the definition in `Program::functions`
    pub body: usize,
    pub location: SourceLocation,
}

impl FunctionSymbol {
    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

/// Global scope: every function definition of the compilation unit
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: Vec<FunctionSymbol>,
    index: HashMap<String, usize>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_function(
        &mut self,
        name: &str,
        return_type: ValueType,
        params: Vec<ParamInfo>,
        body: usize,
        location: SourceLocation,
    ) -> Result<&mut FunctionSymbol, CompilerError> {
        if self.index.contains_key(name) {
            return Err(CompilerError::declaration(name, location));
        }
        let idx = self.functions.len();
        self.index.insert(name.to_string(), idx);
        self.functions.push(FunctionSymbol {
            name: name.to_string(),
            return_type,
            params,
            symtab: SymbolTable::new(),
            body,
            location,
        });
        Ok(&mut self.functions[idx])
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSymbol> {
        self.index.get(name).map(|&idx| &self.functions[idx])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FunctionSymbol> {
        match self.index.get(name) {
            Some(&idx) => Some(&mut self.functions[idx]),
            None => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionSymbol> {
        self.functions.iter()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn clear(&mut self) {
        self.functions.clear();
        self.index.clear();
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        for func in &self.functions {
            let params: Vec<String> = func
                .params
                .iter()
                .map(|p| format!("{} {}{}", p.ty, p.name, if p.is_array { "[]" } else { "" }))
                .collect();
            let _ = writeln!(out, "function {} {}({})", func.return_type, func.name, params.join(", "));
            out.push_str(&func.symtab.dump());
        }
        out
    }
}

#[cfg(test)]
#[path = "symtab_tests.rs"]
mod tests;
