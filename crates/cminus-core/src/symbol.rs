//! Symbol model (component D): identifiers, the scope tree, and the
//! symbol table façade used by both the parser and the IR builder.
//!
//! The scope tree is realized as a flat arena (`Vec<ScopeNode>`) indexed by
//! [`ScopeId`] rather than as owned child pointers with raw parent
//! back-references, per the reference's own design note on parent links.

use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Process-unique handle standing in for a raw `Identifier*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentId(pub u32);

impl fmt::Display for IdentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a scope node within a [`SymbolTable`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub u32);

/// The two reserved sentinel names that absorb name-resolution errors.
pub const DUMMY_VARIABLE: &str = "@@variable";
pub const DUMMY_FUNCTION: &str = "@@function";

/// A declared name: its type, optional array element count, optional
/// back-reference to the function it names (when `ty == Type::Function`),
/// and an IR-backing handle filled in during emission.
#[derive(Debug, Clone)]
pub struct Identifier {
    pub id: IdentId,
    pub name: String,
    pub ty: Type,
    /// Array element count in `[1, 65536]`, or `-1` for a function
    /// parameter whose array-ness is known but whose size is not fixed.
    pub element_count: Option<i64>,
    /// `FunctionId` of the function this identifier names, when `ty ==
    /// Type::Function`. Stored as a raw `u32` here to avoid a dependency
    /// cycle with `cminus-ast`; `cminus-ast` wraps it back into its own
    /// `FunctionId` newtype.
    pub function_ref: Option<u32>,
    /// IR-side handle (e.g. an LLVM value name) filled in during codegen.
    pub ir_handle: Option<String>,
}

impl Identifier {
    pub fn is_dummy(&self) -> bool {
        self.name == DUMMY_VARIABLE || self.name == DUMMY_FUNCTION
    }
}

struct ScopeNode {
    parent: Option<ScopeId>,
    names: HashMap<String, IdentId>,
    children: Vec<ScopeId>,
}

/// Owns the scope arena, the identifier arena, and a cursor to the
/// currently active scope (the façade described in §4.D).
pub struct SymbolTable {
    scopes: Vec<ScopeNode>,
    idents: Vec<Identifier>,
    cursor: ScopeId,
    global: ScopeId,
    next_ident_id: u32,
}

impl SymbolTable {
    /// Builds a fresh table with the global scope pre-populated with
    /// `@@function`, `@@variable`, and `printf`, per §4.D.
    pub fn new() -> Self {
        let mut table = SymbolTable {
            scopes: vec![ScopeNode {
                parent: None,
                names: HashMap::new(),
                children: Vec::new(),
            }],
            idents: Vec::new(),
            cursor: ScopeId(0),
            global: ScopeId(0),
            next_ident_id: 0,
        };
        table
            .create_identifier_unchecked(DUMMY_FUNCTION, Type::Function, None)
            .expect("global scope is empty at construction");
        table
            .create_identifier_unchecked(DUMMY_VARIABLE, Type::Int, None)
            .expect("global scope is empty at construction");
        table
            .create_identifier_unchecked("printf", Type::Function, None)
            .expect("global scope is empty at construction");
        table
    }

    pub fn global_scope(&self) -> ScopeId {
        self.global
    }

    pub fn current_scope(&self) -> ScopeId {
        self.cursor
    }

    /// Pushes a fresh child of the current scope and moves the cursor into
    /// it, returning the new scope's id.
    pub fn enter_scope(&mut self) -> ScopeId {
        let parent = self.cursor;
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeNode {
            parent: Some(parent),
            names: HashMap::new(),
            children: Vec::new(),
        });
        self.scopes[parent.0 as usize].children.push(id);
        self.cursor = id;
        id
    }

    /// Moves the cursor to the parent of the current scope. The child scope
    /// remains alive (still owned by its parent) so later passes can
    /// revisit it. Panics if called on the global scope, matching the
    /// reference's "must not underflow" invariant.
    pub fn exit_scope(&mut self) {
        let parent = self.scopes[self.cursor.0 as usize]
            .parent
            .expect("exitScope must not underflow the global scope");
        self.cursor = parent;
    }

    /// Runs `f` with the cursor moved to `scope`, restoring the previous
    /// cursor afterward regardless of how `f` returns. Used by the IR
    /// builder to revisit a function's scope after parsing has moved on.
    pub fn with_scope<T>(&mut self, scope: ScopeId, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.cursor;
        self.cursor = scope;
        let result = f(self);
        self.cursor = saved;
        result
    }

    fn create_identifier_unchecked(
        &mut self,
        name: &str,
        ty: Type,
        element_count: Option<i64>,
    ) -> Result<IdentId, ()> {
        let id = IdentId(self.next_ident_id);
        self.next_ident_id += 1;
        self.idents.push(Identifier {
            id,
            name: name.to_string(),
            ty,
            element_count,
            function_ref: None,
            ir_handle: None,
        });
        self.scopes[self.cursor.0 as usize]
            .names
            .insert(name.to_string(), id);
        Ok(id)
    }

    /// `createIdentifier(name)`: fails (returning `None`) if `name` is
    /// already bound in the *current* scope, in which case the caller is
    /// responsible for diagnosing the redeclaration and substituting a
    /// dummy identifier.
    pub fn create_identifier(
        &mut self,
        name: &str,
        ty: Type,
        element_count: Option<i64>,
    ) -> Option<IdentId> {
        if self.is_declared_in_scope(name) {
            return None;
        }
        self.create_identifier_unchecked(name, ty, element_count).ok()
    }

    /// `getIdentifier(name)`: searches the current scope then walks
    /// parents; `None` if not found anywhere on the chain.
    pub fn get_identifier(&self, name: &str) -> Option<IdentId> {
        let mut scope = Some(self.cursor);
        while let Some(s) = scope {
            let node = &self.scopes[s.0 as usize];
            if let Some(&id) = node.names.get(name) {
                return Some(id);
            }
            scope = node.parent;
        }
        None
    }

    /// `isDeclaredInScope(name)`: current scope only, no parent walk.
    pub fn is_declared_in_scope(&self, name: &str) -> bool {
        self.scopes[self.cursor.0 as usize].names.contains_key(name)
    }

    pub fn ident(&self, id: IdentId) -> &Identifier {
        &self.idents[id.0 as usize]
    }

    pub fn ident_mut(&mut self, id: IdentId) -> &mut Identifier {
        &mut self.idents[id.0 as usize]
    }

    pub fn dummy_variable(&self) -> IdentId {
        self.get_in_scope(self.global, DUMMY_VARIABLE)
    }

    pub fn dummy_function(&self) -> IdentId {
        self.get_in_scope(self.global, DUMMY_FUNCTION)
    }

    fn get_in_scope(&self, scope: ScopeId, name: &str) -> IdentId {
        self.scopes[scope.0 as usize].names[name]
    }

    /// Children of `scope`, in creation order -- used when the codegen
    /// pass needs to revisit a function's nested block scopes.
    pub fn children(&self, scope: ScopeId) -> &[ScopeId] {
        &self.scopes[scope.0 as usize].children
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepopulated_with_sentinels_and_printf() {
        let table = SymbolTable::new();
        assert!(table.is_declared_in_scope(DUMMY_VARIABLE));
        assert!(table.is_declared_in_scope(DUMMY_FUNCTION));
        assert!(table.is_declared_in_scope("printf"));
        assert_eq!(table.ident(table.get_identifier("printf").unwrap()).ty, Type::Function);
    }

    #[test]
    fn redeclaration_in_same_scope_fails() {
        let mut table = SymbolTable::new();
        assert!(table.create_identifier("x", Type::Int, None).is_some());
        assert!(table.create_identifier("x", Type::Int, None).is_none());
    }

    #[test]
    fn lookup_walks_parent_chain() {
        let mut table = SymbolTable::new();
        table.create_identifier("outer", Type::Int, None).unwrap();
        table.enter_scope();
        assert!(table.get_identifier("outer").is_some());
        assert!(table.is_declared_in_scope("outer") == false);
    }

    #[test]
    fn shadowing_across_scopes_is_allowed() {
        let mut table = SymbolTable::new();
        let outer = table.create_identifier("x", Type::Int, None).unwrap();
        table.enter_scope();
        let inner = table.create_identifier("x", Type::Char, None).unwrap();
        assert_ne!(outer, inner);
        assert_eq!(table.ident(table.get_identifier("x").unwrap()).ty, Type::Char);
        table.exit_scope();
        assert_eq!(table.ident(table.get_identifier("x").unwrap()).ty, Type::Int);
    }

    #[test]
    #[should_panic]
    fn exit_scope_underflow_panics() {
        let mut table = SymbolTable::new();
        table.exit_scope();
    }

    #[test]
    fn exited_child_scope_remains_revisitable() {
        let mut table = SymbolTable::new();
        let child = table.enter_scope();
        table.create_identifier("local", Type::Int, None).unwrap();
        table.exit_scope();
        table.with_scope(child, |t| {
            assert!(t.is_declared_in_scope("local"));
        });
    }
}
