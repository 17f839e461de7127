//! On-the-fly SSA construction (component H), after Braun et al.,
//! "Simple and Efficient Construction of SSA Form". State lives on this
//! struct, one instance per function, constructed when codegen enters the
//! function and dropped when it exits -- never global (§9).
//!
//! Scalars (locals and parameters) are tracked here by [`IdentId`]; arrays
//! bypass this entirely (they are `alloca`'d aggregates, addressed rather
//! than versioned).

use std::collections::{HashMap, HashSet};

use cminus_core::IdentId;
use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::types::BasicTypeEnum;
use inkwell::values::{BasicValueEnum, PhiValue};

pub struct SsaBuilder<'ctx> {
    defs: HashMap<BasicBlock<'ctx>, HashMap<IdentId, BasicValueEnum<'ctx>>>,
    incomplete_phis: HashMap<BasicBlock<'ctx>, HashMap<IdentId, PhiValue<'ctx>>>,
    sealed: HashSet<BasicBlock<'ctx>>,
    /// Predecessor lists, maintained by the emitter via
    /// [`SsaBuilder::add_predecessor`] whenever it terminates a block with
    /// a branch -- inkwell does not expose CFG predecessors directly, and
    /// the reference builder tracks this itself too.
    preds: HashMap<BasicBlock<'ctx>, Vec<BasicBlock<'ctx>>>,
    var_types: HashMap<IdentId, BasicTypeEnum<'ctx>>,
    /// Users of each phi, so `tryRemoveTrivialPhi` can recurse into phis
    /// that consumed a just-eliminated trivial phi as an operand.
    phi_users: HashMap<PhiValue<'ctx>, Vec<PhiValue<'ctx>>>,
}

impl<'ctx> SsaBuilder<'ctx> {
    pub fn new() -> Self {
        SsaBuilder {
            defs: HashMap::new(),
            incomplete_phis: HashMap::new(),
            sealed: HashSet::new(),
            preds: HashMap::new(),
            var_types: HashMap::new(),
            phi_users: HashMap::new(),
        }
    }

    /// Declares `var`'s LLVM type up front (at its declaration or
    /// parameter-binding site), so a later `readVariableRecursive` knows
    /// what type of empty phi to insert if it needs one before any write
    /// has been observed on some path.
    pub fn declare_variable(&mut self, var: IdentId, ty: BasicTypeEnum<'ctx>) {
        self.var_types.entry(var).or_insert(ty);
    }

    /// `addBlock(b, sealed)`.
    pub fn add_block(&mut self, block: BasicBlock<'ctx>, sealed: bool) {
        self.defs.entry(block).or_default();
        self.incomplete_phis.entry(block).or_default();
        self.preds.entry(block).or_default();
        if sealed {
            self.sealed.insert(block);
        }
    }

    /// Records that `block` may be reached from `pred`. Call this exactly
    /// once per CFG edge, when the branch instruction creating the edge is
    /// emitted.
    pub fn add_predecessor(&mut self, block: BasicBlock<'ctx>, pred: BasicBlock<'ctx>) {
        self.preds.entry(block).or_default().push(pred);
    }

    /// `writeVariable(v, b, val)`.
    pub fn write_variable(&mut self, var: IdentId, block: BasicBlock<'ctx>, value: BasicValueEnum<'ctx>) {
        self.defs.entry(block).or_default().insert(var, value);
    }

    /// `readVariable(v, b)`.
    pub fn read_variable(&mut self, var: IdentId, block: BasicBlock<'ctx>, builder: &Builder<'ctx>) -> BasicValueEnum<'ctx> {
        if let Some(value) = self.defs.get(&block).and_then(|m| m.get(&var)) {
            return *value;
        }
        self.read_variable_recursive(var, block, builder)
    }

    fn read_variable_recursive(&mut self, var: IdentId, block: BasicBlock<'ctx>, builder: &Builder<'ctx>) -> BasicValueEnum<'ctx> {
        let value = if !self.sealed.contains(&block) {
            // Block not yet sealed: insert an empty (incomplete) phi now,
            // to be populated once sealed.
            let phi = self.insert_phi(builder, block, var);
            self.incomplete_phis.get_mut(&block).unwrap().insert(var, phi);
            phi.as_basic_value()
        } else {
            let preds = self.preds.get(&block).cloned().unwrap_or_default();
            if preds.len() == 1 {
                self.read_variable(var, preds[0], builder)
            } else {
                // Insert the phi and record it as the local def *before*
                // populating operands, so a cyclic read (a loop back-edge)
                // terminates rather than recursing forever.
                let phi = self.insert_phi(builder, block, var);
                self.write_variable(var, block, phi.as_basic_value());
                for pred in preds {
                    let incoming = self.read_variable(var, pred, builder);
                    phi.add_incoming(&[(&incoming, pred)]);
                    if let BasicValueEnum::IntValue(_) | BasicValueEnum::FloatValue(_) = incoming {
                        // only phi-producing values need user tracking;
                        // plain constants/loads never need revisiting.
                    }
                    if let Ok(incoming_phi) = PhiValue::try_from(incoming) {
                        self.phi_users.entry(incoming_phi).or_default().push(phi);
                    }
                }
                return self.try_remove_trivial_phi(phi, builder);
            }
        };
        self.write_variable(var, block, value);
        value
    }

    /// `sealBlock(b)`: populate every pending incomplete phi's operands
    /// from the now-final predecessor list, then mark `b` sealed.
    pub fn seal_block(&mut self, block: BasicBlock<'ctx>, builder: &Builder<'ctx>) {
        let pending: Vec<(IdentId, PhiValue<'ctx>)> = self
            .incomplete_phis
            .get(&block)
            .map(|m| m.iter().map(|(&v, &p)| (v, p)).collect())
            .unwrap_or_default();

        for (var, phi) in pending {
            let preds = self.preds.get(&block).cloned().unwrap_or_default();
            for pred in preds {
                let incoming = self.read_variable(var, pred, builder);
                phi.add_incoming(&[(&incoming, pred)]);
                if let Ok(incoming_phi) = PhiValue::try_from(incoming) {
                    self.phi_users.entry(incoming_phi).or_default().push(phi);
                }
            }
            self.try_remove_trivial_phi(phi, builder);
        }
        self.incomplete_phis.get_mut(&block).map(|m| m.clear());
        self.sealed.insert(block);
    }

    fn insert_phi(&self, builder: &Builder<'ctx>, block: BasicBlock<'ctx>, var: IdentId) -> PhiValue<'ctx> {
        let ty = *self
            .var_types
            .get(&var)
            .expect("variable read before its type was declared");
        let saved = builder.get_insert_block();
        match block.get_first_instruction() {
            Some(first) => builder.position_before(&first),
            None => builder.position_at_end(block),
        }
        let phi = builder
            .build_phi(ty, "ssa.phi")
            .expect("build_phi should not fail for a valid basic type");
        if let Some(saved_block) = saved {
            builder.position_at_end(saved_block);
        }
        phi
    }

    /// `tryRemoveTrivialPhi`: if every operand of `phi` is either `phi`
    /// itself or a single other value `s`, every use of `phi` is replaced
    /// by `s`. Returns the value callers should use in place of `phi`
    /// (either `s`, or `phi` itself if it was not trivial).
    fn try_remove_trivial_phi(&mut self, phi: PhiValue<'ctx>, builder: &Builder<'ctx>) -> BasicValueEnum<'ctx> {
        let mut same: Option<BasicValueEnum<'ctx>> = None;
        for (value, _) in phi.get_incomings() {
            let is_self = PhiValue::try_from(value).map(|p| p == phi).unwrap_or(false);
            if is_self {
                continue;
            }
            if let Some(existing) = same {
                if existing != value {
                    // Non-trivial: at least two distinct non-self operands.
                    return phi.as_basic_value();
                }
            } else {
                same = Some(value);
            }
        }
        let Some(replacement) = same else {
            // A phi with no non-self operands is unreachable-code debris;
            // leave it as-is rather than invent an undef value.
            return phi.as_basic_value();
        };

        phi.as_basic_value().replace_all_uses_with(replacement);
        for defs in self.defs.values_mut() {
            for value in defs.values_mut() {
                if PhiValue::try_from(*value).map(|p| p == phi).unwrap_or(false) {
                    *value = replacement;
                }
            }
        }

        let users = self.phi_users.remove(&phi).unwrap_or_default();
        phi.as_instruction().erase_from_basic_block();

        for user in users {
            if user != phi {
                self.try_remove_trivial_phi(user, builder);
            }
        }

        replacement
    }
}

impl<'ctx> Default for SsaBuilder<'ctx> {
    fn default() -> Self {
        Self::new()
    }
}
