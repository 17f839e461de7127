//! Mapping from the closed [`Type`] lattice to LLVM IR types (the
//! concrete instantiation of §6's IR contract).

use cminus_core::Type;
use inkwell::context::Context;
use inkwell::types::{ArrayType, BasicTypeEnum};
use inkwell::AddressSpace;

/// LLVM type for a scalar (non-array, non-function, non-void) source type.
pub fn scalar_llvm_type<'ctx>(context: &'ctx Context, ty: Type) -> BasicTypeEnum<'ctx> {
    match ty {
        Type::Int => context.i32_type().into(),
        Type::Char => context.i8_type().into(),
        Type::Double => context.f64_type().into(),
        other => unreachable!("scalar_llvm_type called on non-scalar type {other}"),
    }
}

/// LLVM type of one element of an array-typed source type.
pub fn array_element_llvm_type<'ctx>(context: &'ctx Context, array_ty: Type) -> BasicTypeEnum<'ctx> {
    let elem = array_ty
        .array_element()
        .unwrap_or_else(|| unreachable!("array_element_llvm_type called on non-array type {array_ty}"));
    scalar_llvm_type(context, elem)
}

/// LLVM type of a fixed-size local array (the `alloca`'d aggregate).
pub fn local_array_llvm_type<'ctx>(context: &'ctx Context, array_ty: Type, count: u32) -> ArrayType<'ctx> {
    array_element_llvm_type(context, array_ty).array_type(count)
}

/// LLVM type of a function parameter: arrays decay to a pointer to their
/// element type (as in C), scalars pass by value.
pub fn param_llvm_type<'ctx>(context: &'ctx Context, ty: Type) -> BasicTypeEnum<'ctx> {
    if ty.is_array() {
        array_element_llvm_type(context, ty)
            .ptr_type(AddressSpace::default())
            .into()
    } else {
        scalar_llvm_type(context, ty)
    }
}
