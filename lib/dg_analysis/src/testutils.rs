//! Synthetic images for unit tests.

use dg_code::{Addr, Code, FieldRef, InstrKind, Instruction, MethodDef, MethodRef, TryItem};

pub(crate) fn nop() -> Instruction {
    Instruction::new(Addr(0), 2, InstrKind::Other)
}

pub(crate) fn ret() -> Instruction {
    Instruction::new(Addr(0), 2, InstrKind::Return)
}

pub(crate) fn branch(kind: InstrKind) -> Instruction {
    Instruction::new(Addr(0), 2, kind)
}

pub(crate) fn invoke(class: &str, name: &str, descriptor: &str) -> Instruction {
    Instruction::new(
        Addr(0),
        6,
        InstrKind::Invoke(MethodRef::new(class, name, descriptor)),
    )
}

pub(crate) fn new_instance(class: &str) -> Instruction {
    Instruction::new(Addr(0), 4, InstrKind::NewInstance(class.to_string()))
}

pub(crate) fn const_class(class: &str) -> Instruction {
    Instruction::new(Addr(0), 4, InstrKind::ConstClass(class.to_string()))
}

pub(crate) fn const_string(value: &str) -> Instruction {
    Instruction::new(Addr(0), 4, InstrKind::ConstString(value.to_string()))
}

pub(crate) fn field_get(class: &str, name: &str, type_: &str) -> Instruction {
    Instruction::new(
        Addr(0),
        4,
        InstrKind::FieldGet(FieldRef::new(class, name, type_)),
    )
}

pub(crate) fn field_put(class: &str, name: &str, type_: &str) -> Instruction {
    Instruction::new(
        Addr(0),
        4,
        InstrKind::FieldPut(FieldRef::new(class, name, type_)),
    )
}

/// Lays instructions out contiguously from offset 0, whatever their
/// current addresses.
pub(crate) fn code(instrs: Vec<Instruction>, tries: Vec<TryItem>) -> Code {
    let mut addr = Addr::entry();
    let instrs = instrs
        .into_iter()
        .map(|instr| {
            let laid = Instruction::new(addr, instr.length(), instr.kind().clone());
            addr = laid.next_addr();
            laid
        })
        .collect();
    Code::new(instrs, tries).unwrap()
}

/// A `()V` method with the given body.
pub(crate) fn method_with_code(
    name: &str,
    instrs: Vec<Instruction>,
    tries: Vec<TryItem>,
) -> MethodDef {
    MethodDef::new(name, "()V", Some(code(instrs, tries)))
}

/// A `()V` method whose body calls each target in turn, then returns.
pub(crate) fn method_calling(name: &str, targets: &[(&str, &str, &str)]) -> MethodDef {
    let mut instrs: Vec<Instruction> = targets
        .iter()
        .map(|(class, name, descriptor)| invoke(class, name, descriptor))
        .collect();
    instrs.push(ret());
    method_with_code(name, instrs, vec![])
}

/// A trivial `()V` method.
pub(crate) fn method_returning(name: &str) -> MethodDef {
    method_with_code(name, vec![ret()], vec![])
}

/// A method with the given descriptor and body.
pub(crate) fn method_with_body(
    name: &str,
    descriptor: &str,
    instrs: Vec<Instruction>,
) -> MethodDef {
    MethodDef::new(name, descriptor, Some(code(instrs, vec![])))
}

/// A trivial method with the given descriptor.
pub(crate) fn method_with_descriptor(name: &str, descriptor: &str) -> MethodDef {
    method_with_body(name, descriptor, vec![ret()])
}
