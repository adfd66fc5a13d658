//! Method body assembly.
//!
//! [`CodeBuilder`] records a symbolic, append-only instruction list. Jumps
//! target [`Label`]s that may be bound later; [`CodeBuilder::assemble`]
//! lays the list out, patches branch offsets and derives `max_stack` by
//! simulating stack depth over the control-flow graph.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::bytes::PutBytes;
use crate::descriptor;
use crate::error::{ClassFileError, Result};
use crate::opcode::{ArrayType, Opcode};
use crate::pool::ConstantPool;

/// A branch target, declared before its position is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(u32);

impl Label {
    pub fn id(self) -> u32 {
        self.0
    }
}

/// Loadable constant for `ldc`/`ldc_w`/`ldc2_w`.
#[derive(Debug, Clone, PartialEq)]
pub enum LdcValue {
    Int(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),
    Class(String),
}

impl LdcValue {
    fn is_wide(&self) -> bool {
        matches!(self, LdcValue::Long(_) | LdcValue::Double(_))
    }
}

/// A field or method reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Insn {
    Simple(Opcode),
    Bipush(i8),
    Sipush(i16),
    Local(Opcode, u16),
    Iinc(u16, i16),
    Ldc(LdcValue),
    Jump(Opcode, Label),
    Type(Opcode, String),
    NewArray(ArrayType),
    Field(Opcode, MemberRef),
    Invoke(Opcode, MemberRef, bool),
    MultiANewArray(String, u8),
    Label(Label),
    Line(u16),
}

#[derive(Debug, Clone)]
struct Handler {
    start: Label,
    end: Label,
    handler: Label,
    catch_type: Option<String>,
}

/// One row of the `Code` attribute's exception table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

/// Output of [`CodeBuilder::assemble`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledCode {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionEntry>,
    /// `(start_pc, line)` pairs.
    pub line_numbers: Vec<(u16, u16)>,
}

/// Symbolic instruction stream for one method body.
#[derive(Debug, Clone)]
pub struct CodeBuilder {
    insns: Vec<Insn>,
    next_label: u32,
    bound: FxHashSet<Label>,
    handlers: Vec<Handler>,
    max_locals: u16,
}

impl CodeBuilder {
    /// Create a builder whose first `arg_slots` locals hold the receiver and
    /// parameters.
    pub fn new(arg_slots: u16) -> Self {
        Self {
            insns: Vec::new(),
            next_label: 0,
            bound: FxHashSet::default(),
            handlers: Vec::new(),
            max_locals: arg_slots,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.insns.is_empty()
    }

    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Bind `label` to the current position.
    pub fn bind(&mut self, label: Label) -> Result<()> {
        if !self.bound.insert(label) {
            return Err(ClassFileError::LabelRebound(label.0));
        }
        self.insns.push(Insn::Label(label));
        Ok(())
    }

    /// Whether control can reach the current end of the stream by falling
    /// through the last instruction.
    pub fn falls_through(&self) -> bool {
        for insn in self.insns.iter().rev() {
            match insn {
                Insn::Line(_) => continue,
                Insn::Label(_) => return true,
                Insn::Simple(op) | Insn::Jump(op, _) => return !op.ends_block(),
                _ => return true,
            }
        }
        true
    }

    pub fn emit(&mut self, op: Opcode) {
        self.insns.push(Insn::Simple(op));
    }

    pub fn push_int(&mut self, value: i32) {
        match value {
            -1 => self.emit(Opcode::IconstM1),
            0 => self.emit(Opcode::Iconst0),
            1 => self.emit(Opcode::Iconst1),
            2 => self.emit(Opcode::Iconst2),
            3 => self.emit(Opcode::Iconst3),
            4 => self.emit(Opcode::Iconst4),
            5 => self.emit(Opcode::Iconst5),
            v if i8::try_from(v).is_ok() => self.insns.push(Insn::Bipush(v as i8)),
            v if i16::try_from(v).is_ok() => self.insns.push(Insn::Sipush(v as i16)),
            v => self.insns.push(Insn::Ldc(LdcValue::Int(v))),
        }
    }

    pub fn push_long(&mut self, value: i64) {
        match value {
            0 => self.emit(Opcode::Lconst0),
            1 => self.emit(Opcode::Lconst1),
            v => self.insns.push(Insn::Ldc(LdcValue::Long(v))),
        }
    }

    pub fn push_float(&mut self, value: f32) {
        // Compare bits so that -0.0 is not folded into fconst_0.
        match value.to_bits() {
            b if b == 0.0f32.to_bits() => self.emit(Opcode::Fconst0),
            b if b == 1.0f32.to_bits() => self.emit(Opcode::Fconst1),
            b if b == 2.0f32.to_bits() => self.emit(Opcode::Fconst2),
            _ => self.insns.push(Insn::Ldc(LdcValue::Float(value))),
        }
    }

    pub fn push_double(&mut self, value: f64) {
        match value.to_bits() {
            b if b == 0.0f64.to_bits() => self.emit(Opcode::Dconst0),
            b if b == 1.0f64.to_bits() => self.emit(Opcode::Dconst1),
            _ => self.insns.push(Insn::Ldc(LdcValue::Double(value))),
        }
    }

    pub fn push_string(&mut self, value: &str) {
        self.insns.push(Insn::Ldc(LdcValue::String(value.to_string())));
    }

    pub fn push_class(&mut self, internal_name: &str) {
        self.insns.push(Insn::Ldc(LdcValue::Class(internal_name.to_string())));
    }

    pub fn push_null(&mut self) {
        self.emit(Opcode::AconstNull);
    }

    fn touch_local(&mut self, op: Opcode, slot: u16) {
        let width = match op {
            Opcode::Lload | Opcode::Dload | Opcode::Lstore | Opcode::Dstore => 2,
            _ => 1,
        };
        self.max_locals = self.max_locals.max(slot.saturating_add(width));
    }

    /// Emit a `*load` instruction.
    pub fn load(&mut self, op: Opcode, slot: u16) {
        self.touch_local(op, slot);
        self.insns.push(Insn::Local(op, slot));
    }

    /// Emit a `*store` instruction.
    pub fn store(&mut self, op: Opcode, slot: u16) {
        self.touch_local(op, slot);
        self.insns.push(Insn::Local(op, slot));
    }

    pub fn iinc(&mut self, slot: u16, delta: i16) {
        self.touch_local(Opcode::Iinc, slot);
        self.insns.push(Insn::Iinc(slot, delta));
    }

    pub fn jump(&mut self, op: Opcode, target: Label) {
        debug_assert!(op.is_branch());
        self.insns.push(Insn::Jump(op, target));
    }

    /// `new`, `anewarray`, `checkcast` or `instanceof`.
    pub fn type_insn(&mut self, op: Opcode, internal_name: &str) {
        self.insns.push(Insn::Type(op, internal_name.to_string()));
    }

    pub fn newarray(&mut self, ty: ArrayType) {
        self.insns.push(Insn::NewArray(ty));
    }

    pub fn multianewarray(&mut self, descriptor: &str, dimensions: u8) {
        self.insns.push(Insn::MultiANewArray(descriptor.to_string(), dimensions));
    }

    pub fn field(&mut self, op: Opcode, owner: &str, name: &str, descriptor: &str) {
        self.insns.push(Insn::Field(op, member(owner, name, descriptor)));
    }

    pub fn invoke(&mut self, op: Opcode, owner: &str, name: &str, descriptor: &str, interface: bool) {
        self.insns.push(Insn::Invoke(op, member(owner, name, descriptor), interface));
    }

    /// Record that the following instructions come from source line `line`.
    pub fn line(&mut self, line: u16) {
        self.insns.push(Insn::Line(line));
    }

    /// Register an exception handler for `[start, end)`. `catch_type` of
    /// `None` catches everything.
    pub fn try_catch(&mut self, start: Label, end: Label, handler: Label, catch_type: Option<&str>) {
        self.handlers.push(Handler {
            start,
            end,
            handler,
            catch_type: catch_type.map(str::to_string),
        });
    }

    // =========================================================================
    // Assembly
    // =========================================================================

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn assemble(&self, pool: &mut ConstantPool) -> Result<AssembledCode> {
        let operands = self.resolve_operands(pool)?;

        // Layout.
        let mut offsets = Vec::with_capacity(self.insns.len() + 1);
        let mut label_index: FxHashMap<Label, usize> = FxHashMap::default();
        let mut pc: usize = 0;
        for (i, insn) in self.insns.iter().enumerate() {
            offsets.push(pc);
            if let Insn::Label(label) = insn {
                label_index.insert(*label, i);
            }
            pc += insn_size(insn, operands[i]);
        }
        offsets.push(pc);
        if pc > u16::MAX as usize {
            return Err(ClassFileError::CodeTooLarge);
        }
        let label_pc = |label: &Label| -> Result<usize> {
            label_index
                .get(label)
                .map(|&i| offsets[i])
                .ok_or(ClassFileError::UnboundLabel(label.0))
        };

        // Encoding.
        let mut code = Vec::with_capacity(pc);
        let mut line_numbers: Vec<(u16, u16)> = Vec::new();
        for (i, insn) in self.insns.iter().enumerate() {
            let operand = operands[i];
            match insn {
                Insn::Simple(op) => code.put_u8((*op).into()),
                Insn::Bipush(v) => {
                    code.put_u8(Opcode::Bipush.into());
                    code.put_u8(*v as u8);
                }
                Insn::Sipush(v) => {
                    code.put_u8(Opcode::Sipush.into());
                    code.put_u16(*v as u16);
                }
                Insn::Local(op, slot) => {
                    if *slot > u8::MAX as u16 {
                        code.put_u8(Opcode::Wide.into());
                        code.put_u8((*op).into());
                        code.put_u16(*slot);
                    } else {
                        code.put_u8((*op).into());
                        code.put_u8(*slot as u8);
                    }
                }
                Insn::Iinc(slot, delta) => {
                    if *slot > u8::MAX as u16 || i8::try_from(*delta).is_err() {
                        code.put_u8(Opcode::Wide.into());
                        code.put_u8(Opcode::Iinc.into());
                        code.put_u16(*slot);
                        code.put_u16(*delta as u16);
                    } else {
                        code.put_u8(Opcode::Iinc.into());
                        code.put_u8(*slot as u8);
                        code.put_u8(*delta as i8 as u8);
                    }
                }
                Insn::Ldc(value) => {
                    if value.is_wide() {
                        code.put_u8(Opcode::Ldc2W.into());
                        code.put_u16(operand);
                    } else if operand > u8::MAX as u16 {
                        code.put_u8(Opcode::LdcW.into());
                        code.put_u16(operand);
                    } else {
                        code.put_u8(Opcode::Ldc.into());
                        code.put_u8(operand as u8);
                    }
                }
                Insn::Jump(op, target) => {
                    let delta = label_pc(target)? as i64 - offsets[i] as i64;
                    let delta = i16::try_from(delta).map_err(|_| ClassFileError::BranchOutOfRange(delta))?;
                    code.put_u8((*op).into());
                    code.put_u16(delta as u16);
                }
                Insn::Type(op, _) | Insn::Field(op, _) => {
                    code.put_u8((*op).into());
                    code.put_u16(operand);
                }
                Insn::NewArray(ty) => {
                    code.put_u8(Opcode::Newarray.into());
                    code.put_u8((*ty).into());
                }
                Insn::Invoke(op, member, interface) => {
                    code.put_u8((*op).into());
                    code.put_u16(operand);
                    if *op == Opcode::Invokeinterface {
                        debug_assert!(*interface);
                        let count = descriptor::arg_slots(&member.descriptor)? + 1;
                        code.put_u8(count as u8);
                        code.put_u8(0);
                    }
                }
                Insn::MultiANewArray(_, dims) => {
                    code.put_u8(Opcode::Multianewarray.into());
                    code.put_u16(operand);
                    code.put_u8(*dims);
                }
                Insn::Label(_) => {}
                Insn::Line(line) => {
                    let start = offsets[i] as u16;
                    match line_numbers.last_mut() {
                        Some(last) if last.0 == start => last.1 = *line,
                        _ => line_numbers.push((start, *line)),
                    }
                }
            }
        }
        // A trailing line marker has no instruction to describe.
        if line_numbers.last().is_some_and(|&(start, _)| start as usize >= code.len()) {
            line_numbers.pop();
        }

        let mut exception_table = Vec::with_capacity(self.handlers.len());
        for handler in &self.handlers {
            let start_pc = label_pc(&handler.start)? as u16;
            let end_pc = label_pc(&handler.end)? as u16;
            let handler_pc = label_pc(&handler.handler)? as u16;
            if start_pc >= end_pc {
                continue;
            }
            let catch_type = match &handler.catch_type {
                Some(name) => pool.class(name)?,
                None => 0,
            };
            exception_table.push(ExceptionEntry {
                start_pc,
                end_pc,
                handler_pc,
                catch_type,
            });
        }

        let max_stack = self.max_stack(&label_index)?;
        tracing::trace!(bytes = code.len(), max_stack, max_locals = self.max_locals, "assembled method body");

        Ok(AssembledCode {
            max_stack,
            max_locals: self.max_locals,
            code,
            exception_table,
            line_numbers,
        })
    }

    /// Pool index for every instruction that references the pool (0 for
    /// the rest).
    fn resolve_operands(&self, pool: &mut ConstantPool) -> Result<Vec<u16>> {
        self.insns
            .iter()
            .map(|insn| match insn {
                Insn::Ldc(value) => match value {
                    LdcValue::Int(v) => pool.integer(*v),
                    LdcValue::Float(v) => pool.float(*v),
                    LdcValue::Long(v) => pool.long(*v),
                    LdcValue::Double(v) => pool.double(*v),
                    LdcValue::String(s) => pool.string(s),
                    LdcValue::Class(c) => pool.class(c),
                },
                Insn::Type(_, name) => pool.class(name),
                Insn::MultiANewArray(desc, _) => pool.class(desc),
                Insn::Field(_, m) => pool.field_ref(&m.owner, &m.name, &m.descriptor),
                Insn::Invoke(_, m, interface) => pool.method_ref(&m.owner, &m.name, &m.descriptor, *interface),
                _ => Ok(0),
            })
            .collect()
    }

    /// Simulate operand-stack depth over every reachable instruction.
    fn max_stack(&self, label_index: &FxHashMap<Label, usize>) -> Result<u16> {
        let target = |label: &Label| -> Result<usize> {
            label_index.get(label).copied().ok_or(ClassFileError::UnboundLabel(label.0))
        };
        let mut handlers = Vec::with_capacity(self.handlers.len());
        for h in &self.handlers {
            handlers.push((target(&h.start)?, target(&h.end)?, target(&h.handler)?));
        }

        let len = self.insns.len();
        let mut depth: Vec<Option<u16>> = vec![None; len + 1];
        let mut worklist = Vec::new();
        let mut max = 0u16;

        let enter = |index: usize, d: u16, depth: &mut Vec<Option<u16>>, worklist: &mut Vec<usize>| -> Result<()> {
            match depth[index] {
                Some(existing) if existing != d => Err(ClassFileError::StackMismatch {
                    index,
                    first: existing,
                    second: d,
                }),
                Some(_) => Ok(()),
                None => {
                    depth[index] = Some(d);
                    worklist.push(index);
                    Ok(())
                }
            }
        };

        if len > 0 {
            enter(0, 0, &mut depth, &mut worklist)?;
        }
        while let Some(index) = worklist.pop() {
            let Some(current) = depth[index] else { continue };
            max = max.max(current);
            if index == len {
                continue;
            }
            for &(start, end, handler) in &handlers {
                if start <= index && index < end {
                    max = max.max(1);
                    enter(handler, 1, &mut depth, &mut worklist)?;
                }
            }
            let insn = &self.insns[index];
            let (pops, pushes) = stack_effect(insn)?;
            if current < pops {
                return Err(ClassFileError::StackUnderflow { index });
            }
            let after = current - pops + pushes;
            max = max.max(after);

            let (falls, jump) = match insn {
                Insn::Simple(op) => (!op.ends_block(), None),
                Insn::Jump(op, label) => (*op != Opcode::Goto, Some(target(label)?)),
                _ => (true, None),
            };
            if let Some(t) = jump {
                enter(t, after, &mut depth, &mut worklist)?;
            }
            if falls {
                enter(index + 1, after, &mut depth, &mut worklist)?;
            }
        }
        Ok(max)
    }
}

fn member(owner: &str, name: &str, descriptor: &str) -> MemberRef {
    MemberRef {
        owner: owner.to_string(),
        name: name.to_string(),
        descriptor: descriptor.to_string(),
    }
}

fn insn_size(insn: &Insn, operand: u16) -> usize {
    match insn {
        Insn::Simple(_) => 1,
        Insn::Bipush(_) | Insn::NewArray(_) => 2,
        Insn::Sipush(_) | Insn::Jump(..) | Insn::Type(..) | Insn::Field(..) => 3,
        Insn::Local(_, slot) => {
            if *slot > u8::MAX as u16 {
                4
            } else {
                2
            }
        }
        Insn::Iinc(slot, delta) => {
            if *slot > u8::MAX as u16 || i8::try_from(*delta).is_err() {
                6
            } else {
                3
            }
        }
        Insn::Ldc(value) => {
            if value.is_wide() || operand > u8::MAX as u16 {
                3
            } else {
                2
            }
        }
        Insn::Invoke(op, ..) => {
            if *op == Opcode::Invokeinterface {
                5
            } else {
                3
            }
        }
        Insn::MultiANewArray(..) => 4,
        Insn::Label(_) | Insn::Line(_) => 0,
    }
}

fn stack_effect(insn: &Insn) -> Result<(u16, u16)> {
    Ok(match insn {
        Insn::Simple(op) | Insn::Local(op, _) | Insn::Jump(op, _) | Insn::Type(op, _) => op.stack_effect(),
        Insn::Bipush(_) | Insn::Sipush(_) => (0, 1),
        Insn::Iinc(..) | Insn::Label(_) | Insn::Line(_) => (0, 0),
        Insn::Ldc(value) => (0, if value.is_wide() { 2 } else { 1 }),
        Insn::NewArray(_) => (1, 1),
        Insn::MultiANewArray(_, dims) => (u16::from(*dims), 1),
        Insn::Field(op, m) => {
            let size = descriptor::slot_size(&m.descriptor);
            match op {
                Opcode::Getstatic => (0, size),
                Opcode::Putstatic => (size, 0),
                Opcode::Getfield => (1, size),
                _ => (1 + size, 0),
            }
        }
        Insn::Invoke(op, m, _) => {
            let args = descriptor::arg_slots(&m.descriptor)?;
            let ret = descriptor::return_slots(&m.descriptor)?;
            let receiver = if *op == Opcode::Invokestatic { 0 } else { 1 };
            (args + receiver, ret)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(code: &CodeBuilder) -> AssembledCode {
        let mut pool = ConstantPool::new();
        code.assemble(&mut pool).unwrap()
    }

    #[test]
    fn forward_branch_is_patched() {
        let mut code = CodeBuilder::new(1);
        let end = code.new_label();
        code.load(Opcode::Iload, 0);
        code.jump(Opcode::Ifeq, end);
        code.push_int(7);
        code.emit(Opcode::Pop);
        code.bind(end).unwrap();
        code.emit(Opcode::Return);

        let out = assemble(&code);
        // iload (2) ifeq (3) bipush (2) pop (1): ifeq at pc 2 jumps to pc 8.
        assert_eq!(out.code[2], u8::from(Opcode::Ifeq));
        assert_eq!(i16::from_be_bytes([out.code[3], out.code[4]]), 6);
        assert_eq!(out.max_stack, 1);
        assert_eq!(out.max_locals, 1);
    }

    #[test]
    fn backward_branch_has_negative_offset() {
        let mut code = CodeBuilder::new(0);
        let top = code.new_label();
        code.bind(top).unwrap();
        code.emit(Opcode::Nop);
        code.jump(Opcode::Goto, top);
        let out = assemble(&code);
        assert_eq!(i16::from_be_bytes([out.code[2], out.code[3]]), -1);
    }

    #[test]
    fn unbound_label_is_an_error() {
        let mut code = CodeBuilder::new(0);
        let nowhere = code.new_label();
        code.jump(Opcode::Goto, nowhere);
        let mut pool = ConstantPool::new();
        assert_eq!(code.assemble(&mut pool), Err(ClassFileError::UnboundLabel(nowhere.id())));
    }

    #[test]
    fn label_cannot_be_bound_twice() {
        let mut code = CodeBuilder::new(0);
        let l = code.new_label();
        code.bind(l).unwrap();
        assert_eq!(code.bind(l), Err(ClassFileError::LabelRebound(l.id())));
    }

    #[test]
    fn max_stack_counts_wide_values_and_calls() {
        let mut code = CodeBuilder::new(0);
        code.field(Opcode::Getstatic, "java/lang/System", "out", "Ljava/io/PrintStream;");
        code.push_long(40);
        code.push_long(2);
        code.emit(Opcode::Ladd);
        code.invoke(Opcode::Invokevirtual, "java/io/PrintStream", "println", "(J)V", false);
        code.emit(Opcode::Return);
        let out = assemble(&code);
        assert_eq!(out.max_stack, 5);
    }

    #[test]
    fn inconsistent_merge_depth_is_rejected() {
        let mut code = CodeBuilder::new(1);
        let join = code.new_label();
        code.load(Opcode::Iload, 0);
        code.jump(Opcode::Ifeq, join);
        code.push_int(1);
        code.bind(join).unwrap();
        code.emit(Opcode::Return);
        let mut pool = ConstantPool::new();
        assert!(matches!(
            code.assemble(&mut pool),
            Err(ClassFileError::StackMismatch { .. })
        ));
    }

    #[test]
    fn underflow_is_detected() {
        let mut code = CodeBuilder::new(0);
        code.emit(Opcode::Pop);
        let mut pool = ConstantPool::new();
        assert_eq!(code.assemble(&mut pool), Err(ClassFileError::StackUnderflow { index: 0 }));
    }

    #[test]
    fn handlers_start_with_the_exception_on_the_stack() {
        let mut code = CodeBuilder::new(0);
        let (start, end, handler, done) = (code.new_label(), code.new_label(), code.new_label(), code.new_label());
        code.bind(start).unwrap();
        code.emit(Opcode::Nop);
        code.bind(end).unwrap();
        code.jump(Opcode::Goto, done);
        code.bind(handler).unwrap();
        code.store(Opcode::Astore, 0);
        code.bind(done).unwrap();
        code.emit(Opcode::Return);
        code.try_catch(start, end, handler, Some("java/lang/Exception"));

        let mut pool = ConstantPool::new();
        let out = code.assemble(&mut pool).unwrap();
        assert_eq!(out.exception_table.len(), 1);
        let entry = out.exception_table[0];
        assert_eq!((entry.start_pc, entry.end_pc, entry.handler_pc), (0, 1, 4));
        assert_eq!(pool.get_class_name(entry.catch_type).unwrap(), "java/lang/Exception");
        assert_eq!(out.max_stack, 1);
        assert_eq!(out.max_locals, 1);
    }

    #[test]
    fn constants_pick_the_shortest_form() {
        let mut code = CodeBuilder::new(0);
        code.push_int(5);
        code.push_int(100);
        code.push_int(1000);
        code.push_int(100_000);
        let out = assemble(&code);
        assert_eq!(out.code[0], u8::from(Opcode::Iconst5));
        assert_eq!(out.code[1], u8::from(Opcode::Bipush));
        assert_eq!(out.code[3], u8::from(Opcode::Sipush));
        assert_eq!(out.code[6], u8::from(Opcode::Ldc));
        assert_eq!(out.max_stack, 4);
    }

    #[test]
    fn wide_locals_and_line_numbers() {
        let mut code = CodeBuilder::new(0);
        code.line(3);
        code.push_int(0);
        code.store(Opcode::Istore, 300);
        code.line(4);
        code.iinc(300, 1000);
        code.emit(Opcode::Return);
        let out = assemble(&code);
        assert_eq!(out.max_locals, 301);
        assert_eq!(out.code[1], u8::from(Opcode::Wide));
        assert_eq!(out.line_numbers, vec![(0, 3), (5, 4)]);
    }

    #[test]
    fn fall_through_detection() {
        let mut code = CodeBuilder::new(0);
        assert!(code.falls_through());
        code.emit(Opcode::Return);
        assert!(!code.falls_through());
        let l = code.new_label();
        code.bind(l).unwrap();
        assert!(code.falls_through());
    }
}
