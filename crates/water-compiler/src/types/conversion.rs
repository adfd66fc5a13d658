//! Type-directed instruction selection.
//!
//! [`TypedCode`] extends the class-file [`CodeBuilder`] with operations
//! that pick the right opcode family for a [`WaterType`]: loads, stores,
//! returns, array access, stack shuffling, primitive casts and boxing.

use water_classfile::{CodeBuilder, Opcode};
use water_parser::ast::BinaryOp;

use super::{TypeKind, WaterType};

/// Instruction that pushes the placeholder value of a type.
pub fn dummy_constant(ty: &WaterType) -> Opcode {
    match ty.kind() {
        TypeKind::Long => Opcode::Lconst0,
        TypeKind::Float => Opcode::Fconst0,
        TypeKind::Double => Opcode::Dconst0,
        k if ty.is_reference() || matches!(k, TypeKind::Method(_)) => Opcode::AconstNull,
        _ => Opcode::Iconst0,
    }
}

/// Comparison that reduces two non-`int` numbers to `-1`, `0` or `1`.
pub fn compare_insn(ty: &WaterType) -> Option<Opcode> {
    match ty.kind() {
        TypeKind::Long => Some(Opcode::Lcmp),
        TypeKind::Float => Some(Opcode::Fcmpl),
        TypeKind::Double => Some(Opcode::Dcmpl),
        _ => None,
    }
}

/// The four stack representations of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
}

fn stack_kind(ty: &WaterType) -> StackKind {
    match ty.kind() {
        TypeKind::Long => StackKind::Long,
        TypeKind::Float => StackKind::Float,
        TypeKind::Double => StackKind::Double,
        _ if ty.is_represented_as_int() => StackKind::Int,
        _ => StackKind::Reference,
    }
}

fn by_kind(ty: &WaterType, ops: [Opcode; 5]) -> Opcode {
    match stack_kind(ty) {
        StackKind::Int => ops[0],
        StackKind::Long => ops[1],
        StackKind::Float => ops[2],
        StackKind::Double => ops[3],
        StackKind::Reference => ops[4],
    }
}

/// Arithmetic or bitwise instruction for `op` on operands of type `ty`.
pub fn binary_insn(op: BinaryOp, ty: &WaterType) -> Option<Opcode> {
    use Opcode::*;
    let kind = stack_kind(ty);
    let [i, l, f, d] = match op {
        BinaryOp::Add => [Iadd, Ladd, Fadd, Dadd],
        BinaryOp::Sub => [Isub, Lsub, Fsub, Dsub],
        BinaryOp::Mul => [Imul, Lmul, Fmul, Dmul],
        BinaryOp::Div => [Idiv, Ldiv, Fdiv, Ddiv],
        BinaryOp::Mod => [Irem, Lrem, Frem, Drem],
        BinaryOp::BitwiseAnd => [Iand, Land, Nop, Nop],
        BinaryOp::BitwiseOr => [Ior, Lor, Nop, Nop],
        BinaryOp::BitwiseXor => [Ixor, Lxor, Nop, Nop],
        BinaryOp::ShiftLeft => [Ishl, Lshl, Nop, Nop],
        BinaryOp::ShiftRight => [Ishr, Lshr, Nop, Nop],
        BinaryOp::ShiftRightUnsigned => [Iushr, Lushr, Nop, Nop],
        _ => return None,
    };
    let insn = match kind {
        StackKind::Int => i,
        StackKind::Long => l,
        StackKind::Float => f,
        StackKind::Double => d,
        StackKind::Reference => return None,
    };
    (insn != Nop).then_some(insn)
}

/// Typed emission helpers on top of [`CodeBuilder`].
pub trait TypedCode {
    fn load_local(&mut self, ty: &WaterType, slot: u16);
    fn store_local(&mut self, ty: &WaterType, slot: u16);
    fn return_value(&mut self, ty: &WaterType);
    fn array_load(&mut self, element: &WaterType);
    fn array_store(&mut self, element: &WaterType);
    /// Duplicate the value on top of the stack.
    fn dup_value(&mut self, ty: &WaterType);
    /// Duplicate the value and insert the copy below `below` slots.
    fn dup_value_under(&mut self, ty: &WaterType, below: u16);
    fn pop_value(&mut self, ty: &WaterType);
    /// Swap the top value with the one beneath it.
    fn swap_values(&mut self, top: &WaterType, below: &WaterType);
    fn push_dummy(&mut self, ty: &WaterType);
    /// Push `value` as a constant of primitive type `ty`.
    fn push_as(&mut self, ty: &WaterType, value: i32);
    /// Convert the primitive on top of the stack from `from` to `to`.
    fn cast_primitive(&mut self, from: &WaterType, to: &WaterType);
    /// Wrap the primitive on top of the stack in its box class.
    fn box_value(&mut self, ty: &WaterType);
    /// Unwrap a box class into primitive `ty`.
    fn unbox_value(&mut self, ty: &WaterType);
}

impl TypedCode for CodeBuilder {
    fn load_local(&mut self, ty: &WaterType, slot: u16) {
        use Opcode::*;
        self.load(by_kind(ty, [Iload, Lload, Fload, Dload, Aload]), slot);
    }

    fn store_local(&mut self, ty: &WaterType, slot: u16) {
        use Opcode::*;
        self.store(by_kind(ty, [Istore, Lstore, Fstore, Dstore, Astore]), slot);
    }

    fn return_value(&mut self, ty: &WaterType) {
        use Opcode::*;
        if ty.is_void() {
            self.emit(Return);
        } else {
            self.emit(by_kind(ty, [Ireturn, Lreturn, Freturn, Dreturn, Areturn]));
        }
    }

    fn array_load(&mut self, element: &WaterType) {
        use Opcode::*;
        let op = match element.kind() {
            TypeKind::Boolean | TypeKind::Byte => Baload,
            TypeKind::Char => Caload,
            TypeKind::Short => Saload,
            _ => by_kind(element, [Iaload, Laload, Faload, Daload, Aaload]),
        };
        self.emit(op);
    }

    fn array_store(&mut self, element: &WaterType) {
        use Opcode::*;
        let op = match element.kind() {
            TypeKind::Boolean | TypeKind::Byte => Bastore,
            TypeKind::Char => Castore,
            TypeKind::Short => Sastore,
            _ => by_kind(element, [Iastore, Lastore, Fastore, Dastore, Aastore]),
        };
        self.emit(op);
    }

    fn dup_value(&mut self, ty: &WaterType) {
        match ty.size() {
            0 => {}
            2 => self.emit(Opcode::Dup2),
            _ => self.emit(Opcode::Dup),
        }
    }

    fn dup_value_under(&mut self, ty: &WaterType, below: u16) {
        let wide = ty.size() == 2;
        let op = match (below, wide) {
            (0, false) => Opcode::Dup,
            (0, true) => Opcode::Dup2,
            (1, false) => Opcode::DupX1,
            (1, true) => Opcode::Dup2X1,
            (_, false) => Opcode::DupX2,
            (_, true) => Opcode::Dup2X2,
        };
        self.emit(op);
    }

    fn pop_value(&mut self, ty: &WaterType) {
        match ty.size() {
            0 => {}
            2 => self.emit(Opcode::Pop2),
            _ => self.emit(Opcode::Pop),
        }
    }

    fn swap_values(&mut self, top: &WaterType, below: &WaterType) {
        match (top.size(), below.size()) {
            (1, 1) => self.emit(Opcode::Swap),
            (1, _) => {
                self.emit(Opcode::DupX2);
                self.emit(Opcode::Pop);
            }
            (_, 1) => {
                self.emit(Opcode::Dup2X1);
                self.emit(Opcode::Pop2);
            }
            _ => {
                self.emit(Opcode::Dup2X2);
                self.emit(Opcode::Pop2);
            }
        }
    }

    fn push_dummy(&mut self, ty: &WaterType) {
        if !ty.is_void() {
            self.emit(dummy_constant(ty));
        }
    }

    fn push_as(&mut self, ty: &WaterType, value: i32) {
        match stack_kind(ty) {
            StackKind::Long => self.push_long(value as i64),
            StackKind::Float => self.push_float(value as f32),
            StackKind::Double => self.push_double(value as f64),
            _ => self.push_int(value),
        }
    }

    fn cast_primitive(&mut self, from: &WaterType, to: &WaterType) {
        use Opcode::*;
        if from == to || !from.is_primitive() || !to.is_primitive() {
            return;
        }
        let widen = match (stack_kind(from), stack_kind(to)) {
            (StackKind::Int, StackKind::Long) => Some(I2l),
            (StackKind::Int, StackKind::Float) => Some(I2f),
            (StackKind::Int, StackKind::Double) => Some(I2d),
            (StackKind::Long, StackKind::Int) => Some(L2i),
            (StackKind::Long, StackKind::Float) => Some(L2f),
            (StackKind::Long, StackKind::Double) => Some(L2d),
            (StackKind::Float, StackKind::Int) => Some(F2i),
            (StackKind::Float, StackKind::Long) => Some(F2l),
            (StackKind::Float, StackKind::Double) => Some(F2d),
            (StackKind::Double, StackKind::Int) => Some(D2i),
            (StackKind::Double, StackKind::Long) => Some(D2l),
            (StackKind::Double, StackKind::Float) => Some(D2f),
            _ => None,
        };
        if let Some(op) = widen {
            self.emit(op);
        }
        let narrow = match to.kind() {
            TypeKind::Byte => Some(I2b),
            TypeKind::Char => Some(I2c),
            TypeKind::Short if *from.kind() != TypeKind::Byte => Some(I2s),
            _ => None,
        };
        if let Some(op) = narrow {
            self.emit(op);
        }
    }

    fn box_value(&mut self, ty: &WaterType) {
        if !ty.is_primitive() || ty.is_void() {
            return;
        }
        let wrapper = ty.box_type();
        let Some(owner) = wrapper.class_name() else { return };
        let descriptor = format!("({}){}", ty.descriptor(), wrapper.descriptor());
        self.invoke(Opcode::Invokestatic, owner, "valueOf", &descriptor, false);
    }

    fn unbox_value(&mut self, ty: &WaterType) {
        let wrapper = ty.box_type();
        let Some(owner) = wrapper.class_name() else { return };
        let name = format!("{}Value", ty);
        let descriptor = format!("(){}", ty.descriptor());
        self.invoke(Opcode::Invokevirtual, owner, &name, &descriptor, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(code: &CodeBuilder) -> String {
        format!("{:?}", code)
    }

    #[test]
    fn dummy_constants() {
        assert_eq!(dummy_constant(&WaterType::INT), Opcode::Iconst0);
        assert_eq!(dummy_constant(&WaterType::BOOLEAN), Opcode::Iconst0);
        assert_eq!(dummy_constant(&WaterType::LONG), Opcode::Lconst0);
        assert_eq!(dummy_constant(&WaterType::FLOAT), Opcode::Fconst0);
        assert_eq!(dummy_constant(&WaterType::DOUBLE), Opcode::Dconst0);
        assert_eq!(dummy_constant(&WaterType::string()), Opcode::AconstNull);
    }

    #[test]
    fn typed_arithmetic() {
        assert_eq!(binary_insn(BinaryOp::Add, &WaterType::INT), Some(Opcode::Iadd));
        assert_eq!(binary_insn(BinaryOp::Mod, &WaterType::DOUBLE), Some(Opcode::Drem));
        assert_eq!(binary_insn(BinaryOp::ShiftLeft, &WaterType::LONG), Some(Opcode::Lshl));
        assert_eq!(binary_insn(BinaryOp::BitwiseAnd, &WaterType::FLOAT), None);
        assert_eq!(binary_insn(BinaryOp::Add, &WaterType::string()), None);
        assert_eq!(compare_insn(&WaterType::LONG), Some(Opcode::Lcmp));
        assert_eq!(compare_insn(&WaterType::INT), None);
    }

    #[test]
    fn casts_go_through_the_stack_kind() {
        let mut code = CodeBuilder::new(0);
        code.cast_primitive(&WaterType::LONG, &WaterType::BYTE);
        let listing = ops(&code);
        assert!(listing.contains("L2i") && listing.contains("I2b"), "{listing}");

        let mut code = CodeBuilder::new(0);
        code.cast_primitive(&WaterType::CHAR, &WaterType::INT);
        assert!(code.is_empty());

        let mut code = CodeBuilder::new(0);
        code.cast_primitive(&WaterType::BYTE, &WaterType::SHORT);
        assert!(code.is_empty());
    }

    #[test]
    fn boxing_calls_value_of() {
        let mut code = CodeBuilder::new(0);
        code.box_value(&WaterType::INT);
        let listing = ops(&code);
        assert!(listing.contains("valueOf") && listing.contains("(I)Ljava/lang/Integer;"), "{listing}");

        let mut code = CodeBuilder::new(0);
        code.unbox_value(&WaterType::DOUBLE);
        assert!(ops(&code).contains("doubleValue"));
    }

    #[test]
    fn wide_values_use_two_slot_shuffles() {
        let mut code = CodeBuilder::new(0);
        code.dup_value_under(&WaterType::DOUBLE, 2);
        code.swap_values(&WaterType::INT, &WaterType::LONG);
        let listing = ops(&code);
        assert!(listing.contains("Dup2X2") && listing.contains("DupX2"), "{listing}");
    }
}
