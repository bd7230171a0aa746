//! Test support: shared fixtures and a small reference interpreter used to
//! check that rewritten methods behave like their originals.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::passes::{NonNullFacts, Pass, PassContext};
use crate::{
    BinOp, BranchCond, ClassModel, ConstValue, InsnKind, MapValueSource, MethodBody, OptError,
    OptimizeConfig, RuntimeValue, Width,
};

/// An empty class, an empty value source, and the default config
pub fn test_context() -> (ClassModel, MapValueSource, OptimizeConfig) {
    (ClassModel::new("Test"), MapValueSource::new(), OptimizeConfig::default())
}

/// Runs a single pass once with a fresh fact table
pub fn run_pass(
    pass: &mut dyn Pass,
    method: &mut MethodBody,
    class: &ClassModel,
    values: &dyn crate::FieldValueSource,
    config: &OptimizeConfig,
) -> Result<bool, OptError> {
    let mut facts = NonNullFacts::new();
    let mut cx = PassContext {
        class,
        values,
        facts: &mut facts,
        config,
    };
    pass.run(method, &mut cx)
}

/// An interpreter value. Arrays are shared references so aliasing through
/// fields and locals behaves like the runtime being modeled.
#[derive(Debug, Clone)]
pub enum RtVal {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Null,
    Array(Rc<RefCell<Vec<RtVal>>>),
}

impl RtVal {
    pub fn array(elems: Vec<RtVal>) -> Self {
        Self::Array(Rc::new(RefCell::new(elems)))
    }

    fn from_const(value: &ConstValue) -> Result<Self, String> {
        Ok(match value {
            ConstValue::I32(v) => Self::I32(*v),
            ConstValue::I64(v) => Self::I64(*v),
            ConstValue::F32(v) => Self::F32(*v),
            ConstValue::F64(v) => Self::F64(*v),
            ConstValue::Null => Self::Null,
            ConstValue::Str(_) => return Err("string constants not interpreted".to_string()),
        })
    }

    /// The matching static snapshot value, for seeding a field source
    pub fn as_runtime_value(&self) -> RuntimeValue {
        match self {
            Self::I32(v) => RuntimeValue::I32(*v),
            Self::I64(v) => RuntimeValue::I64(*v),
            Self::F32(v) => RuntimeValue::F32(*v),
            Self::F64(v) => RuntimeValue::F64(*v),
            Self::Null => RuntimeValue::Null,
            Self::Array(elems) => RuntimeValue::Array(
                elems.borrow().iter().map(Self::as_runtime_value).collect(),
            ),
        }
    }

    fn as_i32(&self) -> Result<i32, String> {
        match self {
            Self::I32(v) => Ok(*v),
            other => Err(format!("expected i32, got {other:?}")),
        }
    }

    fn zero_of(width: Width) -> Self {
        match width {
            Width::I32 => Self::I32(0),
            Width::I64 => Self::I64(0),
            Width::F32 => Self::F32(0.0),
            Width::F64 => Self::F64(0.0),
            Width::Ref => Self::Null,
        }
    }
}

/// Structural equality; arrays compare by contents
impl PartialEq for RtVal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::F32(a), Self::F32(b)) => a.to_bits() == b.to_bits(),
            (Self::F64(a), Self::F64(b)) => a.to_bits() == b.to_bits(),
            (Self::Null, Self::Null) => true,
            (Self::Array(a), Self::Array(b)) => *a.borrow() == *b.borrow(),
            _ => false,
        }
    }
}

const FUEL: usize = 100_000;

/// A reference interpreter over one class instance.
pub struct Machine {
    pub fields: FxHashMap<String, RtVal>,
    /// Bodies resolvable by `Call`, usually the split helpers
    pub methods: Vec<MethodBody>,
}

impl Machine {
    pub fn new() -> Self {
        Self {
            fields: FxHashMap::default(),
            methods: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: RtVal) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// A field source snapshotting the machine's current field values
    pub fn snapshot(&self) -> MapValueSource {
        let mut source = MapValueSource::new();
        for (name, value) in &self.fields {
            source.insert(name.clone(), value.as_runtime_value());
        }
        source
    }

    pub fn run(&mut self, method: &MethodBody, args: &[RtVal]) -> Result<Option<RtVal>, String> {
        let mut fuel = FUEL;
        self.run_with_fuel(method, args, &mut fuel)
    }

    fn run_with_fuel(
        &mut self,
        method: &MethodBody,
        args: &[RtVal],
        fuel: &mut usize,
    ) -> Result<Option<RtVal>, String> {
        let mut locals = vec![RtVal::Null; method.max_locals as usize];
        for ((slot, width), arg) in method.params.iter().zip(args) {
            let _ = width;
            locals[*slot as usize] = arg.clone();
        }
        let mut stack: Vec<RtVal> = Vec::new();
        let mut cursor = method.insns.first();

        while let Some(id) = cursor {
            if *fuel == 0 {
                return Err("out of fuel".to_string());
            }
            *fuel -= 1;
            let insn = method.insns.get(id).ok_or("cursor on tombstone")?;
            let mut jump = None;
            match &insn.kind {
                InsnKind::Const(value) => stack.push(RtVal::from_const(value)?),
                InsnKind::LoadLocal { slot, .. } => stack.push(locals[*slot as usize].clone()),
                InsnKind::StoreLocal { slot, .. } => {
                    locals[*slot as usize] = stack.pop().ok_or("stack underflow")?;
                }
                InsnKind::IncrLocal { slot, delta } => {
                    let slot = *slot as usize;
                    locals[slot] = match &locals[slot] {
                        RtVal::I32(v) => RtVal::I32(v.wrapping_add(*delta)),
                        RtVal::I64(v) => RtVal::I64(v.wrapping_add(i64::from(*delta))),
                        other => return Err(format!("incr of non-integer {other:?}")),
                    };
                }
                InsnKind::GetField { name } => {
                    let value = self
                        .fields
                        .get(name)
                        .ok_or_else(|| format!("no field '{name}'"))?;
                    stack.push(value.clone());
                }
                InsnKind::ArrayLoad { .. } => {
                    let idx = stack.pop().ok_or("stack underflow")?.as_i32()?;
                    let array = pop_array(&mut stack)?;
                    let array = array.borrow();
                    let element = usize::try_from(idx)
                        .ok()
                        .and_then(|i| array.get(i))
                        .ok_or_else(|| format!("index {idx} out of bounds"))?;
                    stack.push(element.clone());
                }
                InsnKind::ArrayStore { .. } => {
                    let value = stack.pop().ok_or("stack underflow")?;
                    let idx = stack.pop().ok_or("stack underflow")?.as_i32()?;
                    let array = pop_array(&mut stack)?;
                    let mut array = array.borrow_mut();
                    let slot = usize::try_from(idx)
                        .ok()
                        .and_then(|i| array.get_mut(i))
                        .ok_or_else(|| format!("index {idx} out of bounds"))?;
                    *slot = value;
                }
                InsnKind::ArrayLength => {
                    let array = pop_array(&mut stack)?;
                    let len = array.borrow().len();
                    stack.push(RtVal::I32(len as i32));
                }
                InsnKind::NewArray { elem } => {
                    let len = stack.pop().ok_or("stack underflow")?.as_i32()?;
                    let len = usize::try_from(len).map_err(|_| "negative array length")?;
                    stack.push(RtVal::array(vec![RtVal::zero_of(*elem); len]));
                }
                InsnKind::Binary { op, .. } => {
                    let b = stack.pop().ok_or("stack underflow")?;
                    let a = stack.pop().ok_or("stack underflow")?;
                    stack.push(binary(*op, &a, &b)?);
                }
                InsnKind::Compare { .. } => {
                    let b = stack.pop().ok_or("stack underflow")?;
                    let a = stack.pop().ok_or("stack underflow")?;
                    stack.push(RtVal::I32(compare(&a, &b)?));
                }
                InsnKind::Branch { cond, target } => {
                    if eval_branch(*cond, &mut stack)? {
                        jump = Some(*target);
                    }
                }
                InsnKind::Goto { target } => jump = Some(*target),
                InsnKind::Label(_) | InsnKind::Nop => {}
                InsnKind::Cast { to, .. } => {
                    let value = stack.pop().ok_or("stack underflow")?;
                    stack.push(cast(&value, *to)?);
                }
                InsnKind::Call { method: callee, returns } => {
                    let callee = self
                        .methods
                        .iter()
                        .find(|m| &m.name == callee)
                        .cloned()
                        .ok_or_else(|| format!("no method '{callee}'"))?;
                    let args: Vec<RtVal> = callee
                        .params
                        .iter()
                        .map(|(slot, _)| locals[*slot as usize].clone())
                        .collect();
                    let result = self.run_with_fuel(&callee, &args, fuel)?;
                    match (returns, result) {
                        (Some(_), Some(value)) => stack.push(value),
                        (None, _) => {}
                        (Some(_), None) => return Err("callee returned no value".to_string()),
                    }
                }
                InsnKind::Return { width } => {
                    return Ok(match width {
                        Some(_) => Some(stack.pop().ok_or("stack underflow")?),
                        None => None,
                    });
                }
            }
            cursor = match jump {
                Some(target) => {
                    let pos = method
                        .insns
                        .label_position(target)
                        .ok_or_else(|| format!("undefined label L{}", target.index()))?;
                    method.insns.next(pos)
                }
                None => method.insns.next(id),
            };
        }
        Err("fell off the end of the method".to_string())
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

fn pop_array(stack: &mut Vec<RtVal>) -> Result<Rc<RefCell<Vec<RtVal>>>, String> {
    match stack.pop().ok_or("stack underflow")? {
        RtVal::Array(array) => Ok(array),
        RtVal::Null => Err("null array reference".to_string()),
        other => Err(format!("expected array, got {other:?}")),
    }
}

fn binary(op: BinOp, a: &RtVal, b: &RtVal) -> Result<RtVal, String> {
    Ok(match (a, b) {
        (RtVal::I32(a), RtVal::I32(b)) => {
            if matches!(op, BinOp::Div | BinOp::Rem) && *b == 0 {
                return Err("division by zero".to_string());
            }
            RtVal::I32(match op {
                BinOp::Add => a.wrapping_add(*b),
                BinOp::Sub => a.wrapping_sub(*b),
                BinOp::Mul => a.wrapping_mul(*b),
                BinOp::Div => a.wrapping_div(*b),
                BinOp::Rem => a.wrapping_rem(*b),
            })
        }
        (RtVal::I64(a), RtVal::I64(b)) => {
            if matches!(op, BinOp::Div | BinOp::Rem) && *b == 0 {
                return Err("division by zero".to_string());
            }
            RtVal::I64(match op {
                BinOp::Add => a.wrapping_add(*b),
                BinOp::Sub => a.wrapping_sub(*b),
                BinOp::Mul => a.wrapping_mul(*b),
                BinOp::Div => a.wrapping_div(*b),
                BinOp::Rem => a.wrapping_rem(*b),
            })
        }
        (RtVal::F64(a), RtVal::F64(b)) => RtVal::F64(match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
            BinOp::Rem => a % b,
        }),
        (RtVal::F32(a), RtVal::F32(b)) => RtVal::F32(match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
            BinOp::Rem => a % b,
        }),
        _ => return Err(format!("binary on mismatched operands {a:?} {b:?}")),
    })
}

fn compare(a: &RtVal, b: &RtVal) -> Result<i32, String> {
    let ord = match (a, b) {
        (RtVal::I32(a), RtVal::I32(b)) => a.cmp(b),
        (RtVal::I64(a), RtVal::I64(b)) => a.cmp(b),
        (RtVal::F32(a), RtVal::F32(b)) => {
            a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Less)
        }
        (RtVal::F64(a), RtVal::F64(b)) => {
            a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Less)
        }
        _ => return Err(format!("compare on mismatched operands {a:?} {b:?}")),
    };
    Ok(match ord {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    })
}

fn cast(value: &RtVal, to: Width) -> Result<RtVal, String> {
    Ok(match (value, to) {
        (RtVal::I32(v), Width::I32) => RtVal::I32(*v),
        (RtVal::I32(v), Width::I64) => RtVal::I64(i64::from(*v)),
        (RtVal::I32(v), Width::F32) => RtVal::F32(*v as f32),
        (RtVal::I32(v), Width::F64) => RtVal::F64(f64::from(*v)),
        (RtVal::I64(v), Width::I32) => RtVal::I32(*v as i32),
        (RtVal::I64(v), Width::I64) => RtVal::I64(*v),
        (RtVal::I64(v), Width::F32) => RtVal::F32(*v as f32),
        (RtVal::I64(v), Width::F64) => RtVal::F64(*v as f64),
        (RtVal::F32(v), Width::I32) => RtVal::I32(*v as i32),
        (RtVal::F32(v), Width::I64) => RtVal::I64(*v as i64),
        (RtVal::F32(v), Width::F32) => RtVal::F32(*v),
        (RtVal::F32(v), Width::F64) => RtVal::F64(f64::from(*v)),
        (RtVal::F64(v), Width::I32) => RtVal::I32(*v as i32),
        (RtVal::F64(v), Width::I64) => RtVal::I64(*v as i64),
        (RtVal::F64(v), Width::F32) => RtVal::F32(*v as f32),
        (RtVal::F64(v), Width::F64) => RtVal::F64(*v),
        _ => return Err(format!("cannot cast {value:?} to {to:?}")),
    })
}

fn eval_branch(cond: BranchCond, stack: &mut Vec<RtVal>) -> Result<bool, String> {
    if cond.operand_count() == 1 {
        let value = stack.pop().ok_or("stack underflow")?;
        return match cond {
            BranchCond::Null => Ok(matches!(value, RtVal::Null)),
            BranchCond::NonNull => Ok(!matches!(value, RtVal::Null)),
            _ => {
                let sign = match value {
                    RtVal::I32(v) => v.signum(),
                    RtVal::I64(v) => v.signum() as i32,
                    other => return Err(format!("integer branch on {other:?}")),
                };
                cond.eval_sign(sign)
                    .ok_or_else(|| format!("bad branch condition {cond:?}"))
            }
        };
    }
    let b = stack.pop().ok_or("stack underflow")?;
    let a = stack.pop().ok_or("stack underflow")?;
    match cond {
        BranchCond::RefEq | BranchCond::RefNe => {
            let equal = match (&a, &b) {
                (RtVal::Null, RtVal::Null) => true,
                (RtVal::Array(x), RtVal::Array(y)) => Rc::ptr_eq(x, y),
                _ => false,
            };
            Ok(if cond == BranchCond::RefEq { equal } else { !equal })
        }
        _ => {
            let (a, b) = match (a, b) {
                (RtVal::I32(a), RtVal::I32(b)) => (i64::from(a), i64::from(b)),
                (RtVal::I64(a), RtVal::I64(b)) => (a, b),
                (a, b) => return Err(format!("icmp branch on {a:?} {b:?}")),
            };
            cond.eval_icmp(a, b)
                .ok_or_else(|| format!("bad branch condition {cond:?}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{optimize, FieldDecl, Instruction, MethodMarkers};

    fn equivalence_check(
        method: &MethodBody,
        class: &ClassModel,
        fields: Vec<(&str, RtVal)>,
        args: &[RtVal],
        config: &OptimizeConfig,
    ) {
        let mut reference = Machine::new();
        let mut optimized = Machine::new();
        for (name, value) in fields {
            // Deep-copy so the two machines never share arrays
            reference.fields.insert(name.to_string(), value.clone());
            optimized
                .fields
                .insert(name.to_string(), deep_copy(&value));
        }
        let args_copy: Vec<RtVal> = args.iter().map(deep_copy).collect();

        let snapshot = reference.snapshot();
        let result = optimize(method, class, &snapshot, config);

        let expected = reference.run(method, args);
        optimized.methods = result.helpers.clone();
        let actual = optimized.run(&result.method, &args_copy);

        assert_eq!(expected, actual, "return values diverge");
        for (name, value) in &reference.fields {
            assert_eq!(
                Some(value),
                optimized.fields.get(name),
                "field '{name}' diverges"
            );
        }
        for (i, (a, b)) in args.iter().zip(&args_copy).enumerate() {
            assert_eq!(a, b, "argument {i} diverges");
        }
    }

    fn deep_copy(value: &RtVal) -> RtVal {
        match value {
            RtVal::Array(elems) => {
                RtVal::array(elems.borrow().iter().map(deep_copy).collect())
            }
            other => other.clone(),
        }
    }

    #[test]
    fn machine_runs_a_counting_loop() {
        let mut method = MethodBody::new("sum", Some(Width::I32), 2);
        let mut list = crate::InsnList::new();
        let body = list.fresh_label();
        let check = list.fresh_label();
        list.push_back(Instruction::const_value(ConstValue::I32(0)));
        list.push_back(Instruction::store_local(1, Width::I32));
        list.push_back(Instruction::const_value(ConstValue::I32(0)));
        list.push_back(Instruction::store_local(0, Width::I32));
        list.push_back(Instruction::goto(check));
        list.push_back(Instruction::label(body));
        list.push_back(Instruction::load_local(1, Width::I32));
        list.push_back(Instruction::load_local(0, Width::I32));
        list.push_back(Instruction::binary(BinOp::Add, Width::I32));
        list.push_back(Instruction::store_local(1, Width::I32));
        list.push_back(Instruction::incr_local(0, 1));
        list.push_back(Instruction::label(check));
        list.push_back(Instruction::load_local(0, Width::I32));
        list.push_back(Instruction::const_value(ConstValue::I32(5)));
        list.push_back(Instruction::branch(BranchCond::ICmpLt, body));
        list.push_back(Instruction::load_local(1, Width::I32));
        list.push_back(Instruction::ret(Some(Width::I32)));
        method.insns = list;

        let mut machine = Machine::new();
        let result = machine.run(&method, &[]).expect("run failed");
        assert_eq!(result, Some(RtVal::I32(10)));
    }

    #[test]
    fn unrolled_loop_matches_the_original() {
        // sum of table[i] for i in 0..3, accumulated into a mutable field
        // array so the effect is observable after the run
        let mut class = ClassModel::new("C");
        class.add_field(FieldDecl::new("table", Width::I32).immutable_contents());
        class.add_field(FieldDecl::new("out", Width::I32));

        let mut method = MethodBody::new("m", None, 2).with_markers(MethodMarkers {
            optimizable: true,
            strict_loops: true,
            ..MethodMarkers::default()
        });
        let mut list = crate::InsnList::new();
        let body = list.fresh_label();
        let check = list.fresh_label();
        list.push_back(Instruction::const_value(ConstValue::I32(0)));
        list.push_back(Instruction::store_local(0, Width::I32));
        list.push_back(Instruction::goto(check));
        list.push_back(Instruction::label(body));
        // out[0] = out[0] + table[counter]
        list.push_back(Instruction::get_field("out"));
        list.push_back(Instruction::const_value(ConstValue::I32(0)));
        list.push_back(Instruction::get_field("out"));
        list.push_back(Instruction::const_value(ConstValue::I32(0)));
        list.push_back(Instruction::array_load(Width::I32));
        list.push_back(Instruction::get_field("table"));
        list.push_back(Instruction::load_local(0, Width::I32));
        list.push_back(Instruction::array_load(Width::I32));
        list.push_back(Instruction::binary(BinOp::Add, Width::I32));
        list.push_back(Instruction::array_store(Width::I32));
        list.push_back(Instruction::incr_local(0, 1));
        list.push_back(Instruction::label(check));
        list.push_back(Instruction::load_local(0, Width::I32));
        list.push_back(Instruction::const_value(ConstValue::I32(3)));
        list.push_back(Instruction::branch(BranchCond::ICmpLt, body));
        list.push_back(Instruction::ret(None));
        method.insns = list;

        equivalence_check(
            &method,
            &class,
            vec![
                (
                    "table",
                    RtVal::array(vec![RtVal::I32(2), RtVal::I32(3), RtVal::I32(5)]),
                ),
                ("out", RtVal::array(vec![RtVal::I32(0)])),
            ],
            &[],
            &OptimizeConfig::default(),
        );
    }

    #[test]
    fn branch_heavy_method_matches_the_original() {
        let mut class = ClassModel::new("C");
        class.add_field(FieldDecl::new("table", Width::I32).immutable_contents());
        class.add_field(FieldDecl::new("out", Width::I32));

        // if (table.length == 3) out[0] = 1 else out[0] = 2
        let mut method = MethodBody::new("m", None, 0).optimizable();
        let mut list = crate::InsnList::new();
        let then_label = list.fresh_label();
        let end_label = list.fresh_label();
        list.push_back(Instruction::get_field("table"));
        list.push_back(Instruction::array_length());
        list.push_back(Instruction::const_value(ConstValue::I32(3)));
        list.push_back(Instruction::branch(BranchCond::ICmpEq, then_label));
        list.push_back(Instruction::get_field("out"));
        list.push_back(Instruction::const_value(ConstValue::I32(0)));
        list.push_back(Instruction::const_value(ConstValue::I32(2)));
        list.push_back(Instruction::array_store(Width::I32));
        list.push_back(Instruction::goto(end_label));
        list.push_back(Instruction::label(then_label));
        list.push_back(Instruction::get_field("out"));
        list.push_back(Instruction::const_value(ConstValue::I32(0)));
        list.push_back(Instruction::const_value(ConstValue::I32(1)));
        list.push_back(Instruction::array_store(Width::I32));
        list.push_back(Instruction::label(end_label));
        list.push_back(Instruction::ret(None));
        method.insns = list;

        equivalence_check(
            &method,
            &class,
            vec![
                (
                    "table",
                    RtVal::array(vec![RtVal::I32(1), RtVal::I32(1), RtVal::I32(1)]),
                ),
                ("out", RtVal::array(vec![RtVal::I32(0)])),
            ],
            &[],
            &OptimizeConfig::default(),
        );
    }

    #[test]
    fn split_method_matches_the_original() {
        let mut class = ClassModel::new("C");
        class.add_field(FieldDecl::new("out", Width::I32));

        // A long run of out[i % 4] = i stores, too big for the bound
        let mut method = MethodBody::new("m", None, 0).optimizable();
        let mut list = crate::InsnList::new();
        for i in 0..20 {
            list.push_back(Instruction::get_field("out"));
            list.push_back(Instruction::const_value(ConstValue::I32(i % 4)));
            list.push_back(Instruction::const_value(ConstValue::I32(i)));
            list.push_back(Instruction::array_store(Width::I32));
        }
        list.push_back(Instruction::ret(None));
        method.insns = list;

        let config = OptimizeConfig {
            max_method_size: 40,
            ..OptimizeConfig::default()
        };
        equivalence_check(
            &method,
            &class,
            vec![("out", RtVal::array(vec![RtVal::I32(0); 4]))],
            &[],
            &config,
        );
    }

    #[test]
    fn split_method_mutating_an_array_parameter_matches_the_original() {
        let class = ClassModel::new("C");

        // xs[i % 4] = i over the parameter array, long enough to split; the
        // parameter slot must thread through every helper in the chain
        let mut method = MethodBody::new("m", None, 1)
            .with_params(vec![(0, Width::Ref)])
            .optimizable();
        let mut list = crate::InsnList::new();
        for i in 0..20 {
            list.push_back(Instruction::load_local(0, Width::Ref));
            list.push_back(Instruction::const_value(ConstValue::I32(i % 4)));
            list.push_back(Instruction::const_value(ConstValue::I32(i)));
            list.push_back(Instruction::array_store(Width::I32));
        }
        list.push_back(Instruction::ret(None));
        method.insns = list;

        let config = OptimizeConfig {
            max_method_size: 40,
            ..OptimizeConfig::default()
        };
        equivalence_check(
            &method,
            &class,
            vec![],
            &[RtVal::array(vec![RtVal::I32(0); 4])],
            &config,
        );
    }
}
