use crate::allocator::{Allocator, NodePtr, SExp};
use crate::cost::Cost;
use crate::dialect::{Dialect, OperatorSet};
use crate::error::EvalErr;
use crate::op_utils::{get_args, uint_atom};
use crate::reduction::{Reduction, Response};

const QUOTE_COST: Cost = 20;
const APPLY_COST: Cost = 90;
const SOFTFORK_BASE_COST: Cost = 140;

const TRAVERSE_BASE_COST: Cost = 40;
const TRAVERSE_COST_PER_LEG: Cost = 4;
const TRAVERSE_COST_PER_ZERO_BYTE: Cost = 4;

// the operation stack grows with nesting depth, the value stack with
// argument counts; both are bounded only by the program, so they get
// hard caps
const OP_STACK_LIMIT: usize = 10_000_000;
const VAL_STACK_LIMIT: usize = 10_000_000;

enum Operation {
    /// evaluate a program against an environment
    Eval(NodePtr, NodePtr),
    /// pop argc evaluated values, assemble the argument list and invoke
    /// the operator
    Apply { op: NodePtr, argc: u32 },
    /// pop the freshly evaluated environment and program values and
    /// splice in their evaluation (the tail-call form of `a`)
    SwapEval,
    /// the operator position held a pair; pop its value and re-dispatch
    EvalOpResult { args: NodePtr, env: NodePtr },
    /// close the innermost softfork guard
    SoftforkEnd,
}

struct SoftforkFrame {
    /// the exact value the running cost must reach when the guard ends
    expected_end: Cost,
    /// min(enclosing ceiling, start + declared cost)
    ceiling: Cost,
    operator_set: OperatorSet,
    /// the extension id node, for error payloads
    ext_node: NodePtr,
}

/// Follow a path integer into the environment. The most significant set
/// bit terminates the path; walking starts at the least significant
/// bit, descending into `first` on 0 and `rest` on 1.
fn traverse_path(allocator: &Allocator, path_node: NodePtr, env: NodePtr) -> Response {
    let path = allocator.atom(path_node);
    let path = path.as_ref();
    let mut cost = TRAVERSE_BASE_COST;

    let mut first_bit_byte_index = 0;
    while first_bit_byte_index < path.len() && path[first_bit_byte_index] == 0 {
        first_bit_byte_index += 1;
    }
    cost += first_bit_byte_index as Cost * TRAVERSE_COST_PER_ZERO_BYTE;
    if first_bit_byte_index == path.len() {
        // the zero path (including nil) lands on nil
        return Ok(Reduction(cost, NodePtr::NIL));
    }

    // the most significant set bit of the first non-zero byte ends the
    // path
    let mut end_byte_mask: u8 = 0x80;
    while path[first_bit_byte_index] & end_byte_mask == 0 {
        end_byte_mask >>= 1;
    }

    let mut arg = env;
    let mut byte_idx = path.len() - 1;
    let mut bitmask: u8 = 0x01;
    while byte_idx > first_bit_byte_index || bitmask < end_byte_mask {
        let is_bit_set = path[byte_idx] & bitmask != 0;
        arg = match allocator.sexp(arg) {
            SExp::Atom => return Err(EvalErr::PathIntoAtom(arg)),
            SExp::Pair(first, rest) => {
                if is_bit_set {
                    rest
                } else {
                    first
                }
            }
        };
        cost += TRAVERSE_COST_PER_LEG;
        if bitmask == 0x80 {
            bitmask = 0x01;
            byte_idx -= 1;
        } else {
            bitmask <<= 1;
        }
    }
    Ok(Reduction(cost, arg))
}

struct RunProgramContext<'a, D> {
    allocator: &'a mut Allocator,
    dialect: &'a D,
    val_stack: Vec<NodePtr>,
    op_stack: Vec<Operation>,
    softfork_stack: Vec<SoftforkFrame>,
    cost: Cost,
    max_cost: Cost,
}

impl<'a, D: Dialect> RunProgramContext<'a, D> {
    fn new(allocator: &'a mut Allocator, dialect: &'a D, max_cost: Cost) -> Self {
        Self {
            allocator,
            dialect,
            val_stack: Vec::new(),
            op_stack: Vec::new(),
            softfork_stack: Vec::new(),
            cost: 0,
            max_cost,
        }
    }

    fn cost_ceiling(&self) -> Cost {
        match self.softfork_stack.last() {
            Some(frame) => frame.ceiling,
            None => self.max_cost,
        }
    }

    fn operator_set(&self) -> OperatorSet {
        match self.softfork_stack.last() {
            Some(frame) => frame.operator_set,
            None => OperatorSet::Default,
        }
    }

    fn charge(&mut self, amount: Cost) -> Result<(), EvalErr> {
        self.cost = self.cost.saturating_add(amount);
        let ceiling = self.cost_ceiling();
        if self.cost > ceiling {
            // the recorded cost clamps to one past the budget
            self.cost = ceiling.saturating_add(1);
            Err(EvalErr::CostExceeded)
        } else {
            Ok(())
        }
    }

    fn push_val(&mut self, v: NodePtr) -> Result<(), EvalErr> {
        if self.val_stack.len() >= VAL_STACK_LIMIT {
            return Err(EvalErr::ValStackLimit);
        }
        self.val_stack.push(v);
        Ok(())
    }

    fn pop_val(&mut self) -> Result<NodePtr, EvalErr> {
        self.val_stack
            .pop()
            .ok_or(EvalErr::InternalError(NodePtr::NIL, "value stack empty"))
    }

    fn push_op(&mut self, op: Operation) -> Result<(), EvalErr> {
        if self.op_stack.len() >= OP_STACK_LIMIT {
            return Err(EvalErr::EnvStackLimit);
        }
        self.op_stack.push(op);
        Ok(())
    }

    fn eval(&mut self, program: NodePtr, env: NodePtr) -> Result<(), EvalErr> {
        match self.allocator.sexp(program) {
            SExp::Atom => {
                let Reduction(cost, node) = traverse_path(self.allocator, program, env)?;
                self.charge(cost)?;
                self.push_val(node)
            }
            SExp::Pair(op, args) => match self.allocator.sexp(op) {
                SExp::Pair(..) => {
                    // the operator position holds an expression; it has
                    // to reduce to an opcode atom before the call can be
                    // scheduled
                    self.push_op(Operation::EvalOpResult { args, env })?;
                    self.push_op(Operation::Eval(op, env))
                }
                SExp::Atom => self.eval_op_atom(op, args, env),
            },
        }
    }

    fn eval_op_atom(&mut self, op: NodePtr, args: NodePtr, env: NodePtr) -> Result<(), EvalErr> {
        let kw = self.allocator.small_number(op);
        if kw == Some(self.dialect.quote_kw()) {
            self.charge(QUOTE_COST)?;
            return self.push_val(args);
        }
        if kw == Some(self.dialect.apply_kw()) {
            self.charge(APPLY_COST)?;
            let [prog_expr, env_expr] =
                get_args::<2>(self.allocator, args, "a takes exactly 2 arguments")?;
            self.push_op(Operation::SwapEval)?;
            self.push_op(Operation::Eval(env_expr, env))?;
            return self.push_op(Operation::Eval(prog_expr, env));
        }

        // schedule the arguments (left to right) followed by the
        // operator application
        let mut arg_list = Vec::<NodePtr>::new();
        let mut cur = args;
        loop {
            match self.allocator.sexp(cur) {
                SExp::Pair(arg, rest) => {
                    arg_list.push(arg);
                    cur = rest;
                }
                SExp::Atom => {
                    if self.allocator.atom_len(cur) != 0 {
                        return Err(EvalErr::BadOperandList(cur));
                    }
                    break;
                }
            }
        }
        let argc = arg_list.len() as u32;
        self.push_op(Operation::Apply { op, argc })?;
        for arg in arg_list.into_iter().rev() {
            self.push_op(Operation::Eval(arg, env))?;
        }
        Ok(())
    }

    fn apply(&mut self, op: NodePtr, argc: u32) -> Result<(), EvalErr> {
        // values were pushed in evaluation order, so popping builds the
        // list back to front
        let mut args = NodePtr::NIL;
        for _ in 0..argc {
            let v = self.pop_val()?;
            args = self.allocator.new_pair(v, args)?;
        }

        if self.allocator.small_number(op) == Some(self.dialect.softfork_kw()) {
            return self.apply_softfork(args);
        }

        let remaining = self.cost_ceiling().saturating_sub(self.cost);
        let operator_set = self.operator_set();
        let Reduction(op_cost, result) =
            self.dialect
                .op(self.allocator, op, args, remaining, operator_set)?;
        self.charge(op_cost)?;
        self.push_val(result)
    }

    fn apply_softfork(&mut self, args: NodePtr) -> Result<(), EvalErr> {
        self.charge(SOFTFORK_BASE_COST)?;
        let [cost_node, ext_node, program, env] =
            get_args::<4>(self.allocator, args, "softfork takes exactly 4 arguments")?;
        let declared = uint_atom::<8>(self.allocator, cost_node, "softfork requires u64 cost")?;
        if declared == 0 {
            return Err(EvalErr::ArgType(cost_node, "softfork cost must be > 0"));
        }
        let ext = uint_atom::<4>(self.allocator, ext_node, "softfork requires u32 extension")?;

        match self.dialect.softfork_extension(ext as u32) {
            Some(operator_set) => {
                let expected_end = self.cost.saturating_add(declared);
                let ceiling = expected_end.min(self.cost_ceiling());
                self.softfork_stack.push(SoftforkFrame {
                    expected_end,
                    ceiling,
                    operator_set,
                    ext_node,
                });
                self.push_op(Operation::SoftforkEnd)?;
                self.push_op(Operation::Eval(program, env))
            }
            None => {
                if !self.dialect.allow_unknown_ops() {
                    return Err(EvalErr::UnknownSoftforkExtension(ext_node));
                }
                // future extensions still charge their declared cost,
                // so costs agree across nodes that do and don't know
                // them
                self.charge(declared)?;
                self.push_val(NodePtr::NIL)
            }
        }
    }

    fn softfork_end(&mut self) -> Result<(), EvalErr> {
        let frame = self
            .softfork_stack
            .pop()
            .ok_or(EvalErr::InternalError(NodePtr::NIL, "softfork stack empty"))?;
        if self.cost != frame.expected_end {
            return Err(EvalErr::SoftforkCostMismatch(frame.ext_node));
        }
        // the guarded program's value is discarded; the guard itself
        // yields nil
        let _inner = self.pop_val()?;
        self.push_val(NodePtr::NIL)
    }

    fn run(&mut self, program: NodePtr, env: NodePtr) -> Response {
        let mut result = self.run_inner(program, env);
        if let Err(e) = result {
            // failures inside a softfork guard surface as a softfork
            // failure with the real error preserved
            result = if self.softfork_stack.is_empty() {
                Err(e)
            } else {
                Err(EvalErr::SoftforkFailed(Box::new(e)))
            };
        }
        result
    }

    fn run_inner(&mut self, program: NodePtr, env: NodePtr) -> Response {
        self.push_op(Operation::Eval(program, env))?;
        while let Some(op) = self.op_stack.pop() {
            match op {
                Operation::Eval(program, env) => self.eval(program, env)?,
                Operation::Apply { op, argc } => self.apply(op, argc)?,
                Operation::SwapEval => {
                    let env = self.pop_val()?;
                    let program = self.pop_val()?;
                    self.push_op(Operation::Eval(program, env))?;
                }
                Operation::EvalOpResult { args, env } => {
                    let op = self.pop_val()?;
                    if let SExp::Pair(..) = self.allocator.sexp(op) {
                        return Err(EvalErr::ArgType(op, "operator must be an atom"));
                    }
                    self.eval_op_atom(op, args, env)?;
                }
                Operation::SoftforkEnd => self.softfork_end()?,
            }
        }
        let result = self.pop_val()?;
        Ok(Reduction(self.cost, result))
    }
}

/// Run a program against an environment under a cost budget. Returns
/// the total cost and the result node, or the first error.
pub fn run_program<D: Dialect>(
    allocator: &mut Allocator,
    dialect: &D,
    program: NodePtr,
    env: NodePtr,
    max_cost: Cost,
) -> Response {
    let mut ctx = RunProgramContext::new(allocator, dialect, max_cost);
    ctx.run(program, env)
}
