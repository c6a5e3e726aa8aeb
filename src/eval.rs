//! Tree-walking evaluator.

use std::io;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::ast::{BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::env::Environment;
use crate::value::{Callable, NativeFunction, Value};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Undefined variable '{0}'")]
    UndefinedVariable(String),
    #[error("Operands must be numbers for {0}")]
    NumberOperands(BinaryOp),
    #[error("Operand must be a number for {0}")]
    NumberOperand(UnaryOp),
    #[error("Operands must be two numbers or two strings")]
    AddOperands,
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Can only call functions")]
    NotCallable,
    #[error("Expected {expected} arguments but got {got}")]
    Arity { expected: usize, got: usize },
    #[error("{name}() requires a number argument")]
    NativeNumberArgument { name: &'static str },
    #[error("return outside function")]
    ReturnOutsideFunction,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Outcome of executing a statement.
///
/// `Return` carries a `return` value upward through blocks and loops until a
/// user-function invocation consumes it; this is the only non-local control
/// transfer in the language.
#[derive(Debug)]
enum Flow {
    Normal,
    Return(Value),
}

#[derive(Debug)]
pub struct Evaluator<'a, W: Write> {
    output: &'a mut W,
    globals: Rc<Environment>,
}

impl<'a, W: Write> Evaluator<'a, W> {
    /// Create an evaluator writing `print` output to `output`, with a fresh
    /// global scope holding the native library.
    pub fn new(output: &'a mut W) -> Evaluator<'a, W> {
        let globals = Environment::new();
        define_native(&globals, "clock", 0, native_clock);
        define_native(&globals, "sqrt", 1, native_sqrt);
        define_native(&globals, "abs", 1, native_abs);
        Evaluator { output, globals }
    }

    /// Execute a program in the global scope.  Globals persist across calls,
    /// so a REPL can feed programs one line at a time.
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        for stmt in &program.statements {
            if let Flow::Return(_) = self.exec_stmt(stmt, self.globals.clone())? {
                return Err(RuntimeError::ReturnOutsideFunction);
            }
        }
        Ok(())
    }

    fn exec_block(&mut self, stmts: &[Stmt], env: Rc<Environment>) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            match self.exec_stmt(stmt, env.clone())? {
                Flow::Normal => (),
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: Rc<Environment>) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Expr(e) => {
                self.eval_expr(e, env)?;
                Ok(Flow::Normal)
            }
            Stmt::Print(e) => {
                let value = self.eval_expr(e, env)?;
                writeln!(self.output, "{}", value)?;
                Ok(Flow::Normal)
            }
            Stmt::Let(name, initializer) => {
                let value = match initializer {
                    Some(e) => self.eval_expr(e, env.clone())?,
                    None => Value::Nil,
                };
                env.define(name, value);
                Ok(Flow::Normal)
            }
            Stmt::Function(decl) => {
                // The closure is the environment current at declaration time.
                let function = Callable::Function(decl.clone(), env.clone());
                env.define(&decl.name, Value::Callable(function));
                Ok(Flow::Normal)
            }
            Stmt::Block(stmts) => self.exec_block(stmts, Environment::with_enclosing(Some(env))),
            Stmt::If(condition, then_branch, else_branch) => {
                if self.eval_expr(condition, env.clone())?.is_truthy() {
                    self.exec_stmt(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.exec_stmt(else_branch, env)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While(condition, body) => {
                while self.eval_expr(condition, env.clone())?.is_truthy() {
                    if let flow @ Flow::Return(_) = self.exec_stmt(body, env.clone())? {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(e) => self.eval_expr(e, env)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }
        }
    }

    fn eval_expr(&mut self, expr: &Expr, env: Rc<Environment>) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Identifier(name) => env.get(name),
            Expr::Assign(name, rhs) => {
                let value = self.eval_expr(rhs, env.clone())?;
                env.assign(name, value.clone())?;
                Ok(value)
            }
            Expr::Unary(op, operand) => {
                let value = self.eval_expr(operand, env)?;
                match op {
                    UnaryOp::Neg => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::NumberOperand(*op)),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                }
            }
            Expr::Binary(lhs, op, rhs) => {
                let left = self.eval_expr(lhs, env.clone())?;
                let right = self.eval_expr(rhs, env)?;
                eval_binary(*op, left, right)
            }
            Expr::Call(callee, args) => {
                let callee = self.eval_expr(callee, env.clone())?;
                let mut arguments = Vec::with_capacity(args.len());
                for arg in args {
                    arguments.push(self.eval_expr(arg, env.clone())?);
                }
                self.call(callee, arguments)
            }
        }
    }

    fn call(&mut self, callee: Value, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        let Value::Callable(callable) = callee else {
            return Err(RuntimeError::NotCallable);
        };
        if arguments.len() != callable.arity() {
            return Err(RuntimeError::Arity {
                expected: callable.arity(),
                got: arguments.len(),
            });
        }

        match callable {
            Callable::Native(native) => (native.func)(&arguments),
            Callable::Function(decl, closure) => {
                // Parameters and body share one frame whose parent is the
                // closure, not the caller's environment.
                let frame = Environment::with_enclosing(Some(closure));
                for (param, argument) in decl.params.iter().zip(arguments) {
                    frame.define(param, argument);
                }
                match self.exec_block(&decl.body, frame)? {
                    Flow::Return(value) => Ok(value),
                    Flow::Normal => Ok(Value::Nil),
                }
            }
        }
    }
}

fn eval_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
            (Value::Str(l), Value::Str(r)) => Ok(Value::Str(format!("{}{}", l, r).into())),
            _ => Err(RuntimeError::AddOperands),
        },
        BinaryOp::Sub => {
            let (l, r) = number_operands(op, left, right)?;
            Ok(Value::Number(l - r))
        }
        BinaryOp::Mul => {
            let (l, r) = number_operands(op, left, right)?;
            Ok(Value::Number(l * r))
        }
        BinaryOp::Div => {
            let (l, r) = number_operands(op, left, right)?;
            if r == 0.0 {
                Err(RuntimeError::DivisionByZero)
            } else {
                Ok(Value::Number(l / r))
            }
        }
        BinaryOp::Mod => {
            let (l, r) = number_operands(op, left, right)?;
            Ok(Value::Number(l % r))
        }
        BinaryOp::Less => {
            let (l, r) = number_operands(op, left, right)?;
            Ok(Value::Bool(l < r))
        }
        BinaryOp::LessEqual => {
            let (l, r) = number_operands(op, left, right)?;
            Ok(Value::Bool(l <= r))
        }
        BinaryOp::Greater => {
            let (l, r) = number_operands(op, left, right)?;
            Ok(Value::Bool(l > r))
        }
        BinaryOp::GreaterEqual => {
            let (l, r) = number_operands(op, left, right)?;
            Ok(Value::Bool(l >= r))
        }
        BinaryOp::Equal => Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => Ok(Value::Bool(left != right)),
        // Both operands are already evaluated; the operator picks one of the
        // operand values by the truthiness of the left.
        BinaryOp::And => Ok(if left.is_truthy() { right } else { left }),
        BinaryOp::Or => Ok(if left.is_truthy() { left } else { right }),
    }
}

fn number_operands(op: BinaryOp, left: Value, right: Value) -> Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok((l, r)),
        _ => Err(RuntimeError::NumberOperands(op)),
    }
}

fn define_native(
    globals: &Rc<Environment>,
    name: &'static str,
    arity: usize,
    func: fn(&[Value]) -> Result<Value, RuntimeError>,
) {
    globals.define(
        name,
        Value::Callable(Callable::Native(NativeFunction { name, arity, func })),
    );
}

fn native_clock(_args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_secs_f64(),
    ))
}

fn native_sqrt(args: &[Value]) -> Result<Value, RuntimeError> {
    match args[0] {
        Value::Number(n) => Ok(Value::Number(n.sqrt())),
        _ => Err(RuntimeError::NativeNumberArgument { name: "sqrt" }),
    }
}

fn native_abs(args: &[Value]) -> Result<Value, RuntimeError> {
    match args[0] {
        Value::Number(n) => Ok(Value::Number(n.abs())),
        _ => Err(RuntimeError::NativeNumberArgument { name: "abs" }),
    }
}
