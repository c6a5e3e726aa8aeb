//! API to control the interpreter.

use std::io::Write;

use thiserror::Error;

use crate::eval::Evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;

pub use crate::eval::RuntimeError;

/// Errors the interpreter can raise.
///
/// Lexical and syntactic diagnostics are reported on stderr as they are
/// encountered; `Parse` only surfaces when nothing at all could be parsed.
#[derive(Debug, Error)]
pub enum FluxError {
    #[error("Parsing failed")]
    Parse,
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

/// Tree-walking interpreter for Flux.
///
/// Global bindings persist across `run` calls, so the same instance can
/// serve a REPL one line at a time:
///
/// ```
/// # use flux::interpreter::{FluxError, Interpreter};
/// let mut output: Vec<u8> = Vec::new();
/// let mut interp = Interpreter::new(&mut output);
///
/// let source = r#"
///     fun max(x, y) {
///         if (x > y) {
///             return x
///         } else {
///             return y
///         }
///     }
/// "#;
/// interp.run(source)?;
///
/// interp.run("print max(10, 20)")?;
/// interp.run("print max(5, 4)")?;
///
/// assert_eq!(output, b"20\n5\n");
/// # Ok::<(), FluxError>(())
/// ```
#[derive(Debug)]
pub struct Interpreter<'a, W: Write> {
    evaluator: Evaluator<'a, W>,
}

impl<'a, W: Write> Interpreter<'a, W> {
    pub fn new(output: &'a mut W) -> Interpreter<'a, W> {
        Interpreter {
            evaluator: Evaluator::new(output),
        }
    }

    /// Run `source` as a complete program against the persistent globals.
    pub fn run(&mut self, source: &str) -> Result<(), FluxError> {
        let tokens = Lexer::new(source).tokenize();
        let program = Parser::new(tokens).parse().ok_or(FluxError::Parse)?;
        self.evaluator.run(&program)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpret(source: &str) -> Result<String, FluxError> {
        let mut raw_output: Vec<u8> = Vec::new();
        let mut interp = Interpreter::new(&mut raw_output);
        interp.run(source)?;
        let output = String::from_utf8(raw_output).expect("cannot convert output to string");
        Ok(output)
    }

    #[test]
    fn arithmetic_precedence() -> Result<(), FluxError> {
        assert_eq!(interpret("print 1 + 2 * 3")?, "7\n");
        Ok(())
    }

    #[test]
    fn variables() -> Result<(), FluxError> {
        assert_eq!(interpret("let a = 1; let b = 2; print a + b")?, "3\n");
        Ok(())
    }

    #[test]
    fn fibonacci() -> Result<(), FluxError> {
        assert_eq!(
            interpret(
                "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(10)"
            )?,
            "55\n"
        );
        Ok(())
    }

    #[test]
    fn counter_closure() -> Result<(), FluxError> {
        let source = "fun make() { let x = 0; fun inc() { x = x + 1; return x } return inc } \
                      let c = make(); print c(); print c(); print c()";
        assert_eq!(interpret(source)?, "1\n2\n3\n");
        Ok(())
    }

    #[test]
    fn string_concatenation() -> Result<(), FluxError> {
        assert_eq!(interpret("print \"a\" + \"b\"")?, "ab\n");
        Ok(())
    }

    #[test]
    fn mixed_addition_reports_operand_error() {
        match interpret("print \"a\" + 1") {
            Err(e @ FluxError::Runtime(RuntimeError::AddOperands)) => {
                assert_eq!(
                    e.to_string(),
                    "Runtime error: Operands must be two numbers or two strings"
                );
            }
            out => panic!("unexpected output: {:?}", out),
        }
    }

    #[test]
    fn logical_operators_return_values() -> Result<(), FluxError> {
        assert_eq!(interpret("print nil or \"x\"")?, "x\n");
        assert_eq!(interpret("print 0 and \"y\"")?, "y\n");
        Ok(())
    }

    #[test]
    fn while_loop() -> Result<(), FluxError> {
        assert_eq!(
            interpret("let i = 0; while (i < 3) { print i; i = i + 1 }")?,
            "0\n1\n2\n"
        );
        Ok(())
    }

    #[test]
    fn division_by_zero_reports_runtime_error() {
        match interpret("print 1 / 0") {
            Err(e @ FluxError::Runtime(RuntimeError::DivisionByZero)) => {
                assert_eq!(e.to_string(), "Runtime error: Division by zero");
            }
            out => panic!("unexpected output: {:?}", out),
        }
    }

    #[test]
    fn globals_survive_a_runtime_error() -> Result<(), FluxError> {
        let mut raw_output: Vec<u8> = Vec::new();
        let mut interp = Interpreter::new(&mut raw_output);
        interp.run("let x = 1")?;
        assert!(interp.run("print missing").is_err());
        interp.run("print x")?;
        assert_eq!(String::from_utf8(raw_output).unwrap(), "1\n");
        Ok(())
    }

    #[test]
    fn unparsable_source_is_parsing_failed() {
        match interpret("(") {
            Err(e @ FluxError::Parse) => assert_eq!(e.to_string(), "Parsing failed"),
            out => panic!("unexpected output: {:?}", out),
        }
    }

    #[test]
    fn scope_shadowing_round_trip() -> Result<(), FluxError> {
        assert_eq!(
            interpret("let x = \"outer\"; { let x = \"inner\"; print x } print x")?,
            "inner\nouter\n"
        );
        Ok(())
    }

    #[test]
    fn number_stringification_round_trips() -> Result<(), FluxError> {
        let mut raw_output: Vec<u8> = Vec::new();
        let mut interp = Interpreter::new(&mut raw_output);
        interp.run("print 0.1 + 0.2")?;
        let printed = String::from_utf8(raw_output).unwrap();
        let mut echo_output: Vec<u8> = Vec::new();
        let mut echo = Interpreter::new(&mut echo_output);
        echo.run(&format!("print {}", printed.trim()))?;
        assert_eq!(echo_output, printed.as_bytes());
        Ok(())
    }
}
