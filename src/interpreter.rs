use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use log::debug;

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::function::LoxFunction;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Non-local exit out of statement execution: either a runtime failure or a
/// `return` travelling back to the nearest enclosing call. Keeping the two
/// in one enum lets `?` unwind both through arbitrary block nesting, while
/// the call boundary in `LoxFunction::call` intercepts only `Return`.
#[derive(Debug)]
pub enum Unwind {
    Return(Value),
    Error(LoxError),
}

impl From<LoxError> for Unwind {
    fn from(err: LoxError) -> Self {
        Unwind::Error(err)
    }
}

pub struct Interpreter<W: Write> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    // Binding depth per variable-bearing expression, filled by the resolver.
    // A missing entry means the name is global.
    locals: HashMap<ExprId, usize>,
    output: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(output: W) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Record a local binding distance for a resolved expression. Called by
    /// the resolver; unresolved expressions stay out of the table.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    pub fn locals(&self) -> &HashMap<ExprId, usize> {
        &self.locals
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run a whole program. The first runtime error aborts execution and is
    /// returned; `print` output has already been written up to that point.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        for statement in statements {
            match self.execute(statement) {
                Ok(()) => {}

                Err(Unwind::Error(err)) => return Err(err),

                Err(Unwind::Return(_)) => {
                    debug!("return escaped to top level; resolver rejects this statically");
                    break;
                }
            }
        }

        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> std::result::Result<(), Unwind> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value).map_err(LoxError::from)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = if let Some(expr) = initializer {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(declaration) => {
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Unwind::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    /// Run `statements` in `environment`, restoring the previous environment
    /// on every exit path.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> std::result::Result<(), Unwind> {
        let previous = std::mem::replace(&mut self.environment, environment);

        for statement in statements {
            if let Err(unwind) = self.execute(statement) {
                self.environment = previous;
                return Err(unwind);
            }
        }

        self.environment = previous;

        Ok(())
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> std::result::Result<(), Unwind> {
        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),

                _ => {
                    let token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };
                    return Err(LoxError::runtime(token, "superclass must be a class.").into());
                }
            },

            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // Methods of a subclass close over one extra scope holding `super`.
        if let Some(class) = &superclass_value {
            let enclosed = Environment::with_enclosing(Rc::clone(&self.environment));
            self.environment = Rc::new(RefCell::new(enclosed));
            self.environment
                .borrow_mut()
                .define("super", Value::Class(Rc::clone(class)));
        }

        let mut method_table: HashMap<String, LoxFunction> = HashMap::new();
        for method in methods {
            let is_initializer = method.name.lexeme == "init";
            let function =
                LoxFunction::new(Rc::clone(method), Rc::clone(&self.environment), is_initializer);
            method_table.insert(method.name.lexeme.clone(), function);
        }

        let class = Value::Class(Rc::new(LoxClass::new(
            name.lexeme.clone(),
            superclass_value.clone(),
            method_table,
        )));

        if superclass_value.is_some() {
            let enclosing = self
                .environment
                .borrow()
                .enclosing()
                .expect("super scope always has an enclosing environment");
            self.environment = enclosing;
        }

        self.environment.borrow_mut().assign(name, class)?;

        Ok(())
    }

    pub fn evaluate(&mut self, expr: &Expr) -> std::result::Result<Value, Unwind> {
        match expr {
            Expr::Literal { value } => Ok(self.evaluate_literal(value)?),

            Expr::Grouping { expr } => self.evaluate(expr),

            Expr::Unary { op, right } => {
                let right = self.evaluate(right)?;
                Ok(self.evaluate_unary(op, right)?)
            }

            Expr::Binary { left, op, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(self.evaluate_binary(left, op, right)?)
            }

            Expr::Logical { left, op, right } => {
                let left_val = self.evaluate(left)?;

                match op.token_type {
                    TokenType::OR => {
                        if is_truthy(&left_val) {
                            Ok(left_val)
                        } else {
                            self.evaluate(right)
                        }
                    }

                    _ => {
                        if !is_truthy(&left_val) {
                            Ok(left_val)
                        } else {
                            self.evaluate(right)
                        }
                    }
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(name, id),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(
                            &self.environment,
                            distance,
                            &name.lexeme,
                            value.clone(),
                        );
                    }

                    None => {
                        self.globals.borrow_mut().assign(name, value.clone())?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                match callee_value {
                    Value::Function(function) => {
                        self.check_arity(function.arity(), args.len(), paren)?;
                        function.call(self, args)
                    }

                    Value::Class(class) => {
                        self.check_arity(class.arity(), args.len(), paren)?;
                        LoxClass::call(&class, self, args)
                    }

                    _ => Err(
                        LoxError::runtime(paren, "can only call functions and classes.").into(),
                    ),
                }
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Ok(LoxInstance::get(&instance, name)?),

                _ => Err(LoxError::runtime(name, "only instances have properties.").into()),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        let value = self.evaluate(value)?;
                        instance.borrow_mut().set(name, value.clone());
                        Ok(value)
                    }

                    _ => Err(LoxError::runtime(name, "only instances have fields.").into()),
                }
            }

            Expr::This { id, keyword } => self.look_up_variable(keyword, id),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(id, keyword, method),
        }
    }

    fn evaluate_literal(&self, token: &Token) -> Result<Value> {
        match &token.token_type {
            TokenType::NUMBER(n) => Ok(Value::Number(*n)),

            TokenType::STRING(s) => Ok(Value::String(s.clone())),

            TokenType::TRUE => Ok(Value::Bool(true)),

            TokenType::FALSE => Ok(Value::Bool(false)),

            TokenType::NIL => Ok(Value::Nil),

            _ => Err(LoxError::runtime(token, "invalid literal.")),
        }
    }

    fn evaluate_unary(&self, op: &Token, right: Value) -> Result<Value> {
        match op.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(op, "operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&right))),

            _ => Err(LoxError::runtime(op, "invalid unary operator.")),
        }
    }

    fn evaluate_binary(&self, left: Value, op: &Token, right: Value) -> Result<Value> {
        match op.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(LoxError::runtime(
                    op,
                    "operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(LoxError::runtime(op, "operands must be numbers.")),
            },

            TokenType::STAR => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(LoxError::runtime(op, "operands must be numbers.")),
            },

            TokenType::SLASH => match (left, right) {
                // IEEE semantics: dividing by zero yields an infinity
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),

                _ => Err(LoxError::runtime(op, "operands must be numbers.")),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            TokenType::LESS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(LoxError::runtime(op, "operands must be numbers.")),
            },

            TokenType::LESS_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(LoxError::runtime(op, "operands must be numbers.")),
            },

            TokenType::GREATER => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(LoxError::runtime(op, "operands must be numbers.")),
            },

            TokenType::GREATER_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(LoxError::runtime(op, "operands must be numbers.")),
            },

            _ => Err(LoxError::runtime(op, "invalid binary operator.")),
        }
    }

    fn evaluate_super(
        &mut self,
        id: &ExprId,
        keyword: &Token,
        method: &Token,
    ) -> std::result::Result<Value, Unwind> {
        let distance = match self.locals.get(id) {
            Some(&distance) => distance,

            None => {
                return Err(LoxError::runtime(keyword, "undefined variable 'super'.").into());
            }
        };

        let superclass = match Environment::get_at(&self.environment, distance, "super") {
            Some(Value::Class(class)) => class,

            _ => return Err(LoxError::runtime(keyword, "undefined variable 'super'.").into()),
        };

        // `this` lives one scope inside the `super` scope.
        let object = match Environment::get_at(&self.environment, distance - 1, "this") {
            Some(Value::Instance(instance)) => instance,

            _ => return Err(LoxError::runtime(keyword, "undefined variable 'this'.").into()),
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(object)))),

            None => Err(LoxError::runtime(
                method,
                format!("undefined property '{}'.", method.lexeme),
            )
            .into()),
        }
    }

    fn look_up_variable(
        &self,
        name: &Token,
        id: &ExprId,
    ) -> std::result::Result<Value, Unwind> {
        match self.locals.get(id) {
            Some(&distance) => {
                match Environment::get_at(&self.environment, distance, &name.lexeme) {
                    Some(value) => Ok(value),

                    None => Err(LoxError::runtime(
                        name,
                        format!("undefined variable '{}'.", name.lexeme),
                    )
                    .into()),
                }
            }

            None => Ok(self.globals.borrow().get(name)?),
        }
    }

    fn check_arity(&self, arity: usize, got: usize, paren: &Token) -> Result<()> {
        if arity == got {
            Ok(())
        } else {
            Err(LoxError::runtime(
                paren,
                format!("expected {} arguments but got {}.", arity, got),
            ))
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}
