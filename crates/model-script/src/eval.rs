//! Evaluator: runs a parsed program against a kernel.

use std::collections::HashMap;

use kernel_host::{Kernel, SolidHandle};

use crate::error::{Position, ScriptError};
use crate::parser::{parse, Expr, Program, Statement};

/// The model-builder boundary: source text in, one solid out.
///
/// Implementations execute arbitrary caller-provided source, so everything
/// they do must stay contained in the worker that called them. The only
/// contract with the source is "produces a solid, or fails".
pub trait ModelBuilder {
    fn build(&self, kernel: &mut dyn Kernel, source: &str) -> Result<SolidHandle, ScriptError>;
}

/// The default model builder: interprets the camber model language.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptBuilder;

impl ScriptBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl ModelBuilder for ScriptBuilder {
    fn build(&self, kernel: &mut dyn Kernel, source: &str) -> Result<SolidHandle, ScriptError> {
        let program = parse(source)?;
        Evaluator::new(kernel).run(&program)
    }
}

/// A runtime value: a solid handle or a number.
#[derive(Debug, Clone, Copy)]
enum Value {
    Solid(SolidHandle),
    Number(f64),
}

struct Evaluator<'k> {
    kernel: &'k mut dyn Kernel,
    env: HashMap<String, Value>,
    /// Every solid created while evaluating; intermediates are released once
    /// the result is known so only the returned solid survives the build.
    created: Vec<SolidHandle>,
}

impl<'k> Evaluator<'k> {
    fn new(kernel: &'k mut dyn Kernel) -> Self {
        Self {
            kernel,
            env: HashMap::new(),
            created: Vec::new(),
        }
    }

    fn run(mut self, program: &Program) -> Result<SolidHandle, ScriptError> {
        let mut last: Option<Value> = None;
        for statement in &program.statements {
            match statement {
                Statement::Let { name, value } => {
                    let v = self.eval(value)?;
                    self.env.insert(name.clone(), v);
                    last = Some(v);
                }
                Statement::Expr(expr) => {
                    last = Some(self.eval(expr)?);
                }
            }
        }

        let result = match last {
            Some(Value::Solid(handle)) => handle,
            _ => {
                self.release_created(None);
                return Err(ScriptError::NoSolid);
            }
        };
        self.release_created(Some(result));
        Ok(result)
    }

    fn release_created(&mut self, keep: Option<SolidHandle>) {
        for handle in self.created.drain(..) {
            if Some(handle) != keep {
                self.kernel.release(handle);
            }
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
        match expr {
            Expr::Number { value, .. } => Ok(Value::Number(*value)),
            Expr::Name { name, pos } => {
                self.env
                    .get(name)
                    .copied()
                    .ok_or_else(|| ScriptError::UnboundName {
                        pos: *pos,
                        name: name.clone(),
                    })
            }
            Expr::Call { name, args, pos } => self.call(name, args, *pos),
        }
    }

    fn call(&mut self, name: &str, args: &[Expr], pos: Position) -> Result<Value, ScriptError> {
        let values: Vec<Value> = args
            .iter()
            .map(|a| self.eval(a))
            .collect::<Result<_, _>>()?;

        let handle = match name {
            "box" => {
                let [dx, dy, dz] = self.numbers::<3>(name, &values, pos)?;
                self.kernel.make_box(dx, dy, dz)?
            }
            "cylinder" => {
                let [r, h] = self.numbers::<2>(name, &values, pos)?;
                self.kernel.make_cylinder(r, h)?
            }
            "sphere" => {
                let [r] = self.numbers::<1>(name, &values, pos)?;
                self.kernel.make_sphere(r)?
            }
            "translate" => {
                self.arity(name, &values, 4, pos)?;
                let solid = self.solid_arg(name, &values, 0, pos)?;
                let x = self.number_arg(name, &values, 1, pos)?;
                let y = self.number_arg(name, &values, 2, pos)?;
                let z = self.number_arg(name, &values, 3, pos)?;
                self.kernel.translate(&solid, [x, y, z])?
            }
            "rotate" => {
                self.arity(name, &values, 5, pos)?;
                let solid = self.solid_arg(name, &values, 0, pos)?;
                let ax = self.number_arg(name, &values, 1, pos)?;
                let ay = self.number_arg(name, &values, 2, pos)?;
                let az = self.number_arg(name, &values, 3, pos)?;
                let degrees = self.number_arg(name, &values, 4, pos)?;
                self.kernel
                    .rotate(&solid, [0.0; 3], [ax, ay, az], degrees.to_radians())?
            }
            "union" => {
                self.arity(name, &values, 2, pos)?;
                let a = self.solid_arg(name, &values, 0, pos)?;
                let b = self.solid_arg(name, &values, 1, pos)?;
                self.kernel.boolean_union(&a, &b)?
            }
            "difference" => {
                self.arity(name, &values, 2, pos)?;
                let a = self.solid_arg(name, &values, 0, pos)?;
                let b = self.solid_arg(name, &values, 1, pos)?;
                self.kernel.boolean_subtract(&a, &b)?
            }
            "intersection" => {
                self.arity(name, &values, 2, pos)?;
                let a = self.solid_arg(name, &values, 0, pos)?;
                let b = self.solid_arg(name, &values, 1, pos)?;
                self.kernel.boolean_intersect(&a, &b)?
            }
            _ => {
                return Err(ScriptError::UnknownFunction {
                    pos,
                    name: name.to_string(),
                });
            }
        };

        self.created.push(handle);
        Ok(Value::Solid(handle))
    }

    fn arity(
        &self,
        name: &str,
        values: &[Value],
        expected: usize,
        pos: Position,
    ) -> Result<(), ScriptError> {
        if values.len() != expected {
            return Err(ScriptError::Arity {
                pos,
                name: name.to_string(),
                expected,
                got: values.len(),
            });
        }
        Ok(())
    }

    fn numbers<const N: usize>(
        &self,
        name: &str,
        values: &[Value],
        pos: Position,
    ) -> Result<[f64; N], ScriptError> {
        self.arity(name, values, N, pos)?;
        let mut out = [0.0; N];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.number_arg(name, values, i, pos)?;
        }
        Ok(out)
    }

    fn number_arg(
        &self,
        name: &str,
        values: &[Value],
        index: usize,
        pos: Position,
    ) -> Result<f64, ScriptError> {
        match values[index] {
            Value::Number(n) => Ok(n),
            Value::Solid(_) => Err(ScriptError::ArgumentType {
                pos,
                name: name.to_string(),
                index: index + 1,
                expected: "number",
            }),
        }
    }

    fn solid_arg(
        &self,
        name: &str,
        values: &[Value],
        index: usize,
        pos: Position,
    ) -> Result<SolidHandle, ScriptError> {
        match values[index] {
            Value::Solid(handle) => Ok(handle),
            Value::Number(_) => Err(ScriptError::ArgumentType {
                pos,
                name: name.to_string(),
                index: index + 1,
                expected: "solid",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camber_types::MeshQuality;
    use kernel_host::{extract_mesh, MockKernel};

    fn build(source: &str) -> Result<(MockKernel, SolidHandle), ScriptError> {
        let mut kernel = MockKernel::new();
        let handle = ScriptBuilder::new().build(&mut kernel, source)?;
        Ok((kernel, handle))
    }

    #[test]
    fn builds_a_unit_cube() {
        let (mut kernel, handle) = build("box(1, 1, 1)").unwrap();
        let faces = kernel.triangulate(&handle, &MeshQuality::default()).unwrap();
        let mesh = extract_mesh(&faces).unwrap();
        assert_eq!(mesh.positions.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
    }

    #[test]
    fn let_bindings_and_final_name() {
        let (_, handle) = build("let b = box(1, 2, 3);\nb").unwrap();
        let (_, direct) = build("box(1, 2, 3)").unwrap();
        // Both programs end at the same handle id in a fresh kernel.
        assert_eq!(handle, direct);
    }

    #[test]
    fn nested_difference_keeps_only_result() {
        let source = "\
let plate = box(20, 20, 3);
let hole = cylinder(4, 5);
difference(plate, translate(hole, 10, 10, -1))";
        let (mut kernel, handle) = build(source).unwrap();
        // Intermediates were released; the result still resolves.
        assert!(kernel.triangulate(&handle, &MeshQuality::default()).is_ok());
    }

    #[test]
    fn numeric_bindings_are_allowed_midway() {
        // A number can be bound, but the program must end in a solid.
        let (_, handle) = build("let r = 2;\nsphere(2)").unwrap();
        let _ = handle;
    }

    #[test]
    fn number_result_is_no_solid() {
        assert!(matches!(build("42"), Err(ScriptError::NoSolid)));
    }

    #[test]
    fn empty_program_is_no_solid() {
        assert!(matches!(build(""), Err(ScriptError::NoSolid)));
    }

    #[test]
    fn unknown_function_is_reported() {
        assert!(matches!(
            build("torus(1, 2)"),
            Err(ScriptError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn unbound_name_is_reported() {
        assert!(matches!(
            build("union(a, box(1, 1, 1))"),
            Err(ScriptError::UnboundName { .. })
        ));
    }

    #[test]
    fn wrong_arity_is_reported() {
        assert!(matches!(
            build("box(1, 1)"),
            Err(ScriptError::Arity { expected: 3, got: 2, .. })
        ));
    }

    #[test]
    fn solid_where_number_expected_is_reported() {
        assert!(matches!(
            build("box(sphere(1), 1, 1)"),
            Err(ScriptError::ArgumentType { .. })
        ));
    }

    #[test]
    fn kernel_errors_propagate() {
        assert!(matches!(
            build("box(-1, 1, 1)"),
            Err(ScriptError::Kernel(_))
        ));
    }

    #[test]
    fn rotate_takes_degrees() {
        let (mut kernel, handle) =
            build("rotate(box(1, 1, 1), 0, 0, 1, 90)").unwrap();
        let faces = kernel.triangulate(&handle, &MeshQuality::default()).unwrap();
        // Node (1, 0, 0) lands on (0, 1, 0) after a quarter turn.
        let node = faces[0].nodes[1];
        assert!((node[0]).abs() < 1e-9);
        assert!((node[1] - 1.0).abs() < 1e-9);
    }
}
