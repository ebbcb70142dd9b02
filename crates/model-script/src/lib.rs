//! The pluggable model builder: user-authored procedural CAD source is
//! executed against a kernel to produce a solid.
//!
//! The evaluation boundary is deliberately narrow: a [`ModelBuilder`] takes
//! a kernel and a source string and returns a solid handle or an error, and
//! everything it does stays inside the worker that called it. The default
//! implementation, [`ScriptBuilder`], interprets a small procedural language:
//!
//! ```text
//! // plate with a hole
//! let plate = box(20, 20, 3);
//! let hole = cylinder(4, 5);
//! difference(plate, translate(hole, 10, 10, -1))
//! ```
//!
//! Builtins: `box(dx, dy, dz)`, `cylinder(r, h)`, `sphere(r)`,
//! `translate(s, x, y, z)`, `rotate(s, ax, ay, az, degrees)`,
//! `union(a, b)`, `difference(a, b)`, `intersection(a, b)`.
//! The program's value is its final expression (or final `let` binding).

pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use error::ScriptError;
pub use eval::{ModelBuilder, ScriptBuilder};
