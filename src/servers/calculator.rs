//! Calculator operations
//!
//! Basic arithmetic over finite numbers. Results are rendered as
//! `"<a> <op> <b> = <result>"`.

use crate::error::{InvocationError, RegistryError};
use crate::mcp::registry::{OperationDefinition, OperationRegistry};
use crate::mcp::schema::{FieldKind, InputSchema};
use crate::mcp::validate::Arguments;

pub const SERVER_NAME: &str = "calculator-server";
pub const SERVER_VERSION: &str = "1.0.0";

/// Build the calculator catalog
pub fn registry() -> Result<OperationRegistry, RegistryError> {
    OperationRegistry::with_operations([
        binary("add", "Add two numbers", ("First number", "Second number"), |a, b| {
            Ok(format!("{} + {} = {}", fmt(a), fmt(b), fmt(a + b)))
        }),
        binary("subtract", "Subtract two numbers", ("First number", "Second number"), |a, b| {
            Ok(format!("{} - {} = {}", fmt(a), fmt(b), fmt(a - b)))
        }),
        binary("multiply", "Multiply two numbers", ("First number", "Second number"), |a, b| {
            Ok(format!("{} × {} = {}", fmt(a), fmt(b), fmt(a * b)))
        }),
        binary("divide", "Divide two numbers", ("Dividend", "Divisor"), divide),
        OperationDefinition::new(
            "power",
            "Raise a number to a power",
            InputSchema::new()
                .required("base", FieldKind::Number, "Base number")
                .required("exponent", FieldKind::Number, "Exponent"),
            |args: Arguments| async move {
                let base = args.number("base")?;
                let exponent = args.number("exponent")?;
                Ok(format!(
                    "{}^{} = {}",
                    fmt(base),
                    fmt(exponent),
                    fmt(base.powf(exponent))
                ))
            },
        ),
        OperationDefinition::new(
            "sqrt",
            "Calculate square root of a number",
            InputSchema::new().required(
                "number",
                FieldKind::Number,
                "Number to calculate square root of",
            ),
            |args: Arguments| async move { sqrt(args.number("number")?) },
        ),
    ])
}

type BinaryFn = fn(f64, f64) -> Result<String, InvocationError>;

/// Two-operand operation over fields `a` and `b`
fn binary(
    name: &str,
    description: &str,
    (a_desc, b_desc): (&str, &str),
    op: BinaryFn,
) -> OperationDefinition {
    OperationDefinition::new(
        name,
        description,
        InputSchema::new()
            .required("a", FieldKind::Number, a_desc)
            .required("b", FieldKind::Number, b_desc),
        move |args: Arguments| async move { op(args.number("a")?, args.number("b")?) },
    )
}

fn divide(a: f64, b: f64) -> Result<String, InvocationError> {
    if b == 0.0 {
        return Err(InvocationError::domain("Division by zero is not allowed"));
    }
    Ok(format!("{} ÷ {} = {}", fmt(a), fmt(b), fmt(a / b)))
}

fn sqrt(n: f64) -> Result<String, InvocationError> {
    if n < 0.0 {
        return Err(InvocationError::domain(
            "Cannot calculate square root of negative number",
        ));
    }
    Ok(format!("√{} = {}", fmt(n), fmt(n.sqrt())))
}

fn fmt(value: f64) -> String {
    format_number(value)
}

/// Render a number the way a JavaScript host prints it.
///
/// Integral values carry no fraction, `-0` prints as `0`, and magnitudes at or
/// above `1e21` or below `1e-6` switch to exponent notation with an explicit
/// sign (`1e+21`, `1.5e-7`).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let rendered = format!("{value:e}");
        return match rendered.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => rendered,
        };
    }

    format!("{value}")
}
