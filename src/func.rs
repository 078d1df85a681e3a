// rsas - an interpreter for a subset of the SAS language.
// Copyright (C) 2026 Free Software Foundation, Inc.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

//! The built-in function library.
//!
//! Function names match case-insensitively.  Domain errors (square root of a
//! negative, log of a non-positive) warn and yield the missing value rather
//! than aborting the step; a wrong argument count or an unknown function
//! aborts the step.

use crate::{
    calendar::{self, Interval},
    engine::{Engine, StepError},
    value::Value,
};

/// Calls the named built-in with already-evaluated arguments.
pub(crate) fn call(engine: &mut Engine, name: &str, args: Vec<Value>) -> Result<Value, StepError> {
    let lowered = name.to_ascii_lowercase();
    match lowered.as_str() {
        // Numeric functions.
        "sqrt" => {
            let x = one_number(engine, &lowered, &args)?;
            Ok(match x {
                Some(x) if x < 0.0 => {
                    engine.warning("Argument to SQRT is negative; result is missing.");
                    Value::missing()
                }
                Some(x) => Value::from(x.sqrt()),
                None => Value::missing(),
            })
        }
        "abs" => Ok(map_number(one_number(engine, &lowered, &args)?, f64::abs)),
        "log" => log_family(engine, &lowered, &args, f64::ln),
        "log10" => log_family(engine, &lowered, &args, f64::log10),
        "exp" => Ok(map_number(one_number(engine, &lowered, &args)?, f64::exp)),
        "ceil" => Ok(map_number(one_number(engine, &lowered, &args)?, f64::ceil)),
        "floor" => Ok(map_number(one_number(engine, &lowered, &args)?, f64::floor)),
        "round" => {
            check_arity(&lowered, &args, 1, 2)?;
            let x = number_arg(engine, &args[0]);
            let decimals = match args.get(1) {
                Some(arg) => number_arg(engine, arg).unwrap_or(0.0),
                None => 0.0,
            };
            Ok(match x {
                Some(x) => {
                    let factor = 10f64.powi(decimals as i32);
                    Value::from((x * factor).round() / factor)
                }
                None => Value::missing(),
            })
        }

        // String functions.
        "substr" => {
            check_arity(&lowered, &args, 2, 3)?;
            let s = string_arg(&args[0]);
            let pos = number_arg(engine, &args[1]).unwrap_or(0.0) as i64;
            let chars: Vec<char> = s.chars().collect();
            // SAS positions are 1-based; anything out of range yields an
            // empty string.
            if pos < 1 || pos as usize > chars.len() {
                return Ok(Value::string(""));
            }
            let start = (pos - 1) as usize;
            let len = match args.get(2) {
                Some(arg) => (number_arg(engine, arg).unwrap_or(0.0).max(0.0)) as usize,
                None => chars.len() - start,
            };
            let end = (start + len).min(chars.len());
            Ok(Value::string(&chars[start..end].iter().collect::<String>()))
        }
        "trim" | "right" => {
            check_arity(&lowered, &args, 1, 1)?;
            Ok(Value::string(string_arg(&args[0]).trim_end()))
        }
        "left" => {
            check_arity(&lowered, &args, 1, 1)?;
            Ok(Value::string(string_arg(&args[0]).trim_start()))
        }
        "upcase" => {
            check_arity(&lowered, &args, 1, 1)?;
            Ok(Value::string(&string_arg(&args[0]).to_uppercase()))
        }
        "lowcase" => {
            check_arity(&lowered, &args, 1, 1)?;
            Ok(Value::string(&string_arg(&args[0]).to_lowercase()))
        }

        // Date functions.  Dates are YYYYMMDD integers.
        "today" => {
            check_arity(&lowered, &args, 0, 0)?;
            Ok(Value::from(calendar::today()))
        }
        "intck" => {
            check_arity(&lowered, &args, 3, 3)?;
            let Interval::Day = Interval::try_from(string_arg(&args[0]).as_str())?;
            match (number_arg(engine, &args[1]), number_arg(engine, &args[2])) {
                (Some(start), Some(end)) => Ok(Value::from((end - start).trunc())),
                _ => Ok(Value::missing()),
            }
        }
        "intnx" => {
            // The optional fourth argument is an alignment, accepted and
            // ignored.
            check_arity(&lowered, &args, 3, 4)?;
            let Interval::Day = Interval::try_from(string_arg(&args[0]).as_str())?;
            match (number_arg(engine, &args[1]), number_arg(engine, &args[2])) {
                (Some(start), Some(n)) => Ok(Value::from(start + n)),
                _ => Ok(Value::missing()),
            }
        }
        "datepart" | "timepart" => {
            check_arity(&lowered, &args, 1, 1)?;
            Ok(Value::Number(number_arg(engine, &args[0])))
        }

        _ => Err(StepError::UnknownFunction(name.to_uppercase())),
    }
}

fn check_arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), StepError> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else {
        let expected: &'static str = match (min, max) {
            (0, 0) => "no",
            (1, 1) => "1",
            (1, 2) => "1 or 2",
            (2, 3) => "2 or 3",
            (3, 3) => "3",
            (3, 4) => "3 or 4",
            _ => "a different number of",
        };
        Err(StepError::WrongArgumentCount {
            name: name.to_uppercase(),
            expected,
            actual: args.len(),
        })
    }
}

fn one_number(engine: &mut Engine, name: &str, args: &[Value]) -> Result<Option<f64>, StepError> {
    check_arity(name, args, 1, 1)?;
    Ok(number_arg(engine, &args[0]))
}

/// Coerces an argument to a number, warning when a non-blank string fails
/// to convert.
fn number_arg(engine: &mut Engine, value: &Value) -> Option<f64> {
    crate::data_step::coerce_number(engine, value)
}

/// Coerces an argument to a string; numeric values use their listing form
/// and the numeric missing value becomes the empty string.
fn string_arg(value: &Value) -> String {
    match value {
        Value::Number(None) => String::new(),
        other => other.to_string(),
    }
}

fn map_number(x: Option<f64>, f: impl Fn(f64) -> f64) -> Value {
    Value::Number(x.map(f))
}

fn log_family(
    engine: &mut Engine,
    name: &str,
    args: &[Value],
    f: impl Fn(f64) -> f64,
) -> Result<Value, StepError> {
    let x = one_number(engine, name, args)?;
    Ok(match x {
        Some(x) if x <= 0.0 => {
            engine.warning(format!(
                "Argument to {} is not positive; result is missing.",
                name.to_uppercase()
            ));
            Value::missing()
        }
        Some(x) => Value::from(f(x)),
        None => Value::missing(),
    })
}
