//! Per-instruction kernels. Element-wise kernels fan out over rows with rayon.
use crate::compute::bytecode::OpCode;
use crate::compute::ledger::ComputeError;
use crate::store::types::midnight;
use crate::store::Scalar;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Executes a two-operand instruction over full registers.
pub fn execute_binary(
    op: OpCode,
    left: &[Scalar],
    right: &[Scalar],
) -> Result<Vec<Scalar>, ComputeError> {
    left.par_iter()
        .zip(right.par_iter())
        .map(|(a, b)| match op {
            OpCode::Sub => subtract(a, b),
            OpCode::Lt => compare(a, b, "<").map(|o| o.map_or(Scalar::Null, |o| Scalar::Boolean(o.is_lt()))),
            OpCode::LtEq => compare(a, b, "<=").map(|o| o.map_or(Scalar::Null, |o| Scalar::Boolean(o.is_le()))),
            OpCode::And => and(a, b),
            OpCode::DateDiff => date_diff(a, b),
            _ => Err(ComputeError::Mismatch { msg: format!("{:?} is not a binary instruction", op) }),
        })
        .collect()
}

/// Executes a one-operand instruction over a full register.
pub fn execute_unary(op: OpCode, src: &[Scalar]) -> Result<Vec<Scalar>, ComputeError> {
    src.par_iter()
        .map(|v| match op {
            OpCode::IsNull => Ok(Scalar::Boolean(v.is_null())),
            OpCode::IsNan => Ok(Scalar::Boolean(matches!(v, Scalar::Float(f) if f.is_nan()))),
            OpCode::Not => match v {
                Scalar::Null => Ok(Scalar::Null),
                Scalar::Boolean(b) => Ok(Scalar::Boolean(!b)),
                other => Err(ComputeError::TypeMismatch { op: "NOT", left: other.type_name(), right: "boolean" }),
            },
            _ => Err(ComputeError::Mismatch { msg: format!("{:?} is not a unary instruction", op) }),
        })
        .collect()
}

/// `CASE WHEN cond THEN a ELSE b END`. A null condition takes the `ELSE` branch.
pub fn execute_case(
    cond: &[Scalar],
    then: &[Scalar],
    otherwise: &[Scalar],
) -> Result<Vec<Scalar>, ComputeError> {
    cond.par_iter()
        .zip(then.par_iter().zip(otherwise.par_iter()))
        .map(|(c, (t, o))| match c {
            Scalar::Boolean(true) => Ok(t.clone()),
            Scalar::Boolean(false) | Scalar::Null => Ok(o.clone()),
            other => Err(ComputeError::TypeMismatch { op: "CASE", left: other.type_name(), right: "boolean" }),
        })
        .collect()
}

/// Shifts `src` by `offset` positions along `order` (row indices in window order).
///
/// Rows within the first `offset` positions of the order receive null.
pub fn execute_lag(src: &[Scalar], order: Option<&[usize]>, offset: u32) -> Vec<Scalar> {
    let offset = offset as usize;
    match order {
        None => (0..src.len())
            .into_par_iter()
            .map(|i| if i >= offset { src[i - offset].clone() } else { Scalar::Null })
            .collect(),
        Some(order) => {
            let mut rank = vec![0usize; order.len()];
            for (pos, &row) in order.iter().enumerate() {
                rank[row] = pos;
            }
            rank.par_iter()
                .map(|&pos| if pos >= offset { src[order[pos - offset]].clone() } else { Scalar::Null })
                .collect()
        }
    }
}

/// Stable ascending order of row indices by the given key registers, nulls first.
pub fn window_order(keys: &[&[Scalar]], row_count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..row_count).collect();
    order.par_sort_by(|&a, &b| {
        keys.iter()
            .map(|k| k[a].sort_cmp(&k[b]))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    order
}

// --- Scalar semantics ---

/// Numeric view of a value for arithmetic. Strings are cast; an unparsable
/// string is null rather than an error.
enum Numeric {
    Int(i64),
    Float(f64),
    Null,
}

fn numeric(v: &Scalar) -> Option<Numeric> {
    match v {
        Scalar::Null => Some(Numeric::Null),
        Scalar::Int(i) => Some(Numeric::Int(*i)),
        Scalar::Float(f) => Some(Numeric::Float(*f)),
        Scalar::Str(s) => Some(s.trim().parse::<f64>().map(Numeric::Float).unwrap_or(Numeric::Null)),
        _ => None,
    }
}

/// Integer results that leave the `i64` range widen to float. Both operands
/// then differ in sign, so the widened result keeps the exact sign.
fn subtract(a: &Scalar, b: &Scalar) -> Result<Scalar, ComputeError> {
    if a.is_null() || b.is_null() {
        return Ok(Scalar::Null);
    }
    let mismatch = || ComputeError::TypeMismatch { op: "-", left: a.type_name(), right: b.type_name() };
    match (numeric(a).ok_or_else(mismatch)?, numeric(b).ok_or_else(mismatch)?) {
        (Numeric::Null, _) | (_, Numeric::Null) => Ok(Scalar::Null),
        (Numeric::Int(x), Numeric::Int(y)) => Ok(x
            .checked_sub(y)
            .map_or_else(|| Scalar::Float(x as f64 - y as f64), Scalar::Int)),
        (Numeric::Int(x), Numeric::Float(y)) => Ok(Scalar::Float(x as f64 - y)),
        (Numeric::Float(x), Numeric::Int(y)) => Ok(Scalar::Float(x - y as f64)),
        (Numeric::Float(x), Numeric::Float(y)) => Ok(Scalar::Float(x - y)),
    }
}

/// NaN equals NaN and sorts above every other number.
fn float_cmp(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

/// `None` means the comparison is null.
fn compare(a: &Scalar, b: &Scalar, op: &'static str) -> Result<Option<Ordering>, ComputeError> {
    let ordering = match (a, b) {
        (Scalar::Null, _) | (_, Scalar::Null) => None,
        (Scalar::Boolean(x), Scalar::Boolean(y)) => Some(x.cmp(y)),
        (Scalar::Str(x), Scalar::Str(y)) => Some(x.cmp(y)),
        (Scalar::Date(x), Scalar::Date(y)) => Some(x.cmp(y)),
        (Scalar::Timestamp(x), Scalar::Timestamp(y)) => Some(x.cmp(y)),
        (Scalar::Date(x), Scalar::Timestamp(y)) => Some(midnight(*x).cmp(y)),
        (Scalar::Timestamp(x), Scalar::Date(y)) => Some(x.cmp(&midnight(*y))),
        _ => {
            let mismatch = || ComputeError::TypeMismatch { op, left: a.type_name(), right: b.type_name() };
            match (numeric(a).ok_or_else(mismatch)?, numeric(b).ok_or_else(mismatch)?) {
                (Numeric::Null, _) | (_, Numeric::Null) => None,
                (Numeric::Int(x), Numeric::Int(y)) => Some(x.cmp(&y)),
                (Numeric::Int(x), Numeric::Float(y)) => Some(float_cmp(x as f64, y)),
                (Numeric::Float(x), Numeric::Int(y)) => Some(float_cmp(x, y as f64)),
                (Numeric::Float(x), Numeric::Float(y)) => Some(float_cmp(x, y)),
            }
        }
    };
    Ok(ordering)
}

/// Three-valued AND: `false` wins even against a null.
fn and(a: &Scalar, b: &Scalar) -> Result<Scalar, ComputeError> {
    let as_opt = |v: &Scalar| match v {
        Scalar::Null => Ok(None),
        Scalar::Boolean(x) => Ok(Some(*x)),
        other => Err(ComputeError::TypeMismatch { op: "AND", left: other.type_name(), right: "boolean" }),
    };
    let out = match (as_opt(a)?, as_opt(b)?) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    };
    Ok(out.map_or(Scalar::Null, Scalar::Boolean))
}

fn as_date(v: &Scalar) -> Result<Option<NaiveDate>, &'static str> {
    match v {
        Scalar::Null => Ok(None),
        Scalar::Date(d) => Ok(Some(*d)),
        Scalar::Timestamp(t) => Ok(Some(t.date())),
        Scalar::Str(s) => Ok(s
            .trim()
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())),
        other => Err(other.type_name()),
    }
}

fn date_diff(end: &Scalar, start: &Scalar) -> Result<Scalar, ComputeError> {
    let mismatch = |_: &'static str| ComputeError::TypeMismatch { op: "datediff", left: end.type_name(), right: start.type_name() };
    match (as_date(end).map_err(mismatch)?, as_date(start).map_err(mismatch)?) {
        (Some(e), Some(s)) => Ok(Scalar::Int((e - s).num_days())),
        _ => Ok(Scalar::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ts(s: &str) -> Scalar {
        Scalar::Timestamp(chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap())
    }

    #[rstest]
    #[case(Scalar::Int(5), Scalar::Int(3), Scalar::Int(2))]
    #[case(Scalar::Int(5), Scalar::Float(0.5), Scalar::Float(4.5))]
    #[case(Scalar::Null, Scalar::Int(3), Scalar::Null)]
    #[case(Scalar::from("7"), Scalar::Int(3), Scalar::Float(4.0))]
    #[case(Scalar::from("abc"), Scalar::Int(3), Scalar::Null)]
    fn test_subtract(#[case] a: Scalar, #[case] b: Scalar, #[case] expected: Scalar) {
        assert_eq!(subtract(&a, &b).unwrap(), expected);
    }

    #[rstest]
    #[case(i64::MIN, 1, -9.223372036854775808e18)]
    #[case(i64::MAX, -1, 9.223372036854775808e18)]
    #[case(i64::MAX, i64::MIN, 1.8446744073709552e19)]
    #[case(i64::MIN, i64::MAX, -1.8446744073709552e19)]
    fn test_subtract_overflow_widens_to_float(#[case] a: i64, #[case] b: i64, #[case] expected: f64) {
        assert_eq!(subtract(&Scalar::Int(a), &Scalar::Int(b)).unwrap(), Scalar::Float(expected));
    }

    #[test]
    fn test_subtract_rejects_dates() {
        let d = Scalar::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert!(matches!(subtract(&d, &d), Err(ComputeError::TypeMismatch { .. })));
    }

    #[rstest]
    #[case(Scalar::Boolean(true), Scalar::Null, Scalar::Null)]
    #[case(Scalar::Null, Scalar::Boolean(false), Scalar::Boolean(false))]
    #[case(Scalar::Boolean(false), Scalar::Null, Scalar::Boolean(false))]
    #[case(Scalar::Boolean(true), Scalar::Boolean(true), Scalar::Boolean(true))]
    #[case(Scalar::Null, Scalar::Null, Scalar::Null)]
    fn test_three_valued_and(#[case] a: Scalar, #[case] b: Scalar, #[case] expected: Scalar) {
        assert_eq!(and(&a, &b).unwrap(), expected);
    }

    #[test]
    fn test_date_diff_truncates_timestamps_to_days() {
        let out = date_diff(&ts("2020-01-02 00:30:00"), &ts("2020-01-01 23:59:00")).unwrap();
        assert_eq!(out, Scalar::Int(1));
        let same_day = date_diff(&ts("2020-01-01 18:00:00"), &ts("2020-01-01 06:00:00")).unwrap();
        assert_eq!(same_day, Scalar::Int(0));
        assert_eq!(date_diff(&ts("2020-01-01 00:00:00"), &Scalar::Null).unwrap(), Scalar::Null);
    }

    #[test]
    fn test_nan_compares_above_numbers() {
        let r = execute_binary(OpCode::Lt, &[Scalar::Float(f64::NAN)], &[Scalar::Int(0)]).unwrap();
        assert_eq!(r, vec![Scalar::Boolean(false)]);
    }

    #[test]
    fn test_case_treats_null_condition_as_false() {
        let cond = [Scalar::Null, Scalar::Boolean(true)];
        let then = [Scalar::Int(1), Scalar::Int(1)];
        let otherwise = [Scalar::Int(0), Scalar::Int(0)];
        let out = execute_case(&cond, &then, &otherwise).unwrap();
        assert_eq!(out, vec![Scalar::Int(0), Scalar::Int(1)]);
    }

    #[test]
    fn test_lag_follows_window_order() {
        let src = [Scalar::Int(30), Scalar::Int(10), Scalar::Int(20)];
        let keys: [&[Scalar]; 1] = [&src];
        let order = window_order(&keys, 3);
        assert_eq!(order, vec![1, 2, 0]);
        let lagged = execute_lag(&src, Some(&order), 1);
        assert_eq!(lagged, vec![Scalar::Int(20), Scalar::Null, Scalar::Int(10)]);
    }

    #[test]
    fn test_lag_native_order() {
        let src = [Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)];
        assert_eq!(execute_lag(&src, None, 2), vec![Scalar::Null, Scalar::Null, Scalar::Int(1)]);
    }
}
