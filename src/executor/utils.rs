use num_bigint_dig::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};
use z3::ast::{Ast, Real, BV};

/// Sign-extends the low `width` bits of `value` to a full `i64`.
///
/// Concrete integers are always kept in this normalized form so that they
/// agree bit for bit with the solver's two's-complement bit-vectors.
///
/// # Examples
/// ```
/// use pathsynth::executor::utils::truncate_int;
///
/// assert_eq!(truncate_int(255, 8), -1);
/// assert_eq!(truncate_int(128, 8), -128);
/// assert_eq!(truncate_int(127, 8), 127);
/// assert_eq!(truncate_int(i64::MAX, 64), i64::MAX);
/// assert_eq!(truncate_int(0x1_0000_0005, 32), 5);
/// ```
pub fn truncate_int(value: i64, width: u32) -> i64 {
    if width == 0 || width >= 64 {
        value
    } else {
        let shift = 64 - width;
        (value << shift) >> shift
    }
}

/// Rounds a float to the precision of its declared width.
pub fn round_float(value: f64, width: u32) -> f64 {
    if width <= 32 {
        value as f32 as f64
    } else {
        value
    }
}

/// Logical left shift with solver semantics: shifting by the width or more,
/// or by a negative amount (an unsigned huge amount), yields zero.
pub fn shift_left(value: i64, amount: i64, width: u32) -> i64 {
    if amount < 0 || amount >= width as i64 {
        0
    } else {
        truncate_int(value.wrapping_shl(amount as u32), width)
    }
}

/// Sign-preserving right shift with solver semantics.
pub fn shift_right(value: i64, amount: i64, width: u32) -> i64 {
    if amount < 0 || amount >= width as i64 {
        if value < 0 {
            -1
        } else {
            0
        }
    } else {
        value >> amount
    }
}

/// Signed division matching `bvsdiv`, including division by zero.
pub fn signed_div(lhs: i64, rhs: i64, width: u32) -> i64 {
    if rhs == 0 {
        if lhs >= 0 {
            -1
        } else {
            1
        }
    } else {
        truncate_int(lhs.wrapping_div(rhs), width)
    }
}

/// Signed remainder matching `bvsrem`: the sign follows the dividend.
pub fn signed_rem(lhs: i64, rhs: i64, width: u32) -> i64 {
    if rhs == 0 {
        lhs
    } else {
        truncate_int(lhs.wrapping_rem(rhs), width)
    }
}

/// Decomposes a finite float into an exact reduced fraction.
///
/// # Examples
/// ```
/// use num_bigint_dig::BigInt;
/// use pathsynth::executor::utils::f64_to_ratio;
///
/// assert_eq!(f64_to_ratio(0.75), Some((BigInt::from(3), BigInt::from(4))));
/// assert_eq!(f64_to_ratio(-6.0), Some((BigInt::from(-6), BigInt::from(1))));
/// assert_eq!(f64_to_ratio(f64::NAN), None);
/// ```
pub fn f64_to_ratio(value: f64) -> Option<(BigInt, BigInt)> {
    if !value.is_finite() {
        return None;
    }
    if value == 0.0 {
        return Some((BigInt::zero(), BigInt::one()));
    }

    let bits = value.to_bits();
    let negative = (bits >> 63) == 1;
    let biased_exponent = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);

    let (mut mantissa, mut exponent) = if biased_exponent == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased_exponent - 1075)
    };

    while exponent < 0 && mantissa % 2 == 0 {
        mantissa >>= 1;
        exponent += 1;
    }

    let mut numerator = BigInt::from(mantissa);
    let mut denominator = BigInt::one();
    if exponent >= 0 {
        numerator <<= exponent as usize;
    } else {
        denominator <<= (-exponent) as usize;
    }
    if negative {
        numerator = -numerator;
    }
    Some((numerator, denominator))
}

/// Reads a numeral real back as a float.
pub fn real_to_f64(real: &Real) -> Option<f64> {
    if let Some((num, den)) = real.as_real() {
        if den != 0 {
            return Some(num as f64 / den as f64);
        }
    }
    parse_real_numeral(&real.to_string())
}

/// Parses the textual forms z3 prints for rational numerals, such as
/// `3.0`, `(- 2.0)` and `(/ 1.0 3.0)`.
///
/// # Examples
/// ```
/// use pathsynth::executor::utils::parse_real_numeral;
///
/// assert_eq!(parse_real_numeral("2.5"), Some(2.5));
/// assert_eq!(parse_real_numeral("(- 4.0)"), Some(-4.0));
/// assert_eq!(parse_real_numeral("(/ 1.0 4.0)"), Some(0.25));
/// assert_eq!(parse_real_numeral("(- (/ 3.0 2.0))"), Some(-1.5));
/// assert_eq!(parse_real_numeral("x"), None);
/// ```
pub fn parse_real_numeral(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Some(inner) = strip_parens(text, "-") {
        return parse_real_numeral(inner).map(|v| -v);
    }
    if let Some(inner) = strip_parens(text, "/") {
        let (num, den) = split_operands(inner)?;
        let num = parse_real_numeral(num)?;
        let den = parse_real_numeral(den)?;
        return Some(num / den);
    }
    if let Ok(v) = text.parse::<f64>() {
        return Some(v);
    }
    text.parse::<BigInt>().ok().and_then(|b| {
        if b.is_negative() {
            (-b).to_f64().map(|v| -v)
        } else {
            b.to_f64()
        }
    })
}

fn strip_parens<'a>(text: &'a str, operator: &str) -> Option<&'a str> {
    let inner = text.strip_prefix('(')?.strip_suffix(')')?.trim_start();
    let rest = inner.strip_prefix(operator)?;
    if rest.starts_with(' ') {
        Some(rest.trim())
    } else {
        None
    }
}

fn split_operands(text: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ' ' if depth == 0 => return Some((text[..i].trim(), text[i..].trim())),
            _ => {}
        }
    }
    None
}

/// Reads a bit-vector numeral as a signed integer of its own width.
pub fn bv_to_i64(bv: &BV) -> Option<i64> {
    let width = bv.get_size();
    let simplified = bv.simplify();
    simplified
        .as_u64()
        .map(|raw| truncate_int(raw as i64, width))
}

pub fn italic(text: &str) -> String {
    format!("\x1b[3m{}\x1b[0m", text)
}
