//! d3-style "nice" tick generation for linear axes.

/// Largest tick count a figure may request.
pub const MAX_TICKS: usize = 50;

/// Upper bound on the number of values [`nice_ticks`] will materialize.
const MAX_TICK_VALUES: usize = 1000;

/// Roughly `count` evenly spaced round values covering `[start, stop]`.
///
/// Mirrors `d3.ticks`: steps are 1, 2 or 5 times a power of ten, and a reversed interval yields
/// ticks in descending order.
pub fn nice_ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    fn tick_spec(start: f64, stop: f64, count: f64) -> Option<(i64, i64, f64)> {
        if !(count > 0.0) {
            return None;
        }

        let step = (stop - start) / count;
        if !step.is_finite() || step == 0.0 {
            return None;
        }
        let power = step.log10().floor();
        let error = step / 10f64.powf(power);
        let factor = if error >= 50f64.sqrt() {
            10.0
        } else if error >= 10f64.sqrt() {
            5.0
        } else if error >= 2f64.sqrt() {
            2.0
        } else {
            1.0
        };

        let (i1, i2, inc) = if power < 0.0 {
            let inc = 10f64.powf(-power) / factor;
            let mut i1 = (start * inc).round() as i64;
            let mut i2 = (stop * inc).round() as i64;
            if (i1 as f64) / inc < start {
                i1 += 1;
            }
            if (i2 as f64) / inc > stop {
                i2 -= 1;
            }
            (i1, i2, -inc)
        } else {
            let inc = 10f64.powf(power) * factor;
            let mut i1 = (start / inc).round() as i64;
            let mut i2 = (stop / inc).round() as i64;
            if (i1 as f64) * inc < start {
                i1 += 1;
            }
            if (i2 as f64) * inc > stop {
                i2 -= 1;
            }
            (i1, i2, inc)
        };

        if i2 < i1 && (0.5..2.0).contains(&count) {
            return tick_spec(start, stop, count * 2.0);
        }
        if !inc.is_finite() || inc == 0.0 {
            return None;
        }
        Some((i1, i2, inc))
    }

    if !start.is_finite() || !stop.is_finite() || count == 0 {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }

    let reverse = stop < start;
    let (a, b) = if reverse { (stop, start) } else { (start, stop) };
    let Some((i1, i2, inc)) = tick_spec(a, b, count as f64) else {
        return Vec::new();
    };
    if i2 < i1 {
        return Vec::new();
    }

    let value = |i: i64| {
        if inc < 0.0 {
            i as f64 / -inc
        } else {
            i as f64 * inc
        }
    };
    let Some(n) = i2
        .checked_sub(i1)
        .and_then(|d| usize::try_from(d).ok())
        .and_then(|d| d.checked_add(1))
        .filter(|n| *n <= MAX_TICK_VALUES)
    else {
        return Vec::new();
    };
    if reverse {
        (0..n).map(|k| value(i2 - k as i64)).collect()
    } else {
        (0..n).map(|k| value(i1 + k as i64)).collect()
    }
}

/// Shortest round-trippable label for a tick value (`2000`, `0.5`, `-1.25`).
pub fn format_tick(v: f64) -> String {
    if !v.is_finite() {
        return String::new();
    }
    let v = if v == 0.0 { 0.0 } else { v };
    let mut buf = ryu_js::Buffer::new();
    buf.format_finite(v).to_string()
}
