use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LEADING_FLOAT: Regex =
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").unwrap();
    static ref LEADING_INT: Regex = Regex::new(r"^[+-]?\d+").unwrap();
}

/// Leading decimal number of `raw`; trailing text such as a unit is ignored.
pub fn leading_float(raw: &str) -> Option<f64> {
    let m = LEADING_FLOAT.find(raw.trim_start())?;
    m.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Leading integer of `raw`, so `"7.5"` reads as 7 and `"350 kcal"` as 350.
pub fn leading_int(raw: &str) -> Option<i64> {
    let m = LEADING_INT.find(raw.trim_start())?;
    m.as_str().parse::<i64>().ok()
}
