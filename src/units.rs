//! Temperature unit conversion. Controllers report temperatures in degrees
//! Fahrenheit unless set up otherwise.

/// Convert degrees Fahrenheit to degrees Celsius.
pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * (5.0 / 9.0)
}

/// Convert degrees Celsius to degrees Fahrenheit.
pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * (9.0 / 5.0) + 32.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 0.05, "{} != {}", a, b);
    }

    #[test]
    fn test_c_to_f() {
        for (c, f) in [(32.0, 89.6), (0.0, 32.0), (-9.8765, 14.2223), (-45.0, -49.0)].iter() {
            assert_close(celsius_to_fahrenheit(*c), *f);
        }
    }

    #[test]
    fn test_f_to_c() {
        for (f, c) in [(89.6, 32.0), (30.0, -1.1111), (-1.23, -18.4611), (45.0, 7.22)].iter() {
            assert_close(fahrenheit_to_celsius(*f), *c);
        }
    }
}
