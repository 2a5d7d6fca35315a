//! CF packing: fill values and `scale_factor`/`add_offset`.

/// Unpacks raw stored values in place.
///
/// Values equal to `fill` become NaN; every other value becomes
/// `value * scale + offset`. Callers decoding files themselves before building a
/// [`MemoryGrid`](crate::MemoryGrid) can use this to match the NetCDF reader.
///
/// ```
/// let mut values = vec![-9999.0, 10.0];
/// gridcast::decode_packed(&mut values, Some(-9999.0), 0.5, 1.0);
/// assert!(values[0].is_nan());
/// assert_eq!(values[1], 6.0);
/// ```
pub fn decode_packed(values: &mut [f64], fill: Option<f64>, scale: f64, offset: f64) {
    for value in values.iter_mut() {
        *value = match fill {
            Some(fill) if *value == fill => f64::NAN,
            _ => *value * scale + offset,
        };
    }
}
