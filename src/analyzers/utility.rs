/// Running sum of a slice: element `i` is the sum of `values[..=i]`.
/// Returns an empty vector for empty input.
pub fn running_sum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}
