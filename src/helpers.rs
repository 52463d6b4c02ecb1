/// Centres of `n` equal cells covering `[lower, upper]`
pub fn cell_centres(lower: f64, upper: f64, n: usize) -> impl Iterator<Item = f64> {
    let width = (upper - lower) / n as f64;
    (0..n).map(move |x| lower + width * (x as f64 + 0.5))
}
