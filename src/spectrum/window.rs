use super::fft::SineTable;

/// Window factor at the centre of the block, `1.0` in Q15 with one bit of
/// headroom. Factors are kept in `i32` because the peak does not fit `i16`.
const UNITY: i32 = 1 << 15;

/// Applies a raised-cosine (Hann) window to the first `count` samples.
///
/// The factor at distance `d` from the nearest edge is
/// `(UNITY - sin(quarter + d * len / count)) / 2`, which reads the table as a
/// cosine: near zero at both edges, unity in the middle. The phase is scaled
/// before dividing so counts that do not divide the table still reach the
/// middle of the period. Samples at or past `count` are zero padding and
/// stay untouched.
pub fn apply(real: &mut [i16], count: usize, table: &SineTable) {
    let count = count.min(real.len());
    if count == 0 {
        return;
    }

    let quarter = table.quarter();
    let half = count / 2;
    for (i, sample) in real[..count].iter_mut().enumerate() {
        let distance = if i < half { i } else { count - 1 - i };
        let index = (quarter + distance * table.len() / count).min(table.len() - 1);
        let factor = UNITY / 2 - (table.sin(index) as i32 >> 1);
        *sample = ((*sample as i32 * factor) >> 15) as i16;
    }
}
