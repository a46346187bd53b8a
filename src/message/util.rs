/// Compute the log-base-two of the next power of two: 8 -> 3, 9 -> 4.
/// 
pub fn ceil_log2(x: usize) -> usize {
    let mut n = 0;
    while 1 << n < x {
        n += 1
    }
    n
}
