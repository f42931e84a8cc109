/// Length of a "valid" convolution of `signal_len` samples with a kernel of
/// `kernel_len` taps. Zero when the kernel does not fit.
pub fn valid_len(signal_len: usize, kernel_len: usize) -> usize {
    if kernel_len == 0 || signal_len < kernel_len {
        0
    } else {
        signal_len - kernel_len + 1
    }
}

/// "Valid" convolution: only positions where the kernel fully overlaps the
/// signal are produced, so `out.len() == signal.len() - kernel.len() + 1`.
///
/// No border mode is involved; the output is shorter than the input by
/// `kernel.len() - 1` samples.
pub fn convolve_valid_f64(signal: &[f64], kernel: &[f64], out: &mut Vec<f64>) {
    out.clear();
    let n_out = valid_len(signal.len(), kernel.len());
    if n_out == 0 {
        return;
    }
    out.reserve(n_out);

    let klen = kernel.len();
    for window in signal.windows(klen) {
        let mut acc = 0.0f64;
        for (k, &s) in window.iter().enumerate() {
            acc += s * kernel[klen - 1 - k];
        }
        out.push(acc);
    }
}
