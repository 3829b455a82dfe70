//! Dirichlet hyperparameter re-estimation.
//!
//! Both updates are Minka's fixed-point iteration written over count
//! histograms, so the digamma differences `psi(x + n) - psi(x)` become running
//! sums of `1 / (x + i)`. Each call iterates to convergence, so repeated calls
//! on unchanged counts leave the parameters where they are.

/// Gamma prior on each alpha component: shape and scale.
const ALPHA_SHAPE: f64 = 1.001;
const ALPHA_SCALE: f64 = 1.0;
const MIN_ALPHA: f64 = 1e-10;
const MAX_FIXED_POINT_ITERATIONS: usize = 1000;
/// Relative change below which the iteration is considered converged.
const TOLERANCE: f64 = 1e-12;

/// `hist[n]` = number of items with value `n`.
pub fn histogram<I: IntoIterator<Item = usize>>(values: I) -> Vec<usize> {
    let mut hist = Vec::new();
    for value in values {
        if value >= hist.len() {
            hist.resize(value + 1, 0);
        }
        hist[value] += 1;
    }
    hist
}

/// Re-estimates an asymmetric document-topic prior in place.
///
/// This is the MAP fixed point under a Gamma(shape, scale) prior on every
/// component:
///
/// `alpha_k <- (alpha_k * sum_d[psi(n_dk + alpha_k) - psi(alpha_k)] + shape - 1)
///            / (sum_d[psi(n_d + S) - psi(S)] + 1 / scale)`
///
/// The prior keeps the denominator positive and gives unused topics a small
/// positive mass, so the update always exists. Components are floored at
/// `MIN_ALPHA`. Returns the new sum, or `None` if the result was not finite,
/// in which case `alpha` is left untouched.
pub fn optimize_alpha(alpha: &mut [f64], doc_topic_counts: &[Vec<usize>]) -> Option<f64> {
    let num_topics = alpha.len();
    let length_hist = histogram(doc_topic_counts.iter().map(|row| row.iter().sum::<usize>()));
    let topic_hists: Vec<Vec<usize>> = (0..num_topics)
        .map(|k| histogram(doc_topic_counts.iter().map(|row| row[k]).filter(|&n| n > 0)))
        .collect();

    let mut params = alpha.to_vec();
    let mut params_sum: f64 = params.iter().sum();

    for _ in 0..MAX_FIXED_POINT_ITERATIONS {
        let previous_sum = params_sum;
        let mut denominator = 1.0 / ALPHA_SCALE;
        let mut digamma_diff = 0.0;
        for (n, &docs) in length_hist.iter().enumerate().skip(1) {
            digamma_diff += 1.0 / (params_sum + n as f64 - 1.0);
            denominator += docs as f64 * digamma_diff;
        }

        params_sum = 0.0;
        for (k, param) in params.iter_mut().enumerate() {
            let old = *param;
            let mut numerator = 0.0;
            let mut digamma_diff = 0.0;
            for (n, &docs) in topic_hists[k].iter().enumerate().skip(1) {
                digamma_diff += 1.0 / (old + n as f64 - 1.0);
                numerator += docs as f64 * digamma_diff;
            }
            *param = ((old * numerator + ALPHA_SHAPE - 1.0) / denominator).max(MIN_ALPHA);
            params_sum += *param;
        }
        if !params_sum.is_finite() {
            return None;
        }
        if (params_sum - previous_sum).abs() <= TOLERANCE * previous_sum {
            break;
        }
    }

    if params.iter().all(|p| p.is_finite()) {
        alpha.copy_from_slice(&params);
        Some(params_sum)
    } else {
        None
    }
}

/// Re-estimates a symmetric topic-word prior.
///
/// `count_hist[n]` is the number of (topic, word) cells holding `n` tokens and
/// `topic_size_hist[n]` the number of topics holding `n` tokens. Returns the new
/// per-word `beta`, or `None` if the update degenerated.
pub fn optimize_beta(
    beta: f64,
    count_hist: &[usize],
    topic_size_hist: &[usize],
    vocab_size: usize,
) -> Option<f64> {
    if vocab_size == 0 {
        return None;
    }
    let dims = vocab_size as f64;
    let mut param = beta;

    for _ in 0..MAX_FIXED_POINT_ITERATIONS {
        let previous = param;
        let mut numerator = 0.0;
        let mut digamma_diff = 0.0;
        for (n, &cells) in count_hist.iter().enumerate().skip(1) {
            digamma_diff += 1.0 / (param + n as f64 - 1.0);
            numerator += cells as f64 * digamma_diff;
        }

        let mut denominator = 0.0;
        let mut digamma_diff = 0.0;
        for (n, &topics) in topic_size_hist.iter().enumerate().skip(1) {
            digamma_diff += 1.0 / (param * dims + n as f64 - 1.0);
            denominator += topics as f64 * digamma_diff;
        }

        if !(denominator.is_finite() && denominator > 0.0) {
            return None;
        }
        param *= numerator / (dims * denominator);
        if !(param.is_finite() && param > 0.0) {
            return None;
        }
        if (param - previous).abs() <= TOLERANCE * previous {
            break;
        }
    }
    Some(param)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skewed_counts() -> Vec<Vec<usize>> {
        vec![
            vec![8, 1, 0],
            vec![7, 0, 2],
            vec![9, 1, 1],
            vec![6, 2, 0],
            vec![0, 5, 4],
            vec![10, 0, 0],
        ]
    }

    #[test]
    fn test_histogram() {
        assert_eq!(histogram([0, 2, 2, 3]), vec![1, 0, 2, 1]);
        assert!(histogram(Vec::<usize>::new()).is_empty());
    }

    #[test]
    fn test_alpha_favours_dominant_topic() {
        let mut alpha = vec![1.0 / 3.0; 3];
        let sum = optimize_alpha(&mut alpha, &skewed_counts()).unwrap();
        assert!((alpha.iter().sum::<f64>() - sum).abs() < 1e-9);
        assert!(alpha[0] > alpha[1]);
        assert!(alpha[0] > alpha[2]);
    }

    #[test]
    fn test_alpha_stable_on_static_counts() {
        let counts = skewed_counts();
        let mut alpha = vec![0.5; 3];
        optimize_alpha(&mut alpha, &counts).unwrap();
        let first = alpha.clone();
        optimize_alpha(&mut alpha, &counts).unwrap();
        for (a, b) in first.iter().zip(&alpha) {
            assert!((a - b).abs() < 1e-4 * a.max(1.0), "{a} vs {b}");
        }
    }

    #[test]
    fn test_alpha_moves_off_uniform_start() {
        let mut alpha = vec![1.0 / 3.0; 3];
        optimize_alpha(&mut alpha, &skewed_counts()).unwrap();
        assert!(alpha.iter().all(|a| (a - 1.0 / 3.0).abs() > 1e-3));
    }

    #[test]
    fn test_unused_topic_keeps_positive_alpha() {
        // Topic 2 never receives a token.
        let counts = vec![vec![6, 2, 0], vec![1, 7, 0], vec![4, 4, 0]];
        let mut alpha = vec![0.1; 3];
        for _ in 0..50 {
            optimize_alpha(&mut alpha, &counts).unwrap();
        }
        assert!(alpha[2] >= MIN_ALPHA);
        assert!(alpha[2] < alpha[0] && alpha[2] < alpha[1]);
        assert!(alpha.iter().all(|a| a.is_finite()));
    }

    #[test]
    fn test_alpha_single_token_document() {
        let mut alpha = vec![0.5, 0.5];
        let sum = optimize_alpha(&mut alpha, &[vec![1, 0]]).unwrap();
        assert!(sum.is_finite() && sum > 0.0);
        assert!(alpha[0] > alpha[1]);
        assert!(alpha[1] >= MIN_ALPHA);
    }

    #[test]
    fn test_beta_stable_on_static_counts() {
        // Two topics over a 4-word vocabulary.
        let topic_word = [vec![5usize, 3, 0, 0], vec![0, 1, 4, 6]];
        let count_hist = histogram(topic_word.iter().flatten().copied().filter(|&n| n > 0));
        let size_hist = histogram(topic_word.iter().map(|row| row.iter().sum::<usize>()));

        let first = optimize_beta(0.01, &count_hist, &size_hist, 4).unwrap();
        let second = optimize_beta(first, &count_hist, &size_hist, 4).unwrap();
        assert!(first > 0.0);
        assert!((first - second).abs() < 1e-4 * first.max(1.0));
    }

    #[test]
    fn test_beta_rejects_empty_vocabulary() {
        assert_eq!(optimize_beta(0.01, &[0, 1], &[0, 1], 0), None);
    }
}
