//! Prime capacity helpers.

/// Trial division up to the square root.
pub fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut d = 3;
    while d <= n / d {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Smallest prime strictly greater than `current`, searching no lower than
/// `min_prime` and giving up at `max_prime`.
///
/// Requests below `min_prime` start the search at `min_prime - 1`, so the
/// result is `min_prime` itself when it is prime. When no prime exists below
/// `max_prime` the search returns `max_prime`.
pub fn next_prime(current: usize, min_prime: usize, max_prime: usize) -> usize {
    if current >= max_prime {
        return max_prime;
    }
    let start = if current < min_prime {
        min_prime.saturating_sub(1)
    } else {
        current
    };
    (start + 1..max_prime)
        .find(|&n| is_prime(n))
        .unwrap_or(max_prime)
}

/// Capacity for a requested table size: primes are clamped into
/// `[min_prime, max_prime]`, anything else advances to the next prime.
pub fn clamp_capacity(requested: usize, min_prime: usize, max_prime: usize) -> usize {
    if requested >= max_prime {
        max_prime
    } else if is_prime(requested) {
        requested.clamp(min_prime, max_prime)
    } else {
        next_prime(requested, min_prime, max_prime)
    }
}
