use rand::Rng;

/// In-place Fisher–Yates shuffle. Every permutation is equally likely
/// given a uniform `rng`.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
  for i in (1..items.len()).rev() {
    let j = rng.random_range(0..=i);
    items.swap(i, j);
  }
}

/// Shuffled copy, leaving the input untouched
pub fn shuffled<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
  let mut out = items.to_vec();
  shuffle(&mut out, rng);
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;
  use rand::rngs::StdRng;

  #[test]
  fn test_shuffle_is_permutation() {
    let mut rng = StdRng::seed_from_u64(7);
    for len in [0usize, 1, 2, 5, 40] {
      let input: Vec<usize> = (0..len).collect();
      let mut out = shuffled(&input, &mut rng);
      out.sort_unstable();
      assert_eq!(out, input);
    }
  }

  #[test]
  fn test_shuffle_reaches_every_position() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut seen_first = [false; 4];
    for _ in 0..200 {
      let out = shuffled(&[0, 1, 2, 3], &mut rng);
      seen_first[out[0]] = true;
    }
    assert!(seen_first.iter().all(|&s| s));
  }

  #[test]
  fn test_same_seed_same_order() {
    let input: Vec<u32> = (0..10).collect();
    let a = shuffled(&input, &mut StdRng::seed_from_u64(3));
    let b = shuffled(&input, &mut StdRng::seed_from_u64(3));
    assert_eq!(a, b);
  }
}
