use super::*;

/// Index of the largest element, the first one on ties, `None` when empty.
pub(crate) fn argmax<D>(x: &ArrayView<f32, D>) -> Option<usize>
where
  D: ndarray::Dimension,
{
  x.iter()
    .enumerate()
    .max_by(|(i, a), (j, b)| a.total_cmp(b).then(j.cmp(i)))
    .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
  use {super::*, ndarray::array};

  #[test]
  fn argmax_works() {
    let arr = array![0.1, 0.3, 0.2, 0.4, 0.1];
    assert_eq!(argmax(&arr.view()), Some(3));
  }

  #[test]
  fn argmax_empty() {
    let arr = Array1::<f32>::zeros(0);
    assert_eq!(argmax(&arr.view()), None);
  }

  #[test]
  fn argmax_prefers_first_of_ties() {
    let arr = array![0.2, 0.4, 0.4];
    assert_eq!(argmax(&arr.view()), Some(1));
  }
}
