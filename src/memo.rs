//! Cached derivations keyed by their inputs.

/// Holds the last value computed for a key and recomputes only when asked
/// for a different key.
#[derive(Debug)]
pub struct Memo<K, V> {
  name: &'static str,
  entry: Option<(K, V)>,
  computations: u64,
}

impl<K: PartialEq, V> Memo<K, V> {
  pub fn new(name: &'static str) -> Self {
    Self {
      name,
      entry: None,
      computations: 0,
    }
  }

  pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> &V {
    let fresh = matches!(&self.entry, Some((cached, _)) if *cached == key);
    if !fresh {
      log::debug!("recomputing {}", self.name);
      self.computations += 1;
      self.entry = None;
    }
    let (_, value) = self.entry.get_or_insert_with(|| (key, compute()));
    value
  }

  /// How many times the value has been (re)computed.
  pub fn computations(&self) -> u64 {
    self.computations
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn recomputes_only_on_key_change() {
    let mut memo: Memo<u32, String> = Memo::new("test");
    assert_eq!(memo.get_or_compute(1, || "one".to_string()), "one");
    assert_eq!(memo.get_or_compute(1, || "other".to_string()), "one");
    assert_eq!(memo.computations(), 1);

    assert_eq!(memo.get_or_compute(2, || "two".to_string()), "two");
    assert_eq!(memo.computations(), 2);

    assert_eq!(memo.get_or_compute(1, || "one again".to_string()), "one again");
    assert_eq!(memo.computations(), 3);
  }
}
