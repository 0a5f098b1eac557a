//! Case-insensitive, numeric-aware string ordering.
//!
//! Digit runs compare by value, so `"OP-2"` sorts before `"OP-10"`. Everything
//! else compares by lower-cased character.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

pub fn natural_cmp(left: &str, right: &str) -> Ordering {
  let mut a = left.chars().peekable();
  let mut b = right.chars().peekable();

  loop {
    match (a.peek().copied(), b.peek().copied()) {
      (None, None) => return Ordering::Equal,
      (None, Some(_)) => return Ordering::Less,
      (Some(_), None) => return Ordering::Greater,
      (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
        let run_a = take_digits(&mut a);
        let run_b = take_digits(&mut b);
        let ordering = compare_digit_runs(&run_a, &run_b);
        if ordering != Ordering::Equal {
          return ordering;
        }
      }
      (Some(x), Some(y)) => {
        let ordering = x.to_lowercase().cmp(y.to_lowercase());
        if ordering != Ordering::Equal {
          return ordering;
        }
        a.next();
        b.next();
      }
    }
  }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
  let mut run = String::new();
  while let Some(ch) = chars.peek().copied() {
    if !ch.is_ascii_digit() {
      break;
    }
    run.push(ch);
    chars.next();
  }
  run
}

// Leading zeros only matter once the values are equal ("007" after "7").
fn compare_digit_runs(a: &str, b: &str) -> Ordering {
  let trimmed_a = a.trim_start_matches('0');
  let trimmed_b = b.trim_start_matches('0');
  trimmed_a
    .len()
    .cmp(&trimmed_b.len())
    .then_with(|| trimmed_a.cmp(trimmed_b))
    .then_with(|| a.len().cmp(&b.len()))
}
