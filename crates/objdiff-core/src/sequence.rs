//! Longest common sequence detection for ordered collections.
//!
//! [`longest_common_sequences`] finds the longest contiguous run shared by
//! both inputs, then recurses into the parts before and after it. The result
//! is a list of non-overlapping runs, ascending on both sides.

/// A contiguous run present in both inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sequence {
    pub working_offset: usize,
    pub base_offset: usize,
    pub length: usize,
}

impl Sequence {
    pub fn working_end(&self) -> usize {
        self.working_offset + self.length
    }

    pub fn base_end(&self) -> usize {
        self.base_offset + self.length
    }
}

/// Common runs of `working` and `base` under the element equality `eq`.
///
/// When several runs share the maximum length, the last one found scanning
/// `working` then `base` in order is taken.
pub fn longest_common_sequences<T, F>(working: &[T], base: &[T], eq: F) -> Vec<Sequence>
where
    F: Fn(&T, &T) -> bool,
{
    let mut sequences = Vec::new();
    collect(working, base, 0, 0, &eq, &mut sequences);
    sequences
}

fn collect<T, F>(
    working: &[T],
    base: &[T],
    working_offset: usize,
    base_offset: usize,
    eq: &F,
    out: &mut Vec<Sequence>,
) where
    F: Fn(&T, &T) -> bool,
{
    let Some(longest) = longest_run(working, base, eq) else {
        return;
    };

    collect(
        &working[..longest.working_offset],
        &base[..longest.base_offset],
        working_offset,
        base_offset,
        eq,
        out,
    );
    out.push(Sequence {
        working_offset: working_offset + longest.working_offset,
        base_offset: base_offset + longest.base_offset,
        length: longest.length,
    });
    collect(
        &working[longest.working_end()..],
        &base[longest.base_end()..],
        working_offset + longest.working_end(),
        base_offset + longest.base_end(),
        eq,
        out,
    );
}

/// The longest common run, relative to the given slices.
fn longest_run<T, F>(working: &[T], base: &[T], eq: &F) -> Option<Sequence>
where
    F: Fn(&T, &T) -> bool,
{
    if working.is_empty() || base.is_empty() {
        return None;
    }

    // Run lengths ending at (i, j), two rows at a time.
    let mut previous = vec![0usize; base.len() + 1];
    let mut current = vec![0usize; base.len() + 1];
    let mut best: Option<Sequence> = None;

    for i in 1..=working.len() {
        for j in 1..=base.len() {
            current[j] = if eq(&working[i - 1], &base[j - 1]) {
                previous[j - 1] + 1
            } else {
                0
            };
            let length = current[j];
            if length > 0 && best.map_or(true, |b| length >= b.length) {
                best = Some(Sequence {
                    working_offset: i - length,
                    base_offset: j - length,
                    length,
                });
            }
        }
        std::mem::swap(&mut previous, &mut current);
        current.fill(0);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run(working: &str, base: &str) -> Vec<Sequence> {
        let w: Vec<char> = working.chars().collect();
        let b: Vec<char> = base.chars().collect();
        longest_common_sequences(&w, &b, |x, y| x == y)
    }

    fn seq(working_offset: usize, base_offset: usize, length: usize) -> Sequence {
        Sequence {
            working_offset,
            base_offset,
            length,
        }
    }

    #[test]
    fn identical_inputs_form_one_run() {
        assert_eq!(run("abc", "abc"), vec![seq(0, 0, 3)]);
    }

    #[test]
    fn empty_inputs_have_no_runs() {
        assert!(run("", "abc").is_empty());
        assert!(run("abc", "").is_empty());
        assert!(run("abc", "xyz").is_empty());
    }

    #[test]
    fn insertion_splits_into_two_runs() {
        assert_eq!(run("abXcd", "abcd"), vec![seq(0, 0, 2), seq(3, 2, 2)]);
    }

    #[test]
    fn last_longest_run_wins_ties() {
        assert_eq!(run("abxab", "ab"), vec![seq(3, 0, 2)]);
    }

    #[test]
    fn remainders_are_aligned_recursively() {
        // "bcd" is the longest run; "a" and "e" are matched on either side.
        assert_eq!(
            run("aXbcdYe", "abcde"),
            vec![seq(0, 0, 1), seq(2, 1, 3), seq(6, 4, 1)]
        );
    }

    proptest! {
        #[test]
        fn runs_match_and_are_ordered(w in "[abc]{0,12}", b in "[abc]{0,12}") {
            let wv: Vec<char> = w.chars().collect();
            let bv: Vec<char> = b.chars().collect();
            let runs = longest_common_sequences(&wv, &bv, |x, y| x == y);

            let mut working_end = 0;
            let mut base_end = 0;
            for run in &runs {
                prop_assert!(run.length > 0);
                prop_assert!(run.working_offset >= working_end);
                prop_assert!(run.base_offset >= base_end);
                for k in 0..run.length {
                    prop_assert_eq!(wv[run.working_offset + k], bv[run.base_offset + k]);
                }
                working_end = run.working_end();
                base_end = run.base_end();
            }
            prop_assert!(working_end <= wv.len());
            prop_assert!(base_end <= bv.len());
        }

        #[test]
        fn identical_sequences_align_fully(w in "[abc]{1,12}") {
            let wv: Vec<char> = w.chars().collect();
            let runs = longest_common_sequences(&wv, &wv, |x, y| x == y);
            prop_assert_eq!(runs, vec![seq(0, 0, wv.len())]);
        }
    }
}
