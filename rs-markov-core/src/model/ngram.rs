use std::iter::FusedIterator;

/// Lazy sequence of `(context, continuation)` pairs over a text.
///
/// At position `i` the context is the `context_len` characters starting at `i`
/// and the continuation the `continuation_len` characters right after it.
/// The position advances by `max(1, continuation_len)` each step, so
/// continuations never overlap.
///
/// Lengths are counted in characters, and both halves of a pair borrow
/// directly from the input text.
///
/// The sequence is empty whenever `chars - context_len - continuation_len + 1 <= 0`.
/// Cloning the iterator (or calling `ngrams` again) restarts it.
#[derive(Clone, Debug)]
pub struct Ngrams<'a> {
	text: &'a str,
	/// Byte offsets of the current context start, context end and continuation end.
	start: usize,
	split: usize,
	stop: usize,
	stride: usize,
	position: usize,
	/// First position that can no longer produce a full pair.
	end: usize,
}

/// Byte offset `chars` characters after `offset`, if the text is long enough.
fn advance(text: &str, offset: usize, chars: usize) -> Option<usize> {
	if chars == 0 {
		return Some(offset);
	}
	let rest = &text[offset..];
	match rest.char_indices().nth(chars) {
		Some((index, _)) => Some(offset + index),
		None => (rest.chars().count() == chars).then_some(text.len()),
	}
}

/// Builds the pair sequence for one training pass.
pub fn ngrams(text: &str, context_len: usize, continuation_len: usize) -> Ngrams<'_> {
	let chars = text.chars().count();
	let mut end = (chars + 1).saturating_sub(context_len.saturating_add(continuation_len));

	let split = advance(text, 0, context_len);
	let stop = split.and_then(|split| advance(text, split, continuation_len));
	let (split, stop) = match (split, stop) {
		(Some(split), Some(stop)) if end > 0 => (split, stop),
		_ => {
			end = 0;
			(0, 0)
		}
	};

	Ngrams {
		text,
		start: 0,
		split,
		stop,
		stride: continuation_len.max(1),
		position: 0,
		end,
	}
}

impl<'a> Ngrams<'a> {
	/// Total number of pairs produced by a fresh sequence over the same input.
	pub fn total(&self) -> usize {
		self.end.div_ceil(self.stride)
	}

	/// Moves the three cursors `stride` characters forward.
	fn step(&mut self) -> Option<()> {
		self.start = advance(self.text, self.start, self.stride)?;
		self.split = advance(self.text, self.split, self.stride)?;
		self.stop = advance(self.text, self.stop, self.stride)?;
		Some(())
	}
}

impl<'a> Iterator for Ngrams<'a> {
	type Item = (&'a str, &'a str);

	fn next(&mut self) -> Option<Self::Item> {
		if self.position >= self.end {
			return None;
		}

		let context = &self.text[self.start..self.split];
		let continuation = &self.text[self.split..self.stop];

		self.position += self.stride;
		if self.position < self.end && self.step().is_none() {
			self.position = self.end;
		}
		Some((context, continuation))
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		let remaining = self.end.saturating_sub(self.position).div_ceil(self.stride);
		(remaining, Some(remaining))
	}
}

impl ExactSizeIterator for Ngrams<'_> {}

impl FusedIterator for Ngrams<'_> {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn single_char_continuations_slide_by_one() {
		let pairs: Vec<_> = ngrams("abcabcabcabc", 3, 1).collect();
		assert_eq!(pairs.len(), 9);
		assert_eq!(pairs[0], ("abc", "a"));
		assert_eq!(pairs[1], ("bca", "b"));
		assert_eq!(pairs[8], ("cab", "c"));
		// "abc" at position 9 has nothing after it
		assert_eq!(pairs.iter().filter(|(c, _)| *c == "abc").count(), 3);
	}

	#[test]
	fn stride_follows_continuation_length() {
		let pairs: Vec<_> = ngrams("abcdefgh", 2, 3).collect();
		assert_eq!(pairs, vec![("ab", "cde"), ("de", "fgh")]);
	}

	#[test]
	fn empty_when_text_is_too_short() {
		assert_eq!(ngrams("abc", 3, 1).count(), 0);
		assert_eq!(ngrams("ab", 3, 1).count(), 0);
		assert_eq!(ngrams("", 1, 1).count(), 0);
	}

	#[test]
	fn exactly_one_pair_at_the_boundary() {
		let pairs: Vec<_> = ngrams("abcd", 3, 1).collect();
		assert_eq!(pairs, vec![("abc", "d")]);
	}

	#[test]
	fn counts_characters_not_bytes() {
		let pairs: Vec<_> = ngrams("héllo", 2, 1).collect();
		assert_eq!(pairs, vec![("hé", "l"), ("él", "l"), ("ll", "o")]);
	}

	#[test]
	fn empty_context_yields_every_continuation() {
		let pairs: Vec<_> = ngrams("abc", 0, 1).collect();
		assert_eq!(pairs, vec![("", "a"), ("", "b"), ("", "c")]);
	}

	#[test]
	fn huge_lengths_give_an_empty_sequence() {
		assert_eq!(ngrams("abcdef", usize::MAX, 1).count(), 0);
		assert_eq!(ngrams("abcdef", 2, usize::MAX).count(), 0);
		assert_eq!(ngrams("abcdef", usize::MAX, usize::MAX).len(), 0);
	}

	#[test]
	fn multibyte_strides_stay_on_char_boundaries() {
		let pairs: Vec<_> = ngrams("日本語のテキスト", 1, 2).collect();
		assert_eq!(pairs, vec![("日", "本語"), ("語", "のテ"), ("テ", "キス")]);
	}

	#[test]
	fn reports_exact_length_and_restarts_on_clone() {
		let mut sequence = ngrams("the quick brown fox", 4, 2);
		assert_eq!(sequence.total(), sequence.len());
		let total = sequence.len();
		let fresh = sequence.clone();
		sequence.next();
		assert_eq!(sequence.len(), total - 1);
		assert_eq!(fresh.count(), total);
	}
}
