use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

use localchat_core::config::StopWords;

/// Tokens shorter than this (in chars) carry no signal and are dropped.
pub const MIN_TOKEN_CHARS: usize = 2;

pub const ENGLISH_STOP_WORDS: &[&str] = &[
	"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
];

pub fn build_analyzer(stop_words: StopWords) -> TextAnalyzer {
	let builder = TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser);
	match stop_words {
		StopWords::None => builder.build(),
		StopWords::English => builder
			.filter(StopWordFilter::remove(ENGLISH_STOP_WORDS.iter().map(|s| s.to_string())))
			.build(),
	}
}

/// Lowercased alphanumeric tokens of at least [`MIN_TOKEN_CHARS`] chars.
pub fn tokenize(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
	let mut stream = analyzer.token_stream(text);
	let mut tokens = Vec::new();
	while stream.advance() {
		let token = &stream.token().text;
		if token.chars().count() >= MIN_TOKEN_CHARS { tokens.push(token.clone()); }
	}
	tokens
}

/// Every contiguous window of `lo..=hi` tokens, joined by a single space.
pub fn ngrams(tokens: &[String], (lo, hi): (usize, usize)) -> Vec<String> {
	let mut out = Vec::new();
	for n in lo.max(1)..=hi {
		if n == 1 { out.extend(tokens.iter().cloned()); continue; }
		out.extend(tokens.windows(n).map(|w| w.join(" ")));
	}
	out
}
