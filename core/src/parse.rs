//! The external sentence/rule string syntax from spec/6.
//!
//! Sentences are whitespace-separated tokens: `[NAME]` is a variable
//! (`NAME` matching `[A-Z]+`), `$NAME$` is a special symbol, anything else
//! is a word. Rules are a (possibly empty) sequence of premise lines, a
//! `---` separator line, and one conclusion line.

use std::fmt;

use crate::error::{Error, Result};
use crate::rule::Rule;
use crate::sentence::Sentence;
use crate::vocab::Context;

pub fn parse_sentence(ctx: &mut Context, text: &str) -> Result<Sentence> {
	let tokens = text
		.split_whitespace()
		.map(|raw| parse_token(ctx, raw))
		.collect::<Result<Vec<_>>>()?;
	Ok(Sentence::new(tokens))
}

fn parse_token(ctx: &mut Context, raw: &str) -> Result<crate::token::Token> {
	use crate::token::Token;

	if raw.len() >= 2 && raw.starts_with('[') && raw.ends_with(']') {
		let name = &raw[1..raw.len() - 1];
		let id = ctx.variables.intern(name)?;
		Ok(Token::variable(id))
	} else if raw.len() >= 2 && raw.starts_with('$') && raw.ends_with('$') {
		let name = &raw[1..raw.len() - 1];
		let id = ctx.specials.intern(name)?;
		Ok(Token::special(id))
	} else if raw.contains(|c| c == '[' || c == ']' || c == '$') {
		Err(Error::MalformedSentence(format!(
			"`{raw}` mixes plain word characters with `[`, `]` or `$`"
		)))
	} else {
		let id = ctx.words.intern(raw)?;
		Ok(Token::word(id))
	}
}

/// Parse one rule: a (possibly empty) list of premise lines, a `---`
/// separator, and one conclusion line.
pub fn parse_rule(ctx: &mut Context, text: &str) -> Result<Rule> {
	let mut premises = Vec::new();
	let mut found_sep = false;
	let mut conclusion_line: Option<&str> = None;

	for line in text.lines() {
		let trimmed = line.trim();
		if trimmed.is_empty() {
			continue;
		}
		if trimmed == "---" {
			if found_sep {
				return Err(Error::MalformedRule("more than one `---` separator".to_string()));
			}
			found_sep = true;
			continue;
		}
		if found_sep {
			if conclusion_line.is_some() {
				return Err(Error::MalformedRule("more than one conclusion line".to_string()));
			}
			conclusion_line = Some(trimmed);
		} else {
			premises.push(trimmed);
		}
	}

	if !found_sep {
		return Err(Error::MalformedRule("missing `---` separator".to_string()));
	}
	let conclusion_line =
		conclusion_line.ok_or_else(|| Error::MalformedRule("missing conclusion line".to_string()))?;

	let premises = premises
		.into_iter()
		.map(|line| parse_sentence(ctx, line))
		.collect::<Result<Vec<_>>>()?;
	let conclusion = parse_sentence(ctx, conclusion_line)?;
	Ok(Rule::new(premises, conclusion))
}

/// Split a rule-set file into per-rule chunks on blank lines, then parse
/// each chunk as a rule.
pub fn parse_rule_set(ctx: &mut Context, text: &str) -> Result<Vec<Rule>> {
	let mut rules = Vec::new();
	let mut chunk = String::new();
	for line in text.lines() {
		if line.trim().is_empty() && !chunk.trim().is_empty() {
			rules.push(parse_rule(ctx, &chunk)?);
			chunk.clear();
		} else {
			chunk.push_str(line);
			chunk.push('\n');
		}
	}
	if !chunk.trim().is_empty() {
		rules.push(parse_rule(ctx, &chunk)?);
	}
	Ok(rules)
}

/// Renders a [`Sentence`] back to its text syntax. Fresh (De-Bruijn)
/// variables, which never come from user text, are rendered with a
/// leading underscore so the output is visibly not re-parseable rather
/// than silently wrong.
pub struct DisplaySentence<'a> {
	pub sentence: &'a Sentence,
	pub ctx: &'a Context,
}

impl<'a> fmt::Display for DisplaySentence<'a> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, t) in self.sentence.as_slice().iter().enumerate() {
			if i > 0 {
				write!(f, " ")?;
			}
			if let Some(id) = t.word_id() {
				write!(f, "{}", self.ctx.words.resolve(id).unwrap_or("?"))?;
			} else if let Some(id) = t.special_id() {
				write!(f, "${}$", self.ctx.specials.resolve(id).unwrap_or("?"))?;
			} else if let Some(id) = t.named_variable_id() {
				write!(f, "[{}]", self.ctx.variables.resolve(id).unwrap_or("?"))?;
			} else {
				write!(f, "[_{}]", -t.raw_id())?;
			}
		}
		Ok(())
	}
}

pub struct DisplayRule<'a> {
	pub rule: &'a Rule,
	pub ctx: &'a Context,
}

impl<'a> fmt::Display for DisplayRule<'a> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for premise in self.rule.premises() {
			writeln!(f, "{}", DisplaySentence { sentence: premise, ctx: self.ctx })?;
		}
		writeln!(f, "---")?;
		write!(f, "{}", DisplaySentence { sentence: self.rule.conclusion(), ctx: self.ctx })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn roundtrip_sentence() {
		let mut ctx = Context::new();
		let s = parse_sentence(&mut ctx, "wif kiki dax $MAPS_TO$ [X] [Y]").unwrap();
		let rendered = DisplaySentence { sentence: &s, ctx: &ctx }.to_string();
		assert_eq!(rendered, "wif kiki dax $MAPS_TO$ [X] [Y]");
	}

	#[test]
	fn parse_rule_with_two_premises() {
		let mut ctx = Context::new();
		let rule = parse_rule(
			&mut ctx,
			"[A] is [B]\nrough people be nice\n---\n[A] be nice",
		)
		.unwrap();
		assert_eq!(rule.premises().len(), 2);
	}

	#[test]
	fn parse_rule_requires_separator() {
		let mut ctx = Context::new();
		assert!(parse_rule(&mut ctx, "[A] is [B]\n[A] be [B]").is_err());
	}

	#[test]
	fn parse_rule_set_splits_on_blank_lines() {
		let mut ctx = Context::new();
		let text = "dax $MAPS_TO$ RED\n---\ndax $MAPS_TO$ RED\n\nlug $MAPS_TO$ BLUE\n---\nlug $MAPS_TO$ BLUE\n";
		let rules = parse_rule_set(&mut ctx, text).unwrap();
		assert_eq!(rules.len(), 2);
	}
}
