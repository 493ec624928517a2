use std::io::{Read, Write};

use log::info;
use metarule_core::Context;

use crate::decode::{decode_string_table, Decode, Error};
use crate::encode::Encode;

/// Checkpoint file magic, chosen to be recognizably not BRDF/RDF-store
/// data (spec/6: "a persistent structure containing three ordered lists
/// of strings").
const TAG: [u8; 4] = *b"MRVC";
const VERSION: u32 = 1;

/// The three ordered string tables that make up a [`Context`]'s
/// vocabularies, in the order they are interned (ids start at 0 and are
/// assigned by position in each table).
pub struct Checkpoint {
	pub words: Vec<String>,
	pub variables: Vec<String>,
	pub specials: Vec<String>,
}

impl Checkpoint {
	pub fn from_context(ctx: &Context) -> Self {
		Checkpoint {
			words: owned(ctx.words.ordered_strings()),
			variables: owned(ctx.variables.ordered_strings()),
			specials: owned(ctx.specials.ordered_strings()),
		}
	}

	/// Load this checkpoint into `ctx`, per the append-only contract: each
	/// table must strictly extend the vocabulary's current prefix, or the
	/// whole load fails and `ctx` may be left partially extended.
	pub fn apply(&self, ctx: &mut Context) -> Result<(), metarule_core::Error> {
		ctx.words.reset(&self.words)?;
		ctx.variables.reset(&self.variables)?;
		ctx.specials.reset(&self.specials)?;
		Ok(())
	}

	pub fn write(&self, output: &mut impl Write) -> Result<(), std::io::Error> {
		output.write_all(&TAG)?;
		VERSION.encode(output)?;
		self.words.as_slice().encode(output)?;
		self.variables.as_slice().encode(output)?;
		self.specials.as_slice().encode(output)?;
		Ok(())
	}

	pub fn read(input: &mut impl Read) -> Result<Self, Error> {
		let mut tag = [0u8; 4];
		input.read_exact(&mut tag)?;
		if tag != TAG {
			return Err(Error::InvalidTag);
		}
		let version = u32::decode(input)?;
		if version != VERSION {
			return Err(Error::UnsupportedVersion(version));
		}
		Ok(Checkpoint {
			words: decode_string_table(input)?,
			variables: decode_string_table(input)?,
			specials: decode_string_table(input)?,
		})
	}
}

fn owned(strings: Vec<&str>) -> Vec<String> {
	strings.into_iter().map(String::from).collect()
}

/// Snapshot `ctx`'s vocabularies to `output`. The only I/O this crate
/// performs; per the error-handling policy any failure here is fatal.
pub fn save(ctx: &Context, output: &mut impl Write) -> Result<(), std::io::Error> {
	Checkpoint::from_context(ctx).write(output)
}

/// Load a checkpoint from `input` and extend `ctx`'s vocabularies with it.
pub fn load(ctx: &mut Context, input: &mut impl Read) -> Result<(), Error> {
	let checkpoint = Checkpoint::read(input)?;
	let before = (ctx.words.len(), ctx.variables.len(), ctx.specials.len());
	checkpoint.apply(ctx)?;
	info!(
		"loaded vocabulary checkpoint: words {} -> {}, variables {} -> {}, specials {} -> {}",
		before.0,
		ctx.words.len(),
		before.1,
		ctx.variables.len(),
		before.2,
		ctx.specials.len()
	);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use metarule_core::parse::parse_sentence;
	use std::io::Cursor;

	#[test]
	fn a_saved_checkpoint_round_trips_through_a_fresh_context() {
		let mut ctx = Context::new();
		parse_sentence(&mut ctx, "dax fep $MAPS_TO$ [X]").unwrap();

		let mut buffer = Vec::new();
		save(&ctx, &mut buffer).unwrap();

		let mut ctx2 = Context::new();
		load(&mut ctx2, &mut Cursor::new(buffer)).unwrap();

		assert_eq!(ctx2.words.get("dax"), ctx.words.get("dax"));
		assert_eq!(ctx2.words.get("fep"), ctx.words.get("fep"));
		assert_eq!(ctx2.specials.get("MAPS_TO"), ctx.specials.get("MAPS_TO"));
	}

	#[test]
	fn loading_a_checkpoint_that_contradicts_the_in_memory_prefix_fails() {
		let mut ctx = Context::new();
		ctx.words.intern("hello").unwrap();
		ctx.words.intern("world").unwrap();

		let mut diverging = Context::new();
		diverging.words.intern("hello").unwrap();
		diverging.words.intern("goodbye").unwrap();
		let mut buffer = Vec::new();
		save(&diverging, &mut buffer).unwrap();

		assert!(load(&mut ctx, &mut Cursor::new(buffer)).is_err());
	}

	#[test]
	fn an_unrecognized_tag_is_rejected() {
		let mut ctx = Context::new();
		let mut buffer = vec![b'X', b'X', b'X', b'X'];
		buffer.extend_from_slice(&VERSION.to_be_bytes());
		assert!(matches!(load(&mut ctx, &mut Cursor::new(buffer)), Err(Error::InvalidTag)));
	}
}
