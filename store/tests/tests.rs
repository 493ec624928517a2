use std::io::Cursor;

use metarule_core::parse::parse_sentence;
use metarule_core::Context;
use metarule_store::{load, save};

#[test]
fn checkpoint_extends_a_context_restarted_from_scratch() {
	let mut original = Context::new();
	parse_sentence(&mut original, "dax fep $MAPS_TO$ [X]").unwrap();
	parse_sentence(&mut original, "lug wif $MAPS_TO$ [Y]").unwrap();

	let mut buffer = Vec::new();
	save(&original, &mut buffer).unwrap();

	let mut restored = Context::new();
	load(&mut restored, &mut Cursor::new(buffer)).unwrap();

	for word in ["dax", "fep", "lug", "wif"] {
		assert_eq!(restored.words.get(word), original.words.get(word));
	}
	assert_eq!(restored.specials.get("MAPS_TO"), original.specials.get("MAPS_TO"));
}

#[test]
fn checkpoint_load_refuses_to_overwrite_a_conflicting_prefix() {
	let mut ctx = Context::new();
	parse_sentence(&mut ctx, "harry is rough").unwrap();

	let mut other = Context::new();
	parse_sentence(&mut other, "harry is kind").unwrap();
	let mut buffer = Vec::new();
	save(&other, &mut buffer).unwrap();

	assert!(load(&mut ctx, &mut Cursor::new(buffer)).is_err());
}
