//! End-to-end scenarios for matching, unification and anti-unification.

use metarule_core::parse::{parse_rule, parse_sentence};
use metarule_core::vocab::FreshVariables;
use metarule_core::Context;
use metarule_match::{anti_unify_rule, find_substitutions, unify};

#[test]
fn match_multiplicity_splits_the_right_hand_side_three_ways() {
	let mut ctx = Context::new();
	let pattern = parse_sentence(&mut ctx, "[A] kiki [C] $MAPS_TO$ [D] [B]").unwrap();
	let concrete = parse_sentence(&mut ctx, "wif kiki dax blicket lug $MAPS_TO$ RED BLUE RED GREEN").unwrap();

	let substitutions = find_substitutions(&pattern, &concrete);
	assert_eq!(substitutions.len(), 3);
}

#[test]
fn bounded_unify_of_an_infinite_family_yields_the_first_ten_growth_steps() {
	let mut ctx = Context::new();
	let a = parse_sentence(&mut ctx, "hello [X]").unwrap();
	let b = parse_sentence(&mut ctx, "[X] hello").unwrap();
	let mut fresh = FreshVariables::new();

	let results = unify(&a, &b, 10, &mut fresh);
	assert_eq!(results.len(), 10);

	let x = ctx.variables.get("X").unwrap();
	let x = metarule_core::Token::variable(x);
	let mut lengths: Vec<usize> = results
		.iter()
		.map(|sigma| sigma.get(x).map(|s| s.as_slice().len()).unwrap_or(0))
		.collect();
	lengths.sort_unstable();
	assert_eq!(lengths, (1..=10).collect::<Vec<_>>());
}

#[test]
fn anti_unifying_two_ground_rules_recovers_the_miniscan_fep_schema() {
	let mut ctx = Context::new();
	let a = parse_rule(&mut ctx, "dax $MAPS_TO$ RED\n---\ndax fep $MAPS_TO$ RED RED RED").unwrap();
	let b = parse_rule(&mut ctx, "lug $MAPS_TO$ BLUE\n---\nlug fep $MAPS_TO$ BLUE BLUE BLUE").unwrap();
	let mut fresh = FreshVariables::new();

	let (pattern, _from_a, _from_b) = anti_unify_rule(&a, &b, &mut fresh).unwrap();
	let expected = parse_rule(&mut ctx, "[A] $MAPS_TO$ [B]\n---\n[A] fep $MAPS_TO$ [B] [B] [B]").unwrap();
	assert!(pattern.is_equivalent(&expected));
}
