//! End-to-end scenarios for the backward and forward provers.

use metarule_core::parse::{parse_rule, parse_sentence};
use metarule_core::vocab::FreshVariables;
use metarule_core::{Context, Rule, Sentence};
use metarule_provers::{backward, rete, Budget, Proof, ReteNetwork, Weight};

fn s(ctx: &mut Context, text: &str) -> Sentence {
	parse_sentence(ctx, text).unwrap()
}

fn r(ctx: &mut Context, text: &str) -> Rule {
	parse_rule(ctx, text).unwrap()
}

/// The seven MiniSCAN ground-truth rules: four primitive word-to-color
/// mappings and three compositional functions (`fep` repeats its argument
/// three times, `blicket` interleaves, `kiki` swaps).
fn miniscan_rules(ctx: &mut Context) -> Vec<Rule> {
	vec![
		r(ctx, "---\ndax $MAPS_TO$ RED"),
		r(ctx, "---\nlug $MAPS_TO$ BLUE"),
		r(ctx, "---\nwif $MAPS_TO$ GREEN"),
		r(ctx, "---\nzup $MAPS_TO$ YELLOW"),
		r(ctx, "[A] $MAPS_TO$ [B]\n---\n[A] fep $MAPS_TO$ [B] [B] [B]"),
		r(ctx, "[A] $MAPS_TO$ [B]\n[C] $MAPS_TO$ [D]\n---\n[A] blicket [C] $MAPS_TO$ [B] [D] [B]"),
		r(ctx, "[A] $MAPS_TO$ [B]\n[C] $MAPS_TO$ [D]\n---\n[A] kiki [C] $MAPS_TO$ [D] [B]"),
	]
}

#[test]
fn backward_prover_solves_the_miniscan_fep_goal() {
	let mut ctx = Context::new();
	let rules: Vec<(Rule, Weight)> = miniscan_rules(&mut ctx).into_iter().map(|rule| (rule, Weight::new(0.1))).collect();
	let goal = s(&mut ctx, "zup fep $MAPS_TO$ [X]");

	let params = backward::Params {
		rules: &rules,
		assumptions: &[],
		on_the_fly_proposal: false,
		unify_depth_limit: 10,
		max_depth: 16,
	};
	let mut results: Vec<_> = backward::prove(&goal, Budget::new(1.0), &params, &mut ctx.fresh).into_iter().collect();
	assert!(!results.is_empty());
	results.sort_by_key(|(_, entry)| entry.depth());

	let (sigma, _entry) = &results[0];
	let solved = sigma.apply(&goal);
	let expected = s(&mut ctx, "zup fep $MAPS_TO$ YELLOW YELLOW YELLOW");
	assert_eq!(solved, expected);
}

#[test]
fn rete_forward_prover_derives_harry_be_nice() {
	let mut ctx = Context::new();
	let rules = vec![
		(r(&mut ctx, "[A] is [B]\n---\n[A] be [B]"), Weight::new(0.1)),
		(r(&mut ctx, "---\nrough people be nice"), Weight::new(0.1)),
		(r(&mut ctx, "[A] be rough\nrough people be nice\n---\n[A] be nice"), Weight::new(0.1)),
	];
	let assumptions = vec![s(&mut ctx, "harry is rough")];

	let mut net = ReteNetwork::build(&rules);
	let mut concluded = Vec::new();
	rete::run(&mut net, &rules, &assumptions, |fact, _rule| {
		concluded.push(fact.clone());
		true
	});

	let target = s(&mut ctx, "harry be nice");
	assert!(concluded.contains(&target));
}

#[test]
fn proof_tracks_a_single_rule_application_and_rejects_a_missing_premise() {
	let mut ctx = Context::new();
	let sent1 = s(&mut ctx, "harry is rough");
	let sent2 = s(&mut ctx, "rough people be nice");
	let sent3 = s(&mut ctx, "harry be nice");
	let rule = Rule::new(vec![sent1.clone(), sent2.clone()], sent3.clone());

	let mut proof = Proof::from_assumptions(&[sent1, sent2]);
	let sink = proof.apply(&rule).unwrap();
	assert!(proof.isvalid());
	assert_eq!(proof.sentence(sink), &sent3);

	let unsatisfiable = Rule::new(vec![s(&mut ctx, "nobody said this")], s(&mut ctx, "therefore nonsense"));
	assert!(proof.apply(&unsatisfiable).is_err());
}
