//! End-to-end runs of the bytemap driver
//!
//! Small loop-free programs, optimized with the default (full) configuration
//! unless a test says otherwise.

use bytemap_opt::config::{BytemapConfig, ConfigError, Preset};
use bytemap_opt::shared::models::{BinaryOp, Block, Cmd, Expr, Loc, Program, Symbol, Var};
use bytemap_opt::{optimize_bytemaps, BytemapError, EraseAll, Erasability, PassOutput};
use pretty_assertions::assert_eq;
use std::io::Write;

// ============================================================================
// Helpers
// ============================================================================

fn small(x: &Var) -> Cmd {
    Cmd::Assert {
        cond: Expr::binary(BinaryOp::Lt, x, Expr::num(1000u64)),
        msg: format!("{} is small", x),
    }
}

fn run(program: &Program) -> PassOutput {
    optimize_bytemaps(program, &BytemapConfig::default(), &EraseAll).unwrap()
}

fn cmds(program: &Program) -> Vec<Cmd> {
    program.blocks().flat_map(|b| b.cmds.iter().cloned()).collect()
}

/// Keeps havocs, which stand for reads of the environment
struct KeepHavocs;

impl Erasability for KeepHavocs {
    fn is_erasable(&self, cmd: &Cmd) -> bool {
        !matches!(cmd, Cmd::Havoc { .. })
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_load_after_store_is_forwarded() {
    let (m1, m2) = (Var::bytemap("m1"), Var::bytemap("m2"));
    let (v, x) = (Var::bits256("v"), Var::bits256("x"));
    let program = Program::single_block(vec![
        Cmd::havoc(&v),
        Cmd::assign(&m2, Expr::store(&m1, Expr::num(5u64), &v)),
        Cmd::assign(&x, Expr::select(&m2, Expr::num(5u64))),
        small(&x),
    ]);

    let out = run(&program);
    assert_eq!(
        cmds(&out.program),
        vec![Cmd::havoc(&v), Cmd::assign(&x, &v), small(&x)]
    );
}

#[test]
fn test_unrelated_indices_keep_everything() {
    let (m1, m2) = (Var::bytemap("m1"), Var::bytemap("m2"));
    let (i, j, v, x) = (
        Var::bits256("i"),
        Var::bits256("j"),
        Var::bits256("v"),
        Var::bits256("x"),
    );
    let program = Program::single_block(vec![
        Cmd::havoc(&i),
        Cmd::havoc(&j),
        Cmd::havoc(&v),
        Cmd::assign(&m2, Expr::store(&m1, &i, &v)),
        Cmd::assign(&x, Expr::select(&m2, &j)),
        small(&x),
    ]);

    let out = run(&program);
    assert_eq!(out.program, program);
}

#[test]
fn test_unread_store_is_deleted() {
    let (m1, m2) = (Var::bytemap("m1"), Var::bytemap("m2"));
    let v = Var::bits256("v");
    let program = Program::single_block(vec![
        Cmd::havoc(&v),
        Cmd::assign(&m2, Expr::store(&m1, Expr::num(5u64), &v)),
        small(&v),
    ]);

    let out = run(&program);
    assert_eq!(cmds(&out.program), vec![Cmd::havoc(&v), small(&v)]);
    assert_eq!(out.stats.get("store"), 1);
}

#[test]
fn test_load_resolves_through_long_copy_source() {
    let (m0, ms, md, m3) = (
        Var::bytemap("m0"),
        Var::bytemap("ms"),
        Var::bytemap("md"),
        Var::bytemap("m3"),
    );
    let (v, x) = (Var::bits256("v"), Var::bits256("x"));
    let program = Program::single_block(vec![
        Cmd::havoc(&v),
        Cmd::assign(&ms, Expr::store(&m0, Expr::num(1u64), &v)),
        Cmd::assign(
            &m3,
            Expr::long_store(&md, Expr::num(10u64), &ms, Expr::num(0u64), Expr::num(4u64)),
        ),
        Cmd::assign(&x, Expr::select(&m3, Expr::num(11u64))),
        small(&x),
    ]);

    let out = run(&program);
    assert_eq!(
        cmds(&out.program),
        vec![Cmd::havoc(&v), Cmd::assign(&x, &v), small(&x)]
    );
    assert_eq!(out.stats.get("longstore"), 1);
}

#[test]
fn test_long_copy_read_inside_drops_destination() {
    let (ms, md, m3) = (Var::bytemap("ms"), Var::bytemap("md"), Var::bytemap("m3"));
    let (q, x) = (Var::bits256("q"), Var::bits256("x"));
    let program = Program::single_block(vec![
        Cmd::havoc(&ms),
        Cmd::havoc(&q),
        Cmd::Assume(Expr::land(vec![
            Expr::binary(BinaryOp::Lt, Expr::num(9u64), &q),
            Expr::binary(BinaryOp::Lt, &q, Expr::num(14u64)),
        ])),
        Cmd::assign(
            &m3,
            Expr::long_store(&md, Expr::num(10u64), &ms, Expr::num(0u64), Expr::num(4u64)),
        ),
        Cmd::assign(&x, Expr::select(&m3, &q)),
        small(&x),
    ]);

    let out = run(&program);
    let cmds = cmds(&out.program);
    let map_defs: Vec<&Var> = cmds
        .iter()
        .filter_map(|cmd| match cmd {
            Cmd::Assign {
                lhs,
                rhs: Expr::MapDef { .. },
            } => Some(lhs),
            _ => None,
        })
        .collect();
    assert_eq!(map_defs.len(), 1);
    let zero = map_defs[0];
    assert!(zero.name.starts_with("zero"));

    let long_copy = cmds
        .iter()
        .find_map(|cmd| match cmd {
            Cmd::Assign { lhs, rhs } if lhs == &m3 => Some(rhs.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        long_copy,
        Expr::long_store(zero, Expr::num(10u64), &ms, Expr::num(0u64), Expr::num(4u64))
    );
    assert!(out.stats.get("longstore->src_only") >= 1);
    assert!(!cmds.iter().any(|cmd| cmd.vars().contains(&md)));
}

#[test]
fn test_branches_joining_on_a_stored_value() {
    // both paths store the same value, the join reads it
    let (m, v, x, c) = (
        Var::bytemap("m"),
        Var::bits256("v"),
        Var::bits256("x"),
        Var::boolean("c"),
    );
    let program = Program::new(
        0,
        vec![
            Block::new(
                0,
                vec![
                    Cmd::havoc(&v),
                    Cmd::havoc(&c),
                    Cmd::Branch {
                        cond: Symbol::Var(c.clone()),
                    },
                ],
                vec![1, 2],
            ),
            Block::new(
                1,
                vec![Cmd::assign(&m, Expr::store(&m, Expr::num(7u64), &v))],
                vec![3],
            ),
            Block::new(
                2,
                vec![Cmd::assign(&m, Expr::store(&m, Expr::num(7u64), &v))],
                vec![3],
            ),
            Block::new(
                3,
                vec![Cmd::assign(&x, Expr::select(&m, Expr::num(7u64))), small(&x)],
                vec![],
            ),
        ],
    )
    .unwrap();

    let out = run(&program);
    assert_eq!(
        out.program.block(3).unwrap().cmds,
        vec![Cmd::assign(&x, &v), small(&x)]
    );
    assert!(out.program.block(1).unwrap().cmds.is_empty());
    assert!(out.program.block(2).unwrap().cmds.is_empty());
    assert_eq!(out.program.cmd_at(Loc::new(0, 0)).unwrap(), &Cmd::havoc(&v));
}

#[test]
fn test_custom_erasability_keeps_havocs() {
    let (m, w) = (Var::bytemap("m"), Var::bits256("w"));
    let program = Program::single_block(vec![Cmd::havoc(&w), Cmd::havoc(&m)]);

    let out = optimize_bytemaps(&program, &BytemapConfig::default(), &KeepHavocs).unwrap();
    assert_eq!(out.program, program);

    let out = run(&program);
    assert!(out.program.block(0).unwrap().cmds.is_empty());
}

#[test]
fn test_folded_bytemap_command_is_rejected() {
    let (m1, m2) = (Var::bytemap("m1"), Var::bytemap("m2"));
    let v = Var::bits256("v");
    let program = Program::single_block(vec![Cmd::assign(
        &m2,
        Expr::store(&m1, Expr::add(&v, Expr::num(1u64)), &v),
    )]);

    let err = optimize_bytemaps(&program, &BytemapConfig::default(), &EraseAll).unwrap_err();
    assert!(matches!(err, BytemapError::NotUnfolded(_)));
}

// ============================================================================
// Driver gates
// ============================================================================

#[test]
fn test_disabled_and_precise_configs_are_no_ops() {
    let (m1, m2) = (Var::bytemap("m1"), Var::bytemap("m2"));
    let v = Var::bits256("v");
    let program = Program::single_block(vec![
        Cmd::havoc(&v),
        Cmd::assign(&m2, Expr::store(&m1, Expr::num(5u64), &v)),
    ]);

    for config in [
        BytemapConfig::preset(Preset::Off),
        BytemapConfig::preset(Preset::Full).enabled(false),
        BytemapConfig::preset(Preset::Full).precise_bytemaps(true),
    ] {
        let out = optimize_bytemaps(&program, &config, &EraseAll).unwrap();
        assert_eq!(out.program, program);
        assert!(out.stats.is_empty());
    }
}

#[test]
fn test_cheap_mode_keeps_dead_stores() {
    let (m1, m2) = (Var::bytemap("m1"), Var::bytemap("m2"));
    let v = Var::bits256("v");
    let program = Program::single_block(vec![
        Cmd::havoc(&v),
        Cmd::assign(&m2, Expr::store(&m1, Expr::num(5u64), &v)),
        small(&v),
    ]);

    let out =
        optimize_bytemaps(&program, &BytemapConfig::preset(Preset::Cheap), &EraseAll).unwrap();
    assert_eq!(out.program, program);
}

// ============================================================================
// Configuration files
// ============================================================================

#[test]
fn test_yaml_config_drives_the_pipeline() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "version: 1\npreset: full\noverrides:\n  preserved_vars: [m2]\n"
    )
    .unwrap();
    let config = BytemapConfig::from_yaml(file.path()).unwrap();
    assert_eq!(config.preserved_vars, vec!["m2".to_string()]);

    let (m1, m2) = (Var::bytemap("m1"), Var::bytemap("m2"));
    let v = Var::bits256("v");
    let program = Program::single_block(vec![
        Cmd::havoc(&v),
        Cmd::assign(&m2, Expr::store(&m1, Expr::num(5u64), &v)),
        small(&v),
    ]);
    let out = optimize_bytemaps(&program, &config, &EraseAll).unwrap();
    assert_eq!(out.program, program);
}

#[test]
fn test_yaml_config_with_bad_version_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "version: 7\npreset: cheap\n").unwrap();
    let err = BytemapConfig::from_yaml(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedVersion { found: 7, .. }));
}

#[test]
fn test_yaml_round_trip_preserves_overrides() {
    let config = BytemapConfig::preset(Preset::Cheap).destructive_annotations(true);
    let yaml = config.to_yaml().unwrap();
    assert_eq!(BytemapConfig::from_yaml_str(&yaml).unwrap(), config);
}
