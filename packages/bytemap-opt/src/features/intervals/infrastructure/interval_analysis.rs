/*
 * Interval Analysis
 *
 * Forward sweep over the block DAG computing a range for every numeric
 * variable at every location.
 *
 * - Assignments evaluate the right-hand side and clamp to the lhs sort
 * - `assume v <op> c` (and conjunctions of those) narrows `v`
 * - Join: hull per variable; a variable unknown along some predecessor is unknown
 *
 * Only changes are stored: the entry state of each block plus, per location,
 * the variables that location updated. A query scans back from the location.
 */

use crate::errors::Result;
use crate::features::data_flow::{forward_dag_dataflow, AnalysisCache};
use crate::features::intervals::domain::Interval;
use crate::features::intervals::ports::IntervalOracle;
use crate::shared::models::{BinaryOp, BlockId, Cmd, Expr, Loc, NaryOp, Program, Sort, Symbol, Var};
use primitive_types::U256;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

type Env = BTreeMap<Var, Interval>;

pub struct IntervalAnalysis<'p> {
    program: &'p Program,
    at_entry: FxHashMap<BlockId, Env>,
    updates: FxHashMap<Loc, Vec<(Var, Interval)>>,
    lhs: FxHashMap<Loc, Interval>,
}

impl<'p> IntervalAnalysis<'p> {
    pub fn new(cache: &AnalysisCache<'p>) -> Result<Self> {
        let program = cache.program;
        let mut at_entry = FxHashMap::default();
        let mut updates = FxHashMap::default();
        let mut lhs = FxHashMap::default();

        forward_dag_dataflow(program, &cache.graph, |block, ins: Vec<&Env>| {
            let mut env = join(&ins);
            at_entry.insert(block.id, env.clone());

            for (loc, cmd) in block.located_cmds() {
                let changed = transfer(cmd, &mut env);
                if let Some(assigned) = cmd.lhs().filter(|v| !v.is_bytemap()) {
                    lhs.insert(loc, get(&env, assigned));
                }
                if !changed.is_empty() {
                    updates.insert(loc, changed);
                }
            }
            Ok(env)
        })?;

        tracing::debug!(locations = lhs.len(), "interval analysis done");
        Ok(Self {
            program,
            at_entry,
            updates,
            lhs,
        })
    }
}

impl IntervalOracle for IntervalAnalysis<'_> {
    fn range_at(&self, loc: Loc, var: &Var) -> Interval {
        let upto = self
            .program
            .block(loc.block)
            .map_or(0, |b| loc.pos.min(b.cmds.len()));
        for pos in (0..upto).rev() {
            let found = self
                .updates
                .get(&Loc::new(loc.block, pos))
                .and_then(|changed| changed.iter().rev().find(|(v, _)| v == var));
            if let Some((_, range)) = found {
                return *range;
            }
        }
        self.at_entry
            .get(&loc.block)
            .map_or_else(|| Interval::of_sort(var.sort), |env| get(env, var))
    }

    fn lhs_range(&self, loc: Loc) -> Option<Interval> {
        self.lhs.get(&loc).copied()
    }
}

fn get(env: &Env, var: &Var) -> Interval {
    env.get(var)
        .copied()
        .unwrap_or_else(|| Interval::of_sort(var.sort))
}

fn join(ins: &[&Env]) -> Env {
    let Some((first, rest)) = ins.split_first() else {
        return Env::new();
    };
    first
        .iter()
        .filter_map(|(var, range)| {
            rest.iter()
                .try_fold(*range, |acc, env| env.get(var).map(|r| acc.hull(r)))
                .map(|joined| (var.clone(), joined))
        })
        .collect()
}

/// Apply `cmd` to `env`, returning the variables it changed
fn transfer(cmd: &Cmd, env: &mut Env) -> Vec<(Var, Interval)> {
    let mut changed = Vec::new();
    let mut set = |env: &mut Env, var: &Var, range: Interval| {
        env.insert(var.clone(), range);
        changed.push((var.clone(), range));
    };

    match cmd {
        Cmd::Assign { lhs, rhs } if !lhs.is_bytemap() => {
            let range = eval(rhs, env).clamp_to(lhs.sort);
            set(env, lhs, range);
        }
        Cmd::Havoc { lhs } | Cmd::ByteLoad { lhs, .. } if !lhs.is_bytemap() => {
            set(env, lhs, Interval::of_sort(lhs.sort));
        }
        Cmd::Assume(cond) => {
            let mut narrowed = Vec::new();
            narrow(cond, &mut narrowed);
            for (var, bound) in narrowed {
                let range = get(env, &var).intersect(&bound);
                set(env, &var, range);
            }
        }
        _ => {}
    }
    changed
}

fn eval(e: &Expr, env: &Env) -> Interval {
    let word = |i: Interval| i.clamp_to(Sort::BIT256);
    match e {
        Expr::Sym(Symbol::Var(v)) => get(env, v),
        Expr::Sym(Symbol::Const { value, .. }) => Interval::point(*value),
        Expr::Nary(op, args) => {
            let mut ranges = args.iter().map(|a| eval(a, env));
            match op {
                NaryOp::Add | NaryOp::IntAdd => {
                    let sum = ranges
                        .next()
                        .map(|first| ranges.fold(first, |acc, r| acc.add(&r)))
                        .unwrap_or_else(|| Interval::point(U256::zero()));
                    if *op == NaryOp::Add {
                        word(sum)
                    } else {
                        sum
                    }
                }
                NaryOp::Mul | NaryOp::IntMul => {
                    let product = ranges
                        .next()
                        .map(|first| ranges.fold(first, |acc, r| acc.mul(&r)))
                        .unwrap_or_else(|| Interval::point(U256::one()));
                    if *op == NaryOp::Mul {
                        word(product)
                    } else {
                        product
                    }
                }
                NaryOp::LAnd | NaryOp::LOr => Interval::boolean(),
            }
        }
        Expr::Binary(op, a, b) => {
            let (ra, rb) = (eval(a, env), eval(b, env));
            match op {
                BinaryOp::Sub => word(ra.sub(&rb)),
                BinaryOp::IntSub => ra.sub(&rb),
                BinaryOp::Div => ra.div(&rb),
                BinaryOp::Mod | BinaryOp::IntMod => ra.rem(&rb),
                BinaryOp::ShiftLeft => match rb.as_const() {
                    Some(k) if k >= U256::from(256u32) => Interval::point(U256::zero()),
                    Some(k) => word(ra.mul_const(U256::one() << k.as_usize())),
                    None => Interval::of_sort(Sort::BIT256),
                },
                BinaryOp::ShiftRight => match rb.as_const() {
                    Some(k) if k >= U256::from(256u32) => Interval::point(U256::zero()),
                    Some(k) => ra.shr(k.as_usize()),
                    None => Interval::of_sort(Sort::BIT256),
                },
                BinaryOp::BwAnd => ra.bw_and(&rb),
                BinaryOp::Exp | BinaryOp::BwOr => Interval::of_sort(Sort::BIT256),
                BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq => {
                    Interval::boolean()
                }
            }
        }
        Expr::Not(_) => Interval::boolean(),
        Expr::Ite { cond, then, els } => {
            let c = eval(cond, env);
            if c.as_const() == Some(U256::zero()) {
                eval(els, env)
            } else if !c.is_empty() && !c.contains(U256::zero()) {
                eval(then, env)
            } else {
                eval(then, env).hull(&eval(els, env))
            }
        }
        Expr::Apply { func, args } if func.is_value_preserving() && args.len() == 1 => {
            eval(&args[0], env)
        }
        Expr::Annotated { inner, .. } => eval(inner, env),
        _ => Interval::full(),
    }
}

/// Bounds implied by an assumed condition
fn narrow(cond: &Expr, out: &mut Vec<(Var, Interval)>) {
    match cond {
        Expr::Nary(NaryOp::LAnd, args) => {
            for a in args {
                narrow(a, out);
            }
        }
        Expr::Annotated { inner, .. } => narrow(inner, out),
        Expr::Binary(op, a, b) => {
            let (var, c, op) = match (a.as_ref(), b.as_ref()) {
                (Expr::Sym(Symbol::Var(v)), Expr::Sym(Symbol::Const { value, .. })) => {
                    (v, *value, *op)
                }
                (Expr::Sym(Symbol::Const { value, .. }), Expr::Sym(Symbol::Var(v))) => {
                    let mirrored = match op {
                        BinaryOp::Lt => BinaryOp::Gt,
                        BinaryOp::Le => BinaryOp::Ge,
                        BinaryOp::Gt => BinaryOp::Lt,
                        BinaryOp::Ge => BinaryOp::Le,
                        other => *other,
                    };
                    (v, *value, mirrored)
                }
                _ => return,
            };
            let bound = match op {
                BinaryOp::Le => Interval::at_most(c),
                BinaryOp::Ge => Interval::at_least(c),
                BinaryOp::Eq => Interval::point(c),
                BinaryOp::Lt if !c.is_zero() => Interval::at_most(c - U256::one()),
                BinaryOp::Gt if c != U256::MAX => Interval::at_least(c + U256::one()),
                _ => return,
            };
            out.push((var.clone(), bound));
        }
        _ => {}
    }
}
