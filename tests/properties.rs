//! Randomised checks of the solver against exhaustive enumeration.

use backjump_sat::sat::cdcl::Cdcl;
use backjump_sat::sat::clause::Clause;
use backjump_sat::sat::cnf::Cnf;
use backjump_sat::sat::literal::Variable;
use backjump_sat::sat::solver::{Solutions, Solver};
use proptest::prelude::*;

type Pairs = Vec<Vec<(u8, Variable)>>;

fn formula() -> impl Strategy<Value = (usize, Pairs)> {
    (1usize..=6).prop_flat_map(|n| {
        let clause = prop::collection::vec((0u8..2, 0..n), 1..=3);
        (Just(n), prop::collection::vec(clause, 0..14))
    })
}

fn models(cnf: &Cnf) -> Vec<Solutions> {
    let n = cnf.num_vars;
    (0..1u32 << n)
        .map(|bits| Solutions::new((0..n).map(|i| bits >> i & 1 == 1).collect()))
        .filter(|sol| cnf.verify(sol))
        .collect()
}

fn satisfies(sol: &Solutions, clause: &Clause) -> bool {
    clause
        .iter()
        .any(|lit| sol.value(lit.variable()).is_some_and(|v| lit.is_satisfied_by(v)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn agrees_with_enumeration((n, pairs) in formula()) {
        let cnf = Cnf::from_pairs(n, &pairs).unwrap();
        let mut solver = Cdcl::new(cnf.clone());
        let result = solver.solve().unwrap();
        let expected = models(&cnf);

        match result {
            Some(sol) => {
                prop_assert_eq!(sol.len(), n);
                prop_assert!(cnf.verify(&sol));
            }
            None => prop_assert!(expected.is_empty()),
        }
    }

    #[test]
    fn learned_clauses_keep_every_model((n, pairs) in formula()) {
        let cnf = Cnf::from_pairs(n, &pairs).unwrap();
        let mut solver = Cdcl::new(cnf.clone());
        solver.solve().unwrap();

        let expected = models(&cnf);
        for clause in solver.learned_clauses() {
            prop_assert!(!clause.is_empty());
            for model in &expected {
                prop_assert!(satisfies(model, clause));
            }
        }
    }

    #[test]
    fn backjumps_never_climb((n, pairs) in formula()) {
        let cnf = Cnf::from_pairs(n, &pairs).unwrap();
        let mut solver = Cdcl::new(cnf);
        solver.solve().unwrap();

        for record in solver.conflict_history() {
            prop_assert!(record.backjump_level >= 0);
            prop_assert!(record.backjump_level <= record.conflict_level);
        }
        prop_assert_eq!(solver.conflict_history().len(), solver.learned_clauses().len());
    }

    #[test]
    fn solving_twice_is_deterministic((n, pairs) in formula()) {
        let cnf = Cnf::from_pairs(n, &pairs).unwrap();
        let mut solver = Cdcl::new(cnf);

        let first = solver.solve().unwrap();
        let first_stats = solver.stats();
        let second = solver.solve().unwrap();

        prop_assert_eq!(first, second);
        prop_assert_eq!(first_stats, solver.stats());
    }
}
