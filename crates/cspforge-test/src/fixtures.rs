//! Small constraint problems with known solution sets.

use cspforge_core::{BoolVar, Csp, CspBuilder, CspFactory, Formula, IntVar};

/// A decomposed problem together with the factory that owns its terms.
pub struct Fixture {
    pub factory: CspFactory,
    pub csp: Csp,
    pub int_vars: Vec<IntVar>,
    pub bool_vars: Vec<BoolVar>,
}

impl Fixture {
    /// Decomposes `formulas` and registers every listed variable as visible.
    ///
    /// # Panics
    ///
    /// Panics if a formula fails to decompose.
    pub fn build(
        mut factory: CspFactory,
        int_vars: Vec<IntVar>,
        bool_vars: Vec<BoolVar>,
        formulas: &[Formula],
    ) -> Self {
        let mut builder = CspBuilder::new();
        for v in &int_vars {
            builder.add_int_var(v);
        }
        for b in &bool_vars {
            builder.add_bool_var(b);
        }
        for f in formulas {
            builder
                .add_formula(&mut factory, f)
                .expect("fixture formula decomposes");
        }
        Fixture {
            factory,
            csp: builder.build(),
            int_vars,
            bool_vars,
        }
    }

    pub fn var(&self, name: &str) -> &IntVar {
        self.int_vars
            .iter()
            .find(|v| v.name() == name)
            .expect("fixture variable exists")
    }
}

/// `a in [0, 3]`, `b in [3, 5]`, `a = 2`.
pub fn scenario_a() -> Fixture {
    let mut f = CspFactory::new();
    let a = f.int_var_range("a", 0, 3).unwrap();
    let b = f.int_var_range("b", 3, 5).unwrap();
    let at = f.variable(&a);
    let two = f.constant(2);
    let eq = f.eq(at, two);
    Fixture::build(f, vec![a, b], vec![], &[eq])
}

/// `alldifferent(a, b, c)` over `[0, 2]`.
pub fn scenario_b() -> Fixture {
    let mut f = CspFactory::new();
    let vars: Vec<IntVar> = ["a", "b", "c"]
        .iter()
        .map(|n| f.int_var_range(n, 0, 2).unwrap())
        .collect();
    let terms: Vec<_> = vars.iter().map(|v| f.variable(v)).collect();
    let alldiff = f.all_different(&terms);
    Fixture::build(f, vars, vec![], &[alldiff])
}

/// `a + b = c`, `a in [1, 2]`, `b in [10, 12]`, `c in [-5, 12]`.
pub fn scenario_c() -> Fixture {
    let mut f = CspFactory::new();
    let a = f.int_var_range("a", 1, 2).unwrap();
    let b = f.int_var_range("b", 10, 12).unwrap();
    let c = f.int_var_range("c", -5, 12).unwrap();
    let (at, bt, ct) = (f.variable(&a), f.variable(&b), f.variable(&c));
    let sum = f.add(at, bt);
    let eq = f.eq(sum, ct);
    Fixture::build(f, vec![a, b, c], vec![], &[eq])
}

/// Sums with coefficients, a sparse domain, `abs`, `min`, `mod` and a
/// boolean guard.
pub fn mixed() -> Fixture {
    let mut f = CspFactory::new();
    let x = f.int_var_range("x", -3, 3).unwrap();
    let y = f.int_var_values("y", [0, 2, 5, 7]).unwrap();
    let z = f.int_var_range("z", 0, 4).unwrap();
    let p = f.bool_var("p").unwrap();
    let (xt, yt, zt) = (f.variable(&x), f.variable(&y), f.variable(&z));

    // |x| + z <= 4
    let abs_x = f.abs(xt);
    let lhs = f.add(abs_x, zt);
    let four = f.constant(4);
    let c1 = f.le(lhs, four);

    // p -> y > z
    let c2 = Formula::implies(Formula::lit(p.positive()), f.gt(yt, zt));

    // !p -> 2x - y + 3 >= min(y, z)
    let two_x = f.mul(2, xt);
    let diff = f.sub(two_x, yt);
    let three = f.constant(3);
    let shifted = f.add(diff, three);
    let m = f.min(yt, zt);
    let c3 = Formula::or([Formula::lit(p.positive()), f.ge(shifted, m)]);

    // z mod 2 != x mod 3
    let zm = f.modulo(zt, 2).unwrap();
    let xm = f.modulo(xt, 3).unwrap();
    let c4 = f.ne(zm, xm);

    Fixture::build(f, vec![x, y, z], vec![p], &[c1, c2, c3, c4])
}

/// `x * y = z` with mixed signs plus `x + y + z + w >= 3`.
pub fn product() -> Fixture {
    let mut f = CspFactory::new();
    let x = f.int_var_range("x", -2, 3).unwrap();
    let y = f.int_var_range("y", 0, 3).unwrap();
    let z = f.int_var_range("z", -4, 6).unwrap();
    let w = f.int_var_range("w", 0, 1).unwrap();
    let (xt, yt, zt, wt) = (f.variable(&x), f.variable(&y), f.variable(&z), f.variable(&w));
    let prod = f.product(xt, yt);
    let c1 = f.eq(prod, zt);
    let sum = f.sum(&[xt, yt, zt, wt]);
    let three = f.constant(3);
    let c2 = f.ge(sum, three);
    Fixture::build(f, vec![x, y, z, w], vec![], &[c1, c2])
}
