/*!

`Ic3Options`: the engine's configuration surface (spec §4.6.7, §4.8, §9). Threaded through
`Ic3Engine::new`, built with `Default` plus builder-style setters rather than a long constructor
argument list.

*/

/// Selects which of the three inductive-generalization strategies (spec §4.6.7) the engine uses
/// when it learns a lemma.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum IndGenMode {
    /// Mode 0: unsat-core dropping over the cube's own literals.
    CoreDropping,
    /// Mode 1: drive the generic `UnsatCoreReducer` over next-state literals.
    ReducerBased,
    /// Mode 2: interpolation between the blocked frame and the cube.
    Interpolation,
}

#[derive(Copy, Clone, Debug)]
pub struct Ic3Options {
    pub indgen_mode: IndGenMode,
    /// Run inductive generalization at all; if false, the raw negated cube is kept as-is.
    pub ic3_indgen: bool,
    /// Attempt predecessor (preimage) generalization (spec §4.6.8).
    pub ic3_pregen: bool,
    /// Use the functional-preimage shortcut when `trans` is known deterministic.
    pub ic3_functional_preimage: bool,
    /// Cap on generalization iterations; `0` means unbounded.
    pub gen_max_iter: u32,
    /// `0` disables randomized literal shuffling; any nonzero value seeds it deterministically.
    pub random_seed: u64,
}

impl Default for Ic3Options {
    fn default() -> Self {
        Ic3Options {
            indgen_mode: IndGenMode::CoreDropping,
            ic3_indgen: true,
            ic3_pregen: true,
            ic3_functional_preimage: false,
            gen_max_iter: 0,
            random_seed: 0,
        }
    }
}

impl Ic3Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indgen_mode(mut self, mode: IndGenMode) -> Self {
        self.indgen_mode = mode;
        self
    }

    pub fn with_ic3_indgen(mut self, enabled: bool) -> Self {
        self.ic3_indgen = enabled;
        self
    }

    pub fn with_ic3_pregen(mut self, enabled: bool) -> Self {
        self.ic3_pregen = enabled;
        self
    }

    pub fn with_functional_preimage(mut self, enabled: bool) -> Self {
        self.ic3_functional_preimage = enabled;
        self
    }

    pub fn with_gen_max_iter(mut self, max_iter: u32) -> Self {
        self.gen_max_iter = max_iter;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let opts = Ic3Options::new()
            .with_indgen_mode(IndGenMode::Interpolation)
            .with_random_seed(42);
        assert_eq!(opts.indgen_mode, IndGenMode::Interpolation);
        assert_eq!(opts.random_seed, 42);
        assert!(opts.ic3_indgen);
    }
}
