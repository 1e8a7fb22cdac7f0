/*!

`Witness` (spec §6.3): the counterexample the engine reconstructs by chasing a blocked proof
goal's `parent` chain back to frame 0. `cex[0]` satisfies `init`; each consecutive pair satisfies
`trans`; `cex.last()` satisfies `bad`.

*/

use mbic3_abs::HashMap;

use crate::solver::SmtSolver;

pub struct Witness<S: SmtSolver> {
    pub steps: Vec<HashMap<S::Term, S::Term>>,
}

impl<S: SmtSolver> Witness<S> {
    pub fn new(steps: Vec<HashMap<S::Term, S::Term>>) -> Self {
        Witness { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
