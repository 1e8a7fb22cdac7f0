/*!

`mbic3-toy`: a brute-force reference `SmtSolver`/`InterpolatingSolver` (`ToySolver`) used to drive
`mbic3-core`'s engine end to end. See `tests/` for the scenario suite this backs.

*/

mod solver;

pub use solver::ToySolver;
