use std::fmt::Debug;

#[cfg(feature = "scip")]
pub mod scip;

pub trait ModelBuilder {
    type Variable: Clone;

    fn add_variable(
        &mut self,
        name: &str,
        is_integer: bool,
        obj: f64,
        lb: f64,
        ub: f64,
    ) -> Self::Variable;
    fn add_constraint(
        &mut self,
        name: &str,
        vars: &[Self::Variable],
        coeffs: &[f64],
        lb: Option<f64>,
        ub: Option<f64>,
    );
}

pub trait ModelReady {
    type SolvedModel: ModelSolved;
    fn solve(self) -> Self::SolvedModel;
}

pub trait ModelSolved {
    type Solution: SolutionTrait;

    fn is_optimal(&self) -> bool;
    fn get_solutions(&self, max_count: usize) -> Vec<Self::Solution>;
}

pub trait SolutionTrait {
    type Variable;
    fn get_value(&self, var: &Self::Variable) -> f64;
    fn get_values(&self, vars: &[Self::Variable]) -> Vec<f64> {
        vars.iter().map(|v| self.get_value(v)).collect()
    }
    fn get_objective_value(&self) -> f64;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjSense {
    Minimize,
    Maximize,
}

pub trait LpSolver: Clone + Debug {
    type Variable: Clone + Debug;
    type Solution: SolutionTrait<Variable = Self::Variable>;
    type Model: ModelBuilder<Variable = Self::Variable>
        + ModelReady<SolvedModel = Self::SolvedModel>;
    type SolvedModel: ModelSolved<Solution = Self::Solution>;

    fn create_new_model(name: &str, verbose: bool, sense: ObjSense) -> Self::Model;
}
