pub mod lp_max_flow;
pub mod lp_solvers;
pub mod max_flow;
pub mod network;
pub mod parser;
