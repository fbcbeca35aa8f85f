mod config_gen;
mod probe;
mod queryables;

pub use config_gen::config_generate;
pub use probe::{ProbeArgs, ProbeSummary, build_search_body, probe};
pub use queryables::print_queryables;
