mod tests_incremental;
mod tests_resilience;
mod tests_structure;
mod tests_threads;
