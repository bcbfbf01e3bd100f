mod tests_compile_errors;
mod tests_external_scanner;
