#[cfg(all(test, feature = "system_tests"))]
mod system_tests;
