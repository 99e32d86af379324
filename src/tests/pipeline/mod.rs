mod observer_tests;
mod scenario_tests;
