mod gate_tests;
mod sweeper_tests;
