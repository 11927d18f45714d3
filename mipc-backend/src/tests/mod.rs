//! Whole-pipeline tests: syntax tree in, simulated program output out
