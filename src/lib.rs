// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! Hash-consed symbolic expression DAG with constant folding for bit-vector
//! and floating-point terms.

pub mod expr;
