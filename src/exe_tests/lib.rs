#![cfg(test)]

mod fixtures;
